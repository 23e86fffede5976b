use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DescribeError {
    #[error("invalid image: {width}x{height} with {len} bytes")]
    InvalidImage { width: usize, height: usize, len: usize },
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub type DescribeResult<T> = Result<T, DescribeError>;
