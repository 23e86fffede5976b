use std::collections::VecDeque;

use crate::{Descriptors, FeatureMatch, GrayFrame, Keypoint};

/// Everything the pipeline knows about one camera frame
#[derive(Debug, Clone)]
pub struct DataFrame {
    pub image: GrayFrame,
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Option<Descriptors>,
    /// Matches from the previous frame (query) into this one (train).
    pub matches: Vec<FeatureMatch>,
}

impl DataFrame {
    pub fn new(image: GrayFrame) -> Self {
        Self {
            image,
            keypoints: Vec::new(),
            descriptors: None,
            matches: Vec::new(),
        }
    }
}

/// Bounded FIFO holding the most recent frames.
///
/// Pushing into a full buffer evicts the oldest element first, so the
/// length never exceeds the capacity.
#[derive(Debug, Clone)]
pub struct FrameBuffer<T> {
    frames: VecDeque<T>,
    capacity: usize,
}

impl<T> FrameBuffer<T> {
    /// Capacity is clamped to at least one slot.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `frame`, returning the evicted oldest frame when the buffer was full.
    pub fn push(&mut self, frame: T) -> Option<T> {
        let evicted = if self.frames.len() == self.capacity {
            self.frames.pop_front()
        } else {
            None
        };
        self.frames.push_back(frame);
        evicted
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.frames.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&T> {
        self.frames.back()
    }

    pub fn latest_mut(&mut self) -> Option<&mut T> {
        self.frames.back_mut()
    }

    /// The frame pushed just before the latest one.
    pub fn previous(&self) -> Option<&T> {
        let n = self.frames.len();
        if n < 2 {
            return None;
        }
        self.frames.get(n - 2)
    }

    /// Previous and latest frames together, for matching.
    pub fn last_pair(&self) -> Option<(&T, &T)> {
        Some((self.previous()?, self.latest()?))
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.frames.iter()
    }

    pub fn get(&self, i: usize) -> Option<&T> {
        self.frames.get(i)
    }
}

impl<T> Default for FrameBuffer<T> {
    fn default() -> Self {
        Self::new(2)
    }
}
