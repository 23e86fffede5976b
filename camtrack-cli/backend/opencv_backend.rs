use camtrack_core::{
    AkazeParams, DescriptorKind, DescriptorParams, Descriptors, DetectorKind, DistanceNorm, DetectorParams, FeatureMatch,
    ImageView, Keypoint, MatchParams, MatcherKind, OrbParams, ResponseMap, SelectorKind, SiftParams,
};
use camtrack_detect::suppress_non_maxima_fast;
use camtrack_match::{ratio_test, KNN_NEIGHBOURS};
use log::debug;
use opencv::{
    core::{self, DMatch, KeyPoint, Mat, Point2f, Ptr, Vector, BORDER_DEFAULT, CV_32F, CV_32FC1, CV_8U, NORM_HAMMING, NORM_L2, NORM_MINMAX},
    features2d::{
        AKAZE_DescriptorType, BFMatcher, FastFeatureDetector, FastFeatureDetector_DetectorType,
        FlannBasedMatcher, ORB_ScoreType, AKAZE, BRISK, ORB, SIFT,
    },
    imgproc,
    prelude::*,
    xfeatures2d::{BriefDescriptorExtractor, FREAK},
};

use super::FeatureBackend;
use crate::{PipelineError, PipelineResult};

/// Detectors, descriptors and matchers from OpenCV's features2d
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenCvBackend;

fn gray_mat(image: &ImageView<'_>) -> PipelineResult<Mat> {
    let borrowed = Mat::new_rows_cols_with_data(image.height() as i32, image.width() as i32, image.data())?;
    Ok(borrowed.try_clone()?)
}

fn to_cv_keypoints(keypoints: &[Keypoint]) -> PipelineResult<Vector<KeyPoint>> {
    keypoints
        .iter()
        .map(|kp| {
            KeyPoint::new_coords(kp.x, kp.y, kp.size, kp.angle.unwrap_or(-1.0), kp.response, kp.octave, -1)
                .map_err(PipelineError::from)
        })
        .collect()
}

fn from_cv_keypoints(keypoints: &Vector<KeyPoint>) -> Vec<Keypoint> {
    keypoints
        .iter()
        .map(|kp| {
            let pt = kp.pt();
            let mut out = Keypoint::new(pt.x, pt.y, kp.size())
                .with_response(kp.response())
                .with_octave(kp.octave());
            if kp.angle() >= 0.0 {
                out = out.with_angle(kp.angle());
            }
            out
        })
        .collect()
}

fn from_cv_descriptors(mat: &Mat) -> PipelineResult<Descriptors> {
    if mat.empty() {
        return Ok(Descriptors::empty_binary(0));
    }
    let cols = mat.cols() as usize;
    match mat.depth() {
        CV_8U => Ok(Descriptors::Binary {
            row_bytes: cols,
            data: mat.data_bytes()?.to_vec(),
        }),
        CV_32F => Ok(Descriptors::Float {
            dims: cols,
            data: mat.data_typed::<f32>()?.to_vec(),
        }),
        depth => Err(PipelineError::Config(format!("unexpected descriptor depth {depth}"))),
    }
}

fn to_cv_descriptors(desc: &Descriptors) -> PipelineResult<Mat> {
    if desc.is_empty() {
        return Ok(Mat::default());
    }
    let rows = desc.len() as i32;
    let mat = match desc {
        Descriptors::Binary { row_bytes, data } => {
            Mat::new_rows_cols_with_data(rows, *row_bytes as i32, data.as_slice())?.try_clone()?
        }
        Descriptors::Float { dims, data } => {
            Mat::new_rows_cols_with_data(rows, *dims as i32, data.as_slice())?.try_clone()?
        }
    };
    Ok(mat)
}

fn from_dmatch(m: &DMatch) -> FeatureMatch {
    FeatureMatch::new(m.query_idx as usize, m.train_idx as usize, m.distance)
}

/// Runs `detector` on the whole image.
fn detect_with<T: Feature2DTrait>(detector: &mut Ptr<T>, image: &Mat) -> PipelineResult<Vec<Keypoint>> {
    let mut keypoints = Vector::<KeyPoint>::new();
    detector.detect(image, &mut keypoints, &Mat::default())?;
    Ok(from_cv_keypoints(&keypoints))
}

fn compute_with<T: Feature2DTrait>(
    extractor: &mut Ptr<T>,
    image: &Mat,
    keypoints: &[Keypoint],
) -> PipelineResult<(Vec<Keypoint>, Descriptors)> {
    let mut cv_keypoints = to_cv_keypoints(keypoints)?;
    let mut descriptors = Mat::default();
    extractor.compute(image, &mut cv_keypoints, &mut descriptors)?;
    Ok((from_cv_keypoints(&cv_keypoints), from_cv_descriptors(&descriptors)?))
}

fn shi_tomasi(image: &Mat, params: &DetectorParams) -> PipelineResult<Vec<Keypoint>> {
    let p = &params.shi_tomasi;
    let max_corners = p.max_corners(image.rows() as usize, image.cols() as usize) as i32;
    let mut corners = Vector::<Point2f>::new();
    imgproc::good_features_to_track(
        image,
        &mut corners,
        max_corners,
        p.quality_level,
        p.min_distance(),
        &Mat::default(),
        p.block_size as i32,
        false,
        p.k,
    )?;
    Ok(corners
        .iter()
        .map(|c| Keypoint::new(c.x, c.y, p.block_size as f32))
        .collect())
}

/// OpenCV's Harris response feeding the local non-maximum suppression.
fn harris(image: &Mat, params: &DetectorParams) -> PipelineResult<Vec<Keypoint>> {
    let p = &params.harris;
    let mut response = Mat::default();
    imgproc::corner_harris(
        image,
        &mut response,
        p.block_size as i32,
        p.aperture_size as i32,
        p.k,
        BORDER_DEFAULT,
    )?;
    let mut normalized = Mat::default();
    core::normalize(&response, &mut normalized, 0.0, 255.0, NORM_MINMAX, CV_32FC1, &Mat::default())?;
    let mut scaled = Mat::default();
    core::convert_scale_abs(&normalized, &mut scaled, 1.0, 0.0)?;

    let (rows, cols) = (scaled.rows() as usize, scaled.cols() as usize);
    let map = ResponseMap::new(rows, cols, scaled.data_bytes()?.to_vec())
        .ok_or_else(|| PipelineError::Config("Harris response is not continuous".to_string()))?;
    Ok(suppress_non_maxima_fast(&map, p.aperture_size, p.min_response))
}

fn configure_akaze(params: &AkazeParams) -> PipelineResult<Ptr<AKAZE>> {
    let mut akaze = AKAZE::create_def()?;
    akaze.set_descriptor_type(AKAZE_DescriptorType::DESCRIPTOR_MLDB)?;
    akaze.set_descriptor_size(params.descriptor_size)?;
    akaze.set_descriptor_channels(params.descriptor_channels)?;
    akaze.set_threshold(params.threshold as f64)?;
    akaze.set_n_octaves(params.octaves)?;
    akaze.set_n_octave_layers(params.octave_layers)?;
    Ok(akaze)
}

fn create_orb(p: &OrbParams) -> PipelineResult<Ptr<ORB>> {
    let score = if p.harris_score {
        ORB_ScoreType::HARRIS_SCORE
    } else {
        ORB_ScoreType::FAST_SCORE
    };
    Ok(ORB::create(
        p.n_features as i32,
        p.scale_factor,
        p.n_levels as i32,
        p.edge_threshold as i32,
        p.first_level as i32,
        p.wta_k as i32,
        score,
        p.patch_size as i32,
        p.fast_threshold as i32,
    )?)
}

fn create_sift(p: &SiftParams) -> PipelineResult<Ptr<SIFT>> {
    Ok(SIFT::create(
        p.n_features,
        p.octave_layers,
        p.contrast_threshold,
        p.edge_threshold,
        p.sigma,
        false,
    )?)
}

fn select<M: DescriptorMatcherTraitConst>(
    matcher: &M,
    query: &Mat,
    train: &Mat,
    selector: SelectorKind,
    params: &MatchParams,
) -> PipelineResult<Vec<FeatureMatch>> {
    match selector {
        SelectorKind::NearestNeighbor => {
            let mut matches = Vector::<DMatch>::new();
            matcher.train_match(query, train, &mut matches, &Mat::default())?;
            Ok(matches.iter().map(|m| from_dmatch(&m)).collect())
        }
        SelectorKind::KNearest => {
            let mut knn = Vector::<Vector<DMatch>>::new();
            matcher.knn_train_match(query, train, &mut knn, KNN_NEIGHBOURS as i32, &Mat::default(), false)?;
            let candidates: Vec<Vec<FeatureMatch>> = knn
                .iter()
                .map(|row| row.iter().map(|m| from_dmatch(&m)).collect())
                .collect();
            Ok(ratio_test(&candidates, params.knn_ratio))
        }
    }
}

impl FeatureBackend for OpenCvBackend {
    fn name(&self) -> &'static str {
        "opencv"
    }

    fn supports_detector(&self, _kind: DetectorKind) -> bool {
        true
    }

    fn supports_descriptor(&self, _kind: DescriptorKind) -> bool {
        true
    }

    fn supports_matcher(&self, _kind: MatcherKind) -> bool {
        true
    }

    fn detect(
        &self,
        image: &ImageView<'_>,
        kind: DetectorKind,
        params: &DetectorParams,
    ) -> PipelineResult<Vec<Keypoint>> {
        let mat = gray_mat(image)?;
        let keypoints = match kind {
            DetectorKind::ShiTomasi => shi_tomasi(&mat, params)?,
            DetectorKind::Harris => harris(&mat, params)?,
            DetectorKind::Fast => {
                let p = &params.fast;
                let mut fast = FastFeatureDetector::create(
                    p.threshold as i32,
                    p.nonmax_suppression,
                    FastFeatureDetector_DetectorType::TYPE_9_16,
                )?;
                detect_with(&mut fast, &mat)?
            }
            DetectorKind::Brisk => {
                let p = &params.brisk;
                detect_with(&mut BRISK::create(p.threshold, p.octaves, p.pattern_scale)?, &mat)?
            }
            DetectorKind::Orb => detect_with(&mut create_orb(&params.orb)?, &mat)?,
            DetectorKind::Akaze => detect_with(&mut configure_akaze(&params.akaze)?, &mat)?,
            DetectorKind::Sift => detect_with(&mut create_sift(&params.sift)?, &mat)?,
        };
        debug!("opencv {kind}: {} keypoints", keypoints.len());
        Ok(keypoints)
    }

    fn describe(
        &self,
        image: &ImageView<'_>,
        keypoints: Vec<Keypoint>,
        kind: DescriptorKind,
        params: &DescriptorParams,
    ) -> PipelineResult<(Vec<Keypoint>, Descriptors)> {
        let mat = gray_mat(image)?;
        match kind {
            DescriptorKind::Brisk => {
                let p = &params.brisk;
                compute_with(&mut BRISK::create(p.threshold, p.octaves, p.pattern_scale)?, &mat, &keypoints)
            }
            DescriptorKind::Brief => {
                let p = &params.brief;
                let mut brief = BriefDescriptorExtractor::create(p.bytes as i32, p.use_orientation)?;
                compute_with(&mut brief, &mat, &keypoints)
            }
            DescriptorKind::Orb => compute_with(&mut create_orb(&params.orb)?, &mat, &keypoints),
            DescriptorKind::Freak => {
                let p = &params.freak;
                let mut freak = FREAK::create(
                    p.orientation_normalized,
                    p.scale_normalized,
                    p.pattern_scale,
                    p.octaves,
                    &Vector::<i32>::new(),
                )?;
                compute_with(&mut freak, &mat, &keypoints)
            }
            DescriptorKind::Akaze => compute_with(&mut configure_akaze(&params.akaze)?, &mat, &keypoints),
            DescriptorKind::Sift => compute_with(&mut create_sift(&params.sift)?, &mat, &keypoints),
        }
    }

    fn match_descriptors(
        &self,
        query: &Descriptors,
        train: &Descriptors,
        matcher: MatcherKind,
        selector: SelectorKind,
        params: &MatchParams,
    ) -> PipelineResult<Vec<FeatureMatch>> {
        if query.is_empty() || train.is_empty() {
            return Ok(Vec::new());
        }

        match matcher {
            MatcherKind::BruteForce => {
                let norm = match query.norm() {
                    DistanceNorm::Hamming => NORM_HAMMING,
                    DistanceNorm::L2 => NORM_L2,
                };
                let bf = BFMatcher::create(norm, params.cross_check)?;
                select(&bf, &to_cv_descriptors(query)?, &to_cv_descriptors(train)?, selector, params)
            }
            // KD-trees only index floats.
            MatcherKind::Flann => {
                let flann = FlannBasedMatcher::create()?;
                let (query, train) = (query.to_float(), train.to_float());
                select(&flann, &to_cv_descriptors(&query)?, &to_cv_descriptors(&train)?, selector, params)
            }
        }
    }
}
