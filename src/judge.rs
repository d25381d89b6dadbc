//! Similarity judge: decides whether an upload matches the reference document.

use std::path::Path;
use std::sync::Arc;

use image::GrayImage;
use instant::Instant;
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::{mean_ssim, SsimParams};
use crate::config::{DimensionPolicy, JudgeConfig};
use crate::data::{decode_grayscale, match_dimensions, validate_image_size};
use crate::error::{DetectorError, ImageRole, Result};
use crate::logging::ComparisonSpan;
use crate::reference::ReferenceProvider;

pub const TAMPERED_MESSAGE: &str = "The PAN card is most likely tampered.";
pub const NOT_TAMPERED_MESSAGE: &str = "The PAN card is not tampered.";

/// Outcome of one comparison.
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub tampered: bool,
    pub message: String,
    pub score: f64,
    pub threshold: f64,
    pub dimensions: (u32, u32),
    pub resized: bool,
    pub processing_time_ms: f32,
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

impl Verdict {
    fn new(score: f64, threshold: f64, dimensions: (u32, u32), resized: bool) -> Self {
        let tampered = is_tampered(score, threshold);
        let message = if tampered { TAMPERED_MESSAGE } else { NOT_TAMPERED_MESSAGE };

        Self {
            tampered,
            message: message.to_string(),
            score,
            threshold,
            dimensions,
            resized,
            processing_time_ms: 0.0,
            checked_at: chrono::Utc::now(),
        }
    }
}

/// An upload passes only when its score is strictly above the threshold.
/// NaN never passes.
#[allow(clippy::neg_cmp_op_on_partial_ord)]
pub fn is_tampered(score: f64, threshold: f64) -> bool {
    !(score > threshold)
}

pub struct SimilarityJudge {
    reference: Arc<dyn ReferenceProvider>,
    params: SsimParams,
    threshold: f64,
    dimension_policy: DimensionPolicy,
    max_dimension: u32,
}

impl SimilarityJudge {
    pub fn new(reference: Arc<dyn ReferenceProvider>, config: &JudgeConfig) -> Self {
        Self {
            reference,
            params: SsimParams {
                window_size: config.window_size,
                k1: config.k1,
                k2: config.k2,
            },
            threshold: config.threshold,
            dimension_policy: config.dimension_policy,
            max_dimension: config.max_dimension,
        }
    }

    /// Compare an upload already written to disk.
    pub fn judge_file(&self, uploaded: &Path, request_id: Option<Uuid>) -> Result<Verdict> {
        let bytes = std::fs::read(uploaded)?;
        self.judge_bytes(&bytes, request_id)
    }

    /// Compare encoded upload bytes against the reference.
    pub fn judge_bytes(&self, uploaded: &[u8], request_id: Option<Uuid>) -> Result<Verdict> {
        let span = ComparisonSpan::new(request_id);
        let _entered = span.span().enter();

        let result = self.compare(uploaded, &span);
        if let Err(ref e) = result {
            span.record_error(e);
        }
        result
    }

    fn compare(&self, uploaded: &[u8], span: &ComparisonSpan) -> Result<Verdict> {
        let start = Instant::now();

        // The reference is checked first: a missing template is a deployment
        // failure regardless of what was uploaded.
        let reference_bytes = self.reference.load_reference()?;
        let reference = self.prepare(&reference_bytes, ImageRole::Reference)?;
        let uploaded = self.prepare(uploaded, ImageRole::Uploaded)?;
        span.record_dimensions(reference.dimensions(), uploaded.dimensions());

        let (uploaded, resized) = match_dimensions(&reference, uploaded, self.dimension_policy)?;
        span.record_resize(resized);

        let score = mean_ssim(&reference, &uploaded, &self.params).ok_or_else(|| {
            DetectorError::ImageTooSmall {
                role: ImageRole::Reference,
                width: reference.width(),
                height: reference.height(),
                min: self.params.window_size,
            }
        })?;

        let mut verdict = Verdict::new(score, self.threshold, reference.dimensions(), resized);
        verdict.processing_time_ms = start.elapsed().as_secs_f32() * 1000.0;
        span.record_result(score, verdict.tampered);
        Ok(verdict)
    }

    fn prepare(&self, bytes: &[u8], role: ImageRole) -> Result<GrayImage> {
        let img = decode_grayscale(bytes, role)?;
        validate_image_size(&img, role, self.params.window_size, self.max_dimension)?;
        Ok(img)
    }
}
