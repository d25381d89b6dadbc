//! Structured spans for request and comparison logging

use instant::Instant;
use tracing::{field, span, Level, Span};
use uuid::Uuid;

/// Span covering one upload request from multipart parsing to response.
pub struct RequestSpan {
    span: Span,
    request_id: Uuid,
    start_time: Instant,
}

impl RequestSpan {
    pub fn new() -> Self {
        let request_id = Uuid::new_v4();
        let span = span!(
            Level::INFO,
            "upload_request",
            request_id = %request_id,
            filename = field::Empty,
            status = field::Empty,
        );

        Self {
            span,
            request_id,
            start_time: Instant::now(),
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn record_filename(&self, filename: &str) {
        self.span.record("filename", filename);
    }

    /// Record the response status and emit the completion event.
    pub fn finish(&self, status: u16) {
        self.span.record("status", status);
        tracing::info!(
            parent: &self.span,
            status = status,
            elapsed_ms = self.start_time.elapsed().as_millis() as u64,
            "Upload request completed"
        );
    }
}

impl Default for RequestSpan {
    fn default() -> Self {
        Self::new()
    }
}

/// Span for a single reference-vs-upload comparison.
pub struct ComparisonSpan {
    span: Span,
    start_time: Instant,
}

impl ComparisonSpan {
    pub fn new(request_id: Option<Uuid>) -> Self {
        let span = match request_id {
            Some(id) => span!(
                Level::INFO,
                "comparison",
                request_id = %id,
                reference_width = field::Empty,
                reference_height = field::Empty,
                resized = field::Empty,
                score = field::Empty,
                tampered = field::Empty,
            ),
            None => span!(
                Level::INFO,
                "comparison",
                reference_width = field::Empty,
                reference_height = field::Empty,
                resized = field::Empty,
                score = field::Empty,
                tampered = field::Empty,
            ),
        };

        Self {
            span,
            start_time: Instant::now(),
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn record_dimensions(&self, reference: (u32, u32), uploaded: (u32, u32)) {
        self.span.record("reference_width", reference.0);
        self.span.record("reference_height", reference.1);
        tracing::debug!(
            parent: &self.span,
            reference_width = reference.0,
            reference_height = reference.1,
            uploaded_width = uploaded.0,
            uploaded_height = uploaded.1,
            "Images decoded"
        );
    }

    pub fn record_resize(&self, resized: bool) {
        self.span.record("resized", resized);
        if resized {
            tracing::debug!(parent: &self.span, "Upload resampled to reference dimensions");
        }
    }

    pub fn record_result(&self, score: f64, tampered: bool) {
        self.span.record("score", score);
        self.span.record("tampered", tampered);
        tracing::info!(
            parent: &self.span,
            score = score,
            tampered = tampered,
            execution_time_ms = self.start_time.elapsed().as_millis() as u64,
            "Comparison completed"
        );
    }

    pub fn record_error(&self, error: &dyn std::error::Error) {
        tracing::warn!(
            parent: &self.span,
            error = %error,
            execution_time_ms = self.start_time.elapsed().as_millis() as u64,
            "Comparison failed"
        );
    }
}
