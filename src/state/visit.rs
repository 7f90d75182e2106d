use serde::{Deserialize, Serialize};

/// Outcome of a single visit, as reported by a fetcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitResult {
    /// Whether the target answered successfully
    pub success: bool,

    /// Wall-clock latency of the visit in seconds (0.0 when not measured)
    pub latency_seconds: f64,

    /// Short classification of the failure, if any
    pub error_kind: Option<String>,
}

impl VisitResult {
    pub fn success(latency_seconds: f64) -> Self {
        Self {
            success: true,
            latency_seconds,
            error_kind: None,
        }
    }

    pub fn failure(error_kind: impl Into<String>) -> Self {
        Self {
            success: false,
            latency_seconds: 0.0,
            error_kind: Some(error_kind.into()),
        }
    }

    /// Attaches the measured latency to a result
    pub fn with_latency(mut self, latency_seconds: f64) -> Self {
        self.latency_seconds = latency_seconds;
        self
    }
}
