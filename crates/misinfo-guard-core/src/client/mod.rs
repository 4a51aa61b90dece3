mod http;
mod settings;

use async_trait::async_trait;

use crate::assessment::{CheckRequest, RiskAssessment};
use crate::error::ErrorInfo;

pub use http::HttpRequestClient;
pub use settings::{parse_timeout, ClientSettings, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};

/// Issues risk-check calls against the external analysis engine.
///
/// Every failure mode comes back as an [`ErrorInfo`] value; implementations
/// never retry.
#[async_trait]
pub trait RequestClient: Send + Sync {
    async fn check(&self, request: &CheckRequest) -> Result<RiskAssessment, ErrorInfo>;
}

