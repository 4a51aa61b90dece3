use super::{ClientSettings, RequestClient};
use crate::assessment::{CheckRequest, RiskAssessment};
use crate::error::ErrorInfo;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

/// [`RequestClient`] speaking JSON over HTTP to `POST {endpoint}/v1/check`.
#[derive(Debug, Clone)]
pub struct HttpRequestClient {
    http: Client,
    url: String,
}

impl HttpRequestClient {
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        let http = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.timeout)
            .build()
            .context("failed to build risk engine HTTP client")?;
        Ok(Self {
            http,
            url: settings.check_url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RequestClient for HttpRequestClient {
    #[instrument(name = "risk_check", skip(self, request), fields(lang = %request.lang, text_len = request.text.len()))]
    async fn check(&self, request: &CheckRequest) -> Result<RiskAssessment, ErrorInfo> {
        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "risk engine unreachable");
                transport_error(&err)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "risk engine returned an error status");
            return Err(ErrorInfo::server(format!(
                "risk engine error ({}): {}",
                status,
                error_detail(&body)
            )));
        }

        let assessment: RiskAssessment = response.json().await.map_err(|err| {
            if err.is_timeout() {
                transport_error(&err)
            } else {
                ErrorInfo::server(format!("malformed risk engine response: {err}"))
            }
        })?;
        debug!(
            score = assessment.risk.score,
            evidence = assessment.evidence.len(),
            "risk check completed"
        );
        Ok(assessment)
    }
}

fn transport_error(err: &reqwest::Error) -> ErrorInfo {
    if err.is_timeout() {
        ErrorInfo::transport(format!("risk engine timed out: {err}"))
    } else {
        ErrorInfo::transport(format!("failed to reach risk engine: {err}"))
    }
}

#[derive(Deserialize)]
struct EngineError {
    error: String,
}

// The engine reports failures as `{"error": "..."}`; fall back to the raw body.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<EngineError>(body) {
        Ok(engine) => engine.error,
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => truncate(body.trim(), 300),
    }
}

fn truncate(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    input.chars().take(max_chars).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::{Lang, Stance};
    use crate::error::ErrorKind;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    fn client_for(base_url: String) -> HttpRequestClient {
        let settings = ClientSettings {
            endpoint: base_url,
            timeout: Duration::from_secs(5),
            ..ClientSettings::default()
        };
        HttpRequestClient::new(&settings).unwrap()
    }

    #[tokio::test]
    async fn check_parses_successful_response() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/check")
                    .json_body(json!({"text": "Drinking bleach cures COVID", "lang": "en"}));
                then.status(200).json_body(json!({
                    "risk": {"score": 92},
                    "explanation_md": "Contradicted by health authorities.",
                    "lesson_md": "Miracle cures are a red flag.",
                    "evidence": [{"url": "https://who.int/x", "source": "WHO", "stance": "refutes"}]
                }));
            })
            .await;

        let client = client_for(server.base_url());
        let assessment = client
            .check(&CheckRequest::new("Drinking bleach cures COVID", Lang::En))
            .await
            .unwrap();
        assert_eq!(assessment.risk.score, 92);
        assert_eq!(assessment.evidence.len(), 1);
        assert_eq!(assessment.evidence[0].stance, Stance::Refutes);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_server_error_with_engine_message() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/check");
                then.status(400)
                    .json_body(json!({"error": "Text input is required"}));
            })
            .await;

        let client = client_for(server.base_url());
        let err = client
            .check(&CheckRequest::new(" ", Lang::En))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Server);
        assert!(err.message.contains("400"));
        assert!(err.message.contains("Text input is required"));
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn malformed_body_is_server_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/check");
                then.status(200).body("<html>not json</html>");
            })
            .await;

        let client = client_for(server.base_url());
        let err = client
            .check(&CheckRequest::new("hello", Lang::En))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Server);
        assert!(err.message.contains("malformed"));
    }

    #[tokio::test]
    async fn unreachable_engine_is_transport_error() {
        let client = client_for("http://127.0.0.1:9".into());
        let err = client
            .check(&CheckRequest::new("hello", Lang::En))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transport);
    }

    #[test]
    fn error_detail_falls_back_to_raw_body() {
        assert_eq!(error_detail(r#"{"error":"boom"}"#), "boom");
        assert_eq!(error_detail("gateway down"), "gateway down");
        assert_eq!(error_detail(""), "no response body");
    }

    #[test]
    fn truncate_long_strings_adds_ellipsis() {
        assert_eq!(truncate("abcdefghijklmnopqrstuvwxyz", 5), "abcde…");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
