use async_trait::async_trait;
use dishpatch_application::{IntentResolver, ResolverError};
use dishpatch_domain::{IntentParameters, ResolvedIntent};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// HTTP client for the external language-understanding service.
///
/// Calls are made once per submission; this adapter never retries.
pub struct HttpIntentResolver {
    http_client: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
    min_confidence: f32,
}

#[derive(Debug, Serialize)]
struct ResolveIntentRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResolveIntentResponse {
    capability: Option<String>,
    #[serde(default)]
    parameters: IntentParameters,
    confidence: Option<f32>,
}

impl HttpIntentResolver {
    /// Creates a resolver client posting to `{base_url}/v1/intents/resolve`.
    pub fn new(
        http_client: reqwest::Client,
        base_url: &Url,
        api_key: Option<String>,
        min_confidence: f32,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            http_client,
            endpoint: base_url.join("v1/intents/resolve")?,
            api_key,
            min_confidence: min_confidence.clamp(0.0, 1.0),
        })
    }

    fn interpret(
        &self,
        status: StatusCode,
        body: &str,
    ) -> Result<ResolvedIntent, ResolverError> {
        if status == StatusCode::UNPROCESSABLE_ENTITY || status == StatusCode::NOT_FOUND {
            return Err(ResolverError::Ambiguous(format!(
                "resolver found no capability (status {status})"
            )));
        }
        if !status.is_success() {
            return Err(ResolverError::Unavailable(format!(
                "resolver responded with status {status}: {}",
                body.trim()
            )));
        }

        let response: ResolveIntentResponse = serde_json::from_str(body).map_err(|error| {
            ResolverError::Unavailable(format!("invalid resolver response: {error}"))
        })?;

        if let Some(confidence) = response.confidence
            && confidence < self.min_confidence
        {
            return Err(ResolverError::Ambiguous(format!(
                "resolver confidence {confidence:.2} is below {:.2}",
                self.min_confidence
            )));
        }

        let capability = response.capability.unwrap_or_default();
        let intent = ResolvedIntent::new(capability, response.parameters)
            .map_err(|_| ResolverError::Ambiguous("resolver returned no capability".to_owned()))?;

        Ok(match response.confidence {
            Some(confidence) => intent.with_confidence(confidence),
            None => intent,
        })
    }
}

#[async_trait]
impl IntentResolver for HttpIntentResolver {
    async fn resolve(&self, text: &str) -> Result<ResolvedIntent, ResolverError> {
        let mut request = self
            .http_client
            .post(self.endpoint.clone())
            .json(&ResolveIntentRequest { text });
        if let Some(api_key) = &self.api_key {
            request = request.header("x-api-key", api_key);
        }

        let response = request.send().await.map_err(|error| {
            ResolverError::Unavailable(format!("failed calling intent resolver: {error}"))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            ResolverError::Unavailable(format!("failed reading intent resolver response: {error}"))
        })?;

        debug!(status = %status, "intent resolver responded");
        self.interpret(status, body.as_str())
    }
}
