use async_trait::async_trait;
use dishpatch_application::ReadOperation;
use dishpatch_core::{AppError, AppResult};
use dishpatch_domain::IntentParameters;
use reqwest::header;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Read-only platform API call serving one capability.
pub struct HttpReadOperation {
    http_client: reqwest::Client,
    url: Url,
    bearer_token: Option<String>,
}

impl HttpReadOperation {
    /// Creates a read operation for `endpoint` relative to the platform API base URL.
    pub fn new(
        http_client: reqwest::Client,
        base_url: &Url,
        endpoint: &str,
        bearer_token: Option<String>,
    ) -> AppResult<Self> {
        let url = base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|error| {
                AppError::Validation(format!("invalid read endpoint '{endpoint}': {error}"))
            })?;

        Ok(Self {
            http_client,
            url,
            bearer_token,
        })
    }

    /// Returns the resolved endpoint URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Flattens intent parameters into query-string pairs.
///
/// Scalars are sent as-is, arrays as comma-separated lists and objects as
/// JSON text; `null` values are skipped.
fn query_pairs(parameters: &IntentParameters) -> Vec<(String, String)> {
    parameters
        .iter()
        .filter_map(|(key, value)| query_value(value).map(|value| (key.clone(), value)))
        .collect()
}

fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(query_value)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}

#[async_trait]
impl ReadOperation for HttpReadOperation {
    async fn fetch(&self, parameters: &IntentParameters) -> AppResult<Value> {
        let mut request = self
            .http_client
            .get(self.url.clone())
            .query(&query_pairs(parameters));
        if let Some(token) = &self.bearer_token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await.map_err(|error| {
            AppError::Upstream(format!("failed calling '{}': {error}", self.url.path()))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_owned());
            return Err(AppError::Upstream(format!(
                "'{}' responded with status {status}: {}",
                self.url.path(),
                body.trim()
            )));
        }

        debug!(path = self.url.path(), status = %status, "read operation responded");
        response.json::<Value>().await.map_err(|error| {
            AppError::Upstream(format!(
                "invalid JSON from '{}': {error}",
                self.url.path()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value, json};
    use url::Url;

    use super::{HttpReadOperation, query_pairs};

    #[test]
    fn endpoint_joins_under_base_path() {
        let base_url = Url::parse("https://api.dishpatch.test/v2/");
        let operation = base_url.ok().and_then(|base_url| {
            HttpReadOperation::new(reqwest::Client::new(), &base_url, "/admin/orders", None).ok()
        });
        assert!(matches!(
            operation,
            Some(ref operation) if operation.url().as_str() == "https://api.dishpatch.test/v2/admin/orders"
        ));
    }

    #[test]
    fn parameters_flatten_into_query_pairs() {
        let mut parameters = Map::new();
        parameters.insert("status".to_owned(), json!("pending"));
        parameters.insert("limit".to_owned(), json!(20));
        parameters.insert("cities".to_owned(), json!(["Pune", "Delhi"]));
        parameters.insert("cursor".to_owned(), Value::Null);
        parameters.insert("range".to_owned(), json!({"from": "2024-01-01"}));

        let pairs = query_pairs(&parameters);

        assert!(pairs.contains(&("status".to_owned(), "pending".to_owned())));
        assert!(pairs.contains(&("limit".to_owned(), "20".to_owned())));
        assert!(pairs.contains(&("cities".to_owned(), "Pune,Delhi".to_owned())));
        assert!(pairs.contains(&("range".to_owned(), "{\"from\":\"2024-01-01\"}".to_owned())));
        assert!(!pairs.iter().any(|(key, _)| key == "cursor"));
    }
}
