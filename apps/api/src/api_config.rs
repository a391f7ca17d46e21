use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use dishpatch_core::AppError;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Where capability read operations get their data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOperationsConfig {
    /// Platform admin read API.
    Http {
        base_url: Url,
        service_token: Option<String>,
    },
    /// Seeded in-memory records for local development.
    Fixture,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub intent_resolver_url: Url,
    pub intent_resolver_api_key: Option<String>,
    pub intent_min_confidence: f32,
    pub upstream_timeout: Duration,
    pub session_idle_timeout: Duration,
    pub read_operations: ReadOperationsConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let intent_resolver_url = parse_base_url(
            "INTENT_RESOLVER_URL",
            required_non_empty_env("INTENT_RESOLVER_URL")?.as_str(),
        )?;
        let intent_resolver_api_key = optional_env("INTENT_RESOLVER_API_KEY");
        let intent_min_confidence = env::var("INTENT_MIN_CONFIDENCE")
            .ok()
            .map(|value| parse_min_confidence(value.as_str()))
            .transpose()?
            .unwrap_or(0.0);
        let upstream_timeout = env::var("UPSTREAM_TIMEOUT_MS")
            .ok()
            .map(|value| parse_timeout_millis(value.as_str()))
            .transpose()?
            .unwrap_or(Duration::from_millis(10_000));

        let session_idle_timeout = env::var("SESSION_IDLE_TIMEOUT_SECS")
            .ok()
            .map(|value| parse_idle_timeout_secs(value.as_str()))
            .transpose()?
            .unwrap_or(Duration::from_secs(30 * 60));

        let read_operations = match env::var("READ_OPERATIONS_MODE")
            .unwrap_or_else(|_| "http".to_owned())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "http" => ReadOperationsConfig::Http {
                base_url: parse_base_url(
                    "PLATFORM_API_BASE_URL",
                    required_non_empty_env("PLATFORM_API_BASE_URL")?.as_str(),
                )?,
                service_token: optional_env("PLATFORM_API_TOKEN"),
            },
            "fixture" => ReadOperationsConfig::Fixture,
            other => {
                return Err(AppError::Validation(format!(
                    "READ_OPERATIONS_MODE must be either 'http' or 'fixture', got '{other}'"
                )));
            }
        };

        Ok(Self {
            frontend_url,
            api_host,
            api_port,
            intent_resolver_url,
            intent_resolver_api_key,
            intent_min_confidence,
            upstream_timeout,
            session_idle_timeout,
            read_operations,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

/// Parses a base URL, making sure relative joins keep its path.
fn parse_base_url(name: &str, value: &str) -> Result<Url, AppError> {
    let trimmed = value.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_owned()
    } else {
        format!("{trimmed}/")
    };

    let url = Url::parse(normalized.as_str())
        .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Validation(format!(
            "{name} must use http or https, got '{}'",
            url.scheme()
        )));
    }

    Ok(url)
}

fn parse_min_confidence(value: &str) -> Result<f32, AppError> {
    let confidence = value
        .trim()
        .parse::<f32>()
        .map_err(|error| AppError::Validation(format!("invalid INTENT_MIN_CONFIDENCE: {error}")))?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(AppError::Validation(format!(
            "INTENT_MIN_CONFIDENCE must be between 0 and 1, got {confidence}"
        )));
    }

    Ok(confidence)
}

fn parse_timeout_millis(value: &str) -> Result<Duration, AppError> {
    let millis = value
        .trim()
        .parse::<u64>()
        .map_err(|error| AppError::Validation(format!("invalid UPSTREAM_TIMEOUT_MS: {error}")))?;
    if millis == 0 {
        return Err(AppError::Validation(
            "UPSTREAM_TIMEOUT_MS must be greater than zero".to_owned(),
        ));
    }

    Ok(Duration::from_millis(millis))
}

fn parse_idle_timeout_secs(value: &str) -> Result<Duration, AppError> {
    let secs = value.trim().parse::<u64>().map_err(|error| {
        AppError::Validation(format!("invalid SESSION_IDLE_TIMEOUT_SECS: {error}"))
    })?;
    if secs == 0 {
        return Err(AppError::Validation(
            "SESSION_IDLE_TIMEOUT_SECS must be greater than zero".to_owned(),
        ));
    }

    Ok(Duration::from_secs(secs))
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use dishpatch_core::AppError;

    use super::{
        parse_base_url, parse_idle_timeout_secs, parse_min_confidence, parse_timeout_millis,
    };

    #[test]
    fn base_url_gains_trailing_slash() {
        let url = parse_base_url("PLATFORM_API_BASE_URL", "https://api.dishpatch.test/v2");
        assert!(matches!(
            url,
            Ok(ref url) if url.as_str() == "https://api.dishpatch.test/v2/"
        ));
    }

    #[test]
    fn base_url_rejects_other_schemes() {
        assert!(matches!(
            parse_base_url("INTENT_RESOLVER_URL", "ftp://nlu.internal"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            parse_base_url("INTENT_RESOLVER_URL", "not a url"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn min_confidence_must_be_a_probability() {
        assert!(matches!(parse_min_confidence("0.65"), Ok(value) if (value - 0.65).abs() < f32::EPSILON));
        assert!(matches!(parse_min_confidence("1.5"), Err(AppError::Validation(_))));
        assert!(matches!(parse_min_confidence("high"), Err(AppError::Validation(_))));
    }

    #[test]
    fn timeout_must_be_positive_millis() {
        assert!(matches!(
            parse_timeout_millis("2500"),
            Ok(value) if value == Duration::from_millis(2500)
        ));
        assert!(matches!(parse_timeout_millis("0"), Err(AppError::Validation(_))));
        assert!(matches!(parse_timeout_millis("-1"), Err(AppError::Validation(_))));
    }

    #[test]
    fn idle_timeout_must_be_positive_seconds() {
        assert!(matches!(
            parse_idle_timeout_secs("900"),
            Ok(value) if value == Duration::from_secs(900)
        ));
        assert!(matches!(parse_idle_timeout_secs("0"), Err(AppError::Validation(_))));
        assert!(matches!(parse_idle_timeout_secs("soon"), Err(AppError::Validation(_))));
    }
}
