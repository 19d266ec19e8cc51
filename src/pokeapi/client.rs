use crate::cache::FetchError;
use crate::config::{Config, RetryConfig};
use color_eyre::{eyre::eyre, Result};
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// When and how often a failed request is repeated.
///
/// Only errors that [`FetchError::is_retryable`] accepts are retried; the
/// delay doubles after every attempt up to `max_delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
  pub max_retries: u32,
  pub base_delay: Duration,
  pub max_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_retries: 3,
      base_delay: Duration::from_secs(1),
      max_delay: Duration::from_secs(30),
    }
  }
}

impl From<&RetryConfig> for RetryPolicy {
  fn from(config: &RetryConfig) -> Self {
    Self {
      max_retries: config.max_retries,
      base_delay: Duration::from_millis(config.base_delay_ms),
      max_delay: Duration::from_millis(config.max_delay_ms),
    }
  }
}

impl RetryPolicy {
  pub fn none() -> Self {
    Self {
      max_retries: 0,
      ..Self::default()
    }
  }

  /// Delay before retry number `attempt` (0-based).
  pub fn delay_for(&self, attempt: u32) -> Duration {
    self
      .base_delay
      .saturating_mul(2u32.saturating_pow(attempt))
      .min(self.max_delay)
  }

  pub fn should_retry(&self, error: &FetchError, attempt: u32) -> bool {
    attempt < self.max_retries && error.is_retryable()
  }
}

/// PokeAPI HTTP client
#[derive(Debug, Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: Url,
  retry: RetryPolicy,
}

impl ApiClient {
  pub fn new(config: &Config) -> Result<Self> {
    let base_url = Url::parse(&config.api.base_url)
      .map_err(|e| eyre!("Invalid API base url {}: {}", config.api.base_url, e))?;

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.api.timeout_secs))
      .user_agent(concat!("pokedex/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url,
      retry: RetryPolicy::from(&config.retry),
    })
  }

  /// Client with default HTTP settings against `base_url`.
  pub fn with_base_url(base_url: Url, retry: RetryPolicy) -> Self {
    Self {
      http: reqwest::Client::new(),
      base_url,
      retry,
    }
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  /// GET `url` and decode the JSON body, retrying per the retry policy.
  pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
    let mut attempt = 0;
    loop {
      match self.get_once(&url).await {
        Ok(value) => return Ok(value),
        Err(error) if self.retry.should_retry(&error, attempt) => {
          let delay = self.retry.delay_for(attempt);
          warn!(
            url = %url,
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "retrying request"
          );
          tokio::time::sleep(delay).await;
          attempt += 1;
        }
        Err(error) => return Err(error),
      }
    }
  }

  async fn get_once<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
    debug!(url = %url, "GET");

    let response = self
      .http
      .get(url.clone())
      .header(ACCEPT, "application/json")
      .send()
      .await
      .map_err(|e| FetchError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Status {
        status: status.as_u16(),
        url: url.to_string(),
      });
    }

    let body = response
      .bytes()
      .await
      .map_err(|e| FetchError::Transport(e.to_string()))?;

    serde_json::from_slice(&body).map_err(|e| FetchError::Parse(e.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pokeapi::types::Pokemon;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
      max_retries,
      base_delay: Duration::from_millis(1),
      max_delay: Duration::from_millis(5),
    }
  }

  fn client_for(server: &MockServer, retry: RetryPolicy) -> ApiClient {
    ApiClient::with_base_url(Url::parse(&server.uri()).unwrap(), retry)
  }

  fn url(server: &MockServer, p: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
  }

  #[tokio::test]
  async fn test_get_json_decodes_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/pokemon/25"))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "id": 25,
        "name": "pikachu",
        "types": [{ "slot": 1, "type": { "name": "electric", "url": "" } }]
      })))
      .expect(1)
      .mount(&server)
      .await;

    let client = client_for(&server, RetryPolicy::none());
    let pokemon: Pokemon = client.get_json(url(&server, "/pokemon/25")).await.unwrap();
    assert_eq!(pokemon.name, "pikachu");
    assert_eq!(pokemon.primary_type(), Some("electric"));
  }

  #[tokio::test]
  async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/pokemon/9999"))
      .respond_with(ResponseTemplate::new(404))
      .expect(1)
      .mount(&server)
      .await;

    let client = client_for(&server, fast_retry(3));
    let err = client
      .get_json::<Pokemon>(url(&server, "/pokemon/9999"))
      .await
      .unwrap_err();
    assert_eq!(err.status(), Some(404));
  }

  #[tokio::test]
  async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/pokemon/1"))
      .respond_with(ResponseTemplate::new(503))
      .expect(3)
      .mount(&server)
      .await;

    let client = client_for(&server, fast_retry(2));
    let err = client
      .get_json::<Pokemon>(url(&server, "/pokemon/1"))
      .await
      .unwrap_err();
    assert_eq!(err.status(), Some(503));
  }

  #[tokio::test]
  async fn test_retry_recovers_after_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/pokemon/1"))
      .respond_with(ResponseTemplate::new(500))
      .up_to_n_times(1)
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/pokemon/1"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1, "name": "bulbasaur"})),
      )
      .expect(1)
      .mount(&server)
      .await;

    let client = client_for(&server, fast_retry(2));
    let pokemon: Pokemon = client.get_json(url(&server, "/pokemon/1")).await.unwrap();
    assert_eq!(pokemon.id, 1);
  }

  #[tokio::test]
  async fn test_malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/pokemon/1"))
      .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
      .expect(1)
      .mount(&server)
      .await;

    let client = client_for(&server, fast_retry(3));
    let err = client
      .get_json::<Pokemon>(url(&server, "/pokemon/1"))
      .await
      .unwrap_err();
    assert!(matches!(err, FetchError::Parse(_)));
  }

  #[test]
  fn test_retry_delays_double_and_cap() {
    let policy = RetryPolicy {
      max_retries: 5,
      base_delay: Duration::from_millis(100),
      max_delay: Duration::from_millis(350),
    };
    assert_eq!(policy.delay_for(0), Duration::from_millis(100));
    assert_eq!(policy.delay_for(1), Duration::from_millis(200));
    assert_eq!(policy.delay_for(2), Duration::from_millis(350));
    assert_eq!(policy.delay_for(40), Duration::from_millis(350));
  }

  #[test]
  fn test_should_retry() {
    let policy = RetryPolicy::default();
    let transport = FetchError::Transport("connection reset".to_string());
    let throttled = FetchError::Status {
      status: 429,
      url: String::new(),
    };
    let parse = FetchError::Parse("eof".to_string());

    assert!(policy.should_retry(&transport, 0));
    assert!(policy.should_retry(&throttled, 2));
    assert!(!policy.should_retry(&throttled, 3));
    assert!(!policy.should_retry(&parse, 0));
    assert!(!RetryPolicy::none().should_retry(&transport, 0));
  }
}
