//! Single-attempt JSON transport for backend REST APIs
//!
//! A fetch either yields parsed JSON or [`Unavailable`]. There are no
//! retries here; a caller that wants backoff builds it on top.

use crate::constants::REQUEST_TIMEOUT;
use log::{debug, warn};
use remote_sens_types::{BackendConfig, BackendFamily, Credentials};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

/// Header carrying a Plex session token
pub const PLEX_TOKEN_HEADER: &str = "x-plex-token";

/// Why a fetch produced no payload
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Unavailable {
    #[error("backend not configured")]
    NotConfigured,
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Request(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Something that can GET a JSON document relative to a backend root
pub trait Transport: Send + Sync {
    fn fetch(&self, path: &str) -> Result<Value, Unavailable>;
}

/// Type-erased transport for dynamic dispatch
pub type BoxedTransport = Box<dyn Transport>;

/// Build the authentication header for a set of credentials
///
/// API tokens need both an id and a secret; a token id that already
/// contains `!` is taken as the full `principal!id` form.
pub fn auth_header(credentials: &Credentials) -> Option<(HeaderName, String)> {
    match credentials {
        Credentials::None => None,
        Credentials::SessionToken { token } if !token.is_empty() => {
            Some((HeaderName::from_static(PLEX_TOKEN_HEADER), token.clone()))
        }
        Credentials::SessionToken { .. } => None,
        Credentials::ApiToken {
            username,
            token_id,
            secret,
        } => {
            if token_id.is_empty() || secret.is_empty() {
                return None;
            }
            let full = if token_id.contains('!') {
                format!("{}={}", token_id, secret)
            } else {
                format!(
                    "{}!{}={}",
                    username.as_deref().unwrap_or_default(),
                    token_id,
                    secret
                )
            };
            Some((AUTHORIZATION, format!("PVEAPIToken={}", full)))
        }
    }
}

/// Blocking HTTP transport with a fixed timeout
pub struct HttpTransport {
    family: BackendFamily,
    base_url: String,
    /// None when the backend is unconfigured or the client failed to build
    client: Option<Client>,
}

impl HttpTransport {
    pub fn new(config: &BackendConfig) -> Self {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    /// Like [`HttpTransport::new`] with a custom request timeout
    pub fn with_timeout(config: &BackendConfig, timeout: Duration) -> Self {
        let client = if config.is_configured() {
            Self::build_client(config, timeout)
        } else {
            debug!("[{}] no base URL configured, transport disabled", config.family);
            None
        };

        Self {
            family: config.family,
            base_url: config.base_url.clone(),
            client,
        }
    }

    fn build_client(config: &BackendConfig, timeout: Duration) -> Option<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some((name, value)) = auth_header(&config.credentials) {
            match HeaderValue::from_str(&value) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(name, value);
                }
                Err(e) => warn!("[{}] credentials are not a valid header: {}", config.family, e),
            }
        }

        if !config.verify_tls {
            debug!("[{}] TLS certificate verification disabled", config.family);
        }

        match Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
        {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("[{}] failed to build HTTP client: {}", config.family, e);
                None
            }
        }
    }

    fn get(&self, client: &Client, path: &str) -> Result<Value, Unavailable> {
        let url = format!("{}{}", self.base_url, path);
        let response = client.get(&url).send().map_err(|e| {
            if e.is_timeout() {
                Unavailable::Timeout
            } else {
                Unavailable::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Unavailable::Status(status.as_u16()));
        }

        response
            .json::<Value>()
            .map_err(|e| Unavailable::Malformed(e.to_string()))
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, path: &str) -> Result<Value, Unavailable> {
        let client = self.client.as_ref().ok_or(Unavailable::NotConfigured)?;
        let result = self.get(client, path);
        if let Err(e) = &result {
            warn!("[{}] {} for {}", self.family, e, path);
        }
        result
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use scripted::ScriptedTransport;

#[cfg(any(test, feature = "test-utils"))]
mod scripted {
    use super::{Transport, Unavailable};
    use serde_json::Value;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Script {
        responses: HashMap<String, VecDeque<Result<Value, Unavailable>>>,
        requests: Vec<String>,
    }

    /// Transport that replays scripted responses per path
    ///
    /// Each path holds a queue; the last queued response repeats once the
    /// queue is drained. Unscripted paths answer with HTTP 404. Clones share
    /// state so requests can be inspected after the transport is moved
    /// into a source.
    #[derive(Clone, Default)]
    pub struct ScriptedTransport {
        script: Arc<Mutex<Script>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a successful response for `path`
        pub fn respond(&self, path: &str, body: Value) -> &Self {
            self.push(path, Ok(body))
        }

        /// Queue a failure for `path`
        pub fn fail(&self, path: &str, reason: Unavailable) -> &Self {
            self.push(path, Err(reason))
        }

        fn push(&self, path: &str, result: Result<Value, Unavailable>) -> &Self {
            let mut script = self.script.lock().unwrap_or_else(|p| p.into_inner());
            script
                .responses
                .entry(path.to_string())
                .or_default()
                .push_back(result);
            self
        }

        /// Every path requested so far, in order
        pub fn requests(&self) -> Vec<String> {
            let script = self.script.lock().unwrap_or_else(|p| p.into_inner());
            script.requests.clone()
        }

        pub fn request_count(&self) -> usize {
            let script = self.script.lock().unwrap_or_else(|p| p.into_inner());
            script.requests.len()
        }
    }

    impl Transport for ScriptedTransport {
        fn fetch(&self, path: &str) -> Result<Value, Unavailable> {
            let mut script = self.script.lock().unwrap_or_else(|p| p.into_inner());
            script.requests.push(path.to_string());
            match script.responses.get_mut(path) {
                Some(queue) if queue.len() > 1 => queue
                    .pop_front()
                    .unwrap_or(Err(Unavailable::Status(404))),
                Some(queue) => queue
                    .front()
                    .cloned()
                    .unwrap_or(Err(Unavailable::Status(404))),
                None => Err(Unavailable::Status(404)),
            }
        }
    }
}
