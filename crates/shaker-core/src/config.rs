use std::time::Duration;

use url::Url;

use crate::constants::{
    API_PATH, DEFAULT_SERVER_URL, HEALTH_PATH, RECONNECT_DELAY_MS, REQUEST_TIMEOUT_SECS,
    SERVER_URL_ENV, WS_PATH,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported server URL scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    #[error("Server URL '{0}' has no host")]
    MissingHost(String),
}

/// Connection settings shared by the REST client and the push channel.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Server root, e.g. `http://localhost:8080` (no `/api` suffix)
    pub server_url: String,
    pub reconnect_delay: Duration,
    pub request_timeout: Duration,
}

impl CoreConfig {
    pub fn new<S: AsRef<str>>(server_url: S) -> Self {
        Self {
            server_url: normalize_server_url(server_url.as_ref()),
            reconnect_delay: Duration::from_millis(RECONNECT_DELAY_MS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }

    /// Reads `AGENT_SHAKER_URL`, falling back to the default server.
    pub fn from_env() -> Self {
        match std::env::var(SERVER_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url),
            _ => Self::default(),
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn parsed(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.server_url).map_err(|source| ConfigError::InvalidUrl {
            url: self.server_url.clone(),
            source,
        })
    }

    /// `scheme://host[:port]`, or the raw server URL when it does not parse.
    fn origin(&self) -> String {
        match self.parsed() {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                url.origin().ascii_serialization()
            }
            _ => self.server_url.clone(),
        }
    }

    pub fn is_secure(&self) -> bool {
        self.parsed()
            .map(|url| url.scheme() == "https")
            .unwrap_or(false)
    }

    pub fn api_base_url(&self) -> String {
        format!("{}{}", self.origin(), API_PATH)
    }

    pub fn health_url(&self) -> String {
        format!("{}{}", self.origin(), HEALTH_PATH)
    }

    /// Push channel endpoint for one project: `ws[s]://host[:port]/ws?project_id=<id>`.
    pub fn ws_url(&self, project_id: &str) -> Result<Url, ConfigError> {
        let base = self.parsed()?;
        let scheme = match base.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        };
        let host = base
            .host_str()
            .ok_or_else(|| ConfigError::MissingHost(self.server_url.clone()))?;
        let authority = match base.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let raw = format!("{}://{}{}", scheme, authority, WS_PATH);
        let mut url = Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl {
            url: raw.clone(),
            source,
        })?;
        url.query_pairs_mut().append_pair("project_id", project_id);
        Ok(url)
    }

    /// MCP endpoint carrying the agent identity, used by IDE integrations.
    pub fn mcp_url(&self, project_id: &str, agent_id: &str) -> String {
        let origin = self.origin();
        match Url::parse_with_params(&origin, &[("project_id", project_id), ("agent_id", agent_id)])
        {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}?project_id={}&agent_id={}", origin, project_id, agent_id),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}

/// Accepts both `http://host` and `http://host/api/` forms.
fn normalize_server_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    trimmed
        .strip_suffix(API_PATH)
        .unwrap_or(trimmed)
        .trim_end_matches('/')
        .to_string()
}
