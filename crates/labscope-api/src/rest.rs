// JSON-over-REST transport (NSX-T)
//
// One authenticated GET per call. Basic auth is recomputed from the given
// credentials on every request; there is no token reuse. Non-2xx statuses
// are returned to the caller, only network failures become errors.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::{self, DEBUG_REST_ENV, TransportConfig};

/// A fully buffered REST response.
#[derive(Debug, Clone)]
pub struct RestResponse {
    pub status: u16,
    pub body: String,
}

impl RestResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Raw HTTP client for a Basic-auth JSON API.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    trace_bodies: bool,
}

impl RestClient {
    /// Create a client for `host` (bare hostname or full base URL).
    pub fn new(host: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let base_url = transport::base_url(host)?;
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            trace_bodies: transport::env_flag(DEBUG_REST_ENV),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET {base}{path}` with Basic auth.
    pub async fn get(
        &self,
        path: &str,
        username: &str,
        password: &SecretString,
    ) -> Result<RestResponse, Error> {
        let url = self.base_url.join(path)?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .basic_auth(username, Some(password.expose_secret()))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;

        if self.trace_bodies {
            debug!(path, status, body = %pretty_json(&body), "rest response");
        }

        Ok(RestResponse { status, body })
    }
}

/// Pretty-print a JSON body for diagnostics, falling back to the raw text.
fn pretty_json(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .and_then(|v| serde_json::to_string_pretty(&v))
        .unwrap_or_else(|_| body.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_json_formats_valid_json() {
        assert_eq!(pretty_json(r#"{"a":1}"#), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn pretty_json_passes_through_text() {
        assert_eq!(pretty_json("<html>nope</html>"), "<html>nope</html>");
    }
}
