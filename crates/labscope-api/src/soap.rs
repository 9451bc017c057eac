// XML/SOAP-over-HTTPS transport (vSphere)
//
// Every call is a POST to the fixed `/sdk` path. Session state lives in
// cookies: the response's `Set-Cookie` values are trimmed to `name=value`
// and handed back so the caller can replay them on later requests.

use std::borrow::Cow;

use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::{self, DEBUG_SOAP_ENV, TransportConfig};

/// Fixed SOAP endpoint path on vCenter / ESXi.
pub const SDK_PATH: &str = "/sdk";

/// vSphere API namespace used on every request body.
pub const VIM25_NS: &str = "urn:vim25";

/// A fully buffered SOAP response.
#[derive(Debug, Clone)]
pub struct SoapResponse {
    pub status: u16,
    pub body: String,
    /// `Set-Cookie` values reduced to their `name=value` segment.
    pub cookies: Vec<String>,
}

impl SoapResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Raw HTTP client for the vSphere SOAP endpoint.
#[derive(Debug, Clone)]
pub struct SoapClient {
    http: reqwest::Client,
    endpoint: Url,
    trace_bodies: bool,
}

impl SoapClient {
    /// Create a client for `host` (bare hostname or full base URL).
    pub fn new(host: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let base_url = transport::base_url(host)?;
        let http = transport.build_client()?;
        Self::with_client(http, &base_url)
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: &Url) -> Result<Self, Error> {
        Ok(Self {
            http,
            endpoint: base_url.join(SDK_PATH)?,
            trace_bodies: transport::env_flag(DEBUG_SOAP_ENV),
        })
    }

    /// The full `/sdk` endpoint URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// POST a complete envelope with the given `SOAPAction`.
    ///
    /// `cookies` are sent as a single `Cookie` header when non-empty.
    pub async fn post(
        &self,
        body: String,
        action: &str,
        cookies: &[String],
    ) -> Result<SoapResponse, Error> {
        debug!(action, "POST {}", self.endpoint);
        if self.trace_bodies {
            debug!(action, request = %redact_password(&body), "soap request");
        }

        let mut req = self
            .http
            .post(self.endpoint.clone())
            .header("SOAPAction", action)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .body(body);

        if !cookies.is_empty() {
            req = req.header(COOKIE, cookies.join("; "));
        }

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let cookies = resp
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(trim_cookie)
            .collect();
        let body = resp.text().await?;

        if self.trace_bodies {
            debug!(action, status, response = %body, "soap response");
        }

        Ok(SoapResponse {
            status,
            body,
            cookies,
        })
    }
}

/// Mask the contents of every `<password>` element for logging.
fn redact_password(body: &str) -> Cow<'_, str> {
    const OPEN: &str = "<password>";
    const CLOSE: &str = "</password>";
    if !body.contains(OPEN) {
        return Cow::Borrowed(body);
    }

    let mut out = String::with_capacity(body.len());
    let mut rest = body;
    while let Some(start) = rest.find(OPEN) {
        let value_start = start + OPEN.len();
        out.push_str(&rest[..value_start]);
        out.push_str("****");
        rest = match rest[value_start..].find(CLOSE) {
            Some(end) => &rest[value_start + end..],
            None => "",
        };
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Reduce a `Set-Cookie` value to `name=value`, dropping Path/Expires/etc.
fn trim_cookie(raw: &str) -> Option<String> {
    let pair = raw.split(';').next()?.trim();
    if pair.is_empty() {
        None
    } else {
        Some(pair.to_owned())
    }
}

/// Wrap an operation body in the fixed SOAP 1.1 envelope.
pub fn envelope(inner: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/""#,
            r#" xmlns:xsd="http://www.w3.org/2001/XMLSchema""#,
            r#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<soapenv:Body>{}</soapenv:Body>",
            "</soapenv:Envelope>"
        ),
        inner
    )
}
