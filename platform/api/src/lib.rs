//! REST plumbing shared by every CRM surface.
//!
//! [`CrmClient`] speaks to the deal, quotation, lead, meeting and recycle-bin
//! endpoints. Responses are narrowed into [`entity`] records at this boundary;
//! list entries that fail to decode are dropped with a warning.

mod client;

use std::time::Duration;

use thiserror::Error;
use url::Url;

pub use client::CrmClient;
pub use reqwest::StatusCode;

/// Shared client result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} answered {status}: {message}")]
    Status {
        endpoint: String,
        status: StatusCode,
        message: String,
    },
    #[error("unexpected response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Transport { .. } => "TRANSPORT",
            ApiError::Status { status, .. } if *status == StatusCode::NOT_FOUND => "NOT_FOUND",
            ApiError::Status { .. } => "STATUS",
            ApiError::Decode { .. } => "DECODE",
            ApiError::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == "NOT_FOUND"
    }
}

/// Where the backend lives. Built once and handed to [`CrmClient::new`].
#[derive(Clone, Debug)]
pub struct ApiConfig {
    base_url: Url,
    leads_url: Url,
    timeout: Option<Duration>,
}

impl ApiConfig {
    /// `base_url` is the API root, e.g. `http://localhost:5000/api`.
    /// The leads endpoint defaults to `<base_url>/NewLeads`.
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let mut base = parse_http_url(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let leads_url = base
            .join("NewLeads")
            .map_err(|err| ApiError::InvalidConfig(err.to_string()))?;
        Ok(Self {
            base_url: base,
            leads_url,
            timeout: None,
        })
    }

    /// The leads collection may be served by a different deployment.
    pub fn with_leads_url(mut self, leads_url: &str) -> ApiResult<Self> {
        self.leads_url = parse_http_url(leads_url)?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn leads_url(&self) -> &Url {
        &self.leads_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

fn parse_http_url(raw: &str) -> ApiResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|err| ApiError::InvalidConfig(format!("`{raw}`: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ApiError::InvalidConfig(format!(
            "`{raw}` is not an http(s) URL"
        )));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash_and_default_leads_endpoint() {
        let config = ApiConfig::new("http://localhost:5000/api").unwrap();
        assert_eq!(config.base_url().as_str(), "http://localhost:5000/api/");
        assert_eq!(
            config.leads_url().as_str(),
            "http://localhost:5000/api/NewLeads"
        );
        assert!(config.timeout().is_none());
    }

    #[test]
    fn leads_can_live_elsewhere() {
        let config = ApiConfig::new("http://localhost:5000/api/")
            .unwrap()
            .with_leads_url("https://leads.example.com/api/NewLeads")
            .unwrap();
        assert_eq!(config.leads_url().host_str(), Some("leads.example.com"));
    }

    #[test]
    fn rejects_non_http_urls() {
        let err = ApiConfig::new("mailto:sales@example.com").unwrap_err();
        assert_eq!(err.code(), "INVALID_CONFIG");
        assert!(ApiConfig::new("not a url").is_err());
    }

    #[test]
    fn not_found_status_has_its_own_code() {
        let err = ApiError::Status {
            endpoint: "DELETE /dealmanagement/1".into(),
            status: StatusCode::NOT_FOUND,
            message: "Deal not found".into(),
        };
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "DELETE /dealmanagement/1 answered 404 Not Found: Deal not found"
        );
    }
}
