use entity::{deal, lead, meeting, quotation};
use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::{ApiConfig, ApiError, ApiResult};

const DEALS: &str = "dealmanagement";
const QUOTATIONS: &str = "newquotations";
const MEETINGS: &str = "meetings";
const RECYCLE_BIN: &str = "recyclebin";

/// HTTP client for the CRM REST API.
#[derive(Clone, Debug)]
pub struct CrmClient {
    http: reqwest::Client,
    config: ApiConfig,
}

#[derive(Deserialize)]
struct LeadList {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    contacts: Vec<Value>,
}

fn default_success() -> bool {
    true
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl CrmClient {
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| ApiError::InvalidConfig(err.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub async fn list_deals(&self) -> ApiResult<Vec<deal::Model>> {
        let url = self.endpoint(&[DEALS])?;
        let records: Vec<Value> = self.fetch_json(Method::GET, url).await?;
        Ok(narrow_records("GET /dealmanagement", records))
    }

    pub async fn create_deal(&self, body: &deal::NewDeal) -> ApiResult<()> {
        let url = self.endpoint(&[DEALS])?;
        self.send(Method::POST, url, Some(body)).await
    }

    pub async fn update_deal_stage(&self, id: &str, patch: &deal::StagePatch) -> ApiResult<()> {
        let url = self.endpoint(&[DEALS, id])?;
        self.send(Method::PUT, url, Some(patch)).await
    }

    pub async fn delete_deal(&self, id: &str) -> ApiResult<()> {
        let url = self.endpoint(&[DEALS, id])?;
        self.send::<()>(Method::DELETE, url, None).await
    }

    pub async fn list_quotations(&self) -> ApiResult<Vec<quotation::Model>> {
        let url = self.endpoint(&[QUOTATIONS])?;
        let records: Vec<Value> = self.fetch_json(Method::GET, url).await?;
        Ok(narrow_records("GET /newquotations", records))
    }

    pub async fn create_quotation(&self, body: &quotation::NewQuotation) -> ApiResult<()> {
        let url = self.endpoint(&[QUOTATIONS])?;
        self.send(Method::POST, url, Some(body)).await
    }

    pub async fn delete_quotation(&self, id: &str) -> ApiResult<()> {
        let url = self.endpoint(&[QUOTATIONS, id])?;
        self.send::<()>(Method::DELETE, url, None).await
    }

    pub async fn list_leads(&self) -> ApiResult<Vec<lead::Model>> {
        let url = self.config.leads_url().clone();
        let endpoint = describe(&Method::GET, &url);
        let body: LeadList = self.fetch_json(Method::GET, url).await?;
        if !body.success {
            return Err(ApiError::Decode {
                endpoint,
                reason: "backend reported success=false".into(),
            });
        }
        Ok(narrow_records("GET /NewLeads", body.contacts))
    }

    pub async fn create_meeting(&self, body: &meeting::NewMeeting) -> ApiResult<()> {
        let url = self.endpoint(&[MEETINGS])?;
        self.send(Method::POST, url, Some(body)).await
    }

    /// The backend moves the record back to the Qualified stage.
    pub async fn restore_deal(&self, id: &str) -> ApiResult<()> {
        let url = self.endpoint(&[RECYCLE_BIN, "restore", id])?;
        self.send::<()>(Method::POST, url, None).await
    }

    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.config.base_url().clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidConfig("base URL cannot take path segments".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, method: Method, url: Url) -> ApiResult<T> {
        let endpoint = describe(&method, &url);
        let response = self.execute(self.http.request(method, url), &endpoint).await?;
        response.json::<T>().await.map_err(|err| ApiError::Decode {
            endpoint,
            reason: err.to_string(),
        })
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> ApiResult<()> {
        let endpoint = describe(&method, &url);
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(request, &endpoint).await?;
        Ok(())
    }

    async fn execute(&self, request: RequestBuilder, endpoint: &str) -> ApiResult<Response> {
        debug!(%endpoint, "crm api request");
        let response = request.send().await.map_err(|source| ApiError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&raw)
            .map(|body| body.message)
            .unwrap_or_else(|_| truncate(raw.trim(), 200));
        Err(ApiError::Status {
            endpoint: endpoint.to_string(),
            status,
            message,
        })
    }
}

fn describe(method: &Method, url: &Url) -> String {
    format!("{method} {}", url.path())
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

/// Keep the records that match the expected shape; log the rest.
fn narrow_records<T: DeserializeOwned>(endpoint: &str, records: Vec<Value>) -> Vec<T> {
    let total = records.len();
    let narrowed: Vec<T> = records
        .into_iter()
        .filter_map(|record| {
            let id = record
                .get("_id")
                .and_then(Value::as_str)
                .unwrap_or("<no id>")
                .to_string();
            serde_json::from_value(record)
                .map_err(|err| {
                    warn!(endpoint, record_id = %id, error = %err, "skipping malformed record");
                })
                .ok()
        })
        .collect();
    if narrowed.len() != total {
        debug!(endpoint, total, kept = narrowed.len(), "narrowed response");
    }
    narrowed
}
