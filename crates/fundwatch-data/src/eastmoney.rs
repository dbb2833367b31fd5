//! Eastmoney fund NAV history adapter.
//!
//! Wraps the public `f10/lsjz` endpoint. Each call performs a single request
//! for one page; retry and pagination live in [`crate::RetryingSource`].
//! Pages are newest first.

use async_trait::async_trait;
use fundwatch_core::error::FetchError;
use fundwatch_core::traits::{PageOrder, PagedSource, SeriesPage};
use fundwatch_core::types::{InstrumentId, SeriesPoint};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, trace};

use crate::csv_source::parse_date;
use crate::ValueField;

const DEFAULT_BASE_URL: &str = "https://api.fund.eastmoney.com/f10/lsjz";
const REFERER: &str = "https://fundf10.eastmoney.com/";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) fundwatch";

/// Adapter configuration.
#[derive(Debug, Clone)]
pub struct EastmoneyConfig {
    pub base_url: String,
    pub page_size: usize,
    pub request_timeout: Duration,
    pub value_field: ValueField,
}

impl Default for EastmoneyConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: 20,
            request_timeout: Duration::from_secs(15),
            value_field: ValueField::Cumulative,
        }
    }
}

/// Response envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct LsjzResponse {
    data: Option<LsjzData>,
    #[serde(default)]
    err_code: i64,
    #[serde(default)]
    err_msg: Option<String>,
    #[serde(default)]
    total_count: usize,
}

#[derive(Debug, Deserialize)]
struct LsjzData {
    #[serde(rename = "LSJZList", default)]
    rows: Vec<LsjzRow>,
}

/// One NAV row. Values arrive as strings and may be empty.
#[derive(Debug, Deserialize)]
struct LsjzRow {
    #[serde(rename = "FSRQ")]
    date: String,
    #[serde(rename = "DWJZ", default)]
    unit: String,
    #[serde(rename = "LJJZ", default)]
    cumulative: String,
}

impl LsjzRow {
    fn value(&self, field: ValueField) -> Option<f64> {
        let parse = |s: &str| s.trim().parse::<f64>().ok();
        match field {
            ValueField::Cumulative => parse(&self.cumulative).or_else(|| parse(&self.unit)),
            ValueField::Unit => parse(&self.unit),
        }
    }
}

/// Eastmoney HTTP client.
pub struct EastmoneySource {
    config: EastmoneyConfig,
    client: Client,
}

impl EastmoneySource {
    /// Create a new client.
    pub fn new(config: EastmoneyConfig) -> Result<Self, FetchError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::REFERER, header::HeaderValue::from_static(REFERER));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Convert a decoded response into a page.
    pub(crate) fn parse_response(
        &self,
        response: LsjzResponse,
        page_index: usize,
    ) -> Result<SeriesPage, FetchError> {
        if response.err_code != 0 {
            return Err(FetchError::MalformedResponse(format!(
                "error code {}: {}",
                response.err_code,
                response.err_msg.unwrap_or_default()
            )));
        }
        let data = response
            .data
            .ok_or_else(|| FetchError::MalformedResponse("missing Data".into()))?;

        let mut points = Vec::with_capacity(data.rows.len());
        for row in &data.rows {
            let Ok(date) = parse_date(row.date.trim()) else {
                trace!(date = %row.date, "Skipping row with bad date");
                continue;
            };
            match row.value(self.config.value_field) {
                Some(value) => points.push(SeriesPoint::new(date, value)),
                None => trace!(%date, "Skipping row without a value"),
            }
        }

        let seen = (page_index + 1) * self.config.page_size;
        let has_more = !data.rows.is_empty() && seen < response.total_count;
        Ok(SeriesPage::new(points, has_more))
    }
}

#[async_trait]
impl PagedSource for EastmoneySource {
    async fn fetch_page(
        &self,
        instrument: &InstrumentId,
        page_index: usize,
    ) -> Result<SeriesPage, FetchError> {
        // The endpoint counts pages from 1
        let params = [
            ("fundCode", instrument.to_string()),
            ("pageIndex", (page_index + 1).to_string()),
            ("pageSize", self.config.page_size.to_string()),
        ];

        let resp = self
            .client
            .get(&self.config.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(FetchError::RateLimited {
                retry_after_secs: retry_after,
            });
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(FetchError::Http {
                status: status.as_u16(),
                message: text.chars().take(200).collect(),
            });
        }

        let body: LsjzResponse = resp
            .json()
            .await
            .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

        let page = self.parse_response(body, page_index)?;
        debug!(
            code = %instrument,
            page = page_index,
            rows = page.points.len(),
            has_more = page.has_more,
            "Fetched NAV page"
        );
        Ok(page)
    }

    fn page_size(&self) -> usize {
        self.config.page_size
    }

    fn order(&self) -> PageOrder {
        PageOrder::NewestFirst
    }

    fn name(&self) -> &str {
        "eastmoney"
    }
}
