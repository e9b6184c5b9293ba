use crate::errors::CollectorError;
use crate::models::{CategoryPage, VideoPage};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";

/// Items requested per page. The listing caps this at 50.
pub const PAGE_SIZE: u32 = 50;

/// Upper bound for the retry budget accepted from configuration.
pub const MAX_RETRIES: u32 = 10;

const RETRY_BASE_DELAY_MS: u64 = 500;
const RETRY_MAX_DELAY_MS: u64 = 30_000;

/// A chain longer than this is treated as runaway pagination.
const MAX_CATEGORY_PAGES: usize = 20;

/// One page of the trending listing, addressed by continuation token.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, page_token: Option<&str>) -> Result<VideoPage, CollectorError>;
}

#[derive(Debug, Clone)]
pub struct YouTubeClient {
    http: Client,
    base_url: Url,
    api_key: String,
    max_retries: u32,
}

impl YouTubeClient {
    pub fn new(
        base_url: Url,
        api_key: impl Into<String>,
        max_retries: u32,
    ) -> Result<Self, CollectorError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(CollectorError::Authorization(
                "no API key configured".to_string(),
            ));
        }

        Ok(YouTubeClient {
            http: Client::new(),
            base_url,
            api_key,
            max_retries: max_retries.min(MAX_RETRIES),
        })
    }

    fn endpoint(&self, resource: &str, params: &[(&str, &str)]) -> Result<Url, CollectorError> {
        let mut url = self
            .base_url
            .join(resource)
            .map_err(|e| CollectorError::Malformed(format!("invalid endpoint {resource}: {e}")))?;
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, CollectorError> {
        let mut attempt = 0_u32;
        loop {
            match self.get_json_once(url).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    let delay = retry_delay(attempt);
                    attempt += 1;
                    warn!(
                        "Request to {} failed: {}. Retrying in {delay:?} ({attempt}/{})",
                        url.path(),
                        err.report(),
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn get_json_once<T: DeserializeOwned>(&self, url: &Url) -> Result<T, CollectorError> {
        // the key is appended here so it never shows up in logs
        debug!("GET {url}");
        let response = self
            .http
            .get(url.clone())
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(CollectorError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let body = response.text().await.map_err(CollectorError::transport)?;
        serde_json::from_str(&body)
            .map_err(|e| CollectorError::Malformed(format!("unexpected payload from {}: {e}", url.path())))
    }

    /// Category id -> human readable name for one region.
    pub async fn fetch_category_mapping(
        &self,
        region: &str,
    ) -> Result<HashMap<String, String>, CollectorError> {
        let mut mapping = HashMap::new();
        let mut next_page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();

        for _ in 0..MAX_CATEGORY_PAGES {
            // https://developers.google.com/youtube/v3/docs/videoCategories
            let mut params = vec![("part", "snippet"), ("regionCode", region)];
            if let Some(token) = next_page_token.as_deref() {
                params.push(("pageToken", token));
            }
            let url = self.endpoint("videoCategories", &params)?;
            let page: CategoryPage = self.get_json(&url).await?;

            for item in page.items {
                mapping.insert(item.id, item.snippet.title);
            }

            match page.next_page_token {
                Some(token) if seen_tokens.insert(token.clone()) => next_page_token = Some(token),
                Some(token) => {
                    warn!("Category listing repeated page token {token:?}, stopping");
                    break;
                }
                None => break,
            }
        }

        info!("Loaded {} video categories for region {region}", mapping.len());
        Ok(mapping)
    }
}

/// Doubles from the base delay, never above the maximum.
fn retry_delay(attempt: u32) -> Duration {
    let factor = 1_u64 << attempt.min(16);
    Duration::from_millis(
        RETRY_BASE_DELAY_MS
            .saturating_mul(factor)
            .min(RETRY_MAX_DELAY_MS),
    )
}

fn classify_failure(status: StatusCode, body: &str) -> CollectorError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.trim().to_string());

    let key_rejected = status == StatusCode::BAD_REQUEST
        && (body.contains("keyInvalid") || body.contains("API key not valid"));

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN || key_rejected {
        CollectorError::Authorization(format!("{}: {message}", status.as_u16()))
    } else {
        CollectorError::HttpStatus {
            status: status.as_u16(),
            body: message,
        }
    }
}

/// The region's "most popular" chart.
#[derive(Debug, Clone)]
pub struct TrendingVideosSource {
    client: YouTubeClient,
    region: String,
}

impl TrendingVideosSource {
    pub fn new(client: YouTubeClient, region: impl Into<String>) -> Self {
        TrendingVideosSource {
            client,
            region: region.into(),
        }
    }
}

#[async_trait]
impl PageSource for TrendingVideosSource {
    async fn fetch_page(&self, page_token: Option<&str>) -> Result<VideoPage, CollectorError> {
        let page_size = PAGE_SIZE.to_string();
        let mut params = vec![
            ("part", "snippet,contentDetails,statistics"),
            ("chart", "mostPopular"),
            ("regionCode", self.region.as_str()),
            ("maxResults", page_size.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let url = self.client.endpoint("videos", &params)?;
        self.client.get_json(&url).await
    }
}
