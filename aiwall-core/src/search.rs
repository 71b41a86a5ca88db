use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::config::SearchConfig;
use crate::error::SearchError;

/// Search text plus the raster size the results should be delivered at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub height: u32,
    pub width: u32,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, height: u32, width: u32) -> Self {
        Self { text: text.into(), height, width }
    }

    /// Build a query from raw user/display input, validating the dimensions.
    pub fn parse(text: &str, target_height: &str, target_width: &str) -> Result<Self, SearchError> {
        Ok(Self {
            text: text.to_string(),
            height: parse_dimension("height", target_height)?,
            width: parse_dimension("width", target_width)?,
        })
    }
}

fn parse_dimension(field: &'static str, value: &str) -> Result<u32, SearchError> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(SearchError::InvalidDimension { field, value: value.to_string() }),
    }
}

/// A ready-to-display image URL, already sized by the CDN.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageResult(String);

impl ImageResult {
    pub fn url(&self) -> &str {
        &self.0
    }

    pub fn into_url(self) -> String {
        self.0
    }
}

impl fmt::Display for ImageResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug)]
pub enum SearchOutcome {
    Ok(Vec<ImageResult>),
    Failed(SearchError),
}

impl SearchOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, SearchOutcome::Ok(_))
    }

    /// Results in service order, or nothing if the search failed.
    pub fn into_urls(self) -> Vec<String> {
        match self {
            SearchOutcome::Ok(results) => results.into_iter().map(ImageResult::into_url).collect(),
            SearchOutcome::Failed(_) => Vec::new(),
        }
    }
}

impl From<Result<Vec<ImageResult>, SearchError>> for SearchOutcome {
    fn from(result: Result<Vec<ImageResult>, SearchError>) -> Self {
        match result {
            Ok(results) => SearchOutcome::Ok(results),
            Err(e) => SearchOutcome::Failed(e),
        }
    }
}

/// Client for the random-photo search endpoint.
#[derive(Clone)]
pub struct ImageSearchClient {
    config: Arc<SearchConfig>,
}

impl ImageSearchClient {
    pub fn new(config: SearchConfig) -> Self {
        Self { config: Arc::new(config) }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search without blocking the calling executor thread.
    pub async fn search(&self, query: &SearchQuery) -> SearchOutcome {
        let client = self.clone();
        let query = query.clone();
        match tokio::task::spawn_blocking(move || client.search_blocking(&query)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("Search task failed: {}", e);
                SearchOutcome::Failed(SearchError::Task(e.to_string()))
            }
        }
    }

    /// Search and degrade every failure to an empty list.
    pub async fn search_urls(&self, query: &str, target_height: &str, target_width: &str) -> Vec<String> {
        let query = match SearchQuery::parse(query, target_height, target_width) {
            Ok(query) => query,
            Err(e) => {
                log::error!("Rejected search for {:?}: {}", query, e);
                return Vec::new();
            }
        };
        self.search(&query).await.into_urls()
    }

    pub fn search_blocking(&self, query: &SearchQuery) -> SearchOutcome {
        let result = self.fetch_results(query);
        if let Err(ref e) = result {
            log::error!("Search for {:?} failed: {}", query.text, e);
        }
        result.into()
    }

    fn fetch_results(&self, query: &SearchQuery) -> Result<Vec<ImageResult>, SearchError> {
        let url = &self.config.api_url;
        let network_error = |e: attohttpc::Error| SearchError::Network {
            url: url.clone(),
            message: e.to_string(),
        };

        if query.text.trim().is_empty() {
            log::debug!("Empty query, the service will return an unfiltered sample");
        }

        let response = attohttpc::get(url)
            .param("orientation", &self.config.orientation)
            .param("count", self.config.count)
            .param("query", &query.text)
            .try_header(
                attohttpc::header::AUTHORIZATION,
                format!("Client-ID {}", self.config.access_key),
            )
            .map_err(network_error)?
            .send()
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let body = response.text().map_err(network_error)?;
        let mut urls = extract_image_urls(&body, query.height, query.width, self.config.dpr)?;
        urls.truncate(self.config.count as usize);

        log::info!("Search for {:?} returned {} images", query.text, urls.len());
        Ok(urls.into_iter().map(ImageResult).collect())
    }
}

/// Pull `urls.raw` out of each photo object and append the sizing parameters.
///
/// A body that is not a JSON array is an error. An element without a usable
/// `urls.raw` ends extraction; URLs collected before it are kept.
pub fn extract_image_urls(body: &str, height: u32, width: u32, dpr: u32) -> Result<Vec<String>, SearchError> {
    let value: Value = serde_json::from_str(body).map_err(|e| SearchError::Parse(e.to_string()))?;
    let photos = value
        .as_array()
        .ok_or_else(|| SearchError::Parse("expected a JSON array of photos".to_string()))?;

    let mut urls = Vec::with_capacity(photos.len());
    for (i, photo) in photos.iter().enumerate() {
        match photo.pointer("/urls/raw").and_then(Value::as_str) {
            Some(raw) => urls.push(format!("{}&h={}&w={}&dpr={}", raw, height, width, dpr)),
            None => {
                log::warn!(
                    "Photo {} has no urls.raw, dropping it and the remaining {} photos",
                    i,
                    photos.len() - i - 1
                );
                break;
            }
        }
    }
    Ok(urls)
}
