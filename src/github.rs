use crate::error::{PopularReposError, Result};
use crate::store::RepositorySource;
use crate::types::{Repository, SearchResponse};
use async_trait::async_trait;
use clap::ValueEnum;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use tracing::debug;
use url::Url;

pub const API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = concat!("popular-repos/", env!("CARGO_PKG_VERSION"));
pub const PER_PAGE: u32 = 20;
const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    Stars,
    Forks,
    HelpWantedIssues,
    Updated,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Stars => "stars",
            SortKey::Forks => "forks",
            SortKey::HelpWantedIssues => "help-wanted-issues",
            SortKey::Updated => "updated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Fixed search parameters sent with every page request
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub term: String,
    pub sort: SortKey,
    pub order: SortOrder,
    pub per_page: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            term: "javascript".to_string(),
            sort: SortKey::Stars,
            order: SortOrder::Desc,
            per_page: PER_PAGE,
        }
    }
}

impl SearchQuery {
    pub fn validate(&self) -> Result<()> {
        if self.term.trim().is_empty() {
            return Err(PopularReposError::ConfigError(
                "search term must not be empty".to_string(),
            ));
        }
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(PopularReposError::ConfigError(format!(
                "per_page must be between 1 and {}, got {}",
                MAX_PER_PAGE, self.per_page
            )));
        }
        Ok(())
    }
}

pub struct GitHubClient {
    client: Client,
    base_url: Url,
    query: SearchQuery,
}

impl GitHubClient {
    pub fn new(query: SearchQuery) -> Result<Self> {
        Self::with_base_url(API_BASE_URL, query, DEFAULT_USER_AGENT)
    }

    /// Build a client against any GitHub-compatible API root, e.g. an
    /// Enterprise host (`https://ghe.example.com/api/v3`) or a local mock.
    pub fn with_base_url(base_url: &str, query: SearchQuery, user_agent: &str) -> Result<Self> {
        query.validate()?;

        // Url::join drops the last path segment unless the base ends in '/'
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        let client = Client::builder().user_agent(user_agent).build()?;

        Ok(GitHubClient {
            client,
            base_url,
            query,
        })
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn search_url(&self, page: u32) -> Result<Url> {
        let mut url = self.base_url.join("search/repositories")?;
        url.query_pairs_mut()
            .append_pair("q", &self.query.term)
            .append_pair("sort", self.query.sort.as_str())
            .append_pair("order", self.query.order.as_str())
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &self.query.per_page.to_string());
        Ok(url)
    }

    async fn make_request(&self, url: Url) -> Result<Response> {
        let response = self
            .client
            .get(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(%url, status = status.as_u16(), "search request rejected");
        Err(PopularReposError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        })
    }

    /// Fetch one page of search results
    pub async fn search_repositories(&self, page: u32) -> Result<SearchResponse> {
        let url = self.search_url(page)?;
        let response = self.make_request(url).await?;
        let body = response.text().await?;
        let results: SearchResponse = serde_json::from_str(&body)?;
        Ok(results)
    }
}

#[async_trait]
impl RepositorySource for GitHubClient {
    async fn fetch_page(&self, page: u32) -> Result<Vec<Repository>> {
        let results = self.search_repositories(page).await?;
        if results.incomplete_results {
            debug!(page, "GitHub reported incomplete search results");
        }
        Ok(results.items)
    }
}
