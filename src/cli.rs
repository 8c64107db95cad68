use crate::github::{SearchQuery, SortKey, SortOrder, API_BASE_URL, DEFAULT_USER_AGENT, PER_PAGE};
use crate::trigger::{ObserverOptions, DEFAULT_ROOT_MARGIN, DEFAULT_THRESHOLD};
use crate::error::{PopularReposError, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "popular-repos")]
#[command(about = "Popular Repositories - Browse the most starred GitHub repositories page by page")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// GitHub API root URL
    #[arg(long, env = "GITHUB_API_URL", default_value = API_BASE_URL)]
    pub api_url: String,

    /// Search term
    #[arg(short, long, env = "SEARCH_QUERY", default_value = "javascript")]
    pub query: String,

    /// Sort key
    #[arg(long, value_enum, default_value = "stars")]
    pub sort: SortKey,

    /// Sort order
    #[arg(long, value_enum, default_value = "desc")]
    pub order: SortOrder,

    /// Repositories per page (1-100)
    #[arg(long, env = "PER_PAGE", default_value_t = PER_PAGE)]
    pub per_page: u32,

    /// User-Agent sent with every request
    #[arg(long, env = "USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Rows shown per scroll step
    #[arg(long, default_value_t = 24)]
    pub viewport_rows: u32,

    /// Rows the sentinel may be outside the viewport and still count as visible
    #[arg(long, default_value_t = DEFAULT_ROOT_MARGIN)]
    pub root_margin: f64,

    /// Fraction of the sentinel that must be visible (0.0-1.0)
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Serve health and repository JSON on this port
    #[arg(long, env = "STATUS_PORT")]
    pub status_port: Option<u16>,
}

impl Cli {
    pub fn search_query(&self) -> Result<SearchQuery> {
        let query = SearchQuery {
            term: self.query.clone(),
            sort: self.sort,
            order: self.order,
            per_page: self.per_page,
        };
        query.validate()?;
        Ok(query)
    }

    pub fn observer_options(&self) -> Result<ObserverOptions> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(PopularReposError::ConfigError(format!(
                "threshold must be between 0.0 and 1.0, got {}",
                self.threshold
            )));
        }
        if self.root_margin < 0.0 {
            return Err(PopularReposError::ConfigError(format!(
                "root margin must not be negative, got {}",
                self.root_margin
            )));
        }
        Ok(ObserverOptions {
            root_margin: self.root_margin,
            threshold: self.threshold,
        })
    }
}
