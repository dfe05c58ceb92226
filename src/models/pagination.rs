use crate::config::PaginationConfig;
use crate::models::{RecipeResponse, SubscriptionResponse, UserResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number, starting at 1
    pub page: Option<u64>,
    /// Items per page
    pub limit: Option<u64>,
}

const MAX_OFFSET: u64 = i64::MAX as u64;

/// A resolved page request: 1-based page number and a bounded page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u64,
    pub size: u64,
}

impl Page {
    /// The page number is capped so that the row offset still fits the
    /// signed 64-bit integer the database driver binds it as.
    pub fn resolve(page: Option<u64>, limit: Option<u64>, config: &PaginationConfig) -> Self {
        let size = limit
            .unwrap_or(config.page_size)
            .clamp(1, config.max_page_size);
        let last_addressable = MAX_OFFSET / size + 1;
        Page {
            number: page.unwrap_or(1).clamp(1, last_addressable),
            size,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.number - 1).saturating_mul(self.size).min(MAX_OFFSET)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[aliases(
    PaginatedRecipes = Paginated<RecipeResponse>,
    PaginatedUsers = Paginated<UserResponse>,
    PaginatedSubscriptions = Paginated<SubscriptionResponse>
)]
pub struct Paginated<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    /// `path` and `query` are the current request's; other query parameters
    /// are carried over into the `next`/`previous` links.
    pub fn new(results: Vec<T>, count: u64, page: Page, path: &str, query: &str) -> Self {
        let next = page
            .number
            .checked_add(1)
            .filter(|_| page.number.saturating_mul(page.size) < count);
        Paginated {
            count,
            next: next.map(|number| page_link(path, query, number, page.size)),
            previous: (page.number > 1).then(|| page_link(path, query, page.number - 1, page.size)),
            results,
        }
    }
}

fn page_link(path: &str, query: &str, number: u64, size: u64) -> String {
    let mut params: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            !pair.is_empty() && !pair.starts_with("page=") && !pair.starts_with("limit=")
        })
        .collect();
    let paging = format!("page={}&limit={}", number, size);
    params.push(&paging);
    format!("{}?{}", path, params.join("&"))
}
