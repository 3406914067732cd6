//! Global search across all uploads

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::{with_query, Api, ApiRequest};
use crate::auth::AuthContext;
use crate::types::{LogLevel, Pagination, SearchFilters, SearchResult, SearchSuggestion};

use super::{Lifecycle, Outcome, PagedList, Settle, Shared};

pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
pub const DEFAULT_SUGGESTIONS_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
struct SearchPage {
    results: Vec<SearchResult>,
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
struct SuggestionsPage {
    #[serde(default)]
    suggestions: Vec<SearchSuggestion>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchBody<'a> {
    limit: u32,
    offset: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<LogLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<&'a str>,
}

impl<'a> SearchBody<'a> {
    fn new(filters: &'a SearchFilters, limit: u32, offset: u32) -> Self {
        let non_empty = |s: &'a str| (!s.trim().is_empty()).then_some(s);
        Self {
            limit,
            offset,
            query: non_empty(&filters.query),
            level: filters.level,
            start_date: filters.start_date.as_deref().and_then(non_empty),
            end_date: filters.end_date.as_deref().and_then(non_empty),
        }
    }
}

/// Date-filtered search is its own server capability
fn endpoint_for(filters: &SearchFilters) -> &'static str {
    if filters.has_date_range() {
        "/api/search/by-date"
    } else {
        "/api/search"
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub results: PagedList<SearchResult>,
    /// Filters of the last search; `load_more` continues with these
    pub filters: SearchFilters,
    pub suggestions: Vec<SearchSuggestion>,
    pub suggestions_loading: bool,
    pub suggestions_lifecycle: Lifecycle,
}

impl Settle for SearchState {
    fn settle(&mut self) {
        self.results.abandon();
        self.suggestions_loading = false;
    }
}

/// Store for `/api/search`
#[derive(Clone)]
pub struct SearchStore {
    shared: Arc<Shared<SearchState>>,
}

impl SearchStore {
    pub fn new(api: Api, auth: Arc<AuthContext>) -> Self {
        Self {
            shared: Shared::new(api, auth, SearchState::default()),
        }
    }

    pub fn state(&self) -> SearchState {
        self.shared.snapshot()
    }

    /// Run a search.
    ///
    /// With no query, level or start date the search is not sent and the
    /// results are cleared.
    pub async fn search(&self, filters: SearchFilters, offset: u32, limit: u32) -> Outcome {
        if filters.is_unscoped() {
            self.shared.with(|s| {
                s.results.clear();
                s.filters = filters;
            });
            return Outcome::done();
        }

        self.shared.with(|s| {
            s.results.begin();
            if offset == 0 {
                s.filters = filters.clone();
            }
        });
        self.search_page(&filters, limit, offset).await
    }

    async fn search_page(&self, filters: &SearchFilters, limit: u32, offset: u32) -> Outcome {
        let request = ApiRequest::post(endpoint_for(filters)).json(&SearchBody::new(filters, limit, offset));
        let Some(response) = self.shared.call::<SearchPage>(request).await else {
            return Outcome::cancelled();
        };

        let error = response.error_or("Search failed");
        let page = response.into_data();
        self.shared
            .apply(|s| match page {
                Some(page) => {
                    tracing::debug!(offset, count = page.results.len(), total = page.pagination.total, "Search page received");
                    s.results.apply_page(offset, page.results, Some(page.pagination));
                    Outcome::done()
                }
                None => {
                    s.results.fail(error.clone());
                    Outcome::failed(error)
                }
            })
            .unwrap_or_else(Outcome::cancelled)
    }

    /// Next page of the last search; `None` when nothing more or already loading
    pub async fn load_more(&self) -> Option<Outcome> {
        let (filters, next) = self.shared.with(|s| {
            let next = s.results.begin_next_page()?;
            Some((s.filters.clone(), next))
        })?;
        Some(self.search_page(&filters, next.limit, next.offset).await)
    }

    /// Edit the stored filters without searching
    pub fn update_filters(&self, f: impl FnOnce(&mut SearchFilters)) {
        self.shared.with(|s| f(&mut s.filters));
    }

    pub fn clear_search(&self) {
        self.shared.with(|s| {
            s.results.clear();
            s.filters = SearchFilters::default();
        });
    }

    /// Popular messages to offer as queries. Failures are silent.
    pub async fn fetch_suggestions(&self, limit: u32) -> Outcome {
        self.shared.with(|s| s.suggestions_loading = true);

        let endpoint = with_query("/api/search/suggestions", &[("limit", limit.to_string())]);
        let Some(response) = self.shared.call::<SuggestionsPage>(ApiRequest::get(endpoint)).await else {
            return Outcome::cancelled();
        };

        self.shared
            .apply(|s| {
                s.suggestions_loading = false;
                let error = response.error_or("Failed to fetch suggestions");
                match response.into_data() {
                    Some(page) => {
                        s.suggestions = page.suggestions;
                        Outcome::done()
                    }
                    None => {
                        tracing::debug!(error = %error, "Suggestions unavailable");
                        Outcome::failed(error)
                    }
                }
            })
            .unwrap_or_else(Outcome::cancelled)
    }

    /// Fetch suggestions once per store
    pub async fn ensure_loaded(&self) -> bool {
        if !self.shared.with(|s| s.suggestions_lifecycle.try_begin()) {
            return false;
        }
        let ok = self.fetch_suggestions(DEFAULT_SUGGESTIONS_LIMIT).await.success;
        self.shared.with(|s| s.suggestions_lifecycle.finish(ok));
        ok
    }

    pub fn close(&self) {
        self.shared.scope.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_selection() {
        assert_eq!(endpoint_for(&SearchFilters::query("oom")), "/api/search");
        let dated = SearchFilters {
            start_date: Some("2024-03-01".to_string()),
            ..Default::default()
        };
        assert_eq!(endpoint_for(&dated), "/api/search/by-date");
    }

    #[test]
    fn test_body_skips_blank_fields() {
        let filters = SearchFilters {
            query: "  ".to_string(),
            level: Some(LogLevel::Warn),
            start_date: Some("2024-03-01".to_string()),
            end_date: Some(String::new()),
        };
        let body = serde_json::to_value(SearchBody::new(&filters, 20, 40)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"limit": 20, "offset": 40, "level": "WARN", "startDate": "2024-03-01"})
        );
    }
}
