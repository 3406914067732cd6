//! Upload list, upload detail and search-within-upload

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::{segment, with_query, Api, ApiRequest};
use crate::auth::AuthContext;
use crate::types::{LogGroup, LogLevel, Pagination, Upload};

use super::lifecycle::with_initial_retries;
use super::{Lifecycle, Outcome, PagedList, Settle, Shared, INITIAL_FETCH_RETRIES};

pub const DEFAULT_LIST_LIMIT: u32 = 20;
pub const DEFAULT_GROUPS_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
struct UploadsPage {
    uploads: Vec<Upload>,
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
struct UploadDetailPage {
    upload: Upload,
    groups: Vec<LogGroup>,
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadSearchPage {
    results: Vec<LogGroup>,
    pagination: Pagination,
}

#[derive(Debug, Serialize)]
struct UploadSearchBody<'a> {
    limit: u32,
    offset: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<LogLevel>,
}

/// Which query produced the groups currently shown for an upload.
///
/// Browsing and searching share one slot: a first page of either replaces
/// the whole slot, so the two are mutually exclusive views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupsView {
    Browse { level: Option<LogLevel> },
    Search { query: Option<String>, level: Option<LogLevel> },
}

/// Detail pane state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadDetail {
    /// Upload whose groups are shown
    pub upload_id: Option<String>,
    /// Metadata from the last browse fetch
    pub upload: Option<Upload>,
    pub view: Option<GroupsView>,
    /// `loading`/`error` here are the detail pane's flags
    pub groups: PagedList<LogGroup>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadsState {
    pub lifecycle: Lifecycle,
    pub uploads: PagedList<Upload>,
    pub detail: UploadDetail,
    /// Id of the upload currently being deleted
    pub deleting: Option<String>,
}

impl Settle for UploadsState {
    fn settle(&mut self) {
        self.uploads.abandon();
        self.detail.groups.abandon();
        self.deleting = None;
    }
}

/// Store for `/api/uploads`
#[derive(Clone)]
pub struct UploadsStore {
    shared: Arc<Shared<UploadsState>>,
}

impl UploadsStore {
    pub fn new(api: Api, auth: Arc<AuthContext>) -> Self {
        Self {
            shared: Shared::new(api, auth, UploadsState::default()),
        }
    }

    pub fn state(&self) -> UploadsState {
        self.shared.snapshot()
    }

    /// First fetch of the list; runs once per store, with bounded retries.
    pub async fn ensure_loaded(&self) -> bool {
        if !self.shared.with(|s| s.lifecycle.try_begin()) {
            return false;
        }
        let ok = with_initial_retries("uploads", INITIAL_FETCH_RETRIES, || async {
            let out = self.fetch_uploads(DEFAULT_LIST_LIMIT, 0).await;
            (!out.is_cancelled()).then_some(out.success)
        })
        .await;
        self.shared.with(|s| s.lifecycle.finish(ok));
        ok
    }

    /// Fetch one page of uploads. Offset 0 replaces the list, anything else appends.
    pub async fn fetch_uploads(&self, limit: u32, offset: u32) -> Outcome {
        self.shared.with(|s| s.uploads.begin());
        self.fetch_uploads_page(limit, offset).await
    }

    async fn fetch_uploads_page(&self, limit: u32, offset: u32) -> Outcome {
        let endpoint = with_query(
            "/api/uploads",
            &[("limit", limit.to_string()), ("offset", offset.to_string())],
        );
        let Some(response) = self.shared.call::<UploadsPage>(ApiRequest::get(endpoint)).await else {
            return Outcome::cancelled();
        };

        let error = response.error_or("Failed to fetch uploads");
        let page = response.into_data();
        self.shared
            .apply(|s| match page {
                Some(page) => {
                    tracing::debug!(offset, count = page.uploads.len(), "Fetched uploads page");
                    s.uploads.apply_page(offset, page.uploads, Some(page.pagination));
                    Outcome::done()
                }
                None => {
                    s.uploads.fail(error.clone());
                    Outcome::failed(error)
                }
            })
            .unwrap_or_else(Outcome::cancelled)
    }

    /// Fetch the next page of uploads.
    ///
    /// Returns `None` without any request when there is no next page or a
    /// list fetch is already running.
    pub async fn load_more(&self) -> Option<Outcome> {
        let next = self.shared.with(|s| s.uploads.begin_next_page())?;
        Some(self.fetch_uploads_page(next.limit, next.offset).await)
    }

    /// Browse an upload's groups, optionally filtered by level.
    pub async fn fetch_upload_detail(
        &self,
        id: &str,
        level: Option<LogLevel>,
        limit: u32,
        offset: u32,
    ) -> Outcome {
        let view = GroupsView::Browse { level };
        if let Err(out) = self.begin_groups(id, &view, offset) {
            return out;
        }
        self.fetch_detail_page(id, level, limit, offset).await
    }

    async fn fetch_detail_page(
        &self,
        id: &str,
        level: Option<LogLevel>,
        limit: u32,
        offset: u32,
    ) -> Outcome {
        let mut params = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
        if let Some(level) = level {
            params.push(("level", level.as_str().to_string()));
        }
        let endpoint = with_query(&format!("/api/uploads/{}", segment(id)), &params);

        let Some(response) = self.shared.call::<UploadDetailPage>(ApiRequest::get(endpoint)).await
        else {
            return Outcome::cancelled();
        };

        let error = response.error_or("Failed to fetch upload details");
        let page = response.into_data();
        let view = GroupsView::Browse { level };
        self.shared
            .apply(|s| match page {
                Some(page) => {
                    s.detail.upload = Some(page.upload);
                    s.detail.upload_id = Some(id.to_string());
                    s.detail.view = Some(view);
                    s.detail.groups.apply_page(offset, page.groups, Some(page.pagination));
                    Outcome::done()
                }
                None => {
                    s.detail.groups.fail(error.clone());
                    Outcome::failed(error)
                }
            })
            .unwrap_or_else(Outcome::cancelled)
    }

    /// Search within one upload. Takes over the same slot as browsing.
    pub async fn search_upload(
        &self,
        id: &str,
        query: Option<&str>,
        level: Option<LogLevel>,
        limit: u32,
        offset: u32,
    ) -> Outcome {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let view = GroupsView::Search {
            query: query.map(str::to_string),
            level,
        };
        if let Err(out) = self.begin_groups(id, &view, offset) {
            return out;
        }
        self.search_page(id, query, level, limit, offset).await
    }

    async fn search_page(
        &self,
        id: &str,
        query: Option<&str>,
        level: Option<LogLevel>,
        limit: u32,
        offset: u32,
    ) -> Outcome {
        let request = ApiRequest::post(format!("/api/uploads/{}/search", segment(id))).json(
            &UploadSearchBody {
                limit,
                offset,
                query,
                level,
            },
        );
        let Some(response) = self.shared.call::<UploadSearchPage>(request).await else {
            return Outcome::cancelled();
        };

        let error = response.error_or("Search failed");
        let page = response.into_data();
        let view = GroupsView::Search {
            query: query.map(str::to_string),
            level,
        };
        self.shared
            .apply(|s| match page {
                Some(page) => {
                    if s.detail.upload.as_ref().map(|u| u.id.as_str()) != Some(id) {
                        s.detail.upload = None;
                    }
                    s.detail.upload_id = Some(id.to_string());
                    s.detail.view = Some(view);
                    s.detail.groups.apply_page(offset, page.results, Some(page.pagination));
                    Outcome::done()
                }
                None => {
                    s.detail.groups.fail(error.clone());
                    Outcome::failed(error)
                }
            })
            .unwrap_or_else(Outcome::cancelled)
    }

    /// Mark the detail pane loading.
    ///
    /// A page past the first may only extend the view that is currently
    /// shown; appending it to a different view would mix two result sets.
    fn begin_groups(&self, id: &str, view: &GroupsView, offset: u32) -> Result<(), Outcome> {
        self.shared.with(|s| {
            let is_active = s.detail.upload_id.as_deref() == Some(id) && s.detail.view.as_ref() == Some(view);
            if offset > 0 && !is_active {
                return Err(Outcome::failed(
                    "Cannot load a later page of a view that is not shown",
                ));
            }
            s.detail.groups.begin();
            Ok(())
        })
    }

    /// Fetch the next page of whichever groups view is active.
    ///
    /// Returns `None` when there is no next page, a detail fetch is already
    /// running, or no view is shown.
    pub async fn load_more_groups(&self) -> Option<Outcome> {
        let (id, view, next) = self.shared.with(|s| {
            let id = s.detail.upload_id.clone()?;
            let view = s.detail.view.clone()?;
            let next = s.detail.groups.begin_next_page()?;
            Some((id, view, next))
        })?;

        let out = match view {
            GroupsView::Browse { level } => {
                self.fetch_detail_page(&id, level, next.limit, next.offset).await
            }
            GroupsView::Search { query, level } => {
                self.search_page(&id, query.as_deref(), level, next.limit, next.offset)
                    .await
            }
        };
        Some(out)
    }

    pub fn clear_detail(&self) {
        self.shared.with(|s| s.detail = UploadDetail::default());
    }

    /// Put a freshly created upload at the head of the list
    pub fn prepend(&self, upload: Upload) {
        self.shared.with(|s| {
            s.uploads.prepend(upload);
            if let Some(p) = s.uploads.pagination.as_mut() {
                p.total += 1;
            }
        });
    }

    pub async fn delete_upload(&self, id: &str) -> Outcome {
        self.shared.with(|s| s.deleting = Some(id.to_string()));

        let request = ApiRequest::delete(format!("/api/uploads/{}", segment(id)));
        let response = self.shared.call::<serde_json::Value>(request).await;

        self.shared
            .apply(|s| {
                s.deleting = None;
                let Some(response) = response else {
                    return Outcome::cancelled();
                };
                if response.success {
                    tracing::info!(upload_id = %id, "Deleted upload");
                    s.uploads.remove_where(|u| u.id == id);
                    if let Some(p) = s.uploads.pagination.as_mut() {
                        p.total = p.total.saturating_sub(1);
                    }
                    if s.detail.upload_id.as_deref() == Some(id) {
                        s.detail = UploadDetail::default();
                    }
                    Outcome::done()
                } else {
                    Outcome::failed(response.error_or("Failed to delete upload"))
                }
            })
            .unwrap_or_else(Outcome::cancelled)
    }

    /// Discard responses still in flight and stop accepting new ones
    pub fn close(&self) {
        self.shared.scope.cancel();
    }
}
