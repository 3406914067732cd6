//! Single log file submission

use std::path::Path;
use std::sync::Arc;

use crate::api::{Api, ApiRequest, MultipartFile};
use crate::auth::AuthContext;
use crate::types::{features, limits, Upload, UploadResult};
use crate::validation;

use super::{Outcome, Settle, Shared, UploadsStore};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadState {
    pub loading: bool,
    /// 0 until the server answers, 100 once the upload is processed
    pub progress: u8,
    pub error: Option<String>,
    pub result: Option<UploadResult>,
}

impl Settle for UploadState {
    fn settle(&mut self) {
        self.loading = false;
    }
}

/// Store for `POST /api/uploads`
#[derive(Clone)]
pub struct UploadStore {
    shared: Arc<Shared<UploadState>>,
    list: Option<UploadsStore>,
}

impl UploadStore {
    pub fn new(api: Api, auth: Arc<AuthContext>) -> Self {
        Self {
            shared: Shared::new(api, auth, UploadState::default()),
            list: None,
        }
    }

    /// Prepend successful uploads to `list`
    pub fn with_list(mut self, list: UploadsStore) -> Self {
        self.list = Some(list);
        self
    }

    pub fn state(&self) -> UploadState {
        self.shared.snapshot()
    }

    /// Whether the plan includes uploads at all
    pub fn can_upload(&self) -> bool {
        self.shared.auth.has_feature(features::UPLOAD_LOGS)
    }

    /// Read `path` and upload it
    pub async fn upload_path(&self, path: &Path) -> Outcome<UploadResult> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        // Name and size are checked before the file is read
        let size = match tokio::fs::metadata(path).await {
            Ok(meta) => meta.len(),
            Err(e) => return self.reject(format!("Failed to read {}: {}", path.display(), e)),
        };
        if let Err(e) = self.precheck(&filename, size) {
            return self.reject(e.to_string());
        }

        match tokio::fs::read(path).await {
            Ok(bytes) => self.upload(&filename, bytes).await,
            Err(e) => self.reject(format!("Failed to read {}: {}", path.display(), e)),
        }
    }

    /// Validate and submit one file.
    ///
    /// File name/size and plan entitlements are checked first; no request is
    /// sent when any of them fails.
    pub async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Outcome<UploadResult> {
        if let Err(e) = self.precheck(filename, bytes.len() as u64) {
            return self.reject(e.to_string());
        }

        self.shared.with(|s| {
            s.loading = true;
            s.error = None;
            s.progress = 0;
            s.result = None;
        });

        let request = ApiRequest::post("/api/uploads").multipart(MultipartFile {
            field: "file".to_string(),
            filename: filename.to_string(),
            bytes,
        });
        let Some(response) = self.shared.call::<UploadResult>(request).await else {
            return Outcome::cancelled();
        };

        let error = response.error_or("Upload failed");
        let Some(result) = response.into_data() else {
            tracing::warn!(filename, error = %error, "Upload failed");
            self.shared.apply(|s| {
                s.loading = false;
                s.progress = 0;
                s.error = Some(error.clone());
            });
            return Outcome::failed(error);
        };

        tracing::info!(
            upload_id = %result.upload.id,
            lines = result.upload.total_lines,
            groups = result.groups_count,
            "Upload processed"
        );

        let applied = self.shared.apply(|s| {
            s.progress = 100;
            s.result = Some(result.clone());
        });
        if applied.is_none() {
            return Outcome::cancelled();
        }

        if let Some(list) = &self.list {
            list.prepend(Upload {
                id: result.upload.id.clone(),
                filename: result.upload.original_filename.clone(),
                total_lines: result.upload.total_lines,
                level_counts: result.upload.level_counts,
                patterns_found: result.groups_count,
                created_at: result.upload.created_at,
            });
        }

        // Usage counters changed
        let _ = self.shared.auth.refresh_permissions().await;
        self.shared.with(|s| s.loading = false);
        Outcome::ok(result)
    }

    fn precheck(&self, filename: &str, size: u64) -> crate::Result<()> {
        let permissions = self.shared.auth.permissions();
        validation::validate_log_file(
            filename,
            size,
            validation::max_file_size_mb(permissions.as_ref()),
        )?;

        if !self.can_upload() {
            return Err(crate::Error::Entitlement(
                "Your plan does not include log uploads. Please upgrade.".to_string(),
            ));
        }

        let limit = self.shared.auth.check_limit(limits::MONTHLY_UPLOADS);
        if !limit.allowed {
            return Err(crate::Error::Entitlement(format!(
                "You've reached your monthly upload limit ({}). Please upgrade for more uploads.",
                limit.max
            )));
        }
        Ok(())
    }

    fn reject(&self, error: String) -> Outcome<UploadResult> {
        self.shared.with(|s| s.error = Some(error.clone()));
        Outcome::failed(error)
    }

    pub fn reset(&self) {
        self.shared.with(|s| *s = UploadState::default());
    }

    pub fn close(&self) {
        self.shared.scope.cancel();
    }
}
