//! Append-only download log with lazy table provisioning.
//!
//! Count and list queries prefer the image-keyed index and degrade to
//! zero/empty on failure so aggregate views stay up when the log subsystem
//! is unhealthy.

use metrics::counter;
use serde_json::json;
use tracing::warn;

use crate::domain::DownloadEvent;
use crate::infra::{
    BackendError, Document, IndexSpec, ScanCondition, TableSpec, TableStatus, from_document,
    to_document,
};

use super::{DataService, ServiceError};

const DOWNLOADS_IMAGE_INDEX: &str = "image_id-index";
/// Queried first for per-user listings; the provisioner never creates it, so
/// lookups fall back to the paginated scan below.
const DOWNLOADS_USER_INDEX: &str = "user_id-index";
const FALLBACK_SCAN_CHUNK: usize = 100;

/// Caller-supplied details recorded with a download event.
#[derive(Debug, Clone, Default)]
pub struct DownloadRequest {
    pub title: String,
    pub image_url: String,
    pub photographer: String,
    pub size_id: String,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

impl DataService {
    /// Append one download event, provisioning the log table on first use.
    pub async fn track_download(
        &self,
        image_id: &str,
        user_id: Option<&str>,
        request: DownloadRequest,
    ) -> Result<DownloadEvent, ServiceError> {
        if image_id.trim().is_empty() {
            return Err(ServiceError::validation("image_id is required"));
        }
        self.ensure_download_log().await?;

        let mut event = DownloadEvent::new(image_id, user_id.map(str::to_string));
        event.title = request.title;
        event.image_url = request.image_url;
        event.photographer = request.photographer;
        event.size_id = request.size_id;
        event.user_agent = request.user_agent;
        event.referer = request.referer;

        self.store()
            .put_item(&self.config.downloads.table, to_document(&event)?)
            .await?;
        counter!("lumina_downloads_tracked_total").increment(1);
        Ok(event)
    }

    /// Downloads recorded for one image, zero on any query failure.
    pub async fn download_count_by_image(&self, image_id: &str) -> i64 {
        if image_id.is_empty() {
            return 0;
        }
        match self
            .store()
            .query_index(
                &self.config.downloads.table,
                DOWNLOADS_IMAGE_INDEX,
                image_id,
                false,
                None,
            )
            .await
        {
            Ok(items) => items.len() as i64,
            Err(err) => {
                warn!(image_id, error = %err, "download count query failed; returning zero");
                0
            }
        }
    }

    /// Downloads recorded by one user, counted across every scan page; zero
    /// on any failure.
    pub async fn download_count_by_user(&self, user_id: &str) -> i64 {
        if user_id.is_empty() {
            return 0;
        }
        let filter = [ScanCondition::eq("user_id", json!(user_id))];
        let mut total: i64 = 0;
        let mut token = None;
        loop {
            let page = match self
                .store()
                .scan(
                    &self.config.downloads.table,
                    &filter,
                    token,
                    Some(FALLBACK_SCAN_CHUNK),
                )
                .await
            {
                Ok(page) => page,
                Err(err) => {
                    warn!(user_id, error = %err, "download count scan failed; returning zero");
                    return 0;
                }
            };
            total += page.items.len() as i64;
            token = page.next;
            if token.is_none() {
                return total;
            }
        }
    }

    /// Most recent downloads of one image, newest first; empty on failure.
    pub async fn downloads_by_image(&self, image_id: &str, limit: usize) -> Vec<DownloadEvent> {
        if image_id.is_empty() {
            return Vec::new();
        }
        match self
            .store()
            .query_index(
                &self.config.downloads.table,
                DOWNLOADS_IMAGE_INDEX,
                image_id,
                true,
                Some(limit),
            )
            .await
        {
            Ok(items) => decode_events(items),
            Err(err) => {
                warn!(image_id, error = %err, "download listing query failed; returning empty");
                Vec::new()
            }
        }
    }

    /// Recent downloads by one user. Tries the user-keyed index first; if the
    /// index is unavailable or the query fails, falls back to a manually
    /// paginated scan (unordered). Failures yield whatever was collected.
    pub async fn downloads_by_user(&self, user_id: &str, limit: usize) -> Vec<DownloadEvent> {
        if user_id.is_empty() || limit == 0 {
            return Vec::new();
        }

        match self
            .store()
            .query_index(
                &self.config.downloads.table,
                DOWNLOADS_USER_INDEX,
                user_id,
                true,
                Some(limit),
            )
            .await
        {
            Ok(items) => return decode_events(items),
            Err(BackendError::IndexNotFound { .. }) => {}
            Err(err) => {
                warn!(user_id, error = %err, "download user-index query failed; falling back to scan");
            }
        }

        let filter = [ScanCondition::eq("user_id", json!(user_id))];
        let mut events = Vec::new();
        let mut token = None;
        while events.len() < limit {
            let chunk = (limit - events.len()).min(FALLBACK_SCAN_CHUNK);
            let page = match self
                .store()
                .scan(&self.config.downloads.table, &filter, token, Some(chunk))
                .await
            {
                Ok(page) => page,
                Err(err) => {
                    warn!(user_id, error = %err, "download fallback scan failed; returning partial");
                    break;
                }
            };
            events.extend(decode_events(page.items));
            token = page.next;
            if token.is_none() {
                break;
            }
        }
        events.truncate(limit);
        events
    }

    /// Make sure the append-only log table exists and is active.
    ///
    /// Concurrent first callers may race on creation; losing the race is
    /// treated as success. If the table is still not active after the bounded
    /// poll, the insert is attempted anyway.
    async fn ensure_download_log(&self) -> Result<(), ServiceError> {
        let settings = &self.config.downloads;
        match self.store().describe_table(&settings.table).await {
            Ok(TableStatus::Active) => return Ok(()),
            Ok(TableStatus::Creating) => {}
            Err(BackendError::TableNotFound { .. }) => {
                let spec = TableSpec {
                    name: settings.table.clone(),
                    hash_key: "id",
                    range_key: None,
                    indexes: vec![IndexSpec {
                        name: DOWNLOADS_IMAGE_INDEX,
                        hash_key: "image_id",
                        sort_key: Some("created_at"),
                    }],
                };
                match self.store().create_table(spec).await {
                    Ok(()) => {}
                    Err(BackendError::TableExists { .. }) => {}
                    Err(err) => return Err(err.into()),
                }
            }
            Err(err) => return Err(err.into()),
        }

        for _ in 0..settings.provision_poll_attempts {
            if matches!(
                self.store().describe_table(&settings.table).await,
                Ok(TableStatus::Active)
            ) {
                return Ok(());
            }
            tokio::time::sleep(settings.poll_interval()).await;
        }
        warn!(
            table = %settings.table,
            "download log table not active after bounded poll; proceeding"
        );
        Ok(())
    }
}

fn decode_events(items: Vec<Document>) -> Vec<DownloadEvent> {
    items
        .into_iter()
        .filter_map(|doc| match from_document::<DownloadEvent>(doc) {
            Ok(event) => Some(event),
            Err(err) => {
                warn!(error = %err, "skipping undecodable download event");
                None
            }
        })
        .collect()
}
