//! In-memory entity store used by tests and local runs.

use std::collections::BTreeMap;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

use crate::config::TableSettings;
use crate::infra::error::BackendError;

use super::{
    Document, EntityStore, IndexSpec, ItemKey, ScanCondition, ScanPage, TableSpec, TableStatus,
};

/// Separator between hash and range parts of a composite storage key.
const KEY_SEP: char = '\u{1f}';

struct MemoryTable {
    spec: TableSpec,
    /// Remaining `describe_table` calls before the table reports `Active`.
    pending_polls: AtomicU32,
    items: RwLock<BTreeMap<String, Document>>,
}

impl MemoryTable {
    fn new(spec: TableSpec, pending_polls: u32) -> Self {
        Self {
            spec,
            pending_polls: AtomicU32::new(pending_polls),
            items: RwLock::new(BTreeMap::new()),
        }
    }

    fn storage_key(&self, item: &Document) -> Result<String, BackendError> {
        let hash = item
            .get(self.spec.hash_key)
            .and_then(|v| v.as_str())
            .ok_or(BackendError::MissingKey {
                attr: self.spec.hash_key,
            })?;
        match self.spec.range_key {
            None => Ok(hash.to_string()),
            Some(range_attr) => {
                let range = item
                    .get(range_attr)
                    .and_then(|v| v.as_str())
                    .ok_or(BackendError::MissingKey { attr: range_attr })?;
                Ok(format!("{hash}{KEY_SEP}{range}"))
            }
        }
    }
}

fn key_string(key: &ItemKey) -> String {
    match key {
        ItemKey::Hash(hash) => hash.clone(),
        ItemKey::Composite { hash, range } => format!("{hash}{KEY_SEP}{range}"),
    }
}

fn matches(item: &Document, filter: &[ScanCondition]) -> bool {
    filter
        .iter()
        .all(|cond| item.get(cond.attr) == Some(&cond.value))
}

/// Sort attribute parsed as an RFC 3339 timestamp. Raw string comparison is
/// not enough: the writer omits zero subsecond fractions, and `'Z' > '.'`
/// would misorder those against fractional stamps in the same second.
fn sort_instant(item: &Document, attr: &str) -> Option<OffsetDateTime> {
    item.get(attr)
        .and_then(|v| v.as_str())
        .and_then(|s| OffsetDateTime::parse(s, &Rfc3339).ok())
}

/// Dashmap-backed document store with declared tables and indexes.
///
/// Freshly created tables stay `Creating` for a configurable number of
/// `describe_table` calls so provisioning polls are observable.
pub struct MemoryStore {
    tables: DashMap<String, MemoryTable>,
    activation_polls: u32,
}

impl MemoryStore {
    /// Provision the standing entity tables. The download log is not among
    /// them; it is created lazily by its first writer.
    pub fn new(tables: &TableSettings) -> Self {
        let store = Self {
            tables: DashMap::new(),
            activation_polls: 0,
        };
        store.provision(TableSpec {
            name: tables.users.clone(),
            hash_key: "id",
            range_key: None,
            indexes: vec![IndexSpec {
                name: "email-index",
                hash_key: "email",
                sort_key: None,
            }],
        });
        store.provision(TableSpec {
            name: tables.images.clone(),
            hash_key: "id",
            range_key: None,
            indexes: vec![],
        });
        store.provision(TableSpec {
            name: tables.tag_index.clone(),
            hash_key: "tag",
            range_key: Some("image_id"),
            indexes: vec![],
        });
        store.provision(TableSpec {
            name: tables.likes.clone(),
            hash_key: "image_id",
            range_key: Some("user_id"),
            indexes: vec![IndexSpec {
                name: "user_id-index",
                hash_key: "user_id",
                sort_key: None,
            }],
        });
        store.provision(TableSpec {
            name: tables.follows.clone(),
            hash_key: "follower_id",
            range_key: Some("followee_id"),
            indexes: vec![],
        });
        store
    }

    /// Make tables created through `create_table` report `Creating` for the
    /// given number of describe calls before turning `Active`.
    pub fn with_activation_polls(mut self, polls: u32) -> Self {
        self.activation_polls = polls;
        self
    }

    fn provision(&self, spec: TableSpec) {
        self.tables
            .insert(spec.name.clone(), MemoryTable::new(spec, 0));
    }

    fn with_table<R>(
        &self,
        table: &str,
        f: impl FnOnce(&MemoryTable) -> Result<R, BackendError>,
    ) -> Result<R, BackendError> {
        match self.tables.get(table) {
            Some(entry) => f(entry.value()),
            None => Err(BackendError::table_not_found(table)),
        }
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn create_table(&self, spec: TableSpec) -> Result<(), BackendError> {
        if self.tables.contains_key(&spec.name) {
            return Err(BackendError::TableExists {
                table: spec.name.clone(),
            });
        }
        debug!(table = %spec.name, "creating table");
        self.tables.insert(
            spec.name.clone(),
            MemoryTable::new(spec, self.activation_polls),
        );
        Ok(())
    }

    async fn describe_table(&self, table: &str) -> Result<TableStatus, BackendError> {
        self.with_table(table, |t| {
            if t.pending_polls.load(Ordering::SeqCst) == 0 {
                Ok(TableStatus::Active)
            } else {
                t.pending_polls.fetch_sub(1, Ordering::SeqCst);
                Ok(TableStatus::Creating)
            }
        })
    }

    async fn get_item(&self, table: &str, key: &ItemKey) -> Result<Option<Document>, BackendError> {
        self.with_table(table, |t| {
            let items = t.items.read().unwrap_or_else(PoisonError::into_inner);
            Ok(items.get(&key_string(key)).cloned())
        })
    }

    async fn put_item(&self, table: &str, item: Document) -> Result<(), BackendError> {
        self.with_table(table, |t| {
            let storage_key = t.storage_key(&item)?;
            let mut items = t.items.write().unwrap_or_else(PoisonError::into_inner);
            items.insert(storage_key, item);
            Ok(())
        })
    }

    async fn delete_item(&self, table: &str, key: &ItemKey) -> Result<(), BackendError> {
        self.with_table(table, |t| {
            let mut items = t.items.write().unwrap_or_else(PoisonError::into_inner);
            items.remove(&key_string(key));
            Ok(())
        })
    }

    async fn query(&self, table: &str, hash: &str) -> Result<Vec<Document>, BackendError> {
        self.with_table(table, |t| {
            let items = t.items.read().unwrap_or_else(PoisonError::into_inner);
            Ok(items
                .values()
                .filter(|item| item.get(t.spec.hash_key).and_then(|v| v.as_str()) == Some(hash))
                .cloned()
                .collect())
        })
    }

    async fn query_index(
        &self,
        table: &str,
        index: &str,
        value: &str,
        newest_first: bool,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, BackendError> {
        self.with_table(table, |t| {
            let spec = t
                .spec
                .indexes
                .iter()
                .find(|ix| ix.name == index)
                .ok_or_else(|| BackendError::index_not_found(table, index))?;

            let items = t.items.read().unwrap_or_else(PoisonError::into_inner);
            let mut matched: Vec<Document> = items
                .values()
                .filter(|item| item.get(spec.hash_key).and_then(|v| v.as_str()) == Some(value))
                .cloned()
                .collect();

            if newest_first && let Some(sort_attr) = spec.sort_key {
                // Unparsable stamps sort oldest.
                matched.sort_by(|a, b| {
                    sort_instant(b, sort_attr).cmp(&sort_instant(a, sort_attr))
                });
            }
            if let Some(limit) = limit {
                matched.truncate(limit);
            }
            Ok(matched)
        })
    }

    async fn scan(
        &self,
        table: &str,
        filter: &[ScanCondition],
        start: Option<String>,
        limit: Option<usize>,
    ) -> Result<ScanPage, BackendError> {
        self.with_table(table, |t| {
            let items = t.items.read().unwrap_or_else(PoisonError::into_inner);
            let mut page = Vec::new();
            let mut last_key = None;
            let mut more = false;

            for (key, item) in items.iter() {
                if let Some(start) = &start
                    && key.as_str() <= start.as_str()
                {
                    continue;
                }
                if !matches(item, filter) {
                    continue;
                }
                if limit.is_some_and(|limit| page.len() >= limit) {
                    more = true;
                    break;
                }
                last_key = Some(key.clone());
                page.push(item.clone());
            }

            Ok(ScanPage {
                items: page,
                next: if more { last_key } else { None },
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::new(&TableSettings::default())
    }

    #[tokio::test]
    async fn point_lookup_round_trip_with_composite_key() {
        let store = store();
        let edge = json!({ "image_id": "img-1", "user_id": "u-1", "liked_at": "2026-01-01T00:00:00Z" });
        store.put_item("likes", edge.clone()).await.expect("put");

        let key = ItemKey::composite("img-1", "u-1");
        let found = store.get_item("likes", &key).await.expect("get");
        assert_eq!(found, Some(edge));

        store.delete_item("likes", &key).await.expect("delete");
        assert!(store.get_item("likes", &key).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn missing_index_is_reported() {
        let store = store();
        let err = store
            .query_index("images", "owner-index", "u-1", false, None)
            .await
            .expect_err("no such index");
        assert!(matches!(err, BackendError::IndexNotFound { .. }));
    }

    #[tokio::test]
    async fn scan_pages_resume_from_continuation_token() {
        let store = store();
        for i in 0..7 {
            store
                .put_item("images", json!({ "id": format!("img-{i}"), "owner_id": "u-1" }))
                .await
                .expect("put");
        }
        store
            .put_item("images", json!({ "id": "other", "owner_id": "u-2" }))
            .await
            .expect("put");

        let filter = [ScanCondition::eq("owner_id", "u-1")];
        let mut seen = Vec::new();
        let mut token = None;
        loop {
            let page = store
                .scan("images", &filter, token.clone(), Some(3))
                .await
                .expect("scan");
            seen.extend(page.items);
            token = page.next;
            if token.is_none() {
                break;
            }
        }
        assert_eq!(seen.len(), 7);
    }

    #[tokio::test]
    async fn created_table_activates_after_bounded_polls() {
        let store = store().with_activation_polls(2);
        let spec = TableSpec {
            name: "downloads".to_string(),
            hash_key: "id",
            range_key: None,
            indexes: vec![],
        };
        store.create_table(spec.clone()).await.expect("create");
        let err = store.create_table(spec).await.expect_err("duplicate");
        assert!(matches!(err, BackendError::TableExists { .. }));

        assert_eq!(
            store.describe_table("downloads").await.expect("describe"),
            TableStatus::Creating
        );
        assert_eq!(
            store.describe_table("downloads").await.expect("describe"),
            TableStatus::Creating
        );
        assert_eq!(
            store.describe_table("downloads").await.expect("describe"),
            TableStatus::Active
        );
    }

    #[tokio::test]
    async fn index_query_orders_newest_first_by_sort_key() {
        let store = store();
        store
            .create_table(TableSpec {
                name: "events".to_string(),
                hash_key: "id",
                range_key: None,
                indexes: vec![IndexSpec {
                    name: "image_id-index",
                    hash_key: "image_id",
                    sort_key: Some("created_at"),
                }],
            })
            .await
            .expect("create");

        for (id, at) in [
            ("a", "2026-01-01T00:00:00Z"),
            ("b", "2026-03-01T00:00:00Z"),
            ("c", "2026-02-01T00:00:00Z"),
        ] {
            store
                .put_item("events", json!({ "id": id, "image_id": "img", "created_at": at }))
                .await
                .expect("put");
        }

        let newest = store
            .query_index("events", "image_id-index", "img", true, Some(2))
            .await
            .expect("query");
        let ids: Vec<_> = newest
            .iter()
            .map(|d| d["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn index_ordering_handles_mixed_subsecond_precision() {
        let store = store();
        store
            .create_table(TableSpec {
                name: "events".to_string(),
                hash_key: "id",
                range_key: None,
                indexes: vec![IndexSpec {
                    name: "image_id-index",
                    hash_key: "image_id",
                    sort_key: Some("created_at"),
                }],
            })
            .await
            .expect("create");

        // Zero fractions are written without a subsecond part, so a raw
        // string comparison would rank "00Z" above "00.5Z".
        for (id, at) in [
            ("whole", "2026-05-01T00:00:00Z"),
            ("half", "2026-05-01T00:00:00.5Z"),
            ("earlier", "2026-04-30T23:59:59.9Z"),
        ] {
            store
                .put_item("events", json!({ "id": id, "image_id": "img", "created_at": at }))
                .await
                .expect("put");
        }

        let newest = store
            .query_index("events", "image_id-index", "img", true, None)
            .await
            .expect("query");
        let ids: Vec<_> = newest
            .iter()
            .map(|d| d["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["half", "whole", "earlier"]);
    }
}
