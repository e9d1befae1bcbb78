/// DID Cache - SQLite layer for persisting resolved DID documents
use crate::{
    error::{ResolverError, ResolverResult},
    identity::{
        cache::{CacheResult, DidCache, Freshness},
        memory_cache::{DEFAULT_MAX_TTL, DEFAULT_STALE_TTL},
        DidDocument,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use std::{path::Path, time::Duration};
use tracing::debug;

/// SQLite-backed DID cache
#[derive(Clone)]
pub struct SqliteDidCache {
    db: SqlitePool,
    /// Age at which entries are revalidated (default: 1 hour)
    stale_ttl: Duration,
    /// Age at which entries are refetched synchronously (default: 24 hours)
    max_ttl: Duration,
}

impl SqliteDidCache {
    /// Create a new DID cache on an existing pool
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            stale_ttl: DEFAULT_STALE_TTL,
            max_ttl: DEFAULT_MAX_TTL,
        }
    }

    /// Open (or create) a cache database file and run migrations
    pub async fn connect(path: &Path) -> ResolverResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let db = SqlitePool::connect_with(options).await?;

        let cache = Self::new(db);
        cache.migrate().await?;
        Ok(cache)
    }

    /// Set custom TTLs
    pub fn with_ttls(mut self, stale_ttl: Duration, max_ttl: Duration) -> Self {
        self.stale_ttl = stale_ttl;
        self.max_ttl = max_ttl;
        self
    }

    /// Create the cache table
    pub async fn migrate(&self) -> ResolverResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS did_doc (
                did TEXT PRIMARY KEY,
                doc TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl DidCache for SqliteDidCache {
    async fn check_cache(&self, did: &str) -> ResolverResult<Option<CacheResult>> {
        let result = sqlx::query(
            r#"
            SELECT doc, updated_at
            FROM did_doc
            WHERE did = ?1
            "#,
        )
        .bind(did)
        .fetch_optional(&self.db)
        .await?;

        let Some(row) = result else {
            return Ok(None);
        };

        let updated_at = parse_timestamp(&row.try_get::<String, _>("updated_at")?)?;
        let doc_json: String = row.try_get("doc")?;
        let doc: Option<DidDocument> = match serde_json::from_str(&doc_json) {
            Ok(doc) => doc,
            Err(e) => {
                debug!("Dropping unreadable cache entry for {}: {}", did, e);
                self.clear_entry(did).await?;
                return Ok(None);
            }
        };

        let age = (Utc::now() - updated_at).to_std().unwrap_or_default();
        Ok(Some(CacheResult {
            did: did.to_string(),
            doc,
            updated_at,
            freshness: Freshness::classify(age, self.stale_ttl, self.max_ttl),
        }))
    }

    async fn cache_did(&self, did: &str, doc: Option<&DidDocument>) -> ResolverResult<()> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let doc_json = serde_json::to_string(&doc)
            .map_err(|e| ResolverError::Cache(format!("Failed to serialize DID document: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO did_doc (did, doc, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(did) DO UPDATE SET
                doc = excluded.doc,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(did)
        .bind(&doc_json)
        .bind(&now)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn clear_entry(&self, did: &str) -> ResolverResult<()> {
        sqlx::query("DELETE FROM did_doc WHERE did = ?1")
            .bind(did)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn clear(&self) -> ResolverResult<()> {
        sqlx::query("DELETE FROM did_doc").execute(&self.db).await?;
        Ok(())
    }

    async fn cleanup_expired(&self) -> ResolverResult<u64> {
        let max_ttl = chrono::Duration::from_std(self.max_ttl)
            .map_err(|e| ResolverError::Internal(format!("Invalid max TTL: {}", e)))?;
        let cutoff = (Utc::now() - max_ttl).to_rfc3339_opts(SecondsFormat::Micros, true);

        let result = sqlx::query("DELETE FROM did_doc WHERE updated_at < ?1")
            .bind(&cutoff)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }

    async fn count(&self) -> ResolverResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM did_doc")
            .fetch_one(&self.db)
            .await?;
        Ok(row.try_get("n")?)
    }
}

/// Parse RFC3339 timestamp
fn parse_timestamp(s: &str) -> ResolverResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ResolverError::Internal(format!("Invalid timestamp: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::validate_did_doc;
    use serde_json::json;

    async fn create_test_cache() -> SqliteDidCache {
        let db = SqlitePool::connect(":memory:").await.unwrap();
        let cache = SqliteDidCache::new(db);
        cache.migrate().await.unwrap();
        cache
    }

    fn doc(did: &str) -> DidDocument {
        validate_did_doc(
            did,
            json!({
                "id": did,
                "alsoKnownAs": ["at://alice.test"],
                "verificationMethod": [{
                    "id": "#atproto",
                    "type": "Multikey",
                    "controller": did,
                    "publicKeyMultibase": "zQ3shtest"
                }]
            }),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_cache_and_get_did_doc() {
        let cache = create_test_cache().await;
        let did = "did:plc:test123";

        cache.cache_did(did, Some(&doc(did))).await.unwrap();

        let cached = cache.check_cache(did).await.unwrap().unwrap();
        assert_eq!(cached.freshness, Freshness::Fresh);
        assert_eq!(cached.doc, Some(doc(did)));
    }

    #[tokio::test]
    async fn test_tombstone_round_trip() {
        let cache = create_test_cache().await;

        cache.cache_did("did:plc:gone", None).await.unwrap();

        let cached = cache.check_cache("did:plc:gone").await.unwrap().unwrap();
        assert!(cached.doc.is_none());
    }

    #[tokio::test]
    async fn test_overwrite_and_clear() {
        let cache = create_test_cache().await;
        let did = "did:plc:overwrite";

        cache.cache_did(did, None).await.unwrap();
        cache.cache_did(did, Some(&doc(did))).await.unwrap();
        assert_eq!(cache.count().await.unwrap(), 1);
        assert!(cache.check_cache(did).await.unwrap().unwrap().doc.is_some());

        cache.clear_entry(did).await.unwrap();
        assert!(cache.check_cache(did).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let cache = create_test_cache()
            .await
            .with_ttls(Duration::ZERO, Duration::ZERO);

        cache.cache_did("did:plc:old", Some(&doc("did:plc:old"))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let removed = cache.cleanup_expired().await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(cache.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_entry_dropped() {
        let cache = create_test_cache().await;

        sqlx::query("INSERT INTO did_doc (did, doc, updated_at) VALUES (?1, ?2, ?3)")
            .bind("did:plc:corrupt")
            .bind("{not json")
            .bind(Utc::now().to_rfc3339())
            .execute(&cache.db)
            .await
            .unwrap();

        assert!(cache.check_cache("did:plc:corrupt").await.unwrap().is_none());
        assert_eq!(cache.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_file_backed_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("did_cache.sqlite");
        let did = "did:web:example.com";

        {
            let cache = SqliteDidCache::connect(&path).await.unwrap();
            cache.cache_did(did, Some(&doc(did))).await.unwrap();
        }

        let reopened = SqliteDidCache::connect(&path).await.unwrap();
        let cached = reopened.check_cache(did).await.unwrap().unwrap();
        assert_eq!(cached.doc.unwrap().handle(), Some("alice.test"));
    }
}
