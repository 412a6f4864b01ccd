use crate::client::SchemaClient;
use crate::error::{SchemaError, SchemaResult};
use crate::schema_introspect::{DbSchema, load_schema_from_db, schema_fingerprint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone)]
pub struct SchemaCacheConfig {
    /// Directory to store cache files (default: `./.opus`).
    pub cache_dir: PathBuf,
    /// Cache file name inside `cache_dir` (default: `schema.json`).
    pub cache_file_name: String,
    /// Which PostgreSQL schemas to introspect (default: `["public"]`).
    pub schemas: Vec<String>,
}

impl Default for SchemaCacheConfig {
    fn default() -> Self {
        let cache_dir = std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".opus");

        Self {
            cache_dir,
            cache_file_name: "schema.json".to_string(),
            schemas: vec!["public".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaCacheLoad {
    /// Loaded from local cache (fingerprint unchanged).
    CacheHit,
    /// Loaded from database (cache missing/invalid or fingerprint changed).
    Refreshed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaCache {
    pub version: u32,
    pub retrieved_at: DateTime<Utc>,
    pub schemas: Vec<String>,
    pub fingerprint: String,
    pub schema: DbSchema,
}

impl SchemaCache {
    pub fn cache_path(config: &SchemaCacheConfig) -> PathBuf {
        config.cache_dir.join(&config.cache_file_name)
    }

    /// Use the cached snapshot when its fingerprint still matches the database.
    pub async fn load_or_refresh<C: SchemaClient>(
        client: &C,
        config: &SchemaCacheConfig,
    ) -> SchemaResult<(Self, SchemaCacheLoad)> {
        let cache_path = Self::cache_path(config);

        match read_cache_file(&cache_path) {
            Ok(cached) if cached.matches(config) => {
                let current_fp = schema_fingerprint(client, &config.schemas).await?;
                if current_fp == cached.fingerprint {
                    tracing::debug!(path = %cache_path.display(), "schema cache hit");
                    return Ok((cached, SchemaCacheLoad::CacheHit));
                }
                tracing::debug!("schema fingerprint changed, refreshing");
            }
            Ok(_) => tracing::debug!("schema cache is for other schemas, refreshing"),
            Err(e) => tracing::debug!(error = %e, "schema cache unavailable, refreshing"),
        }

        let refreshed = Self::refresh(client, config).await?;
        Ok((refreshed, SchemaCacheLoad::Refreshed))
    }

    /// Always reload from the database and rewrite the cache file.
    pub async fn refresh<C: SchemaClient>(
        client: &C,
        config: &SchemaCacheConfig,
    ) -> SchemaResult<Self> {
        let (schema, fingerprint) = load_schema_from_db(client, &config.schemas).await?;
        let refreshed = SchemaCache {
            version: CACHE_VERSION,
            retrieved_at: Utc::now(),
            schemas: config.schemas.clone(),
            fingerprint,
            schema,
        };

        write_cache_file(&Self::cache_path(config), &refreshed)?;
        Ok(refreshed)
    }

    /// Read the cache file without touching the database.
    pub fn load_cached(config: &SchemaCacheConfig) -> SchemaResult<Self> {
        let cache_path = Self::cache_path(config);
        let cached = read_cache_file(&cache_path)?;
        if !cached.matches(config) {
            return Err(SchemaError::Validation(format!(
                "schema cache {} was built for schemas {:?}, expected {:?}",
                cache_path.display(),
                cached.schemas,
                config.schemas
            )));
        }
        Ok(cached)
    }

    fn matches(&self, config: &SchemaCacheConfig) -> bool {
        self.version == CACHE_VERSION && self.schemas == config.schemas
    }
}

fn read_cache_file(path: &Path) -> SchemaResult<SchemaCache> {
    let data = std::fs::read(path)
        .map_err(|e| SchemaError::Other(format!("Failed to read {}: {e}", path.display())))?;

    serde_json::from_slice::<SchemaCache>(&data)
        .map_err(|e| SchemaError::Serialization(format!("Failed to parse schema cache: {e}")))
}

fn write_cache_file(path: &Path, cache: &SchemaCache) -> SchemaResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SchemaError::Other(e.to_string()))?;
    }

    let tmp_path = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(cache)
        .map_err(|e| SchemaError::Serialization(format!("Failed to serialize schema cache: {e}")))?;

    std::fs::write(&tmp_path, data).map_err(|e| SchemaError::Other(e.to_string()))?;
    std::fs::rename(&tmp_path, path).map_err(|e| SchemaError::Other(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(schemas: &[&str]) -> SchemaCache {
        SchemaCache {
            version: CACHE_VERSION,
            retrieved_at: Utc::now(),
            schemas: schemas.iter().map(|s| s.to_string()).collect(),
            fingerprint: "abc".to_string(),
            schema: DbSchema {
                schemas: schemas.iter().map(|s| s.to_string()).collect(),
                tables: Vec::new(),
                foreign_keys: Vec::new(),
            },
        }
    }

    fn config(dir: &Path) -> SchemaCacheConfig {
        SchemaCacheConfig {
            cache_dir: dir.join(".opus"),
            cache_file_name: "schema.json".to_string(),
            schemas: vec!["public".to_string()],
        }
    }

    #[test]
    fn cached_snapshot_is_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        write_cache_file(&SchemaCache::cache_path(&config), &sample(&["public"])).unwrap();

        let loaded = SchemaCache::load_cached(&config).unwrap();
        assert_eq!(loaded.fingerprint, "abc");
        assert!(!SchemaCache::cache_path(&config)
            .with_extension("json.tmp")
            .exists());
    }

    #[test]
    fn cache_for_other_schemas_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        write_cache_file(&SchemaCache::cache_path(&config), &sample(&["audit"])).unwrap();

        assert!(matches!(
            SchemaCache::load_cached(&config),
            Err(SchemaError::Validation(_))
        ));
    }

    #[test]
    fn missing_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SchemaCache::load_cached(&config(dir.path())).is_err());
    }
}
