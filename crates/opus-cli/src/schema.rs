use crate::cli::SchemaArgs;
use crate::config::{ProjectConfig, SchemaCacheMode};
use colored::Colorize;
use opus_schema::{DbSchema, SchemaCache, SchemaCacheConfig, SchemaCacheLoad};
use tokio_postgres::NoTls;

/// `opus schema`: force a refresh of the cached snapshot.
pub async fn run(args: SchemaArgs) -> anyhow::Result<()> {
    let project = ProjectConfig::load_or_default(args.config.clone())?;
    let database_url = project.database_url(args.database.as_deref())?;
    let cache_cfg = to_cache_config(&project, &project.schemas(args.schemas.as_deref()));

    let client = connect_db(&database_url).await?;
    let cache = SchemaCache::refresh(&client, &cache_cfg).await?;

    println!(
        "{} {} tables (schemas: {})",
        "schema refreshed:".green().bold(),
        cache.schema.tables.len(),
        cache.schemas.join(",")
    );
    println!("cache file: {}", SchemaCache::cache_path(&cache_cfg).display());
    println!("fingerprint: {}", cache.fingerprint);

    Ok(())
}

/// Snapshot for a generation run, honouring `[schema_cache] mode`.
///
/// An explicit `--database` always wins over `cache_only`.
pub async fn load_project_schema(
    project: &ProjectConfig,
    database: Option<&str>,
) -> anyhow::Result<DbSchema> {
    let cache_cfg = to_cache_config(project, &project.schemas(None));
    let mode = match (project.file.schema_cache.mode, database) {
        (SchemaCacheMode::CacheOnly, Some(_)) => SchemaCacheMode::Auto,
        (mode, _) => mode,
    };

    if mode == SchemaCacheMode::CacheOnly {
        let cache = SchemaCache::load_cached(&cache_cfg)?;
        tracing::debug!(path = %SchemaCache::cache_path(&cache_cfg).display(), "using cached schema only");
        return Ok(cache.schema);
    }

    let client = connect_db(&project.database_url(database)?).await?;
    let cache = match mode {
        SchemaCacheMode::Refresh => SchemaCache::refresh(&client, &cache_cfg).await?,
        _ => {
            let (cache, load) = SchemaCache::load_or_refresh(&client, &cache_cfg).await?;
            tracing::debug!(
                load = match load {
                    SchemaCacheLoad::CacheHit => "cache hit",
                    SchemaCacheLoad::Refreshed => "refreshed",
                },
                "schema snapshot"
            );
            cache
        }
    };
    Ok(cache.schema)
}

pub async fn connect_db(database_url: &str) -> anyhow::Result<tokio_postgres::Client> {
    let (client, connection) = tokio_postgres::connect(database_url, NoTls)
        .await
        .map_err(|e| anyhow::anyhow!("failed to connect to database: {e}"))?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(error = %e, "postgres connection error");
        }
    });
    Ok(client)
}

fn to_cache_config(project: &ProjectConfig, schemas: &[String]) -> SchemaCacheConfig {
    let dir = project
        .file
        .schema_cache
        .dir
        .as_deref()
        .unwrap_or(".opus");
    let file = project
        .file
        .schema_cache
        .file
        .as_deref()
        .unwrap_or("schema.json");

    SchemaCacheConfig {
        cache_dir: project.resolve_path(dir),
        cache_file_name: file.to_string(),
        schemas: schemas.to_vec(),
    }
}
