use crate::cli::InitArgs;
use std::path::Path;

pub fn run(args: InitArgs) -> anyhow::Result<()> {
    write_template(&args.config)?;
    println!("wrote {}", args.config.display());
    Ok(())
}

const TEMPLATE: &str = r#"
version = "1"
engine = "postgres"

[database]
url = "${DATABASE_URL}"
schemas = ["public"]

[schema_cache]
dir = ".opus"
file = "schema.json"
mode = "auto" # auto | refresh | cache_only

[models]
src_dir = "src"
# Tables that never get a model.
reserved_tables = ["refinery_schema_history"]
# Stripped from table names before naming files and accessors.
table_prefixes = []
# Inbound foreign keys (`child_table.child_column`) rendered as to-one.
one_to_one = []
# Imported by any model with a to-many relation.
iterator_imports = ["pgorm::client::StreamingClient", "pgorm::sql::FromRowStream"]

[models.types]
# "numeric" = "rust_decimal::Decimal"
# "uuid" = "uuid::Uuid"

# [templates]
# Skeleton overrides, one `<kind>.txt` per template (model, model-magic, api, cli,
# cli_help, http_controller, view, view_markup, test).
# dir = "templates/opus"
"#;

fn write_template(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("refusing to overwrite existing file: {}", path.display());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("failed to create directory {}: {e}", parent.display())
            })?;
        }
    }

    std::fs::write(path, TEMPLATE.trim_start_matches('\n'))
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))?;
    Ok(())
}
