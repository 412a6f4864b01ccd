use crate::client::{RowExt, SchemaClient};
use crate::error::{SchemaError, SchemaResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Table,
    PartitionedTable,
    View,
    MaterializedView,
    ForeignTable,
    Other,
}

impl RelationKind {
    fn from_relkind(relkind: i8) -> Self {
        // Postgres stores `relkind` as a "char" internally. tokio-postgres exposes it as i8.
        match relkind as u8 as char {
            'r' => Self::Table,
            'p' => Self::PartitionedTable,
            'v' => Self::View,
            'm' => Self::MaterializedView,
            'f' => Self::ForeignTable,
            _ => Self::Other,
        }
    }

    pub fn is_table_like(self) -> bool {
        matches!(self, Self::Table | Self::PartitionedTable)
    }
}

/// Language-neutral classification of a column type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    #[default]
    String,
    Int,
    Bool,
    Decimal,
    DateTime,
    Enum,
}

impl ColumnType {
    /// Classify a `format_type` string. Arrays and unknown types fall back to `String`.
    pub fn from_pg_type(data_type: &str, is_enum: bool) -> Self {
        if is_enum {
            return Self::Enum;
        }

        let normalized = data_type.trim().to_lowercase();
        if normalized.ends_with("[]") {
            return Self::String;
        }
        let base = normalized.split('(').next().unwrap_or_default().trim();

        match base {
            "bool" | "boolean" => Self::Bool,
            "int2" | "int4" | "int8" | "smallint" | "integer" | "bigint" | "smallserial"
            | "serial" | "bigserial" => Self::Int,
            "numeric" | "decimal" | "real" | "double precision" | "float4" | "float8"
            | "money" => Self::Decimal,
            "date" => Self::DateTime,
            _ if base.starts_with("timestamp") || base.starts_with("time") => Self::DateTime,
            _ => Self::String,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
    #[serde(default)]
    pub semantic: ColumnType,
    pub not_null: bool,
    pub default_expr: Option<String>,
    pub ordinal: i32,
}

impl ColumnDescriptor {
    /// The column default as a Rust literal, when the default is a constant.
    ///
    /// Server-side expressions (`now()`, `nextval(..)`, ...) return `None`.
    pub fn default_literal(&self) -> Option<String> {
        let raw = self.default_expr.as_deref()?.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("null") || raw.starts_with("NULL::") {
            return None;
        }

        let value = strip_cast(raw);
        let unquoted = unquote(value);

        match self.semantic {
            ColumnType::Bool => match unquoted.as_deref().unwrap_or(value) {
                v if v.eq_ignore_ascii_case("true") => Some("true".to_string()),
                v if v.eq_ignore_ascii_case("false") => Some("false".to_string()),
                _ => None,
            },
            ColumnType::Int => {
                let v = unquoted.as_deref().unwrap_or(value);
                v.trim_matches(|c| c == '(' || c == ')')
                    .parse::<i64>()
                    .ok()
                    .map(|n| n.to_string())
            }
            ColumnType::Decimal => {
                let v = unquoted.as_deref().unwrap_or(value);
                let v = v.trim_matches(|c| c == '(' || c == ')');
                v.parse::<f64>().ok().map(|_| v.to_string())
            }
            ColumnType::String | ColumnType::Enum => unquoted.map(|s| format!("{s:?}")),
            ColumnType::DateTime => None,
        }
    }
}

/// Drop a trailing `::type` cast, respecting quoted literals.
fn strip_cast(raw: &str) -> &str {
    if raw.starts_with('\'') {
        let bytes = raw.as_bytes();
        let mut i = 1;
        while i < bytes.len() {
            if bytes[i] == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                return &raw[..=i];
            }
            i += 1;
        }
        return raw;
    }

    match raw.find("::") {
        Some(pos) => raw[..pos].trim(),
        None => raw,
    }
}

fn unquote(value: &str) -> Option<String> {
    let inner = value.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.replace("''", "'"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub schema: String,
    pub name: String,
    pub kind: RelationKind,
    pub columns: Vec<ColumnDescriptor>,
    /// Single-column primary key. Composite keys are not recorded.
    #[serde(default)]
    pub primary_key: Option<String>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key_column(&self) -> Option<&ColumnDescriptor> {
        self.primary_key.as_deref().and_then(|pk| self.column(pk))
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

/// A single-column foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    pub schema: String,
    pub table: String,
    pub column: String,
    pub referenced_schema: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbSchema {
    pub schemas: Vec<String>,
    pub tables: Vec<TableSchema>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyInfo>,
}

impl DbSchema {
    pub fn find_table(&self, schema: &str, table: &str) -> Option<&TableSchema> {
        self.tables
            .iter()
            .find(|t| t.schema == schema && t.name == table)
    }

    /// Resolve `table` or `schema.table` to a single table.
    pub fn resolve_table(&self, table_ref: &str) -> SchemaResult<&TableSchema> {
        let table_ref = table_ref.trim();
        if table_ref.is_empty() {
            return Err(SchemaError::Validation("empty table reference".to_string()));
        }

        if let Some((s, t)) = table_ref.split_once('.') {
            let (s, t) = (s.trim(), t.trim());
            if s.is_empty() || t.is_empty() {
                return Err(SchemaError::Validation(format!(
                    "invalid table reference: {table_ref}"
                )));
            }
            return self
                .find_table(s, t)
                .ok_or_else(|| SchemaError::table_not_found(table_ref));
        }

        let mut found: Option<&TableSchema> = None;
        for t in self.tables.iter().filter(|t| t.name == table_ref) {
            if found.is_some() {
                return Err(SchemaError::AmbiguousTable(table_ref.to_string()));
            }
            found = Some(t);
        }

        found.ok_or_else(|| SchemaError::table_not_found(table_ref))
    }

    /// The name the rest of the tool uses for a table: bare when a single
    /// schema is loaded, `schema.table` otherwise.
    pub fn table_ref(&self, schema: &str, table: &str) -> String {
        if self.schemas.len() > 1 {
            format!("{schema}.{table}")
        } else {
            table.to_string()
        }
    }
}

pub async fn schema_fingerprint<C: SchemaClient>(
    client: &C,
    schemas: &[String],
) -> SchemaResult<String> {
    let row = client
        .query_one(
            r#"
SELECT
  md5(
    COALESCE((
      SELECT string_agg(
        concat_ws(
          '|',
          n.nspname,
          c.relname,
          c.relkind::text,
          a.attnum::text,
          a.attname,
          pg_catalog.format_type(a.atttypid, a.atttypmod),
          a.attnotnull::text,
          COALESCE(pg_get_expr(ad.adbin, ad.adrelid), '')
        ),
        E'\n' ORDER BY n.nspname, c.relname, a.attnum
      )
      FROM pg_catalog.pg_class c
      JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
      JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid
      LEFT JOIN pg_catalog.pg_attrdef ad ON ad.adrelid = c.oid AND ad.adnum = a.attnum
      WHERE c.relkind IN ('r', 'p', 'v', 'm', 'f')
        AND a.attnum > 0
        AND NOT a.attisdropped
        AND n.nspname = ANY($1::text[])
    ), '')
    ||
    COALESCE((
      SELECT string_agg(
        concat_ws('|', n.nspname, c.relname, con.conname, pg_get_constraintdef(con.oid)),
        E'\n' ORDER BY n.nspname, c.relname, con.conname
      )
      FROM pg_catalog.pg_constraint con
      JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
      JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
      WHERE con.contype IN ('p', 'f')
        AND n.nspname = ANY($1::text[])
    ), '')
  ) AS fingerprint
"#,
            &[&schemas],
        )
        .await?;

    row.try_get_column::<String>("fingerprint")
}

pub async fn load_schema_from_db<C: SchemaClient>(
    client: &C,
    schemas: &[String],
) -> SchemaResult<(DbSchema, String)> {
    let fingerprint = schema_fingerprint(client, schemas).await?;

    let rows = client
        .query(
            r#"
SELECT
  n.nspname AS schema_name,
  c.relname AS table_name,
  c.relkind AS relkind,
  a.attname AS column_name,
  a.attnum::int4 AS ordinal,
  pg_catalog.format_type(a.atttypid, a.atttypmod) AS data_type,
  (ty.typtype = 'e') AS is_enum,
  a.attnotnull AS not_null,
  pg_get_expr(ad.adbin, ad.adrelid) AS default_expr
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid
JOIN pg_catalog.pg_type ty ON ty.oid = a.atttypid
LEFT JOIN pg_catalog.pg_attrdef ad ON ad.adrelid = c.oid AND ad.adnum = a.attnum
WHERE c.relkind IN ('r', 'p', 'v', 'm', 'f')
  AND a.attnum > 0
  AND NOT a.attisdropped
  AND n.nspname = ANY($1::text[])
ORDER BY n.nspname, c.relname, a.attnum
"#,
            &[&schemas],
        )
        .await?;

    let mut tables: BTreeMap<(String, String), TableSchema> = BTreeMap::new();

    for row in rows {
        let schema_name: String = row.try_get_column("schema_name")?;
        let table_name: String = row.try_get_column("table_name")?;
        let relkind: i8 = row.try_get_column("relkind")?;

        let column_name: String = row.try_get_column("column_name")?;
        let ordinal: i32 = row.try_get_column("ordinal")?;
        let data_type: String = row.try_get_column("data_type")?;
        let is_enum: bool = row.try_get_column("is_enum")?;
        let not_null: bool = row.try_get_column("not_null")?;
        let default_expr: Option<String> = row.try_get_column("default_expr")?;

        let key = (schema_name.clone(), table_name.clone());

        let table = tables.entry(key).or_insert_with(|| TableSchema {
            schema: schema_name,
            name: table_name,
            kind: RelationKind::from_relkind(relkind),
            columns: Vec::new(),
            primary_key: None,
        });

        table.columns.push(ColumnDescriptor {
            name: column_name,
            semantic: ColumnType::from_pg_type(&data_type, is_enum),
            data_type,
            not_null,
            default_expr,
            ordinal,
        });
    }

    if tables.is_empty() {
        return Err(SchemaError::Validation(
            "No tables found in the selected schemas".to_string(),
        ));
    }

    let pk_rows = client
        .query(
            r#"
SELECT
  n.nspname AS schema_name,
  c.relname AS table_name,
  a.attname AS column_name
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = con.conkey[1]
WHERE con.contype = 'p'
  AND cardinality(con.conkey) = 1
  AND n.nspname = ANY($1::text[])
"#,
            &[&schemas],
        )
        .await?;

    for row in pk_rows {
        let schema_name: String = row.try_get_column("schema_name")?;
        let table_name: String = row.try_get_column("table_name")?;
        let column_name: String = row.try_get_column("column_name")?;
        if let Some(table) = tables.get_mut(&(schema_name, table_name)) {
            table.primary_key = Some(column_name);
        }
    }

    let fk_rows = client
        .query(
            r#"
SELECT
  n.nspname AS schema_name,
  c.relname AS table_name,
  a.attname AS column_name,
  rn.nspname AS referenced_schema,
  rc.relname AS referenced_table,
  ra.attname AS referenced_column
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = con.conkey[1]
JOIN pg_catalog.pg_class rc ON rc.oid = con.confrelid
JOIN pg_catalog.pg_namespace rn ON rn.oid = rc.relnamespace
JOIN pg_catalog.pg_attribute ra ON ra.attrelid = con.confrelid AND ra.attnum = con.confkey[1]
WHERE con.contype = 'f'
  AND cardinality(con.conkey) = 1
  AND n.nspname = ANY($1::text[])
ORDER BY n.nspname, c.relname, a.attnum
"#,
            &[&schemas],
        )
        .await?;

    let mut foreign_keys = Vec::with_capacity(fk_rows.len());
    for row in fk_rows {
        foreign_keys.push(ForeignKeyInfo {
            schema: row.try_get_column("schema_name")?,
            table: row.try_get_column("table_name")?,
            column: row.try_get_column("column_name")?,
            referenced_schema: row.try_get_column("referenced_schema")?,
            referenced_table: row.try_get_column("referenced_table")?,
            referenced_column: row.try_get_column("referenced_column")?,
        });
    }

    tracing::debug!(
        tables = tables.len(),
        foreign_keys = foreign_keys.len(),
        "loaded schema from database"
    );

    Ok((
        DbSchema {
            schemas: schemas.to_vec(),
            tables: tables.into_values().collect(),
            foreign_keys,
        },
        fingerprint,
    ))
}
