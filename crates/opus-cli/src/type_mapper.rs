use opus_schema::{ColumnDescriptor, ColumnType};
use std::collections::BTreeMap;

/// PostgreSQL column type -> Rust field type for generated models.
#[derive(Debug, Clone, Default)]
pub struct TypeMapper {
    /// User overrides from `[models.types]` (normalized PG type -> Rust path/type).
    custom: BTreeMap<String, String>,
}

impl TypeMapper {
    pub fn new(custom: BTreeMap<String, String>) -> Self {
        let custom = custom
            .into_iter()
            .map(|(k, v)| (normalize_pg_type(&k), v))
            .collect();
        Self { custom }
    }

    /// Field type for a column, wrapped in `Option` when the column is nullable.
    pub fn map_column(&self, column: &ColumnDescriptor) -> String {
        let normalized = normalize_pg_type(&column.data_type);
        let ty = match self.custom.get(&normalized) {
            Some(t) => t.clone(),
            // Enums decode as text unless the project maps them.
            None if column.semantic == ColumnType::Enum => "String".to_string(),
            None => self.map(&column.data_type),
        };

        if !column.not_null && !ty.starts_with("Option<") {
            format!("Option<{ty}>")
        } else {
            ty
        }
    }

    pub fn map(&self, pg_type: &str) -> String {
        let normalized = normalize_pg_type(pg_type);

        if let Some(t) = self.custom.get(&normalized) {
            return t.clone();
        }

        // Arrays from `format_type` look like `integer[]`, `uuid[]`, etc.
        if let Some(base) = normalized.strip_suffix("[]") {
            return format!("Vec<{}>", self.map(base));
        }

        match normalized.as_str() {
            "bool" | "boolean" => "bool",
            "int2" | "smallint" | "smallserial" => "i16",
            "int4" | "integer" | "serial" => "i32",
            "int8" | "bigint" | "bigserial" => "i64",
            "float4" | "real" => "f32",
            "float8" | "double precision" => "f64",
            "text" | "varchar" | "char" | "character" | "name" | "citext" => "String",
            "uuid" => "uuid::Uuid",
            "json" | "jsonb" => "serde_json::Value",
            "timestamptz" => "chrono::DateTime<chrono::Utc>",
            "timestamp" | "timestamp without time zone" => "chrono::NaiveDateTime",
            "date" => "chrono::NaiveDate",
            "time" | "time without time zone" => "chrono::NaiveTime",
            "bytea" => "Vec<u8>",
            // numeric, money, inet, ... decode as text unless mapped in [models.types].
            _ => "String",
        }
        .to_string()
    }
}

pub fn normalize_pg_type(pg_type: &str) -> String {
    let mut s = pg_type.trim().to_lowercase();

    // Remove typmods: `varchar(255)`, `timestamp(3) with time zone`, `numeric(10,2)`, ...
    while let Some(start) = s.find('(') {
        let Some(end) = s[start..].find(')') else {
            break;
        };
        s.replace_range(start..start + end + 1, "");
    }

    let s = s.split_whitespace().collect::<Vec<_>>().join(" ");

    match s.as_str() {
        "character varying" => "varchar".to_string(),
        "timestamp with time zone" => "timestamptz".to_string(),
        _ => s,
    }
}
