//! Relationship queries over a schema snapshot.

use crate::error::SchemaResult;
use crate::schema_introspect::{DbSchema, TableSchema};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    One,
    Many,
}

/// A foreign key declared on the described table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundKey {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
    pub cardinality: Cardinality,
}

/// A foreign key on another table that points at the described table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundKey {
    pub referencing_table: String,
    pub referencing_column: String,
    pub referenced_column: String,
    pub cardinality: Cardinality,
}

impl InboundKey {
    /// `table.column` of the referencing side.
    pub fn alias(&self) -> String {
        format!("{}.{}", self.referencing_table, self.referencing_column)
    }
}

/// Read-only access to table structure and foreign keys.
///
/// Table names are the ones returned by the introspector itself: bare names
/// for a single schema, `schema.table` otherwise.
pub trait SchemaIntrospector {
    fn describe(&self, table: &str) -> SchemaResult<TableSchema>;

    /// The name this introspector uses for `table` in foreign-key results.
    fn canonical_name(&self, table: &str) -> SchemaResult<String> {
        self.describe(table).map(|_| table.trim().to_string())
    }

    /// Every foreign key on `table`. Always to-one.
    fn outbound_foreign_keys(&self, table: &str) -> SchemaResult<Vec<OutboundKey>>;

    /// Every foreign key on other tables referencing `table`. Reported as to-many.
    fn inbound_foreign_keys(&self, table: &str) -> SchemaResult<Vec<InboundKey>>;
}

impl SchemaIntrospector for DbSchema {
    fn describe(&self, table: &str) -> SchemaResult<TableSchema> {
        self.resolve_table(table).cloned()
    }

    fn canonical_name(&self, table: &str) -> SchemaResult<String> {
        let t = self.resolve_table(table)?;
        Ok(self.table_ref(&t.schema, &t.name))
    }

    fn outbound_foreign_keys(&self, table: &str) -> SchemaResult<Vec<OutboundKey>> {
        let t = self.resolve_table(table)?;
        Ok(self
            .foreign_keys
            .iter()
            .filter(|fk| fk.schema == t.schema && fk.table == t.name)
            .map(|fk| OutboundKey {
                column: fk.column.clone(),
                referenced_table: self.table_ref(&fk.referenced_schema, &fk.referenced_table),
                referenced_column: fk.referenced_column.clone(),
                cardinality: Cardinality::One,
            })
            .collect())
    }

    fn inbound_foreign_keys(&self, table: &str) -> SchemaResult<Vec<InboundKey>> {
        let t = self.resolve_table(table)?;
        Ok(self
            .foreign_keys
            .iter()
            .filter(|fk| fk.referenced_schema == t.schema && fk.referenced_table == t.name)
            .map(|fk| InboundKey {
                referencing_table: self.table_ref(&fk.schema, &fk.table),
                referencing_column: fk.column.clone(),
                referenced_column: fk.referenced_column.clone(),
                cardinality: Cardinality::Many,
            })
            .collect())
    }
}
