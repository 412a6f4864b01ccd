//! opus-schema
//!
//! Reads table structure and foreign keys from PostgreSQL and answers the
//! relationship questions the code generator asks.
//!
//! Schema metadata is cached into a local directory (default: `./.opus/`) so
//! later runs can skip a full refresh when nothing has changed.
//!
//! # Example
//!
//! ```ignore
//! use opus_schema::{SchemaCache, SchemaCacheConfig, SchemaIntrospector};
//!
//! let (cache, _) = SchemaCache::load_or_refresh(&client, &SchemaCacheConfig::default()).await?;
//! for key in cache.schema.inbound_foreign_keys("customers")? {
//!     println!("{} -> customers", key.alias());
//! }
//! ```

pub mod client;
pub mod error;
pub mod introspector;
pub mod schema_cache;
pub mod schema_introspect;

pub use client::{RowExt, SchemaClient};
pub use error::{SchemaError, SchemaResult};
pub use introspector::{Cardinality, InboundKey, OutboundKey, SchemaIntrospector};
pub use schema_cache::{SchemaCache, SchemaCacheConfig, SchemaCacheLoad};
pub use schema_introspect::{
    ColumnDescriptor, ColumnType, DbSchema, ForeignKeyInfo, RelationKind, TableSchema,
};
