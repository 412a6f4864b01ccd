//! Foreign keys -> named relationship accessors.

use crate::bindings::ClassBindingIndex;
use crate::error::{GenerateError, GenerateResult};
use crate::model_builder::{ModelClass, ModelSettings};
use crate::naming;
use crate::prompt::Prompt;
use crate::registry::GenerationRegistry;
use crate::template::{Tokens, replace_blocks, replace_tokens};
use opus_schema::{
    Cardinality, InboundKey, OutboundKey, SchemaIntrospector, SchemaResult, TableSchema,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Everything the generator needs to know about one table.
#[derive(Debug, Clone)]
pub struct TableFacts {
    pub schema: TableSchema,
    pub outbound: Vec<OutboundKey>,
    pub inbound: Vec<InboundKey>,
}

/// Per-run memo over an introspector: each table is queried at most once.
pub struct SchemaLookup<'a> {
    introspector: &'a dyn SchemaIntrospector,
    tables: HashMap<String, Rc<TableFacts>>,
}

impl<'a> SchemaLookup<'a> {
    pub fn new(introspector: &'a dyn SchemaIntrospector) -> Self {
        Self {
            introspector,
            tables: HashMap::new(),
        }
    }

    pub fn table(&mut self, table: &str) -> SchemaResult<Rc<TableFacts>> {
        if let Some(facts) = self.tables.get(table) {
            return Ok(Rc::clone(facts));
        }

        let facts = Rc::new(TableFacts {
            schema: self.introspector.describe(table)?,
            outbound: self.introspector.outbound_foreign_keys(table)?,
            inbound: self.introspector.inbound_foreign_keys(table)?,
        });
        self.tables.insert(table.to_string(), Rc::clone(&facts));
        Ok(facts)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipDescriptor {
    /// Accessor method name.
    pub alias: String,
    /// Fully-qualified struct path of the related model.
    pub class_name: String,
    pub short_name: String,
    pub cardinality: Cardinality,
    /// Column on `self` whose value drives the lookup.
    pub local_column: String,
    pub local_field: String,
    pub target_table: String,
    pub target_column: String,
    /// `table.column` that owns the foreign key.
    pub foreign_key: String,
    pub phrase: String,
    pub get_phrase: String,
}

impl RelationshipDescriptor {
    fn tokens(&self) -> Tokens<'static> {
        let mut t = Tokens::new();
        t.insert("method_name", self.alias.clone());
        t.insert("short_name", self.short_name.clone());
        t.insert("class_name", self.class_name.clone());
        t.insert("get_phrase", self.get_phrase.clone());
        t.insert("name", self.phrase.clone());
        t.insert("foreign_key", self.foreign_key.clone());
        t.insert("target_table", self.target_table.clone());
        t.insert("target_column", self.target_column.clone());
        t.insert("local_column", self.local_column.clone());
        t.insert("local_field", self.local_field.clone());
        t
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedRelations {
    pub one: Vec<RelationshipDescriptor>,
    pub many: Vec<RelationshipDescriptor>,
    pub imports: BTreeSet<String>,
}

impl ResolvedRelations {
    pub fn use_declarations(&self) -> String {
        self.imports.iter().map(|i| format!("use {i};\n")).collect()
    }
}

pub struct ResolveRequest<'r> {
    pub table: &'r str,
    /// Class of the model being generated. Never imported into itself.
    pub class_name: &'r str,
    /// Directory for dependency models that have to be generated.
    pub entity_dir: &'r Path,
    /// Method names already taken on the model.
    pub reserved_names: &'r [String],
    pub auto_confirm: bool,
}

pub struct RelationshipResolver<'a> {
    settings: &'a ModelSettings,
    prompt: &'a mut dyn Prompt,
}

impl<'a> RelationshipResolver<'a> {
    pub fn new(settings: &'a ModelSettings, prompt: &'a mut dyn Prompt) -> Self {
        Self { settings, prompt }
    }

    /// Turn the foreign keys of `request.table` into accessors.
    ///
    /// A dependency that cannot be described, lacks a primary key for a to-one
    /// lookup, or has no class after the generation policy is dropped. Only
    /// prompt failures abort.
    pub fn resolve(
        &mut self,
        request: &ResolveRequest<'_>,
        lookup: &mut SchemaLookup<'_>,
        bindings: &mut ClassBindingIndex,
        registry: &mut GenerationRegistry,
    ) -> GenerateResult<ResolvedRelations> {
        let facts = lookup.table(request.table)?;
        let mut taken: HashSet<String> = request.reserved_names.iter().cloned().collect();
        let mut resolved = ResolvedRelations::default();

        for key in &facts.outbound {
            let target = match lookup.table(&key.referenced_table) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(table = request.table, column = %key.column, error = %e, "dropping relationship");
                    continue;
                }
            };
            if target.schema.primary_key.is_none() {
                let e = GenerateError::MissingPrimaryKey(key.referenced_table.clone());
                tracing::warn!(table = request.table, column = %key.column, error = %e, "dropping relationship");
                continue;
            }

            let Some(class_name) = self.class_for_table(
                &key.referenced_table,
                request.entity_dir,
                request.auto_confirm,
                bindings,
                registry,
            )?
            else {
                continue;
            };

            let base = naming::snake_case(&naming::singularize(&naming::strip_id_suffix(&key.column)));
            let alias = unique_alias(&base, &key.column, &mut taken);
            let phrase = naming::phrase(&alias);
            resolved.one.push(RelationshipDescriptor {
                get_phrase: format!(
                    "Fetch the {} referenced by `{}`.",
                    phrase.to_lowercase(),
                    key.column
                ),
                phrase,
                alias,
                short_name: short_name(&class_name),
                class_name: class_name.clone(),
                cardinality: Cardinality::One,
                local_column: key.column.clone(),
                local_field: naming::sanitize_field_ident(&key.column),
                target_table: key.referenced_table.clone(),
                target_column: key.referenced_column.clone(),
                foreign_key: format!("{}.{}", request.table, key.column),
            });
            if class_name != request.class_name {
                resolved.imports.insert(class_name);
            }
        }

        for key in &facts.inbound {
            if let Err(e) = lookup.table(&key.referencing_table) {
                tracing::warn!(table = request.table, referencing = %key.alias(), error = %e, "dropping relationship");
                continue;
            }

            let Some(class_name) = self.class_for_table(
                &key.referencing_table,
                request.entity_dir,
                request.auto_confirm,
                bindings,
                registry,
            )?
            else {
                continue;
            };

            let cardinality = if self.settings.one_to_one.contains(&key.alias()) {
                Cardinality::One
            } else {
                Cardinality::Many
            };
            let child = naming::snake_case(&naming::strip_table_prefix(
                &key.referencing_table,
                &self.settings.table_prefixes,
            ));
            let base = match cardinality {
                Cardinality::One => naming::singularize(&child),
                Cardinality::Many => naming::pluralize(&child),
            };
            let alias = unique_alias(&base, &key.referencing_column, &mut taken);
            let phrase = naming::phrase(&alias);
            let verb = match cardinality {
                Cardinality::One => "Fetch",
                Cardinality::Many => "Stream",
            };

            let descriptor = RelationshipDescriptor {
                get_phrase: format!(
                    "{verb} the {} whose `{}` points at this row.",
                    phrase.to_lowercase(),
                    key.alias()
                ),
                phrase,
                alias,
                short_name: short_name(&class_name),
                class_name: class_name.clone(),
                cardinality,
                local_column: key.referenced_column.clone(),
                local_field: naming::sanitize_field_ident(&key.referenced_column),
                target_table: key.referencing_table.clone(),
                target_column: key.referencing_column.clone(),
                foreign_key: key.alias(),
            };
            match cardinality {
                Cardinality::One => resolved.one.push(descriptor),
                Cardinality::Many => resolved.many.push(descriptor),
            }
            if class_name != request.class_name {
                resolved.imports.insert(class_name);
            }
        }

        if !resolved.many.is_empty() {
            resolved
                .imports
                .extend(self.settings.iterator_imports.iter().cloned());
        }

        Ok(resolved)
    }

    /// Class bound to `table`, generating one on demand.
    ///
    /// Repeat calls within a run never prompt twice and always agree. A new
    /// class never reuses one already bound to another table.
    pub fn class_for_table(
        &mut self,
        table: &str,
        entity_dir: &Path,
        auto_confirm: bool,
        bindings: &mut ClassBindingIndex,
        registry: &mut GenerationRegistry,
    ) -> GenerateResult<Option<String>> {
        if registry.is_known(table) {
            tracing::trace!(table, skipped = registry.is_skipped(table), "table already resolved");
            return Ok(registry.created_class(table).map(str::to_string));
        }
        if let Some(class) = bindings.get(table) {
            let class = class.to_string();
            registry.mark_created(table, &class);
            return Ok(Some(class));
        }
        if self.settings.is_reserved(table) {
            tracing::debug!(table, "reserved table, no model");
            return Ok(None);
        }

        let mut dest = self.free_destination(table, entity_dir, bindings, registry);

        if !auto_confirm {
            let question = format!("No model is bound to table '{table}'. Generate one?");
            let accepted = self
                .prompt
                .confirm(&question, true)
                .map_err(GenerateError::Prompt)?;
            tracing::debug!(table, accepted, "generation decision");
            if !accepted {
                registry.mark_skipped(table);
                return Ok(None);
            }

            let label = format!("File for the {table} model");
            loop {
                let input = self
                    .prompt
                    .prompt_text(&label, &dest.to_string_lossy())
                    .map_err(GenerateError::Prompt)?;
                let chosen = naming::parse_filename(&input, &self.settings.src_prefix());
                match self.owner_of(&chosen, table, bindings, registry) {
                    Some(owner) => self.prompt.notice(&format!(
                        "{} already holds the model for table {owner}",
                        chosen.display()
                    )),
                    None => {
                        dest = chosen;
                        break;
                    }
                }
            }
        }

        let class = ModelClass::for_path(&dest, &self.settings.src_dir).path();

        registry.mark_created(table, &class);
        bindings.bind(table, class.clone());
        self.prompt
            .notice(&format!("Queued model {class} for table {table} ({})", dest.display()));
        registry.enqueue(table, dest);

        Ok(Some(class))
    }

    /// First destination under `entity_dir` whose class is not held by another
    /// table: the plain stem, then the stem of the full table name, then
    /// numbered variants of the plain stem.
    fn free_destination(
        &self,
        table: &str,
        entity_dir: &Path,
        bindings: &ClassBindingIndex,
        registry: &GenerationRegistry,
    ) -> PathBuf {
        let stem = naming::table_to_file_stem(table, &self.settings.table_prefixes);
        let qualified = naming::table_to_file_stem(&table.replace('.', "_"), &[]);

        let fixed = [stem.clone(), qualified].into_iter();
        let numbered = (2..).map(|n| format!("{stem}_{n}"));
        fixed
            .chain(numbered)
            .map(|candidate| {
                let path = entity_dir.join(format!("{candidate}.rs"));
                naming::parse_filename(&path.to_string_lossy(), &self.settings.src_prefix())
            })
            .find(|dest| self.owner_of(dest, table, bindings, registry).is_none())
            .unwrap_or_else(|| entity_dir.join(format!("{stem}.rs")))
    }

    /// The other table whose class `dest` would produce.
    fn owner_of(
        &self,
        dest: &Path,
        table: &str,
        bindings: &ClassBindingIndex,
        registry: &GenerationRegistry,
    ) -> Option<String> {
        let class = ModelClass::for_path(dest, &self.settings.src_dir).path();
        registry
            .class_owner(&class)
            .or_else(|| bindings.table_for(&class))
            .filter(|owner| *owner != table)
            .map(str::to_string)
    }
}

/// Replace `<relations_one>` / `<relations_many>` with one rendering per descriptor.
pub fn render_relations(code: &str, resolved: &ResolvedRelations) -> String {
    let render = |descriptors: &[RelationshipDescriptor], inner: &str| -> String {
        descriptors
            .iter()
            .map(|d| replace_tokens(inner, &d.tokens()))
            .collect()
    };

    let code = replace_blocks(code, "relations_one", |inner| render(&resolved.one, inner));
    replace_blocks(&code, "relations_many", |inner| render(&resolved.many, inner))
}

fn short_name(class_name: &str) -> String {
    class_name
        .rsplit("::")
        .next()
        .unwrap_or(class_name)
        .to_string()
}

/// `base`, else `<base>_by_<column>`, else a numbered variant.
fn unique_alias(base: &str, column: &str, taken: &mut HashSet<String>) -> String {
    let first = naming::sanitize_field_ident(base);
    if taken.insert(first.clone()) {
        return first;
    }

    let by = naming::sanitize_field_ident(&format!(
        "{base}_by_{}",
        naming::strip_id_suffix(column)
    ));
    if taken.insert(by.clone()) {
        return by;
    }

    let mut n = 2;
    loop {
        let candidate = format!("{by}_{n}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedPrompt, fk, schema, shop_schema, table};
    use opus_schema::DbSchema;
    use std::cell::Cell;
    use std::path::PathBuf;

    struct Counting<'a> {
        inner: &'a DbSchema,
        describes: Cell<usize>,
    }

    impl SchemaIntrospector for Counting<'_> {
        fn describe(&self, table: &str) -> SchemaResult<TableSchema> {
            self.describes.set(self.describes.get() + 1);
            self.inner.describe(table)
        }
        fn outbound_foreign_keys(&self, table: &str) -> SchemaResult<Vec<OutboundKey>> {
            self.inner.outbound_foreign_keys(table)
        }
        fn inbound_foreign_keys(&self, table: &str) -> SchemaResult<Vec<InboundKey>> {
            self.inner.inbound_foreign_keys(table)
        }
    }

    struct Fixture {
        bindings: ClassBindingIndex,
        registry: GenerationRegistry,
        settings: ModelSettings,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                bindings: ClassBindingIndex::new(),
                registry: GenerationRegistry::new(),
                settings: ModelSettings::default(),
            }
        }

        fn seed(&mut self, table: &str, class: &str) {
            self.registry.mark_created(table, class);
            self.bindings.bind(table, class);
        }

        fn resolve(
            &mut self,
            db: &DbSchema,
            table: &str,
            class: &str,
            prompt: &mut dyn Prompt,
            auto_confirm: bool,
        ) -> GenerateResult<ResolvedRelations> {
            let mut lookup = SchemaLookup::new(db);
            let entity_dir = PathBuf::from("src/models");
            let request = ResolveRequest {
                table,
                class_name: class,
                entity_dir: &entity_dir,
                reserved_names: &[],
                auto_confirm,
            };
            RelationshipResolver::new(&self.settings, prompt).resolve(
                &request,
                &mut lookup,
                &mut self.bindings,
                &mut self.registry,
            )
        }
    }

    #[test]
    fn outbound_key_becomes_to_one_with_generated_class() {
        let db = shop_schema();
        let mut fx = Fixture::new();
        fx.seed("orders", "crate::models::order::Order");
        let mut prompt = ScriptedPrompt::new();

        let resolved = fx
            .resolve(&db, "orders", "crate::models::order::Order", &mut prompt, true)
            .unwrap();

        assert_eq!(resolved.one.len(), 1);
        let rel = &resolved.one[0];
        assert_eq!(rel.alias, "customer");
        assert_eq!(rel.class_name, "crate::models::customer::Customer");
        assert_eq!(rel.short_name, "Customer");
        assert_eq!(rel.local_field, "customer_id");
        assert_eq!(rel.target_table, "customers");
        assert!(resolved.many.is_empty());
        assert_eq!(
            resolved.imports.iter().collect::<Vec<_>>(),
            vec!["crate::models::customer::Customer"]
        );
        assert!(prompt.questions.is_empty());
        assert_eq!(fx.registry.queued_len(), 1);
    }

    #[test]
    fn inbound_key_becomes_to_many_with_iterator_imports() {
        let db = shop_schema();
        let mut fx = Fixture::new();
        fx.seed("customers", "crate::models::customer::Customer");
        fx.bindings.bind("orders", "crate::models::order::Order");
        let mut prompt = ScriptedPrompt::new();

        let resolved = fx
            .resolve(&db, "customers", "crate::models::customer::Customer", &mut prompt, false)
            .unwrap();

        assert!(resolved.one.is_empty());
        assert_eq!(resolved.many.len(), 1);
        let rel = &resolved.many[0];
        assert_eq!(rel.alias, "orders");
        assert_eq!(rel.foreign_key, "orders.customer_id");
        assert_eq!(rel.target_column, "customer_id");
        assert_eq!(rel.local_field, "id");
        assert!(resolved.imports.contains("crate::models::order::Order"));
        for import in &fx.settings.iterator_imports {
            assert!(resolved.imports.contains(import));
        }
        // bound through the index, so nothing was asked or queued
        assert!(prompt.questions.is_empty());
        assert_eq!(fx.registry.queued_len(), 0);
    }

    #[test]
    fn configured_one_to_one_inbound_is_singular() {
        let db = schema(
            vec![
                table("users", &[("id", "bigint", true)], Some("id")),
                table(
                    "profiles",
                    &[("id", "bigint", true), ("user_id", "bigint", true)],
                    Some("id"),
                ),
            ],
            vec![fk("profiles", "user_id", "users", "id")],
        );
        let mut fx = Fixture::new();
        fx.settings.one_to_one.insert("profiles.user_id".to_string());
        fx.seed("users", "crate::models::user::User");
        let mut prompt = ScriptedPrompt::new();

        let resolved = fx
            .resolve(&db, "users", "crate::models::user::User", &mut prompt, true)
            .unwrap();

        assert!(resolved.many.is_empty());
        assert_eq!(resolved.one.len(), 1);
        assert_eq!(resolved.one[0].alias, "profile");
        assert_eq!(resolved.one[0].cardinality, Cardinality::One);
        for import in &fx.settings.iterator_imports {
            assert!(!resolved.imports.contains(import));
        }
    }

    #[test]
    fn self_reference_uses_own_class_without_prompting() {
        let db = schema(
            vec![table(
                "categories",
                &[("id", "bigint", true), ("parent_id", "bigint", false)],
                Some("id"),
            )],
            vec![fk("categories", "parent_id", "categories", "id")],
        );
        let mut fx = Fixture::new();
        let class = "crate::models::category::Category";
        fx.seed("categories", class);
        let mut prompt = ScriptedPrompt::new();

        let resolved = fx
            .resolve(&db, "categories", class, &mut prompt, false)
            .unwrap();

        assert_eq!(resolved.one[0].alias, "parent");
        assert_eq!(resolved.many[0].alias, "categories");
        assert!(!resolved.imports.contains(class));
        assert!(prompt.questions.is_empty());
        assert_eq!(fx.registry.queued_len(), 0);
    }

    #[test]
    fn declined_table_is_dropped_and_not_asked_again() {
        let db = schema(
            vec![
                table("users", &[("id", "bigint", true)], Some("id")),
                table(
                    "messages",
                    &[
                        ("id", "bigint", true),
                        ("sender_id", "bigint", true),
                        ("recipient_id", "bigint", true),
                    ],
                    Some("id"),
                ),
            ],
            vec![
                fk("messages", "sender_id", "users", "id"),
                fk("messages", "recipient_id", "users", "id"),
            ],
        );
        let mut fx = Fixture::new();
        fx.seed("messages", "crate::models::message::Message");
        let mut prompt = ScriptedPrompt::new().confirm_with(&[false]);

        let resolved = fx
            .resolve(&db, "messages", "crate::models::message::Message", &mut prompt, false)
            .unwrap();

        assert!(resolved.one.is_empty());
        assert!(resolved.imports.is_empty());
        assert_eq!(prompt.asked_about("users"), 1);
        assert!(fx.registry.is_skipped("users"));
        assert_eq!(fx.registry.queued_len(), 0);
    }

    #[test]
    fn two_keys_to_one_table_get_distinct_aliases() {
        let db = schema(
            vec![
                table("users", &[("id", "bigint", true)], Some("id")),
                table(
                    "messages",
                    &[
                        ("id", "bigint", true),
                        ("sender_id", "bigint", true),
                        ("recipient_id", "bigint", true),
                    ],
                    Some("id"),
                ),
            ],
            vec![
                fk("messages", "sender_id", "users", "id"),
                fk("messages", "recipient_id", "users", "id"),
            ],
        );
        let mut fx = Fixture::new();
        fx.seed("users", "crate::models::user::User");
        fx.bindings.bind("messages", "crate::models::message::Message");
        let mut prompt = ScriptedPrompt::new();

        let resolved = fx
            .resolve(&db, "users", "crate::models::user::User", &mut prompt, false)
            .unwrap();

        let aliases: Vec<_> = resolved.many.iter().map(|r| r.alias.as_str()).collect();
        assert_eq!(aliases, vec!["messages", "messages_by_recipient"]);
    }

    #[test]
    fn target_without_primary_key_is_dropped() {
        let db = schema(
            vec![
                table("audit_log", &[("entry", "text", true)], None),
                table(
                    "events",
                    &[("id", "bigint", true), ("audit_log_id", "bigint", true)],
                    Some("id"),
                ),
            ],
            vec![fk("events", "audit_log_id", "audit_log", "entry")],
        );
        let mut fx = Fixture::new();
        fx.seed("events", "crate::models::event::Event");
        let mut prompt = ScriptedPrompt::new();

        let resolved = fx
            .resolve(&db, "events", "crate::models::event::Event", &mut prompt, true)
            .unwrap();

        assert!(resolved.one.is_empty());
        assert!(prompt.questions.is_empty());
        assert_eq!(fx.registry.queued_len(), 0);
    }

    #[test]
    fn undescribable_dependency_is_dropped() {
        let mut db = shop_schema();
        db.tables.retain(|t| t.name != "customers");
        let mut fx = Fixture::new();
        fx.seed("orders", "crate::models::order::Order");
        let mut prompt = ScriptedPrompt::new();

        let resolved = fx
            .resolve(&db, "orders", "crate::models::order::Order", &mut prompt, true)
            .unwrap();

        assert!(resolved.one.is_empty());
        assert_eq!(fx.registry.queued_len(), 0);
    }

    #[test]
    fn class_policy_is_idempotent() {
        let mut fx = Fixture::new();
        let mut prompt = ScriptedPrompt::new().confirm_with(&[true]);
        let dir = PathBuf::from("src/models");

        let mut resolver = RelationshipResolver::new(&fx.settings, &mut prompt);
        let first = resolver
            .class_for_table("customers", &dir, false, &mut fx.bindings, &mut fx.registry)
            .unwrap();
        let second = resolver
            .class_for_table("customers", &dir, false, &mut fx.bindings, &mut fx.registry)
            .unwrap();

        assert_eq!(first, Some("crate::models::customer::Customer".to_string()));
        assert_eq!(first, second);
        assert_eq!(prompt.asked_about("customers"), 1);
        assert_eq!(fx.registry.queued_len(), 1);
    }

    #[test]
    fn operator_can_choose_the_destination() {
        let mut fx = Fixture::new();
        let mut prompt = ScriptedPrompt::new()
            .confirm_with(&[true])
            .text_with(&["entities/client"]);
        let dir = PathBuf::from("src/models");

        let class = RelationshipResolver::new(&fx.settings, &mut prompt)
            .class_for_table("customers", &dir, false, &mut fx.bindings, &mut fx.registry)
            .unwrap();

        assert_eq!(class.as_deref(), Some("crate::entities::client::Client"));
        let queued: Vec<_> = fx.registry.drain_queue().collect();
        assert_eq!(queued[0].dest, PathBuf::from("src/entities/client.rs"));
        assert_eq!(prompt.labels.len(), 1);
    }

    #[test]
    fn reserved_tables_are_never_generated() {
        let mut fx = Fixture::new();
        let mut prompt = ScriptedPrompt::new();
        let dir = PathBuf::from("src/models");

        let class = RelationshipResolver::new(&fx.settings, &mut prompt)
            .class_for_table(
                "refinery_schema_history",
                &dir,
                false,
                &mut fx.bindings,
                &mut fx.registry,
            )
            .unwrap();

        assert_eq!(class, None);
        assert!(prompt.questions.is_empty());
    }

    #[test]
    fn lookup_describes_each_table_once() {
        let db = shop_schema();
        let counting = Counting {
            inner: &db,
            describes: Cell::new(0),
        };
        let mut lookup = SchemaLookup::new(&counting);

        lookup.table("orders").unwrap();
        lookup.table("orders").unwrap();
        lookup.table("customers").unwrap();
        assert_eq!(counting.describes.get(), 2);
    }

    #[test]
    fn relation_blocks_render_per_descriptor() {
        let resolved = ResolvedRelations {
            one: vec![RelationshipDescriptor {
                alias: "customer".to_string(),
                class_name: "crate::models::customer::Customer".to_string(),
                short_name: "Customer".to_string(),
                cardinality: Cardinality::One,
                local_column: "customer_id".to_string(),
                local_field: "customer_id".to_string(),
                target_table: "customers".to_string(),
                target_column: "id".to_string(),
                foreign_key: "orders.customer_id".to_string(),
                phrase: "Customer".to_string(),
                get_phrase: "Fetch the customer.".to_string(),
            }],
            ..Default::default()
        };
        let code = "<relations_one>\nfn ~method_name~() -> ~short_name~ {} // ~target_table~.~target_column~\n</relations_one>\n<relations_many>\nfn ~method_name~() {}\n</relations_many>\n";

        assert_eq!(
            render_relations(code, &resolved),
            "fn customer() -> Customer {} // customers.id\n"
        );
    }
}
