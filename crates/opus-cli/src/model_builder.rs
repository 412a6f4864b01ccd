//! Table -> model source file, plus every dependency model queued along the way.

use crate::bindings::ClassBindingIndex;
use crate::error::{GenerateError, GenerateResult};
use crate::naming;
use crate::prompt::Prompt;
use crate::registry::GenerationRegistry;
use crate::relations::{RelationshipResolver, ResolveRequest, SchemaLookup, render_relations};
use crate::template::{
    TemplateKind, TemplateSet, Tokens, drop_block, keep_block, replace_blocks, replace_tokens,
};
use crate::type_mapper::TypeMapper;
use crate::write::write_new;
use opus_schema::{ColumnDescriptor, ColumnType, SchemaIntrospector};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// The `[models]` section of `opus.toml`.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    /// Source root, relative to the project root.
    pub src_dir: PathBuf,
    /// Tables that never get a model (migration bookkeeping and the like).
    pub reserved_tables: Vec<String>,
    /// Prefixes stripped from table names before deriving file and accessor names.
    pub table_prefixes: Vec<String>,
    /// `child_table.child_column` keys whose inbound side is to-one.
    pub one_to_one: BTreeSet<String>,
    /// Imports added to a model that has any to-many relation.
    pub iterator_imports: Vec<String>,
    /// PG type -> Rust type overrides.
    pub types: BTreeMap<String, String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            src_dir: PathBuf::from("src"),
            reserved_tables: vec!["refinery_schema_history".to_string()],
            table_prefixes: Vec::new(),
            one_to_one: BTreeSet::new(),
            iterator_imports: vec![
                "pgorm::client::StreamingClient".to_string(),
                "pgorm::sql::FromRowStream".to_string(),
            ],
            types: BTreeMap::new(),
        }
    }
}

impl ModelSettings {
    pub fn is_reserved(&self, table: &str) -> bool {
        let bare = table.rsplit('.').next().unwrap_or(table);
        self.reserved_tables
            .iter()
            .any(|r| r == table || r == bare)
    }

    pub(crate) fn src_prefix(&self) -> String {
        self.src_dir.to_string_lossy().replace('\\', "/")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    /// Private fields with getters and change-buffer setters (`--nomagic`).
    pub with_property_accessors: bool,
    /// Accept every generation decision with derived defaults (`--yes`).
    pub auto_confirm: bool,
}

/// Module path and struct name of a generated model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelClass {
    pub module: String,
    pub struct_name: String,
}

impl ModelClass {
    /// Class for a file under `src_dir`, which maps to `crate::`.
    pub fn for_path(dest: &Path, src_dir: &Path) -> Self {
        let rooted = match dest.strip_prefix(src_dir) {
            Ok(rel) => Path::new("src").join(rel),
            Err(_) => dest.to_path_buf(),
        };
        let (module, struct_name) = naming::path_to_module(&rooted);
        Self {
            module,
            struct_name,
        }
    }

    pub fn path(&self) -> String {
        format!("{}::{}", self.module, self.struct_name)
    }
}

#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub column: String,
    pub field: String,
    pub rust_type: String,
    pub semantic: ColumnType,
    pub phrase: String,
    pub get_phrase: String,
    pub set_phrase: String,
    pub get_method_name: String,
    pub set_method_name: String,
    pub default: String,
    pub orm_attr: String,
    pub is_primary_key: bool,
}

impl PropertyDescriptor {
    pub fn from_column(
        column: &ColumnDescriptor,
        primary_key: Option<&str>,
        types: &TypeMapper,
    ) -> Self {
        let field = naming::sanitize_field_ident(&column.name);
        let phrase = naming::phrase(&column.name);
        let lower = phrase.to_lowercase();
        let is_primary_key = primary_key == Some(column.name.as_str());

        let mut attrs = Vec::new();
        if is_primary_key {
            attrs.push("id".to_string());
        }
        if field != column.name {
            attrs.push(format!("column = \"{}\"", column.name));
        }
        let orm_attr = if attrs.is_empty() {
            String::new()
        } else {
            format!("#[orm({})]\n    ", attrs.join(", "))
        };

        Self {
            get_method_name: naming::getter_name(&field, column.semantic == ColumnType::Bool),
            set_method_name: naming::setter_name(&field),
            get_phrase: format!("Get the {lower}."),
            set_phrase: format!("Set the {lower}."),
            default: column
                .default_literal()
                .map(|lit| format!(" (default: `{lit}`)"))
                .unwrap_or_default(),
            rust_type: types.map_column(column),
            column: column.name.clone(),
            semantic: column.semantic,
            orm_attr,
            is_primary_key,
            phrase,
            field,
        }
    }

    fn tokens(&self) -> Tokens<'static> {
        let mut t = Tokens::new();
        t.insert("column", self.column.clone());
        t.insert("field", self.field.clone());
        t.insert("type", self.rust_type.clone());
        t.insert("orm_attr", self.orm_attr.clone());
        t.insert("phrase", self.phrase.clone());
        t.insert("get_phrase", self.get_phrase.clone());
        t.insert("set_phrase", self.set_phrase.clone());
        t.insert("get_method_name", self.get_method_name.clone());
        t.insert("set_method_name", self.set_method_name.clone());
        t.insert("default", self.default.clone());
        t
    }
}

/// Methods every generated model with a primary key defines itself.
const MODEL_METHODS: [&str; 2] = ["save", "changes"];

/// Give getters that clash with [`MODEL_METHODS`] or an earlier getter a
/// `get_` name, numbered if that is taken too.
fn dedupe_getters(properties: &mut [PropertyDescriptor]) {
    let mut taken: HashSet<String> = MODEL_METHODS.iter().map(|m| m.to_string()).collect();

    for p in properties.iter_mut() {
        if taken.insert(p.get_method_name.trim_start_matches("r#").to_string()) {
            continue;
        }
        let base = format!("get_{}", p.field.trim_start_matches("r#"));
        let mut candidate = base.clone();
        let mut n = 2;
        while !taken.insert(candidate.clone()) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        p.get_method_name = candidate;
    }
}

/// State owned by one top-level `generate` call.
struct Run<'i> {
    lookup: SchemaLookup<'i>,
    bindings: ClassBindingIndex,
    registry: GenerationRegistry,
    /// Where dependency models land by default.
    entity_dir: PathBuf,
}

pub struct ModelGenerator<'a> {
    root: PathBuf,
    introspector: &'a dyn SchemaIntrospector,
    prompt: &'a mut dyn Prompt,
    settings: ModelSettings,
    templates: TemplateSet,
    types: TypeMapper,
}

impl<'a> ModelGenerator<'a> {
    pub fn new(
        root: impl Into<PathBuf>,
        introspector: &'a dyn SchemaIntrospector,
        prompt: &'a mut dyn Prompt,
    ) -> Self {
        Self {
            root: root.into(),
            introspector,
            prompt,
            settings: ModelSettings::default(),
            templates: TemplateSet::embedded(),
            types: TypeMapper::default(),
        }
    }

    pub fn with_settings(mut self, settings: ModelSettings) -> Self {
        self.types = TypeMapper::new(settings.types.clone());
        self.settings = settings;
        self
    }

    pub fn with_templates(mut self, templates: TemplateSet) -> Self {
        self.templates = templates;
        self
    }

    /// Write the model for `table` at `dest`, then every model queued while
    /// resolving relationships.
    ///
    /// Returns the written paths, relative to the project root: `dest` first,
    /// then dependencies in queue order. Nothing is written when the top-level
    /// table cannot be described, its template cannot be loaded, or `dest`
    /// already exists.
    pub fn generate(
        &mut self,
        dest: &Path,
        table: &str,
        options: GenerateOptions,
    ) -> GenerateResult<Vec<PathBuf>> {
        let table = self.introspector.canonical_name(table)?;
        let dest = naming::parse_filename(&dest.to_string_lossy(), &self.settings.src_prefix());
        if self.root.join(&dest).exists() {
            return Err(GenerateError::DestinationExists(dest));
        }

        let kind = if options.with_property_accessors {
            TemplateKind::Model
        } else {
            TemplateKind::ModelMagic
        };
        let template = self.templates.load(kind)?;

        let mut run = Run {
            lookup: SchemaLookup::new(self.introspector),
            bindings: ClassBindingIndex::scan(&self.root.join(&self.settings.src_dir)),
            registry: GenerationRegistry::new(),
            entity_dir: dest
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.settings.src_dir.clone()),
        };
        run.lookup.table(&table)?;
        tracing::debug!(table = %table, dest = %dest.display(), bound = run.bindings.len(), "generating model");

        let class = ModelClass::for_path(&dest, &self.settings.src_dir);
        run.registry.mark_created(&table, &class.path());
        run.bindings.bind(table.as_str(), class.path());

        let code = self.render_model(&template, &table, &class, options.auto_confirm, &mut run)?;
        write_new(&self.root.join(&dest), &dest, &code)?;

        let mut written = vec![dest];
        written.extend(self.write_queued(&template, options.auto_confirm, &mut run)?);
        Ok(written)
    }

    /// Drain the run's queue, writing each dependency model that can be written.
    ///
    /// Models queued while rendering are picked up by the same loop.
    fn write_queued(
        &mut self,
        template: &str,
        auto_confirm: bool,
        run: &mut Run<'_>,
    ) -> GenerateResult<Vec<PathBuf>> {
        let mut written = Vec::new();

        loop {
            let Some(queued) = run.registry.drain_queue().next() else {
                break;
            };
            tracing::debug!(table = %queued.table, remaining = run.registry.queued_len(), "dependency model");
            if self.root.join(&queued.dest).exists() {
                tracing::warn!(
                    table = %queued.table,
                    path = %queued.dest.display(),
                    "destination exists, leaving dependency model untouched"
                );
                continue;
            }
            if let Err(e) = run.lookup.table(&queued.table) {
                tracing::warn!(table = %queued.table, error = %e, "skipping dependency model");
                continue;
            }

            let class = ModelClass::for_path(&queued.dest, &self.settings.src_dir);
            let code = self.render_model(template, &queued.table, &class, auto_confirm, run)?;
            write_new(&self.root.join(&queued.dest), &queued.dest, &code)?;
            written.push(queued.dest);
        }

        Ok(written)
    }

    fn render_model(
        &mut self,
        template: &str,
        table: &str,
        class: &ModelClass,
        auto_confirm: bool,
        run: &mut Run<'_>,
    ) -> GenerateResult<String> {
        let facts = run.lookup.table(table)?;
        let primary_key = facts.schema.primary_key_column();
        let mut properties: Vec<PropertyDescriptor> = facts
            .schema
            .columns
            .iter()
            .map(|c| PropertyDescriptor::from_column(c, primary_key.map(|pk| pk.name.as_str()), &self.types))
            .collect();
        dedupe_getters(&mut properties);

        let mut reserved_names: Vec<String> = properties
            .iter()
            .map(|p| p.get_method_name.trim_start_matches("r#").to_string())
            .collect();
        reserved_names.extend(MODEL_METHODS.map(String::from));

        let class_path = class.path();
        let request = ResolveRequest {
            table,
            class_name: &class_path,
            entity_dir: &run.entity_dir,
            reserved_names: &reserved_names,
            auto_confirm,
        };
        let resolved = RelationshipResolver::new(&self.settings, &mut *self.prompt).resolve(
            &request,
            &mut run.lookup,
            &mut run.bindings,
            &mut run.registry,
        )?;

        let code = match primary_key {
            Some(_) => keep_block(template, "primary_key"),
            None => drop_block(template, "primary_key"),
        };
        let code = replace_blocks(&code, "properties", |inner| {
            properties
                .iter()
                .map(|p| replace_tokens(inner, &p.tokens()))
                .collect()
        });
        let code = replace_blocks(&code, "writable_properties", |inner| {
            properties
                .iter()
                .filter(|p| !p.is_primary_key)
                .map(|p| replace_tokens(inner, &p.tokens()))
                .collect()
        });
        let code = render_relations(&code, &resolved);

        let pk_property = properties.iter().find(|p| p.is_primary_key);
        let mut tokens = Tokens::new();
        tokens.insert("namespace", class.module.clone());
        tokens.insert("class_name", class.struct_name.clone());
        tokens.insert("dbtable", table.to_string());
        tokens.insert("use_declarations", resolved.use_declarations());
        tokens.insert(
            "primary_key",
            pk_property.map(|p| p.column.clone()).unwrap_or_default(),
        );
        tokens.insert(
            "primary_key_field",
            pk_property.map(|p| p.field.clone()).unwrap_or_default(),
        );
        tokens.insert(
            "primary_key_type",
            pk_property.map(|p| p.rust_type.clone()).unwrap_or_default(),
        );

        Ok(replace_tokens(&code, &tokens))
    }
}
