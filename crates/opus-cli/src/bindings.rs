//! Table -> model struct bindings discovered in existing sources.

use crate::naming;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use syn::punctuated::Punctuated;

/// Maps table names to fully-qualified struct paths.
///
/// Filled once from the source tree, then grows as the run generates models.
#[derive(Debug, Clone, Default)]
pub struct ClassBindingIndex {
    bindings: BTreeMap<String, String>,
}

impl ClassBindingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `src_root/**/*.rs` for structs deriving `Model` with `#[orm(table = "...")]`.
    ///
    /// Files that cannot be read or parsed are skipped. A missing root gives an empty index.
    pub fn scan(src_root: &Path) -> Self {
        let mut index = Self::new();
        if !src_root.is_dir() {
            tracing::debug!(root = %src_root.display(), "source root missing, no bindings");
            return index;
        }

        let pattern = format!("{}/**/*.rs", src_root.display());
        let paths = match glob::glob(&pattern) {
            Ok(paths) => paths,
            Err(e) => {
                tracing::debug!(pattern = %pattern, error = %e, "invalid source glob");
                return index;
            }
        };

        for entry in paths {
            let path = match entry {
                Ok(p) => p,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable source entry");
                    continue;
                }
            };
            index.scan_file(src_root, &path);
        }

        tracing::debug!(bindings = index.len(), "scanned model bindings");
        index
    }

    fn scan_file(&mut self, src_root: &Path, path: &Path) {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping unreadable file");
                return;
            }
        };
        let file = match syn::parse_file(&source) {
            Ok(f) => f,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping unparsable file");
                return;
            }
        };

        let rel = path.strip_prefix(src_root).unwrap_or(path);
        let (module, _) = naming::path_to_module(&PathBuf::from("src").join(rel));
        self.collect_items(&module, &file.items);
    }

    fn collect_items(&mut self, module: &str, items: &[syn::Item]) {
        for item in items {
            match item {
                syn::Item::Struct(s) => {
                    if !derives_model(&s.attrs) {
                        continue;
                    }
                    let Some(table) = orm_table(&s.attrs) else {
                        continue;
                    };
                    let class = format!("{module}::{}", s.ident);
                    if let Some(existing) = self.bindings.get(&table) {
                        tracing::debug!(table = %table, kept = %existing, ignored = %class, "duplicate model binding");
                        continue;
                    }
                    self.bindings.insert(table, class);
                }
                syn::Item::Mod(m) => {
                    if let Some((_, inner)) = &m.content {
                        let nested = format!("{module}::{}", m.ident);
                        self.collect_items(&nested, inner);
                    }
                }
                _ => {}
            }
        }
    }

    pub fn bind(&mut self, table: impl Into<String>, class: impl Into<String>) {
        self.bindings.insert(table.into(), class.into());
    }

    pub fn get(&self, table: &str) -> Option<&str> {
        self.bindings.get(table).map(String::as_str)
    }

    /// Table bound to `class`, if any.
    pub fn table_for(&self, class: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(_, c)| c.as_str() == class)
            .map(|(t, _)| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

fn derives_model(attrs: &[syn::Attribute]) -> bool {
    attrs
        .iter()
        .filter(|a| a.path().is_ident("derive"))
        .filter_map(|a| {
            a.parse_args_with(Punctuated::<syn::Path, syn::Token![,]>::parse_terminated)
                .ok()
        })
        .flatten()
        .any(|p| p.segments.last().is_some_and(|s| s.ident == "Model"))
}

fn orm_table(attrs: &[syn::Attribute]) -> Option<String> {
    let mut table = None;

    for attr in attrs.iter().filter(|a| a.path().is_ident("orm")) {
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                table = Some(lit.value());
            } else if meta.input.peek(syn::Token![=]) {
                let _: syn::Expr = meta.value()?.parse()?;
            } else if meta.input.peek(syn::token::Paren) {
                let content;
                syn::parenthesized!(content in meta.input);
                content.step(|cursor| {
                    let mut rest = *cursor;
                    while let Some((_, next)) = rest.token_tree() {
                        rest = next;
                    }
                    Ok(((), rest))
                })?;
            }
            Ok(())
        });
        if let Err(e) = parsed {
            tracing::debug!(error = %e, "ignoring malformed #[orm] attribute");
        }
    }

    table
}
