//! Flat-template scaffolding for everything that is not a model.

use crate::error::{GenerateError, GenerateResult};
use crate::naming;
use crate::template::{TemplateKind, TemplateSet, Tokens, replace_tokens};
use crate::write::write_new;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

/// A command directory with fewer entries than this gets a `help.rs`.
pub const MIN_COMMAND_DIR_ENTRIES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Api,
    Cli,
    HttpController,
    View,
    Test,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 5] = [
        ComponentKind::Api,
        ComponentKind::Cli,
        ComponentKind::HttpController,
        ComponentKind::View,
        ComponentKind::Test,
    ];

    /// Name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Api => "api",
            ComponentKind::Cli => "cli",
            ComponentKind::HttpController => "http-controller",
            ComponentKind::View => "view",
            ComponentKind::Test => "test",
        }
    }

    pub fn template_kind(self) -> TemplateKind {
        match self {
            ComponentKind::Api => TemplateKind::Api,
            ComponentKind::Cli => TemplateKind::Cli,
            ComponentKind::HttpController => TemplateKind::HttpController,
            ComponentKind::View => TemplateKind::View,
            ComponentKind::Test => TemplateKind::Test,
        }
    }
}

impl FromStr for ComponentKind {
    type Err = crate::error::TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| crate::error::TemplateError::UnknownKind(s.to_string()))
    }
}

fn view_segment_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^[a-z0-9_-]+$").expect("invalid built-in view regex"))
}

/// Canonical `/`-separated alias for `kind`.
///
/// Code kinds snake-case each segment. Views keep their spelling but are
/// lower-cased, lose any `.html` suffix and must stick to `[a-z0-9_-]`.
pub fn normalize_alias(kind: ComponentKind, raw: &str) -> GenerateResult<String> {
    let raw = raw.trim().replace('\\', "/");
    let segments: Vec<String> = match kind {
        ComponentKind::View => {
            let lowered = raw.to_lowercase();
            let trimmed = lowered.strip_suffix(".html").unwrap_or(&lowered);
            let segments: Vec<String> = trimmed
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if let Some(bad) = segments.iter().find(|s| !view_segment_regex().is_match(s)) {
                return Err(GenerateError::InvalidAlias(format!(
                    "{raw} (view segment '{bad}' may only use a-z, 0-9, '_' and '-')"
                )));
            }
            segments
        }
        _ => raw
            .trim_end_matches(".rs")
            .split('/')
            .map(naming::snake_case)
            .filter(|s| !s.is_empty())
            .collect(),
    };

    if segments.is_empty() {
        return Err(GenerateError::InvalidAlias(format!(
            "'{raw}' is empty for {}",
            kind.name()
        )));
    }
    Ok(segments.join("/"))
}

/// Primary destination for a normalized alias, relative to the project root.
pub fn destination(kind: ComponentKind, alias: &str) -> PathBuf {
    match kind {
        ComponentKind::Api => PathBuf::from(format!("src/api/{alias}.rs")),
        ComponentKind::Cli => PathBuf::from(format!("src/console/{alias}.rs")),
        ComponentKind::HttpController => PathBuf::from(format!("src/http_controllers/{alias}.rs")),
        ComponentKind::View => PathBuf::from(format!("views/rs/{alias}.rs")),
        ComponentKind::Test => PathBuf::from(format!("tests/{alias}_test.rs")),
    }
}

fn view_markup_destination(alias: &str) -> PathBuf {
    PathBuf::from(format!("views/html/{alias}.html"))
}

pub struct ComponentGenerator {
    root: PathBuf,
    templates: TemplateSet,
}

impl ComponentGenerator {
    pub fn new(root: impl Into<PathBuf>, templates: TemplateSet) -> Self {
        Self {
            root: root.into(),
            templates,
        }
    }

    /// Render and write the files for one component. Returns the written
    /// paths, relative to the project root.
    pub fn build(&self, kind: ComponentKind, raw_alias: &str) -> GenerateResult<Vec<PathBuf>> {
        let alias = normalize_alias(kind, raw_alias)?;
        let dest = destination(kind, &alias);

        let mut targets = vec![(dest.clone(), self.templates.load(kind.template_kind())?)];
        if kind == ComponentKind::View {
            targets.push((
                view_markup_destination(&alias),
                self.templates.load(TemplateKind::ViewMarkup)?,
            ));
        }
        let help_template = match kind {
            ComponentKind::Cli => Some(self.templates.load(TemplateKind::CliHelp)?),
            _ => None,
        };

        for (path, _) in &targets {
            if self.root.join(path).exists() {
                return Err(GenerateError::DestinationExists(path.clone()));
            }
        }

        let tokens = component_tokens(&dest, &alias);
        let mut written = Vec::with_capacity(targets.len() + 1);
        for (path, template) in targets {
            write_new(&self.root.join(&path), &path, &replace_tokens(&template, &tokens))?;
            written.push(path);
        }

        if let Some(template) = help_template {
            if let Some(help) = self.help_destination(&dest)? {
                write_new(&self.root.join(&help), &help, &replace_tokens(&template, &tokens))?;
                written.push(help);
            }
        }

        Ok(written)
    }

    /// `help.rs` next to a freshly written command, when its directory is still sparse.
    fn help_destination(&self, command: &Path) -> GenerateResult<Option<PathBuf>> {
        let Some(dir) = command.parent() else {
            return Ok(None);
        };
        let help = dir.join("help.rs");
        if self.root.join(&help).exists() {
            return Ok(None);
        }

        let abs = self.root.join(dir);
        let entries = std::fs::read_dir(&abs)
            .map_err(|e| GenerateError::io(&abs, e))?
            .count();
        tracing::debug!(dir = %dir.display(), entries, "command directory");
        Ok((entries < MIN_COMMAND_DIR_ENTRIES).then_some(help))
    }
}

fn component_tokens(dest: &Path, alias: &str) -> Tokens<'static> {
    let (namespace, class_name) = naming::path_to_module(dest);
    let parent_namespace = namespace
        .rsplit_once("::")
        .map(|(parent, _)| parent.to_string())
        .unwrap_or_else(|| namespace.clone());
    let leaf = alias.rsplit('/').next().unwrap_or(alias);

    let mut t = Tokens::new();
    t.insert("namespace", namespace);
    t.insert("class_name", class_name);
    t.insert("alias", alias.to_string());
    t.insert("command", alias.replace('/', ":"));
    t.insert("uri", alias.to_string());
    t.insert("parent_namespace", parent_namespace);
    t.insert(
        "module_name",
        naming::snake_case(leaf).trim_start_matches(|c: char| c.is_ascii_digit()).to_string(),
    );
    t
}
