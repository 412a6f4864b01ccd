//! Skeleton loading and `~token~` / `<block>` substitution.

use crate::error::TemplateError;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};

/// Token name -> replacement text.
pub type Tokens<'a> = BTreeMap<&'a str, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Model,
    ModelMagic,
    Api,
    Cli,
    CliHelp,
    HttpController,
    View,
    ViewMarkup,
    Test,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 9] = [
        TemplateKind::Model,
        TemplateKind::ModelMagic,
        TemplateKind::Api,
        TemplateKind::Cli,
        TemplateKind::CliHelp,
        TemplateKind::HttpController,
        TemplateKind::View,
        TemplateKind::ViewMarkup,
        TemplateKind::Test,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TemplateKind::Model => "model",
            TemplateKind::ModelMagic => "model-magic",
            TemplateKind::Api => "api",
            TemplateKind::Cli => "cli",
            TemplateKind::CliHelp => "cli_help",
            TemplateKind::HttpController => "http_controller",
            TemplateKind::View => "view",
            TemplateKind::ViewMarkup => "view_markup",
            TemplateKind::Test => "test",
        }
    }

    fn embedded(self) -> &'static str {
        match self {
            TemplateKind::Model => include_str!("../templates/model.txt"),
            TemplateKind::ModelMagic => include_str!("../templates/model-magic.txt"),
            TemplateKind::Api => include_str!("../templates/api.txt"),
            TemplateKind::Cli => include_str!("../templates/cli.txt"),
            TemplateKind::CliHelp => include_str!("../templates/cli_help.txt"),
            TemplateKind::HttpController => include_str!("../templates/http_controller.txt"),
            TemplateKind::View => include_str!("../templates/view.txt"),
            TemplateKind::ViewMarkup => include_str!("../templates/view_markup.txt"),
            TemplateKind::Test => include_str!("../templates/test.txt"),
        }
    }
}

impl FromStr for TemplateKind {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| TemplateError::UnknownKind(s.to_string()))
    }
}

/// Embedded skeletons, optionally overridden by `<dir>/<kind>.txt` files.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    override_dir: Option<PathBuf>,
}

impl TemplateSet {
    pub fn embedded() -> Self {
        Self::default()
    }

    pub fn with_override_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            override_dir: Some(dir.into()),
        }
    }

    pub fn load(&self, kind: TemplateKind) -> Result<String, TemplateError> {
        if let Some(dir) = &self.override_dir {
            let path = dir.join(format!("{}.txt", kind.name()));
            match std::fs::read_to_string(&path) {
                Ok(s) => {
                    tracing::debug!(path = %path.display(), "using template override");
                    return Ok(s);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(TemplateError::Unreadable { path, source }),
            }
        }
        Ok(kind.embedded().to_string())
    }

    pub fn override_dir(&self) -> Option<&Path> {
        self.override_dir.as_deref()
    }
}

/// Replace every `~name~` whose name is in `tokens`, in one left-to-right pass.
/// Replacement text is never rescanned. Unknown tokens are left as they are.
pub fn replace_tokens(code: &str, tokens: &Tokens<'_>) -> String {
    let mut out = String::with_capacity(code.len());
    let mut rest = code;

    while let Some(start) = rest.find('~') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let value = after
            .find('~')
            .and_then(|end| tokens.get(&after[..end]).map(|v| (end, v)));
        match value {
            Some((end, v)) => {
                out.push_str(v);
                rest = &after[end + 1..];
            }
            None => {
                out.push('~');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn block_regex(tag: &'static str) -> regex::Regex {
    static CACHE: OnceLock<Mutex<HashMap<&'static str, regex::Regex>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));

    let mut cache = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    cache
        .entry(tag)
        .or_insert_with(|| {
            let tag = regex::escape(tag);
            regex::Regex::new(&format!(r"(?s)<{tag}>\n?(.*?)</{tag}>\n?"))
                .expect("invalid built-in block regex")
        })
        .clone()
}

/// Replace every `<tag>inner</tag>` region with `f(inner)`.
///
/// A newline right after the opening and the closing tag belongs to the tag.
pub fn replace_blocks(code: &str, tag: &'static str, mut f: impl FnMut(&str) -> String) -> String {
    block_regex(tag)
        .replace_all(code, |caps: &regex::Captures<'_>| f(&caps[1]))
        .into_owned()
}

/// Keep the contents of every `<tag>` block, dropping only the tags.
pub fn keep_block(code: &str, tag: &'static str) -> String {
    replace_blocks(code, tag, str::to_string)
}

/// Remove every `<tag>` block together with its contents.
pub fn drop_block(code: &str, tag: &'static str) -> String {
    replace_blocks(code, tag, |_| String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_replaced_once() {
        let mut tokens = Tokens::new();
        tokens.insert("name", "~name~ loop".to_string());
        tokens.insert("table", "users".to_string());

        assert_eq!(
            replace_tokens("struct ~name~; // ~table~ ~missing~ a~b", &tokens),
            "struct ~name~ loop; // users ~missing~ a~b"
        );
    }

    #[test]
    fn blocks_repeat_their_inner_text() {
        let code = "fields {\n<properties>\n    ~field~,\n</properties>\n}\n";
        let rendered = replace_blocks(code, "properties", |inner| {
            ["a", "b"]
                .iter()
                .map(|f| {
                    let mut t = Tokens::new();
                    t.insert("field", f.to_string());
                    replace_tokens(inner, &t)
                })
                .collect()
        });
        assert_eq!(rendered, "fields {\n    a,\n    b,\n}\n");
    }

    #[test]
    fn empty_block_leaves_no_blank_line() {
        let code = "impl X {\n<relations_one>\n    fn a() {}\n</relations_one>\n}\n";
        assert_eq!(drop_block(code, "relations_one"), "impl X {\n}\n");
        assert_eq!(keep_block(code, "relations_one"), "impl X {\n    fn a() {}\n}\n");
    }

    #[test]
    fn separate_blocks_with_same_tag_match_separately() {
        let code = "<primary_key>a\n</primary_key>\nmid\n<primary_key>b\n</primary_key>\n";
        assert_eq!(keep_block(code, "primary_key"), "a\nmid\nb\n");
        assert_eq!(drop_block(code, "primary_key"), "mid\n");
    }

    #[test]
    fn kinds_parse_by_name() {
        for kind in TemplateKind::ALL {
            assert_eq!(kind.name().parse::<TemplateKind>().unwrap(), kind);
            assert!(!TemplateSet::embedded().load(kind).unwrap().is_empty());
        }
        assert!(matches!(
            "widget".parse::<TemplateKind>(),
            Err(TemplateError::UnknownKind(_))
        ));
    }

    #[test]
    fn override_dir_replaces_single_skeleton() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("api.txt"), "custom ~alias~").unwrap();

        let set = TemplateSet::with_override_dir(dir.path());
        assert_eq!(set.load(TemplateKind::Api).unwrap(), "custom ~alias~");
        assert_eq!(
            set.load(TemplateKind::Test).unwrap(),
            TemplateSet::embedded().load(TemplateKind::Test).unwrap()
        );
    }

    #[test]
    fn unreadable_override_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("cli.txt")).unwrap();

        let set = TemplateSet::with_override_dir(dir.path());
        assert!(matches!(
            set.load(TemplateKind::Cli),
            Err(TemplateError::Unreadable { .. })
        ));
    }
}
