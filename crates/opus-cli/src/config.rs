use crate::model_builder::ModelSettings;
use crate::template::TemplateSet;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_path: PathBuf,
    /// Project root. Generated paths are relative to it.
    pub config_dir: PathBuf,
    pub file: ConfigFile,
}

impl ProjectConfig {
    pub fn load(config_path: PathBuf) -> anyhow::Result<Self> {
        let config_dir = config_dir_of(&config_path);

        let raw = std::fs::read_to_string(&config_path).map_err(|e| {
            anyhow::anyhow!(
                "failed to read config file {}: {e}",
                config_path.display()
            )
        })?;

        let mut file: ConfigFile = toml::from_str(&raw).map_err(|e| {
            anyhow::anyhow!(
                "failed to parse config file {}: {e}",
                config_path.display()
            )
        })?;

        file.expand_env()?;
        file.validate()?;

        Ok(Self {
            config_path,
            config_dir,
            file,
        })
    }

    /// Load `config_path`, or fall back to defaults rooted next to it when the
    /// file does not exist.
    pub fn load_or_default(config_path: PathBuf) -> anyhow::Result<Self> {
        if config_path.exists() {
            return Self::load(config_path);
        }

        tracing::debug!(path = %config_path.display(), "no config file, using defaults");
        Ok(Self {
            config_dir: config_dir_of(&config_path),
            config_path,
            file: ConfigFile::default(),
        })
    }

    /// The database URL to connect to: `override_url`, else `[database] url`.
    ///
    /// `${ENV}` references in the configured URL are expanded here, so commands
    /// that never connect do not need the variables set.
    pub fn database_url(&self, override_url: Option<&str>) -> anyhow::Result<String> {
        if let Some(url) = override_url {
            return Ok(url.to_string());
        }

        let url = self
            .file
            .database
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty());
        let Some(url) = url else {
            anyhow::bail!(
                "no database configured; set [database] url in {} or pass --database",
                self.config_path.display()
            );
        };
        expand_env_vars(url)
    }

    /// Schemas to introspect: `requested`, else `[database] schemas`, else `public`.
    pub fn schemas(&self, requested: Option<&[String]>) -> Vec<String> {
        match requested {
            Some(s) => s.to_vec(),
            None if !self.file.database.schemas.is_empty() => self.file.database.schemas.clone(),
            None => vec!["public".to_string()],
        }
    }

    pub fn model_settings(&self) -> ModelSettings {
        let models = &self.file.models;
        let mut settings = ModelSettings::default();

        if let Some(src_dir) = &models.src_dir {
            settings.src_dir = PathBuf::from(src_dir);
        }
        if let Some(reserved) = &models.reserved_tables {
            settings.reserved_tables = reserved.clone();
        }
        if let Some(imports) = &models.iterator_imports {
            settings.iterator_imports = imports.clone();
        }
        settings.table_prefixes = models.table_prefixes.clone();
        settings.one_to_one = models.one_to_one.clone();
        settings.types = models.types.clone();
        settings
    }

    pub fn template_set(&self) -> TemplateSet {
        match &self.file.templates.dir {
            Some(dir) => TemplateSet::with_override_dir(self.resolve_path(dir)),
            None => TemplateSet::embedded(),
        }
    }

    pub fn resolve_path(&self, p: impl AsRef<Path>) -> PathBuf {
        let p = p.as_ref();
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.config_dir.join(p)
        }
    }
}

fn config_dir_of(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    pub engine: Option<String>,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub schema_cache: SchemaCacheConfig,

    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default)]
    pub templates: TemplatesConfig,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            engine: Some("postgres".to_string()),
            database: DatabaseConfig::default(),
            schema_cache: SchemaCacheConfig::default(),
            models: ModelsConfig::default(),
            templates: TemplatesConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// May reference `${ENV}` variables; expanded on use.
    pub url: Option<String>,
    #[serde(default)]
    pub schemas: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaCacheMode {
    /// Reuse the snapshot while the database fingerprint matches.
    #[default]
    Auto,
    Refresh,
    /// Never connect; fail when there is no snapshot.
    CacheOnly,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaCacheConfig {
    pub dir: Option<String>,
    pub file: Option<String>,
    #[serde(default)]
    pub mode: SchemaCacheMode,
}

impl Default for SchemaCacheConfig {
    fn default() -> Self {
        Self {
            dir: Some(".opus".to_string()),
            file: Some("schema.json".to_string()),
            mode: SchemaCacheMode::Auto,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelsConfig {
    pub src_dir: Option<String>,
    pub reserved_tables: Option<Vec<String>>,
    #[serde(default)]
    pub table_prefixes: Vec<String>,
    /// `child_table.child_column` entries whose inbound side is to-one.
    #[serde(default)]
    pub one_to_one: BTreeSet<String>,
    pub iterator_imports: Option<Vec<String>>,
    #[serde(default)]
    pub types: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplatesConfig {
    pub dir: Option<String>,
}

impl ConfigFile {
    fn expand_env(&mut self) -> anyhow::Result<()> {
        for s in &mut self.database.schemas {
            *s = expand_env_vars(s)?;
        }

        if let Some(dir) = self.schema_cache.dir.as_mut() {
            *dir = expand_env_vars(dir)?;
        }
        if let Some(file) = self.schema_cache.file.as_mut() {
            *file = expand_env_vars(file)?;
        }

        if let Some(dir) = self.models.src_dir.as_mut() {
            *dir = expand_env_vars(dir)?;
        }
        for v in self.models.types.values_mut() {
            *v = expand_env_vars(v)?;
        }

        if let Some(dir) = self.templates.dir.as_mut() {
            *dir = expand_env_vars(dir)?;
        }

        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.version.trim() != "1" {
            anyhow::bail!("unsupported config version: {}", self.version);
        }
        if let Some(engine) = &self.engine {
            if engine != "postgres" {
                anyhow::bail!("unsupported engine: {engine}");
            }
        }

        if let Some(dir) = &self.models.src_dir {
            if dir.trim().is_empty() {
                anyhow::bail!("models.src_dir must not be empty");
            }
        }
        for key in &self.models.one_to_one {
            let valid = key
                .rsplit_once('.')
                .is_some_and(|(table, column)| !table.is_empty() && !column.is_empty());
            if !valid {
                anyhow::bail!("models.one_to_one entries must look like `table.column`: {key}");
            }
        }

        Ok(())
    }
}

fn expand_env_vars(input: &str) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut key = String::new();
            let mut closed = false;
            while let Some(&ch) = chars.peek() {
                chars.next();
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                anyhow::bail!("unterminated env var reference: ${{{key}}}");
            }
            if key.is_empty() {
                anyhow::bail!("invalid env var reference: ${{}}");
            }

            let v = std::env::var(&key)
                .map_err(|_| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("opus.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn models_section_feeds_generator_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
version = "1"

[database]
url = "postgres://localhost/app"

[models]
src_dir = "app/src"
table_prefixes = ["tbl_"]
one_to_one = ["profiles.user_id"]

[models.types]
"numeric" = "rust_decimal::Decimal"

[templates]
dir = "skeletons"
"#,
        );

        let project = ProjectConfig::load(path).unwrap();
        let settings = project.model_settings();

        assert_eq!(settings.src_dir, PathBuf::from("app/src"));
        assert_eq!(settings.table_prefixes, vec!["tbl_".to_string()]);
        assert!(settings.one_to_one.contains("profiles.user_id"));
        assert_eq!(settings.reserved_tables, vec!["refinery_schema_history".to_string()]);
        assert_eq!(settings.iterator_imports.len(), 2);
        assert_eq!(
            project.template_set().override_dir(),
            Some(dir.path().join("skeletons").as_path())
        );
        assert_eq!(
            project.database_url(None).unwrap(),
            "postgres://localhost/app"
        );
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let project = ProjectConfig::load_or_default(dir.path().join("opus.toml")).unwrap();

        assert_eq!(project.config_dir, dir.path());
        assert_eq!(project.schemas(None), vec!["public".to_string()]);
        assert!(project.template_set().override_dir().is_none());
        assert!(project.database_url(None).is_err());
        assert_eq!(
            project.database_url(Some("postgres://x/y")).unwrap(),
            "postgres://x/y"
        );
    }

    #[test]
    fn database_url_is_expanded_on_use() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "version = \"1\"\n[database]\nurl = \"${OPUS_TEST_SURELY_UNSET_VAR}\"\n",
        );

        let project = ProjectConfig::load(path).unwrap();
        let err = project.database_url(None).unwrap_err();
        assert!(err.to_string().contains("OPUS_TEST_SURELY_UNSET_VAR"));
    }

    #[test]
    fn malformed_one_to_one_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "version = \"1\"\n[models]\none_to_one = [\"profiles\"]\n",
        );

        assert!(ProjectConfig::load(path).is_err());
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "version = \"2\"\n");
        assert!(ProjectConfig::load(path).is_err());
    }

    #[test]
    fn expand_env_vars_rejects_unterminated_reference() {
        assert!(expand_env_vars("${DATABASE_URL").is_err());
        assert_eq!(expand_env_vars("plain").unwrap(), "plain");
    }
}
