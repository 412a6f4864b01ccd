use crate::component_builder::ComponentKind;
use std::path::PathBuf;

const DEFAULT_CONFIG: &str = "opus.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Create,
    CreateModel,
    CreateComponent,
    Schema,
    Init,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Create(CreateCommand),
    Schema(SchemaArgs),
    Init(InitArgs),
}

#[derive(Debug, Clone)]
pub enum CreateCommand {
    Model(CreateModelArgs),
    Component(CreateComponentArgs),
}

#[derive(Debug, Clone)]
pub struct CreateModelArgs {
    pub config: PathBuf,
    pub database: Option<String>,
    pub file: PathBuf,
    pub table: String,
    /// Private fields with getters and setters instead of public fields.
    pub nomagic: bool,
    /// Generate every missing dependency model without asking.
    pub yes: bool,
}

#[derive(Debug, Clone)]
pub struct CreateComponentArgs {
    pub config: PathBuf,
    pub kind: ComponentKind,
    pub alias: String,
}

#[derive(Debug, Clone)]
pub struct SchemaArgs {
    pub config: PathBuf,
    pub database: Option<String>,
    pub schemas: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct InitArgs {
    pub config: PathBuf,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help(HelpTopic::Root)),
        "create" => parse_create(it.map(|s| s.as_str())),
        "schema" => parse_schema(it.map(|s| s.as_str())),
        "init" => parse_init(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

fn parse_create<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let Some(kind) = it.next() else {
        return Ok(Command::Help(HelpTopic::Create));
    };

    match kind {
        "-h" | "--help" => Ok(Command::Help(HelpTopic::Create)),
        "model" => parse_create_model(it),
        other => {
            let Ok(kind) = other.parse::<ComponentKind>() else {
                anyhow::bail!("unknown component kind: {other}");
            };
            parse_create_component(kind, it)
        }
    }
}

fn parse_create_model<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut database: Option<String> = None;
    let mut file: Option<PathBuf> = None;
    let mut table: Option<String> = None;
    let mut nomagic = false;
    let mut yes = false;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::CreateModel)),
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                config = PathBuf::from(v);
            }
            _ if token.starts_with("--config=") => {
                config = PathBuf::from(token.trim_start_matches("--config="));
            }
            "--database" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--database requires a value");
                };
                database = Some(v.to_string());
            }
            _ if token.starts_with("--database=") => {
                database = Some(token.trim_start_matches("--database=").to_string());
            }
            "--dbtable" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--dbtable requires a value");
                };
                table = Some(v.to_string());
            }
            _ if token.starts_with("--dbtable=") => {
                table = Some(token.trim_start_matches("--dbtable=").to_string());
            }
            "--nomagic" => nomagic = true,
            "-y" | "--yes" => yes = true,
            other if other.starts_with('-') => anyhow::bail!("unknown argument: {other}"),
            other => {
                if file.is_some() {
                    anyhow::bail!("unexpected argument: {other}");
                }
                file = Some(PathBuf::from(other));
            }
        }
    }

    let Some(file) = file else {
        anyhow::bail!("missing destination file: expected `opus create model <FILE> --dbtable=<TABLE>`");
    };
    let Some(table) = table.filter(|t| !t.trim().is_empty()) else {
        anyhow::bail!("--dbtable is required");
    };

    Ok(Command::Create(CreateCommand::Model(CreateModelArgs {
        config,
        database,
        file,
        table,
        nomagic,
        yes,
    })))
}

fn parse_create_component<'a>(
    kind: ComponentKind,
    mut it: impl Iterator<Item = &'a str>,
) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut alias: Option<String> = None;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::CreateComponent)),
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                config = PathBuf::from(v);
            }
            _ if token.starts_with("--config=") => {
                config = PathBuf::from(token.trim_start_matches("--config="));
            }
            other if other.starts_with('-') => anyhow::bail!("unknown argument: {other}"),
            other => {
                if alias.is_some() {
                    anyhow::bail!("unexpected argument: {other}");
                }
                alias = Some(other.to_string());
            }
        }
    }

    let Some(alias) = alias else {
        anyhow::bail!("missing alias: expected `opus create {} <ALIAS>`", kind.name());
    };

    Ok(Command::Create(CreateCommand::Component(CreateComponentArgs {
        config,
        kind,
        alias,
    })))
}

fn parse_schema<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut database: Option<String> = None;
    let mut schemas: Option<Vec<String>> = None;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Schema)),
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                config = PathBuf::from(v);
            }
            _ if token.starts_with("--config=") => {
                config = PathBuf::from(token.trim_start_matches("--config="));
            }
            "--database" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--database requires a value");
                };
                database = Some(v.to_string());
            }
            _ if token.starts_with("--database=") => {
                database = Some(token.trim_start_matches("--database=").to_string());
            }
            "--schemas" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--schemas requires a value");
                };
                schemas = Some(parse_schemas(v)?);
            }
            _ if token.starts_with("--schemas=") => {
                schemas = Some(parse_schemas(token.trim_start_matches("--schemas="))?);
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    Ok(Command::Schema(SchemaArgs {
        config,
        database,
        schemas,
    }))
}

fn parse_init<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Init)),
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                config = PathBuf::from(v);
            }
            _ if token.starts_with("--config=") => {
                config = PathBuf::from(token.trim_start_matches("--config="));
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    Ok(Command::Init(InitArgs { config }))
}

fn parse_schemas(v: &str) -> anyhow::Result<Vec<String>> {
    let parsed = split_csv(v);
    if parsed.is_empty() {
        anyhow::bail!("--schemas must not be empty");
    }
    Ok(parsed)
}

fn split_csv(v: &str) -> Vec<String> {
    v.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
opus - schema-driven scaffolding for pgorm projects

USAGE:
  opus <COMMAND> [OPTIONS]

COMMANDS:
  create        Generate a model or a component stub
  schema        Refresh the cached schema snapshot
  init          Write an opus.toml template

Run `opus <command> --help` for more."
            );
        }
        HelpTopic::Create => {
            println!(
                "\
USAGE:
  opus create model <FILE> --dbtable=<TABLE> [OPTIONS]
  opus create <KIND> <ALIAS> [OPTIONS]

KINDS:
  model             Model struct bound to a database table
  api               API endpoint stub (src/api)
  cli               Console command stub (src/console)
  http-controller   HTTP controller stub (src/http_controllers)
  view              View struct and HTML markup (views/rs, views/html)
  test              Integration test stub (tests)

Run `opus create <kind> --help` for more."
            );
        }
        HelpTopic::CreateModel => {
            println!(
                "\
USAGE:
  opus create model <FILE> --dbtable=<TABLE> [OPTIONS]

Writes the model for TABLE to FILE (rooted under src/, .rs added when missing).
Tables referenced through foreign keys that have no model yet are offered
for generation as well.

OPTIONS:
  --dbtable <TABLE>     Table to generate the model for (required)
  --nomagic             Private fields with getters and setters
  -y, --yes             Generate missing dependency models without asking
  --config <FILE>       Config file path (default: opus.toml)
  --database <URL>      Database URL (overrides config)
  -h, --help            Print help"
            );
        }
        HelpTopic::CreateComponent => {
            println!(
                "\
USAGE:
  opus create <KIND> <ALIAS> [OPTIONS]

ALIAS may contain `/` to nest the component, e.g. `admin/users`.

OPTIONS:
  --config <FILE>       Config file path (default: opus.toml)
  -h, --help            Print help"
            );
        }
        HelpTopic::Schema => {
            println!(
                "\
USAGE:
  opus schema [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: opus.toml)
  --database <URL>      Database URL (overrides config)
  --schemas <CSV>       Comma-separated schema list (default: from config or public)
  -h, --help            Print help"
            );
        }
        HelpTopic::Init => {
            println!(
                "\
USAGE:
  opus init [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: opus.toml)
  -h, --help            Print help"
            );
        }
    }
}
