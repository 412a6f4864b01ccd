//! Scaffolding generator for pgorm projects.
//!
//! [`ModelGenerator`] turns a table into a model source file and follows its
//! foreign keys, offering to generate models for referenced tables that do
//! not have one yet. [`ComponentGenerator`] stamps out the flat stubs
//! (API endpoints, console commands, controllers, views, tests).

pub mod bindings;
pub mod component_builder;
pub mod error;
pub mod logging;
pub mod model_builder;
pub mod naming;
pub mod prompt;
pub mod registry;
pub mod relations;
pub mod template;
pub mod type_mapper;
pub mod write;

mod cli;
mod config;
mod create;
mod init;
mod schema;

#[cfg(test)]
mod test_support;

pub use bindings::ClassBindingIndex;
pub use component_builder::{ComponentGenerator, ComponentKind};
pub use error::{GenerateError, GenerateResult, TemplateError};
pub use model_builder::{GenerateOptions, ModelGenerator, ModelSettings};
pub use prompt::{Prompt, TerminalPrompt};
pub use registry::GenerationRegistry;
pub use relations::{RelationshipResolver, ResolvedRelations};
pub use template::{TemplateKind, TemplateSet};

pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Create(cmd) => match cmd {
            cli::CreateCommand::Model(args) => create::run_model(args).await,
            cli::CreateCommand::Component(args) => create::run_component(args),
        },
        cli::Command::Schema(args) => schema::run(args).await,
        cli::Command::Init(args) => init::run(args),
    }
}
