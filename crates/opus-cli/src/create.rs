use crate::cli::{CreateComponentArgs, CreateModelArgs};
use crate::component_builder::ComponentGenerator;
use crate::config::ProjectConfig;
use crate::model_builder::{GenerateOptions, ModelGenerator};
use crate::prompt::TerminalPrompt;
use crate::schema::load_project_schema;
use colored::Colorize;
use std::path::PathBuf;

/// `opus create model`
pub async fn run_model(args: CreateModelArgs) -> anyhow::Result<()> {
    let project = ProjectConfig::load_or_default(args.config.clone())?;
    let schema = load_project_schema(&project, args.database.as_deref()).await?;

    let mut prompt = TerminalPrompt::stdio();
    let written = ModelGenerator::new(&project.config_dir, &schema, &mut prompt)
        .with_settings(project.model_settings())
        .with_templates(project.template_set())
        .generate(
            &args.file,
            &args.table,
            GenerateOptions {
                with_property_accessors: args.nomagic,
                auto_confirm: args.yes,
            },
        )?;

    report(&format!("model for table '{}' created", args.table), &written);
    Ok(())
}

/// `opus create <kind>`
pub fn run_component(args: CreateComponentArgs) -> anyhow::Result<()> {
    let project = ProjectConfig::load_or_default(args.config.clone())?;

    let written = ComponentGenerator::new(&project.config_dir, project.template_set())
        .build(args.kind, &args.alias)?;

    report(&format!("{} '{}' created", args.kind.name(), args.alias), &written);
    Ok(())
}

fn report(headline: &str, written: &[PathBuf]) {
    println!("{} {}", "✓".green().bold(), headline.green().bold());
    for path in written {
        println!("  {}", path.display());
    }
}
