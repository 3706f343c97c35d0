use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use convert_case::{Case, Casing};
use serde_json::json;

use crate::cli::{GenerateArgs, TemplateArg};
use crate::config::{self, ProjectConfig};
use crate::output::Printer;
use crate::validate::{validate_item_name, validate_path};

const COMPONENT_TEMPLATE: &str = include_str!("../../templates/component.tsx.tmpl");
const COMPONENT_INDEX_TEMPLATE: &str = include_str!("../../templates/component.index.ts.tmpl");
const SCREEN_TEMPLATE: &str = include_str!("../../templates/screen.tsx.tmpl");

pub fn run(args: &GenerateArgs, printer: &Printer) -> Result<()> {
    validate_item_name(&args.name)?;
    let root = std::env::current_dir().context("failed to resolve the project root")?;
    // Config is optional here: --output works without one, and the defaults
    // match what init would have written.
    let project_config = config::read_config(&root)?.unwrap_or_else(ProjectConfig::default);

    let output_base = match &args.output {
        Some(path) => {
            validate_path(path)?;
            root.join(path)
        }
        None => match args.template {
            TemplateArg::Component => root.join(&project_config.paths.ui),
            TemplateArg::Screen => root.join(&project_config.paths.flows),
        },
    };

    let pascal = args.name.to_case(Case::Pascal);
    let files: Vec<(PathBuf, String)> = match args.template {
        TemplateArg::Component => {
            let dir = output_base.join(&args.name);
            vec![
                (dir.join(format!("{pascal}.tsx")), render(COMPONENT_TEMPLATE, &pascal)),
                (dir.join("index.ts"), render(COMPONENT_INDEX_TEMPLATE, &pascal)),
            ]
        }
        TemplateArg::Screen => vec![(
            output_base.join(format!("{}.tsx", args.name)),
            render(SCREEN_TEMPLATE, &pascal),
        )],
    };

    for (path, _) in &files {
        if path.exists() {
            bail!("{} already exists; refusing to overwrite", path.display());
        }
    }
    let mut created = Vec::new();
    for (path, contents) in &files {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
        printer.success(&format!("created {}", path.display()));
        created.push(path.display().to_string());
    }
    printer.json(&json!({ "success": true, "created": created }))?;
    Ok(())
}

fn render(template: &str, pascal: &str) -> String {
    template.replace("{{pascal}}", pascal)
}
