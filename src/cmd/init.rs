use anyhow::{Context, Result};
use serde_json::json;

use crate::cli::InitArgs;
use crate::config::{self, ProjectConfig, ProjectType, StyleLib};
use crate::error::CliError;
use crate::output::Printer;
use crate::prompt;
use crate::validate::validate_path;

pub fn run(args: &InitArgs, printer: &Printer) -> Result<()> {
    let root = std::env::current_dir().context("failed to resolve the project root")?;
    if config::config_exists(&root) && !args.overwrite {
        return Err(CliError::ConfigExists {
            path: config::config_path(&root).display().to_string(),
        }
        .into());
    }

    // JSON mode never prompts; unset values fall back to defaults as if
    // --yes had been passed.
    let interactive = !args.yes && !printer.is_json();
    let defaults = ProjectConfig::default();

    let project: ProjectType = match args.project_type {
        Some(value) => value.into(),
        None if interactive => {
            match prompt::select("Target platform", &["expo", "react-native-cli"], 0)? {
                0 => ProjectType::Expo,
                _ => ProjectType::ReactNativeCli,
            }
        }
        None => defaults.project,
    };
    let lib: StyleLib = match args.lib {
        Some(value) => value.into(),
        None if interactive => {
            match prompt::select("Styling library", &["nativewind", "stylesheet"], 0)? {
                0 => StyleLib::Nativewind,
                _ => StyleLib::Stylesheet,
            }
        }
        None => defaults.lib,
    };
    let ui_path = match &args.component_path {
        Some(path) => path.clone(),
        None if interactive => prompt::input("Component install path", &defaults.paths.ui)?,
        None => defaults.paths.ui.clone(),
    };
    let flows_path = match &args.flow_path {
        Some(path) => path.clone(),
        None if interactive => prompt::input("Flow install path", &defaults.paths.flows)?,
        None => defaults.paths.flows.clone(),
    };
    validate_path(&ui_path)?;
    validate_path(&flows_path)?;

    let new_config = ProjectConfig {
        project,
        lib,
        paths: config::InstallPaths {
            ui: ui_path,
            flows: flows_path,
        },
        registry_url: args.registry_url.clone(),
    };
    let path = config::write_config(&root, &new_config)?;

    printer.success(&format!("Wrote {}", path.display()));
    printer.json(&json!({
        "success": true,
        "path": path.display().to_string(),
    }))?;
    Ok(())
}
