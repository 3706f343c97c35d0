use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use crate::cli::PullArgs;
use crate::config::{self, ProjectConfig};
use crate::error::{CliError, ItemKind};
use crate::install::{self, InstallItem, InstallOutcome};
use crate::output::Printer;
use crate::prompt;
use crate::registry::{
    ComponentMeta, DEFAULT_REGISTRY_URL, FlowMeta, REGISTRY_PACKAGE, RegistryClient,
};
use crate::util::chunked;
use crate::validate::validate_item_name;

/// Items per progress batch when installing several at once.
const BATCH_SIZE: usize = 10;

pub fn run(args: &PullArgs, printer: &Printer) -> Result<()> {
    let root = std::env::current_dir().context("failed to resolve the project root")?;
    let project_config = config::require_config(&root)?;
    let kind: ItemKind = args.item_type.into();
    // Names become path segments and request parameters, so the strict
    // check runs before the registry is ever contacted.
    validate_requested_items(&args.items, kind)?;
    let registry_url = resolve_registry_url(args, &project_config);
    let client = RegistryClient::new(&registry_url)?;

    let plan = match kind {
        ItemKind::Component => {
            let components = matching_components(&client, &project_config)?;
            if args.list {
                return render_component_list(&components, printer);
            }
            plan_components(args, &components, printer)?
        }
        ItemKind::Flow => {
            let flows = client.fetch_flows()?;
            if args.list {
                return render_flow_list(&flows, printer);
            }
            plan_flows(args, &flows)?
        }
    };

    let dest_base = match kind {
        ItemKind::Component => root.join(&project_config.paths.ui),
        ItemKind::Flow => root.join(&project_config.paths.flows),
    };
    let plan = confirm_overwrites(plan, &dest_base, args, printer)?;
    if plan.is_empty() {
        printer.info("Nothing to install.");
        printer.json(&json!({ "success": true, "installed": [], "dryRun": args.dry_run }))?;
        return Ok(());
    }

    // Items are installed one at a time in selection order, batched only
    // for progress rendering. A failure stops the run; what finished before
    // it is reported so the consumer knows where the run got to.
    let mut installed: Vec<serde_json::Value> = Vec::new();
    let mut would_write: Vec<String> = Vec::new();
    for batch in chunked(plan, BATCH_SIZE) {
        for item in batch {
            let outcome = install::install_item(
                &client,
                REGISTRY_PACKAGE,
                &item,
                &dest_base,
                args.with_tests,
                args.dry_run,
            );
            match outcome {
                Ok(InstallOutcome::DryRun(paths)) => {
                    for path in &paths {
                        printer.line(&format!("  would write {path}"));
                    }
                    would_write.extend(paths);
                }
                Ok(InstallOutcome::Installed { dest, files }) => {
                    printer.success(&format!(
                        "installed {item} → {} ({files} files)",
                        dest.display()
                    ));
                    installed.push(json!({
                        "name": item.to_string(),
                        "dest": dest.display().to_string(),
                        "files": files,
                    }));
                }
                Err(err) => {
                    if !installed.is_empty() {
                        printer.warn(&format!(
                            "{} item(s) were installed before the failure",
                            installed.len()
                        ));
                    }
                    return Err(err);
                }
            }
        }
    }

    if args.dry_run {
        printer.info("Dry run; nothing was written.");
    }
    printer.json(&json!({
        "success": true,
        "dryRun": args.dry_run,
        "installed": installed,
        "wouldWrite": would_write,
    }))?;
    Ok(())
}

fn validate_requested_items(items: &[String], kind: ItemKind) -> Result<()> {
    for item in items {
        match kind {
            ItemKind::Component => validate_item_name(item)?,
            ItemKind::Flow => {
                let Some((flow_type, variant)) = item.split_once('/') else {
                    return Err(CliError::Validation(format!(
                        "invalid flow `{item}`: expected `type/variant`, e.g. `auth/classic`"
                    ))
                    .into());
                };
                validate_item_name(flow_type)?;
                validate_item_name(variant)?;
            }
        }
    }
    Ok(())
}

fn resolve_registry_url(args: &PullArgs, project_config: &ProjectConfig) -> String {
    args.registry_url
        .clone()
        .or_else(|| std::env::var("LEAFKIT_REGISTRY_URL").ok())
        .or_else(|| project_config.registry_url.clone())
        .unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string())
}

/// Components from the registry that match this project's platform and
/// styling library.
fn matching_components(
    client: &RegistryClient,
    project_config: &ProjectConfig,
) -> Result<Vec<ComponentMeta>> {
    let components = client.fetch_components()?;
    Ok(components
        .into_iter()
        .filter(|meta| meta.project == project_config.project && meta.lib == project_config.lib)
        .collect())
}

fn plan_components(
    args: &PullArgs,
    available: &[ComponentMeta],
    printer: &Printer,
) -> Result<Vec<InstallItem>> {
    let requested = if args.items.is_empty() {
        if args.yes || printer.is_json() {
            return Err(CliError::Validation(
                "no items given; pass component names or use --list".to_string(),
            )
            .into());
        }
        let labels: Vec<String> = available
            .iter()
            .map(|meta| meta.component_name.clone())
            .collect();
        let picked = prompt::multi_select("Select components to install", &labels)?;
        picked
            .into_iter()
            .map(|index| available[index].name.clone())
            .collect()
    } else {
        args.items.clone()
    };

    for name in &requested {
        validate_item_name(name)?;
    }
    let names = resolve_dependency_closure(&requested, available)?;
    Ok(names
        .into_iter()
        .map(|name| InstallItem::Component { name })
        .collect())
}

/// Expand the requested components with their registry-declared
/// dependencies, depth first, deduplicated, selection order preserved.
fn resolve_dependency_closure(
    requested: &[String],
    available: &[ComponentMeta],
) -> Result<Vec<String>> {
    let by_name: HashMap<&str, &ComponentMeta> = available
        .iter()
        .map(|meta| (meta.name.as_str(), meta))
        .collect();
    let mut ordered = Vec::new();
    let mut seen = HashSet::new();
    for name in requested {
        push_with_dependencies(name, &by_name, &mut ordered, &mut seen)?;
    }
    Ok(ordered)
}

fn push_with_dependencies(
    name: &str,
    by_name: &HashMap<&str, &ComponentMeta>,
    ordered: &mut Vec<String>,
    seen: &mut HashSet<String>,
) -> Result<()> {
    if !seen.insert(name.to_string()) {
        return Ok(());
    }
    let meta = by_name.get(name).ok_or_else(|| CliError::ItemNotFound {
        kind: ItemKind::Component,
        name: name.to_string(),
    })?;
    ordered.push(name.to_string());
    for dep in &meta.dependencies {
        // Registry-supplied names go through the same strict check as user
        // input before they can become path segments.
        validate_item_name(dep)?;
        push_with_dependencies(dep, by_name, ordered, seen)?;
    }
    Ok(())
}

fn plan_flows(args: &PullArgs, available: &[FlowMeta]) -> Result<Vec<InstallItem>> {
    if args.items.is_empty() {
        return Err(CliError::Validation(
            "no items given; flows are written as `type/variant`, or use --list".to_string(),
        )
        .into());
    }
    let mut plan = Vec::new();
    for item in &args.items {
        let Some((flow_type, variant)) = item.split_once('/') else {
            return Err(CliError::Validation(format!(
                "invalid flow `{item}`: expected `type/variant`, e.g. `auth/classic`"
            ))
            .into());
        };
        validate_item_name(flow_type)?;
        validate_item_name(variant)?;
        let known = available
            .iter()
            .any(|meta| meta.flow_type == flow_type && meta.variant == variant);
        if !known {
            return Err(CliError::ItemNotFound {
                kind: ItemKind::Flow,
                name: item.clone(),
            }
            .into());
        }
        plan.push(InstallItem::Flow {
            flow_type: flow_type.to_string(),
            variant: variant.to_string(),
        });
    }
    Ok(plan)
}

/// Drop or keep planned items whose destination already exists. Overwrite
/// must be authorized before the commit step ever runs: `--overwrite` and
/// `--yes` authorize it outright, the interactive prompt asks, and JSON
/// mode refuses rather than guess.
fn confirm_overwrites(
    plan: Vec<InstallItem>,
    dest_base: &Path,
    args: &PullArgs,
    printer: &Printer,
) -> Result<Vec<InstallItem>> {
    if args.overwrite || args.yes || args.dry_run {
        return Ok(plan);
    }
    let mut kept = Vec::new();
    for item in plan {
        let dest = dest_base.join(item.label());
        if !dest.exists() {
            kept.push(item);
            continue;
        }
        if printer.is_json() {
            return Err(CliError::Validation(format!(
                "{} already exists; pass --overwrite or --yes",
                dest.display()
            ))
            .into());
        }
        if prompt::confirm(&format!("Replace existing {}?", dest.display()), false)? {
            kept.push(item);
        } else {
            printer.warn(&format!("skipped {item}"));
        }
    }
    Ok(kept)
}

fn render_component_list(components: &[ComponentMeta], printer: &Printer) -> Result<()> {
    for meta in components {
        let description = meta.description.as_deref().unwrap_or("");
        printer.line(&format!(
            "{:<20} {:<20} {description}",
            meta.name, meta.component_name
        ));
    }
    printer.json(&json!({
        "success": true,
        "components": components
            .iter()
            .map(|meta| json!({
                "name": meta.name,
                "componentName": meta.component_name,
                "description": meta.description,
                "dependencies": meta.dependencies,
            }))
            .collect::<Vec<_>>(),
    }))?;
    Ok(())
}

fn render_flow_list(flows: &[FlowMeta], printer: &Printer) -> Result<()> {
    for meta in flows {
        let description = meta.description.as_deref().unwrap_or("");
        printer.line(&format!(
            "{:<24} {:<20} {description}",
            format!("{}/{}", meta.flow_type, meta.variant),
            meta.component_name
        ));
    }
    printer.json(&json!({
        "success": true,
        "flows": flows
            .iter()
            .map(|meta| json!({
                "type": meta.flow_type,
                "variant": meta.variant,
                "componentName": meta.component_name,
                "entryPoint": meta.entry_point,
            }))
            .collect::<Vec<_>>(),
    }))?;
    Ok(())
}
