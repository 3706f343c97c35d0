use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{ProjectType, StyleLib};
use crate::error::ItemKind;

#[derive(Parser, Debug)]
#[command(name = "leafkit")]
#[command(version)]
#[command(about = "Leafkit UI kit CLI: pull components and flows into your project")]
pub struct Cli {
    /// Emit a single machine-readable JSON object instead of human output
    #[arg(long, global = true)]
    pub json: bool,
    /// Verbose diagnostics (full error chains, tracing output)
    #[arg(long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create leafkit.toml for this project
    Init(InitArgs),
    /// Install components or flows from the registry, or list what is available
    Pull(PullArgs),
    /// Scaffold files from a built-in template
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Target platform
    #[arg(long = "project-type", value_enum)]
    pub project_type: Option<ProjectTypeArg>,
    /// Styling library
    #[arg(long = "lib", value_enum)]
    pub lib: Option<StyleLibArg>,
    /// Install path for components (relative to the project root)
    #[arg(long = "component-path")]
    pub component_path: Option<String>,
    /// Install path for flows (relative to the project root)
    #[arg(long = "flow-path")]
    pub flow_path: Option<String>,
    /// Registry base URL override persisted in the config
    #[arg(long = "registry-url")]
    pub registry_url: Option<String>,
    /// Replace an existing leafkit.toml
    #[arg(long)]
    pub overwrite: bool,
    /// Accept defaults for anything not passed as a flag
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct PullArgs {
    /// Component names, or flow `type/variant` pairs with `--type flow`
    #[arg(value_name = "ITEM")]
    pub items: Vec<String>,
    /// What kind of item to pull
    #[arg(long = "type", value_enum, default_value = "component")]
    pub item_type: ItemTypeArg,
    /// Replace existing installs without asking
    #[arg(long)]
    pub overwrite: bool,
    /// Report what would be written without touching the project
    #[arg(long = "dry-run")]
    pub dry_run: bool,
    /// List available items instead of installing
    #[arg(long)]
    pub list: bool,
    /// Also install the registry's test files
    #[arg(long = "with-tests")]
    pub with_tests: bool,
    /// Skip interactive prompts, assuming yes
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,
    /// Registry base URL override for this invocation
    #[arg(long = "registry-url")]
    pub registry_url: Option<String>,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Template to render
    #[arg(value_enum)]
    pub template: TemplateArg,
    /// Name for the generated item (strict allow-list, becomes a directory)
    #[arg(long)]
    pub name: String,
    /// Output base path; defaults to the configured install path
    #[arg(long)]
    pub output: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ProjectTypeArg {
    Expo,
    #[value(name = "react-native-cli")]
    ReactNativeCli,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum StyleLibArg {
    Stylesheet,
    Nativewind,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ItemTypeArg {
    Component,
    Flow,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum TemplateArg {
    Component,
    Screen,
}

impl From<ProjectTypeArg> for ProjectType {
    fn from(value: ProjectTypeArg) -> Self {
        match value {
            ProjectTypeArg::Expo => ProjectType::Expo,
            ProjectTypeArg::ReactNativeCli => ProjectType::ReactNativeCli,
        }
    }
}

impl From<StyleLibArg> for StyleLib {
    fn from(value: StyleLibArg) -> Self {
        match value {
            StyleLibArg::Stylesheet => StyleLib::Stylesheet,
            StyleLibArg::Nativewind => StyleLib::Nativewind,
        }
    }
}

impl From<ItemTypeArg> for ItemKind {
    fn from(value: ItemTypeArg) -> Self {
        match value {
            ItemTypeArg::Component => ItemKind::Component,
            ItemTypeArg::Flow => ItemKind::Flow,
        }
    }
}
