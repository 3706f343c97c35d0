use anyhow::{Context, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, MultiSelect, Select};

pub fn confirm(message: &str, default: bool) -> Result<bool> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(message)
        .default(default)
        .interact()
        .context("confirmation prompt failed")
}

pub fn multi_select(message: &str, options: &[String]) -> Result<Vec<usize>> {
    MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt(message)
        .items(options)
        .interact()
        .context("selection prompt failed")
}

pub fn select(message: &str, options: &[&str], default: usize) -> Result<usize> {
    Select::with_theme(&ColorfulTheme::default())
        .with_prompt(message)
        .items(options)
        .default(default)
        .interact()
        .context("selection prompt failed")
}

pub fn input(message: &str, default: &str) -> Result<String> {
    Input::with_theme(&ColorfulTheme::default())
        .with_prompt(message)
        .default(default.to_string())
        .interact_text()
        .context("input prompt failed")
}
