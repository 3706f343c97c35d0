use anyhow::Result;

use crate::error::CliError;

/// Item names become filesystem path segments during install, so the rule is
/// a strict allow-list: lowercase letters, digits, hyphen, underscore.
/// Callers must run this before any path join or request using the name.
pub fn validate_item_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CliError::Validation("item name must not be empty".to_string()).into());
    }
    let ok = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if !ok {
        return Err(CliError::Validation(format!(
            "invalid item name `{name}`: only lowercase letters, digits, `-` and `_` are allowed"
        ))
        .into());
    }
    Ok(())
}

/// Install paths are supplied by the consumer for their own project layout,
/// so this stays deliberately loose: non-empty and no embedded NUL.
pub fn validate_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(CliError::Validation("path must not be empty".to_string()).into());
    }
    if path.contains('\0') {
        return Err(CliError::Validation("path must not contain NUL bytes".to_string()).into());
    }
    Ok(())
}
