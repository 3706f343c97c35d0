use thiserror::Error;

/// Kind of installable registry item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Component,
    Flow,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Component => write!(f, "component"),
            ItemKind::Flow => write!(f, "flow"),
        }
    }
}

/// The single CLI error taxonomy. Library modules construct these where the
/// failure needs a distinct exit code; everything else travels as a plain
/// `anyhow::Error` and is rendered as a general error by `main`.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("no leafkit.toml found in this project; run `leafkit init` first")]
    ConfigNotFound,

    #[error("leafkit.toml already exists at {path}; pass --overwrite to replace it")]
    ConfigExists { path: String },

    #[error("{kind} `{name}` was not found in the registry")]
    ItemNotFound { kind: ItemKind, name: String },

    #[error("the registry refused the request ({status}); set LEAFKIT_TOKEN or check your access")]
    AuthRequired { status: String },

    #[error("{0}")]
    Validation(String),
}

impl CliError {
    /// Machine-readable code rendered in JSON error output.
    pub fn code(&self) -> &'static str {
        match self {
            CliError::ConfigNotFound => "CONFIG_NOT_FOUND",
            CliError::ConfigExists { .. } => "CONFIG_EXISTS",
            CliError::ItemNotFound {
                kind: ItemKind::Component,
                ..
            } => "COMPONENT_NOT_FOUND",
            CliError::ItemNotFound {
                kind: ItemKind::Flow,
                ..
            } => "FLOW_NOT_FOUND",
            CliError::AuthRequired { .. } => "AUTH_REQUIRED",
            CliError::Validation(_) => "VALIDATION_ERROR",
        }
    }

    /// Process exit code for this error class.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::ConfigNotFound => 2,
            CliError::ConfigExists { .. } => 3,
            CliError::ItemNotFound { .. } => 4,
            CliError::AuthRequired { .. } => 5,
            CliError::Validation(_) => 6,
        }
    }
}

/// Classify an error chain: a `CliError` anywhere in the chain keeps its code
/// and exit code, anything else is a general error.
pub fn classify(err: &anyhow::Error) -> (&'static str, i32) {
    for cause in err.chain() {
        if let Some(cli) = cause.downcast_ref::<CliError>() {
            return (cli.code(), cli.exit_code());
        }
    }
    ("GENERAL_ERROR", 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_the_documented_convention() {
        assert_eq!(CliError::ConfigNotFound.exit_code(), 2);
        assert_eq!(
            CliError::ConfigExists {
                path: "leafkit.toml".into()
            }
            .exit_code(),
            3
        );
        assert_eq!(
            CliError::ItemNotFound {
                kind: ItemKind::Component,
                name: "button".into()
            }
            .exit_code(),
            4
        );
        assert_eq!(
            CliError::AuthRequired {
                status: "401 Unauthorized".into()
            }
            .exit_code(),
            5
        );
        assert_eq!(CliError::Validation("bad name".into()).exit_code(), 6);
    }

    #[test]
    fn item_not_found_code_depends_on_kind() {
        let component = CliError::ItemNotFound {
            kind: ItemKind::Component,
            name: "button".into(),
        };
        let flow = CliError::ItemNotFound {
            kind: ItemKind::Flow,
            name: "auth/classic".into(),
        };
        assert_eq!(component.code(), "COMPONENT_NOT_FOUND");
        assert_eq!(flow.code(), "FLOW_NOT_FOUND");
    }

    #[test]
    fn classify_sees_through_context_wrapping() {
        use anyhow::Context;

        let err: anyhow::Error = Err::<(), _>(CliError::ConfigNotFound)
            .context("while reading project configuration")
            .unwrap_err();
        assert_eq!(classify(&err), ("CONFIG_NOT_FOUND", 2));

        let plain = anyhow::anyhow!("disk full");
        assert_eq!(classify(&plain), ("GENERAL_ERROR", 1));
    }
}
