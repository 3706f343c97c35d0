use anyhow::Result;
use console::style;
use serde_json::json;

use crate::error;

/// Output mode, decided once from the CLI flags and threaded through the
/// command layer as a value. Renderers never consult global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

#[derive(Debug, Clone, Copy)]
pub struct Printer {
    mode: OutputMode,
    verbose: bool,
}

impl Printer {
    pub fn new(mode: OutputMode, verbose: bool) -> Self {
        Self { mode, verbose }
    }

    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Success line; suppressed in JSON mode.
    pub fn success(&self, msg: &str) {
        if self.mode == OutputMode::Human {
            println!("{} {}", style("✓").green().bold(), msg);
        }
    }

    pub fn info(&self, msg: &str) {
        if self.mode == OutputMode::Human {
            println!("{} {}", style("ℹ").blue().bold(), msg);
        }
    }

    pub fn warn(&self, msg: &str) {
        if self.mode == OutputMode::Human {
            eprintln!("{} {}", style("⚠").yellow().bold(), msg);
        }
    }

    /// Plain line (lists, dry-run paths); suppressed in JSON mode.
    pub fn line(&self, msg: &str) {
        if self.mode == OutputMode::Human {
            println!("{msg}");
        }
    }

    /// Emit the single JSON result object for this invocation. No-op in
    /// human mode so commands can call it unconditionally.
    pub fn json(&self, value: &serde_json::Value) -> Result<()> {
        if self.mode == OutputMode::Json {
            println!("{}", serde_json::to_string(value)?);
        }
        Ok(())
    }
}

/// Render a failure and return the process exit code. JSON mode emits one
/// object on stdout; human mode prints a colored line on stderr, plus the
/// full cause chain under `--verbose`.
pub fn render_error(printer: &Printer, err: &anyhow::Error) -> i32 {
    let (code, exit) = error::classify(err);
    if printer.is_json() {
        let body = json!({
            "success": false,
            "error": { "code": code, "message": err.to_string() },
        });
        match serde_json::to_string(&body) {
            Ok(rendered) => println!("{rendered}"),
            Err(_) => println!(
                "{{\"success\":false,\"error\":{{\"code\":\"GENERAL_ERROR\",\"message\":\"failed to render error\"}}}}"
            ),
        }
    } else {
        eprintln!("{} {}", style("✗").red().bold(), err);
        if printer.verbose() {
            for cause in err.chain().skip(1) {
                eprintln!("  {} {}", style("caused by:").dim(), cause);
            }
        }
    }
    exit
}
