use std::process;

use clap::Parser;

use leafkit::cli::{Cli, Command};
use leafkit::cmd;
use leafkit::output::{self, OutputMode, Printer};

fn main() {
    let cli = Cli::parse();
    let mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    let printer = Printer::new(mode, cli.verbose);
    if cli.verbose {
        let _ = tracing_subscriber::fmt::try_init();
    }

    let result = match cli.command {
        Command::Init(args) => cmd::init::run(&args, &printer),
        Command::Pull(args) => cmd::pull::run(&args, &printer),
        Command::Generate(args) => cmd::generate::run(&args, &printer),
    };
    if let Err(err) = result {
        process::exit(output::render_error(&printer, &err));
    }
}
