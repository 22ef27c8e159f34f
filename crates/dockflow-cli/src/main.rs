use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use dockflow_core::constants::CONFIG_FILE;
use dockflow_core::WorkflowVariant;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod prompt;
mod provision;
mod styles;

use styles as s;

/// The command-line interface for Dockflow.
#[derive(Debug, Parser)]
#[command(name = "dockflow")]
#[command(version)]
#[command(styles = s::get_clap_styles())]
#[command(
    help_template = "{bin} {version}\n\n{about-with-newline}{usage-heading} {usage}\n\n{all-args}{after-help}"
)]
#[command(about = "Add a Docker image build & release workflow to a GitHub repository")]
#[command(
    long_about = "Dockflow checks that the current directory is a Git repository with a GitHub
`origin` remote, writes a GitHub Actions workflow that generates a Dockerfile,
builds and tags the image and publishes it as a release, then offers to commit
and push the new file.

An existing workflow file is never overwritten."
)]
#[command(
    after_help = "\x1b[1;32mExamples:\x1b[0m\n  \x1b[36mdockflow\x1b[0m                        \x1b[2m# Provision the generic workflow\x1b[0m\n  \x1b[36mdockflow --variant static-site\x1b[0m   \x1b[2m# Serve the repository with nginx instead\x1b[0m\n  \x1b[36mdockflow --stdout\x1b[0m               \x1b[2m# Print the workflow without writing it\x1b[0m\n  \x1b[36mdockflow --check\x1b[0m                \x1b[2m# Verify an existing workflow has not drifted\x1b[0m"
)]
pub(crate) struct Cli {
    /// Workflow variant: `generic` or `static-site`. Overrides the config file.
    #[arg(long)]
    variant: Option<WorkflowVariant>,
    /// Repository directory to operate in.
    #[arg(short = 'C', long, default_value = ".")]
    dir: PathBuf,
    /// Path to the optional dockflow config file, relative to `--dir`.
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,
    /// Print the workflow to stdout instead of writing it.
    #[arg(long, default_value_t = false, conflicts_with = "check")]
    stdout: bool,
    /// Compare an existing workflow file against the template; never writes.
    #[arg(long, default_value_t = false)]
    check: bool,
    /// Commit and push without asking.
    #[arg(short = 'y', long, default_value_t = false)]
    yes: bool,
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    debug!("parsed cli arguments: {:?}", cli);

    if let Err(err) = execute(&cli) {
        report_error(&err);
        std::process::exit(1);
    }
}

fn execute(cli: &Cli) -> Result<()> {
    provision::run(cli)
}

fn report_error(err: &anyhow::Error) {
    eprintln!("{}error:{:#} {:#}", s::ERROR, s::ERROR, err);
    if let Some(hint) = provision::hint(err) {
        eprintln!("{}{}{:#}", s::HINT, hint, s::HINT);
    }
}
