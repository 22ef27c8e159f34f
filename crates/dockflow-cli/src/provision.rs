use std::fs;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use dockflow_core::{
    Confirm, DockflowConfig, ProcessGit, ProvisionError, ProvisionOutcome, WorkflowArtifact,
    WorkflowProvisioner, WorkflowVariant,
};

use crate::prompt::{AssumeYes, PromptConfirm};
use crate::styles as s;
use crate::Cli;

/// Runs Dockflow against the repository at `cli.dir`.
#[instrument(skip(cli))]
pub fn run(cli: &Cli) -> Result<()> {
    let cfg = load_config(cli)?;
    let variant = resolve_variant(cli, &cfg);
    let artifact = dockflow_gh::artifact(variant)?;

    if cli.stdout {
        print!("{}", artifact.content);
        return Ok(());
    }

    if cli.check {
        return check(cli, variant, &artifact);
    }

    println!(
        "{}Dockerfile & Docker image generator via GitHub Actions{:#} ({})",
        s::BANNER,
        s::BANNER,
        variant
    );

    let provisioner = WorkflowProvisioner::new(cli.dir.clone(), ProcessGit::new(), artifact)
        .with_remote(cfg.git.remote)
        .with_commit_message(cfg.git.commit_message);

    let mut confirm: Box<dyn Confirm> = if cli.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(PromptConfirm::stdio())
    };

    let report = provisioner.run(confirm.as_mut())?;
    info!(
        "provision complete: variant={}, outcome={:?}",
        variant, report.outcome
    );

    println!("GitHub repository: {}{}{:#}", s::PATH, report.remote_url, s::PATH);
    match report.outcome {
        ProvisionOutcome::AlreadyPresent => println!(
            "{}workflow already exists at {}, nothing to do{:#}",
            s::SUCCESS,
            report.path.display(),
            s::SUCCESS
        ),
        ProvisionOutcome::Committed => {
            println!("{}workflow committed and pushed{:#}", s::SUCCESS, s::SUCCESS);
            println!(
                "{}GitHub Actions will generate the Dockerfile, build and tag the image, and publish a release. Check the Releases tab once it finishes.{:#}",
                s::HINT,
                s::HINT
            );
        }
        ProvisionOutcome::LeftUncommitted => println!(
            "{}skipped commit{:#}: {} is ready to commit and push manually",
            s::WARN,
            s::WARN,
            report.path.display()
        ),
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<DockflowConfig> {
    let path = cli.dir.join(&cli.config);
    DockflowConfig::load_or_default(&path)
        .with_context(|| format!("unable to load config '{}'", path.display()))
}

/// The `--variant` flag wins over the config file.
fn resolve_variant(cli: &Cli, cfg: &DockflowConfig) -> WorkflowVariant {
    cli.variant.unwrap_or(cfg.workflow.variant)
}

fn check(cli: &Cli, variant: WorkflowVariant, artifact: &WorkflowArtifact) -> Result<()> {
    let path = cli.dir.join(&artifact.path);
    let actual =
        fs::read_to_string(&path).with_context(|| format!("failed to read '{}'", path.display()))?;
    dockflow_gh::check_workflow(variant, &actual).with_context(|| {
        format!(
            "workflow drift detected in '{}': remove it and re-run dockflow to regenerate",
            artifact.path.display()
        )
    })?;
    println!("{}check passed{:#}: {}", s::SUCCESS, s::SUCCESS, artifact.path.display());
    Ok(())
}

/// Operator guidance for the environment failures.
pub fn hint(err: &anyhow::Error) -> Option<&'static str> {
    match err.downcast_ref::<ProvisionError>()? {
        ProvisionError::NotARepository { .. } => Some(
            "Navigate to your GitHub project folder or initialize the repository and try again.",
        ),
        ProvisionError::NoGithubRemote { .. } => Some(
            "Make sure the repository is connected to GitHub, e.g. `git remote add origin https://github.com/<owner>/<repo>.git`.",
        ),
        _ => None,
    }
}
