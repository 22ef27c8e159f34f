use anyhow::{anyhow, Context, Result};
use tracing::{debug, instrument};

use dockflow_core::{WorkflowArtifact, WorkflowVariant};

mod templates;
pub mod workflow;

pub use workflow::{Job, Step, Workflow};

/// Builds the typed workflow for `variant`.
pub fn workflow_for(variant: WorkflowVariant) -> Workflow {
    templates::workflow_for(variant)
}

#[instrument]
pub fn render_variant(variant: WorkflowVariant) -> Result<String> {
    debug!("rendering {} workflow", variant);
    let workflow = workflow_for(variant);
    workflow
        .validate()
        .with_context(|| format!("{variant} workflow template is invalid"))?;
    Ok(workflow.render())
}

/// The file a variant writes, ready to hand to the provisioner.
pub fn artifact(variant: WorkflowVariant) -> Result<WorkflowArtifact> {
    Ok(WorkflowArtifact {
        path: variant.workflow_path(),
        content: render_variant(variant)?,
    })
}

/// Compares an on-disk workflow with what `variant` would write.
pub fn check_workflow(variant: WorkflowVariant, workflow: &str) -> Result<()> {
    let expected = workflow_for(variant);

    let mut issues = Vec::new();

    if !workflow.contains(&format!("name: {}", expected.name)) {
        issues.push(format!("missing workflow name '{}'", expected.name));
    }
    for step in expected.steps() {
        if !workflow.contains(&format!("- name: {}", step.name)) {
            issues.push(format!("missing step '{}'", step.name));
        }
    }
    if issues.is_empty() && workflow != expected.render() {
        issues.push(format!("content differs from the {variant} template"));
    }

    if issues.is_empty() {
        return Ok(());
    }

    Err(anyhow!(
        "workflow check failed:\n- {}",
        issues.join("\n- ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENERIC: &str = include_str!("../resources/gen-dockerfile.yml");
    const STATIC_SITE: &str = include_str!("../resources/gen-static-dockerfile.yml");

    #[test]
    fn generic_variant_matches_fixture() {
        let out = render_variant(WorkflowVariant::Generic).expect("render should pass");
        assert_eq!(out, GENERIC);
    }

    #[test]
    fn static_site_variant_matches_fixture() {
        let out = render_variant(WorkflowVariant::StaticSite).expect("render should pass");
        assert_eq!(out, STATIC_SITE);
    }

    #[test]
    fn rendering_is_stable() {
        let first = render_variant(WorkflowVariant::Generic).expect("render should pass");
        let second = render_variant(WorkflowVariant::Generic).expect("render should pass");
        assert_eq!(first, second);
    }

    #[test]
    fn artifact_targets_variant_path() {
        let artifact = artifact(WorkflowVariant::StaticSite).expect("artifact should build");
        assert_eq!(artifact.path, WorkflowVariant::StaticSite.workflow_path());
        assert_eq!(artifact.content, STATIC_SITE);
    }

    #[test]
    fn check_passes_for_rendered_output() {
        for variant in WorkflowVariant::ALL {
            let out = render_variant(variant).expect("render should pass");
            check_workflow(variant, &out).expect("rendered output should validate");
        }
    }

    #[test]
    fn check_fails_when_step_missing() {
        let broken = "name: Build & Release Docker Image\n\njobs:\n  build-and-release:\n";
        let err = check_workflow(WorkflowVariant::Generic, broken).expect_err("must fail");
        assert!(err.to_string().contains("missing step 'Create Git tag'"));
    }

    #[test]
    fn check_reports_drift_against_other_variant() {
        let err = check_workflow(WorkflowVariant::StaticSite, GENERIC).expect_err("must fail");
        assert!(err
            .to_string()
            .contains("missing workflow name 'Build & Release Static Site Image'"));
    }

    #[test]
    fn check_reports_edited_content() {
        let edited = GENERIC.replace("ubuntu-latest", "ubuntu-22.04");
        let err = check_workflow(WorkflowVariant::Generic, &edited).expect_err("must fail");
        assert!(err
            .to_string()
            .contains("content differs from the generic template"));
    }
}
