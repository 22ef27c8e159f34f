use std::io::{BufRead, Stdout, StdinLock, Write};

use dockflow_core::{Confirm, UserDecision, WorkflowArtifact};
use tracing::{debug, warn};

use crate::styles as s;

/// Asks on `output` and reads a single line from `input`.
///
/// Anything but `y` declines, including EOF and read errors.
pub struct PromptConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, artifact: &WorkflowArtifact) -> std::io::Result<String> {
        writeln!(
            self.output,
            "Created workflow at {}{}{:#}",
            s::PATH,
            artifact.path.display(),
            s::PATH
        )?;
        write!(self.output, "commit & push? (y/n): ")?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            debug!("prompt input closed");
        }
        Ok(answer)
    }
}

impl PromptConfirm<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm_commit(&mut self, artifact: &WorkflowArtifact) -> UserDecision {
        match self.ask(artifact) {
            Ok(answer) => UserDecision::from_answer(&answer),
            Err(e) => {
                warn!("failed to read answer, treating as no: {}", e);
                UserDecision::Skip
            }
        }
    }
}

/// Accepts without asking (`--yes`).
#[derive(Debug, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm_commit(&mut self, artifact: &WorkflowArtifact) -> UserDecision {
        println!(
            "Created workflow at {}{}{:#}, committing (--yes)",
            s::PATH,
            artifact.path.display(),
            s::PATH
        );
        UserDecision::Commit
    }
}
