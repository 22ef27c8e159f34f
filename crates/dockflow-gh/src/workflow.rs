//! A small typed model of a GitHub Actions workflow.
//!
//! Only the shape Dockflow emits is modelled: a push trigger on a set of
//! branches, flat permissions, and jobs made of `uses` or `run` steps.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use anyhow::{anyhow, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    pub name: String,
    pub branches: Vec<String>,
    pub permissions: Vec<(String, String)>,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub runs_on: String,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub id: Option<String>,
    pub uses: Option<String>,
    pub with: Vec<(String, String)>,
    pub run: Option<String>,
    pub env: Vec<(String, String)>,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            branches: Vec::new(),
            permissions: Vec::new(),
            jobs: Vec::new(),
        }
    }

    pub fn on_push(mut self, branch: impl Into<String>) -> Self {
        self.branches.push(branch.into());
        self
    }

    pub fn permission(mut self, scope: impl Into<String>, level: impl Into<String>) -> Self {
        self.permissions.push((scope.into(), level.into()));
        self
    }

    pub fn job(mut self, job: Job) -> Self {
        self.jobs.push(job);
        self
    }

    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.jobs.iter().flat_map(|job| job.steps.iter())
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Structural checks GitHub would otherwise only report at run time.
    pub fn validate(&self) -> Result<()> {
        let mut issues = Vec::new();

        if self.name.trim().is_empty() {
            issues.push("workflow name is empty".to_string());
        }
        if self.branches.is_empty() {
            issues.push("no push branches configured".to_string());
        }
        if self.jobs.is_empty() {
            issues.push("workflow has no jobs".to_string());
        }

        let mut job_ids = HashSet::new();
        for job in &self.jobs {
            if !job_ids.insert(job.id.as_str()) {
                issues.push(format!("duplicate job id '{}'", job.id));
            }
            if job.steps.is_empty() {
                issues.push(format!("job '{}' has no steps", job.id));
            }

            let mut step_ids = HashSet::new();
            for step in &job.steps {
                if step.name.trim().is_empty() {
                    issues.push(format!("job '{}' has a step without a name", job.id));
                }
                if let Some(id) = &step.id {
                    if !step_ids.insert(id.as_str()) {
                        issues.push(format!("duplicate step id '{}' in job '{}'", id, job.id));
                    }
                }
                match (&step.uses, &step.run) {
                    (Some(_), Some(_)) => issues.push(format!(
                        "step '{}' sets both 'uses' and 'run'",
                        step.name
                    )),
                    (None, None) => issues.push(format!(
                        "step '{}' needs either 'uses' or 'run'",
                        step.name
                    )),
                    _ => {}
                }
                if step.uses.is_none() && !step.with.is_empty() {
                    issues.push(format!("step '{}' has 'with' but no 'uses'", step.name));
                }
            }
        }

        if issues.is_empty() {
            return Ok(());
        }

        Err(anyhow!(
            "invalid workflow '{}':\n- {}",
            self.name,
            issues.join("\n- ")
        ))
    }
}

impl Job {
    pub fn new(id: impl Into<String>, runs_on: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            runs_on: runs_on.into(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }
}

impl Step {
    fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            uses: None,
            with: Vec::new(),
            run: None,
            env: Vec::new(),
        }
    }

    /// A step that runs a published action.
    pub fn action(name: impl Into<String>, uses: impl Into<String>) -> Self {
        Self {
            uses: Some(uses.into()),
            ..Self::named(name)
        }
    }

    /// A step that runs a shell script. Lines are joined with `\n`.
    pub fn script<I, S>(name: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        Self {
            run: Some(lines.join("\n")),
            ..Self::named(name)
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with.push((key.into(), value.into()));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

impl Display for Workflow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "name: {}", self.name)?;
        writeln!(f)?;
        writeln!(f, "on:")?;
        writeln!(f, "  push:")?;
        writeln!(f, "    branches:")?;
        for branch in &self.branches {
            writeln!(f, "      - {branch}")?;
        }

        if !self.permissions.is_empty() {
            writeln!(f)?;
            writeln!(f, "permissions:")?;
            for (scope, level) in &self.permissions {
                writeln!(f, "  {scope}: {level}")?;
            }
        }

        writeln!(f)?;
        writeln!(f, "jobs:")?;
        for (index, job) in self.jobs.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{job}")?;
        }
        Ok(())
    }
}

impl Display for Job {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "  {}:", self.id)?;
        writeln!(f, "    runs-on: {}", self.runs_on)?;
        writeln!(f)?;
        writeln!(f, "    steps:")?;
        for (index, step) in self.steps.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "      - name: {}", self.name)?;
        if let Some(id) = &self.id {
            writeln!(f, "        id: {id}")?;
        }
        if let Some(uses) = &self.uses {
            writeln!(f, "        uses: {uses}")?;
        }
        write_map(f, "with", &self.with)?;
        if let Some(run) = &self.run {
            writeln!(f, "        run: |")?;
            for line in run.lines() {
                if line.is_empty() {
                    writeln!(f)?;
                } else {
                    writeln!(f, "          {line}")?;
                }
            }
        }
        write_map(f, "env", &self.env)
    }
}

fn write_map(f: &mut Formatter<'_>, key: &str, entries: &[(String, String)]) -> std::fmt::Result {
    if entries.is_empty() {
        return Ok(());
    }
    writeln!(f, "        {key}:")?;
    for (name, value) in entries {
        writeln!(f, "          {name}: {value}")?;
    }
    Ok(())
}
