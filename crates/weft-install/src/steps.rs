use std::io::Write;

use crate::error::{InstallError, Result};

/// Numbered progress lines for a fixed sequence of steps.
///
/// Steps are registered up front so each line can show `n/total`.
pub struct StepTracker<W: Write> {
    out: W,
    steps: Vec<(String, String)>,
}

impl<W: Write> StepTracker<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            steps: Vec::new(),
        }
    }

    pub fn register(&mut self, id: &str, label: &str) {
        self.steps.push((id.to_string(), label.to_string()));
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn start_step(&mut self, id: &str) -> Result<()> {
        let index = self.position(id)?;
        let total = self.steps.len();
        let label = &self.steps[index].1;
        write!(self.out, "----> Step {}/{total}: {label} ... ", index + 1)
            .and_then(|()| self.out.flush())
            .map_err(InstallError::Progress)
    }

    pub fn stop_step(&mut self, id: &str, status: &str) -> Result<()> {
        self.position(id)?;
        writeln!(self.out, "{status}").map_err(InstallError::Progress)
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.steps
            .iter()
            .position(|(step, _)| step == id)
            .ok_or_else(|| InstallError::UnknownStep(id.to_string()))
    }
}
