//! Stub challenges for registry and progression tests.
use super::registry::ChallengeRegistry;
use super::{run_submission, Challenge, Prompt, Submission, Verdict};
use crate::sandbox::Sandbox;

/// Solved by any script that binds `answer` to 42.
pub struct StubChallenge {
    name: &'static str,
    requires: &'static [&'static str],
}

impl StubChallenge {
    pub fn boxed(name: &'static str, requires: &'static [&'static str]) -> Box<dyn Challenge> {
        Box::new(Self { name, requires })
    }
}

impl Challenge for StubChallenge {
    fn name(&self) -> &'static str {
        self.name
    }

    fn requires(&self) -> &'static [&'static str] {
        self.requires
    }

    fn start(&self) -> Prompt {
        Prompt::text(format!("Bind `answer` to 42 to solve {}", self.name))
    }

    fn submit(&self, submission: &Submission, sandbox: &Sandbox) -> Verdict {
        let run = run_submission(submission, sandbox, &[]);
        let solved = run
            .bindings
            .get("answer")
            .and_then(|v| v.as_int().ok())
            .map(|v| v == 42)
            .unwrap_or(false);
        Verdict::from_run(&run, solved)
    }
}

pub fn registry_of(catalog: &[(&'static str, &'static [&'static str])]) -> ChallengeRegistry {
    let mut registry = ChallengeRegistry::new();
    for &(name, requires) in catalog {
        registry
            .register(StubChallenge::boxed(name, requires))
            .expect("stub catalog must be valid");
    }
    registry
}

pub fn sandbox() -> Sandbox {
    Sandbox::new(Some(std::time::Duration::from_secs(5)), 64)
}
