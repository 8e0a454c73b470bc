pub mod store;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::challenges::registry::ChallengeRegistry;
use crate::challenges::{Challenge, Submission};
use crate::sandbox::Sandbox;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressionError {
    #[error("challenge {0} is already active")]
    AlreadyActive(String),
    #[error("no challenge is active")]
    NotActive,
    #[error("challenge {requested} cannot be selected (eligible: {eligible:?})")]
    NotEligible {
        requested: String,
        eligible: Vec<String>,
    },
    #[error("no challenge is left to activate")]
    NoneAvailable,
    #[error("unknown challenge: {0}")]
    UnknownChallenge(String),
    #[error("challenge {0} is already registered")]
    DuplicateName(String),
}

/// Per-user progress. Owned by the driver, mutated only through
/// [`Progression`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub active: Option<String>,
    /// Solve order. Membership is what unlocks challenges.
    pub solved: Vec<String>,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_solved(&self, name: &str) -> bool {
        self.solved.iter().any(|s| s == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeStatus {
    Locked,
    Unlocked,
    Solved,
}

impl ChallengeStatus {
    pub fn is_unlocked(&self) -> bool {
        !matches!(self, Self::Locked)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Solved {
        name: String,
    },
    Unsolved {
        name: String,
        /// Fault trace of the submitted code, when it crashed or timed out.
        feedback: Option<String>,
        timed_out: bool,
    },
}

/// Unlock, activation and solve rules over a fixed catalog.
pub struct Progression {
    registry: ChallengeRegistry,
}

impl Progression {
    pub fn new(registry: ChallengeRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ChallengeRegistry {
        &self.registry
    }

    /// Solved wins over everything; otherwise unlocked once every
    /// prerequisite is solved.
    pub fn status_of(&self, progress: &Progress, challenge: &dyn Challenge) -> ChallengeStatus {
        if progress.is_solved(challenge.name()) {
            ChallengeStatus::Solved
        } else if challenge.requires().iter().all(|r| progress.is_solved(r)) {
            ChallengeStatus::Unlocked
        } else {
            ChallengeStatus::Locked
        }
    }

    /// Unlocked and unsolved challenges, in declaration order.
    pub fn eligible_candidates(&self, progress: &Progress) -> Vec<&dyn Challenge> {
        self.registry
            .list_all()
            .filter(|c| self.status_of(progress, *c) == ChallengeStatus::Unlocked)
            .collect()
    }

    pub fn activate(
        &self,
        progress: &mut Progress,
        requested: Option<&str>,
    ) -> Result<&dyn Challenge, ProgressionError> {
        self.activate_with_rng(progress, requested, &mut rand::thread_rng())
    }

    /// Activates `requested`, or a uniformly random eligible challenge when
    /// no name is given.
    pub fn activate_with_rng<R: Rng + ?Sized>(
        &self,
        progress: &mut Progress,
        requested: Option<&str>,
        rng: &mut R,
    ) -> Result<&dyn Challenge, ProgressionError> {
        if let Some(active) = &progress.active {
            return Err(ProgressionError::AlreadyActive(active.clone()));
        }

        let candidates = self.eligible_candidates(progress);
        let chosen = match requested {
            Some(name) => candidates
                .iter()
                .find(|c| c.name() == name)
                .copied()
                .ok_or_else(|| ProgressionError::NotEligible {
                    requested: name.to_string(),
                    eligible: candidates.iter().map(|c| c.name().to_string()).collect(),
                })?,
            None => candidates
                .choose(rng)
                .copied()
                .ok_or(ProgressionError::NoneAvailable)?,
        };

        info!("Activated challenge {}", chosen.name());
        progress.active = Some(chosen.name().to_string());
        Ok(chosen)
    }

    /// Drops the active challenge without solving it. Returns its name.
    pub fn give_up(&self, progress: &mut Progress) -> Result<String, ProgressionError> {
        let name = progress.active.take().ok_or(ProgressionError::NotActive)?;
        info!("Gave up challenge {name}");
        Ok(name)
    }

    /// Judges a submission against the active challenge. A solve clears
    /// `active` and records the name once; anything else leaves progress
    /// untouched.
    pub fn submit(
        &self,
        progress: &mut Progress,
        submission: &Submission,
        sandbox: &Sandbox,
    ) -> Result<SubmitOutcome, ProgressionError> {
        let name = progress.active.clone().ok_or(ProgressionError::NotActive)?;
        let challenge = self.registry.get(&name)?;

        let verdict = challenge.submit(submission, sandbox);
        debug!("Verdict for {name}: solved={}", verdict.solved);

        if !verdict.solved {
            return Ok(SubmitOutcome::Unsolved {
                name,
                feedback: verdict.feedback,
                timed_out: verdict.timed_out,
            });
        }

        progress.active = None;
        if !progress.is_solved(&name) {
            progress.solved.push(name.clone());
        }
        info!("Solved challenge {name}");
        Ok(SubmitOutcome::Solved { name })
    }

    pub fn reset(&self, progress: &mut Progress) {
        *progress = Progress::new();
    }
}
