//! Challenge registry.
//!
//! Append-only and declaration-ordered. Listing order follows registration;
//! unlock logic never depends on it. A challenge may only name prerequisites
//! that are already registered, so the prerequisite graph cannot contain a
//! cycle.
use tracing::debug;

use super::Challenge;
use crate::progress::ProgressionError;

#[derive(Default)]
pub struct ChallengeRegistry {
    challenges: Vec<Box<dyn Challenge>>,
}

impl ChallengeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, challenge: Box<dyn Challenge>) -> Result<(), ProgressionError> {
        let name = challenge.name();
        if self.contains(name) {
            return Err(ProgressionError::DuplicateName(name.to_string()));
        }
        if let Some(missing) = challenge.requires().iter().find(|r| !self.contains(r)) {
            return Err(ProgressionError::UnknownChallenge(missing.to_string()));
        }

        debug!("Registered challenge {name} (requires: {:?})", challenge.requires());
        self.challenges.push(challenge);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&dyn Challenge, ProgressionError> {
        self.challenges
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
            .ok_or_else(|| ProgressionError::UnknownChallenge(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.challenges.iter().any(|c| c.name() == name)
    }

    /// All challenges in declaration order. Can be called any number of times.
    pub fn list_all(&self) -> impl Iterator<Item = &dyn Challenge> + '_ {
        self.challenges.iter().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }
}
