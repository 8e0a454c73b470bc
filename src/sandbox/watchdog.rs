//! Cooperative wall-clock deadline for script execution.
//!
//! The script engine cannot be interrupted from another thread, so the
//! deadline is enforced from inside: the engine calls the progress hook at
//! every evaluation step, and the hook asks the watchdog whether the budget
//! is spent. A step that never returns to the evaluator (one long native
//! call) is not interruptible.
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Watchdog {
    budget: Option<Duration>,
    armed_at: Arc<Mutex<Instant>>,
}

impl Watchdog {
    /// A zero budget is treated the same as no budget.
    pub fn new(budget: Option<Duration>) -> Self {
        Self {
            budget: budget.filter(|b| !b.is_zero()),
            armed_at: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Restarts the clock. Called once per run; verifier calls into the
    /// script's functions spend what is left of the same budget.
    pub fn arm(&self) {
        *self.armed_at.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    pub fn elapsed(&self) -> Duration {
        self.armed_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    pub fn expired(&self) -> bool {
        match self.budget {
            Some(budget) => self.elapsed() >= budget,
            None => false,
        }
    }

    /// Message carried by the termination token once the budget is spent.
    pub fn timeout_message(&self) -> String {
        match self.budget {
            Some(budget) => format!(
                "code execution took longer than {:.3}s to terminate",
                budget.as_secs_f64()
            ),
            None => "code execution was terminated".to_string(),
        }
    }
}
