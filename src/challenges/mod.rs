pub mod builtin;
pub mod registry;
#[cfg(test)]
pub mod testing;

use rhai::Dynamic;
use tracing::debug;

use crate::sandbox::{ExecutionResult, Sandbox};

/// Hint shown when a challenge does not provide its own.
pub const DEFAULT_HELP: &str = "No help is available for this challenge ¯\\_(ツ)_/¯";

/// What a user sent in reply to an active challenge.
///
/// `text` is the raw message body, `file` the decoded content of an
/// attached file. The driver fills whichever it received.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    pub text: Option<String>,
    pub file: Option<String>,
}

impl Submission {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            file: None,
        }
    }

    pub fn from_file(content: impl Into<String>) -> Self {
        Self {
            text: None,
            file: Some(content.into()),
        }
    }

    /// The code to run: the message text if there is one, otherwise the
    /// attached file, otherwise nothing.
    pub fn code(&self) -> &str {
        self.text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(self.file.as_deref())
            .unwrap_or("")
    }
}

/// Exercise prompt returned by [`Challenge::start`].
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub text: String,
    /// Line the driver may voice out-of-band. Synthesis is the driver's job.
    pub speech: Option<String>,
}

impl Prompt {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            speech: None,
        }
    }

    pub fn with_speech(mut self, speech: impl Into<String>) -> Self {
        self.speech = Some(speech.into());
        self
    }
}

/// A verifier's decision on one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub solved: bool,
    /// Captured error output when the submitted code crashed or timed out.
    pub feedback: Option<String>,
    pub timed_out: bool,
}

impl Verdict {
    pub fn solved() -> Self {
        Self {
            solved: true,
            feedback: None,
            timed_out: false,
        }
    }

    pub fn unsolved() -> Self {
        Self {
            solved: false,
            feedback: None,
            timed_out: false,
        }
    }

    /// Builds a verdict for a sandbox run, attaching the run's stderr if it
    /// faulted.
    pub fn from_run(run: &ExecutionResult, solved: bool) -> Self {
        let feedback = (!run.succeeded()).then(|| run.stderr.trim_end().to_string());
        Self {
            solved,
            feedback,
            timed_out: run.timed_out,
        }
    }
}

/// An exercise in the catalog.
///
/// Implementations are declared once at startup and never mutated.
/// `submit` must not panic or return an error for bad code: anything that
/// does not satisfy the exercise is simply "not solved".
pub trait Challenge: Send + Sync {
    /// Unique name, also what users type after `/challenge`.
    fn name(&self) -> &'static str;

    /// Names that must all be solved before this one unlocks.
    fn requires(&self) -> &'static [&'static str] {
        &[]
    }

    fn help(&self) -> &'static str {
        DEFAULT_HELP
    }

    /// Exercise prompt. Idempotent, no effect on progress.
    fn start(&self) -> Prompt;

    /// Runs the submission through the sandbox and decides.
    fn submit(&self, submission: &Submission, sandbox: &Sandbox) -> Verdict;
}

/// Runs the submitted code under the sandbox's submission deadline.
pub fn run_submission(
    submission: &Submission,
    sandbox: &Sandbox,
    seed: &[(&str, Dynamic)],
) -> ExecutionResult {
    let run = sandbox.run_submission(submission.code(), seed);
    debug!("Submission ran for {}ms", run.elapsed.as_millis());
    run
}

/// Re-flows an indented prose block: lines are trimmed and joined within a
/// paragraph, paragraphs stay separated by one blank line.
pub fn strip(s: &str) -> String {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in s.trim().lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    paragraphs.join("\n\n")
}

/// Removes the indentation shared by all non-blank lines of a code template
/// and trims surrounding blank lines.
pub fn strip_code(s: &str) -> String {
    let lines: Vec<&str> = s.lines().collect();
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let body: Vec<&str> = lines
        .iter()
        .map(|l| if l.trim().is_empty() { "" } else { &l[indent..] })
        .collect();

    body.join("\n").trim_matches('\n').to_string()
}

/// Numeric value of a script result, accepting integers and floats.
pub fn number_of(value: &Dynamic) -> Option<f64> {
    value
        .as_float()
        .ok()
        .or_else(|| value.as_int().ok().map(|i| i as f64))
}

/// A script array of strings, for feeding test inputs to user functions.
pub fn string_array(items: &[&str]) -> rhai::Array {
    items
        .iter()
        .map(|s| Dynamic::from(s.to_string()))
        .collect()
}
