pub mod console;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::challenges::Submission;
use crate::config::Config;
use crate::progress::store::ProgressStore;
use crate::progress::{Progression, ProgressionError, SubmitOutcome};
use crate::sandbox::Sandbox;

/// Inbound events from a chat transport.
#[derive(Debug)]
pub enum SessionEvent {
    Connected,
    Message(InboundMessage),
}

#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub from: String,
    pub body: String,
}

/// Outbound requests to a chat transport.
#[derive(Debug, PartialEq)]
pub enum SessionCommand {
    SendMessage { to: String, body: String },
    /// A line the transport may voice. Text only, no audio is produced here.
    SendVoice { to: String, text: String },
}

/// Reply to one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub body: String,
    pub voice: Option<String>,
}

impl Reply {
    fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            voice: None,
        }
    }
}

const INTERNAL_ERROR: &str = "An internal error occurred, I cannot process this message! O.o";

/// The session runtime.
///
/// Receives chat events, maps slash commands and submissions onto the
/// progression engine, persists progress and sends back replies.
pub struct SessionRuntime {
    config: Config,
    progression: Arc<Progression>,
    sandbox: Arc<Sandbox>,
    store: ProgressStore,
    start_time: Instant,
}

impl SessionRuntime {
    pub fn new(
        config: Config,
        progression: Progression,
        sandbox: Sandbox,
        store: ProgressStore,
    ) -> Self {
        Self {
            config,
            progression: Arc::new(progression),
            sandbox: Arc::new(sandbox),
            store,
            start_time: Instant::now(),
        }
    }

    /// Main session loop. Events are handled one at a time, so a user's
    /// progress is never touched concurrently.
    pub async fn run(
        &self,
        mut event_rx: mpsc::Receiver<SessionEvent>,
        cmd_tx: mpsc::Sender<SessionCommand>,
    ) -> Result<()> {
        info!("Session runtime started, waiting for messages...");

        while let Some(event) = event_rx.recv().await {
            let msg = match event {
                SessionEvent::Connected => {
                    info!("✓ {} is online and ready", self.config.agent.name);
                    continue;
                }
                SessionEvent::Message(msg) => msg,
            };

            let reply = if self.config.is_allowed(&msg.from) {
                match self.handle(&msg.from, &msg.body).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        error!("Error processing message from {}: {e:#}", msg.from);
                        Reply::text(INTERNAL_ERROR)
                    }
                }
            } else {
                warn!("Unauthorized message from {}, ignoring", msg.from);
                Reply::text(format!("`{}: access denied`", msg.from))
            };

            let _ = cmd_tx
                .send(SessionCommand::SendMessage {
                    to: msg.from.clone(),
                    body: reply.body,
                })
                .await;
            if let Some(text) = reply.voice {
                let _ = cmd_tx
                    .send(SessionCommand::SendVoice { to: msg.from, text })
                    .await;
            }
        }

        info!("Event stream closed, session runtime stopping");
        Ok(())
    }

    /// Handles one message from an authorized user.
    pub async fn handle(&self, from: &str, body: &str) -> Result<Reply> {
        if is_command(body) {
            self.handle_command(from, body).await
        } else {
            self.cmd_submit(from, Submission::from_text(body)).await
        }
    }

    // ── Slash commands ────────────────────────────────────

    async fn handle_command(&self, from: &str, body: &str) -> Result<Reply> {
        let mut parts = body.trim().splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

        info!("Slash command from {from}: {command}");

        match command.as_str() {
            "/start" => Ok(self.cmd_start()),
            "/help" => self.cmd_help(from),
            "/challenge" => self.cmd_challenge(from, arg),
            "/giveup" => self.cmd_giveup(from),
            "/reset" => self.cmd_reset(from),
            "/status" => self.cmd_status(from),
            "/file" => self.cmd_file(from, arg).await,
            "/ping" => Ok(Reply::text("pong")),
            _ => Ok(Reply::text(format!(
                "Unknown command: {command}\nType /help for available commands."
            ))),
        }
    }

    /// /start: greeting
    fn cmd_start(&self) -> Reply {
        Reply::text(format!(
            "Hello, I am `{}`.\n\n\
             Use /help for an overview of the commands and your current state.",
            self.config.agent.name
        ))
    }

    /// /help: commands, challenge table and the active hint
    fn cmd_help(&self, from: &str) -> Result<Reply> {
        let progress = self.store.load(from)?;
        let registry = self.progression.registry();

        let mut table = format!("{:<16}{:<10}{}\n", "challenge", "unlocked", "solved");
        for challenge in registry.list_all() {
            let status = self.progression.status_of(&progress, challenge);
            table.push_str(&format!(
                "{:<16}{:<10}{}\n",
                challenge.name(),
                yes_no(status.is_unlocked()),
                yes_no(progress.is_solved(challenge.name())),
            ));
        }

        let (active, hint) = match &progress.active {
            Some(name) => (
                name.as_str(),
                registry.get(name).map(|c| c.help()).unwrap_or_default(),
            ),
            None => ("none", ""),
        };

        Ok(Reply::text(format!(
            "Commands:\n\
             \x20 /start             — Start the conversation\n\
             \x20 /challenge [name]  — Pick the next challenge (random if no name is given)\n\
             \x20 /giveup            — Give up the active challenge\n\
             \x20 /reset             — Wipe your progress and start over\n\
             \x20 /status            — Uptime and your progress\n\
             \x20 /file <path>       — Submit the content of a file\n\
             \x20 /ping              — Check if the bot is alive\n\
             \x20 /help              — This message\n\
             \n\
             Anything else is a submission for the active challenge.\n\
             \n\
             Challenges:\n\
             ```\n{table}```\n\
             \n\
             Active challenge: {active}\n{hint}"
        )))
    }

    /// /challenge [name]: activate a named or random eligible challenge
    fn cmd_challenge(&self, from: &str, requested: Option<&str>) -> Result<Reply> {
        let mut progress = self.store.load(from)?;

        let reply = match self.progression.activate(&mut progress, requested) {
            Ok(challenge) => {
                let prompt = challenge.start();
                Reply {
                    body: format!(
                        "Challenge `{}` activated\n\n{}",
                        challenge.name(),
                        prompt.text
                    ),
                    voice: prompt.speech,
                }
            }
            Err(ProgressionError::AlreadyActive(name)) => {
                let help = self
                    .progression
                    .registry()
                    .get(&name)
                    .map(|c| c.help())
                    .unwrap_or_default();
                Reply::text(format!("Challenge \"{name}\" is already active\n\n{help}"))
            }
            Err(ProgressionError::NotEligible {
                requested,
                eligible,
            }) => Reply::text(format!(
                "You cannot select \"{requested}\"!\n\n\
                 These challenges are unlocked for you: {}",
                list_or_none(&eligible)
            )),
            Err(ProgressionError::NoneAvailable) => {
                Reply::text("Sorry, I have no new challenge for you :/")
            }
            Err(e) => return Err(e.into()),
        };

        self.store.save(from, &progress)?;
        Ok(reply)
    }

    /// /giveup: drop the active challenge
    fn cmd_giveup(&self, from: &str) -> Result<Reply> {
        let mut progress = self.store.load(from)?;
        match self.progression.give_up(&mut progress) {
            Ok(name) => {
                self.store.save(from, &progress)?;
                Ok(Reply::text(format!("Too bad :/ `{name}` is no longer active.")))
            }
            Err(ProgressionError::NotActive) => Ok(Reply::text(
                "You are not doing any challenge right now 🦦",
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// /reset: wipe progress
    fn cmd_reset(&self, from: &str) -> Result<Reply> {
        let mut progress = self.store.load(from)?;
        self.progression.reset(&mut progress);
        // A missing snapshot loads as fresh progress
        self.store.remove(from)?;
        Ok(Reply::text("Your progress has been wiped!"))
    }

    /// /status: uptime and progress overview
    fn cmd_status(&self, from: &str) -> Result<Reply> {
        let uptime = self.start_time.elapsed();
        let hours = uptime.as_secs() / 3600;
        let minutes = (uptime.as_secs() % 3600) / 60;

        let progress = self.store.load(from)?;
        let total = self.progression.registry().len();

        Ok(Reply::text(format!(
            "{} — status\n\
             Uptime: {hours}h {minutes}m\n\
             Submission deadline: {}\n\
             Solved: {}/{total}\n\
             Active challenge: {}",
            self.config.agent.name,
            self.sandbox
                .deadline()
                .map(|d| format!("{}s", d.as_secs()))
                .unwrap_or_else(|| "none".to_string()),
            progress.solved.len(),
            progress.active.as_deref().unwrap_or("none"),
        )))
    }

    /// /file <path>: submit a file as an attachment
    async fn cmd_file(&self, from: &str, path: Option<&str>) -> Result<Reply> {
        let Some(path) = path else {
            return Ok(Reply::text("Usage: /file <path>"));
        };

        let content = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Cannot read {path} for {from}: {e}");
                return Ok(Reply::text(format!("Cannot read `{path}`: {e}")));
            }
        };

        let Ok(content) = String::from_utf8(content) else {
            return Ok(Reply::text(format!("`{path}` is not a UTF-8 text file")));
        };

        self.cmd_submit(from, Submission::from_file(content)).await
    }

    // ── Submissions ──────────────────────────────────────

    /// Judges a submission against the active challenge. The sandbox run
    /// happens on the blocking pool.
    async fn cmd_submit(&self, from: &str, submission: Submission) -> Result<Reply> {
        let progress = self.store.load(from)?;
        let Some(active) = progress.active.clone() else {
            return Ok(Reply::text(
                "Cool cool, but what am I supposed to do with that?",
            ));
        };

        let submission_id = Uuid::new_v4();
        info!(
            "Submission {submission_id} from {from} for {active} ({} bytes)",
            submission.code().len()
        );

        let progression = Arc::clone(&self.progression);
        let sandbox = Arc::clone(&self.sandbox);
        let (progress, outcome) = tokio::task::spawn_blocking(move || {
            let mut progress = progress;
            let outcome = progression.submit(&mut progress, &submission, &sandbox);
            (progress, outcome)
        })
        .await?;

        let reply = match outcome? {
            SubmitOutcome::Solved { name } => {
                info!("Submission {submission_id}: solved {name}");
                self.store.save(from, &progress)?;
                Reply::text(format!("Cool! You solved the challenge `{name}`!"))
            }
            SubmitOutcome::Unsolved {
                name,
                feedback: Some(trace),
                timed_out: true,
            } => {
                warn!("Submission {submission_id}: {name} ran out of time");
                Reply::text(format!(
                    "Your code took too long to finish:\n```\n{trace}\n```"
                ))
            }
            SubmitOutcome::Unsolved {
                name,
                feedback: Some(trace),
                ..
            } => {
                info!("Submission {submission_id}: {name} crashed");
                Reply::text(format!("Something went wrong:\n```\n{trace}\n```"))
            }
            SubmitOutcome::Unsolved {
                name,
                feedback: None,
                ..
            } => {
                info!("Submission {submission_id}: {name} not solved");
                Reply::text("Sorry, that solution is not correct :/")
            }
        };

        Ok(reply)
    }

    #[cfg(test)]
    fn progress_of(&self, user: &str) -> crate::progress::Progress {
        self.store.load(user).unwrap()
    }
}

/// A slash command starts with `/` followed by a letter, so code such as
/// `// comment` or `/* ... */` is treated as a submission.
fn is_command(body: &str) -> bool {
    let mut chars = body.trim_start().chars();
    chars.next() == Some('/') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}
