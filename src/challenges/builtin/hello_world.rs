use crate::challenges::{run_submission, strip, Challenge, Prompt, Submission, Verdict};
use crate::sandbox::Sandbox;

/// Print "hello world". The entry point of the catalog.
pub struct HelloWorld;

impl Challenge for HelloWorld {
    fn name(&self) -> &'static str {
        "HelloWorld"
    }

    fn start(&self) -> Prompt {
        Prompt::text(strip(
            r#"
            Hey! Cool that you want to take on your first challenge! Submissions are
            written in Rhai, a small scripting language that looks a lot like Rust and
            JavaScript. If you just want to look around first, the playground at
            https://rhai.rs/playground is a good place to start.

            Once that works, write a program that prints "hello world" and send it to me
            as a text message or as a file. Use the `print` function for the output ;)

            Have fun 🦦!
            "#,
        ))
    }

    fn submit(&self, submission: &Submission, sandbox: &Sandbox) -> Verdict {
        let run = run_submission(submission, sandbox, &[]);
        let solved = run.stdout.trim().to_lowercase().contains("hello world");
        Verdict::from_run(&run, solved)
    }
}
