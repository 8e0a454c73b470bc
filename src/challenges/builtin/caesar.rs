use rhai::Dynamic;

use super::outside_the_box::DECLARATION;
use crate::challenges::{run_submission, strip, Challenge, Prompt, Submission, Verdict};
use crate::sandbox::Sandbox;

const PLAINTEXT: &str = "Faber est suae quisque fortunae.";
const KEY: i64 = 1337;

/// Shifts ASCII letters by `shift` places, wrapping within their case.
/// Everything else is left untouched.
pub fn caesar(text: &str, shift: i64) -> String {
    let shift = shift.rem_euclid(26) as u8;
    text.chars()
        .map(|c| {
            let base = if c.is_ascii_lowercase() {
                b'a'
            } else if c.is_ascii_uppercase() {
                b'A'
            } else {
                return c;
            };
            (((c as u8 - base) + shift) % 26 + base) as char
        })
        .collect()
}

pub struct CaesarI;

impl Challenge for CaesarI {
    fn name(&self) -> &'static str {
        "CaesarI"
    }

    fn requires(&self) -> &'static [&'static str] {
        &["Palindrome"]
    }

    fn start(&self) -> Prompt {
        Prompt::text(format!(
            "{}\n\n*\"{}\"*\n\n{}",
            strip(&format!(
                r#"
                Even the ancient Romans knew about encryption. Compared to modern methods it
                was not particularly secure and is easily broken today. It is known as the
                _Caesar cipher_.

                To encrypt, every letter of a text is shifted by _x_ places, to decrypt by
                _-x_ places. For example: `caesar("a", 2) -> "c"`, `caesar("z", 2) -> "b"` or
                `caesar(caesar("abc", 9999), -9999) -> "abc"`.

                The following sentence was encrypted with the key *{KEY}*. Send me the
                decrypted text!
                "#
            )),
            caesar(PLAINTEXT, KEY),
            strip(
                r#"
                _Hints_

                Characters that are not letters of the English alphabet are ignored by the
                cipher.

                Indexing a string gives you a character: `"abc"[1] -> 'b'`. Looking a
                character up in the alphabet with `"abcdefghijklmnopqrstuvwxyz".index_of(ch)`
                gives you its position, or -1 if it is not a lower case letter.

                The remainder operator `%` computes the remainder of a division, e.g.
                `5 % 3 -> 2` or `10 % 2 -> 0`.
                "#,
            )
        ))
    }

    fn submit(&self, submission: &Submission, _sandbox: &Sandbox) -> Verdict {
        // The answer is plain text, nothing to run
        let answer = submission.text.as_deref().unwrap_or("").trim();
        if answer == PLAINTEXT {
            Verdict::solved()
        } else {
            Verdict::unsolved()
        }
    }
}

pub struct CaesarII;

impl Challenge for CaesarII {
    fn name(&self) -> &'static str {
        "CaesarII"
    }

    fn requires(&self) -> &'static [&'static str] {
        &["CaesarI"]
    }

    fn help(&self) -> &'static str {
        "With modern computing power it is no problem to guess the key."
    }

    fn start(&self) -> Prompt {
        Prompt::text(format!("```\n{}\n```", caesar(DECLARATION, 13))).with_speech(
            "Oh no, I encrypted parts of my own source code. Can you crack it?",
        )
    }

    fn submit(&self, submission: &Submission, sandbox: &Sandbox) -> Verdict {
        let seed = [("Challenge", Dynamic::from("Challenge".to_string()))];
        let run = run_submission(submission, sandbox, &seed);
        let solved = run.bindings.contains("OutsideTheBox");
        Verdict::from_run(&run, solved)
    }
}
