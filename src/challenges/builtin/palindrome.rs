use crate::challenges::{run_submission, strip, strip_code, Challenge, Prompt, Submission, Verdict};
use crate::sandbox::{Bindings, Sandbox};

pub struct Palindrome;

fn cases() -> Vec<(String, bool)> {
    let a100 = "a".repeat(100);
    vec![
        (String::new(), true),
        ("Abba".to_string(), true),
        (format!("{a100}b{a100}"), true),
        (format!("{a100}b{a100}a"), false),
    ]
}

fn check(bindings: &Bindings, input: String, expected: bool) -> bool {
    bindings
        .call("palindrome", (input,))
        .ok()
        .and_then(|result| result.as_bool().ok())
        == Some(expected)
}

impl Challenge for Palindrome {
    fn name(&self) -> &'static str {
        "Palindrome"
    }

    fn requires(&self) -> &'static [&'static str] {
        &["LongestString", "FizzBuzz"]
    }

    fn help(&self) -> &'static str {
        "Upper and lower case should be ignored (\"Ö\" == \"ö\" and so on)."
    }

    fn start(&self) -> Prompt {
        Prompt::text(
            strip(
                r#"
                A palindrome is a word that reads the same forwards and backwards, like
                "Otto" or "Racecar". Write a function that returns `true` if the given word
                is a palindrome.

                Use the following snippet as a template for your program ;)
                "#,
            ) + "\n\n"
                + strip_code(
                    r#"
                    ```
                    fn palindrome(s) {
                        throw "not implemented";
                    }
                    ```
                    "#,
                )
                .as_str(),
        )
    }

    fn submit(&self, submission: &Submission, sandbox: &Sandbox) -> Verdict {
        let run = run_submission(submission, sandbox, &[]);
        let solved = run.bindings.function_arity("palindrome") == Some(1)
            && cases()
                .into_iter()
                .all(|(input, expected)| check(&run.bindings, input, expected));
        Verdict::from_run(&run, solved)
    }
}
