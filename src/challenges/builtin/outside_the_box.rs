use rand::Rng;

use crate::challenges::{run_submission, strip, strip_code, Challenge, Prompt, Submission, Verdict};
use crate::sandbox::{Bindings, Sandbox};

/// How this challenge declares itself. CaesarII shows it encrypted.
pub const DECLARATION: &str = r#"// OutsideTheBox
let OutsideTheBox = #{
    base: Challenge,
    name: "OutsideTheBox",
    requires: ["CaesarII", "Classes"],
    help: "CaesarII"
};"#;

pub struct OutsideTheBox;

/// Inputs for one verification round; `n` varies between rounds so a
/// lookup table of the examples is not enough.
fn cases(n: usize) -> Vec<(String, bool)> {
    vec![
        (String::new(), true),
        ("abc".to_string(), true),
        (format!("{}{}", "a".repeat(n), "b".repeat(n)), true),
        (
            format!("{}{}{}", "a".repeat(n), "b".repeat(n), "c".repeat(n + 10)),
            false,
        ),
        ("system".to_string(), false),
        ("fish".to_string(), true),
    ]
}

fn check(bindings: &Bindings, input: String, expected: bool) -> bool {
    bindings
        .call("blackbox", (input,))
        .ok()
        .and_then(|result| result.as_bool().ok())
        == Some(expected)
}

impl Challenge for OutsideTheBox {
    fn name(&self) -> &'static str {
        "OutsideTheBox"
    }

    fn requires(&self) -> &'static [&'static str] {
        &["CaesarII", "Classes"]
    }

    fn help(&self) -> &'static str {
        "CaesarII"
    }

    fn start(&self) -> Prompt {
        Prompt::text(
            strip(
                r#"
                I found a black box in my basement. You put a word in and it answers `true`
                or `false`. Nobody remembers what it checks, but I wrote down what it said
                for a few words. Rebuild it as a function `blackbox`!

                The box also accepted really long words made of a run of "a"s followed by
                a run of "b"s of the same length, but refused them once I appended more
                "c"s than there were "b"s.
                "#,
            ) + "\n\n"
                + strip_code(
                    r#"
                    ```
                    fn blackbox(s) {
                        throw "not implemented";
                    }

                    print(blackbox("") == true);
                    print(blackbox("abc") == true);
                    print(blackbox("system") == false);
                    print(blackbox("fish") == true);
                    ```
                    "#,
                )
                .as_str(),
        )
    }

    fn submit(&self, submission: &Submission, sandbox: &Sandbox) -> Verdict {
        let run = run_submission(submission, sandbox, &[]);
        if run.bindings.function_arity("blackbox").is_none() {
            return Verdict::from_run(&run, false);
        }

        let n = rand::thread_rng().gen_range(10..=1000);
        let solved = cases(n)
            .into_iter()
            .all(|(input, expected)| check(&run.bindings, input, expected));
        Verdict::from_run(&run, solved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenges::testing::sandbox;

    const SOLUTION: &str = include_str!("../../../solutions/outside_the_box.rhai");

    fn submit(code: &str) -> Verdict {
        OutsideTheBox.submit(&Submission::from_text(code), &sandbox())
    }

    #[test]
    fn test_reference_solution_passes_repeatedly() {
        for _ in 0..3 {
            assert_eq!(submit(SOLUTION), Verdict::solved());
        }
    }

    #[test]
    fn test_reference_solution_on_all_cases() {
        let run = sandbox().run_submission(SOLUTION, &[]);
        for n in [10, 57, 1000] {
            for (input, expected) in cases(n) {
                assert!(check(&run.bindings, input.clone(), expected), "n={n}, input={input:?}");
            }
        }
    }

    #[test]
    fn test_lookup_table_fails() {
        let code = r#"
            fn blackbox(s) {
                s == "" || s == "abc" || s == "fish"
            }
        "#;
        assert!(!submit(code).solved);
    }

    #[test]
    fn test_missing_function_is_unsolved() {
        assert_eq!(submit("let blackbox = true;"), Verdict::unsolved());
    }

    #[test]
    fn test_declaration_is_valid_script() {
        let seed = [("Challenge", rhai::Dynamic::from("Challenge".to_string()))];
        let run = sandbox().execute(DECLARATION, None, &seed);
        assert!(run.succeeded(), "{}", run.stderr);
        let decl = run.bindings.get("OutsideTheBox").expect("declared");
        let map = decl.try_cast::<rhai::Map>().expect("object map");
        assert_eq!(map.get("help").map(|v| v.to_string()), Some("CaesarII".to_string()));
    }

    #[test]
    fn test_prompt_puts_template_after_intro() {
        let text = OutsideTheBox.start().text;
        assert!(text.contains("\"c\"s than there were \"b\"s.\n\n```\n"));
        assert!(text.contains("fn blackbox(s) {"));
    }
}
