use rhai::Dynamic;

use crate::challenges::{
    run_submission, string_array, strip, strip_code, Challenge, Prompt, Submission, Verdict,
};
use crate::sandbox::{Bindings, Sandbox};

pub struct LongestString;

const TEMPLATE: &str = r#"
    ```
    fn longest_string(l) {
        throw "not implemented";
    }

    print(longest_string([]) == ());
    print(longest_string(["a"]) == "a");
    print(longest_string(["a", "b"]) == "b");
    print(longest_string(["a", "bb", "c"]) == "bb");
    ```
"#;

/// Inputs and the expected result; `None` means the unit value `()`.
const CASES: &[(&[&str], Option<&str>)] = &[
    (&[], None),
    (&["a"], Some("a")),
    (&["a", "b"], Some("b")),
    (&["a", "bb", "c"], Some("bb")),
];

fn check(bindings: &Bindings, input: &[&str], expected: Option<&str>) -> bool {
    let Ok(result) = bindings.call("longest_string", (string_array(input),)) else {
        return false;
    };
    match expected {
        None => result.is_unit(),
        Some(want) => is_string(&result, want),
    }
}

fn is_string(value: &Dynamic, want: &str) -> bool {
    value.is_string() && value.to_string() == want
}

impl Challenge for LongestString {
    fn name(&self) -> &'static str {
        "LongestString"
    }

    fn requires(&self) -> &'static [&'static str] {
        &["HelloWorld"]
    }

    fn start(&self) -> Prompt {
        Prompt::text(
            strip(
                r#"
                Now that you roughly know how this works, I have a slightly harder task
                for you!

                Write a function `longest_string` that takes an array of strings and
                returns the longest one. If several strings share the maximum length,
                return the last of them. For an empty array return `()`.

                Use the following snippet as a template for your program ;)
                "#,
            ) + "\n\n"
                + strip_code(TEMPLATE).as_str(),
        )
    }

    fn submit(&self, submission: &Submission, sandbox: &Sandbox) -> Verdict {
        let run = run_submission(submission, sandbox, &[]);
        let solved = run.bindings.function_arity("longest_string") == Some(1)
            && CASES
                .iter()
                .all(|(input, expected)| check(&run.bindings, input, *expected));
        Verdict::from_run(&run, solved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenges::testing::sandbox;

    const SOLUTION: &str = include_str!("../../../solutions/longest_string.rhai");

    fn submit(code: &str) -> Verdict {
        LongestString.submit(&Submission::from_text(code), &sandbox())
    }

    #[test]
    fn test_reference_solution_passes() {
        assert_eq!(submit(SOLUTION), Verdict::solved());
    }

    #[test]
    fn test_first_longest_is_wrong() {
        let code = r#"
            fn longest_string(l) {
                if l.len() == 0 { return (); }
                let best = l[0];
                for s in l { if s.len() > best.len() { best = s; } }
                best
            }
        "#;
        assert!(!submit(code).solved);
    }

    #[test]
    fn test_empty_string_instead_of_unit_is_wrong() {
        let code = r#"
            fn longest_string(l) {
                let best = "";
                for s in l { if s.len() >= best.len() { best = s; } }
                best
            }
        "#;
        assert!(!submit(code).solved);
    }

    #[test]
    fn test_missing_function_is_unsolved() {
        assert_eq!(submit("let longest = 1;"), Verdict::unsolved());
    }

    #[test]
    fn test_template_is_unsolved() {
        let template = strip_code(TEMPLATE).replace("```", "");
        let verdict = submit(&template);
        assert!(!verdict.solved);
        assert!(verdict.feedback.unwrap().contains("not implemented"));
    }

    #[test]
    fn test_prompt_contains_template() {
        let prompt = LongestString.start();
        assert!(prompt.text.contains("fn longest_string(l)"));
        assert!(prompt.speech.is_none());
    }
}
