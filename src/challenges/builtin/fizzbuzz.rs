use crate::challenges::{run_submission, strip, strip_code, Challenge, Prompt, Submission, Verdict};
use crate::sandbox::{Bindings, Sandbox};

pub struct FizzBuzz;

const TEMPLATE: &str = r#"
    ```
    fn fizzbuzz(x) {
        throw "not implemented";
    }

    print(fizzbuzz(2) == "2");
    print(fizzbuzz(3) == "Fizz");
    print(fizzbuzz(5) == "Buzz");
    print(fizzbuzz(15) == "FizzBuzz");
    ```
"#;

/// Compared on the string form, so returning the number itself is fine.
const CASES: &[(i64, &str)] = &[
    (2, "2"),
    (3, "Fizz"),
    (5, "Buzz"),
    (6, "Fizz"),
    (15, "FizzBuzz"),
    (1515, "FizzBuzz"),
];

fn check(bindings: &Bindings, input: i64, expected: &str) -> bool {
    bindings
        .call("fizzbuzz", (input,))
        .map(|result| result.to_string() == expected)
        .unwrap_or(false)
}

impl Challenge for FizzBuzz {
    fn name(&self) -> &'static str {
        "FizzBuzz"
    }

    fn requires(&self) -> &'static [&'static str] {
        &["HelloWorld"]
    }

    fn help(&self) -> &'static str {
        "The remainder operator (%) is very useful for this one."
    }

    fn start(&self) -> Prompt {
        Prompt::text(
            strip(
                r#"
                Write a function `fizzbuzz` that takes a number and returns "Fizz" if the
                number is divisible by 3. If it is divisible by 5 it returns "Buzz", and
                "FizzBuzz" if both are true. In every other case it simply returns the
                number itself.

                Use the following snippet as a template for your program ;)
                "#,
            ) + "\n\n"
                + strip_code(TEMPLATE).as_str(),
        )
    }

    fn submit(&self, submission: &Submission, sandbox: &Sandbox) -> Verdict {
        let run = run_submission(submission, sandbox, &[]);
        let solved = run.bindings.function_arity("fizzbuzz").is_some()
            && CASES
                .iter()
                .all(|&(input, expected)| check(&run.bindings, input, expected));
        Verdict::from_run(&run, solved)
    }
}
