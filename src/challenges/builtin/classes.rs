use crate::challenges::{
    number_of, run_submission, strip, strip_code, Challenge, Prompt, Submission, Verdict,
};
use crate::sandbox::{Bindings, Sandbox};

/// Rhai has no classes; shapes are object maps and `area` is a method
/// dispatching on `this.kind`.
pub struct Classes;

const TEMPLATE: &str = r#"
    ```
    // Every shape is an object map with a kind and a position
    fn shape(kind, x, y) {
        #{ kind: kind, x: x, y: y }
    }

    fn describe() {
        `${this.kind}(pos=(${this.x}, ${this.y}), area=${this.area()})`
    }

    fn rectangle(x, y, h, w) {
        throw "not implemented";
    }

    fn square(x, y, l) {
        let s = rectangle(x, y, l, l);
        s.kind = "Square";
        s
    }

    fn circle(x, y, r) {
        throw "not implemented";
    }

    // Compute the area of `this`, depending on its kind
    fn area() {
        throw "not implemented";
    }

    print(rectangle(0, 0, 1, 5).describe());
    print(square(5, 10, 4).describe());
    print(circle(-3, 2.5, 1.0).describe());
    ```
"#;

const CONSTRUCTORS: &[(&str, usize)] = &[("rectangle", 4), ("square", 3), ("circle", 3)];

const AREAS: &[(&str, f64)] = &[
    ("rectangle(0, 0, 13, 37).area()", 481.0),
    ("square(5, 13, 666).area()", 443_556.0),
    ("circle(-3, 2.5, 4.2).area()", 55.4178),
];

const TOLERANCE: f64 = 0.001;

fn check(bindings: &Bindings, expression: &str, expected: f64) -> bool {
    bindings
        .eval(expression)
        .ok()
        .and_then(|value| number_of(&value))
        .map(|area| (area - expected).abs() < TOLERANCE)
        .unwrap_or(false)
}

impl Challenge for Classes {
    fn name(&self) -> &'static str {
        "Classes"
    }

    fn requires(&self) -> &'static [&'static str] {
        &["CaesarII"]
    }

    fn start(&self) -> Prompt {
        Prompt::text(
            strip(
                r#"
                Have you heard of objects with methods? They couple data with the logic
                that belongs to it, and help you reuse existing code. In Rhai an object is
                an object map, and a function that uses `this` can be called as a method
                on it: `shape.area()`.

                Here is part of my geometry logic. Could you please finish it?
                "#,
            ) + "\n\n"
                + strip_code(TEMPLATE).as_str(),
        )
    }

    fn submit(&self, submission: &Submission, sandbox: &Sandbox) -> Verdict {
        let run = run_submission(submission, sandbox, &[]);
        let declared = CONSTRUCTORS
            .iter()
            .all(|&(name, arity)| run.bindings.function_arity(name) == Some(arity));
        let solved = declared
            && AREAS
                .iter()
                .all(|&(expression, expected)| check(&run.bindings, expression, expected));
        Verdict::from_run(&run, solved)
    }
}
