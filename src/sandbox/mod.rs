//! Execution sandbox for submitted scripts.
//!
//! Every call to [`Sandbox::execute`] builds a fresh Rhai engine and scope,
//! redirects `print` / `debug` into per-call buffers, and arms a wall-clock
//! [`Watchdog`] that the engine polls at every evaluation step. Whatever the
//! script does (finishes, throws, fails to parse, loops forever) the call
//! returns a complete [`ExecutionResult`].
//!
//! Output is captured but not size-limited; time is bounded by the watchdog.
//! Module imports are disabled and scripts run on a dedicated thread with a
//! large stack so the call-level cap trips before the native stack does.
//! It is not a hardened isolation boundary and callers must not treat it as
//! one.
mod watchdog;

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rhai::debugger::DebuggerCommand;
use rhai::module_resolvers::DummyModuleResolver;
use rhai::{Dynamic, Engine, EvalAltResult, FuncArgs, OptimizationLevel, ParseError, Scope, AST};
use tracing::{debug, warn};

use crate::config::SandboxConfig;

use watchdog::Watchdog;

/// Category of an uncaught script error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Syntax,
    Arithmetic,
    Timeout,
    /// Raised by the script itself via `throw`.
    Runtime,
    NotFound,
    Type,
    Index,
    StackOverflow,
    Other,
}

impl FaultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::Syntax => "SyntaxError",
            FaultKind::Arithmetic => "ArithmeticError",
            FaultKind::Timeout => "TimeoutError",
            FaultKind::Runtime => "RuntimeError",
            FaultKind::NotFound => "NameError",
            FaultKind::Type => "TypeError",
            FaultKind::Index => "IndexError",
            FaultKind::StackOverflow => "RecursionError",
            FaultKind::Other => "Error",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uncaught error raised while running a script.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxFault {
    pub kind: FaultKind,
    pub message: String,
    /// Script line the error was raised on, when the engine knows it.
    pub line: Option<usize>,
}

impl SandboxFault {
    /// `last_line` is the last script line the engine stepped through, used
    /// when the error itself carries no position.
    fn from_eval(err: &EvalAltResult, last_line: Option<usize>) -> Self {
        let root = root_cause(err);

        let kind = match root {
            EvalAltResult::ErrorParsing(..) => FaultKind::Syntax,
            EvalAltResult::ErrorArithmetic(..) => FaultKind::Arithmetic,
            EvalAltResult::ErrorTerminated(..) => FaultKind::Timeout,
            EvalAltResult::ErrorRuntime(..) => FaultKind::Runtime,
            EvalAltResult::ErrorVariableNotFound(..)
            | EvalAltResult::ErrorFunctionNotFound(..)
            | EvalAltResult::ErrorModuleNotFound(..) => FaultKind::NotFound,
            EvalAltResult::ErrorMismatchDataType(..)
            | EvalAltResult::ErrorMismatchOutputType(..) => FaultKind::Type,
            EvalAltResult::ErrorArrayBounds(..) | EvalAltResult::ErrorStringBounds(..) => {
                FaultKind::Index
            }
            EvalAltResult::ErrorStackOverflow(..) => FaultKind::StackOverflow,
            _ => FaultKind::Other,
        };

        // The termination token carries the watchdog's own message
        let message = match root {
            EvalAltResult::ErrorTerminated(token, _) => token.to_string(),
            other => other.to_string(),
        };

        let line = root
            .position()
            .line()
            .or(last_line)
            .or_else(|| err.position().line());

        Self {
            kind,
            message,
            line,
        }
    }

    fn from_parse(err: ParseError) -> Self {
        let err: Box<EvalAltResult> = err.into();
        Self::from_eval(&err, None)
    }

    fn unstarted(err: std::io::Error) -> Self {
        Self {
            kind: FaultKind::Other,
            message: format!("could not start script thread: {err}"),
            line: None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == FaultKind::Timeout
    }

    /// Traceback-style rendering written to the captured stderr.
    pub fn trace(&self) -> String {
        match self.line {
            Some(line) => format!("Traceback (line {line}):\n{}: {}", self.kind, self.message),
            None => format!("Traceback:\n{}: {}", self.kind, self.message),
        }
    }
}

impl fmt::Display for SandboxFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Errors raised inside a script function come wrapped once per call frame.
fn root_cause(err: &EvalAltResult) -> &EvalAltResult {
    match err {
        EvalAltResult::ErrorInFunctionCall(.., inner, _)
        | EvalAltResult::ErrorInModule(.., inner, _) => root_cause(inner),
        _ => err,
    }
}

/// Last script line the engine stepped through, fed by the debugger hook.
/// Zero means none yet.
#[derive(Debug, Clone, Default)]
struct LineTrail(Arc<AtomicUsize>);

impl LineTrail {
    fn record(&self, line: usize) {
        self.0.store(line, Ordering::Relaxed);
    }

    fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }

    fn last(&self) -> Option<usize> {
        match self.0.load(Ordering::Relaxed) {
            0 => None,
            line => Some(line),
        }
    }
}

/// Stack for script threads. Every Rhai call level costs tens of KiB of
/// native stack in unoptimised builds.
const SCRIPT_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Runs `job` on a scoped thread with [`SCRIPT_STACK_SIZE`] of stack and
/// waits for it. Panics in `job` are resumed on the caller.
fn on_script_stack<T: Send>(job: impl FnOnce() -> T + Send) -> std::io::Result<T> {
    std::thread::scope(|s| {
        let handle = std::thread::Builder::new()
            .name("sandbox".to_string())
            .stack_size(SCRIPT_STACK_SIZE)
            .spawn_scoped(s, job)?;
        Ok(handle
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
    })
}

/// Per-call output buffers standing in for stdout / stderr.
#[derive(Debug, Clone, Default)]
struct Capture {
    stdout: Arc<Mutex<String>>,
    stderr: Arc<Mutex<String>>,
}

fn lock(buffer: &Mutex<String>) -> MutexGuard<'_, String> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Capture {
    fn write_stdout(&self, text: &str) {
        let mut out = lock(&self.stdout);
        out.push_str(text);
        out.push('\n');
    }

    fn write_stderr(&self, text: &str) {
        let mut err = lock(&self.stderr);
        err.push_str(text);
        err.push('\n');
    }

    fn stdout(&self) -> String {
        lock(&self.stdout).clone()
    }

    fn stderr(&self) -> String {
        lock(&self.stderr).clone()
    }
}

/// The namespace a script left behind: its top-level variables (seed
/// bindings included) and the functions it declared.
///
/// Verifiers use [`Bindings::call`] and [`Bindings::eval`] to exercise what
/// the user wrote. Both run on the same engine, so they stay under the
/// output redirection of the script run and draw on its deadline: the
/// budget is armed once per run and is not refilled by later calls.
pub struct Bindings {
    engine: Engine,
    scope: Scope<'static>,
    functions: AST,
    signatures: Vec<(String, usize)>,
    trail: LineTrail,
}

impl Bindings {
    /// True if `name` is a top-level variable or a declared function.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some() || self.function_arity(name).is_some()
    }

    /// Value of a top-level variable.
    pub fn get(&self, name: &str) -> Option<Dynamic> {
        self.scope.get_value::<Dynamic>(name)
    }

    /// Parameter count of a declared function.
    pub fn function_arity(&self, name: &str) -> Option<usize> {
        self.signatures
            .iter()
            .find(|(fn_name, _)| fn_name == name)
            .map(|(_, arity)| *arity)
    }

    /// Every bound name, sorted and deduplicated.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .scope
            .iter()
            .map(|(name, _, _)| name.to_string())
            .chain(self.signatures.iter().map(|(name, _)| name.clone()))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Calls a function the script declared.
    pub fn call(&self, name: &str, args: impl FuncArgs + Send) -> Result<Dynamic, SandboxFault> {
        on_script_stack(|| {
            self.trail.reset();
            let mut scope = self.scope.clone();
            self.engine
                .call_fn::<Dynamic>(&mut scope, &self.functions, name, args)
                .map_err(|err| SandboxFault::from_eval(&err, self.trail.last()))
        })
        .map_err(SandboxFault::unstarted)?
    }

    /// Evaluates a single expression against the script's namespace,
    /// e.g. `rectangle(0, 0, 2, 3).area()`.
    pub fn eval(&self, expression: &str) -> Result<Dynamic, SandboxFault> {
        let expr_ast = self
            .engine
            .compile_expression(expression)
            .map_err(SandboxFault::from_parse)?;
        let ast = self.functions.merge(&expr_ast);

        on_script_stack(|| {
            self.trail.reset();
            let mut scope = self.scope.clone();
            self.engine
                .eval_ast_with_scope::<Dynamic>(&mut scope, &ast)
                .map_err(|err| SandboxFault::from_eval(&err, self.trail.last()))
        })
        .map_err(SandboxFault::unstarted)?
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindings")
            .field("names", &self.names())
            .finish()
    }
}

/// Outcome of one [`Sandbox::execute`] call.
#[derive(Debug)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub fault: Option<SandboxFault>,
    pub timed_out: bool,
    pub bindings: Bindings,
    pub elapsed: Duration,
}

impl ExecutionResult {
    pub fn succeeded(&self) -> bool {
        self.fault.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Sandbox {
    /// Budget applied to user submissions.
    deadline: Option<Duration>,
    max_call_levels: usize,
}

impl Sandbox {
    pub fn new(deadline: Option<Duration>, max_call_levels: usize) -> Self {
        Self {
            deadline: deadline.filter(|d| !d.is_zero()),
            max_call_levels,
        }
    }

    pub fn from_config(config: &SandboxConfig) -> Self {
        Self::new(
            Some(Duration::from_secs(config.deadline_secs)),
            config.max_call_levels,
        )
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Runs user-supplied code under the configured submission deadline.
    pub fn run_submission(&self, code: &str, seed: &[(&str, Dynamic)]) -> ExecutionResult {
        self.execute(code, self.deadline, seed)
    }

    /// Runs `code` in a fresh namespace seeded with `seed`.
    ///
    /// `deadline` of `None` (or zero) disables the watchdog; only use that
    /// for code that does not come from a user.
    pub fn execute(
        &self,
        code: &str,
        deadline: Option<Duration>,
        seed: &[(&str, Dynamic)],
    ) -> ExecutionResult {
        on_script_stack(|| self.execute_here(code, deadline, seed)).unwrap_or_else(|err| {
            warn!("Could not start script thread ({err}), running inline");
            self.execute_here(code, deadline, seed)
        })
    }

    fn execute_here(
        &self,
        code: &str,
        deadline: Option<Duration>,
        seed: &[(&str, Dynamic)],
    ) -> ExecutionResult {
        let watchdog = Watchdog::new(deadline);
        let capture = Capture::default();
        let trail = LineTrail::default();
        let engine = self.build_engine(&watchdog, &capture, &trail);

        let mut scope = Scope::new();
        for (name, value) in seed {
            scope.push_dynamic(*name, value.clone());
        }

        watchdog.arm();
        let (ast, fault) = match engine.compile(code) {
            Ok(ast) => {
                let fault = match engine.run_ast_with_scope(&mut scope, &ast) {
                    Ok(()) => None,
                    Err(err) if matches!(*err, EvalAltResult::Exit(..)) => None,
                    Err(err) => Some(SandboxFault::from_eval(&err, trail.last())),
                };
                (ast, fault)
            }
            Err(err) => (AST::empty(), Some(SandboxFault::from_parse(err))),
        };
        let elapsed = watchdog.elapsed();

        let timed_out = fault.as_ref().map(SandboxFault::is_timeout).unwrap_or(false);
        if let Some(ref fault) = fault {
            capture.write_stderr(&fault.trace());
            if timed_out {
                warn!(
                    "Script hit its deadline after {:.3}s",
                    elapsed.as_secs_f64()
                );
            } else {
                debug!("Script raised {fault}");
            }
        }

        let signatures = ast
            .iter_functions()
            .map(|f| (f.name.to_string(), f.params.len()))
            .collect();

        debug!(
            "Script finished in {}ms ({} bytes stdout, {} bytes stderr)",
            elapsed.as_millis(),
            lock(&capture.stdout).len(),
            lock(&capture.stderr).len()
        );

        ExecutionResult {
            stdout: capture.stdout(),
            stderr: capture.stderr(),
            fault,
            timed_out,
            bindings: Bindings {
                functions: ast.clone_functions_only(),
                engine,
                scope,
                signatures,
                trail,
            },
            elapsed,
        }
    }

    fn build_engine(&self, watchdog: &Watchdog, capture: &Capture, trail: &LineTrail) -> Engine {
        let mut engine = Engine::new();
        engine.set_optimization_level(OptimizationLevel::None);
        engine.set_max_call_levels(self.max_call_levels);
        engine.set_module_resolver(DummyModuleResolver::new());

        let out = capture.clone();
        engine.on_print(move |text| out.write_stdout(text));

        let err = capture.clone();
        engine.on_debug(move |text, _source, pos| match pos.line() {
            Some(line) => err.write_stderr(&format!("[line {line}] {text}")),
            None => err.write_stderr(text),
        });

        let dog = watchdog.clone();
        engine.on_progress(move |_ops| {
            if dog.expired() {
                Some(Dynamic::from(dog.timeout_message()))
            } else {
                None
            }
        });

        // Builtin operators fail without a position; step through every node
        // so a fault can still be pinned to the line that was running.
        let steps = trail.clone();
        engine.register_debugger(
            |_, debugger| debugger,
            move |_, _, _, _, pos| {
                if let Some(line) = pos.line() {
                    steps.record(line);
                }
                Ok(DebuggerCommand::StepInto)
            },
        );

        engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Instant;

    fn sandbox() -> Sandbox {
        Sandbox::new(Some(Duration::from_secs(5)), 64)
    }

    fn run(code: &str) -> ExecutionResult {
        let sb = sandbox();
        sb.execute(code, sb.deadline(), &[])
    }

    // ── Output capture ──────────────────────────────

    #[test]
    fn test_print_is_captured() {
        let result = run(r#"print("hello world");"#);
        assert!(result.succeeded());
        assert_eq!(result.stdout, "hello world\n");
        assert!(result.stderr.is_empty());
        assert!(!result.timed_out);
    }

    #[test]
    fn test_debug_goes_to_stderr() {
        let result = run(r#"debug("careful");"#);
        assert!(result.succeeded());
        assert!(result.stdout.is_empty());
        assert!(result.stderr.contains("careful"));
    }

    #[test]
    fn test_runs_are_isolated() {
        let sb = sandbox();
        let first = sb.execute(r#"let secret = 42; print("one");"#, None, &[]);
        let second = sb.execute(r#"print("two");"#, None, &[]);
        assert_eq!(first.stdout, "one\n");
        assert_eq!(second.stdout, "two\n");
        assert!(!second.bindings.contains("secret"));
    }

    // ── Faults ──────────────────────────────────────

    #[test]
    fn test_division_by_zero_is_captured() {
        let result = run("let x = 1 / 0;");
        let fault = result.fault.as_ref().expect("fault expected");
        assert_eq!(fault.kind, FaultKind::Arithmetic);
        assert!(fault.message.to_lowercase().contains("division"));
        assert_eq!(fault.line, Some(1));
        assert!(result.bindings.get("x").is_none());
        assert!(!result.timed_out);
        assert!(result.stderr.contains("ArithmeticError"));
    }

    #[test]
    fn test_fault_line_inside_function_body() {
        let result = run("fn half(x) {\n    x / 0\n}\nlet y = half(4);");
        let fault = result.fault.expect("fault expected");
        assert_eq!(fault.kind, FaultKind::Arithmetic);
        assert_eq!(fault.line, Some(2));
        assert!(result.stderr.contains("line 2"));
    }

    #[test]
    fn test_fault_line_is_fresh_for_each_call() {
        let result = run("fn ok() { 1 }\n\n\nfn bad() { 1 / 0 }");
        let _ = result.bindings.call("ok", ()).expect("call");
        let fault = result.bindings.call("bad", ()).unwrap_err();
        assert_eq!(fault.line, Some(4));
        let missing = result.bindings.call("missing", ()).unwrap_err();
        assert_eq!(missing.line, None);
    }

    #[test]
    fn test_bindings_kept_up_to_failure() {
        let result = run("let a = 1;\nlet b = a / 0;\nlet c = 3;");
        assert!(result.fault.is_some());
        assert_eq!(result.bindings.get("a").and_then(|v| v.as_int().ok()), Some(1));
        assert!(!result.bindings.contains("b"));
        assert!(!result.bindings.contains("c"));
    }

    #[test]
    fn test_syntax_error_is_captured() {
        let result = run("let = ;");
        let fault = result.fault.expect("fault expected");
        assert_eq!(fault.kind, FaultKind::Syntax);
        assert!(result.bindings.names().is_empty());
    }

    #[test]
    fn test_throw_is_runtime_fault() {
        let result = run(r#"throw "boom";"#);
        let fault = result.fault.expect("fault expected");
        assert_eq!(fault.kind, FaultKind::Runtime);
        assert!(fault.message.contains("boom"));
    }

    #[test]
    fn test_unknown_variable_is_not_found() {
        let result = run("let y = nope + 1;");
        assert_eq!(result.fault.map(|f| f.kind), Some(FaultKind::NotFound));
    }

    #[test]
    fn test_fault_inside_function_reports_root_cause() {
        let result = run("fn half(x) { x / 0 }\nlet y = half(4);");
        let fault = result.fault.expect("fault expected");
        assert_eq!(fault.kind, FaultKind::Arithmetic);
    }

    #[test]
    fn test_runaway_recursion_is_stack_overflow() {
        let sb = Sandbox::new(Some(Duration::from_secs(5)), 16);
        let result = sb.run_submission("fn down(n) { down(n + 1) }\ndown(0);", &[]);
        assert_eq!(result.fault.map(|f| f.kind), Some(FaultKind::StackOverflow));
    }

    const COUNTDOWN: &str = "fn down(n) { if n == 0 { 0 } else { 1 + down(n - 1) } }";

    #[test]
    fn test_deep_recursion_fits_from_small_caller_stack() {
        // The caller's stack is the size of a blocking-pool worker's.
        let outcome = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                let result = sandbox().run_submission(&format!("{COUNTDOWN}\nlet x = down(60);"), &[]);
                assert!(result.succeeded(), "{:?}", result.fault);
                assert_eq!(result.bindings.get("x").and_then(|v| v.as_int().ok()), Some(60));

                let again = result.bindings.call("down", (60_i64,)).expect("call");
                assert_eq!(again.as_int(), Ok(60));
                let eval = result.bindings.eval("down(61)").expect("eval");
                assert_eq!(eval.as_int(), Ok(61));

                let runaway = sandbox().run_submission(&format!("{COUNTDOWN}\ndown(500);"), &[]);
                assert_eq!(runaway.fault.map(|f| f.kind), Some(FaultKind::StackOverflow));
            })
            .expect("spawn")
            .join();
        assert!(outcome.is_ok());
    }

    // ── Imports ─────────────────────────────────────

    #[test]
    fn test_import_does_not_read_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("leak.rhai"), r#"fn leak() { "secret" }"#).unwrap();
        let module = dir.path().join("leak");

        let result = run(&format!(
            "import {:?} as m;\nprint(m::leak());",
            module.to_string_lossy()
        ));
        let fault = result.fault.expect("fault expected");
        assert_eq!(fault.kind, FaultKind::NotFound);
        assert!(result.stdout.is_empty());
    }

    // ── Deadline ────────────────────────────────────

    #[test]
    fn test_infinite_loop_times_out() {
        let sb = sandbox();
        let started = Instant::now();
        let result = sb.execute("loop {}", Some(Duration::from_secs(1)), &[]);

        assert!(result.timed_out);
        let fault = result.fault.expect("fault expected");
        assert_eq!(fault.kind, FaultKind::Timeout);
        assert!(fault.message.contains("1.000s"));
        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(result.elapsed >= Duration::from_secs(1));
    }

    #[test]
    fn test_while_true_times_out_inside_function() {
        let sb = sandbox();
        let result = sb.execute(
            "fn spin() { while true { } }\nspin();",
            Some(Duration::from_millis(200)),
            &[],
        );
        assert!(result.timed_out);
    }

    #[test]
    fn test_output_before_timeout_is_kept() {
        let sb = sandbox();
        let result = sb.execute(
            r#"print("before"); loop {}"#,
            Some(Duration::from_millis(200)),
            &[],
        );
        assert!(result.timed_out);
        assert_eq!(result.stdout, "before\n");
        assert!(result.stderr.contains("TimeoutError"));
    }

    #[test]
    fn test_no_deadline_runs_to_completion() {
        let sb = sandbox();
        let result = sb.execute(
            "let total = 0; for i in 0..20000 { total += i; }",
            None,
            &[],
        );
        assert!(result.succeeded());
        assert_eq!(
            result.bindings.get("total").and_then(|v| v.as_int().ok()),
            Some(199_990_000)
        );
    }

    // ── Bindings ────────────────────────────────────

    #[test]
    fn test_seed_bindings_are_visible() {
        let unseeded = run("let OutsideTheBox = Challenge;");
        assert_eq!(unseeded.fault.map(|f| f.kind), Some(FaultKind::NotFound));

        let sb = sandbox();
        let seeded = sb.execute(
            "let OutsideTheBox = Challenge;",
            sb.deadline(),
            &[("Challenge", Dynamic::from("Challenge".to_string()))],
        );
        assert!(seeded.succeeded());
        assert!(seeded.bindings.contains("Challenge"));
        assert_eq!(
            seeded.bindings.get("OutsideTheBox").map(|v| v.to_string()),
            Some("Challenge".to_string())
        );
    }

    #[test]
    fn test_seed_bindings_can_be_overwritten() {
        let sb = sandbox();
        let result = sb.execute("x = 5;", None, &[("x", Dynamic::from(1_i64))]);
        assert!(result.succeeded());
        assert_eq!(result.bindings.get("x").and_then(|v| v.as_int().ok()), Some(5));
    }

    #[test]
    fn test_functions_are_listed_with_arity() {
        let result = run("fn add(a, b) { a + b }\nlet k = 1;");
        assert_eq!(result.bindings.function_arity("add"), Some(2));
        assert_eq!(result.bindings.function_arity("k"), None);
        assert_eq!(result.bindings.names(), vec!["add".to_string(), "k".to_string()]);
    }

    #[test]
    fn test_call_user_function() {
        let result = run("fn add(a, b) { a + b }");
        let sum = result.bindings.call("add", (2_i64, 3_i64)).expect("call");
        assert_eq!(sum.as_int(), Ok(5));
    }

    #[test]
    fn test_call_does_not_rerun_top_level() {
        let result = run("print(\"top\");\nfn one() { 1 }");
        let _ = result.bindings.call("one", ()).expect("call");
        assert_eq!(result.stdout, "top\n");
    }

    #[test]
    fn test_call_missing_function_is_fault() {
        let result = run("let a = 1;");
        let err = result.bindings.call("missing", ()).unwrap_err();
        assert_eq!(err.kind, FaultKind::NotFound);
    }

    #[test]
    fn test_calls_share_the_run_budget() {
        let sb = sandbox();
        let deadline = Duration::from_millis(200);
        let result = sb.execute("fn spin() { loop {} }", Some(deadline), &[]);
        assert!(result.succeeded());

        let started = Instant::now();
        for _ in 0..5 {
            let err = result.bindings.call("spin", ()).unwrap_err();
            assert!(err.is_timeout());
        }
        let err = result.bindings.eval("spin()").unwrap_err();
        assert!(err.is_timeout());
        assert!(started.elapsed() < deadline * 4);
    }

    #[test]
    fn test_call_is_bound_by_deadline() {
        let sb = sandbox();
        let result = sb.execute("fn spin() { loop {} }", Some(Duration::from_millis(300)), &[]);
        assert!(result.succeeded());

        let started = Instant::now();
        let err = result.bindings.call("spin", ()).unwrap_err();
        assert!(err.is_timeout());
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn test_eval_expression_against_namespace() {
        let result = run("fn double(x) { x * 2 }\nlet base = 20;");
        let value = result.bindings.eval("double(base) + 2").expect("eval");
        assert_eq!(value.as_int(), Ok(42));
    }

    #[test]
    fn test_eval_method_style_call() {
        let result = run("fn area() { this.w * this.h }\nfn rect(w, h) { #{ w: w, h: h } }");
        let value = result.bindings.eval("rect(3, 4).area()").expect("eval");
        assert_eq!(value.as_int(), Ok(12));
    }

    #[test]
    fn test_eval_syntax_error_is_fault() {
        let result = run("let a = 1;");
        let err = result.bindings.eval("a +").unwrap_err();
        assert_eq!(err.kind, FaultKind::Syntax);
    }
}
