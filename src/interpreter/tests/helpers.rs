//! Test harness for running programs
//!
//! Wraps an [`Interpreter`] with the default builders and a global `log`
//! function whose lines are recorded for assertions.

use crate::compiler::Compiler;
use crate::interpreter::{EvalResult, Interpreter};
use crate::runtime::{host, Outcome, TaskStatus};
use crate::syntax::{Program, Stmt};
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

pub struct Harness {
    pub interpreter: Interpreter,
    lines: Rc<RefCell<Vec<String>>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_compiler(Compiler::default())
    }

    pub fn with_compiler(compiler: Compiler) -> Self {
        crate::logging::init_for_tests();
        let interpreter = Interpreter::new(Rc::new(compiler));
        let lines = Rc::new(RefCell::new(Vec::new()));
        let sink = lines.clone();
        interpreter.define(
            "log",
            Value::native("log", move |_, args| {
                let parts: Vec<String> = args.iter().map(|v| v.to_string()).collect();
                sink.borrow_mut().push(parts.join(" "));
                Ok(Value::Undefined)
            }),
        );
        Self { interpreter, lines }
    }

    pub fn run(&self, body: Vec<Stmt>) -> EvalResult {
        self.interpreter.run(&Program { body })
    }

    /// Lines passed to `log` so far
    pub fn logged(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

/// Run `body` on a host loop with paused time. The program must return a
/// task, which is started and awaited.
pub fn run_task(harness: &Harness, body: Vec<Stmt>) -> Outcome {
    host::block_on(async {
        tokio::time::pause();
        let value = harness.run(body).expect("program threw");
        let task = value.as_task().expect("program did not return a task").clone();
        if task.status() == TaskStatus::Ready {
            task.start().expect("task failed to start");
        }
        task.settled().await
    })
    .expect("host loop failed")
}

/// Shorthand for a list of logged lines
pub fn lines(expected: &[&str]) -> Vec<String> {
    expected.iter().map(|s| s.to_string()).collect()
}
