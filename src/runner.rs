//! Spec tree execution.
//!
//! Walks a [`SpecNode`] tree depth-first, applying the hook scoping
//! rules and tallying one [`Report`] entry per completed test. Result
//! lines print as each test finishes, never batched.

use crate::context::{ExecutionContext, StepError};
use crate::report::Report;
use crate::tree::{NodeKind, SpecNode};
use std::path::Path;

/// A failure raised inside a lifecycle hook. Never caught: fixtures are
/// trusted preconditions, and a broken one invalidates the whole run.
#[derive(Debug)]
pub struct HookError {
    pub kind: NodeKind,
    pub source: StepError,
}

impl std::fmt::Display for HookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} hook failed: {}", self.kind.label(), self.source)
    }
}

impl std::error::Error for HookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Walks one spec tree against the program under test.
pub struct SpecRunner<'a> {
    program: &'a Path,
    basedir: &'a Path,
}

impl<'a> SpecRunner<'a> {
    pub fn new(program: &'a Path, basedir: &'a Path) -> Self {
        Self { program, basedir }
    }

    /// Run a suite node, returning the merged report for it and all of
    /// its descendants.
    pub fn run(&self, node: &SpecNode) -> Result<Report, HookError> {
        debug_assert_eq!(node.kind(), NodeKind::Suite);

        if let Some(name) = node.name() {
            println!("  {name}");
        }

        let mut report = Report::default();
        for suite in node.child_suites() {
            report = report.merge(self.run(suite)?);
        }

        let tests: Vec<&SpecNode> = node.tests().collect();
        if tests.is_empty() {
            // Transparent suite: descendants already ran, its own hooks
            // never execute.
            return Ok(report);
        }

        let mut ctx = ExecutionContext::new(self.program, self.basedir);
        self.run_hooks(node, NodeKind::BeforeAll, &mut ctx)?;

        for test in tests {
            self.run_hooks(node, NodeKind::BeforeEach, &mut ctx)?;

            let name = test.name().unwrap_or_default();
            match run_body(test, &mut ctx) {
                Ok(()) => {
                    println!("    [ok] {name}");
                    report.add_passed();
                }
                Err(e) => {
                    println!("    [ko] {name}");
                    println!("         {e}");
                    report.add_failed();
                }
            }

            self.run_hooks(node, NodeKind::AfterEach, &mut ctx)?;
        }

        self.run_hooks(node, NodeKind::AfterAll, &mut ctx)?;
        Ok(report)
    }

    fn run_hooks(
        &self,
        suite: &SpecNode,
        kind: NodeKind,
        ctx: &mut ExecutionContext,
    ) -> Result<(), HookError> {
        for hook in suite.hooks(kind) {
            for step in hook.body() {
                ctx.eval(step)
                    .map_err(|source| HookError { kind, source })?;
            }
        }
        Ok(())
    }
}

/// Evaluate a test body. This is the only place a failing body is
/// caught: the first failing step skips the rest of this body and
/// nothing beyond it.
fn run_body(test: &SpecNode, ctx: &mut ExecutionContext) -> Result<(), StepError> {
    for step in test.body() {
        ctx.eval(step)?;
    }
    Ok(())
}
