//! Running one variant of one test against a fresh engine context
//!
//! A run loads the fixed bootstrap files (`assert.js`, `sta.js`) and the
//! file's declared includes, compiles the test source and runs it. The phase
//! starts out [`Phase::Early`] and flips to [`Phase::Runtime`] at the moment
//! the compiled test body starts, so a failure while loading or compiling
//! anything is early by construction.

use crate::engine::{Context, Engine, EngineFailure, ExecutionOutcome};
use crate::metadata::Phase;
use crate::plan::RunSpec;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{trace, warn};

/// Harness files loaded into every context before the includes
pub const BOOTSTRAP_FILES: &[&str] = &["assert.js", "sta.js"];

/// Result of executing a [`RunSpec`]
pub struct Execution<C: Context> {
    pub outcome: ExecutionOutcome<C::Thrown>,
    pub duration: Duration,
    /// The context the run used; `None` if the engine panicked
    context: Option<C>,
}

impl<C: Context> Execution<C> {
    /// IR dump of the last program the context compiled
    pub fn dump_code(&self) -> Option<String> {
        self.context.as_ref().and_then(|ctx| ctx.dump_code())
    }
}

/// Execute one run in a new context created from `engine`.
///
/// There are no retries; the first failure ends the run. A panic inside the
/// engine is caught and reported as a failure at the phase reached so far.
pub fn execute<E: Engine>(engine: &E, harness_dir: &Path, spec: &RunSpec) -> Execution<E::Context> {
    let start = Instant::now();
    let mut phase = Phase::Early;

    trace!(name = %spec.name(), "starting run");
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut context = engine.new_context();
        let result = run_in_context(&mut context, harness_dir, spec, &mut phase);
        (result, context)
    }));

    let (outcome, context) = match result {
        Ok((Ok(()), context)) => (ExecutionOutcome::Success, Some(context)),
        Ok((Err(failure), context)) => (ExecutionOutcome::Failure { failure, phase }, Some(context)),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(name = %spec.name(), %phase, %message, "engine panicked");
            let failure = EngineFailure::Panic(message);
            (ExecutionOutcome::Failure { failure, phase }, None)
        }
    };

    Execution {
        outcome,
        duration: start.elapsed(),
        context,
    }
}

fn run_in_context<C: Context>(
    context: &mut C,
    harness_dir: &Path,
    spec: &RunSpec,
    phase: &mut Phase,
) -> Result<(), EngineFailure<C::Thrown>> {
    let includes = spec.metadata.includes.iter().map(String::as_str);
    for file in BOOTSTRAP_FILES.iter().copied().chain(includes) {
        load_harness_file(context, harness_dir, file)?;
    }

    let program = context
        .compile(&spec.path, &spec.source, false)
        .map_err(EngineFailure::Compile)?;

    *phase = Phase::Runtime;
    context.run(&program).map_err(EngineFailure::Thrown)
}

fn load_harness_file<C: Context>(
    context: &mut C,
    harness_dir: &Path,
    file: &str,
) -> Result<(), EngineFailure<C::Thrown>> {
    let path = harness_dir.join(file);
    let source = std::fs::read_to_string(&path).map_err(|e| EngineFailure::Load {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let name = format!("harness/{}", file);
    let program = context
        .compile(&name, &source, false)
        .map_err(EngineFailure::Compile)?;
    context.run(&program).map_err(EngineFailure::Thrown)
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "VM panic (internal error)".to_string()
    }
}
