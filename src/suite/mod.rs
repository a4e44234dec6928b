//! Whole-suite driver
//!
//! Walks the configured corpus directories, plans every file and runs each
//! selected variant as its own sub-test. Runs take a limiter permit before
//! they start; with `parallel` set they then execute on their own scoped
//! thread, otherwise inline. Nothing a run does can stop the suite: every
//! problem ends up as a result in the report.

use crate::config::HarnessConfig;
use crate::engine::Engine;
use crate::execution;
use crate::limiter::ConcurrencyLimiter;
use crate::plan::{self, FilePlan, RunSpec};
use crate::report::{ConformanceReport, TestOutcome, TestResult};
use crate::validator;
use crate::walker;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::thread::Scope;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Where to get the corpus from
pub const TEST262_REPOSITORY: &str = "https://github.com/tc39/test262";

/// Result of [`Suite::run`]
#[derive(Debug)]
pub enum SuiteStatus {
    /// The suite did not run at all
    Skipped(String),
    Completed(ConformanceReport),
}

impl SuiteStatus {
    pub fn report(&self) -> Option<&ConformanceReport> {
        match self {
            SuiteStatus::Skipped(_) => None,
            SuiteStatus::Completed(report) => Some(report),
        }
    }
}

enum Target<'a> {
    Corpus,
    File(&'a str),
}

/// Runs the corpus against one engine
pub struct Suite<E: Engine> {
    engine: E,
    config: HarnessConfig,
    limiter: ConcurrencyLimiter,
}

impl<E: Engine> Suite<E> {
    pub fn new(engine: E, config: HarnessConfig) -> Self {
        let limiter = ConcurrencyLimiter::for_available_parallelism(config.concurrency_multiplier);
        Self {
            engine,
            config,
            limiter,
        }
    }

    /// Replace the limiter sized from the machine with a fixed one
    pub fn with_limiter(mut self, limiter: ConcurrencyLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Run every configured directory
    pub fn run(&self) -> SuiteStatus {
        if let Some(reason) = self.precondition() {
            info!(%reason, "test262 suite skipped");
            return SuiteStatus::Skipped(reason);
        }

        info!(
            root = %self.config.test262_root.display(),
            directories = self.config.directories.len(),
            capacity = self.limiter.capacity(),
            parallel = self.config.parallel,
            "running test262 suite"
        );
        let report = self.run_target(Target::Corpus);
        info!(
            total = report.total,
            passed = report.passed,
            failed = report.failed,
            errors = report.errors,
            skipped = report.skipped,
            "test262 suite finished"
        );
        SuiteStatus::Completed(report)
    }

    /// Run a single corpus file, e.g. `test/language/types/number/8.5.1.js`
    pub fn run_file(&self, path: &str) -> ConformanceReport {
        self.run_target(Target::File(path))
    }

    /// Reason the suite cannot run, if any
    fn precondition(&self) -> Option<String> {
        if self.config.short {
            return Some("short mode".to_string());
        }
        let root = &self.config.test262_root;
        match std::fs::metadata(root) {
            Ok(_) => None,
            Err(err) => Some(format!(
                "If you want to run tc39 tests, download them from {} and put into {}. ({})",
                TEST262_REPOSITORY,
                root.display(),
                err
            )),
        }
    }

    fn run_target(&self, target: Target<'_>) -> ConformanceReport {
        let (sink, results) = mpsc::channel();
        let mut not_applicable = 0;

        std::thread::scope(|scope| match target {
            Target::Corpus => {
                for dir in &self.config.directories {
                    self.run_directory(scope, dir, &sink, &mut not_applicable);
                }
            }
            Target::File(path) => {
                let file_plan = plan::plan_file(&self.config, path);
                self.run_planned(scope, path, file_plan, &sink, &mut not_applicable);
            }
        });
        drop(sink);

        let mut report = ConformanceReport::default();
        for result in results {
            report.add_result(result);
        }
        for _ in 0..not_applicable {
            report.add_not_applicable();
        }
        report
    }

    fn run_directory<'scope, 'env>(
        &'env self,
        scope: &'scope Scope<'scope, 'env>,
        dir: &str,
        sink: &Sender<TestResult>,
        not_applicable: &mut usize,
    ) {
        let files = match walker::walk(&self.config.test262_root, dir) {
            Ok(files) => files,
            Err(err) => {
                warn!(dir, %err, "could not walk directory");
                send(sink, TestResult::for_file(dir, TestOutcome::Error, Some(err.to_string())));
                return;
            }
        };

        for path in files {
            if !plan::matches_filter(&self.config, &path) {
                continue;
            }
            let file_plan = plan::plan_file(&self.config, &path);
            self.run_planned(scope, &path, file_plan, sink, not_applicable);
        }
    }

    fn run_planned<'scope, 'env>(
        &'env self,
        scope: &'scope Scope<'scope, 'env>,
        path: &str,
        file_plan: FilePlan,
        sink: &Sender<TestResult>,
        not_applicable: &mut usize,
    ) {
        match file_plan {
            FilePlan::Skipped { reason } => {
                send(sink, TestResult::for_file(path, TestOutcome::Skip, Some(reason)));
            }
            FilePlan::NotApplicable => *not_applicable += 1,
            FilePlan::Invalid(err) => {
                warn!(path, %err, "could not parse test file");
                let message = format!("Could not parse {}: {}", path, err);
                send(sink, TestResult::for_file(path, TestOutcome::Error, Some(message)));
            }
            FilePlan::Run(runs) => {
                for spec in runs {
                    self.spawn_run(scope, spec, sink);
                }
            }
        }
    }

    fn spawn_run<'scope, 'env>(&'env self, scope: &'scope Scope<'scope, 'env>, spec: RunSpec, sink: &Sender<TestResult>) {
        let permit = self.limiter.acquire();
        if self.config.parallel {
            let sink = sink.clone();
            scope.spawn(move || {
                let _permit = permit;
                send(&sink, self.run_spec(&spec));
            });
        } else {
            send(sink, self.run_spec(&spec));
            drop(permit);
        }
    }

    /// Execute and validate one run.
    ///
    /// Validation calls back into the engine (thrown value inspection, the
    /// code dump, dropping the context), so a panic anywhere in here is
    /// turned into an error result for this run alone.
    fn run_spec(&self, spec: &RunSpec) -> TestResult {
        let name = spec.name();
        let start = Instant::now();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let execution = execution::execute(&self.engine, &self.config.harness_dir(), spec);
            let verdict = validator::validate(&name, &spec.metadata, &execution);
            debug!(%name, %verdict, "run finished");

            TestResult {
                outcome: TestOutcome::from_verdict(&verdict),
                error: verdict.message().map(str::to_string),
                diagnostics: verdict.diagnostics().map(str::to_string),
                name: name.clone(),
                path: spec.path.clone(),
                variant: Some(spec.variant),
                description: spec.metadata.description.clone(),
                duration: execution.duration,
                expected_error: spec.metadata.negative.clone(),
            }
        }));

        result.unwrap_or_else(|payload| {
            let message = execution::panic_message(payload.as_ref());
            warn!(%name, %message, "engine panicked while the run was validated");
            TestResult {
                outcome: TestOutcome::Error,
                error: Some(format!("{}: engine panic: {}", name, message)),
                diagnostics: None,
                path: spec.path.clone(),
                variant: Some(spec.variant),
                description: spec.metadata.description.clone(),
                duration: start.elapsed(),
                expected_error: spec.metadata.negative.clone(),
                name,
            }
        })
    }
}

// The receiver outlives every run, so a failed send cannot happen.
fn send(sink: &Sender<TestResult>, result: TestResult) {
    let _ = sink.send(result);
}
