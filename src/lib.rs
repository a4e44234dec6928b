//! test262-harness: drives a JavaScript engine through the test262 corpus
//!
//! The harness walks a checkout of the conformance corpus, reads the YAML
//! frontmatter of each test file, decides which variants to run, executes
//! each variant in a fresh context of the engine under test and checks the
//! outcome against the file's declared expectation.
//!
//! # Quick Start
//!
//! ```no_run
//! use test262_harness::{Engine, HarnessConfig, Suite, SuiteStatus};
//!
//! fn conformance<E: Engine>(engine: E) {
//!     let config = HarnessConfig::from_env();
//!     match Suite::new(engine, config).run() {
//!         SuiteStatus::Skipped(reason) => println!("skipped: {}", reason),
//!         SuiteStatus::Completed(report) => print!("{}", report.format_summary()),
//!     }
//! }
//! ```
//!
//! # Module Overview
//!
//! A file flows: [`walker`] → [`metadata`] → [`plan`] → [`execution`] →
//! [`validator`] → [`report`], with [`suite`] tying the steps together and
//! [`limiter`] bounding how many engine contexts are alive at once.
//!
//! | Category | Modules |
//! |----------|---------|
//! | **Input** | [`walker`], [`metadata`], [`plan`], [`config`] |
//! | **Engine** | [`engine`], [`execution`], [`limiter`] |
//! | **Output** | [`validator`], [`report`], [`suite`] |

pub mod config;
pub mod engine;
pub mod execution;
pub mod limiter;
pub mod metadata;
pub mod plan;
pub mod report;
pub mod suite;
pub mod validator;
pub mod walker;

mod error;

pub use config::HarnessConfig;
pub use engine::{CompileError, Context, Engine, EngineFailure, ExecutionOutcome, ShapeError, ThrownValue};
pub use error::{HarnessError, Result};
pub use metadata::{Edition, Flags, NegativeExpectation, Phase, TestMetadata};
pub use plan::{FilePlan, RunSpec, Variant};
pub use report::{ConformanceReport, TestOutcome, TestResult};
pub use suite::{Suite, SuiteStatus};
pub use validator::Verdict;

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
