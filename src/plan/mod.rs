//! Run planning
//!
//! Decides, per corpus file, whether it runs at all and in which variants.
//! Planning only reads files; nothing here touches an engine, so a plan can
//! be inspected (see the `plan` CLI command) or handed to the suite runner.

pub mod skip_list;

use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::metadata::{Flags, TestMetadata};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Prepended to the source of the strict variant
pub const STRICT_PREFIX: &str = "'use strict';\n";

/// One execution mode of a test file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    NonStrict,
    Strict,
}

impl Variant {
    /// Sub-test suffix; empty for the plain variant
    pub fn name(&self) -> &'static str {
        match self {
            Variant::NonStrict => "",
            Variant::Strict => "strict mode",
        }
    }

    /// Name of this variant's sub-test under `path`
    pub fn sub_test_name(&self, path: &str) -> String {
        match self {
            Variant::NonStrict => path.to_string(),
            Variant::Strict => format!("{}/{}", path, self.name()),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::NonStrict => write!(f, "non-strict"),
            Variant::Strict => write!(f, "strict"),
        }
    }
}

/// Variants `metadata` asks for.
///
/// `raw` forces the plain variant only; otherwise `onlyStrict` drops the
/// plain variant and `noStrict` drops the strict one.
pub fn select_variants(metadata: &TestMetadata) -> Vec<Variant> {
    let raw = metadata.has_flag(Flags::RAW);
    let mut variants = Vec::with_capacity(2);
    if raw || !metadata.has_flag(Flags::ONLY_STRICT) {
        variants.push(Variant::NonStrict);
    }
    if !raw && !metadata.has_flag(Flags::NO_STRICT) {
        variants.push(Variant::Strict);
    }
    variants
}

/// A single (file, variant) run
#[derive(Debug, Clone)]
pub struct RunSpec {
    /// Path relative to the corpus root
    pub path: String,
    pub variant: Variant,
    /// Source handed to the engine, strict prefix included
    pub source: Arc<str>,
    pub metadata: Arc<TestMetadata>,
}

impl RunSpec {
    /// Sub-test name, e.g. `test/a.js/strict mode`
    pub fn name(&self) -> String {
        self.variant.sub_test_name(&self.path)
    }
}

/// What to do with one file
#[derive(Debug)]
pub enum FilePlan {
    /// Listed on the skip-list or using an unsupported feature
    Skipped { reason: String },
    /// Lacks the configured edition marker; not part of this corpus scope
    NotApplicable,
    /// Metadata could not be read; reported as a harness error
    Invalid(HarnessError),
    /// Runs to execute, one per selected variant
    Run(Vec<RunSpec>),
}

impl FilePlan {
    pub fn runs(&self) -> &[RunSpec] {
        match self {
            FilePlan::Run(runs) => runs,
            _ => &[],
        }
    }
}

/// Plan one file whose source has already been read
pub fn plan_source(config: &HarnessConfig, path: &str, source: String) -> FilePlan {
    if let Some(reason) = config.skip_list.reason(path) {
        debug!(path, reason, "on skip list");
        return FilePlan::Skipped {
            reason: format!("Test is on skip list ({})", reason),
        };
    }

    let metadata = match TestMetadata::extract(&source) {
        Ok((metadata, _)) => metadata,
        Err(err) => return FilePlan::Invalid(err),
    };

    if metadata.edition_id(config.edition).is_none() {
        debug!(path, edition = %config.edition, "not applicable");
        return FilePlan::NotApplicable;
    }

    if let Some(feature) = metadata
        .features
        .iter()
        .find(|f| config.unsupported_features.contains(f))
    {
        return FilePlan::Skipped {
            reason: format!("unsupported feature: {}", feature),
        };
    }

    let metadata = Arc::new(metadata);
    let plain: Arc<str> = Arc::from(source);
    let runs = select_variants(&metadata)
        .into_iter()
        .map(|variant| RunSpec {
            path: path.to_string(),
            variant,
            source: match variant {
                Variant::NonStrict => Arc::clone(&plain),
                Variant::Strict => Arc::from(format!("{}{}", STRICT_PREFIX, plain)),
            },
            metadata: Arc::clone(&metadata),
        })
        .collect();
    FilePlan::Run(runs)
}

/// Plan one file, reading it from the corpus root
pub fn plan_file(config: &HarnessConfig, path: &str) -> FilePlan {
    // Skip-listed files are never opened.
    if let Some(reason) = config.skip_list.reason(path) {
        debug!(path, reason, "on skip list");
        return FilePlan::Skipped {
            reason: format!("Test is on skip list ({})", reason),
        };
    }
    match read_source(config, path) {
        Ok(source) => plan_source(config, path, source),
        Err(err) => FilePlan::Invalid(err),
    }
}

/// Plan every file in `files`, dropping the ones outside `config.filter`
pub fn plan_runs(config: &HarnessConfig, files: &[String]) -> Vec<(String, FilePlan)> {
    files
        .iter()
        .filter(|path| matches_filter(config, path))
        .map(|path| (path.clone(), plan_file(config, path)))
        .collect()
}

/// Whether `path` passes the configured path filter
pub fn matches_filter(config: &HarnessConfig, path: &str) -> bool {
    config
        .filter
        .as_deref()
        .map_or(true, |pattern| path.contains(pattern))
}

fn read_source(config: &HarnessConfig, path: &str) -> Result<String> {
    let full = config.test262_root.join(path);
    std::fs::read_to_string(&full).map_err(|e| HarnessError::io(full, e))
}
