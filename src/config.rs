//! Harness configuration

use crate::limiter::DEFAULT_MULTIPLIER;
use crate::metadata::Edition;
use crate::plan::skip_list::SkipList;
use std::path::PathBuf;

/// Default location of the test262 checkout
pub const DEFAULT_TEST262_ROOT: &str = "testdata/test262";

/// Directories walked by a full suite run, relative to the corpus root.
///
/// `test/language/literals` is left out: octal escape sequences in strict
/// mode are not supported yet.
pub const DEFAULT_DIRECTORIES: &[&str] = &[
    "test/language/expressions",
    "test/language/arguments-object",
    "test/language/asi",
    "test/language/directive-prologue",
    "test/language/function-code",
    "test/language/eval-code",
    "test/language/global-code",
    "test/language/identifier-resolution",
    "test/language/identifiers",
    "test/language/punctuators",
    "test/language/reserved-words",
    "test/language/source-text",
    "test/language/statements",
    "test/language/types",
    "test/language/white-space",
    "test/built-ins",
    "test/annexB/built-ins/String/prototype/substr",
];

/// Configuration for a suite run
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Path to the test262 repository root
    pub test262_root: PathBuf,
    /// Directories to walk, relative to the root
    pub directories: Vec<String>,
    /// Edition id a file must carry to be run
    pub edition: Edition,
    /// Files never run
    pub skip_list: SkipList,
    /// Files using any of these features are skipped
    pub unsupported_features: Vec<String>,
    /// Only run files whose path contains this substring
    pub filter: Option<String>,
    /// Run variants on parallel threads
    pub parallel: bool,
    /// Limiter slots per hardware thread
    pub concurrency_multiplier: usize,
    /// Skip the whole suite
    pub short: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            test262_root: PathBuf::from(DEFAULT_TEST262_ROOT),
            directories: DEFAULT_DIRECTORIES.iter().map(|d| d.to_string()).collect(),
            edition: Edition::default(),
            skip_list: SkipList::default(),
            unsupported_features: Vec::new(),
            filter: None,
            parallel: true,
            concurrency_multiplier: DEFAULT_MULTIPLIER,
            short: false,
        }
    }
}

impl HarnessConfig {
    /// Defaults, overridden by `TEST262_DIR` and `TEST262_SHORT`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(root) = std::env::var("TEST262_DIR") {
            if !root.is_empty() {
                config.test262_root = PathBuf::from(root);
            }
        }
        if let Ok(short) = std::env::var("TEST262_SHORT") {
            config.short = !matches!(short.as_str(), "" | "0" | "false");
        }
        config
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.test262_root = root.into();
        self
    }

    pub fn with_directories<I, S>(mut self, directories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directories = directories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_edition(mut self, edition: Edition) -> Self {
        self.edition = edition;
        self
    }

    pub fn with_skip_list(mut self, skip_list: SkipList) -> Self {
        self.skip_list = skip_list;
        self
    }

    pub fn with_unsupported_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unsupported_features = features.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_concurrency_multiplier(mut self, multiplier: usize) -> Self {
        self.concurrency_multiplier = multiplier;
        self
    }

    pub fn with_short(mut self, short: bool) -> Self {
        self.short = short;
        self
    }

    /// Directory holding `assert.js`, `sta.js` and the includes
    pub fn harness_dir(&self) -> PathBuf {
        self.test262_root.join("harness")
    }
}
