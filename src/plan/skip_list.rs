//! Files the harness never runs
//!
//! Every entry is a known environment-specific non-conformance (string
//! representation, host timezone, property enumeration order), not an engine
//! bug. Entries are keyed by path relative to the corpus root.

use rustc_hash::FxHashMap as HashMap;

const DEFAULT_ENTRIES: &[(&str, &str)] = &[
    ("test/language/literals/regexp/S7.8.5_A1.1_T2.js", "UTF-16"),
    ("test/language/literals/regexp/S7.8.5_A1.4_T2.js", "UTF-16"),
    ("test/language/literals/regexp/S7.8.5_A2.1_T2.js", "UTF-16"),
    ("test/language/literals/regexp/S7.8.5_A2.4_T2.js", "UTF-16"),
    ("test/built-ins/Date/prototype/toISOString/15.9.5.43-0-9.js", "timezone"),
    ("test/built-ins/Date/prototype/toISOString/15.9.5.43-0-10.js", "timezone"),
    ("test/built-ins/Object/getOwnPropertyNames/15.2.3.4-4-44.js", "property order"),
];

/// Relative path → rationale
#[derive(Debug, Clone)]
pub struct SkipList {
    entries: HashMap<String, String>,
}

impl SkipList {
    /// An empty list
    pub fn empty() -> Self {
        Self {
            entries: HashMap::default(),
        }
    }

    /// Add an entry
    pub fn insert(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.entries.insert(path.into(), reason.into());
    }

    /// Rationale for skipping `path`, if it is listed
    pub fn reason(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SkipList {
    fn default() -> Self {
        let mut list = Self::empty();
        for (path, reason) in DEFAULT_ENTRIES {
            list.insert(*path, *reason);
        }
        list
    }
}
