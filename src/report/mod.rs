//! Conformance report
//!
//! Collects one [`TestResult`] per sub-test and renders the run as a plain
//! summary, JSON for CI, TAP, or a Markdown table.

use crate::metadata::NegativeExpectation;
use crate::plan::Variant;
use crate::validator::Verdict;
use std::collections::BTreeMap;
use std::time::Duration;

/// Result of a single sub-test
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Sub-test name: the path, plus `/strict mode` for the strict variant
    pub name: String,
    /// Test file path relative to the test262 root
    pub path: String,
    /// `None` for file-level results (skipped or unreadable files)
    pub variant: Option<Variant>,
    /// Test description from metadata
    pub description: String,
    pub outcome: TestOutcome,
    pub duration: Duration,
    /// Failure message
    pub error: Option<String>,
    /// Engine dump attached to phase/type mismatches
    pub diagnostics: Option<String>,
    /// Expected error (from negative metadata)
    pub expected_error: Option<NegativeExpectation>,
}

impl TestResult {
    /// A file-level result with no variant
    pub fn for_file(path: &str, outcome: TestOutcome, error: Option<String>) -> Self {
        Self {
            name: path.to_string(),
            path: path.to_string(),
            variant: None,
            description: String::new(),
            outcome,
            duration: Duration::ZERO,
            error,
            diagnostics: None,
            expected_error: None,
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "path": self.path,
            "variant": self.variant,
            "outcome": self.outcome.to_string(),
            "duration_ms": self.duration.as_millis(),
            "error": self.error,
            "diagnostics": self.diagnostics,
            "expected_error": self.expected_error,
        })
    }
}

/// Outcome of a sub-test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    Pass,
    /// The engine did not conform
    Fail,
    /// The harness could not run or judge the test
    Error,
    Skip,
}

impl TestOutcome {
    pub fn from_verdict(verdict: &Verdict) -> Self {
        match verdict {
            Verdict::Pass => TestOutcome::Pass,
            Verdict::Fail { .. } => TestOutcome::Fail,
            Verdict::HarnessFatal { .. } => TestOutcome::Error,
        }
    }
}

impl std::fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestOutcome::Pass => write!(f, "PASS"),
            TestOutcome::Fail => write!(f, "FAIL"),
            TestOutcome::Error => write!(f, "ERROR"),
            TestOutcome::Skip => write!(f, "SKIP"),
        }
    }
}

/// Results for a single corpus chapter (e.g. `built-ins/Array`)
#[derive(Debug, Clone, Default)]
pub struct ChapterResult {
    pub name: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub tests: Vec<TestResult>,
}

impl ChapterResult {
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64 * 100.0
        }
    }
}

/// Conformance report organized by chapter
#[derive(Debug, Clone, Default)]
pub struct ConformanceReport {
    pub chapters: BTreeMap<String, ChapterResult>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub skipped: usize,
    /// Files left out for lacking the edition marker; not sub-tests
    pub not_applicable: usize,
    /// Sum of the run durations
    pub total_time: Duration,
}

impl ConformanceReport {
    /// Overall pass rate as a percentage of non-skipped sub-tests
    pub fn pass_rate(&self) -> f64 {
        let runnable = self.total - self.skipped;
        if runnable == 0 {
            0.0
        } else {
            self.passed as f64 / runnable as f64 * 100.0
        }
    }

    /// Whether every sub-test passed or was skipped
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }

    /// Add a test result to the report
    pub fn add_result(&mut self, result: TestResult) {
        self.total += 1;
        match result.outcome {
            TestOutcome::Pass => self.passed += 1,
            TestOutcome::Fail => self.failed += 1,
            TestOutcome::Error => self.errors += 1,
            TestOutcome::Skip => self.skipped += 1,
        }
        self.total_time += result.duration;

        let chapter = chapter_of(&result.path);
        let entry = self.chapters.entry(chapter.clone()).or_insert_with(|| ChapterResult {
            name: chapter,
            ..Default::default()
        });
        entry.total += 1;
        match result.outcome {
            TestOutcome::Pass => entry.passed += 1,
            TestOutcome::Fail | TestOutcome::Error => entry.failed += 1,
            TestOutcome::Skip => {}
        }
        entry.tests.push(result);
    }

    /// Record a file that was left out of scope
    pub fn add_not_applicable(&mut self) {
        self.not_applicable += 1;
    }

    /// Find a sub-test by name
    pub fn result(&self, name: &str) -> Option<&TestResult> {
        self.results().find(|t| t.name == name)
    }

    /// Every recorded sub-test, chapter by chapter
    pub fn results(&self) -> impl Iterator<Item = &TestResult> {
        self.chapters.values().flat_map(|ch| ch.tests.iter())
    }

    /// Failing and errored sub-tests, sorted by name
    pub fn failing_tests(&self) -> Vec<&TestResult> {
        let mut failing: Vec<&TestResult> = self
            .results()
            .filter(|t| matches!(t.outcome, TestOutcome::Fail | TestOutcome::Error))
            .collect();
        failing.sort_by(|a, b| a.name.cmp(&b.name));
        failing
    }

    /// Format as a summary string
    pub fn format_summary(&self) -> String {
        let mut s = String::new();
        s.push_str("\n=== Test262 Conformance Report ===\n\n");
        s.push_str(&format!(
            "Total: {} | Pass: {} | Fail: {} | Error: {} | Skip: {} | Not applicable: {}\n",
            self.total, self.passed, self.failed, self.errors, self.skipped, self.not_applicable
        ));
        s.push_str(&format!(
            "Pass Rate: {:.1}% ({}/{})\n",
            self.pass_rate(),
            self.passed,
            self.total - self.skipped
        ));
        s.push_str(&format!("Time: {:?}\n\n", self.total_time));

        s.push_str("Per-Chapter Results:\n");
        s.push_str(&format!(
            "{:<40} {:>6} {:>6} {:>6} {:>7}\n",
            "Chapter", "Total", "Pass", "Fail", "Rate"
        ));
        s.push_str(&"-".repeat(71));
        s.push('\n');

        for chapter in self.chapters.values() {
            s.push_str(&format!(
                "{:<40} {:>6} {:>6} {:>6} {:>6.1}%\n",
                chapter.name,
                chapter.total,
                chapter.passed,
                chapter.failed,
                chapter.pass_rate()
            ));
        }

        let failing = self.failing_tests();
        if !failing.is_empty() {
            s.push_str("\nFailing:\n");
            for test in failing {
                s.push_str(&format!("  {} {}\n", test.outcome, test.name));
            }
        }

        s
    }

    /// Export as JSON
    pub fn to_json(&self) -> serde_json::Value {
        let chapters: serde_json::Map<String, serde_json::Value> = self
            .chapters
            .iter()
            .map(|(name, ch)| {
                (
                    name.clone(),
                    serde_json::json!({
                        "total": ch.total,
                        "passed": ch.passed,
                        "failed": ch.failed,
                        "pass_rate": ch.pass_rate(),
                    }),
                )
            })
            .collect();
        let failing: Vec<serde_json::Value> = self.failing_tests().iter().map(|t| t.to_json()).collect();

        serde_json::json!({
            "total": self.total,
            "passed": self.passed,
            "failed": self.failed,
            "errors": self.errors,
            "skipped": self.skipped,
            "not_applicable": self.not_applicable,
            "pass_rate": self.pass_rate(),
            "total_time_ms": self.total_time.as_millis(),
            "chapters": chapters,
            "failing": failing,
        })
    }

    /// Export as TAP (Test Anything Protocol) for CI
    pub fn to_tap(&self) -> String {
        let results: Vec<&TestResult> = self.results().collect();

        let mut s = format!("TAP version 13\n1..{}\n", results.len());
        for (i, test) in results.iter().enumerate() {
            let n = i + 1;
            match test.outcome {
                TestOutcome::Pass => {
                    s.push_str(&format!("ok {} - {}\n", n, test.name));
                }
                TestOutcome::Skip => {
                    let reason = test.error.as_deref().unwrap_or("skipped");
                    s.push_str(&format!("ok {} - {} # SKIP {}\n", n, test.name, reason));
                }
                TestOutcome::Fail | TestOutcome::Error => {
                    s.push_str(&format!("not ok {} - {}\n", n, test.name));
                    if let Some(ref err) = test.error {
                        s.push_str(&format!("  ---\n  message: {}\n  ---\n", err));
                    }
                }
            }
        }
        s
    }

    /// Export as Markdown table
    pub fn to_markdown(&self) -> String {
        let mut s = String::new();
        let badge = if self.pass_rate() >= 90.0 {
            "🟢"
        } else if self.pass_rate() >= 70.0 {
            "🟡"
        } else {
            "🔴"
        };

        s.push_str(&format!("## {} Test262 Conformance: {:.1}%\n\n", badge, self.pass_rate()));
        s.push_str(&format!(
            "**{} passed** / {} runnable ({} skipped, {} errors)\n\n",
            self.passed,
            self.total - self.skipped,
            self.skipped,
            self.errors,
        ));
        s.push_str("| Chapter | Total | Pass | Fail | Rate |\n");
        s.push_str("|---------|------:|-----:|-----:|-----:|\n");
        for chapter in self.chapters.values() {
            s.push_str(&format!(
                "| {} | {} | {} | {} | {:.1}% |\n",
                chapter.name,
                chapter.total,
                chapter.passed,
                chapter.failed,
                chapter.pass_rate(),
            ));
        }
        s
    }
}

/// Chapter key: the two path components after `test/`
fn chapter_of(path: &str) -> String {
    let rest = path.strip_prefix("test/").unwrap_or(path);
    let mut parts = rest.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), Some(_)) => format!("{}/{}", a, b),
        (Some(a), _, _) if !a.is_empty() => a.to_string(),
        _ => "unknown".to_string(),
    }
}
