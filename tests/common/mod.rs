//! Shared test helpers for integration tests
//!
//! `ScriptEngine` is a tiny line-directive engine: it ignores JavaScript and
//! only reacts to `// @directive` lines, which is enough to produce every
//! outcome the harness has to adjudicate.
//!
//! | directive                  | effect                                         |
//! |----------------------------|------------------------------------------------|
//! | `@early-error <Type>`      | compile fails with `<Type>`                    |
//! | `@define <name>`           | run makes `<name>` available to later programs |
//! | `@use <name>`              | run throws ReferenceError if `<name>` is unset |
//! | `@throw <Type>`            | run throws an object built by `<Type>`         |
//! | `@throw-if-strict <Type>`  | as `@throw`, only under `'use strict'`         |
//! | `@throw-if-sloppy <Type>`  | as `@throw`, only without `'use strict'`       |
//! | `@throw-primitive`         | run throws a number                            |
//! | `@throw-no-constructor`    | run throws an object without a constructor     |
//! | `@throw-poisoned`          | run throws a value whose inspection panics     |
//! | `@sleep <ms>`              | run sleeps                                     |
//! | `@panic`                   | run panics                                     |

#![allow(dead_code)]

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use test262_harness::{CompileError, Context, Engine, HarnessConfig, ShapeError, ThrownValue};

// ============================================================================
// Scripted engine
// ============================================================================

/// Counters shared by every context of one engine
#[derive(Debug, Default)]
pub struct EngineStats {
    pub created: AtomicUsize,
    pub live: AtomicUsize,
    pub peak: AtomicUsize,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptEngine {
    pub stats: Arc<EngineStats>,
}

impl ScriptEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> usize {
        self.stats.created.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.stats.live.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.stats.peak.load(Ordering::SeqCst)
    }
}

impl Engine for ScriptEngine {
    type Context = ScriptContext;

    fn new_context(&self) -> ScriptContext {
        self.stats.created.fetch_add(1, Ordering::SeqCst);
        let live = self.stats.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak.fetch_max(live, Ordering::SeqCst);
        ScriptContext {
            stats: Arc::clone(&self.stats),
            defined: Vec::new(),
            last: None,
        }
    }
}

pub struct ScriptContext {
    stats: Arc<EngineStats>,
    defined: Vec<String>,
    last: Option<ScriptProgram>,
}

impl Drop for ScriptContext {
    fn drop(&mut self) {
        self.stats.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub struct ScriptProgram {
    name: String,
    strict: bool,
    directives: Vec<(String, String)>,
}

#[derive(Debug)]
pub enum ScriptThrown {
    Object { constructor: Option<String>, message: String },
    Primitive(String),
    /// Panics when its constructor is looked up
    Poisoned,
}

impl ScriptThrown {
    fn error(constructor: &str, message: impl Into<String>) -> Self {
        ScriptThrown::Object {
            constructor: Some(constructor.to_string()),
            message: message.into(),
        }
    }
}

impl fmt::Display for ScriptThrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptThrown::Object {
                constructor: Some(name),
                message,
            } => write!(f, "{}: {}", name, message),
            ScriptThrown::Object { constructor: None, message } => write!(f, "[object] {}", message),
            ScriptThrown::Primitive(value) => write!(f, "{}", value),
            ScriptThrown::Poisoned => write!(f, "[poisoned]"),
        }
    }
}

impl ThrownValue for ScriptThrown {
    fn constructor_name(&self) -> Result<String, ShapeError> {
        match self {
            ScriptThrown::Object {
                constructor: Some(name),
                ..
            } => Ok(name.clone()),
            ScriptThrown::Object { constructor: None, .. } => Err(ShapeError::NoConstructor),
            ScriptThrown::Primitive(_) => Err(ShapeError::NotAnObject),
            ScriptThrown::Poisoned => panic!("constructor lookup on a poisoned value"),
        }
    }
}

fn directives(source: &str) -> Vec<(String, String)> {
    source
        .lines()
        .filter_map(|line| line.trim().strip_prefix("//"))
        .filter_map(|line| line.trim().strip_prefix('@'))
        .map(|line| match line.split_once(' ') {
            Some((name, arg)) => (name.to_string(), arg.trim().to_string()),
            None => (line.to_string(), String::new()),
        })
        .collect()
}

impl Context for ScriptContext {
    type Program = ScriptProgram;
    type Thrown = ScriptThrown;

    fn compile(&mut self, name: &str, source: &str, strict: bool) -> Result<ScriptProgram, CompileError> {
        let program = ScriptProgram {
            name: name.to_string(),
            strict: strict || source.starts_with("'use strict';"),
            directives: directives(source),
        };
        self.last = Some(program.clone());

        for (directive, arg) in &program.directives {
            if directive == "early-error" {
                return Err(match arg.as_str() {
                    "SyntaxError" => CompileError::syntax(format!("{}: unexpected token", name)),
                    "ReferenceError" => CompileError::reference(format!("{}: invalid assignment target", name)),
                    other => CompileError::other(other, "unsupported construct"),
                });
            }
        }
        Ok(program)
    }

    fn run(&mut self, program: &ScriptProgram) -> Result<(), ScriptThrown> {
        for (directive, arg) in &program.directives {
            match directive.as_str() {
                "define" => self.defined.push(arg.clone()),
                "use" if !self.defined.contains(arg) => {
                    return Err(ScriptThrown::error("ReferenceError", format!("{} is not defined", arg)));
                }
                "throw" => return Err(ScriptThrown::error(arg, "thrown by test")),
                "throw-if-strict" if program.strict => return Err(ScriptThrown::error(arg, "strict")),
                "throw-if-sloppy" if !program.strict => return Err(ScriptThrown::error(arg, "sloppy")),
                "throw-primitive" => return Err(ScriptThrown::Primitive("42".to_string())),
                "throw-poisoned" => return Err(ScriptThrown::Poisoned),
                "throw-no-constructor" => {
                    return Err(ScriptThrown::Object {
                        constructor: None,
                        message: "bare".to_string(),
                    });
                }
                "sleep" => {
                    let ms = arg.parse().unwrap_or(0);
                    std::thread::sleep(Duration::from_millis(ms));
                }
                "panic" => panic!("scripted engine panic in {}", program.name),
                _ => {}
            }
        }
        Ok(())
    }

    fn dump_code(&self) -> Option<String> {
        self.last.as_ref().map(|program| {
            let mut out = format!("; program {}\n", program.name);
            for (directive, arg) in &program.directives {
                out.push_str(&format!("  {} {}\n", directive, arg));
            }
            out
        })
    }
}

// ============================================================================
// Temporary corpus
// ============================================================================

/// A throwaway test262 checkout with the bootstrap harness files in place
pub struct Corpus {
    dir: TempDir,
}

impl Corpus {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let corpus = Self { dir };
        corpus.harness("assert.js", "// @define assert\n");
        corpus.harness("sta.js", "// @define Test262Error\n");
        corpus
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `harness/<name>`
    pub fn harness(&self, name: &str, body: &str) -> &Self {
        self.raw(&format!("harness/{}", name), body)
    }

    /// Write a test file with `yaml` as its frontmatter
    pub fn test(&self, path: &str, yaml: &str, body: &str) -> &Self {
        self.raw(path, &format!("/*---\n{}\n---*/\n{}\n", yaml.trim(), body))
    }

    /// Write a file verbatim
    pub fn raw(&self, path: &str, content: &str) -> &Self {
        let full = self.dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
        self
    }

    /// Sequential configuration over `test/`
    pub fn config(&self) -> HarnessConfig {
        HarnessConfig::default()
            .with_root(self.root())
            .with_directories(["test"])
            .with_parallel(false)
    }
}
