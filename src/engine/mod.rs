//! Engine capability surface
//!
//! The harness never looks inside the engine it drives. Everything it needs
//! is captured by three traits: an [`Engine`] hands out fresh isolated
//! [`Context`]s, a context compiles source into a program and runs it, and
//! whatever the engine throws must implement [`ThrownValue`] so the harness
//! can read the name of the thrown object's constructor.

use crate::metadata::Phase;
use std::fmt;

/// Factory for isolated execution contexts.
///
/// Implementations must not share mutable global state between contexts: a
/// context created for one test must never observe anything done in another.
/// The engine itself is shared across runner threads, the contexts it
/// creates are not.
pub trait Engine: Sync {
    type Context: Context;

    /// Create a fresh context with no prior state
    fn new_context(&self) -> Self::Context;
}

/// A single isolated engine instance
pub trait Context {
    /// Compiled, runnable unit
    type Program;
    /// Value carried by a run-time throw
    type Thrown: ThrownValue;

    /// Compile `source` under `name`.
    ///
    /// When `strict` is false the engine must still honour a `'use strict'`
    /// directive at the top of the source.
    fn compile(&mut self, name: &str, source: &str, strict: bool) -> Result<Self::Program, CompileError>;

    /// Run a compiled program to completion
    fn run(&mut self, program: &Self::Program) -> Result<(), Self::Thrown>;

    /// Human-readable dump of the most recently compiled program, if the
    /// engine can produce one
    fn dump_code(&self) -> Option<String> {
        None
    }
}

/// Inspection of a value thrown by a running program.
///
/// This is the only thing the harness asks of a thrown value: that it is an
/// object whose `constructor` is an object with a `name`.
pub trait ThrownValue: fmt::Display {
    fn constructor_name(&self) -> Result<String, ShapeError>;
}

/// Why a thrown value could not be classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// The thrown value is a primitive
    NotAnObject,
    /// The object has no `constructor` property
    NoConstructor,
    /// `constructor` is present but is not an object
    ConstructorNotObject,
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeError::NotAnObject => write!(f, "error is not an object"),
            ShapeError::NoConstructor => write!(f, "error does not have a constructor"),
            ShapeError::ConstructorNotObject => write!(f, "error constructor is not an object"),
        }
    }
}

/// Category of a compile-time error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// Invalid syntax, including static semantics errors
    Syntax,
    /// Unresolvable reference detected at compile time
    Reference,
    /// Anything else the engine reports while compiling
    Other(String),
}

/// Error returned by [`Context::compile`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub message: String,
}

impl CompileError {
    pub fn syntax(message: impl Into<String>) -> Self {
        Self {
            kind: CompileErrorKind::Syntax,
            message: message.into(),
        }
    }

    pub fn reference(message: impl Into<String>) -> Self {
        Self {
            kind: CompileErrorKind::Reference,
            message: message.into(),
        }
    }

    pub fn other(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: CompileErrorKind::Other(category.into()),
            message: message.into(),
        }
    }

    /// JavaScript error type this compile error corresponds to
    pub fn error_type(&self) -> Option<&'static str> {
        match self.kind {
            CompileErrorKind::Syntax => Some("SyntaxError"),
            CompileErrorKind::Reference => Some("ReferenceError"),
            CompileErrorKind::Other(_) => None,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            CompileErrorKind::Syntax => write!(f, "SyntaxError: {}", self.message),
            CompileErrorKind::Reference => write!(f, "ReferenceError: {}", self.message),
            CompileErrorKind::Other(category) => write!(f, "{}: {}", category, self.message),
        }
    }
}

// ============================================================================
// Failures
// ============================================================================

/// Everything that can stop a run
#[derive(Debug)]
pub enum EngineFailure<T> {
    /// A value thrown while running a program
    Thrown(T),
    /// The engine rejected a source while compiling it
    Compile(CompileError),
    /// A harness file could not be read
    Load { path: String, message: String },
    /// The engine panicked
    Panic(String),
}

impl<T: ThrownValue> EngineFailure<T> {
    /// The JavaScript error type of this failure.
    ///
    /// Failures that fit neither a thrown error object nor a known compile
    /// error category are reported as `Err`; they mean the harness does not
    /// understand what the engine produced.
    pub fn error_type(&self) -> Result<String, String> {
        match self {
            EngineFailure::Thrown(value) => value
                .constructor_name()
                .map_err(|shape| format!("{} ({})", shape, value)),
            EngineFailure::Compile(err) => err
                .error_type()
                .map(str::to_string)
                .ok_or_else(|| format!("error is not a JS error: {}", err)),
            EngineFailure::Load { .. } | EngineFailure::Panic(_) => {
                Err(format!("error is not a JS error: {}", self))
            }
        }
    }
}

impl<T: fmt::Display> fmt::Display for EngineFailure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineFailure::Thrown(value) => write!(f, "{}", value),
            EngineFailure::Compile(err) => write!(f, "{}", err),
            EngineFailure::Load { path, message } => write!(f, "failed to load {}: {}", path, message),
            EngineFailure::Panic(message) => write!(f, "engine panic: {}", message),
        }
    }
}

/// Classified result of one run
#[derive(Debug)]
pub enum ExecutionOutcome<T> {
    Success,
    Failure { failure: EngineFailure<T>, phase: Phase },
}

impl<T> ExecutionOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success)
    }

    /// Phase of the failure, if the run failed
    pub fn phase(&self) -> Option<Phase> {
        match self {
            ExecutionOutcome::Success => None,
            ExecutionOutcome::Failure { phase, .. } => Some(*phase),
        }
    }
}
