//! Test262 front matter
//!
//! Every test262 file carries a YAML document between `/*---` and `---*/`
//! describing how the file is meant to be run: the negative expectation (if
//! the file must fail), the harness includes to load first, execution flags
//! and the edition ids that scope it to a version of the language.
//!
//! # Example
//!
//! ```
//! use test262_harness::metadata::{Flags, Phase, TestMetadata};
//!
//! let source = "/*---\nes5id: 8.7.2\nnegative:\n  phase: early\n  type: SyntaxError\nflags: [onlyStrict]\n---*/\nvar x = 1;\n";
//! let (meta, body) = TestMetadata::extract(source).unwrap();
//! let negative = meta.negative.as_ref().unwrap();
//! assert_eq!(negative.phase, Phase::Early);
//! assert_eq!(negative.error_type, "SyntaxError");
//! assert!(meta.has_flag(Flags::ONLY_STRICT));
//! assert_eq!(body, source);
//! ```

use crate::error::{HarnessError, Result};
use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Opening delimiter of the metadata block
pub const META_START: &str = "/*---";
/// Closing delimiter of the metadata block
pub const META_END: &str = "---*/";

// ============================================================================
// Phase
// ============================================================================

/// When a failure happened relative to the start of the test body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Bootstrap loading or compilation
    Early,
    /// While the compiled test body was executing
    Runtime,
}

impl Phase {
    /// Map a front matter phase name onto a phase.
    ///
    /// Newer corpora spell early errors `parse`, and module linking errors
    /// `resolution`; both happen before the body runs.
    pub fn from_name(name: &str) -> Option<Phase> {
        match name {
            "early" | "parse" | "resolution" => Some(Phase::Early),
            "runtime" => Some(Phase::Runtime),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Early => write!(f, "early"),
            Phase::Runtime => write!(f, "runtime"),
        }
    }
}

// ============================================================================
// Flags
// ============================================================================

bitflags! {
    /// Execution modifiers from the `flags:` list
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u16 {
        const ONLY_STRICT = 1 << 0;
        const NO_STRICT = 1 << 1;
        const RAW = 1 << 2;
        const MODULE = 1 << 3;
        const ASYNC = 1 << 4;
        const GENERATED = 1 << 5;
        const CAN_BLOCK_IS_FALSE = 1 << 6;
        const CAN_BLOCK_IS_TRUE = 1 << 7;
        const NON_DETERMINISTIC = 1 << 8;
    }
}

const FLAG_NAMES: &[(&str, Flags)] = &[
    ("onlyStrict", Flags::ONLY_STRICT),
    ("noStrict", Flags::NO_STRICT),
    ("raw", Flags::RAW),
    ("module", Flags::MODULE),
    ("async", Flags::ASYNC),
    ("generated", Flags::GENERATED),
    ("CanBlockIsFalse", Flags::CAN_BLOCK_IS_FALSE),
    ("CanBlockIsTrue", Flags::CAN_BLOCK_IS_TRUE),
    ("non-deterministic", Flags::NON_DETERMINISTIC),
];

impl Flags {
    /// Look up a flag by its front matter spelling
    pub fn from_flag_name(name: &str) -> Option<Flags> {
        FLAG_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, flag)| *flag)
    }

    /// Build a flag set from names, ignoring the ones we don't know
    pub fn from_flag_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Flags {
        names
            .into_iter()
            .filter_map(Flags::from_flag_name)
            .fold(Flags::empty(), |acc, flag| acc | flag)
    }

    /// Front matter spellings of the flags in this set
    pub fn flag_names(&self) -> Vec<&'static str> {
        FLAG_NAMES
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect()
    }
}

// ============================================================================
// Edition
// ============================================================================

/// Which edition id a file must carry to be considered in scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    /// `es5id:`
    #[default]
    Es5,
    /// `es6id:`
    Es6,
    /// `esid:`
    Esid,
}

impl Edition {
    /// Front matter key holding this edition's id
    pub fn key(&self) -> &'static str {
        match self {
            Edition::Es5 => "es5id",
            Edition::Es6 => "es6id",
            Edition::Esid => "esid",
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Edition {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "es5" | "es5id" => Ok(Edition::Es5),
            "es6" | "es6id" => Ok(Edition::Es6),
            "esid" => Ok(Edition::Esid),
            other => Err(format!("unknown edition '{}' (expected es5id, es6id or esid)", other)),
        }
    }
}

// ============================================================================
// TestMetadata
// ============================================================================

/// Expected failure declared by a negative test
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NegativeExpectation {
    pub phase: Phase,
    #[serde(rename = "type")]
    pub error_type: String,
}

/// Parsed front matter of one test file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TestMetadata {
    pub description: String,
    pub info: Option<String>,
    pub negative: Option<NegativeExpectation>,
    pub includes: Vec<String>,
    #[serde(serialize_with = "serialize_flags")]
    pub flags: Flags,
    pub features: Vec<String>,
    pub locale: Vec<String>,
    pub es5id: Option<String>,
    pub es6id: Option<String>,
    pub esid: Option<String>,
}

impl TestMetadata {
    /// Extract the metadata block from a test source.
    ///
    /// The source is handed back untouched; the block stays in place for the
    /// engine to skip over as an ordinary comment.
    pub fn extract(source: &str) -> Result<(TestMetadata, &str)> {
        let yaml = metadata_region(source)?;
        let raw: RawMetadata = serde_yaml::from_str(yaml)
            .map_err(|e| HarnessError::format(format!("invalid metadata block: {}", e)))?;
        let metadata = raw.into_metadata()?;
        Ok((metadata, source))
    }

    /// Read a file and extract its metadata
    pub fn from_file(path: &Path) -> Result<(TestMetadata, String)> {
        let source = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        let (metadata, _) = Self::extract(&source)?;
        Ok((metadata, source))
    }

    /// Whether the flag list contains `flag`
    pub fn has_flag(&self, flag: Flags) -> bool {
        self.flags.contains(flag)
    }

    /// Whether the file is expected to fail
    pub fn is_negative(&self) -> bool {
        self.negative.is_some()
    }

    /// The id recorded for `edition`, if any
    pub fn edition_id(&self, edition: Edition) -> Option<&str> {
        let id = match edition {
            Edition::Es5 => &self.es5id,
            Edition::Es6 => &self.es6id,
            Edition::Esid => &self.esid,
        };
        id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Locate the YAML text between the delimiters
fn metadata_region(source: &str) -> Result<&str> {
    let start = source
        .find(META_START)
        .ok_or_else(|| HarnessError::format("missing metadata start marker `/*---`"))?
        + META_START.len();
    let end = source
        .find(META_END)
        .ok_or_else(|| HarnessError::format("missing metadata end marker `---*/`"))?;
    if end <= start {
        return Err(HarnessError::format(
            "metadata end marker does not follow the start marker",
        ));
    }
    Ok(&source[start..end])
}

fn serialize_flags<S: Serializer>(flags: &Flags, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(flags.flag_names())
}

// ----------------------------------------------------------------------------
// Raw YAML shape
// ----------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMetadata {
    #[serde(deserialize_with = "scalar")]
    description: Option<String>,
    #[serde(deserialize_with = "scalar")]
    info: Option<String>,
    negative: Option<RawNegative>,
    #[serde(deserialize_with = "list")]
    includes: Vec<String>,
    #[serde(deserialize_with = "list")]
    flags: Vec<String>,
    #[serde(deserialize_with = "list")]
    features: Vec<String>,
    #[serde(deserialize_with = "list")]
    locale: Vec<String>,
    #[serde(deserialize_with = "scalar")]
    es5id: Option<String>,
    #[serde(deserialize_with = "scalar")]
    es6id: Option<String>,
    #[serde(deserialize_with = "scalar")]
    esid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawNegative {
    #[serde(deserialize_with = "scalar")]
    phase: Option<String>,
    #[serde(rename = "type", deserialize_with = "scalar")]
    error_type: Option<String>,
}

impl RawMetadata {
    fn into_metadata(self) -> Result<TestMetadata> {
        let negative = match self.negative {
            Some(raw) => raw.into_expectation()?,
            None => None,
        };
        Ok(TestMetadata {
            description: self.description.unwrap_or_default(),
            info: self.info,
            negative,
            includes: self.includes,
            flags: Flags::from_flag_names(self.flags.iter().map(String::as_str)),
            features: self.features,
            locale: self.locale,
            es5id: self.es5id,
            es6id: self.es6id,
            esid: self.esid,
        })
    }
}

impl RawNegative {
    fn into_expectation(self) -> Result<Option<NegativeExpectation>> {
        let error_type = self.error_type.unwrap_or_default();
        let phase = self.phase.unwrap_or_default();
        if error_type.is_empty() {
            return Ok(None);
        }
        if phase.is_empty() {
            return Err(HarnessError::config("negative type is set, but phase isn't"));
        }
        let phase = Phase::from_name(&phase)
            .ok_or_else(|| HarnessError::config(format!("unknown negative phase '{}'", phase)))?;
        Ok(Some(NegativeExpectation { phase, error_type }))
    }
}

/// Accept any YAML scalar as a string.
///
/// Ids such as `es5id: 15.1` or `es6id: 12` load as numbers otherwise.
fn scalar<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok(None),
        serde_yaml::Value::String(s) => Ok(Some(s)),
        serde_yaml::Value::Number(n) => Ok(Some(n.to_string())),
        serde_yaml::Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(D::Error::custom(format!("expected a scalar, found {:?}", other))),
    }
}

/// A sequence of strings; an explicit null (`features: ~`) reads as empty
fn list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
