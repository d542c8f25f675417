//! Submission parameter tables and syntactic validation.
//!
//! Every backend declares a closed table of [`ParameterSpec`]s. Pattern and
//! option checks happen here, once, for every backend; adapters only add the
//! semantic checks that need more than one value at a time.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{SchedError, SchedResult};

static POSITIVE_INT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(Pattern::PositiveInt.as_str()).unwrap());
static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(Pattern::Duration.as_str()).unwrap());
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(Pattern::Word.as_str()).unwrap());
static SHAPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(Pattern::Shape.as_str()).unwrap());

/// The value patterns parameter tables may use. Each is compiled once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Strictly positive integers.
    PositiveInt,
    /// `H:MM:SS` durations (hours may exceed 24).
    Duration,
    /// Optional identifiers (accounts, partitions).
    Word,
    /// 1- to 3-dimensional shape specifiers such as `4x3x2`.
    Shape,
}

impl Pattern {
    /// The anchored regular expression source.
    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::PositiveInt => r"^[1-9]\d*$",
            Pattern::Duration => r"^\d+:\d{2}:\d{2}$",
            Pattern::Word => r"^\w*$",
            Pattern::Shape => r"^\d+(x\d+){0,2}$",
        }
    }

    fn regex(&self) -> &'static Regex {
        match self {
            Pattern::PositiveInt => &POSITIVE_INT_RE,
            Pattern::Duration => &DURATION_RE,
            Pattern::Word => &WORD_RE,
            Pattern::Shape => &SHAPE_RE,
        }
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex().is_match(value)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

pub const POSITIVE_INT: Pattern = Pattern::PositiveInt;
pub const DURATION: Pattern = Pattern::Duration;
pub const WORD: Pattern = Pattern::Word;
pub const SHAPE: Pattern = Pattern::Shape;

/// Options for boolean flags.
pub const BOOLEAN: &[&str] = &["true", "false"];

/// Constraint a parameter value must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// Value must match the pattern.
    Pattern(Pattern),
    /// Value must be one of the listed options.
    Options(&'static [&'static str]),
}

/// Declaration of one recognized submission parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub default: &'static str,
    pub constraint: Constraint,
}

impl ParameterSpec {
    /// Check a single value against this parameter's constraint.
    pub fn check(&self, value: &str) -> SchedResult<()> {
        match self.constraint {
            Constraint::Pattern(pattern) => {
                if !pattern.is_match(value) {
                    return Err(SchedError::invalid(
                        self.name,
                        format!("value '{value}' does not match {pattern}"),
                    ));
                }
            }
            Constraint::Options(options) => {
                if !options.contains(&value) {
                    return Err(SchedError::invalid(
                        self.name,
                        format!("value '{value}' must be one of {}", options.join(", ")),
                    ));
                }
            }
        }
        Ok(())
    }
}

pub const MPI_PROCS: ParameterSpec = ParameterSpec {
    name: "mpi_procs",
    description: "MPI process",
    default: "1",
    constraint: Constraint::Pattern(POSITIVE_INT),
};

pub const OMP_THREADS: ParameterSpec = ParameterSpec {
    name: "omp_threads",
    description: "OMP threads",
    default: "1",
    constraint: Constraint::Pattern(POSITIVE_INT),
};

pub const PPN: ParameterSpec = ParameterSpec {
    name: "ppn",
    description: "Process per nodes",
    default: "1",
    constraint: Constraint::Pattern(POSITIVE_INT),
};

pub const WALLTIME: ParameterSpec = ParameterSpec {
    name: "walltime",
    description: "Limit on elapsed time",
    default: "24:00:00",
    constraint: Constraint::Pattern(DURATION),
};

/// Caller-supplied parameter values, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<String, String>);

impl ParameterSet {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameter set holding every default of a table.
    pub fn defaults(specs: &[ParameterSpec]) -> Self {
        Self(
            specs
                .iter()
                .map(|s| (s.name.to_string(), s.default.to_string()))
                .collect(),
        )
    }

    /// Fill in defaults for every table entry the caller did not set.
    pub fn with_defaults(mut self, specs: &[ParameterSpec]) -> Self {
        for spec in specs {
            self.0
                .entry(spec.name.to_string())
                .or_insert_with(|| spec.default.to_string());
        }
        self
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Fetch a value that validation guarantees to be present.
    pub fn require(&self, name: &str) -> SchedResult<&str> {
        self.get(name)
            .ok_or_else(|| SchedError::invalid(name, "missing value"))
    }

    /// Fetch a value as an unsigned integer.
    pub fn require_u64(&self, name: &str) -> SchedResult<u64> {
        let raw = self.require(name)?;
        raw.parse()
            .map_err(|_| SchedError::invalid(name, format!("'{raw}' is not an integer")))
    }

    /// Fetch a `true`/`false` flag.
    pub fn require_flag(&self, name: &str) -> SchedResult<bool> {
        match self.require(name)? {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(SchedError::invalid(
                name,
                format!("'{other}' must be \"true\" or \"false\""),
            )),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Check a parameter set against a table: every entry present, every value
/// matching its constraint, no unknown names.
pub fn check_syntax(specs: &[ParameterSpec], params: &ParameterSet) -> SchedResult<()> {
    for spec in specs {
        let value = params.require(spec.name)?;
        spec.check(value)?;
    }

    if let Some((name, _)) = params
        .iter()
        .find(|(name, _)| !specs.iter().any(|s| s.name == *name))
    {
        let known: Vec<&str> = specs.iter().map(|s| s.name).collect();
        return Err(SchedError::invalid(
            name,
            format!("unrecognized parameter (known: {})", known.join(", ")),
        ));
    }

    Ok(())
}

/// Parse an `H:MM:SS` duration into seconds.
pub fn duration_secs(name: &str, value: &str) -> SchedResult<u64> {
    value.split(':').try_fold(0u64, |acc, part| {
        let n: u64 = part
            .parse()
            .map_err(|_| SchedError::invalid(name, format!("'{value}' is not H:MM:SS")))?;
        acc.checked_mul(60)
            .and_then(|v| v.checked_add(n))
            .ok_or_else(|| SchedError::invalid(name, format!("'{value}' is too large")))
    })
}

/// Parse an `NxMxP` shape specifier into its dimensions.
pub fn shape_dims(name: &str, value: &str) -> SchedResult<Vec<u64>> {
    value
        .split('x')
        .map(|part| {
            part.parse()
                .map_err(|_| SchedError::invalid(name, format!("'{value}' is not a shape")))
        })
        .collect()
}

/// Product of all dimensions, failing on overflow.
pub fn shape_total(name: &str, dims: &[u64]) -> SchedResult<u64> {
    dims.iter().try_fold(1u64, |acc, d| {
        acc.checked_mul(*d)
            .ok_or_else(|| SchedError::invalid(name, "shape is too large"))
    })
}

/// Node count for `mpi_procs * omp_threads` processes tiled over `ppn`.
///
/// Fails unless the product is a multiple of `ppn`. Returns `(nodes, ppn)`.
pub fn tiled_nodes(params: &ParameterSet) -> SchedResult<(u64, u64)> {
    let mpi = params.require_u64("mpi_procs")?;
    let omp = params.require_u64("omp_threads")?;
    let ppn = params.require_u64("ppn")?;
    if mpi == 0 || omp == 0 || ppn == 0 {
        return Err(SchedError::invalid(
            "ppn",
            "mpi_procs, omp_threads, and ppn must be larger than or equal to 1",
        ));
    }

    let total = checked_product("mpi_procs", mpi, omp)?;
    if total % ppn != 0 {
        return Err(SchedError::invalid(
            "ppn",
            format!("(mpi_procs * omp_threads) = {total} must be a multiple of ppn = {ppn}"),
        ));
    }
    Ok((total / ppn, ppn))
}

/// Multiply two already-validated counts, failing on overflow.
pub fn checked_product(name: &str, a: u64, b: u64) -> SchedResult<u64> {
    a.checked_mul(b)
        .ok_or_else(|| SchedError::invalid(name, format!("{a} * {b} is too large")))
}
