use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Verbosity
// ---------------------------------------------------------------------------

/// Logging level of a client.
///
/// `0` is silent, `1` logs connection and lifecycle events, `2` and above
/// also log every message payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Verbosity(pub u8);

impl Verbosity {
    pub const SILENT: Self = Self(0);
    pub const LIFECYCLE: Self = Self(1);
    pub const PAYLOADS: Self = Self(2);

    /// Connection and lifecycle events are logged.
    pub const fn lifecycle(self) -> bool {
        self.0 >= 1
    }

    /// Per-call payloads are logged.
    pub const fn payloads(self) -> bool {
        self.0 >= 2
    }
}

impl From<u8> for Verbosity {
    fn from(level: u8) -> Self {
        Self(level)
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Value carried by a protocol message.
///
/// Requests send `Int(1)` as a "do it" flag or an `Array` of actions; replies
/// carry the state (`Array`, or `Nested` for multi-dimensional states),
/// terminal flag (`Bool`) and reward (`Float` or `Array`). Payloads are
/// returned to callers exactly as decoded.
///
/// Variants are tried in order when decoding, so a flat numeric list is
/// always an `Array` and only lists containing lists become `Nested`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Bool(bool),
    Int(i64),
    Float(f64),
    Array(Vec<f64>),
    /// A list of payloads, e.g. the rows of a matrix-shaped state.
    Nested(Vec<Self>),
}

impl Payload {
    /// The scalar flag sent with every request that carries no data.
    pub const FLAG: Self = Self::Int(1);

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Scalar view; a one-element array counts as a scalar.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Array(v) if v.len() == 1 => Some(v[0]),
            Self::Bool(_) | Self::Array(_) | Self::Nested(_) => None,
        }
    }

    pub fn as_slice(&self) -> Option<&[f64]> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Number of scalar values carried, counting through nested lists.
    pub fn len(&self) -> usize {
        match self {
            Self::Array(v) => v.len(),
            Self::Nested(items) => items.iter().map(Self::len).sum(),
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shape of a rectangular payload: `[]` for scalars, `[n]` for arrays,
    /// `[rows, ..]` for nested lists. `None` if the nesting is ragged.
    pub fn shape(&self) -> Option<Vec<usize>> {
        match self {
            Self::Bool(_) | Self::Int(_) | Self::Float(_) => Some(Vec::new()),
            Self::Array(v) => Some(vec![v.len()]),
            Self::Nested(items) => {
                let mut inner = items.first().map_or(Some(Vec::new()), Self::shape)?;
                for item in items.iter().skip(1) {
                    if item.shape()? != inner {
                        return None;
                    }
                }
                inner.insert(0, items.len());
                Some(inner)
            }
        }
    }

    /// All numeric values in row-major order. `None` if any value is a bool.
    #[allow(clippy::cast_precision_loss)]
    pub fn flatten(&self) -> Option<Vec<f64>> {
        match self {
            Self::Bool(_) => None,
            Self::Int(i) => Some(vec![*i as f64]),
            Self::Float(f) => Some(vec![*f]),
            Self::Array(v) => Some(v.clone()),
            Self::Nested(items) => items.iter().try_fold(Vec::new(), |mut out, item| {
                out.extend(item.flatten()?);
                Some(out)
            }),
        }
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Payload {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Payload {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<Vec<f64>> for Payload {
    fn from(v: Vec<f64>) -> Self {
        Self::Array(v)
    }
}

impl From<&[f64]> for Payload {
    fn from(v: &[f64]) -> Self {
        Self::Array(v.to_vec())
    }
}

impl From<Vec<Vec<f64>>> for Payload {
    fn from(rows: Vec<Vec<f64>>) -> Self {
        Self::Nested(rows.into_iter().map(Self::Array).collect())
    }
}

// ---------------------------------------------------------------------------
// SpaceSpec
// ---------------------------------------------------------------------------

/// Element type of a state or action space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Float,
    Int,
    Bool,
}

/// Description of a state or action space. Passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceSpec {
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub shape: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    /// Number of discrete values, for `Int` spaces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_values: Option<usize>,
}

impl SpaceSpec {
    /// Unbounded float space of the given shape.
    pub const fn float(shape: Vec<usize>) -> Self {
        Self {
            value_type: ValueType::Float,
            shape,
            min_value: None,
            max_value: None,
            num_values: None,
        }
    }

    /// Float space with inclusive bounds.
    pub const fn bounded(shape: Vec<usize>, min_value: f64, max_value: f64) -> Self {
        Self {
            value_type: ValueType::Float,
            shape,
            min_value: Some(min_value),
            max_value: Some(max_value),
            num_values: None,
        }
    }

    /// Discrete space with `n` values.
    pub fn discrete(n: usize) -> Self {
        Self {
            value_type: ValueType::Int,
            shape: vec![1],
            min_value: None,
            max_value: None,
            num_values: Some(n),
        }
    }

    /// Total number of scalar elements.
    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }
}

// ---------------------------------------------------------------------------
// StaticDescription
// ---------------------------------------------------------------------------

/// Fixed environment description, e.g. loaded next to a client config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticDescription {
    pub states: SpaceSpec,
    pub actions: SpaceSpec,
    #[serde(default)]
    pub max_episode_timesteps: Option<u32>,
}

impl StaticDescription {
    pub const fn new(states: SpaceSpec, actions: SpaceSpec) -> Self {
        Self {
            states,
            actions,
            max_episode_timesteps: None,
        }
    }

    /// Builder: set the episode length limit.
    #[must_use]
    pub const fn with_max_episode_timesteps(mut self, steps: u32) -> Self {
        self.max_episode_timesteps = Some(steps);
        self
    }
}

impl crate::traits::EnvDescription for StaticDescription {
    fn states(&self) -> SpaceSpec {
        self.states.clone()
    }

    fn actions(&self) -> SpaceSpec {
        self.actions.clone()
    }

    fn max_episode_timesteps(&self) -> Option<u32> {
        self.max_episode_timesteps
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
