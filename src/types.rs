use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// How a decision edge combines with `$test`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// `$test && (...)`: taken when the test holds.
    And,
    /// `$test || (...)`: taken when the test fails.
    Or,
}

impl Mode {
    /// Returns the operator text of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::And => "&&",
            Mode::Or => "||",
        }
    }

    /// Parses a binary operator, returning `None` for anything but `&&`/`||`.
    pub fn from_operator(s: &str) -> Option<Mode> {
        match s {
            "&&" => Some(Mode::And),
            "||" => Some(Mode::Or),
            _ => None,
        }
    }
}

/// Which control variable a decision edge assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Fail,
    Last,
    Next,
}

impl EdgeKind {
    /// Returns the output key of this edge kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Fail => "fail",
            EdgeKind::Last => "last",
            EdgeKind::Next => "next",
        }
    }

    /// Parses a control variable name (`$fail`, `$last`, `$next`).
    pub fn from_variable(s: &str) -> Option<EdgeKind> {
        match s {
            "$fail" => Some(EdgeKind::Fail),
            "$last" => Some(EdgeKind::Last),
            "$next" => Some(EdgeKind::Next),
            _ => None,
        }
    }
}

/// A flowchart edge to another step, written as `"<target> <mode>"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub target: f64,
    pub mode: Mode,
}

impl Edge {
    pub fn new(target: f64, mode: Mode) -> Self {
        Self { target, mode }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", format_number(self.target), self.mode.as_str())
    }
}

impl FromStr for Edge {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target, mode) = s
            .split_once(' ')
            .ok_or_else(|| format!("invalid edge '{s}'"))?;
        let target: f64 = target
            .parse()
            .map_err(|e| format!("invalid edge target '{target}': {e}"))?;
        let mode = Mode::from_operator(mode).ok_or_else(|| format!("invalid edge mode '{mode}'"))?;
        Ok(Edge { target, mode })
    }
}

impl Serialize for Edge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Edge {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Formats a number the way it reads in source: integral values without a
/// fractional part.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Presentation tags attached to a step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    pub name: Option<String>,
    pub info: Option<String>,
    pub px: Option<String>,
}

/// One statement of a step group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail: Option<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub px: Option<String>,
}

impl Step {
    /// A decision step holding a single edge.
    pub fn decision(kind: EdgeKind, edge: Edge) -> Self {
        let mut step = Step::default();
        match kind {
            EdgeKind::Fail => step.fail = Some(edge),
            EdgeKind::Last => step.last = Some(edge),
            EdgeKind::Next => step.next = Some(edge),
        }
        step
    }

    /// A code step, optionally assigning its result.
    pub fn code(code: String, assign: Option<String>) -> Self {
        Step {
            code: Some(code),
            assign,
            ..Step::default()
        }
    }

    /// Replaces the step's presentation tags.
    pub fn annotate(&mut self, annotations: Annotations) {
        self.name = annotations.name;
        self.info = annotations.info;
        self.px = annotations.px;
    }

    /// The edge of a decision step, if this is one.
    pub fn edge(&self) -> Option<(EdgeKind, Edge)> {
        self.fail
            .map(|e| (EdgeKind::Fail, e))
            .or(self.last.map(|e| (EdgeKind::Last, e)))
            .or(self.next.map(|e| (EdgeKind::Next, e)))
    }
}

/// The steps of one `case` of the step switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    pub id: i64,
    pub steps: Vec<Step>,
}

/// Literal initializer of a local variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

/// A local variable of a flowchart function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarSpec {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<InitValue>,
}

/// A function or method recognized as a flowchart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub px: Option<String>,
    /// Body indentation width, then header indentation width.
    #[serde(with = "space_pair")]
    pub indent: [usize; 2],
    /// Byte range of the construct in the normalized source.
    #[serde(with = "space_pair")]
    pub span: [usize; 2],
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vars: Vec<VarSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<Sequence>,
}

/// Number pairs written as `"<first> <second>"`.
mod space_pair {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(pair: &[usize; 2], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("{} {}", pair[0], pair[1]))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[usize; 2], D::Error> {
        let s = String::deserialize(deserializer)?;
        let mut parts = s.split(' ').map(str::parse::<usize>);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(Ok(first)), Some(Ok(second)), None) => Ok([first, second]),
            _ => Err(de::Error::custom(format!("invalid number pair '{s}'"))),
        }
    }
}

/// Methods extracted from one file of a project scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub path: String,
    pub content_hash: String,
    pub methods: Vec<Method>,
}

/// A file that could not be read or parsed during a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanError {
    pub path: String,
    pub message: String,
}

/// Result of scanning a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    pub files: Vec<FileReport>,
    pub errors: Vec<ScanError>,
    pub scanned: usize,
    pub duration_ms: u64,
}
