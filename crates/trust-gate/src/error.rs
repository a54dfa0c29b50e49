use std::fmt;

/// Failure of a single capability query. Detectors classify every probe
/// error as inconclusive and never propagate it out of the engine.
#[derive(Debug)]
pub enum ProbeError {
    Io(std::io::Error),
    Spawn(String),
    Timeout { command: String, waited_ms: u64 },
    Unsupported(&'static str),
    Query(String),
}

impl ProbeError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Spawn(_) => "spawn",
            Self::Timeout { .. } => "timeout",
            Self::Unsupported(_) => "unsupported",
            Self::Query(_) => "query",
        }
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "probe i/o failed: {err}"),
            Self::Spawn(msg) => write!(f, "failed spawning probe process: {msg}"),
            Self::Timeout { command, waited_ms } => {
                write!(f, "probe process '{command}' timed out after {waited_ms}ms")
            }
            Self::Unsupported(feature) => write!(f, "platform feature unavailable: {feature}"),
            Self::Query(msg) => write!(f, "platform query failed: {msg}"),
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

pub type ProbeResult<T> = std::result::Result<T, ProbeError>;
