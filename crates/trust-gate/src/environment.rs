//! Host capabilities consumed by the detectors.
//!
//! Every platform fact a detector needs is reached through one of the
//! narrow traits below, so detectors stay pure functions of whatever the
//! host injects. `EnvironmentSnapshot` bundles borrowed handles to all of
//! them for a single evaluation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ProbeResult;

/// Platform build descriptor. Any field may be absent on a given host;
/// absent fields never match a detection rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub hardware: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    /// The application's own manifest marks it debuggable.
    #[serde(default)]
    pub app_debuggable: bool,
}

/// One entry of a captured call stack. `symbol` is the fully qualified
/// owner of the frame (class or module path plus function).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub symbol: String,
}

impl StackFrame {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }
}

pub trait FileProbe {
    /// Returns whether `path` exists. Callers treat any error as absence.
    fn exists(&self, path: &Path) -> ProbeResult<bool>;
}

pub trait ProcessSpawner {
    /// Runs `program` with `args` and returns the first line it writes to
    /// standard output, if any. The child must be released before return.
    fn first_stdout_line(&self, program: &str, args: &[&str]) -> ProbeResult<Option<String>>;
}

pub trait DebuggerProbe {
    fn debugger_attached(&self) -> ProbeResult<bool>;
}

pub trait SettingsStore {
    /// Reads an integer from the system-wide global settings table.
    fn global_int(&self, key: &str) -> ProbeResult<Option<i64>>;
}

pub trait PackageQuery {
    /// Platform API level of the running OS.
    fn sdk_level(&self) -> u32;

    /// Multi-signer query (API 28+). `None` means the platform returned no
    /// signing info at all.
    fn signing_certificates(&self) -> ProbeResult<Option<Vec<Vec<u8>>>>;

    /// Legacy single-set query used below API 28.
    fn legacy_signatures(&self) -> ProbeResult<Option<Vec<Vec<u8>>>>;

    /// Package identity of the installer recorded for this application.
    fn installer_package(&self) -> ProbeResult<Option<String>>;
}

pub trait StackIntrospector {
    /// Captures the current call stack, innermost frame first.
    fn capture(&self) -> ProbeResult<Vec<StackFrame>>;
}

/// Read-only view over the host for one evaluation.
#[derive(Clone, Copy)]
pub struct EnvironmentSnapshot<'a> {
    pub build: &'a BuildInfo,
    pub files: &'a dyn FileProbe,
    pub processes: &'a dyn ProcessSpawner,
    pub debugger: &'a dyn DebuggerProbe,
    pub settings: &'a dyn SettingsStore,
    pub packages: &'a dyn PackageQuery,
    pub stack: &'a dyn StackIntrospector,
}

impl<'a> EnvironmentSnapshot<'a> {
    pub fn from_host<H>(build: &'a BuildInfo, host: &'a H) -> Self
    where
        H: FileProbe
            + ProcessSpawner
            + DebuggerProbe
            + SettingsStore
            + PackageQuery
            + StackIntrospector,
    {
        Self {
            build,
            files: host,
            processes: host,
            debugger: host,
            settings: host,
            packages: host,
            stack: host,
        }
    }
}
