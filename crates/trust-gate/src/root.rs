use std::fmt;
use std::path::Path;

use crate::environment::EnvironmentSnapshot;

pub const TEST_KEYS_MARKER: &str = "test-keys";

pub const SUPERUSER_PATHS: [&str; 14] = [
    "/system/app/Superuser.apk",
    "/sbin/su",
    "/system/bin/su",
    "/system/xbin/su",
    "/data/local/xbin/su",
    "/data/local/bin/su",
    "/system/sd/xbin/su",
    "/system/bin/failsafe/su",
    "/data/local/su",
    "/su/bin/su",
    "/system/xbin/daemonsu",
    "/system/bin/.ext/.su",
    "/system/usr/we-need-root/su",
    "/system/app/SuperSU.apk",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootCheckConfig {
    pub superuser_paths: Vec<String>,
    pub which_program: String,
    pub superuser_binary: String,
}

impl Default for RootCheckConfig {
    fn default() -> Self {
        Self {
            superuser_paths: SUPERUSER_PATHS.iter().map(|p| (*p).to_string()).collect(),
            which_program: "/system/xbin/which".to_string(),
            superuser_binary: "su".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootSignal {
    TestKeysBuild { tags: String },
    SuperuserPath { path: String },
    SuperuserResolved { line: String },
}

impl RootSignal {
    pub fn code(&self) -> &'static str {
        match self {
            Self::TestKeysBuild { .. } => "test_keys_build",
            Self::SuperuserPath { .. } => "superuser_path",
            Self::SuperuserResolved { .. } => "superuser_resolved",
        }
    }
}

impl fmt::Display for RootSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TestKeysBuild { tags } => write!(f, "build tags carry test-keys ({})", tags),
            Self::SuperuserPath { path } => write!(f, "superuser artifact present at {}", path),
            Self::SuperuserResolved { line } => {
                write!(f, "superuser binary resolvable via PATH ({})", line)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootObservation {
    pub signals: Vec<RootSignal>,
}

impl RootObservation {
    pub fn detected(&self) -> bool {
        !self.signals.is_empty()
    }

    pub fn signal_codes(&self) -> Vec<&'static str> {
        self.signals.iter().map(RootSignal::code).collect()
    }
}

type RootProbe = fn(&EnvironmentSnapshot<'_>, &RootCheckConfig) -> Option<RootSignal>;

const ROOT_PROBES: [(&str, RootProbe); 3] = [
    ("build_tags", probe_build_tags),
    ("superuser_paths", probe_superuser_paths),
    ("which_su", probe_which_su),
];

/// Runs every root probe. With `stop_at_first` the table is walked only
/// until one probe fires.
pub fn detect_root(
    env: &EnvironmentSnapshot<'_>,
    config: &RootCheckConfig,
    stop_at_first: bool,
) -> RootObservation {
    let mut signals = Vec::new();
    for (_, probe) in ROOT_PROBES {
        if let Some(signal) = probe(env, config) {
            signals.push(signal);
            if stop_at_first {
                break;
            }
        }
    }
    RootObservation { signals }
}

pub fn root_probe_names() -> Vec<&'static str> {
    ROOT_PROBES.iter().map(|(name, _)| *name).collect()
}

fn probe_build_tags(env: &EnvironmentSnapshot<'_>, _: &RootCheckConfig) -> Option<RootSignal> {
    let tags = env.build.tags.as_deref()?;
    tags.contains(TEST_KEYS_MARKER).then(|| RootSignal::TestKeysBuild {
        tags: tags.to_string(),
    })
}

fn probe_superuser_paths(
    env: &EnvironmentSnapshot<'_>,
    config: &RootCheckConfig,
) -> Option<RootSignal> {
    config
        .superuser_paths
        .iter()
        .find(|path| {
            // Permission denied and not-found both read as absent.
            env.files.exists(Path::new(path.as_str())).unwrap_or(false)
        })
        .map(|path| RootSignal::SuperuserPath { path: path.clone() })
}

fn probe_which_su(env: &EnvironmentSnapshot<'_>, config: &RootCheckConfig) -> Option<RootSignal> {
    match env
        .processes
        .first_stdout_line(&config.which_program, &[config.superuser_binary.as_str()])
    {
        Ok(Some(line)) => Some(RootSignal::SuperuserResolved { line }),
        Ok(None) => None,
        Err(err) => {
            tracing::trace!(error = %err, code = err.code(), "which probe inconclusive");
            None
        }
    }
}
