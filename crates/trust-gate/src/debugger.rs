use std::fmt;

use crate::environment::EnvironmentSnapshot;

pub const ADB_ENABLED_SETTING: &str = "adb_enabled";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugSignal {
    DebuggerAttached,
    DebuggableBuild,
    UsbDebuggingEnabled { value: i64 },
}

impl DebugSignal {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DebuggerAttached => "debugger_attached",
            Self::DebuggableBuild => "debuggable_build",
            Self::UsbDebuggingEnabled { .. } => "usb_debugging_enabled",
        }
    }
}

impl fmt::Display for DebugSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DebuggerAttached => write!(f, "debugger attached to process"),
            Self::DebuggableBuild => write!(f, "application manifest is debuggable"),
            Self::UsbDebuggingEnabled { value } => {
                write!(f, "global {}={}", ADB_ENABLED_SETTING, value)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugObservation {
    pub signals: Vec<DebugSignal>,
}

impl DebugObservation {
    pub fn detected(&self) -> bool {
        !self.signals.is_empty()
    }

    pub fn signal_codes(&self) -> Vec<&'static str> {
        self.signals.iter().map(DebugSignal::code).collect()
    }
}

/// Debugger attachment or a debuggable application build.
pub fn detect_debug_state(env: &EnvironmentSnapshot<'_>) -> DebugObservation {
    let mut signals = Vec::new();

    match env.debugger.debugger_attached() {
        Ok(true) => signals.push(DebugSignal::DebuggerAttached),
        Ok(false) => {}
        Err(err) => {
            tracing::trace!(error = %err, "debugger probe inconclusive");
        }
    }

    if env.build.app_debuggable {
        signals.push(DebugSignal::DebuggableBuild);
    }

    DebugObservation { signals }
}

/// System-wide ADB exposure, independent of the application's own flag.
/// A missing setting or a failed query reads as the platform default of 0.
pub fn detect_usb_debugging(env: &EnvironmentSnapshot<'_>) -> DebugObservation {
    let value = match env.settings.global_int(ADB_ENABLED_SETTING) {
        Ok(value) => value.unwrap_or(0),
        Err(err) => {
            tracing::trace!(error = %err, "settings probe inconclusive");
            0
        }
    };

    let mut signals = Vec::new();
    if value == 1 {
        signals.push(DebugSignal::UsbDebuggingEnabled { value });
    }
    DebugObservation { signals }
}
