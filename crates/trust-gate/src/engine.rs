use std::fmt;
use std::time::Duration;

use crate::debugger::{detect_debug_state, detect_usb_debugging, DebugSignal};
use crate::emulator::detect_emulator;
use crate::environment::EnvironmentSnapshot;
use crate::hook::{detect_hooks, HookRules, HookSignal};
use crate::installer::{verify_installer, InstallerPolicy};
use crate::root::{detect_root, RootCheckConfig, RootSignal};
use crate::signature::{verify_signers, ExpectedIdentity};

pub const DEFAULT_PROCESS_PROBE_TIMEOUT: Duration = Duration::from_millis(2_000);
/// Floor applied to every process probe wait.
pub const MIN_PROCESS_PROBE_TIMEOUT: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct TrustGateConfig {
    pub root: RootCheckConfig,
    pub hooks: HookRules,
    pub installer: InstallerPolicy,
    /// Upper bound on how long a host process probe may run.
    pub process_probe_timeout: Duration,
}

/// Fixed defaults; never read from the process environment. Hosts that
/// layer configuration on top do so explicitly.
impl Default for TrustGateConfig {
    fn default() -> Self {
        Self {
            root: RootCheckConfig::default(),
            hooks: HookRules::default(),
            installer: InstallerPolicy::default(),
            process_probe_timeout: DEFAULT_PROCESS_PROBE_TIMEOUT,
        }
    }
}

/// The seven gate checks in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrustCheck {
    Root,
    Emulator,
    Debugger,
    UsbDebugging,
    Signature,
    Installer,
    Hook,
}

impl TrustCheck {
    pub const ORDER: [TrustCheck; 7] = [
        Self::Root,
        Self::Emulator,
        Self::Debugger,
        Self::UsbDebugging,
        Self::Signature,
        Self::Installer,
        Self::Hook,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Emulator => "emulator",
            Self::Debugger => "debugger",
            Self::UsbDebugging => "usb_debugging",
            Self::Signature => "signature",
            Self::Installer => "installer",
            Self::Hook => "hook",
        }
    }
}

impl fmt::Display for TrustCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    pub check: TrustCheck,
    pub signal_codes: Vec<String>,
    pub detail: String,
}

/// Diagnostic breakdown for the host. Never handed back through
/// [`TrustEngine::evaluate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustReport {
    pub failures: Vec<CheckFailure>,
}

impl TrustReport {
    pub fn is_secure(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_checks(&self) -> Vec<TrustCheck> {
        self.failures.iter().map(|failure| failure.check).collect()
    }

    pub fn violation_codes(&self) -> Vec<String> {
        self.failures
            .iter()
            .flat_map(|failure| {
                failure
                    .signal_codes
                    .iter()
                    .map(move |code| format!("{}:{}", failure.check.code(), code))
            })
            .collect()
    }

    pub fn summary(&self) -> String {
        if self.failures.is_empty() {
            return "ok".to_string();
        }

        self.failures
            .iter()
            .map(|failure| format!("{}: {}", failure.check, failure.detail))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone)]
pub struct TrustEngine {
    config: TrustGateConfig,
    identity: ExpectedIdentity,
}

impl TrustEngine {
    pub fn new(config: TrustGateConfig, identity: ExpectedIdentity) -> Self {
        Self { config, identity }
    }

    /// Single pass/fail verdict. Stops at the first failing check; nothing
    /// is cached between calls.
    pub fn evaluate(&self, env: &EnvironmentSnapshot<'_>) -> bool {
        for check in TrustCheck::ORDER {
            if let Some(failure) = self.run_check(check, env, true) {
                tracing::debug!(check = %failure.check, "trust check failed");
                return false;
            }
        }
        tracing::debug!("all trust checks passed");
        true
    }

    /// Runs every check without short-circuiting and reports each failure.
    pub fn inspect(&self, env: &EnvironmentSnapshot<'_>) -> TrustReport {
        let failures = TrustCheck::ORDER
            .iter()
            .filter_map(|check| self.run_check(*check, env, false))
            .collect();
        TrustReport { failures }
    }

    /// Outcome of one check in isolation. `true` means the check passed.
    pub fn check_passes(&self, check: TrustCheck, env: &EnvironmentSnapshot<'_>) -> bool {
        self.run_check(check, env, true).is_none()
    }

    fn run_check(
        &self,
        check: TrustCheck,
        env: &EnvironmentSnapshot<'_>,
        stop_at_first: bool,
    ) -> Option<CheckFailure> {
        match check {
            TrustCheck::Root => {
                let observation = detect_root(env, &self.config.root, stop_at_first);
                failure_from_signals(check, &observation.signals, RootSignal::code)
            }
            TrustCheck::Emulator => {
                let observation = detect_emulator(env.build);
                (!observation.matched_rules.is_empty()).then(|| CheckFailure {
                    check,
                    signal_codes: observation
                        .matched_rules
                        .iter()
                        .map(|rule| (*rule).to_string())
                        .collect(),
                    detail: format!("matched {}", observation.matched_rules.join(",")),
                })
            }
            TrustCheck::Debugger => {
                let observation = detect_debug_state(env);
                failure_from_signals(check, &observation.signals, DebugSignal::code)
            }
            TrustCheck::UsbDebugging => {
                let observation = detect_usb_debugging(env);
                failure_from_signals(check, &observation.signals, DebugSignal::code)
            }
            TrustCheck::Signature => {
                let verdict = verify_signers(env, &self.identity);
                verdict.failure.map(|failure| CheckFailure {
                    check,
                    signal_codes: vec![failure.code().to_string()],
                    detail: failure.to_string(),
                })
            }
            TrustCheck::Installer => verify_installer(env, &self.config.installer)
                .err()
                .map(|failure| CheckFailure {
                    check,
                    signal_codes: vec![failure.code().to_string()],
                    detail: failure.to_string(),
                }),
            TrustCheck::Hook => {
                let observation = detect_hooks(env.stack, &self.config.hooks);
                failure_from_signals(check, &observation.signals, HookSignal::code)
            }
        }
    }
}

fn failure_from_signals<S: fmt::Display>(
    check: TrustCheck,
    signals: &[S],
    code: fn(&S) -> &'static str,
) -> Option<CheckFailure> {
    if signals.is_empty() {
        return None;
    }
    Some(CheckFailure {
        check,
        signal_codes: signals.iter().map(|s| code(s).to_string()).collect(),
        detail: signals
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    })
}
