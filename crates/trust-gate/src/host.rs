//! Capability implementations backed by the standard library and a
//! declarative device profile, for hosts that are not a managed runtime.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::engine::MIN_PROCESS_PROBE_TIMEOUT;
use crate::environment::{
    BuildInfo, DebuggerProbe, FileProbe, PackageQuery, ProcessSpawner, SettingsStore, StackFrame,
    StackIntrospector,
};
use crate::error::{ProbeError, ProbeResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileProbe;

impl FileProbe for StdFileProbe {
    fn exists(&self, path: &Path) -> ProbeResult<bool> {
        match std::fs::metadata(path) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(ProbeError::Io(err)),
        }
    }
}

/// Most bytes of a probe's first output line that are kept. Any byte
/// already counts as output, so the rest is never read.
pub const MAX_PROBE_LINE_BYTES: u64 = 4 * 1024;

/// Spawns probe commands with a bounded wait on their first output line.
#[derive(Debug, Clone)]
pub struct CommandSpawner {
    timeout: Duration,
}

impl CommandSpawner {
    /// Waits shorter than [`MIN_PROCESS_PROBE_TIMEOUT`] are raised to it.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout: timeout.max(MIN_PROCESS_PROBE_TIMEOUT),
        }
    }
}

/// Owns a spawned child; kills and reaps it when dropped.
struct ChildGuard(Child);

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Ok(None) = self.0.try_wait() {
            let _ = self.0.kill();
        }
        let _ = self.0.wait();
    }
}

impl ProcessSpawner for CommandSpawner {
    fn first_stdout_line(&self, program: &str, args: &[&str]) -> ProbeResult<Option<String>> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| ProbeError::Spawn(format!("{program}: {err}")))?;
        let mut guard = ChildGuard(child);

        let stdout = guard
            .0
            .stdout
            .take()
            .ok_or_else(|| ProbeError::Spawn(format!("{program}: stdout not captured")))?;

        let (tx, rx) = mpsc::channel();
        let reader = thread::spawn(move || {
            let mut line = Vec::new();
            let result = BufReader::new(stdout.take(MAX_PROBE_LINE_BYTES))
                .read_until(b'\n', &mut line)
                .map(|read| {
                    (read > 0).then(|| {
                        String::from_utf8_lossy(&line)
                            .trim_end_matches(['\r', '\n'])
                            .to_string()
                    })
                });
            let _ = tx.send(result);
        });

        let outcome = match rx.recv_timeout(self.timeout) {
            Ok(Ok(line)) => Ok(line),
            Ok(Err(err)) => Err(ProbeError::Io(err)),
            Err(RecvTimeoutError::Timeout) => Err(ProbeError::Timeout {
                command: program.to_string(),
                waited_ms: self.timeout.as_millis() as u64,
            }),
            Err(RecvTimeoutError::Disconnected) => {
                Err(ProbeError::Spawn(format!("{program}: output reader exited")))
            }
        };

        drop(guard);
        // After a timeout the reader finishes once the killed child's pipe
        // closes; it is not joined so a stray grandchild cannot stall us.
        if !matches!(outcome, Err(ProbeError::Timeout { .. })) {
            let _ = reader.join();
        }
        outcome
    }
}

/// Reads `TracerPid` from `/proc/self/status`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcStatusDebugger;

impl DebuggerProbe for ProcStatusDebugger {
    fn debugger_attached(&self) -> ProbeResult<bool> {
        #[cfg(target_os = "linux")]
        {
            let status = std::fs::read_to_string("/proc/self/status")?;
            let tracer_pid = parse_tracer_pid(&status)
                .ok_or_else(|| ProbeError::Query("TracerPid missing from status".to_string()))?;
            Ok(tracer_pid > 0)
        }
        #[cfg(not(target_os = "linux"))]
        {
            Err(ProbeError::Unsupported("proc status"))
        }
    }
}

pub fn parse_tracer_pid(status: &str) -> Option<u32> {
    for line in status.lines() {
        let Some(raw) = line.strip_prefix("TracerPid:") else {
            continue;
        };
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }
        return value.parse::<u32>().ok();
    }
    None
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BacktraceIntrospector;

impl StackIntrospector for BacktraceIntrospector {
    fn capture(&self) -> ProbeResult<Vec<StackFrame>> {
        let backtrace = std::backtrace::Backtrace::force_capture();
        if backtrace.status() != std::backtrace::BacktraceStatus::Captured {
            return Err(ProbeError::Unsupported("backtrace capture"));
        }
        Ok(parse_backtrace_frames(&backtrace.to_string()))
    }
}

/// Extracts frame symbols from rendered backtrace text, skipping the
/// `at file:line` location lines.
pub fn parse_backtrace_frames(rendered: &str) -> Vec<StackFrame> {
    rendered
        .lines()
        .filter_map(|line| {
            let (index, symbol) = line.trim_start().split_once(':')?;
            if index.is_empty() || !index.chars().all(|ch| ch.is_ascii_digit()) {
                return None;
            }
            let symbol = symbol.trim();
            (!symbol.is_empty()).then(|| StackFrame::new(symbol))
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageProfile {
    #[serde(default)]
    pub sdk_level: u32,
    /// Base64 DER signer certificates; `None` models a platform that
    /// returned no signing info.
    #[serde(default)]
    pub signers: Option<Vec<String>>,
    #[serde(default)]
    pub installer: Option<String>,
}

/// Static device facts the host cannot probe directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    #[serde(default)]
    pub build: BuildInfo,
    #[serde(default)]
    pub settings: BTreeMap<String, i64>,
    #[serde(default)]
    pub package: PackageProfile,
}

impl DeviceProfile {
    fn decoded_signers(&self) -> ProbeResult<Option<Vec<Vec<u8>>>> {
        let Some(encoded) = self.package.signers.as_ref() else {
            return Ok(None);
        };
        encoded
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                base64::engine::general_purpose::STANDARD
                    .decode(raw.trim())
                    .map_err(|err| ProbeError::Query(format!("signer #{index}: {err}")))
            })
            .collect::<ProbeResult<Vec<_>>>()
            .map(Some)
    }
}

/// Full host environment: live probes for the filesystem, processes,
/// debugger and stack, profile data for everything else.
#[derive(Debug, Clone)]
pub struct HostEnvironment {
    pub profile: DeviceProfile,
    pub files: StdFileProbe,
    pub spawner: CommandSpawner,
    pub debugger: ProcStatusDebugger,
    pub stack: BacktraceIntrospector,
}

impl HostEnvironment {
    pub fn new(profile: DeviceProfile, probe_timeout: Duration) -> Self {
        Self {
            profile,
            files: StdFileProbe,
            spawner: CommandSpawner::new(probe_timeout),
            debugger: ProcStatusDebugger,
            stack: BacktraceIntrospector,
        }
    }

    pub fn build(&self) -> &BuildInfo {
        &self.profile.build
    }
}

impl FileProbe for HostEnvironment {
    fn exists(&self, path: &Path) -> ProbeResult<bool> {
        self.files.exists(path)
    }
}

impl ProcessSpawner for HostEnvironment {
    fn first_stdout_line(&self, program: &str, args: &[&str]) -> ProbeResult<Option<String>> {
        self.spawner.first_stdout_line(program, args)
    }
}

impl DebuggerProbe for HostEnvironment {
    fn debugger_attached(&self) -> ProbeResult<bool> {
        self.debugger.debugger_attached()
    }
}

impl SettingsStore for HostEnvironment {
    fn global_int(&self, key: &str) -> ProbeResult<Option<i64>> {
        Ok(self.profile.settings.get(key).copied())
    }
}

impl PackageQuery for HostEnvironment {
    fn sdk_level(&self) -> u32 {
        self.profile.package.sdk_level
    }

    fn signing_certificates(&self) -> ProbeResult<Option<Vec<Vec<u8>>>> {
        self.profile.decoded_signers()
    }

    fn legacy_signatures(&self) -> ProbeResult<Option<Vec<Vec<u8>>>> {
        self.profile.decoded_signers()
    }

    fn installer_package(&self) -> ProbeResult<Option<String>> {
        Ok(self.profile.package.installer.clone())
    }
}

impl StackIntrospector for HostEnvironment {
    fn capture(&self) -> ProbeResult<Vec<StackFrame>> {
        self.stack.capture()
    }
}
