#![allow(dead_code)]

use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use trust_gate::{
    certificate_fingerprint, BuildInfo, DebuggerProbe, EnvironmentSnapshot, ExpectedIdentity,
    FileProbe, HookRules, InstallerPolicy, PackageQuery, ProbeError, ProbeResult, ProcessSpawner,
    RootCheckConfig, SettingsStore, StackFrame, StackIntrospector, TrustEngine, TrustGateConfig,
};

pub const RELEASE_CERT: &[u8] = b"0\x82\x03\x01release-signing-certificate";
pub const ROGUE_CERT: &[u8] = b"0\x82\x03\x01repackaged-signing-certificate";

pub fn release_identity() -> ExpectedIdentity {
    ExpectedIdentity::parse(&certificate_fingerprint(RELEASE_CERT)).expect("valid fingerprint")
}

pub fn gate_config(installer: InstallerPolicy) -> TrustGateConfig {
    TrustGateConfig {
        root: RootCheckConfig::default(),
        hooks: HookRules::default(),
        installer,
        process_probe_timeout: Duration::from_millis(500),
    }
}

pub fn engine() -> TrustEngine {
    TrustEngine::new(gate_config(InstallerPolicy::default()), release_identity())
}

pub fn physical_device_build() -> BuildInfo {
    BuildInfo {
        tags: Some("release-keys".to_string()),
        fingerprint: Some("google/walleye/walleye:11/RP1A.201005.004/6782484:user/release-keys".to_string()),
        model: Some("Pixel 2".to_string()),
        manufacturer: Some("Google".to_string()),
        brand: Some("google".to_string()),
        device: Some("walleye".to_string()),
        hardware: Some("walleye".to_string()),
        product: Some("walleye".to_string()),
        app_debuggable: false,
    }
}

pub fn unmodified_stack() -> Vec<StackFrame> {
    vec![
        StackFrame::new("com.example.app.SecurityGate.capture"),
        StackFrame::new("android.app.ActivityThread.main"),
        StackFrame::new("com.android.internal.os.RuntimeInit$MethodAndArgsCaller.run"),
        StackFrame::new("com.android.internal.os.ZygoteInit.main"),
    ]
}

/// Scripted host. Every capability answers from fields; `None` in the
/// optional probe fields makes that probe fail.
pub struct FakeEnvironment {
    pub build: BuildInfo,
    pub existing_paths: Vec<String>,
    pub denied_paths: Vec<String>,
    pub which_output: Option<Option<String>>,
    pub debugger_attached: Option<bool>,
    pub settings: Option<BTreeMap<String, i64>>,
    pub sdk_level: u32,
    pub modern_signers: Option<Option<Vec<Vec<u8>>>>,
    pub legacy_signers: Option<Option<Vec<Vec<u8>>>>,
    pub installer: Option<Option<String>>,
    pub frames: Option<Vec<StackFrame>>,
    pub spawn_calls: Cell<usize>,
    pub capture_calls: Cell<usize>,
}

impl FakeEnvironment {
    pub fn clean() -> Self {
        Self {
            build: physical_device_build(),
            existing_paths: Vec::new(),
            denied_paths: Vec::new(),
            which_output: Some(None),
            debugger_attached: Some(false),
            settings: Some(BTreeMap::from([("adb_enabled".to_string(), 0)])),
            sdk_level: 33,
            modern_signers: Some(Some(vec![RELEASE_CERT.to_vec()])),
            legacy_signers: Some(Some(vec![RELEASE_CERT.to_vec()])),
            installer: Some(Some("com.android.vending".to_string())),
            frames: Some(unmodified_stack()),
            spawn_calls: Cell::new(0),
            capture_calls: Cell::new(0),
        }
    }

    pub fn snapshot(&self) -> EnvironmentSnapshot<'_> {
        EnvironmentSnapshot::from_host(&self.build, self)
    }
}

impl FileProbe for FakeEnvironment {
    fn exists(&self, path: &Path) -> ProbeResult<bool> {
        let path = path.to_string_lossy();
        if self.denied_paths.iter().any(|p| p == path.as_ref()) {
            return Err(ProbeError::Io(std::io::Error::from(
                std::io::ErrorKind::PermissionDenied,
            )));
        }
        Ok(self.existing_paths.iter().any(|p| p == path.as_ref()))
    }
}

impl ProcessSpawner for FakeEnvironment {
    fn first_stdout_line(&self, program: &str, _args: &[&str]) -> ProbeResult<Option<String>> {
        self.spawn_calls.set(self.spawn_calls.get() + 1);
        self.which_output
            .clone()
            .ok_or_else(|| ProbeError::Spawn(format!("{program}: no such file")))
    }
}

impl DebuggerProbe for FakeEnvironment {
    fn debugger_attached(&self) -> ProbeResult<bool> {
        self.debugger_attached
            .ok_or(ProbeError::Unsupported("debugger query"))
    }
}

impl SettingsStore for FakeEnvironment {
    fn global_int(&self, key: &str) -> ProbeResult<Option<i64>> {
        self.settings
            .as_ref()
            .map(|settings| settings.get(key).copied())
            .ok_or_else(|| ProbeError::Query("content resolver unavailable".to_string()))
    }
}

impl PackageQuery for FakeEnvironment {
    fn sdk_level(&self) -> u32 {
        self.sdk_level
    }

    fn signing_certificates(&self) -> ProbeResult<Option<Vec<Vec<u8>>>> {
        self.modern_signers
            .clone()
            .ok_or_else(|| ProbeError::Query("package not found".to_string()))
    }

    fn legacy_signatures(&self) -> ProbeResult<Option<Vec<Vec<u8>>>> {
        self.legacy_signers
            .clone()
            .ok_or_else(|| ProbeError::Query("package not found".to_string()))
    }

    fn installer_package(&self) -> ProbeResult<Option<String>> {
        self.installer
            .clone()
            .ok_or_else(|| ProbeError::Query("package not found".to_string()))
    }
}

impl StackIntrospector for FakeEnvironment {
    fn capture(&self) -> ProbeResult<Vec<StackFrame>> {
        self.capture_calls.set(self.capture_calls.get() + 1);
        self.frames
            .clone()
            .ok_or(ProbeError::Unsupported("stack capture"))
    }
}
