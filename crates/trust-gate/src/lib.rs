mod debugger;
mod emulator;
mod engine;
mod environment;
mod error;
mod hook;
pub mod host;
mod installer;
mod root;
mod signature;

pub use debugger::{
    detect_debug_state, detect_usb_debugging, DebugObservation, DebugSignal, ADB_ENABLED_SETTING,
};
pub use emulator::{detect_emulator, emulator_rule_names, EmulatorObservation};
pub use engine::{
    CheckFailure, TrustCheck, TrustEngine, TrustGateConfig, TrustReport,
    DEFAULT_PROCESS_PROBE_TIMEOUT, MIN_PROCESS_PROBE_TIMEOUT,
};
pub use environment::{
    BuildInfo, DebuggerProbe, EnvironmentSnapshot, FileProbe, PackageQuery, ProcessSpawner,
    SettingsStore, StackFrame, StackIntrospector,
};
pub use error::{ProbeError, ProbeResult};
pub use hook::{
    detect_hooks, inspect_frames, HookObservation, HookRules, HookSignal,
    INSTRUMENTATION_NAMESPACES, PROCESS_INIT_FRAME,
};
pub use installer::{verify_installer, InstallerFailure, InstallerPolicy, PLAY_STORE_INSTALLER};
pub use root::{
    detect_root, root_probe_names, RootCheckConfig, RootObservation, RootSignal, SUPERUSER_PATHS,
    TEST_KEYS_MARKER,
};
pub use signature::{
    certificate_fingerprint, installed_signers, normalize_sha256_hex, verify_certificates,
    verify_signers, ExpectedIdentity, SignatureFailure, SignatureVerdict, MULTI_SIGNER_SDK_LEVEL,
};
