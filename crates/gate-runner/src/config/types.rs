use std::path::PathBuf;

use trust_gate::host::DeviceProfile;
use trust_gate::TrustGateConfig;

#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    pub gate: TrustGateConfig,
    pub device: DeviceProfile,
    /// Log the full per-check report before the verdict is acted on.
    pub debug_report: bool,
    pub source_path: Option<PathBuf>,
}
