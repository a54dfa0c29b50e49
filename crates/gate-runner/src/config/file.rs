use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use trust_gate::host::DeviceProfile;
use trust_gate::{InstallerPolicy, MIN_PROCESS_PROBE_TIMEOUT};

use super::paths::resolve_config_path;
use super::types::RunnerConfig;
use super::util::{non_empty, probe_timeout_from_ms};

impl RunnerConfig {
    pub(super) fn apply_file_config(&mut self) -> Result<bool> {
        let Some(path) = resolve_config_path()? else {
            return Ok(false);
        };
        self.apply_file_at(&path)?;
        Ok(true)
    }

    fn apply_file_at(&mut self, path: &Path) -> Result<()> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading config file {}", path.display()))?;
        let file_cfg: FileConfig = toml::from_str(&raw)
            .with_context(|| format!("failed parsing TOML config {}", path.display()))?;

        self.apply_file_gate(file_cfg.gate)
            .with_context(|| format!("invalid [gate] section in {}", path.display()))?;
        self.apply_file_hooks(file_cfg.hooks);
        if let Some(device) = file_cfg.device {
            self.device = device;
        }
        if let Some(v) = file_cfg.debug_report {
            self.debug_report = v;
        }
        self.source_path = Some(path.to_path_buf());
        Ok(())
    }

    fn apply_file_gate(&mut self, gate: Option<FileGateConfig>) -> Result<()> {
        let Some(gate) = gate else {
            return Ok(());
        };

        if gate.installer_bypass.unwrap_or(false) {
            self.gate.installer = InstallerPolicy::Bypass;
        } else if let Some(allowed) = gate.installer_allowlist {
            let allowed: Vec<String> = allowed
                .into_iter()
                .filter_map(|v| non_empty(Some(v)))
                .collect();
            if !allowed.is_empty() {
                self.gate.installer = InstallerPolicy::AllowList(allowed);
            }
        }
        if let Some(v) = gate.process_probe_timeout_ms {
            self.gate.process_probe_timeout = probe_timeout_from_ms(v).with_context(|| {
                format!(
                    "gate.process_probe_timeout_ms must be at least {} ms, got {}",
                    MIN_PROCESS_PROBE_TIMEOUT.as_millis(),
                    v
                )
            })?;
        }
        if let Some(v) = non_empty(gate.which_program) {
            self.gate.root.which_program = v;
        }
        for path in gate.extra_superuser_paths {
            if !path.trim().is_empty() && !self.gate.root.superuser_paths.contains(&path) {
                self.gate.root.superuser_paths.push(path);
            }
        }
        Ok(())
    }

    fn apply_file_hooks(&mut self, hooks: Option<FileHookConfig>) {
        let Some(hooks) = hooks else {
            return;
        };

        if let Some(v) = non_empty(hooks.process_init_frame) {
            self.gate.hooks.process_init_frame = v;
        }
        for ns in hooks.extra_instrumentation_namespaces {
            if !ns.trim().is_empty() && !self.gate.hooks.instrumentation_namespaces.contains(&ns) {
                self.gate.hooks.instrumentation_namespaces.push(ns);
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default)]
    debug_report: Option<bool>,
    #[serde(default)]
    gate: Option<FileGateConfig>,
    #[serde(default)]
    hooks: Option<FileHookConfig>,
    #[serde(default)]
    device: Option<DeviceProfile>,
}

#[derive(Debug, Deserialize)]
struct FileGateConfig {
    #[serde(default)]
    installer_allowlist: Option<Vec<String>>,
    #[serde(default)]
    installer_bypass: Option<bool>,
    #[serde(default)]
    process_probe_timeout_ms: Option<u64>,
    #[serde(default)]
    which_program: Option<String>,
    #[serde(default)]
    extra_superuser_paths: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FileHookConfig {
    #[serde(default)]
    process_init_frame: Option<String>,
    #[serde(default)]
    extra_instrumentation_namespaces: Vec<String>,
}
