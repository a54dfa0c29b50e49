use super::types::RunnerConfig;
use super::util::{env_non_empty, parse_bool, probe_timeout_from_ms};

// Only runtime knobs are read from the environment. Settings that can
// weaken a check (installer policy, su probe command, extra paths and
// hook markers) come from the config file alone.
impl RunnerConfig {
    pub(super) fn apply_env_overrides(&mut self) {
        if let Some(v) = env_non_empty("TRUST_GATE_PROCESS_PROBE_TIMEOUT_MS") {
            self.apply_env_probe_timeout(&v);
        }
        if let Some(v) = env_non_empty("TRUST_GATE_DEBUG_REPORT") {
            self.debug_report = parse_bool(&v);
        }
    }

    fn apply_env_probe_timeout(&mut self, raw: &str) {
        match raw.trim().parse::<u64>().ok().and_then(probe_timeout_from_ms) {
            Some(timeout) => self.gate.process_probe_timeout = timeout,
            None => tracing::warn!(
                value = raw,
                kept_ms = self.gate.process_probe_timeout.as_millis() as u64,
                "ignoring invalid TRUST_GATE_PROCESS_PROBE_TIMEOUT_MS"
            ),
        }
    }
}
