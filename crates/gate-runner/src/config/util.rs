use std::time::Duration;

use trust_gate::MIN_PROCESS_PROBE_TIMEOUT;

pub(super) fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

pub(super) fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| non_empty(Some(v)))
}

pub(super) fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "enabled" | "on"
    )
}

/// Rejects waits below the library floor instead of silently raising them.
pub(super) fn probe_timeout_from_ms(ms: u64) -> Option<Duration> {
    let timeout = Duration::from_millis(ms);
    (timeout >= MIN_PROCESS_PROBE_TIMEOUT).then_some(timeout)
}
