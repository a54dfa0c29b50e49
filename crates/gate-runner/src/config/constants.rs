pub(super) const RUNNER_CONFIG_CANDIDATES: [&str; 2] =
    ["/etc/trust-gate/gate.toml", "./trust-gate.toml"];
