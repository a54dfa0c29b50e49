mod config;
mod report;

use anyhow::Result;
use tracing::{error, info};

use config::RunnerConfig;
use trust_gate::host::HostEnvironment;
use trust_gate::{EnvironmentSnapshot, ExpectedIdentity, TrustEngine};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let config = RunnerConfig::load()?;

    let host = HostEnvironment::new(config.device.clone(), config.gate.process_probe_timeout);
    let snapshot = EnvironmentSnapshot::from_host(host.build(), &host);
    let engine = TrustEngine::new(config.gate.clone(), ExpectedIdentity::embedded());

    if config.debug_report {
        let report = engine.inspect(&snapshot);
        info!(
            config = ?config.source_path,
            report = %report::report_payload(&report),
            "debug trust report"
        );
    }

    if !engine.evaluate(&snapshot) {
        error!("trust gate failed; terminating");
        std::process::exit(1);
    }

    info!("trust gate passed; device secure");
    Ok(())
}
