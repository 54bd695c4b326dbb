use std::sync::Arc;

use lightweight_actuator::actuator::{
    PingHealthIndicator, ProcessEnvironment, PropertySource, Providers, SimpleMetricsRegistry,
};
use lightweight_actuator::server::signal;
use lightweight_actuator::{logger, ActuatorServer, Config};

/// Config file used when no path is given (extension optional)
const DEFAULT_CONFIG_PATH: &str = "actuator";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg.logging);

    let environment = ProcessEnvironment::new(cfg.actuator.profiles.clone())
        .with_source(PropertySource::from_serializable("applicationConfig", &cfg)?);
    let metrics = SimpleMetricsRegistry::with_names([
        "process.uptime",
        "process.start.time",
        "http.server.requests",
    ]);
    let providers = Providers::new(Arc::new(metrics), Arc::new(environment))
        .with_health(Arc::new(PingHealthIndicator));

    let Some(server) = ActuatorServer::start_if_enabled(&cfg, providers)? else {
        return Ok(());
    };

    signal::block_until_shutdown()?;
    server.stop();
    Ok(())
}
