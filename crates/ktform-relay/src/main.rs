use anyhow::Context;
use ktform_core::Config;
use ktform_infra::{init_telemetry, TelemetryFormat};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env().context("Failed to load configuration")?;

    init_telemetry(
        "ktform-relay",
        TelemetryFormat::for_environment(config.environment()),
    )?;

    let router = ktform_relay::initialize_app(&config)?;

    ktform_relay::setup::server::start_server(&config, router).await?;

    Ok(())
}
