//! `roomrelay serve` — Start the HTTP gateway server.

use roomrelay_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    config
        .validate()
        .map_err(|e| format!("Invalid configuration: {e}"))?;

    println!("🦀 roomrelay gateway");
    println!(
        "   Listening: {}:{}",
        config.gateway.host, config.gateway.port
    );
    println!("   Room platform: {}", config.rooms.url);
    println!(
        "   Memory: {}",
        if config.memory_enabled() {
            config.memory.api_url.as_str()
        } else {
            "disabled"
        }
    );

    roomrelay_gateway::start(config).await?;

    Ok(())
}
