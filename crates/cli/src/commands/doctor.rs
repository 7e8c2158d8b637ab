//! `roomrelay doctor` — Diagnose connectivity to the configured services.

use roomrelay_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 roomrelay doctor");
    println!("===================\n");

    let mut issues = 0;

    // Config
    let config = match AppConfig::load() {
        Ok(config) => match config.validate() {
            Ok(()) => {
                println!("  ✅ Configuration valid");
                config
            }
            Err(e) => {
                println!("  ❌ Configuration invalid: {e}");
                return summary(1);
            }
        },
        Err(e) => {
            println!("  ❌ Failed to load configuration: {e}");
            return summary(1);
        }
    };

    // Room platform
    let rooms = roomrelay_rooms::build_from_config(&config.rooms);
    match rooms.list_rooms().await {
        Ok(list) => println!("  ✅ Room platform reachable ({} active rooms)", list.len()),
        Err(e) => {
            println!("  ❌ Room platform unreachable: {e}");
            issues += 1;
        }
    }

    // Completion service
    let provider = roomrelay_providers::build_from_config(&config.completion);
    match provider.health_check().await {
        Ok(true) => println!("  ✅ Completion service ({}) reachable", provider.name()),
        Ok(false) => {
            println!("  ⚠️  Completion service ({}) degraded", provider.name());
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ Completion service unreachable: {e}");
            issues += 1;
        }
    }

    // Memory service (optional)
    if config.memory_enabled() {
        let store = roomrelay_memory::build_from_config(&config.memory);
        match store.search("doctor probe", "doctor::probe", 1).await {
            Ok(_) => println!("  ✅ Memory service reachable"),
            Err(e) => {
                println!("  ⚠️  Memory service unreachable: {e}");
                println!("     Chat will run with empty context until it recovers.");
                issues += 1;
            }
        }
    } else {
        println!("  ℹ️  Memory service not configured (long-term memory disabled)");
    }

    summary(issues)
}

fn summary(issues: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }
    Ok(())
}
