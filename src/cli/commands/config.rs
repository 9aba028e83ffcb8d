//! Config command implementation

use anyhow::Result;

use crate::Config;

/// Execute the config command
pub fn execute_config_command(config: &Config) -> Result<()> {
    let effective = config.effective_config();
    let width = effective.keys().map(String::len).max().unwrap_or(0);

    println!("Effective configuration:");
    for (key, (value, source)) in &effective {
        println!("  {key:<width$} = {value}  ({source})");
    }

    let key_present = std::env::var(&config.generation.api_key_env).is_ok_and(|v| !v.is_empty());
    println!(
        "\n  API key ({}): {}",
        config.generation.api_key_env,
        if key_present { "set" } else { "not set" }
    );
    Ok(())
}
