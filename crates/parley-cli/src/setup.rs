//! Config file management and data paths.

use std::path::PathBuf;

use colored::*;

use parley_core::config::ParleyConfig;

/// Keys accepted by `parley config set`.
const KEYS: &[&str] = &[
    "host",
    "port",
    "cors_permissive",
    "provider",
    "model",
    "api_base",
    "temperature",
    "timeout_secs",
    "fallback_models",
    "max_turns",
];

/// Load the saved config, or defaults when none exists.
pub fn load_config() -> anyhow::Result<ParleyConfig> {
    Ok(ParleyConfig::load(&ParleyConfig::default_path())?)
}

/// Get data directory (logs live here).
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parley")
}

/// Apply one `key = value` pair to a config.
fn apply(config: &mut ParleyConfig, key: &str, value: &str) -> anyhow::Result<()> {
    match key {
        "host" => config.server.host = value.to_string(),
        "port" => config.server.port = value.parse()?,
        "cors_permissive" => config.server.cors_permissive = value.parse()?,
        "provider" => config.backend.provider = value.to_string(),
        "model" => config.backend.model = value.to_string(),
        "api_base" => config.backend.api_base = value.to_string(),
        "temperature" => config.backend.temperature = value.parse()?,
        "timeout_secs" => config.backend.timeout_secs = value.parse()?,
        "fallback_models" => {
            config.backend.fallback_models = value
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from)
                .collect();
        }
        "max_turns" => config.session.max_turns = value.parse()?,
        _ => anyhow::bail!("Unknown key: {}", key),
    }
    Ok(())
}

/// `parley config set <key> <value>`.
pub fn run_config_set(key: &str, value: &str) -> anyhow::Result<()> {
    let config_path = ParleyConfig::default_path();
    let mut config = ParleyConfig::load(&config_path)?;

    if let Err(e) = apply(&mut config, key, value) {
        println!("{} {}", "Error:".red(), e);
        println!("\nAvailable keys:");
        for k in KEYS {
            println!("  • {}", k.cyan());
        }
        return Ok(());
    }

    config.save(&config_path)?;
    println!("  {} {} = {}", "✅ Set".green(), key.cyan(), value);

    Ok(())
}

/// `parley config show`.
pub fn run_config_show() -> anyhow::Result<()> {
    let config_path = ParleyConfig::default_path();

    println!();
    println!("  {} {}", "Config file:".dimmed(), config_path.display());
    if !config_path.exists() {
        println!("  {}", "(not created yet, showing defaults)".yellow());
    }
    println!();

    let config = ParleyConfig::load(&config_path)?;
    let row = |key: &str, value: String| {
        println!("  {} {} = {}", "│".dimmed(), key.cyan(), value.green());
    };

    println!("  {}", "┌─ Server ───────────────────────".dimmed());
    row("host", config.server.host.clone());
    row("port", config.server.port.to_string());
    row("cors_permissive", config.server.cors_permissive.to_string());

    println!("  {}", "├─ Backend ──────────────────────".dimmed());
    row("provider", config.backend.provider.clone());
    row("model", config.backend.model.clone());
    row("api_base", config.backend.api_base.clone());
    row("temperature", config.backend.temperature.to_string());
    row("timeout_secs", config.backend.timeout_secs.to_string());
    row(
        "fallback_models",
        if config.backend.fallback_models.is_empty() {
            "(none)".to_string()
        } else {
            config.backend.fallback_models.join(", ")
        },
    );

    println!("  {}", "├─ Session ──────────────────────".dimmed());
    row("max_turns", config.session.max_turns.to_string());
    println!("  {}", "└────────────────────────────────".dimmed());
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_known_keys() {
        let mut config = ParleyConfig::default();
        apply(&mut config, "port", "9000").unwrap();
        apply(&mut config, "model", "llama3.2").unwrap();
        apply(&mut config, "fallback_models", "phi3:mini, ,tinyllama").unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.backend.model, "llama3.2");
        assert_eq!(config.backend.fallback_models, ["phi3:mini", "tinyllama"]);
    }

    #[test]
    fn test_apply_rejects_bad_input() {
        let mut config = ParleyConfig::default();
        assert!(apply(&mut config, "port", "eighty").is_err());
        assert!(apply(&mut config, "api_key", "secret").is_err());
        assert_eq!(config.server.port, 8000);
    }
}
