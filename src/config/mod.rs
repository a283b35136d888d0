// Configuration management module
// TOML-backed settings for the embedder and the directory index

pub mod settings;

pub use settings::{Config, ConfigError, IndexConfig, OllamaConfig};

/// Print the effective configuration as TOML
#[inline]
pub fn show_config(config: &Config) -> anyhow::Result<()> {
    let rendered = toml::to_string_pretty(config)?;
    println!("# {}", config.config_file_path().display());
    println!("{}", rendered);
    Ok(())
}
