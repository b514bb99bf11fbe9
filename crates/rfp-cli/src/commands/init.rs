//! `rfp init` — interactive setup wizard writing `~/.rfp-pipeline/config.toml`.
use std::fs;

use anyhow::{bail, Context, Result};
use console::Style;
use dialoguer::Input;
use rfp_core::config::{expand_tilde, Config};

const DEFAULT_CONFIG_PATH: &str = "~/.rfp-pipeline/config.toml";

/// Run the init command.
pub async fn execute(force: bool, config_path: &str) -> Result<()> {
    let heading = Style::new().bold();
    let path = expand_tilde(config_path);

    if path.exists() && !force {
        bail!("config file already exists at {}. Pass --force to overwrite.", path.display());
    }

    println!("{}", heading.apply_to("RFP/RFI pipeline setup"));

    let mut config = Config::default();

    config.llm.api_key = Some(Input::<String>::new().with_prompt("Anthropic API key").interact_text()?);
    config.embedding.api_key = Some(Input::<String>::new().with_prompt("Voyage AI API key").interact_text()?);
    config.blob.endpoint = Input::<String>::new()
        .with_prompt("Blob store endpoint")
        .default(config.blob.endpoint.clone())
        .interact_text()?;
    config.blob.access_key = Some(Input::<String>::new().with_prompt("Blob store access key").interact_text()?);
    config.blob.secret_key = Some(Input::<String>::new().with_prompt("Blob store secret key").interact_text()?);
    config.org.company_name = Input::<String>::new()
        .with_prompt("Your company name (shown on generated artifacts)")
        .default(config.org.company_name.clone())
        .interact_text()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating config directory {}", parent.display()))?;
    }
    let toml_text = toml::to_string_pretty(&config).context("serializing configuration")?;
    fs::write(&path, toml_text).with_context(|| format!("writing config to {}", path.display()))?;

    println!("Wrote configuration to {}", path.display());
    println!("Run `rfp test` to validate connectivity, then `rfp project create --name ...` to begin.");

    Ok(())
}

/// The default config path shown in CLI help text.
pub fn default_config_path() -> &'static str {
    DEFAULT_CONFIG_PATH
}
