//! Configuration management for wafprobe

use crate::error::{Result, WafProbeError};
use crate::models::TesterConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// File-based configuration structure matching default.toml
#[derive(Debug, Deserialize)]
struct FileConfig {
    target: Option<TargetSection>,
    dispatch: Option<DispatchSection>,
    catalogue: Option<CatalogueSection>,
    output: Option<OutputSection>,
}

#[derive(Debug, Deserialize)]
struct TargetSection {
    url: Option<String>,
    log_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct DispatchSection {
    concurrency: Option<usize>,
    timeout_secs: Option<u64>,
    delay_ms: Option<u64>,
    grace_secs: Option<u64>,
    user_agent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogueSection {
    attack_types: Option<Vec<String>>,
    endpoints: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct OutputSection {
    save: Option<bool>,
    json_report: Option<PathBuf>,
    text_report: Option<PathBuf>,
}

/// Loads configuration from a TOML file and merges with defaults
pub fn load_config(path: &Path) -> Result<TesterConfig> {
    let content = std::fs::read_to_string(path).map_err(WafProbeError::IoError)?;
    parse_config(&content)
}

/// Parses TOML configuration text and merges it with defaults
pub fn parse_config(content: &str) -> Result<TesterConfig> {
    let file_config: FileConfig = toml::from_str(content)?;

    let mut config = TesterConfig::default();

    if let Some(target) = file_config.target {
        if let Some(url) = target.url {
            config.target = url;
        }
        if let Some(log_file) = target.log_file {
            config.log_file = log_file;
        }
    }

    if let Some(dispatch) = file_config.dispatch {
        if let Some(concurrency) = dispatch.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(timeout) = dispatch.timeout_secs {
            config.timeout_secs = timeout;
        }
        if let Some(delay) = dispatch.delay_ms {
            config.delay_ms = delay;
        }
        if let Some(grace) = dispatch.grace_secs {
            config.grace_secs = grace;
        }
        if let Some(ua) = dispatch.user_agent {
            config.user_agent = ua;
        }
    }

    if let Some(catalogue) = file_config.catalogue {
        if let Some(attack_types) = catalogue.attack_types {
            config.attack_types = attack_types;
        }
        if let Some(endpoints) = catalogue.endpoints {
            config.endpoints = endpoints;
        }
    }

    if let Some(output) = file_config.output {
        if let Some(save) = output.save {
            config.save_results = save;
        }
        if let Some(json) = output.json_report {
            config.json_report = json;
        }
        if let Some(text) = output.text_report {
            config.text_report = text;
        }
    }

    Ok(config)
}

/// Command-line overrides, applied on top of file configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub target: Option<String>,
    pub log_file: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub delay_ms: Option<u64>,
    pub grace_secs: Option<u64>,
    pub json_report: Option<PathBuf>,
    pub text_report: Option<PathBuf>,
    pub no_save: bool,
}

/// Merges CLI arguments into an existing TesterConfig
pub fn merge_cli_args(config: &mut TesterConfig, cli: CliOverrides) {
    if let Some(target) = cli.target {
        config.target = target;
    }
    if let Some(log_file) = cli.log_file {
        config.log_file = log_file;
    }
    if let Some(c) = cli.concurrency {
        config.concurrency = c;
    }
    if let Some(t) = cli.timeout_secs {
        config.timeout_secs = t;
    }
    if let Some(d) = cli.delay_ms {
        config.delay_ms = d;
    }
    if let Some(g) = cli.grace_secs {
        config.grace_secs = g;
    }
    if let Some(j) = cli.json_report {
        config.json_report = j;
    }
    if let Some(t) = cli.text_report {
        config.text_report = t;
    }
    if cli.no_save {
        config.save_results = false;
    }
}

/// Checks the merged configuration and normalizes the target URL
pub fn validate(config: &mut TesterConfig) -> Result<()> {
    let trimmed = config.target.trim().trim_end_matches('/').to_string();
    if trimmed.is_empty() {
        return Err(WafProbeError::ConfigError(
            "target URL must not be empty".to_string(),
        ));
    }

    let url = Url::parse(&trimmed)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(WafProbeError::ConfigError(format!(
            "unsupported target scheme '{}'",
            url.scheme()
        )));
    }

    if config.concurrency == 0 {
        return Err(WafProbeError::ConfigError(
            "concurrency must be at least 1".to_string(),
        ));
    }

    config.target = trimmed;
    Ok(())
}
