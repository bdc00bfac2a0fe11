use anyhow::Context as _;
use loadrep_core::{OutputType, SuccessPolicy, parse_output_type};
use serde::Deserialize;
use std::path::Path;

use crate::cli::ReportArgs;

pub(crate) const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Optional YAML config file. Every key can also be given on the command line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct ConfigFile {
    pub output: Option<String>,
    pub debug: Option<bool>,
    /// e.g. `200-399`
    pub success_status: Option<String>,
    pub channel_capacity: Option<usize>,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReportConfig {
    pub output: OutputType,
    pub debug: bool,
    pub policy: SuccessPolicy,
    pub channel_capacity: usize,
    pub log_level: Option<String>,
}

pub(crate) async fn load_config_file(path: &Path) -> anyhow::Result<ConfigFile> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    parse_config_file(&text).with_context(|| format!("invalid config: {}", path.display()))
}

fn parse_config_file(text: &str) -> anyhow::Result<ConfigFile> {
    if text.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    Ok(serde_yaml::from_str(text)?)
}

impl ReportConfig {
    /// CLI flags win over the config file, the config file wins over defaults.
    pub(crate) fn resolve(args: &ReportArgs, file: ConfigFile) -> anyhow::Result<Self> {
        let output = match (args.output, file.output.as_deref()) {
            (Some(v), _) => v,
            (None, Some(name)) => parse_output_type(name).map_err(anyhow::Error::msg)?,
            (None, None) => OutputType::StdoutJson,
        };

        let policy = match (&args.success_status, file.success_status.as_deref()) {
            (Some(p), _) => p.clone(),
            (None, Some(raw)) => raw.parse::<SuccessPolicy>()?,
            (None, None) => SuccessPolicy::default(),
        };

        let channel_capacity = args
            .channel_capacity
            .or(file.channel_capacity)
            .unwrap_or(DEFAULT_CHANNEL_CAPACITY);
        if channel_capacity == 0 {
            anyhow::bail!("`channelCapacity` must be a positive integer");
        }

        Ok(Self {
            output,
            debug: args.debug || file.debug.unwrap_or(false),
            policy,
            channel_capacity,
            log_level: args.log_level.clone().or(file.log_level),
        })
    }
}
