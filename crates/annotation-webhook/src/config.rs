use anyhow::{anyhow, Result};
use clap::ArgMatches;
use lazy_static::lazy_static;
use serde::Deserialize;
use std::fs::File;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::admission::patch::PatchStrategy;

lazy_static! {
    pub(crate) static ref HOSTNAME: String =
        std::env::var("HOSTNAME").unwrap_or_else(|_| String::from("unknown"));
}

pub struct Config {
    pub addr: SocketAddr,
    pub tls_config: Option<TlsConfig>,
    pub policy: PolicySettings,
    pub max_body_size: usize,
    pub log_level: String,
    pub log_fmt: String,
    pub log_no_color: bool,
}

pub struct TlsConfig {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

/// Settings of the annotation policy
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicySettings {
    /// Only objects living inside of this namespace are annotated
    pub namespace: String,
    pub annotation_key: String,
    pub annotation_value: String,
    pub patch_strategy: PatchStrategy,
}

impl Default for PolicySettings {
    fn default() -> Self {
        PolicySettings {
            namespace: String::from("default"),
            annotation_key: String::from("my-annotation"),
            annotation_value: String::from("added-by-webhook"),
            patch_strategy: PatchStrategy::Map,
        }
    }
}

impl PolicySettings {
    fn validate(&self) -> Result<()> {
        if self.annotation_key.is_empty() {
            return Err(anyhow!("the annotation key cannot be empty"));
        }
        if self.namespace.is_empty() {
            return Err(anyhow!("the namespace cannot be empty"));
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: PolicySettingsOverrides) {
        if let Some(namespace) = overrides.namespace {
            self.namespace = namespace;
        }
        if let Some(annotation_key) = overrides.annotation_key {
            self.annotation_key = annotation_key;
        }
        if let Some(annotation_value) = overrides.annotation_value {
            self.annotation_value = annotation_value;
        }
        if let Some(patch_strategy) = overrides.patch_strategy {
            self.patch_strategy = patch_strategy;
        }
    }
}

/// Contents of the policy configuration file. Every field is optional, the
/// ones that are not set keep the value provided via the command line.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PolicySettingsOverrides {
    pub namespace: Option<String>,
    pub annotation_key: Option<String>,
    pub annotation_value: Option<String>,
    pub patch_strategy: Option<PatchStrategy>,
}

impl Config {
    pub fn from_args(matches: &ArgMatches) -> Result<Self> {
        let addr = api_bind_address(matches)?;
        let tls_config = tls_config(matches)?;
        let policy = policy_settings(matches)?;

        let max_body_size = matches
            .get_one::<String>("max-body-size")
            .expect("This should not happen, there's a default value for max-body-size")
            .parse::<usize>()
            .map_err(|e| anyhow!("error parsing max-body-size: {}", e))?;

        let log_level = matches
            .get_one::<String>("log-level")
            .expect("This should not happen, there's a default value for log-level")
            .to_owned();
        let log_fmt = matches
            .get_one::<String>("log-fmt")
            .expect("This should not happen, there's a default value for log-fmt")
            .to_owned();
        let log_no_color = matches
            .get_one::<bool>("log-no-color")
            .expect("clap should have assigned a default value")
            .to_owned();

        Ok(Self {
            addr,
            tls_config,
            policy,
            max_body_size,
            log_level,
            log_fmt,
            log_no_color,
        })
    }
}

fn api_bind_address(matches: &ArgMatches) -> Result<SocketAddr> {
    format!(
        "{}:{}",
        matches
            .get_one::<String>("address")
            .expect("This should not happen, there's a default value for address"),
        matches
            .get_one::<String>("port")
            .expect("This should not happen, there's a default value for port")
    )
    .parse()
    .map_err(|e| anyhow!("error parsing arguments: {}", e))
}

fn tls_config(matches: &ArgMatches) -> Result<Option<TlsConfig>> {
    let cert_file = matches
        .get_one::<String>("tls-cert")
        .expect("This should not happen, there's a default value for tls-cert");
    let key_file = matches
        .get_one::<String>("tls-key")
        .expect("This should not happen, there's a default value for tls-key");

    match (cert_file.is_empty(), key_file.is_empty()) {
        (true, true) => Ok(None),
        (false, false) => Ok(Some(TlsConfig {
            cert_file: PathBuf::from(cert_file),
            key_file: PathBuf::from(key_file),
        })),
        _ => Err(anyhow!(
            "error parsing arguments: either both --tls-cert and --tls-key must be provided, or neither"
        )),
    }
}

fn policy_settings(matches: &ArgMatches) -> Result<PolicySettings> {
    let mut settings = PolicySettings {
        namespace: matches
            .get_one::<String>("namespace")
            .expect("This should not happen, there's a default value for namespace")
            .to_owned(),
        annotation_key: matches
            .get_one::<String>("annotation-key")
            .expect("This should not happen, there's a default value for annotation-key")
            .to_owned(),
        annotation_value: matches
            .get_one::<String>("annotation-value")
            .expect("This should not happen, there's a default value for annotation-value")
            .to_owned(),
        patch_strategy: matches
            .get_one::<String>("patch-strategy")
            .expect("This should not happen, there's a default value for patch-strategy")
            .parse::<PatchStrategy>()
            .map_err(|e| anyhow!("error parsing arguments: {}", e))?,
    };

    if let Some(path) = matches.get_one::<String>("policy-config") {
        let path = Path::new(path);
        let overrides = read_policy_config_file(path).map_err(|e| {
            anyhow!(
                "error while loading policy settings from {:?}: {}",
                path,
                e
            )
        })?;
        settings.apply_overrides(overrides);
    }

    settings.validate()?;

    Ok(settings)
}

fn read_policy_config_file(path: &Path) -> Result<PolicySettingsOverrides> {
    let file = File::open(path)?;
    let overrides: Option<PolicySettingsOverrides> = serde_yaml::from_reader(&file)?;
    Ok(overrides.unwrap_or_default())
}
