use std::fs;

use anyhow::Context;
use itertools::Itertools;
use serde::Deserialize;

use release_sort::organize::{CollisionPolicy, Config, DEFAULT_EXTENSIONS, DEFAULT_FORMAT};

use crate::Args;

/// Config from the user config file
#[derive(Debug, Default, Deserialize)]
struct ReleaseSortConfig {
    #[serde(default)]
    auto: bool,
    #[serde(default)]
    collisions: Option<CollisionPolicy>,
    #[serde(default)]
    debug: bool,
    #[serde(default)]
    dest: Option<String>,
    #[serde(default)]
    dryrun: bool,
    #[serde(default)]
    extensions: Vec<String>,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    verbose: bool,
}

/// Wrapper needed for parsing the user config file section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    release_sort: ReleaseSortConfig,
}

impl ReleaseSortConfig {
    /// Read user config from the file if it exists.
    ///
    /// # Errors
    /// Returns an error if config file exists but cannot be read or parsed.
    fn get_user_config() -> anyhow::Result<Self> {
        let Some(path) = release_sort::config::CONFIG_PATH.as_deref() else {
            return Ok(Self::default());
        };

        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config file {}:\n{e}", path.display())),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {error}",
                path.display()
            )),
        }
    }

    /// Parse config from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str::<UserConfig>(toml_str)
            .map(|config| config.release_sort)
            .context("Failed to parse release_sort config TOML")
    }
}

/// Create config from given command line args and user config file.
///
/// # Errors
/// Returns an error if the config file cannot be read or parsed.
pub fn from_args(args: Args) -> anyhow::Result<Config> {
    let user_config = ReleaseSortConfig::get_user_config()?;
    Ok(merge(args, user_config))
}

/// Flags are OR-ed, CLI values win over the file, and lists are combined.
fn merge(args: Args, user_config: ReleaseSortConfig) -> Config {
    let mut extensions: Vec<String> = user_config
        .extensions
        .into_iter()
        .chain(args.extensions)
        .map(|extension| extension.trim().trim_start_matches('.').to_lowercase())
        .filter(|extension| !extension.is_empty())
        .unique()
        .collect();

    if extensions.is_empty() {
        extensions = DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect();
    }

    Config {
        auto: args.auto || user_config.auto,
        debug: args.debug || user_config.debug,
        dryrun: args.print || user_config.dryrun,
        verbose: args.verbose || user_config.verbose,
        format: args
            .format
            .or(user_config.format)
            .unwrap_or_else(|| DEFAULT_FORMAT.to_string()),
        extensions,
        collisions: args.collisions.or(user_config.collisions).unwrap_or_default(),
        dest: args.dest.or(user_config.dest),
    }
}
