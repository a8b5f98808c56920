use config::{Config, File};
use std::path::{Path, PathBuf};

use super::*;

/// The prefix of environment variables merged into the configuration.
///
/// `ORACLEX__CONTRACT__ADDRESS=0x..` overrides `contract.address`.
pub const ENV_PREFIX: &str = "ORACLEX";

/// A helper function that will search for all config files in the given directory and return them as a vec
/// of the paths.
///
/// Supported file extensions are:
/// - `.toml`.
/// - `.json`.
pub fn search_config_files<P: AsRef<Path>>(
    base_dir: P,
) -> oraclex_relayer_utils::Result<Vec<PathBuf>> {
    // A pattern that covers all toml or json files in the config directory and subdirectories.
    let toml_pattern = format!("{}/**/*.toml", base_dir.as_ref().display());
    let json_pattern = format!("{}/**/*.json", base_dir.as_ref().display());
    tracing::trace!(
        "Loading config files from {} and {}",
        toml_pattern,
        json_pattern
    );
    let toml_files = glob::glob(&toml_pattern)?;
    let json_files = glob::glob(&json_pattern)?;
    toml_files
        .chain(json_files)
        .map(|v| v.map_err(oraclex_relayer_utils::Error::from))
        .collect()
}

/// Try to parse the [`OracleXRelayerConfig`] from the given config file(s).
pub fn parse_from_files(
    files: &[PathBuf],
) -> oraclex_relayer_utils::Result<OracleXRelayerConfig> {
    let mut builder = Config::builder();
    for config_file in files {
        tracing::trace!("Loading config file: {}", config_file.display());
        let ext = config_file
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        let format = match ext {
            "toml" => config::FileFormat::Toml,
            "json" => config::FileFormat::Json,
            _ => {
                tracing::warn!("Unknown file extension: {}", ext);
                continue;
            }
        };
        builder = builder
            .add_source(File::from(config_file.as_path()).format(format));
    }

    // also merge in the environment (with a prefix of ORACLEX).
    let builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX).separator("__"),
    );
    let cfg = builder.build()?;
    // and finally deserialize the config and post-process it
    let config: Result<
        OracleXRelayerConfig,
        serde_path_to_error::Error<config::ConfigError>,
    > = serde_path_to_error::deserialize(cfg);
    match config {
        Ok(c) => postloading_process(c),
        Err(e) => {
            tracing::error!("{}", e);
            Err(e.into())
        }
    }
}

/// Load the configuration files and
///
/// Returns `Ok(OracleXRelayerConfig)` on success, or `Err(Error)` on failure.
///
/// # Arguments
///
/// * `path` - The path to the configuration directory
///
/// # Example
///
/// ```no_run
/// use oraclex_relayer_config::utils::load;
///
/// let path = "/path/to/config";
/// let _ = load(path);
/// ```
///
/// it is the same as using the [`search_config_files`] and [`parse_from_files`] functions combined.
pub fn load<P: AsRef<Path>>(
    path: P,
) -> oraclex_relayer_utils::Result<OracleXRelayerConfig> {
    parse_from_files(&search_config_files(path)?)
}

/// The postloading_process exists to validate configuration and standardize
/// the format of the configuration
pub fn postloading_process(
    mut config: OracleXRelayerConfig,
) -> oraclex_relayer_utils::Result<OracleXRelayerConfig> {
    tracing::trace!("Checking configration sanity ...");
    config.chain.name = config.chain.name.to_lowercase();

    if !config.contract.events_watcher.enabled {
        tracing::warn!(
            "!!WARNING!!: events-watcher is disabled for ({:?}),
            no new subscriptions will be picked up",
            config.contract.address
        );
    }
    if config.chain.rpc_timeout == 0 {
        tracing::warn!(
            "!!WARNING!!: rpc-timeout is zero, network calls may hang forever"
        );
    }
    if config.commitment.max_attempts == 0 {
        tracing::warn!(
            "!!WARNING!!: max-attempts is zero, no commitment will ever be submitted"
        );
    }

    tracing::trace!(
        "postloaded config: {}",
        serde_json::to_string_pretty(&config)?
    );

    Ok(config)
}
