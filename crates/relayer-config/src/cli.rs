use crate::OracleXRelayerConfig;
use anyhow::Context;
use directories_next::ProjectDirs;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

/// Package identifier, where the default configuration is defined.
/// If the user does not start the relayer with the `--config-dir`
/// it will default to read from the default location depending on the OS.
pub const PACKAGE_ID: [&str; 3] = ["tools", "oraclex", "oraclex-relayer"];

/// The OracleX Relayer Command-line tool
///
/// Start the relayer from a config directory:
///
/// $ oraclex-relayer -vvv -c <CONFIG_DIR_PATH>
#[derive(StructOpt)]
#[structopt(name = "OracleX Relayer")]
pub struct Opts {
    /// A level of verbosity, and can be used multiple times
    #[structopt(short, long, parse(from_occurrences))]
    pub verbose: i32,
    /// Directory that contains configration files.
    #[structopt(
        short = "c",
        long = "config-dir",
        value_name = "PATH",
        parse(from_os_str)
    )]
    pub config_dir: Option<PathBuf>,
    /// Path of a `.env` file to load before reading the configuration.
    #[structopt(long = "env-file", value_name = "FILE", parse(from_os_str))]
    pub env_file: Option<PathBuf>,
}

/// Loads the configuration from the given directory.
///
/// Returns `Ok(Config)` on success, or `Err(anyhow::Error)` on failure.
///
/// # Arguments
///
/// * `config_dir` - An optional `PathBuf` representing the directory that contains the configuration.
pub fn load_config<P>(
    config_dir: Option<P>,
) -> Result<OracleXRelayerConfig, anyhow::Error>
where
    P: AsRef<Path>,
{
    let path = match config_dir {
        Some(p) => p.as_ref().to_path_buf(),
        None => {
            tracing::debug!("Getting default dirs for oraclex relayer");
            let dirs =
                ProjectDirs::from(PACKAGE_ID[0], PACKAGE_ID[1], PACKAGE_ID[2])
                    .context("failed to get config")?;
            dirs.config_dir().to_path_buf()
        }
    };
    // return an error if the path is not a directory.
    if !path.is_dir() {
        return Err(anyhow::anyhow!("{} is not a directory", path.display()));
    }
    tracing::trace!("Loading Config from {} ..", path.display());
    let v = crate::utils::load(path)?;
    tracing::trace!("Config loaded..");
    Ok(v)
}

/// Maps the number of `-v` flags to a log level.
pub fn log_level(verbosity: i32) -> tracing::Level {
    use tracing::Level;
    match verbosity {
        i32::MIN..=0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Sets up the logger for the relayer, based on the verbosity level passed in.
///
/// `filter` is the target the verbosity applies to, usually the binary's
/// crate name; everything else follows `RUST_LOG`.
pub fn setup_logger(verbosity: i32, filter: &str) -> anyhow::Result<()> {
    let log_level = log_level(verbosity);
    let directive_1 = format!("{filter}={log_level}")
        .parse()
        .context("invalid log filter")?;
    let directive_2 = format!("oraclex={log_level}")
        .parse()
        .context("invalid log filter")?;
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(directive_1)
        .add_directive(directive_2);
    let logger = tracing_subscriber::fmt()
        .with_target(true)
        .with_max_level(log_level)
        .with_env_filter(env_filter);
    // if we are not compiling for integration tests, we should use pretty logs
    #[cfg(not(feature = "integration-tests"))]
    let logger = logger.pretty();
    // otherwise, we should use json, which is easy to parse.
    #[cfg(feature = "integration-tests")]
    let logger = logger.json().flatten_event(true).with_current_span(false);

    logger.init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(log_level(0), tracing::Level::ERROR);
        assert_eq!(log_level(2), tracing::Level::INFO);
        assert_eq!(log_level(9), tracing::Level::TRACE);
    }

    #[test]
    fn missing_config_dir_is_an_error() {
        let err = load_config(Some("/definitely/not/a/dir")).unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }
}
