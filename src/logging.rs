//! Logger setup.
//!
//! The `-v` count picks the level of this crate's logs and, from `-vvv` on,
//! lets the recognizer backends speak too. `RUST_LOG` overrides both.

use env_logger::{Builder, Env};
use log::{LevelFilter, info};

/// Level of this crate's own logs for a given number of `-v` flags.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 if cfg!(debug_assertions) => LevelFilter::Debug,
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn dependency_level(verbosity: u8) -> LevelFilter {
    if verbosity >= 3 {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

fn builder(verbosity: u8, env: Env) -> Builder {
    let mut builder = Builder::new();
    builder
        .filter_level(dependency_level(verbosity))
        .filter_module(env!("CARGO_CRATE_NAME"), level_for(verbosity))
        .format_timestamp_secs()
        .format_module_path(false)
        .parse_env(env);
    builder
}

pub fn init_logging(verbosity: u8) {
    #[cfg(feature = "whisper")]
    whisper_rs::install_logging_hooks();

    builder(verbosity, Env::default()).init();
    info!("Logging at {} for sayword", level_for(verbosity));
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log, Metadata};

    fn enabled(verbosity: u8, target: &str, level: Level) -> bool {
        // An unset variable, so the developer's RUST_LOG does not leak in.
        let logger = builder(verbosity, Env::new().filter("SAYWORD_TEST_UNSET_LOG")).build();
        logger.enabled(&Metadata::builder().target(target).level(level).build())
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for(1), LevelFilter::Debug);
        assert_eq!(level_for(2), LevelFilter::Trace);
        assert_eq!(level_for(9), LevelFilter::Trace);
        assert!(level_for(0) >= LevelFilter::Info);
    }

    #[test]
    fn test_crate_logs_follow_verbosity() {
        assert!(enabled(0, "sayword::listen", Level::Info));
        assert!(!enabled(1, "sayword::listen", Level::Trace));
        assert!(enabled(2, "sayword::listen", Level::Trace));
    }

    #[test]
    fn test_dependencies_stay_quiet_until_very_verbose() {
        assert!(enabled(0, "whisper_rs", Level::Warn));
        assert!(!enabled(2, "whisper_rs", Level::Info));
        assert!(enabled(3, "whisper_rs", Level::Debug));
    }
}
