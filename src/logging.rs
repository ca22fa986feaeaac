use env_logger::{Builder, Env};
use log::{Level, LevelFilter};
use std::io::Write;

use crate::config::LoggingConfig;

fn level_char(level: Level) -> char {
    match level {
        Level::Error => 'E',
        Level::Warn => 'W',
        Level::Info => 'I',
        Level::Debug => 'D',
        Level::Trace => 'T',
    }
}

/// Initialise `env_logger` with a compact `[HH:MM:SS] (L) message` format.
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(config: &LoggingConfig) {
    let level = if config.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let timestamps = config.timestamps;

    let mut builder = Builder::new();
    builder
        .filter_level(level)
        .parse_env(Env::default())
        .format(move |buf, record| {
            if timestamps {
                write!(buf, "[{}] ", chrono::Local::now().format("%H:%M:%S"))?;
            }
            writeln!(buf, "({}) {}", level_char(record.level()), record.args())
        });

    if let Err(e) = builder.try_init() {
        eprintln!("Logger already initialised: {}", e);
    }
}
