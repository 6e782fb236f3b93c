use std::io::Write;

use env_logger::Builder;
use log::Level;

/// Environment variable holding the log filter, in env_logger syntax
pub const LOG_ENV: &str = "RUST_LOG";

/// Initializes the global logger, reading the filter from [LOG_ENV].
/// Records go to stderr, so stdout only ever carries the tool's own output
///
/// # Errors
///
/// Fails if a global logger has already been set
pub fn try_init() -> Result<(), log::SetLoggerError> {
    try_init_custom_env(LOG_ENV)
}

/// Same as [try_init], with a custom variable name
pub fn try_init_custom_env(environment_variable_name: &str) -> Result<(), log::SetLoggerError> {
    let mut builder = formatted_builder();

    if let Ok(s) = std::env::var(environment_variable_name) {
        builder.parse_filters(&s);
    }

    builder.try_init()
}

pub fn formatted_builder() -> Builder {
    let mut builder = Builder::new();

    builder.format(|f, record| {
        writeln!(f, "{} {} > {}", level_label(record.level()), record.target(), record.args())
    });

    builder
}

fn level_label(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRACE",
        Level::Debug => "DEBUG",
        Level::Info => "INFO ",
        Level::Warn => "WARN ",
        Level::Error => "ERROR",
    }
}
