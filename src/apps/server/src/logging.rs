//! Logging Configuration

use tracing_subscriber::EnvFilter;

pub const LOG_LEVEL_ENV: &str = "REDRAFT_LOG_LEVEL";

pub fn parse_log_level(value: &str) -> Option<log::LevelFilter> {
    match value.trim().to_lowercase().as_str() {
        "trace" => Some(log::LevelFilter::Trace),
        "debug" => Some(log::LevelFilter::Debug),
        "info" => Some(log::LevelFilter::Info),
        "warn" => Some(log::LevelFilter::Warn),
        "error" => Some(log::LevelFilter::Error),
        "off" => Some(log::LevelFilter::Off),
        _ => None,
    }
}

pub fn level_to_str(level: log::LevelFilter) -> &'static str {
    match level {
        log::LevelFilter::Trace => "trace",
        log::LevelFilter::Debug => "debug",
        log::LevelFilter::Info => "info",
        log::LevelFilter::Warn => "warn",
        log::LevelFilter::Error => "error",
        log::LevelFilter::Off => "off",
    }
}

fn default_level(is_debug: bool) -> log::LevelFilter {
    if is_debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    }
}

/// Filter directives: `REDRAFT_LOG_LEVEL`, then `RUST_LOG`, then the default.
pub fn resolve_filter<F>(is_debug: bool, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup(LOG_LEVEL_ENV) {
        match parse_log_level(&val) {
            Some(level) => return level_to_str(level).to_string(),
            None => eprintln!(
                "Warning: Invalid {} '{}', falling back to default",
                LOG_LEVEL_ENV, val
            ),
        }
    }
    if let Some(directives) = lookup("RUST_LOG").filter(|v| !v.trim().is_empty()) {
        return directives;
    }
    level_to_str(default_level(is_debug)).to_string()
}

/// Installs the global subscriber; `log` records from the library crates are
/// bridged into it.
pub fn init_logging(is_debug: bool) {
    let directives = resolve_filter(is_debug, |key| std::env::var(key).ok());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("Warning: Invalid log filter '{}': {}", directives, e);
        EnvFilter::new(level_to_str(default_level(is_debug)))
    });

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(is_debug)
        .try_init();
    if let Err(e) = result {
        eprintln!("Warning: logging already initialized: {}", e);
    }
}
