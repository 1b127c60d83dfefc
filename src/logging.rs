use env_logger::{Builder, Env};
use log::{self, LevelFilter};
use chrono::Local;
use std::io::Write;
use yansi::Paint;

/// Crate prefix dropped from log targets
const CRATE_TARGET: &str = "repo_summarizer::";

/// Initializes logging for the command-line run
///
/// `RUST_LOG` wins over `log_level` when it is set. HTTP client internals stay at
/// `warn` unless `RUST_LOG` says otherwise. Calling this twice is a no-op.
pub fn init(log_level: &str) {
    let env = Env::default()
        .filter_or("RUST_LOG", default_filter(parse_log_level(log_level)))
        .write_style_or("RUST_LOG_STYLE", "auto");

    let _ = Builder::from_env(env)
        .format(|buf, record| writeln!(buf, "{}", format_log(record)))
        .try_init();
}

fn default_filter(level: LevelFilter) -> String {
    let quiet = level.min(LevelFilter::Warn);
    format!("{},hyper={},reqwest={}", level, quiet, quiet)
}

/// Formats a log record as `[time] LEVEL [module] message`
///
/// Targets inside this crate lose their `repo_summarizer::` prefix.
pub fn format_log(record: &log::Record) -> String {
    let level = match record.level() {
        log::Level::Error => Paint::red("ERROR").bold(),
        log::Level::Warn => Paint::yellow("WARN ").bold(),
        log::Level::Info => Paint::cyan("INFO ").bold(),
        log::Level::Debug => Paint::blue("DEBUG").bold(),
        log::Level::Trace => Paint::new("TRACE"),
    };

    let target = match record.target() {
        "" => record.module_path().unwrap_or("unknown"),
        target => target,
    };

    format!(
        "[{}] {} [{}] {}",
        Local::now().format("%H:%M:%S%.3f"),
        level,
        short_target(target),
        record.args()
    )
}

/// Strips the crate prefix from `target`; foreign targets pass through
pub fn short_target(target: &str) -> &str {
    target.strip_prefix(CRATE_TARGET).unwrap_or(target)
}

/// Parses a log level string into a LevelFilter
///
/// Returns the corresponding LevelFilter, defaulting to Info for invalid strings
pub fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}
