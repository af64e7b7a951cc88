use super::OptionSpec;
use crate::domain::LogLevel;

pub(crate) const VERBOSE: &str = "verbose";
pub(crate) const TRACE: &str = "trace";
pub(crate) const DEBUG: &str = "debug";
pub(crate) const LOG_LEVEL: &str = "loglevel";

/// Verbosity options attached to the root and inherited by every command.
pub(crate) fn standard_options() -> [OptionSpec; 4] {
    [
        OptionSpec::flag(VERBOSE)
            .short('v')
            .long(VERBOSE)
            .help("Verbose logging")
            .inherited(),
        OptionSpec::flag(TRACE)
            .short('t')
            .long(TRACE)
            .help("Trace logging")
            .inherited(),
        OptionSpec::flag(DEBUG)
            .short('d')
            .long(DEBUG)
            .help("Debug logging")
            .inherited(),
        OptionSpec::single(LOG_LEVEL)
            .short('l')
            .long(LOG_LEVEL)
            .alias("log-level")
            .alias("log")
            .value_name("LEVEL")
            .help("Log level (trace, debug, information, warning, error, critical, none)")
            .inherited()
            .validator(|value| {
                value
                    .parse::<LogLevel>()
                    .map(|_| ())
                    .map_err(|_| format!("invalid log level '{value}'"))
            }),
    ]
}
