//! `-v` / `-q` counting flags mapped onto a tracing level filter.

use clap::ArgAction;
use tracing::Level;
use tracing::level_filters::LevelFilter;

#[derive(clap::Args, Debug, Clone, Default)]
pub struct Verbosity {
    /// More log output per occurrence
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Less log output per occurrence
    #[arg(
        long,
        short = 'q',
        action = ArgAction::Count,
        global = true,
        conflicts_with = "verbose"
    )]
    quiet: u8,
}

impl Verbosity {
    /// Warnings by default; each `-v` adds a level, each `-q` removes one.
    pub fn log_level_filter(&self) -> LevelFilter {
        level_enum(self.verbosity())
            .map(LevelFilter::from_level)
            .unwrap_or(LevelFilter::OFF)
    }

    fn verbosity(&self) -> i16 {
        level_value(Level::WARN) - i16::from(self.quiet) + i16::from(self.verbose)
    }
}

fn level_value(level: Level) -> i16 {
    match level {
        Level::ERROR => 0,
        Level::WARN => 1,
        Level::INFO => 2,
        Level::DEBUG => 3,
        Level::TRACE => 4,
    }
}

fn level_enum(verbosity: i16) -> Option<Level> {
    match verbosity {
        i16::MIN..=-1 => None,
        0 => Some(Level::ERROR),
        1 => Some(Level::WARN),
        2 => Some(Level::INFO),
        3 => Some(Level::DEBUG),
        4..=i16::MAX => Some(Level::TRACE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(verbose: u8, quiet: u8) -> LevelFilter {
        Verbosity { verbose, quiet }.log_level_filter()
    }

    #[test]
    fn defaults_to_warnings() {
        assert_eq!(filter(0, 0), LevelFilter::WARN);
    }

    #[test]
    fn shifts_and_saturates() {
        assert_eq!(filter(1, 0), LevelFilter::INFO);
        assert_eq!(filter(5, 0), LevelFilter::TRACE);
        assert_eq!(filter(0, 1), LevelFilter::ERROR);
        assert_eq!(filter(0, 3), LevelFilter::OFF);
    }
}
