use clap::{Arg, Command, builder::ValueParser};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Accept either a repeat count (`-vvv`, `3`) or a level name (`info`).
#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(|level: &str| -> std::result::Result<u8, String> {
        match level.to_lowercase().as_str() {
            "error" => return Ok(0),
            "warn" => return Ok(1),
            "info" => return Ok(2),
            "debug" => return Ok(3),
            "trace" => return Ok(4),
            _ => {}
        }

        level
            .parse::<u8>()
            .ok()
            .filter(|parsed| *parsed <= 5)
            .ok_or_else(|| "invalid log level".to_string())
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env("COURTIER_LOG_LEVEL")
            .global(true)
            .action(clap::ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_and_counts_both_parse() {
        let parser = validator_log_level();
        let command = Command::new("test").arg(Arg::new("l").value_parser(parser));

        for (input, expected) in [("error", 0u8), ("INFO", 2), ("trace", 4), ("3", 3)] {
            let matches = command
                .clone()
                .get_matches_from(vec!["test".to_string(), input.to_string()]);
            assert_eq!(matches.get_one::<u8>("l").copied(), Some(expected));
        }

        let result = command
            .clone()
            .try_get_matches_from(vec!["test", "verbose-ish"]);
        assert!(result.is_err());
        let result = command.clone().try_get_matches_from(vec!["test", "9"]);
        assert!(result.is_err());
    }
}
