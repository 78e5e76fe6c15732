use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_DIRECTORY_URL: &str = "directory-url";
pub const ARG_DIRECTORY_API_KEY: &str = "directory-api-key";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DIRECTORY_URL)
                .long(ARG_DIRECTORY_URL)
                .help("Base URL of the external identity provider")
                .env("COURTIER_DIRECTORY_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_DIRECTORY_API_KEY)
                .long(ARG_DIRECTORY_API_KEY)
                .help("Bearer key for identity provider admin calls")
                .env("COURTIER_DIRECTORY_API_KEY"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub url: String,
    pub api_key: Option<SecretString>,
}

impl Options {
    /// Extract identity provider options from parsed matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider URL is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let url = matches
            .get_one::<String>(ARG_DIRECTORY_URL)
            .cloned()
            .context("missing required argument: --directory-url")?;

        Ok(Self {
            url,
            api_key: matches
                .get_one::<String>(ARG_DIRECTORY_API_KEY)
                .cloned()
                .map(SecretString::from),
        })
    }
}
