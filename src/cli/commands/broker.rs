use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_SESSION_SECRET: &str = "session-secret";
pub const ARG_TOKEN_TTL_SECONDS: &str = "token-ttl-seconds";
pub const ARG_SUPERADMIN_EMAIL: &str = "superadmin-email";
pub const ARG_SUPERADMIN_SUBJECT: &str = "superadmin-subject";
pub const ARG_DEFAULT_PASSWORD: &str = "default-password";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_SECRET)
                .long(ARG_SESSION_SECRET)
                .help("Secret used to sign session tokens")
                .env("COURTIER_SESSION_SECRET")
                .required(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL_SECONDS)
                .long(ARG_TOKEN_TTL_SECONDS)
                .help("Session token TTL in seconds")
                .env("COURTIER_TOKEN_TTL_SECONDS")
                .default_value("43200")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_SUPERADMIN_EMAIL)
                .long(ARG_SUPERADMIN_EMAIL)
                .help("Email half of the platform superadmin identity pair")
                .env("COURTIER_SUPERADMIN_EMAIL")
                .requires(ARG_SUPERADMIN_SUBJECT),
        )
        .arg(
            Arg::new(ARG_SUPERADMIN_SUBJECT)
                .long(ARG_SUPERADMIN_SUBJECT)
                .help("Subject-id half of the platform superadmin identity pair")
                .env("COURTIER_SUPERADMIN_SUBJECT")
                .requires(ARG_SUPERADMIN_EMAIL),
        )
        .arg(
            Arg::new(ARG_DEFAULT_PASSWORD)
                .long(ARG_DEFAULT_PASSWORD)
                .help("Bootstrap password for newly registered identities (rotated out of band)")
                .env("COURTIER_DEFAULT_PASSWORD")
                .default_value("ChangeMeNow1!"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub session_secret: SecretString,
    pub token_ttl_seconds: i64,
    pub superadmin_email: Option<String>,
    pub superadmin_subject: Option<String>,
    pub default_password: String,
}

impl Options {
    /// Extract broker options from parsed matches.
    ///
    /// # Errors
    ///
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let session_secret = matches
            .get_one::<String>(ARG_SESSION_SECRET)
            .cloned()
            .context("missing required argument: --session-secret")?;
        let token_ttl_seconds = matches
            .get_one::<i64>(ARG_TOKEN_TTL_SECONDS)
            .copied()
            .unwrap_or(43200);
        let default_password = matches
            .get_one::<String>(ARG_DEFAULT_PASSWORD)
            .cloned()
            .context("missing required argument: --default-password")?;

        Ok(Self {
            session_secret: SecretString::from(session_secret),
            token_ttl_seconds,
            superadmin_email: matches.get_one::<String>(ARG_SUPERADMIN_EMAIL).cloned(),
            superadmin_subject: matches.get_one::<String>(ARG_SUPERADMIN_SUBJECT).cloned(),
            default_password,
        })
    }
}
