//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the
//! appropriate action, such as starting the API server with its full
//! configuration state.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{broker, directory};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let broker_opts = broker::Options::parse(matches)?;
    let directory_opts = directory::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        session_secret: broker_opts.session_secret,
        token_ttl_seconds: broker_opts.token_ttl_seconds,
        superadmin_email: broker_opts.superadmin_email,
        superadmin_subject: broker_opts.superadmin_subject,
        default_password: broker_opts.default_password,
        directory_url: directory_opts.url,
        directory_api_key: directory_opts.api_key,
    }))
}
