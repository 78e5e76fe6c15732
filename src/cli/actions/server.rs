use crate::{
    api,
    api::handlers::auth::BrokerConfig,
    directory::HttpDirectory,
    token::SessionSigner,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub session_secret: SecretString,
    pub token_ttl_seconds: i64,
    pub superadmin_email: Option<String>,
    pub superadmin_subject: Option<String>,
    pub default_password: String,
    pub directory_url: String,
    pub directory_api_key: Option<SecretString>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the signing setup or provider URL is invalid, or the
/// server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    // An unusable signing setup must fail before the listener binds.
    let signer = SessionSigner::new(args.session_secret, args.token_ttl_seconds)
        .context("Invalid session signing configuration")?;

    let directory = Arc::new(
        HttpDirectory::new(&args.directory_url, args.directory_api_key)
            .context("Invalid identity provider configuration")?,
    );

    let config = BrokerConfig::new()
        .with_token_ttl_seconds(args.token_ttl_seconds)
        .with_registration_password(args.default_password)
        .with_superadmin(args.superadmin_email, args.superadmin_subject);

    api::new(
        args.port,
        args.dsn,
        config,
        signer,
        directory.clone(),
        directory,
    )
    .await
}
