use std::time::Duration;

use anyhow::{bail, Context};
use oidc_token_manager::oidc::TokenManagerBuilder;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let token_endpoint: reqwest::Url = getenv("OIDC_TOKEN_ENDPOINT")?
        .parse()
        .context("OIDC_TOKEN_ENDPOINT is not a valid URL")?;
    let client_id = getenv("OIDC_CLIENT_ID")?;

    let mut builder = TokenManagerBuilder::new(token_endpoint, client_id);
    if let Some(secret) = getenv_opt("OIDC_CLIENT_SECRET") {
        builder = builder.client_secret(secret);
    }
    if let Some(scope) = getenv_opt("OIDC_SCOPE") {
        builder = builder.scope(scope.split_whitespace());
    }
    builder = match (getenv_opt("OIDC_USERNAME"), getenv_opt("OIDC_PASSWORD")) {
        (Some(username), Some(password)) => builder.authentication(username, password),
        (None, None) => builder,
        _ => bail!("OIDC_USERNAME and OIDC_PASSWORD must be set together"),
    };
    if let Some(threshold) = getenv_opt("OIDC_EXPIRE_THRESHOLD_MS") {
        let threshold = threshold
            .parse()
            .context("OIDC_EXPIRE_THRESHOLD_MS is not a number of milliseconds")?;
        builder = builder.expire_threshold(Duration::from_millis(threshold));
    }

    let token_manager = builder.build()?;
    let token = token_manager.access_token().await?;

    info!(message = "Access token acquired", client_id = %token_manager.provider().client_id);
    println!("{}", token.as_str());

    Ok(())
}

fn getenv(key: &str) -> anyhow::Result<String> {
    std::env::var(key).with_context(|| format!("env var {} is not set", key))
}

fn getenv_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}
