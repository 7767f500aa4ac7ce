//! Token endpoint responses.

use reqwest::StatusCode;
use serde::Deserialize;

use super::{BearerAccessToken, Error, RefreshToken, Tokens};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported token type {0:?}")]
    TokenType(String),
    #[error("{status_code} status code")]
    Status { status_code: u16 },
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    /// The requested access token.
    access_token: String,
    token_type: String,
    /// The amount of time that an access token is valid (in seconds).
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl From<TokenResponse> for Tokens {
    fn from(res: TokenResponse) -> Self {
        let TokenResponse {
            access_token,
            expires_in,
            refresh_token,
            ..
        } = res;
        // No expires_in means no known lifetime: the token is requested again next time.
        let expires_in_millis = expires_in
            .map(|secs| i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX))
            .unwrap_or(0);
        Tokens::new(
            BearerAccessToken::new(access_token),
            refresh_token.map(RefreshToken::new),
            expires_in_millis,
        )
    }
}

pub(crate) fn parse(status: StatusCode, body: &str) -> Result<Tokens, Error> {
    if !status.is_success() {
        return Err(match serde_json::from_str::<ErrorResponse>(body) {
            Ok(ErrorResponse {
                error,
                error_description,
            }) => Error::Provider {
                code: error,
                description: error_description,
            },
            Err(_) => ParseError::Status {
                status_code: status.as_u16(),
            }
            .into(),
        });
    }

    let res: TokenResponse = serde_json::from_str(body).map_err(ParseError::from)?;
    if !res.token_type.eq_ignore_ascii_case("bearer") {
        return Err(ParseError::TokenType(res.token_type).into());
    }
    Ok(res.into())
}
