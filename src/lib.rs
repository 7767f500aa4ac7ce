//! Client-side access token cache for OAuth 2.0 / OpenID Connect token endpoints.

pub mod auth;
pub mod oidc;

pub use auth::{token_manager::TokenManager, AccessTokenSource, TokenBundle, TokenProvider};
