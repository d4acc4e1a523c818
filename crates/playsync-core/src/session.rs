//! Session bootstrap.
//!
//! Logs in with either account credentials or a bearer token. A token login
//! that fails in a way that points at an expired token triggers exactly one
//! forced refresh and one retry; there is no third attempt.

use playsync_schema::SessionCredential;
use thiserror::Error;
use tracing::info;

use crate::catalog::{CatalogError, CatalogLogin, Credentials};
use crate::token::{TokenError, TokenSource};

/// Errors from [`connect`].
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Cannot login to the catalog: {0}")]
    Login(#[source] CatalogError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// How the session authenticates.
pub enum AuthMode<'a> {
    /// Account email and an already resolved password.
    Password { email: String, password: String },
    /// Bearer token, either operator supplied or obtained from `source`.
    /// `source` is also used to refresh the token when it is rejected.
    Token {
        credential: SessionCredential,
        source: &'a dyn TokenSource,
    },
}

impl std::fmt::Debug for AuthMode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password { email, .. } => f
                .debug_struct("Password")
                .field("email", email)
                .finish_non_exhaustive(),
            Self::Token { credential, .. } => f
                .debug_struct("Token")
                .field("credential", credential)
                .finish_non_exhaustive(),
        }
    }
}

/// Establish an authenticated session.
///
/// # Errors
///
/// [`SessionError::Login`] when login fails for good, [`SessionError::Token`]
/// when a forced token refresh itself fails.
pub async fn connect<L: CatalogLogin>(
    login: &L,
    auth: AuthMode<'_>,
) -> Result<L::Session, SessionError> {
    match auth {
        AuthMode::Password { email, password } => {
            info!("Using credentials to connect to API");
            login
                .login(&Credentials::Password { email, password })
                .await
                .map_err(SessionError::Login)
        }
        AuthMode::Token { credential, source } => {
            info!("Using token to connect to API");
            match login.login(&Credentials::Token(credential)).await {
                Ok(session) => Ok(session),
                Err(e) if e.is_token_expiry() => {
                    info!("Token has expired or is invalid ({e}). Retrieving a new one...");
                    let fresh = source.retrieve(true).await?;
                    login
                        .login(&Credentials::Token(fresh))
                        .await
                        .map_err(SessionError::Login)
                }
                Err(e) => Err(SessionError::Login(e)),
            }
        }
    }
}
