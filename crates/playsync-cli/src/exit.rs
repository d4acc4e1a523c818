//! Process exit codes.

use playsync_core::{SessionError, TokenError};

use crate::secret::SecretError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Ok,
    /// Anything without a dedicated code, configuration errors included.
    Error,
    TokenDispenserAuth,
    TokenDispenserServer,
    KeyringUnavailable,
    CannotLogin,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::Error => 1,
            Self::TokenDispenserAuth => 5,
            Self::TokenDispenserServer => 6,
            Self::KeyringUnavailable => 10,
            Self::CannotLogin => 15,
        }
    }

    /// Pick the status for a fatal error by walking its cause chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(e) = cause.downcast_ref::<SessionError>() {
                return match e {
                    SessionError::Login(_) => Self::CannotLogin,
                    SessionError::Token(t) => Self::from_token(t),
                };
            }
            if let Some(t) = cause.downcast_ref::<TokenError>() {
                return Self::from_token(t);
            }
            if let Some(SecretError::KeyringUnavailable) = cause.downcast_ref::<SecretError>() {
                return Self::KeyringUnavailable;
            }
        }
        Self::Error
    }

    fn from_token(err: &TokenError) -> Self {
        match err {
            TokenError::DispenserAuth => Self::TokenDispenserAuth,
            TokenError::DispenserServer => Self::TokenDispenserServer,
            _ => Self::Error,
        }
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        Self::from(status.code())
    }
}
