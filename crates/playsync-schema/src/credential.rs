//! Bearer token and session id pair used in place of account credentials.

use thiserror::Error;

/// Errors raised while validating a credential pair.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The session id is not a hexadecimal number.
    #[error("Invalid session id '{0}': expected a hexadecimal number")]
    InvalidSessionId(String),

    /// The bearer token is empty.
    #[error("Empty bearer token")]
    EmptyToken,
}

/// Session id as handed out by the token dispenser.
///
/// Keeps the original hexadecimal text so a cached pair is written back
/// byte-for-byte, alongside the parsed numeric value used at login.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId {
    raw: String,
    value: u64,
}

impl SessionId {
    /// Parse a hexadecimal session id, with or without a `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::InvalidSessionId`] if `s` is not valid hex
    /// or does not fit in 64 bits.
    ///
    /// # Example
    ///
    /// ```
    /// use playsync_schema::SessionId;
    ///
    /// let id = SessionId::parse("3a8f").unwrap();
    /// assert_eq!(id.value(), 0x3a8f);
    /// assert_eq!(id.as_str(), "3a8f");
    /// assert!(SessionId::parse("xyz").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, CredentialError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.is_empty() {
            return Err(CredentialError::InvalidSessionId(s.to_string()));
        }
        let value = u64::from_str_radix(digits, 16)
            .map_err(|_| CredentialError::InvalidSessionId(s.to_string()))?;
        Ok(Self {
            raw: s.to_string(),
            value,
        })
    }

    /// Numeric value sent to the catalog.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Original hexadecimal text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// A (bearer token, session id) pair.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential {
    /// Bearer token presented at login.
    pub token: String,
    /// Session id the token was issued for.
    pub session_id: SessionId,
}

impl SessionCredential {
    /// Build a credential from its textual parts.
    ///
    /// # Errors
    ///
    /// Fails if the token is empty or the session id is not hexadecimal.
    pub fn parse(token: &str, session_id: &str) -> Result<Self, CredentialError> {
        if token.is_empty() {
            return Err(CredentialError::EmptyToken);
        }
        Ok(Self {
            token: token.to_string(),
            session_id: SessionId::parse(session_id)?,
        })
    }

    /// Parse a `"<token> <session_id>"` line.
    ///
    /// Returns `None` when the line carries fewer than two whitespace
    /// separated fields or the pair fails validation. Extra fields are ignored.
    pub fn from_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let token = parts.next()?;
        let session_id = parts.next()?;
        Self::parse(token, session_id).ok()
    }

    /// Serialise to the single-line `"<token> <session_id>"` form.
    pub fn to_line(&self) -> String {
        format!("{} {}", self.token, self.session_id)
    }
}

// Tokens end up in logs via `{:?}`; keep them out.
impl std::fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredential")
            .field("token", &"<redacted>")
            .field("session_id", &self.session_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_round_trip() {
        let cred = SessionCredential::parse("tok-123", "00ffA1").unwrap();
        let line = cred.to_line();
        assert_eq!(line, "tok-123 00ffA1");
        assert_eq!(SessionCredential::from_line(&line), Some(cred));
    }

    #[test]
    fn test_from_line_rejects_single_field() {
        assert_eq!(SessionCredential::from_line("onlytoken"), None);
        assert_eq!(SessionCredential::from_line(""), None);
        assert_eq!(SessionCredential::from_line("tok nothex"), None);
    }

    #[test]
    fn test_session_id_prefix_and_overflow() {
        assert_eq!(SessionId::parse("0x10").unwrap().value(), 16);
        assert!(SessionId::parse("0x").is_err());
        assert!(SessionId::parse("1ffffffffffffffff").is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let cred = SessionCredential::parse("secret", "1").unwrap();
        assert!(!format!("{cred:?}").contains("secret"));
    }
}
