//! Client for the token dispenser endpoint.
//!
//! The dispenser answers a plain GET with a text body: either one of two
//! sentinel error strings or `"<token> <session_id_hex>"`.

use playsync_schema::SessionCredential;
use reqwest::Client;

use super::TokenError;

const AUTH_ERROR_BODY: &str = "Auth error";
const SERVER_ERROR_BODY: &str = "Server error";

/// Client for the token dispenser endpoint.
#[derive(Debug, Clone)]
pub struct TokenDispenser {
    client: Client,
    url: String,
}

impl TokenDispenser {
    /// Dispenser reachable at `url`.
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request a fresh credential.
    ///
    /// # Errors
    ///
    /// [`TokenError::DispenserAuth`] and [`TokenError::DispenserServer`] for
    /// the sentinel bodies, [`TokenError::MalformedResponse`] for anything that
    /// is not exactly two fields, [`TokenError::Http`] for transport failures.
    pub async fn fetch_fresh(&self) -> Result<SessionCredential, TokenError> {
        let body = self
            .client
            .get(&self.url)
            .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
            .send()
            .await?
            .text()
            .await?;
        parse_response(&body)
    }
}

fn parse_response(body: &str) -> Result<SessionCredential, TokenError> {
    let body = body.trim();
    match body {
        AUTH_ERROR_BODY => return Err(TokenError::DispenserAuth),
        SERVER_ERROR_BODY => return Err(TokenError::DispenserServer),
        _ => {}
    }

    let fields: Vec<&str> = body.split_whitespace().collect();
    let [token, session_id] = fields.as_slice() else {
        return Err(TokenError::MalformedResponse(body.to_string()));
    };
    SessionCredential::parse(token, session_id)
        .map_err(|_| TokenError::MalformedResponse(body.to_string()))
}
