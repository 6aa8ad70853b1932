//! Error taxonomy for the gateway core.
//!
//! Every failure a component can surface to the message router is a variant
//! here, so the router can map outcomes onto the wire envelope without
//! downcasting. Auth-related variants are distinct because the UI reacts to
//! them differently: [`GatewayError::AuthExpired`] re-prompts sign-in,
//! everything else is shown as a one-line status message.

use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// A call that needs a bearer token was made while no token is held.
    #[error("not authenticated")]
    AuthRequired,

    /// The API rejected the token with a 401; the session has been reset.
    #[error("authentication expired, please sign in again")]
    AuthExpired,

    /// A referenced resource does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Any other non-2xx API outcome. No retry is attempted.
    #[error("API request failed with status {status}")]
    Api { status: u16 },

    /// The remote revocation step failed; local sign-out still completed.
    #[error("token revocation was not acknowledged remotely: {0}")]
    RevocationWarning(String),

    /// The identity provider could not produce a token.
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A response or stored value did not match the expected shape.
    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_carries_status() {
        let error = GatewayError::Api { status: 503 };
        assert!(error.to_string().contains("503"));
    }

    #[test]
    fn not_found_names_the_resource() {
        let error = GatewayError::NotFound("playlist item");
        assert_eq!(error.to_string(), "playlist item not found");
    }
}
