use thiserror::Error;

/// An error occurred during the SRP authentication flow.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// A protocol safety check failed (a degenerate `A` or `U` value).
    ///
    /// This is fatal for the attempt. The ephemeral key material must be
    /// discarded and never retried; a fresh attempt generates new material.
    #[error("Protocol invariant violated: {0}")]
    ProtocolInvariantViolation(&'static str),

    /// The identity provider requested a challenge this client does not
    /// implement (for example `NEW_PASSWORD_REQUIRED`).
    #[error("The {0} challenge is not supported")]
    UnsupportedChallenge(String),

    /// The username or password was rejected by the identity provider.
    #[error("The username or password was rejected")]
    InvalidCredentials,

    /// The SMS MFA code was rejected. The caller may re-prompt and retry
    /// with a new code using the same session.
    #[error("The SMS MFA code was rejected")]
    InvalidMfaCode,

    /// The refresh token is no longer accepted by the identity provider.
    /// A full re-authentication is required.
    #[error("The refresh token was rejected")]
    RefreshRejected,

    /// The identity provider could not be reached, or did not answer in
    /// time. The whole attempt may be retried from the start.
    #[error("The identity provider could not be reached: {0}")]
    ApiUnavailable(String),

    /// The identity provider answered with something the protocol does not
    /// allow at this point (missing fields, tokens before verification, an
    /// unrecognised fault).
    #[error("Unexpected response from the identity provider: {0}")]
    UnexpectedResponse(String),

    /// An argument which was provided to the client was invalid.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested operation is not valid in the current authentication
    /// state (for example responding to a challenge which was never issued).
    #[error("Operation not valid in the current authentication state: {0}")]
    IllegalState(&'static str),

    /// The HMAC algorithm failed to generate a hash as the digest length was
    /// invalid.
    #[error("Cryptography error: {0}")]
    Cryptography(#[from] digest::InvalidLength),
}
