#![crate_name = "hive_auth"]

//! # Hive Auth
//!
//! Client-side authentication against the AWS Cognito user pool used by the
//! Hive smart-home cloud, built on the Secure Remote Password (SRP) protocol
//! variant of the `USER_SRP_AUTH` flow.
//!
//! The crate owns the whole password-proof handshake: it generates ephemeral
//! key material, computes the client public value, derives the shared session
//! key from the server's challenge, signs the password claim, and exchanges
//! it for a [`TokenBundle`]. It also answers the secondary `SMS_MFA`
//! challenge and renews tokens via the `REFRESH_TOKEN_AUTH` flow.
//!
//! The password never leaves the process - only a signature derived from it
//! is transmitted.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! hive-auth = "0.1"
//! ```
//!
//! Pool metadata (pool ID, app client ID, region) is resolved once from the
//! deployment's login-info endpoint, then the authenticator drives the
//! handshake:
//!
//! ```no_run
//! use hive_auth::{AuthError, Authenticator, ChallengeOutcome, LoginInfoClient};
//!
//! # async fn run() -> Result<(), AuthError> {
//! let login_info = LoginInfoClient::new("https://sso.example.com/login-info")?
//!     .get_login_info()
//!     .await?;
//!
//! let mut authenticator: Authenticator =
//!     Authenticator::new(&login_info, "user@example.com", "correct horse", None)?;
//!
//! match authenticator.login().await? {
//!     ChallengeOutcome::Authenticated(tokens) => {
//!         // Hand the bundle to the session layer.
//!         let _ = tokens.access_token;
//!     }
//!     ChallengeOutcome::MfaRequired(challenge) => {
//!         // Prompt the user for the SMS code sent to challenge.destination.
//!         let _ = challenge.destination;
//!         let tokens = authenticator.complete_mfa("123456").await?;
//!         let _ = tokens.access_token;
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Renewal later, without re-running the handshake:
//!
//! ```no_run
//! # use hive_auth::{AuthError, Authenticator, LoginInfo};
//! # async fn run(refresh_token: &str) -> Result<(), AuthError> {
//! # let login_info = LoginInfo::new("eu-west-1_SamNfoWtf", "client-id", "eu-west-1");
//! # let authenticator: Authenticator =
//! #     Authenticator::new(&login_info, "user@example.com", "correct horse", None)?;
//! let tokens = authenticator.refresh_tokens(refresh_token).await?;
//! # Ok(())
//! # }
//! ```
//!
//! A rejected refresh fails with [`AuthError::RefreshRejected`], after which
//! a full re-authentication is required.
//!
//! ## Lower-level access
//!
//! The SRP parameter generation is available on its own through
//! [`SrpClient`], for callers which drive the provider requests themselves.

#[macro_use]
extern crate lazy_static;

pub use crate::authenticator::{AuthState, Authenticator, ChallengeOutcome, MfaChallenge};
pub use crate::error::AuthError;
pub use crate::idp::{
    AuthReply, Challenge, CognitoIdp, PasswordVerifierChallenge, SmsMfaChallenge, TokenBundle,
};
pub use crate::login_info::{LoginInfo, LoginInfoClient};
pub use crate::srp::{AuthParameters, SrpClient, User, VerificationParameters};

mod authenticator;
mod constant;
mod error;
mod idp;
mod login_info;
mod srp;
