use std::collections::HashMap;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::srp::{AuthParameters, VerificationParameters};

const SERVICE_TARGET: &str = "AWSCognitoIdentityProviderService";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

const USER_SRP_AUTH_FLOW: &str = "USER_SRP_AUTH";
const REFRESH_TOKEN_AUTH_FLOW: &str = "REFRESH_TOKEN_AUTH";

const PASSWORD_VERIFIER_CHALLENGE: &str = "PASSWORD_VERIFIER";
const SMS_MFA_CHALLENGE: &str = "SMS_MFA";

/// Requests which receive no reply within this window fail with
/// [`AuthError::ApiUnavailable`]; the attempt is retryable by the caller.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The end artifact of a successful authentication: the token bundle handed
/// to the caller for storage and reuse. Decoupled from all SRP state once
/// produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBundle {
    /// The identity (JWT) token.
    pub id_token: String,

    /// The access token used on subsequent API calls.
    pub access_token: String,

    /// The refresh token, when the provider issued one. Refresh responses
    /// typically omit it; the caller keeps using the one it already holds.
    pub refresh_token: Option<String>,

    /// How long the issued tokens remain valid.
    pub expires_in: Duration,
}

/// A challenge issued by the identity provider in place of tokens.
///
/// Unknown challenge names fold into [`Challenge::Unsupported`] rather than
/// leaving an unhandled code path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    PasswordVerifier(PasswordVerifierChallenge),
    SmsMfa(SmsMfaChallenge),
    Unsupported(String),
}

/// The values carried by a `PASSWORD_VERIFIER` challenge. Immutable once
/// received, and consumed exactly once to produce a challenge response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordVerifierChallenge {
    /// The user identifier the claim must be bound to (`USER_ID_FOR_SRP`).
    pub user_id: String,

    /// The password salt, hex encoded.
    pub salt: String,

    /// The server's public value `B`, hex encoded.
    pub srp_b: String,

    /// The encrypted secret block, base64 encoded, passed back untouched.
    pub secret_block: String,
}

/// The values carried by an `SMS_MFA` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsMfaChallenge {
    /// The session token which must accompany the MFA code.
    pub session: Option<String>,

    /// Where the provider delivered the code, when disclosed.
    pub destination: Option<String>,
}

/// A reply from the identity provider: either the terminal token bundle, or
/// another challenge to answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthReply {
    Tokens(TokenBundle),
    Challenge(Challenge),
}

/// The identity provider's request/response RPC client.
///
/// Speaks the provider's `x-amz-json-1.1` protocol directly: one POST per
/// operation, the operation named in the `X-Amz-Target` header. Field names
/// must match the provider's exactly for interoperability.
#[derive(Debug, Clone)]
pub struct CognitoIdp {
    http: reqwest::Client,
    endpoint: String,
    client_id: String,
}

impl CognitoIdp {
    /// Create a client for the provider's regional endpoint.
    ///
    /// ## Errors
    ///
    /// Returns [`AuthError::ApiUnavailable`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(region: &str, client_id: &str) -> Result<Self, AuthError> {
        Self::with_endpoint(&format!("https://cognito-idp.{region}.amazonaws.com/"), client_id)
    }

    /// Create a client against an explicit endpoint. Used by tests to point
    /// the client at a mock provider.
    pub fn with_endpoint(endpoint: &str, client_id: &str) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| AuthError::ApiUnavailable(err.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            client_id: client_id.into(),
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Send the `InitiateAuth` request opening a `USER_SRP_AUTH` flow.
    pub async fn initiate_srp_auth(
        &self,
        parameters: AuthParameters,
    ) -> Result<AuthReply, AuthError> {
        let mut auth_parameters = HashMap::new();
        auth_parameters.insert("USERNAME", parameters.username);
        auth_parameters.insert("SRP_A", parameters.a);
        if let Some(secret_hash) = parameters.secret_hash {
            auth_parameters.insert("SECRET_HASH", secret_hash);
        }

        let reply = self
            .call(
                "InitiateAuth",
                &InitiateAuthRequest {
                    auth_flow: USER_SRP_AUTH_FLOW,
                    auth_parameters,
                    client_id: &self.client_id,
                },
            )
            .await
            .map_err(|failure| {
                failure.map_fault(|kind| match kind {
                    "NotAuthorizedException" | "UserNotFoundException" => {
                        Some(AuthError::InvalidCredentials)
                    }
                    _ => None,
                })
            })?;

        parse_reply(reply)
    }

    /// Answer the `PASSWORD_VERIFIER` challenge with the computed claim.
    pub async fn respond_to_password_verifier(
        &self,
        user_id: &str,
        parameters: VerificationParameters,
    ) -> Result<AuthReply, AuthError> {
        let mut challenge_responses = HashMap::new();
        challenge_responses.insert("USERNAME", user_id.to_string());
        challenge_responses.insert("TIMESTAMP", parameters.timestamp);
        challenge_responses.insert(
            "PASSWORD_CLAIM_SECRET_BLOCK",
            parameters.password_claim_secret_block,
        );
        challenge_responses.insert(
            "PASSWORD_CLAIM_SIGNATURE",
            parameters.password_claim_signature,
        );
        if let Some(secret_hash) = parameters.secret_hash {
            challenge_responses.insert("SECRET_HASH", secret_hash);
        }

        let reply = self
            .call(
                "RespondToAuthChallenge",
                &RespondToAuthChallengeRequest {
                    challenge_name: PASSWORD_VERIFIER_CHALLENGE,
                    challenge_responses,
                    client_id: &self.client_id,
                    session: None,
                },
            )
            .await
            .map_err(|failure| {
                failure.map_fault(|kind| match kind {
                    "NotAuthorizedException" | "UserNotFoundException" => {
                        Some(AuthError::InvalidCredentials)
                    }
                    _ => None,
                })
            })?;

        parse_reply(reply)
    }

    /// Answer the `SMS_MFA` challenge with an out-of-band code.
    pub async fn respond_to_sms_mfa(
        &self,
        user_id: &str,
        code: &str,
        session: Option<&str>,
    ) -> Result<AuthReply, AuthError> {
        let mut challenge_responses = HashMap::new();
        challenge_responses.insert("USERNAME", user_id.to_string());
        challenge_responses.insert("SMS_MFA_CODE", code.to_string());

        let reply = self
            .call(
                "RespondToAuthChallenge",
                &RespondToAuthChallengeRequest {
                    challenge_name: SMS_MFA_CHALLENGE,
                    challenge_responses,
                    client_id: &self.client_id,
                    session,
                },
            )
            .await
            .map_err(|failure| {
                failure.map_fault(|kind| match kind {
                    "CodeMismatchException" | "ExpiredCodeException" | "NotAuthorizedException" => {
                        Some(AuthError::InvalidMfaCode)
                    }
                    _ => None,
                })
            })?;

        parse_reply(reply)
    }

    /// Exchange a previously issued refresh token for a new token bundle via
    /// the `REFRESH_TOKEN_AUTH` flow.
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<AuthReply, AuthError> {
        let mut auth_parameters = HashMap::new();
        auth_parameters.insert("REFRESH_TOKEN", refresh_token.to_string());

        let reply = self
            .call(
                "InitiateAuth",
                &InitiateAuthRequest {
                    auth_flow: REFRESH_TOKEN_AUTH_FLOW,
                    auth_parameters,
                    client_id: &self.client_id,
                },
            )
            .await
            .map_err(|failure| {
                failure.map_fault(|kind| match kind {
                    "NotAuthorizedException" => Some(AuthError::RefreshRejected),
                    _ => None,
                })
            })?;

        parse_reply(reply)
    }

    async fn call<B: Serialize>(
        &self,
        operation: &str,
        body: &B,
    ) -> Result<AuthResponseBody, CallFailure> {
        let request_body = serde_json::to_vec(body).map_err(|err| {
            CallFailure::Error(AuthError::InvalidArgument(format!(
                "Failed to serialize {operation} request: {err}"
            )))
        })?;

        debug!(operation; "Calling identity provider");

        let response = self
            .http
            .post(&self.endpoint)
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", format!("{SERVICE_TARGET}.{operation}"))
            .body(request_body)
            .send()
            .await
            .map_err(|err| CallFailure::Error(AuthError::ApiUnavailable(err.to_string())))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| CallFailure::Error(AuthError::ApiUnavailable(err.to_string())))?;

        if status.is_success() {
            return serde_json::from_str(&text).map_err(|err| {
                CallFailure::Error(AuthError::UnexpectedResponse(format!(
                    "Malformed {operation} response: {err}"
                )))
            });
        }

        let fault: ProviderFault = serde_json::from_str(&text).unwrap_or_default();
        let kind = fault.normalized_kind();
        let message = fault.message.unwrap_or_default();

        warn!(operation, fault = kind.as_str(); "Identity provider rejected the request");

        Err(CallFailure::Fault { kind, message })
    }
}

/// A failed provider call, before the per-operation fault mapping has been
/// applied.
enum CallFailure {
    /// The provider answered with a modelled fault (`__type`).
    Fault { kind: String, message: String },

    /// The call never produced a usable reply.
    Error(AuthError),
}

impl CallFailure {
    /// Apply the operation's fault table. Faults the table does not name
    /// still surface as a concrete error value - never as an empty result.
    fn map_fault(self, map: impl Fn(&str) -> Option<AuthError>) -> AuthError {
        match self {
            Self::Fault { kind, message } => map(&kind)
                .unwrap_or_else(|| AuthError::UnexpectedResponse(format!("{kind}: {message}"))),
            Self::Error(err) => err,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthRequest<'a> {
    auth_flow: &'static str,
    auth_parameters: HashMap<&'static str, String>,
    client_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RespondToAuthChallengeRequest<'a> {
    challenge_name: &'static str,
    challenge_responses: HashMap<&'static str, String>,
    client_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthResponseBody {
    challenge_name: Option<String>,
    challenge_parameters: Option<HashMap<String, String>>,
    session: Option<String>,
    authentication_result: Option<AuthenticationResultBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResultBody {
    access_token: Option<String>,
    id_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderFault {
    #[serde(rename = "__type")]
    kind: Option<String>,
    #[serde(rename = "message", alias = "Message")]
    message: Option<String>,
}

impl ProviderFault {
    /// Fault types occasionally arrive namespaced
    /// (`com.amazonaws...#NotAuthorizedException`); keep the bare name.
    fn normalized_kind(&self) -> String {
        self.kind
            .as_deref()
            .and_then(|kind| kind.rsplit('#').next())
            .unwrap_or("UnknownFault")
            .to_string()
    }
}

fn parse_reply(body: AuthResponseBody) -> Result<AuthReply, AuthError> {
    if let Some(result) = body.authentication_result {
        return Ok(AuthReply::Tokens(TokenBundle {
            id_token: result.id_token.ok_or_else(|| {
                AuthError::UnexpectedResponse("Authentication result is missing IdToken".into())
            })?,
            access_token: result.access_token.ok_or_else(|| {
                AuthError::UnexpectedResponse("Authentication result is missing AccessToken".into())
            })?,
            refresh_token: result.refresh_token,
            expires_in: Duration::from_secs(result.expires_in.ok_or_else(|| {
                AuthError::UnexpectedResponse("Authentication result is missing ExpiresIn".into())
            })?),
        }));
    }

    let challenge_name = body.challenge_name.ok_or_else(|| {
        AuthError::UnexpectedResponse("Reply carried neither tokens nor a challenge".into())
    })?;

    let challenge = match challenge_name.as_str() {
        PASSWORD_VERIFIER_CHALLENGE => {
            let mut parameters = body.challenge_parameters.unwrap_or_default();
            let mut require = |field: &str| {
                parameters.remove(field).ok_or_else(|| {
                    AuthError::UnexpectedResponse(format!(
                        "{PASSWORD_VERIFIER_CHALLENGE} challenge is missing {field}"
                    ))
                })
            };

            Challenge::PasswordVerifier(PasswordVerifierChallenge {
                user_id: require("USER_ID_FOR_SRP")?,
                salt: require("SALT")?,
                srp_b: require("SRP_B")?,
                secret_block: require("SECRET_BLOCK")?,
            })
        }
        SMS_MFA_CHALLENGE => Challenge::SmsMfa(SmsMfaChallenge {
            session: body.session,
            destination: body
                .challenge_parameters
                .unwrap_or_default()
                .remove("CODE_DELIVERY_DESTINATION"),
        }),
        _ => Challenge::Unsupported(challenge_name),
    };

    Ok(AuthReply::Challenge(challenge))
}
