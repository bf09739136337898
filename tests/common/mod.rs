use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;

use hive_auth::{Authenticator, CognitoIdp, TokenBundle};

pub const POOL_ID: &str = "eu-west-1_SamNfoWtf";
pub const CLIENT_ID: &str = "client-id";
pub const USERNAME: &str = "user@example.com";
pub const USER_ID: &str = "user_id";

pub const SALT: &str = "36ef01c6dde9fe503da333b1acc758ba";
pub const SRP_B: &str = "36ef01c6dde9fe503da333b1acc758ba";
pub const SECRET_BLOCK: &str = "9ae77ec7154c14dcc487b47707fee4b4920cb96d8a8c045e4c8df879a7b375524aa736acdec6c9ad4ea606774d00621b";

const INITIATE_AUTH_TARGET: &str = "AWSCognitoIdentityProviderService.InitiateAuth";
const RESPOND_TARGET: &str = "AWSCognitoIdentityProviderService.RespondToAuthChallenge";

pub fn get_authenticator(server: &ServerGuard) -> Authenticator {
    Authenticator::with_idp(
        CognitoIdp::with_endpoint(&server.url(), CLIENT_ID)
            .expect("the provider client should construct"),
        POOL_ID,
        USERNAME,
        "password",
        None,
    )
}

pub fn expected_tokens() -> TokenBundle {
    TokenBundle {
        id_token: "id-token".to_string(),
        access_token: "access-token".to_string(),
        refresh_token: Some("refresh-token".to_string()),
        expires_in: std::time::Duration::from_secs(3600),
    }
}

fn tokens_body() -> serde_json::Value {
    json!({
        "AuthenticationResult": {
            "AccessToken": "access-token",
            "IdToken": "id-token",
            "RefreshToken": "refresh-token",
            "ExpiresIn": 3600,
            "TokenType": "Bearer"
        }
    })
}

fn provider_reply(server: &mut ServerGuard, target: &str, body: &serde_json::Value) -> Mock {
    server
        .mock("POST", "/")
        .match_header("x-amz-target", target)
        .with_status(200)
        .with_header("content-type", "application/x-amz-json-1.1")
        .with_body(body.to_string())
}

fn provider_fault(server: &mut ServerGuard, target: &str, fault: &str, message: &str) -> Mock {
    server
        .mock("POST", "/")
        .match_header("x-amz-target", target)
        .with_status(400)
        .with_header("content-type", "application/x-amz-json-1.1")
        .with_body(json!({ "__type": fault, "message": message }).to_string())
}

/// `InitiateAuth` answering the `USER_SRP_AUTH` flow with a
/// `PASSWORD_VERIFIER` challenge.
pub async fn mock_password_verifier_challenge(server: &mut ServerGuard) -> Mock {
    provider_reply(
        server,
        INITIATE_AUTH_TARGET,
        &json!({
            "ChallengeName": "PASSWORD_VERIFIER",
            "ChallengeParameters": {
                "USER_ID_FOR_SRP": USER_ID,
                "SALT": SALT,
                "SRP_B": SRP_B,
                "SECRET_BLOCK": SECRET_BLOCK
            }
        }),
    )
    .match_body(Matcher::AllOf(vec![
        Matcher::PartialJson(json!({
            "AuthFlow": "USER_SRP_AUTH",
            "ClientId": CLIENT_ID,
            "AuthParameters": { "USERNAME": USERNAME }
        })),
        Matcher::Regex(r#""SRP_A":"[0-9a-f]+""#.to_string()),
    ]))
    .create_async()
    .await
}

/// `InitiateAuth` answering with an unsupported challenge name.
pub async fn mock_unsupported_challenge(server: &mut ServerGuard, name: &str) -> Mock {
    provider_reply(server, INITIATE_AUTH_TARGET, &json!({ "ChallengeName": name }))
        .create_async()
        .await
}

/// `InitiateAuth` answering the `USER_SRP_AUTH` flow with an `SMS_MFA`
/// challenge straight away, before any password proof.
pub async fn mock_sms_mfa_on_initiate(server: &mut ServerGuard, session: &str) -> Mock {
    provider_reply(
        server,
        INITIATE_AUTH_TARGET,
        &json!({
            "ChallengeName": "SMS_MFA",
            "Session": session,
            "ChallengeParameters": { "CODE_DELIVERY_DESTINATION": "+44*******123" }
        }),
    )
    .match_body(Matcher::PartialJson(json!({ "AuthFlow": "USER_SRP_AUTH" })))
    .create_async()
    .await
}

/// `RespondToAuthChallenge` accepting the password claim and issuing tokens.
pub async fn mock_password_claim_accepted(server: &mut ServerGuard) -> Mock {
    provider_reply(server, RESPOND_TARGET, &tokens_body())
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({
                "ChallengeName": "PASSWORD_VERIFIER",
                "ClientId": CLIENT_ID,
                "ChallengeResponses": {
                    "USERNAME": USER_ID,
                    "PASSWORD_CLAIM_SECRET_BLOCK": SECRET_BLOCK
                }
            })),
            Matcher::Regex(r#""PASSWORD_CLAIM_SIGNATURE":"[^"]+""#.to_string()),
            Matcher::Regex(r#""TIMESTAMP":"[^"]+ UTC \d{4}""#.to_string()),
        ]))
        .create_async()
        .await
}

/// `RespondToAuthChallenge` rejecting the password claim.
pub async fn mock_password_claim_rejected(server: &mut ServerGuard) -> Mock {
    provider_fault(
        server,
        RESPOND_TARGET,
        "NotAuthorizedException",
        "Incorrect username or password.",
    )
    .match_body(Matcher::PartialJson(
        json!({ "ChallengeName": "PASSWORD_VERIFIER" }),
    ))
    .create_async()
    .await
}

/// `RespondToAuthChallenge` escalating the password claim to SMS MFA.
pub async fn mock_sms_mfa_escalation(server: &mut ServerGuard, session: &str) -> Mock {
    provider_reply(
        server,
        RESPOND_TARGET,
        &json!({
            "ChallengeName": "SMS_MFA",
            "Session": session,
            "ChallengeParameters": { "CODE_DELIVERY_DESTINATION": "+44*******123" }
        }),
    )
    .match_body(Matcher::PartialJson(
        json!({ "ChallengeName": "PASSWORD_VERIFIER" }),
    ))
    .create_async()
    .await
}

/// `RespondToAuthChallenge` accepting a specific SMS MFA code for a specific
/// username.
pub async fn mock_sms_mfa_accepted(
    server: &mut ServerGuard,
    session: &str,
    code: &str,
    username: &str,
) -> Mock {
    provider_reply(server, RESPOND_TARGET, &tokens_body())
        .match_body(Matcher::PartialJson(json!({
            "ChallengeName": "SMS_MFA",
            "Session": session,
            "ChallengeResponses": { "SMS_MFA_CODE": code, "USERNAME": username }
        })))
        .create_async()
        .await
}

/// `RespondToAuthChallenge` rejecting a specific SMS MFA code.
pub async fn mock_sms_mfa_rejected(server: &mut ServerGuard, code: &str) -> Mock {
    provider_fault(
        server,
        RESPOND_TARGET,
        "CodeMismatchException",
        "Invalid code received",
    )
    .match_body(Matcher::PartialJson(json!({
        "ChallengeName": "SMS_MFA",
        "ChallengeResponses": { "SMS_MFA_CODE": code }
    })))
    .create_async()
    .await
}

/// `InitiateAuth` answering the `REFRESH_TOKEN_AUTH` flow with fresh tokens
/// (no new refresh token, as the provider typically omits it).
pub async fn mock_refresh_accepted(server: &mut ServerGuard, refresh_token: &str) -> Mock {
    provider_reply(
        server,
        INITIATE_AUTH_TARGET,
        &json!({
            "AuthenticationResult": {
                "AccessToken": "renewed-access-token",
                "IdToken": "renewed-id-token",
                "ExpiresIn": 3600,
                "TokenType": "Bearer"
            }
        }),
    )
    .match_body(Matcher::PartialJson(json!({
        "AuthFlow": "REFRESH_TOKEN_AUTH",
        "AuthParameters": { "REFRESH_TOKEN": refresh_token }
    })))
    .create_async()
    .await
}

/// `InitiateAuth` rejecting the `REFRESH_TOKEN_AUTH` flow.
pub async fn mock_refresh_rejected(server: &mut ServerGuard) -> Mock {
    provider_fault(
        server,
        INITIATE_AUTH_TARGET,
        "NotAuthorizedException",
        "Refresh Token has been revoked",
    )
    .match_body(Matcher::PartialJson(json!({ "AuthFlow": "REFRESH_TOKEN_AUTH" })))
    .create_async()
    .await
}
