use log::{info, warn};
use rand::rngs::ThreadRng;
use rand::RngCore;

use crate::error::AuthError;
use crate::idp::{
    AuthReply, Challenge, CognitoIdp, PasswordVerifierChallenge, SmsMfaChallenge, TokenBundle,
};
use crate::login_info::LoginInfo;
use crate::srp::{SrpClient, User};

/// The state of a login attempt.
///
/// No transition skips a step; an unsupported challenge lands in
/// [`AuthState::Failed`], which is terminal for the attempt (a new call to
/// [`Authenticator::start_authentication`] begins a fresh one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// No attempt has been started.
    Init,

    /// The initial auth request has been sent and no challenge has been
    /// received yet.
    AwaitingChallenge,

    /// A `PASSWORD_VERIFIER` challenge has been received and the password
    /// claim has not been submitted yet.
    ComputingProof,

    /// The password claim has been submitted and the provider has not
    /// answered yet.
    AwaitingVerification,

    /// The provider requires an out-of-band SMS code.
    AwaitingMfa,

    /// The attempt produced a token bundle.
    Authenticated,

    /// The attempt failed terminally.
    Failed(AuthError),
}

/// The outcome of answering the password challenge: either the terminal
/// token bundle, or an escalation to SMS MFA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeOutcome {
    Authenticated(TokenBundle),
    MfaRequired(MfaChallenge),
}

/// A pending SMS MFA challenge, to be answered with
/// [`Authenticator::complete_mfa`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfaChallenge {
    /// Where the provider delivered the code, when disclosed.
    pub destination: Option<String>,
    session: Option<String>,
}

/// Drives the SRP authentication handshake against the identity provider.
///
/// The protocol is strictly sequential per attempt: every step depends on
/// the previous round trip. Independent attempts (other users or sessions)
/// share no mutable state and may run concurrently.
///
/// Ephemeral key material is generated fresh inside
/// [`start_authentication`](Self::start_authentication) and discarded with
/// the attempt; it is never reused.
#[derive(Debug)]
pub struct Authenticator<R: RngCore + Default = ThreadRng> {
    idp: CognitoIdp,
    credentials: User,
    client_secret: Option<String>,
    state: AuthState,
    srp: Option<SrpClient<R>>,
    pending_verifier: Option<PasswordVerifierChallenge>,
    pending_mfa: Option<SmsMfaChallenge>,
    user_id: Option<String>,
}

impl<R: RngCore + Default> Authenticator<R> {
    /// Create an authenticator from resolved pool metadata.
    ///
    /// ## Errors
    ///
    /// Returns [`AuthError::ApiUnavailable`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(
        login_info: &LoginInfo,
        username: &str,
        password: &str,
        client_secret: Option<&str>,
    ) -> Result<Self, AuthError> {
        let idp = CognitoIdp::new(login_info.region(), login_info.client_id())?;

        Ok(Self::with_idp(
            idp,
            login_info.pool_id(),
            username,
            password,
            client_secret,
        ))
    }

    /// Create an authenticator with an explicit provider client. Used by
    /// tests to point at a mock provider.
    #[must_use]
    pub fn with_idp(
        idp: CognitoIdp,
        pool_id: &str,
        username: &str,
        password: &str,
        client_secret: Option<&str>,
    ) -> Self {
        Self {
            idp,
            credentials: User::new(pool_id, username, password),
            client_secret: client_secret.map(|s| s.into()),
            state: AuthState::Init,
            srp: None,
            pending_verifier: None,
            pending_mfa: None,
            user_id: None,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Begin a fresh login attempt: generate new ephemeral key material and
    /// send the initial auth request.
    ///
    /// Any state from a previous attempt is discarded. The returned state
    /// tells the caller what to do next: [`AuthState::ComputingProof`] means
    /// [`complete_challenge`](Self::complete_challenge),
    /// [`AuthState::AwaitingMfa`] means [`complete_mfa`](Self::complete_mfa).
    pub async fn start_authentication(&mut self) -> Result<AuthState, AuthError> {
        self.reset();

        let srp = SrpClient::<R>::new(
            self.credentials.clone(),
            self.idp.client_id(),
            self.client_secret.as_deref(),
        )?;
        let parameters = srp.get_auth_parameters();
        self.srp = Some(srp);
        self.state = AuthState::AwaitingChallenge;

        info!(username = self.credentials.username(); "Starting authentication attempt");

        match self.idp.initiate_srp_auth(parameters).await {
            Ok(AuthReply::Challenge(Challenge::PasswordVerifier(challenge))) => {
                self.user_id = Some(challenge.user_id.clone());
                self.pending_verifier = Some(challenge);
                self.state = AuthState::ComputingProof;
            }
            Ok(AuthReply::Challenge(Challenge::SmsMfa(challenge))) => {
                self.pending_mfa = Some(challenge);
                self.state = AuthState::AwaitingMfa;
            }
            Ok(AuthReply::Challenge(Challenge::Unsupported(name))) => {
                return Err(self.fail(AuthError::UnsupportedChallenge(name)));
            }
            Ok(AuthReply::Tokens(_)) => {
                // Tokens before the password proof would mean the provider
                // skipped a protocol step.
                return Err(self.fail(AuthError::UnexpectedResponse(
                    "Authentication result issued before password verification".into(),
                )));
            }
            Err(err @ AuthError::InvalidCredentials) => return Err(self.fail(err)),
            Err(err) => return Err(err),
        }

        Ok(self.state.clone())
    }

    /// Compute the password claim for the pending `PASSWORD_VERIFIER`
    /// challenge and submit it.
    pub async fn complete_challenge(&mut self) -> Result<ChallengeOutcome, AuthError> {
        if self.state != AuthState::ComputingProof {
            return Err(AuthError::IllegalState(
                "no password verifier challenge is pending",
            ));
        }

        let challenge = self.pending_verifier.take().ok_or(AuthError::IllegalState(
            "no password verifier challenge is pending",
        ))?;
        let srp = self.srp.as_ref().ok_or(AuthError::IllegalState(
            "no password verifier challenge is pending",
        ))?;

        let parameters = match srp.verify(
            &challenge.secret_block,
            &challenge.user_id,
            &challenge.salt,
            &challenge.srp_b,
        ) {
            Ok(parameters) => parameters,
            Err(err) => return Err(self.fail(err)),
        };

        self.state = AuthState::AwaitingVerification;

        match self
            .idp
            .respond_to_password_verifier(&challenge.user_id, parameters)
            .await
        {
            Ok(AuthReply::Tokens(tokens)) => {
                self.state = AuthState::Authenticated;
                // The ephemeral key material is consumed with the attempt.
                self.srp = None;
                info!(user_id = challenge.user_id.as_str(); "Password claim accepted");

                Ok(ChallengeOutcome::Authenticated(tokens))
            }
            Ok(AuthReply::Challenge(Challenge::SmsMfa(mfa))) => {
                self.state = AuthState::AwaitingMfa;
                self.pending_mfa = Some(mfa.clone());

                Ok(ChallengeOutcome::MfaRequired(MfaChallenge {
                    destination: mfa.destination,
                    session: mfa.session,
                }))
            }
            Ok(AuthReply::Challenge(Challenge::Unsupported(name))) => {
                Err(self.fail(AuthError::UnsupportedChallenge(name)))
            }
            Ok(AuthReply::Challenge(Challenge::PasswordVerifier(_))) => {
                Err(self.fail(AuthError::UnexpectedResponse(
                    "Provider issued a second password verifier challenge".into(),
                )))
            }
            Err(err @ AuthError::InvalidCredentials) => Err(self.fail(err)),
            Err(err) => Err(err),
        }
    }

    /// Answer a pending SMS MFA challenge.
    ///
    /// A rejected code fails with [`AuthError::InvalidMfaCode`] and keeps the
    /// session, so the caller may re-prompt and retry with a new code.
    pub async fn complete_mfa(&mut self, code: &str) -> Result<TokenBundle, AuthError> {
        if self.state != AuthState::AwaitingMfa {
            return Err(AuthError::IllegalState("no SMS MFA challenge is pending"));
        }

        let session = self
            .pending_mfa
            .as_ref()
            .and_then(|mfa| mfa.session.clone());
        let username = self
            .user_id
            .clone()
            .unwrap_or_else(|| self.credentials.username().to_string());

        match self
            .idp
            .respond_to_sms_mfa(&username, code, session.as_deref())
            .await
        {
            Ok(AuthReply::Tokens(tokens)) => {
                self.state = AuthState::Authenticated;
                self.pending_mfa = None;
                self.srp = None;
                info!(username = username.as_str(); "SMS MFA code accepted");

                Ok(tokens)
            }
            Ok(AuthReply::Challenge(_)) => Err(self.fail(AuthError::UnexpectedResponse(
                "Provider issued another challenge after SMS MFA".into(),
            ))),
            Err(err @ AuthError::InvalidMfaCode) => {
                warn!(username = username.as_str(); "SMS MFA code rejected");

                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Exchange a previously issued refresh token for a new token bundle.
    ///
    /// Rejection fails with [`AuthError::RefreshRejected`], after which a
    /// full re-authentication is required; connectivity failures fail with
    /// [`AuthError::ApiUnavailable`] and may be retried.
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenBundle, AuthError> {
        match self.idp.refresh_tokens(refresh_token).await? {
            AuthReply::Tokens(tokens) => Ok(tokens),
            AuthReply::Challenge(_) => Err(AuthError::UnexpectedResponse(
                "Provider issued a challenge on token refresh".into(),
            )),
        }
    }

    /// Run the common path end to end: start an attempt and answer the
    /// password challenge, surfacing an MFA escalation to the caller.
    pub async fn login(&mut self) -> Result<ChallengeOutcome, AuthError> {
        match self.start_authentication().await? {
            AuthState::AwaitingMfa => {
                let mfa = self
                    .pending_mfa
                    .clone()
                    .ok_or(AuthError::IllegalState("no SMS MFA challenge is pending"))?;

                Ok(ChallengeOutcome::MfaRequired(MfaChallenge {
                    destination: mfa.destination,
                    session: mfa.session,
                }))
            }
            _ => self.complete_challenge().await,
        }
    }

    /// Discard all per-attempt state, including partially computed ephemeral
    /// secrets.
    fn reset(&mut self) {
        self.state = AuthState::Init;
        self.srp = None;
        self.pending_verifier = None;
        self.pending_mfa = None;
        self.user_id = None;
    }

    fn fail(&mut self, err: AuthError) -> AuthError {
        self.state = AuthState::Failed(err.clone());

        err
    }
}
