use std::marker::PhantomData;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use log::info;
use num_bigint::BigUint;
use rand::rngs::ThreadRng;
use rand::RngCore;
use sha2::Sha256;

pub(crate) mod helper;

use crate::error::AuthError;

pub(crate) type HmacSha256 = Hmac<Sha256>;

/// A **user** registered with the identity provider's user pool.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct User {
    /// The ID of the user pool the user is registered with.
    ///
    /// The format enforced by the provider is: `<region>_<pool name>`.
    ///
    /// For example: `eu-west-1_SamNfoWtf`.
    pool_id: String,
    username: String,
    password: String,
}

impl User {
    #[must_use]
    pub fn new<'a>(pool_id: &'a str, username: &'a str, password: &'a str) -> Self {
        Self {
            pool_id: pool_id.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The pool name is the part of the pool ID after the region prefix. It
    /// is hashed into the password claim, so a malformed pool ID cannot
    /// produce a valid signature.
    fn pool_name(&self) -> Result<&str, AuthError> {
        self.pool_id.split('_').nth(1).ok_or_else(|| {
            AuthError::InvalidArgument(
                "Invalid pool_id, must be in the form `<region>_<pool name>`".into(),
            )
        })
    }
}

/// The parameters for the initial `InitiateAuth` request, when using the
/// `USER_SRP_AUTH` flow type.
#[derive(Debug, Eq, PartialEq)]
pub struct AuthParameters {
    /// The **public** `A` for the client, hex encoded (`SRP_A`).
    pub a: String,

    /// The username provided during instantiation of the SRP client
    /// (`USERNAME`).
    pub username: String,

    /// The hash of the client secret provided during instantiation of the
    /// SRP client, if one was provided (`SECRET_HASH`).
    pub secret_hash: Option<String>,
}

/// The parameters required to respond to the `PASSWORD_VERIFIER` challenge.
#[derive(Debug, Eq, PartialEq)]
pub struct VerificationParameters {
    /// The secret block issued by the provider at the start of the
    /// authentication flow, passed back untouched.
    pub password_claim_secret_block: String,

    /// The signature of the password claim generated during verification.
    pub password_claim_signature: String,

    /// The hash of the client secret provided during instantiation of the
    /// SRP client (if one was provided).
    pub secret_hash: Option<String>,

    /// The timestamp signed into the claim.
    pub timestamp: String,
}

/// The client side of the SRP password-proof handshake.
///
/// Holds the per-attempt ephemeral secret `a` and its public value `A`. A
/// client is built once per login attempt and never reused - the ephemeral
/// key material is regenerated for every attempt.
///
/// Generic over the random number generator so tests can inject a
/// deterministic one.
#[derive(Debug)]
pub struct SrpClient<R: RngCore + Default = ThreadRng> {
    a: BigUint,
    a_pub: BigUint,
    credentials: User,
    client_id: String,
    client_secret: Option<String>,
    rng: PhantomData<R>,
}

impl<R: RngCore + Default> SrpClient<R> {
    /// Create a new SRP client with freshly generated ephemeral key material.
    ///
    /// ## Errors
    ///
    /// Returns [`AuthError::ProtocolInvariantViolation`] if the generated
    /// public value `A` reduces to zero mod `N`.
    pub fn new(
        credentials: User,
        client_id: &str,
        client_secret: Option<&str>,
    ) -> Result<Self, AuthError> {
        let a = helper::generate_a::<R>();
        let a_pub = helper::compute_a_pub(&a)?;

        Ok(Self {
            a,
            a_pub,
            credentials,
            client_id: client_id.into(),
            client_secret: client_secret.map(|s| s.into()),
            rng: PhantomData,
        })
    }

    /// Generate the authentication parameters for the initial `InitiateAuth`
    /// request.
    ///
    /// This begins the SRP authentication flow, exchanging the initial public
    /// parameters which are then used to prove the user's password.
    #[must_use]
    pub fn get_auth_parameters(&self) -> AuthParameters {
        let username = self.credentials.username();

        info!(username; "Generating auth parameters for user");

        AuthParameters {
            a: helper::long_to_hex(&self.a_pub),
            username: username.into(),
            secret_hash: self.get_secret_hash(),
        }
    }

    /// Generate the challenge response parameters for the `PASSWORD_VERIFIER`
    /// challenge issued in response to the `InitiateAuth` request.
    ///
    /// These parameters prove to the provider that the password known by the
    /// client is correct, without ever transmitting the password.
    ///
    /// ## Errors
    ///
    /// Returns an error if any of the input values are invalid (for example
    /// `b` or `salt` not being valid hex strings), or if a protocol safety
    /// check fails.
    pub fn verify(
        &self,
        secret_block: &str,
        user_id: &str,
        salt: &str,
        b: &str,
    ) -> Result<VerificationParameters, AuthError> {
        self.verify_at(secret_block, user_id, salt, b, &helper::get_timestamp())
    }

    pub(crate) fn verify_at(
        &self,
        secret_block: &str,
        user_id: &str,
        salt: &str,
        b: &str,
        timestamp: &str,
    ) -> Result<VerificationParameters, AuthError> {
        let pool_name = self.credentials.pool_name()?;
        let key = self.get_password_authentication_key(user_id, salt, b)?;

        let mut msg: Vec<u8> = vec![];
        msg.extend_from_slice(pool_name.as_bytes());
        msg.extend_from_slice(user_id.as_bytes());
        msg.extend_from_slice(&BASE64.decode(secret_block).map_err(|err| {
            AuthError::InvalidArgument(format!("Invalid base64 secret block. Received '{err}'"))
        })?);
        msg.extend_from_slice(timestamp.as_bytes());

        let mut h256mac = HmacSha256::new_from_slice(&key)?;
        h256mac.update(&msg);
        let signature = BASE64.encode(h256mac.finalize().into_bytes());

        info!(user_id; "Generated verification parameters for user");

        Ok(VerificationParameters {
            timestamp: timestamp.into(),
            password_claim_secret_block: secret_block.into(),
            password_claim_signature: signature,
            secret_hash: self.get_secret_hash(),
        })
    }

    /// Derive the password authentication key for the user.
    ///
    /// This is the shared key which signs the final password claim: `U` from
    /// the two public values, `x` from the salted password digest, `S` from
    /// both, and a single HKDF round over `S` keyed on `U`.
    fn get_password_authentication_key(
        &self,
        user_id: &str,
        salt: &str,
        b: &str,
    ) -> Result<Vec<u8>, AuthError> {
        let b_pub = helper::parse_hex(b)
            .map_err(|_| AuthError::InvalidArgument(format!("Invalid SRP_B. Received '{b}'")))?;

        let u = helper::compute_u(&self.a_pub, &b_pub)?;
        helper::ensure_u_valid(&u)?;

        let x = helper::compute_x(
            self.credentials.pool_name()?,
            user_id,
            &self.credentials.password,
            salt,
        )?;
        let k = helper::compute_k()?;

        let s = helper::compute_s(&self.a, &b_pub, &u, &x, &k);

        helper::derive_key(&s, &u)
    }

    /// Get the secret hash to be used on login and challenge requests.
    ///
    /// Calculation is: `BASE64(HMAC_SHA256(<client secret>, <username> + <client id>))`
    pub(crate) fn get_secret_hash(&self) -> Option<String> {
        self.client_secret.as_ref().and_then(|secret| {
            let mut hmac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
            hmac.update(self.credentials.username().as_bytes());
            hmac.update(self.client_id.as_bytes());

            Some(BASE64.encode(hmac.finalize().into_bytes()))
        })
    }
}
