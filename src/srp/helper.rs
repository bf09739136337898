use chrono::{DateTime, Utc};
use hmac::Mac;
use num_bigint::BigUint;
use rand::RngCore;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::constant::{DERIVED_KEY_INFO, G, G_HEX, N, N_HEX};
use crate::error::AuthError;
use crate::srp::HmacSha256;

lazy_static! {
    // Cognito rejects signatures whose timestamp carries a zero-padded
    // day-of-month ("Jan 09" must be sent as "Jan 9").
    static ref DAY_PADDING: Regex = Regex::new(r" 0(\d) ").expect("day padding pattern is valid");
}

/// Generate the ephemeral secret `a`: 128 bytes of randomness reduced mod `N`.
///
/// A fresh value must be generated for every login attempt - reusing `a`
/// across attempts weakens the protocol.
pub(crate) fn generate_a<R: RngCore + Default>() -> BigUint {
    let mut rng = R::default();
    let mut bytes = [0u8; 128];
    rng.fill_bytes(&mut bytes);

    BigUint::from_bytes_be(&bytes) % &*N
}

/// Compute the client's public value `A = g^a mod N`.
pub(crate) fn compute_a_pub(a: &BigUint) -> Result<BigUint, AuthError> {
    let a_pub = G.modpow(a, &N);
    ensure_a_pub_valid(&a_pub)?;

    Ok(a_pub)
}

/// Safety check: a public value which reduces to zero mod `N` would leak the
/// password material if sent to the server.
pub(crate) fn ensure_a_pub_valid(a_pub: &BigUint) -> Result<(), AuthError> {
    if (a_pub % &*N) == BigUint::from(0u8) {
        return Err(AuthError::ProtocolInvariantViolation(
            "client public value A reduced to zero mod N",
        ));
    }

    Ok(())
}

/// Safety check: a zero scrambling parameter would collapse the shared
/// secret to a value independent of the password.
pub(crate) fn ensure_u_valid(u: &BigUint) -> Result<(), AuthError> {
    if *u == BigUint::from(0u8) {
        return Err(AuthError::ProtocolInvariantViolation(
            "scrambling parameter U is zero",
        ));
    }

    Ok(())
}

/// Compute the SRP multiplier `k = H("00" || N || "0" || g)`.
pub(crate) fn compute_k() -> Result<BigUint, AuthError> {
    let digest = hash_hex_string(&format!("00{N_HEX}0{G_HEX}"))?;

    parse_hex(&digest)
}

/// Compute the scrambling parameter `U = H(pad(A) || pad(B))`.
///
/// The zero guard is the caller's responsibility ([`ensure_u_valid`]).
pub(crate) fn compute_u(a_pub: &BigUint, b_pub: &BigUint) -> Result<BigUint, AuthError> {
    let digest = hash_hex_string(&format!("{}{}", pad_hex(a_pub), pad_hex(b_pub)))?;

    parse_hex(&digest)
}

/// Compute `x = H(pad(salt) || H(<pool name><user id>:<password>))`.
///
/// The password is folded into a digest here and never leaves the process.
/// `salt` is the hex string exactly as received from the provider.
pub(crate) fn compute_x(
    pool_name: &str,
    user_id: &str,
    password: &str,
    salt: &str,
) -> Result<BigUint, AuthError> {
    let mut hasher = Sha256::new();
    hasher.update(pool_name.as_bytes());
    hasher.update(user_id.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    let identity = hex::encode(hasher.finalize());

    let digest = hash_hex_string(&format!("{}{identity}", pad_hex_string(salt)))?;

    parse_hex(&digest)
}

/// Compute the shared secret `S = (B - k*g^x) ^ (a + U*x) mod N`.
pub(crate) fn compute_s(
    a: &BigUint,
    b_pub: &BigUint,
    u: &BigUint,
    x: &BigUint,
    k: &BigUint,
) -> BigUint {
    let n = &*N;
    let g_x = G.modpow(x, n);

    // The subtraction is performed mod N so it cannot underflow.
    let base = ((b_pub % n) + n - (k * g_x) % n) % n;
    let exponent = a + &(u * x);

    base.modpow(&exponent, n)
}

/// Derive the 16-byte password authentication key from `S` and `U` via a
/// single-round HKDF keyed on `U`, expanded with the fixed info label.
pub(crate) fn derive_key(s: &BigUint, u: &BigUint) -> Result<Vec<u8>, AuthError> {
    let ikm = decode_hex(&pad_hex(s))?;
    let salt = decode_hex(&pad_hex(u))?;

    let mut hkdf = HmacSha256::new_from_slice(&salt)?;
    hkdf.update(&ikm);
    let prk = hkdf.finalize().into_bytes();

    let mut expansion = HmacSha256::new_from_slice(&prk)?;
    expansion.update(DERIVED_KEY_INFO);
    expansion.update(&[1]);

    Ok(expansion.finalize().into_bytes()[..16].to_vec())
}

/// Serialize a big integer as hex, padded for hashing.
///
/// Odd-length strings get a single leading zero; even-length strings whose
/// first nibble is >= 8 get two (the hex would otherwise read as a negative
/// twos-complement byte string). This rule must be applied identically
/// everywhere an integer is serialized for hashing - a mismatch silently
/// produces a wrong shared secret.
pub(crate) fn pad_hex(value: &BigUint) -> String {
    pad_hex_string(&long_to_hex(value))
}

/// Apply the padding rule to an already hex-encoded string.
pub(crate) fn pad_hex_string(hex_string: &str) -> String {
    if hex_string.len() % 2 == 1 {
        format!("0{hex_string}")
    } else if hex_string
        .chars()
        .next()
        .is_some_and(|c| matches!(c, '8'..='9' | 'a'..='f' | 'A'..='F'))
    {
        format!("00{hex_string}")
    } else {
        hex_string.to_string()
    }
}

/// Minimal (unpadded) hex form of a big integer, as sent in `SRP_A`.
pub(crate) fn long_to_hex(value: &BigUint) -> String {
    format!("{value:x}")
}

pub(crate) fn parse_hex(hex_string: &str) -> Result<BigUint, AuthError> {
    BigUint::parse_bytes(hex_string.as_bytes(), 16)
        .ok_or_else(|| AuthError::InvalidArgument(format!("Invalid hex value '{hex_string}'")))
}

/// SHA256 over the bytes of a hex string, returned as a 64-character hex
/// digest.
fn hash_hex_string(hex_string: &str) -> Result<String, AuthError> {
    Ok(hex::encode(Sha256::digest(decode_hex(hex_string)?)))
}

fn decode_hex(hex_string: &str) -> Result<Vec<u8>, AuthError> {
    hex::decode(hex_string)
        .map_err(|err| AuthError::InvalidArgument(format!("Invalid hex value. Received '{err}'")))
}

/// The timestamp signed into the password claim: UTC, fixed locale-independent
/// format, with any zero-padded day-of-month collapsed.
pub(crate) fn get_timestamp() -> String {
    format_timestamp(Utc::now())
}

pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    let formatted = at.format("%a %b %d %H:%M:%S UTC %Y").to_string();

    DAY_PADDING.replace(&formatted, " $1 ").into_owned()
}
