use num_bigint::BigUint;

/// The 3072-bit safe prime `N` used by AWS Cognito's SRP implementation.
///
/// This is the group from RFC 5054, and must match the value baked into the
/// provider exactly - see [AuthenticationHelper.js](https://github.com/aws/amazon-cognito-identity-js/blob/master/src/AuthenticationHelper.js)
/// in the official SDK.
pub const N_HEX: &str = "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD1\
29024E088A67CC74020BBEA63B139B22514A08798E3404DD\
EF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C245\
E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED\
EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3D\
C2007CB8A163BF0598DA48361C55D39A69163FA8FD24CF5F\
83655D23DCA3AD961C62F356208552BB9ED529077096966D\
670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B\
E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9\
DE2BCBF6955817183995497CEA956AE515D2261898FA0510\
15728E5A8AAAC42DAD33170D04507A33A85521ABDF1CBA64\
ECFB850458DBEF0A8AEA71575D060C7DB3970F85A6E1E4C7\
ABF5AE8CDB0933D71E8C94E04A25619DCEE3D2261AD2EE6B\
F12FFA06D98A0864D87602733EC86A64521F2B18177B200C\
BBE117577A615D6C770988C0BAD946E208E24FA074E5AB31\
43DB5BFCE0FD108E4B82D120A93AD2CAFFFFFFFFFFFFFFFF";

/// The generator `g` for the SRP group.
pub const G_HEX: &str = "2";

/// The fixed context label fed into the HKDF expansion round when deriving
/// the password authentication key.
pub const DERIVED_KEY_INFO: &[u8] = b"Caldera Derived Key";

lazy_static! {
    /// `N` as a big integer. Shared, immutable, identical across all sessions.
    pub static ref N: BigUint =
        BigUint::parse_bytes(N_HEX.as_bytes(), 16).expect("N_HEX is a valid hex constant");

    /// `g` as a big integer.
    pub static ref G: BigUint =
        BigUint::parse_bytes(G_HEX.as_bytes(), 16).expect("G_HEX is a valid hex constant");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_n_is_3072_bits() {
        assert_eq!(N.bits(), 3072);
    }

    #[test]
    fn test_g_is_two() {
        assert_eq!(*G, BigUint::from(2u8));
    }
}
