//! Sign and verify response digests.

use crate::types::Hash;
use avalanche_cryptography::{
    ed25519::{PrivateKey, PublicKey, Signature},
    Signer as _, Verifier as _,
};

/// Namespace every response signature is bound to.
pub const NAMESPACE: &[u8] = b"_AVALANCHE_RESPONSE";

/// Returns whether `signature` was produced by `public_key` over `digest`.
pub fn verify(signature: &Signature, public_key: &PublicKey, digest: &Hash) -> bool {
    public_key.verify(Some(NAMESPACE), digest.as_ref(), signature)
}

/// Signs `digest` under [NAMESPACE].
pub fn sign(signer: &PrivateKey, digest: &Hash) -> Signature {
    signer.sign(Some(NAMESPACE), digest.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use avalanche_cryptography::{hash, Signer as _};

    #[test]
    fn test_verify() {
        let signer = PrivateKey::from_seed(0);
        let digest = hash(b"response");
        let signature = sign(&signer, &digest);
        assert!(verify(&signature, &signer.public_key(), &digest));
        assert!(!verify(&signature, &signer.public_key(), &hash(b"other")));
        assert!(!verify(
            &signature,
            &PrivateKey::from_seed(1).public_key(),
            &digest
        ));
    }

    #[test]
    fn test_namespace_bound() {
        let signer = PrivateKey::from_seed(0);
        let digest = hash(b"response");
        let signature = signer.sign(None, digest.as_ref());
        assert!(!verify(&signature, &signer.public_key(), &digest));
    }
}
