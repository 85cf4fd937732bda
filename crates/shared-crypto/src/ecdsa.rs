//! # ECDSA Signatures (NIST P-256)
//!
//! Signing facade over the RustCrypto `p256` crate.
//!
//! ## Wire format
//!
//! The protocol fixes the curve to P-256 and carries raw, uncompressed key
//! material: public keys are `X ‖ Y` (32 bytes each, right-aligned),
//! signatures are `r ‖ s` (32 bytes each). Changing either invalidates every
//! historical block, so there is no negotiation anywhere.
//!
//! ## Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - `sign(m)` signs `SHA-256(m)`; callers pass preimages, not digests
//! - Public key bytes are validated as an on-curve point before any verify

use crate::errors::CryptoError;
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::{DecodePrivateKey, LineEnding};
use p256::{EncodedPoint, FieldBytes, SecretKey};
use sha2::{Digest, Sha256};
use shared_types::{Address, PublicKeyBytes, SignatureBytes, Transaction};
use zeroize::Zeroizing;

/// Reconstruct a verifying key from raw `X ‖ Y` coordinates.
///
/// Fails unless the coordinates name a point on the curve.
pub fn verifying_key_from_raw(bytes: &PublicKeyBytes) -> Result<VerifyingKey, CryptoError> {
    let x = FieldBytes::from_slice(&bytes[..32]);
    let y = FieldBytes::from_slice(&bytes[32..]);
    let point = EncodedPoint::from_affine_coordinates(x, y, false);
    VerifyingKey::from_encoded_point(&point).map_err(|_| CryptoError::InvalidPublicKey)
}

/// Serialize a verifying key to the raw `X ‖ Y` wire form.
pub fn verifying_key_to_raw(key: &VerifyingKey) -> PublicKeyBytes {
    let point = key.to_encoded_point(false);
    // Uncompressed SEC1 is 0x04 ‖ X ‖ Y.
    let mut bytes = [0u8; 64];
    bytes.copy_from_slice(&point.as_bytes()[1..65]);
    bytes
}

/// Derive the account address for a raw public key: `SHA-256(X ‖ Y)`.
pub fn address_of(public_key: &PublicKeyBytes) -> Address {
    Sha256::digest(public_key).into()
}

/// Verify a raw signature over `message` (which is hashed with SHA-256
/// before verification). Any malformed input verifies as `false`.
pub fn verify(public_key: &PublicKeyBytes, message: &[u8], signature: &SignatureBytes) -> bool {
    let Ok(key) = verifying_key_from_raw(public_key) else {
        return false;
    };
    let Ok(sig) = Signature::from_slice(signature) else {
        return false;
    };
    key.verify(message, &sig).is_ok()
}

/// Verify a transaction's signature against its own public key field.
pub fn verify_transaction(txn: &Transaction) -> bool {
    verify(&txn.public_key, &txn.signing_bytes(), &txn.signature)
}

/// A node identity: P-256 signing key plus the derived wire material.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh random identity.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::thread_rng()),
        }
    }

    /// Parse a PEM-encoded private key. Accepts SEC1 (`EC PRIVATE KEY`) and
    /// PKCS#8 (`PRIVATE KEY`) envelopes.
    pub fn from_pem(pem: &str) -> Result<Self, CryptoError> {
        let secret = SecretKey::from_sec1_pem(pem)
            .or_else(|_| SecretKey::from_pkcs8_pem(pem))
            .map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self {
            signing_key: secret.into(),
        })
    }

    /// Serialize to a SEC1 PEM. The buffer zeroizes on drop.
    pub fn to_pem(&self) -> Result<Zeroizing<String>, CryptoError> {
        let secret = SecretKey::from_bytes(&self.signing_key.to_bytes())
            .map_err(|_| CryptoError::InvalidPrivateKey)?;
        secret
            .to_sec1_pem(LineEnding::LF)
            .map_err(|_| CryptoError::InvalidPrivateKey)
    }

    /// The raw `X ‖ Y` public key.
    pub fn public_key_bytes(&self) -> PublicKeyBytes {
        verifying_key_to_raw(self.signing_key.verifying_key())
    }

    /// The account address of this identity.
    pub fn address(&self) -> Address {
        address_of(&self.public_key_bytes())
    }

    /// Sign `message` (RFC 6979, SHA-256 prehash), returning raw `r ‖ s`.
    pub fn sign(&self, message: &[u8]) -> SignatureBytes {
        let sig: Signature = self.signing_key.sign(message);
        sig.to_bytes().into()
    }

    /// Fallible signing; used where the caller wants to skip work on error
    /// rather than unwind.
    pub fn try_sign(&self, message: &[u8]) -> Result<SignatureBytes, CryptoError> {
        let sig: Signature = self
            .signing_key
            .try_sign(message)
            .map_err(|_| CryptoError::SignError)?;
        Ok(sig.to_bytes().into())
    }

    /// Sign a transaction in place: fills `public_key` and `signature`.
    pub fn sign_transaction(&self, txn: &mut Transaction) {
        txn.public_key = self.public_key_bytes();
        txn.signature = self.sign(&txn.signing_bytes());
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        write!(f, "Keypair({})", hex::encode(&self.address()[..4]))
    }
}
