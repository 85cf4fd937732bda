//! Error types for the crypto facade.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// The 64 raw bytes do not name a point on the P-256 curve.
    #[error("invalid public key encoding")]
    InvalidPublicKey,

    /// Private key material could not be parsed.
    #[error("invalid private key")]
    InvalidPrivateKey,

    /// The 64 raw bytes are not a well-formed (r, s) pair.
    #[error("invalid signature encoding")]
    InvalidSignature,

    /// The signature does not verify under the given key and message.
    #[error("signature verification failed")]
    VerificationFailed,

    /// Producing a signature failed.
    #[error("signing failed")]
    SignError,
}
