use thiserror::Error;

/// EVM encoding and signing errors.
#[derive(Debug, Error)]
pub enum EthError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid swap path: {0}")]
    InvalidPath(String),

    #[error("value out of range: {0}")]
    OutOfRange(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}
