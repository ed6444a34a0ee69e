use thiserror::Error;

/// Solana address errors.
#[derive(Debug, Error)]
pub enum SolError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("no valid program address for seeds: {0}")]
    NoProgramAddress(String),
}
