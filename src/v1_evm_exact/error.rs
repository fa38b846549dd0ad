//! Errors surfaced by payment construction.

use alloy_primitives::{Address, TxHash};

use crate::chain::{EvmAmountParseError, WalletError};
use crate::config::ConfigError;

/// Terminal outcome of a failed `build_payment` call.
///
/// The client never retries; [`PaymentError::is_retryable`] tells the caller
/// which outcomes are worth another attempt.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// The wallet has no active account.
    #[error("Wallet has no active account")]
    NoAccount,

    /// The requirements target a namespace or network this client cannot pay on.
    #[error("Unsupported network {namespace}:{network_id}")]
    UnsupportedNetwork {
        namespace: String,
        network_id: String,
    },

    /// The client configuration is unusable (authorization window out of range).
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The requirements are malformed (bad amount, missing decimals).
    #[error("Invalid payment requirements: {0}")]
    InvalidRequirements(#[from] EvmAmountParseError),

    /// The account refused to sign.
    #[error("Signature rejected: {0}")]
    SignatureRejected(String),

    /// A fallback transaction was submitted but not confirmed in time.
    ///
    /// The transaction may still be mined; the hash lets the caller follow up.
    #[error("Timed out waiting for transaction {transaction_hash} to confirm")]
    ConfirmationTimeout { transaction_hash: TxHash },

    /// The token's EIP-712 domain could not be determined.
    #[error("Cannot read EIP-712 domain of token {token}: {reason}")]
    TokenDomainUnavailable { token: Address, reason: String },

    /// A network-bound step failed (node unreachable, insufficient balance, revert).
    #[error("Payment construction failed: {0}")]
    ConstructionFailed(#[source] WalletError),

    /// The payload could not be serialized.
    #[error("Payload encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl PaymentError {
    /// Whether retrying the same requirements may succeed.
    ///
    /// Configuration problems, rejected signatures and reverted transactions
    /// are final. A confirmation timeout is retryable only after the caller
    /// has checked whether the earlier transaction landed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentError::ConfirmationTimeout { .. } => true,
            PaymentError::ConstructionFailed(cause) => matches!(
                cause,
                WalletError::Transport(_) | WalletError::Timeout(_)
            ),
            PaymentError::NoAccount
            | PaymentError::UnsupportedNetwork { .. }
            | PaymentError::InvalidConfig(_)
            | PaymentError::InvalidRequirements(_)
            | PaymentError::SignatureRejected(_)
            | PaymentError::TokenDomainUnavailable { .. }
            | PaymentError::Encoding(_) => false,
        }
    }

    /// Whether this is a configuration error raised before any network call.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PaymentError::NoAccount
                | PaymentError::UnsupportedNetwork { .. }
                | PaymentError::InvalidConfig(_)
                | PaymentError::InvalidRequirements(_)
        )
    }

    /// The hash of a transaction already sent on-chain, if this error carries one.
    pub fn submitted_transaction(&self) -> Option<TxHash> {
        match self {
            PaymentError::ConfirmationTimeout { transaction_hash } => Some(*transaction_hash),
            _ => None,
        }
    }
}
