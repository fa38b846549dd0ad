//! The wallet/account collaborator used to construct payments.
//!
//! The payment core never talks to an RPC node or a key store directly.
//! Everything it needs from the outside world goes through [`EvmWallet`]:
//!
//! - the active account address
//! - EIP-712 typed-data signing (which may be unsupported by the account)
//! - submitting a transaction and waiting for its confirmation
//! - read-only contract calls
//! - the account nonce

use alloy_primitives::{Address, B256, Bytes, TxHash, U256};
use alloy_sol_types::Eip712Domain;

/// A typed-data signing request.
///
/// Local signers only need [`signing_hash`](Self::signing_hash). Wallets that
/// forward to `eth_signTypedData_v4` can rebuild the full payload from the
/// domain, `encode_type` and the JSON message.
#[derive(Debug, Clone)]
pub struct TypedDataRequest {
    /// The EIP-712 domain the message is bound to.
    pub domain: Eip712Domain,
    /// The primary struct name, e.g. `TransferWithAuthorization`.
    pub primary_type: &'static str,
    /// The EIP-712 `encodeType` string of the primary struct.
    pub encode_type: String,
    /// The message fields as JSON.
    pub message: serde_json::Value,
    /// The final EIP-712 digest to sign.
    pub signing_hash: B256,
}

/// A transaction to submit when structured signing is unavailable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

/// A transaction accepted by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTransaction {
    /// Hash of the submitted transaction.
    pub transaction_hash: TxHash,
    /// The signed raw transaction, when the wallet exposes it.
    pub signed_transaction: Option<Bytes>,
}

/// Account and chain access required to build a payment.
///
/// Implementations wrap whatever the application uses for keys and RPC
/// (a local signer plus a provider, a browser wallet bridge, a smart account).
#[cfg(feature = "client")]
#[async_trait::async_trait]
pub trait EvmWallet: Send + Sync {
    /// The active account, or `None` if no account is connected.
    fn account(&self) -> Option<Address>;

    /// Signs EIP-712 typed data.
    ///
    /// Must return [`WalletError::Unsupported`] when the account cannot produce
    /// typed-data signatures at all, so the caller can fall back to sending a
    /// transaction.
    async fn sign_typed_data(&self, request: &TypedDataRequest) -> Result<Bytes, WalletError>;

    /// Signs and broadcasts a transaction. Returns once the node accepted it.
    async fn send_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<SubmittedTransaction, WalletError>;

    /// Waits until `transaction_hash` is mined.
    ///
    /// Returns [`WalletError::Reverted`] if the transaction was mined but failed.
    async fn wait_for_confirmation(&self, transaction_hash: TxHash) -> Result<(), WalletError>;

    /// Performs a read-only `eth_call` against `to` with raw call data.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, WalletError>;

    /// Returns the transaction count (nonce) of `account`.
    async fn transaction_count(&self, account: Address) -> Result<u64, WalletError>;
}

#[cfg(feature = "client")]
#[async_trait::async_trait]
impl<W> EvmWallet for std::sync::Arc<W>
where
    W: EvmWallet + ?Sized,
{
    fn account(&self) -> Option<Address> {
        (**self).account()
    }

    async fn sign_typed_data(&self, request: &TypedDataRequest) -> Result<Bytes, WalletError> {
        (**self).sign_typed_data(request).await
    }

    async fn send_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<SubmittedTransaction, WalletError> {
        (**self).send_transaction(request).await
    }

    async fn wait_for_confirmation(&self, transaction_hash: TxHash) -> Result<(), WalletError> {
        (**self).wait_for_confirmation(transaction_hash).await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, WalletError> {
        (**self).call(to, data).await
    }

    async fn transaction_count(&self, account: Address) -> Result<u64, WalletError> {
        (**self).transaction_count(account).await
    }
}

/// Errors reported by an [`EvmWallet`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum WalletError {
    /// The account does not support the requested operation.
    #[error("Unsupported by account: {0}")]
    Unsupported(String),

    /// The user or account policy refused to sign.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The node could not be reached or returned an RPC error.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The account cannot cover value plus gas.
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// The call or transaction reverted.
    #[error("Execution reverted: {0}")]
    Reverted(String),

    /// Waiting for the node timed out.
    #[error("Timed out: {0}")]
    Timeout(String),
}
