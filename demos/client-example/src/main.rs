//! Example client that builds an h402 payment for an EVM resource.
//!
//! This example demonstrates how a client (human or AI agent) would:
//! 1. Read the payment requirements a protected resource advertised
//! 2. Build a payment with a local key
//! 3. Print the value to send back with the retried request
//!
//! The wallet here is offline: it signs with a local key but has no RPC node,
//! so contract probes fail and the ERC-3009 path is never taken unless the
//! requirements name the token's EIP-712 domain. In production, wrap a real
//! provider and signer in an [`EvmWallet`] implementation.
//!
//! # Running
//!
//! ```bash
//! # Built-in sample requirements (native coin on BNB Smart Chain):
//! cargo run -p h402-evm-client-example
//!
//! # Requirements from a file, with a fixed key:
//! REQUIREMENTS=requirements.json PRIVATE_KEY=0x... cargo run -p h402-evm-client-example
//! ```

use alloy_primitives::{Address, Bytes, TxHash};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use h402_chain_evm::ExactEvmClient;
use h402_chain_evm::chain::{
    EvmWallet, SubmittedTransaction, TransactionRequest, TypedDataRequest, WalletError,
};
use h402_chain_evm::config::ExactEvmClientConfig;
use h402_chain_evm::v1_evm_exact::PaymentRequirements;

const SAMPLE_REQUIREMENTS: &str = r#"{
    "scheme": "exact",
    "namespace": "evm",
    "networkId": "56",
    "resource": "https://example.com/image?prompt=cat",
    "payToAddress": "0x000000000000000000000000000000000000bEEF",
    "amountRequired": "0.0001",
    "amountRequiredFormat": "humanReadable",
    "tokenAddress": "0x0000000000000000000000000000000000000000",
    "tokenDecimals": 18,
    "tokenSymbol": "BNB",
    "description": "One generated image"
}"#;

/// A wallet that signs with a local key and never touches the network.
struct OfflineWallet {
    signer: PrivateKeySigner,
    nonce: u64,
}

#[async_trait]
impl EvmWallet for OfflineWallet {
    fn account(&self) -> Option<Address> {
        Some(self.signer.address())
    }

    async fn sign_typed_data(&self, request: &TypedDataRequest) -> Result<Bytes, WalletError> {
        tracing::debug!(
            primary_type = request.primary_type,
            encode_type = %request.encode_type,
            message = %request.message,
            "Signing typed data"
        );
        let signature = self
            .signer
            .sign_hash(&request.signing_hash)
            .await
            .map_err(|e| WalletError::Rejected(e.to_string()))?;
        Ok(Bytes::copy_from_slice(&signature.as_bytes()))
    }

    async fn send_transaction(
        &self,
        _request: &TransactionRequest,
    ) -> Result<SubmittedTransaction, WalletError> {
        Err(WalletError::Transport("offline wallet cannot broadcast".to_string()))
    }

    async fn wait_for_confirmation(&self, _transaction_hash: TxHash) -> Result<(), WalletError> {
        Err(WalletError::Transport("offline wallet cannot broadcast".to_string()))
    }

    async fn call(&self, to: Address, _data: Bytes) -> Result<Bytes, WalletError> {
        Err(WalletError::Transport(format!("offline, cannot call {to}")))
    }

    async fn transaction_count(&self, _account: Address) -> Result<u64, WalletError> {
        Ok(self.nonce)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // LOG_LEVEL is used if RUST_LOG is not set
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    let requirements = match std::env::var("REQUIREMENTS") {
        Ok(path) => std::fs::read_to_string(path)?,
        Err(_) => SAMPLE_REQUIREMENTS.to_string(),
    };
    let requirements: PaymentRequirements = serde_json::from_str(&requirements)?;

    let signer = match std::env::var("PRIVATE_KEY") {
        Ok(key) => key.parse::<PrivateKeySigner>()?,
        Err(_) => PrivateKeySigner::random(),
    };
    let nonce = match std::env::var("NONCE") {
        Ok(nonce) => nonce.parse()?,
        Err(_) => 0,
    };
    tracing::info!(payer = %signer.address(), "Using local key");

    let client = ExactEvmClient::new(
        OfflineWallet { signer, nonce },
        ExactEvmClientConfig::from_env()?,
    );

    tracing::info!(
        network_id = %requirements.network_id,
        amount = %requirements.amount_required,
        token = %requirements.token_address,
        pay_to = %requirements.pay_to_address,
        "Building payment"
    );
    let payment = client.build_payment(&requirements).await?;
    tracing::info!(kind = payment.payload.kind(), "Payment built");
    println!("{}", serde_json::to_string_pretty(&payment)?);

    let header = h402_chain_evm::encode_payment_payload(&payment)?;
    println!();
    println!("X-PAYMENT: {header}");

    let separator = if requirements.resource.contains('?') { '&' } else { '?' };
    println!("{}{separator}402base64={header}", requirements.resource);

    Ok(())
}
