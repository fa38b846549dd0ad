//! Client-side payment construction for the V1 EVM "exact" scheme.
//!
//! This module provides [`ExactEvmClient`], which turns a resource's
//! [`PaymentRequirements`] into a signed (or already broadcast) payment and
//! the transport string that goes into the retried request.
//!
//! # Payment Flow
//!
//! 1. Check that the wallet has an active account and the chain is supported
//! 2. Pick a [`SigningStrategy`] (native coin, ERC-3009 authorization, token transfer)
//! 3. Run the strategy once; it either signs or falls back to sending a transaction
//! 4. Wrap the result into the [`PaymentPayload`] envelope
//! 5. Encode the payload with [`encode_payment_payload`]

use x402_types::scheme::X402SchemeId;

use crate::chain::{EVM_NAMESPACE, EvmChainReference, EvmWallet};
use crate::config::ExactEvmClientConfig;
use crate::v1_evm_exact::V1EvmExact;
use crate::v1_evm_exact::encoding::encode_payment_payload;
use crate::v1_evm_exact::error::PaymentError;
use crate::v1_evm_exact::probe::TRANSFER_WITH_AUTHORIZATION_SELECTOR;
use crate::v1_evm_exact::strategy::{SigningContext, SigningStrategy};
use crate::v1_evm_exact::types::{
    AuthorizationPayload, ExactEvmPayload, NativeTransferPayload, PaymentPayload,
    PaymentRequirements, SignAndSendTransactionPayload, SignedTransfer, SigningResult,
    TokenTransferPayload, TransferAuthorization, TransferIntent, TransferTransaction,
};

/// Client for building V1 EVM exact scheme payments.
///
/// Holds no per-payment state; concurrent calls for different requests are
/// independent.
///
/// # Type Parameters
///
/// - `W`: The wallet type, which must implement [`EvmWallet`]
///
/// # Example
///
/// ```ignore
/// use h402_chain_evm::ExactEvmClient;
/// use h402_chain_evm::config::ExactEvmClientConfig;
///
/// let client = ExactEvmClient::new(wallet, ExactEvmClientConfig::default());
/// let header = client.create_payment(&requirements).await?;
/// ```
#[derive(Debug)]
pub struct ExactEvmClient<W> {
    wallet: W,
    config: ExactEvmClientConfig,
}

impl<W> ExactEvmClient<W> {
    /// Creates a new client with the given wallet and configuration.
    pub fn new(wallet: W, config: ExactEvmClientConfig) -> Self {
        Self { wallet, config }
    }

    /// Returns the wallet.
    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ExactEvmClientConfig {
        &self.config
    }
}

impl<W> X402SchemeId for ExactEvmClient<W> {
    fn x402_version(&self) -> u8 {
        V1EvmExact.x402_version()
    }

    fn namespace(&self) -> &str {
        V1EvmExact.namespace()
    }

    fn scheme(&self) -> &str {
        V1EvmExact.scheme()
    }
}

impl<W> ExactEvmClient<W>
where
    W: EvmWallet,
{
    /// Builds a payment and returns its transport string.
    pub async fn create_payment(
        &self,
        requirements: &PaymentRequirements,
    ) -> Result<String, PaymentError> {
        let payment = self.build_payment(requirements).await?;
        Ok(encode_payment_payload(&payment)?)
    }

    /// Builds the payment payload for `requirements`.
    ///
    /// Fails before any network call if the wallet has no account, the
    /// configuration is invalid or the requirements are not for a supported
    /// EVM chain. Issues at most one capability probe and runs exactly one
    /// strategy, without retries.
    #[tracing::instrument(
        skip_all,
        fields(
            network_id = %requirements.network_id,
            token = %requirements.token_address,
            pay_to = %requirements.pay_to_address,
        )
    )]
    pub async fn build_payment(
        &self,
        requirements: &PaymentRequirements,
    ) -> Result<PaymentPayload, PaymentError> {
        let from = self.wallet.account().ok_or(PaymentError::NoAccount)?;
        self.config.validate()?;
        let chain_reference = network_of(requirements, &self.config)?;
        let intent = TransferIntent {
            from,
            to: requirements.pay_to_address,
            value: requirements.amount_in_smallest_unit()?,
        };

        let strategy = SigningStrategy::select(
            &self.wallet,
            requirements,
            TRANSFER_WITH_AUTHORIZATION_SELECTOR,
        )
        .await;
        tracing::debug!(%strategy, %from, value = %intent.value, "signing strategy selected");

        let context = SigningContext {
            requirements,
            chain_reference,
            config: &self.config,
        };
        let result = strategy.sign(&self.wallet, &intent, &context).await?;

        Ok(PaymentPayload {
            version: self.config.protocol_version,
            scheme: requirements.scheme,
            namespace: requirements.namespace.clone(),
            network_id: requirements.network_id.clone(),
            resource: requirements.resource.clone(),
            payload: into_payload(&intent, result),
        })
    }
}

/// Validates the namespace and checks the chain id against the supported set.
fn network_of(
    requirements: &PaymentRequirements,
    config: &ExactEvmClientConfig,
) -> Result<EvmChainReference, PaymentError> {
    let unsupported = || PaymentError::UnsupportedNetwork {
        namespace: requirements.namespace.clone(),
        network_id: requirements.network_id.clone(),
    };
    if requirements.namespace != EVM_NAMESPACE {
        return Err(unsupported());
    }
    let chain_reference = requirements
        .network_id
        .parse::<EvmChainReference>()
        .map_err(|_| unsupported())?;
    if !config.supports_chain(chain_reference) {
        return Err(unsupported());
    }
    Ok(chain_reference)
}

/// Maps a strategy result onto the wire payload.
///
/// Every fallback becomes `signAndSendTransaction`, whichever strategy
/// produced it.
pub fn into_payload(intent: &TransferIntent, result: SigningResult) -> ExactEvmPayload {
    match result {
        SigningResult::Fallback(fallback) => {
            ExactEvmPayload::SignAndSendTransaction(SignAndSendTransactionPayload {
                signed_message: fallback.signature,
                transaction_hash: fallback.transaction_hash,
            })
        }
        SigningResult::Signed(SignedTransfer::Native { signature, nonce }) => {
            ExactEvmPayload::NativeTransfer(NativeTransferPayload {
                signature,
                transaction: TransferTransaction {
                    from: intent.from,
                    to: intent.to,
                    value: intent.value,
                    nonce,
                    data: None,
                },
            })
        }
        SigningResult::Signed(SignedTransfer::Authorization {
            signature,
            valid_after,
            valid_before,
            nonce,
            version,
        }) => ExactEvmPayload::Authorization(AuthorizationPayload {
            signature,
            authorization: TransferAuthorization {
                from: intent.from,
                to: intent.to,
                value: intent.value,
                valid_after,
                valid_before,
                nonce,
                version,
            },
        }),
        SigningResult::Signed(SignedTransfer::Token {
            signature,
            nonce,
            data,
        }) => ExactEvmPayload::TokenTransfer(TokenTransferPayload {
            signature,
            transaction: TransferTransaction {
                from: intent.from,
                to: intent.to,
                value: intent.value,
                nonce,
                data: Some(data),
            },
        }),
    }
}
