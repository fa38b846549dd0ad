//! Signing strategies for the "exact" scheme.
//!
//! Three mechanisms can move funds from the payer to the resource owner:
//!
//! - [`SigningStrategy::NativeTransfer`] - EIP-712 intent to send native coin
//! - [`SigningStrategy::Authorization`] - ERC-3009 `TransferWithAuthorization`
//! - [`SigningStrategy::TokenTransfer`] - EIP-712 intent wrapping an ERC-20 `transfer` call
//!
//! Each one first asks the wallet for a typed-data signature. If the account
//! cannot sign typed data, the strategy sends the equivalent transaction
//! itself, waits for it to be mined and reports the hash instead.

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::{Eip712Domain, SolCall, SolStruct};
use rand::{Rng, rng};
use serde::Serialize;
use std::borrow::Cow;
use std::time::Duration;
use x402_types::timestamp::UnixTimestamp;

use crate::chain::{
    EvmChainReference, EvmWallet, TransactionRequest, TypedDataRequest, WalletError,
    is_native_token,
};
use crate::config::{ConfigError, ExactEvmClientConfig};
use crate::v1_evm_exact::error::PaymentError;
use crate::v1_evm_exact::probe::probe_authorization_support;
use crate::v1_evm_exact::types::{
    FallbackTransfer, IERC20, NativeTransfer, PaymentRequirements, SignedTransfer, SigningResult,
    TokenTransfer, TransferIntent, TransferWithAuthorization,
};

/// EIP-712 domain name used for intents that are not bound to a token's own domain.
pub const H402_DOMAIN_NAME: &str = "h402";

/// Version assumed for tokens that do not expose `version()`.
pub const DEFAULT_TOKEN_DOMAIN_VERSION: &str = "1";

/// A transfer mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningStrategy {
    NativeTransfer,
    Authorization,
    TokenTransfer,
}

/// Inputs shared by every strategy for one payment attempt.
#[derive(Debug, Clone, Copy)]
pub struct SigningContext<'a> {
    pub requirements: &'a PaymentRequirements,
    pub chain_reference: EvmChainReference,
    pub config: &'a ExactEvmClientConfig,
}

impl SigningStrategy {
    /// Picks the mechanism for `requirements`.
    ///
    /// Evaluated top-down, first match wins:
    ///
    /// 1. native-asset sentinel: [`NativeTransfer`](Self::NativeTransfer)
    /// 2. the token answers the ERC-3009 probe: [`Authorization`](Self::Authorization)
    /// 3. otherwise: [`TokenTransfer`](Self::TokenTransfer)
    ///
    /// Authorization is preferred over a plain transfer because nothing touches
    /// the chain until the facilitator settles. At most one probe is issued.
    pub async fn select<W>(wallet: &W, requirements: &PaymentRequirements, selector: [u8; 4]) -> Self
    where
        W: EvmWallet + ?Sized,
    {
        if is_native_token(&requirements.token_address) {
            return SigningStrategy::NativeTransfer;
        }
        if probe_authorization_support(wallet, requirements.token_address, selector).await {
            SigningStrategy::Authorization
        } else {
            SigningStrategy::TokenTransfer
        }
    }

    /// Runs this strategy once.
    pub async fn sign<W>(
        &self,
        wallet: &W,
        intent: &TransferIntent,
        context: &SigningContext<'_>,
    ) -> Result<SigningResult, PaymentError>
    where
        W: EvmWallet + ?Sized,
    {
        match self {
            SigningStrategy::NativeTransfer => sign_native_transfer(wallet, intent, context).await,
            SigningStrategy::Authorization => sign_authorization(wallet, intent, context).await,
            SigningStrategy::TokenTransfer => sign_token_transfer(wallet, intent, context).await,
        }
    }
}

impl std::fmt::Display for SigningStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningStrategy::NativeTransfer => write!(f, "nativeTransfer"),
            SigningStrategy::Authorization => write!(f, "authorization"),
            SigningStrategy::TokenTransfer => write!(f, "tokenTransfer"),
        }
    }
}

async fn sign_native_transfer<W>(
    wallet: &W,
    intent: &TransferIntent,
    context: &SigningContext<'_>,
) -> Result<SigningResult, PaymentError>
where
    W: EvmWallet + ?Sized,
{
    let nonce = account_nonce(wallet, intent.from).await?;
    let message = NativeTransfer {
        from: intent.from,
        to: intent.to,
        value: intent.value,
        nonce: U256::from(nonce),
    };
    let domain = h402_domain(context, None);
    let request = typed_data_request(&message, domain)?;
    let fallback = TransactionRequest {
        from: intent.from,
        to: intent.to,
        value: intent.value,
        data: Bytes::new(),
    };

    Ok(
        match sign_or_send(wallet, &request, &fallback, context.config).await? {
            SignOutcome::Signature(signature) => {
                SigningResult::Signed(SignedTransfer::Native { signature, nonce })
            }
            SignOutcome::Sent(transfer) => SigningResult::Fallback(transfer),
        },
    )
}

async fn sign_authorization<W>(
    wallet: &W,
    intent: &TransferIntent,
    context: &SigningContext<'_>,
) -> Result<SigningResult, PaymentError>
where
    W: EvmWallet + ?Sized,
{
    let token = context.requirements.token_address;
    let (name, version) = token_domain(wallet, context.requirements).await?;

    let window = authorization_window(context.config, context.requirements.max_timeout_seconds);
    let (valid_after, valid_before) =
        authorization_bounds(UnixTimestamp::now().as_secs(), window)?;
    let nonce: [u8; 32] = rng().random();
    let nonce = B256::from(nonce);

    let message = TransferWithAuthorization {
        from: intent.from,
        to: intent.to,
        value: intent.value,
        validAfter: U256::from(valid_after),
        validBefore: U256::from(valid_before),
        nonce,
    };
    let domain = Eip712Domain::new(
        Some(Cow::Owned(name)),
        Some(Cow::Owned(version.clone())),
        Some(U256::from(context.chain_reference.inner())),
        Some(token),
        None,
    );
    let request = typed_data_request(&message, domain)?;
    let fallback = token_transfer_request(intent, token);

    Ok(
        match sign_or_send(wallet, &request, &fallback, context.config).await? {
            SignOutcome::Signature(signature) => {
                SigningResult::Signed(SignedTransfer::Authorization {
                    signature,
                    valid_after,
                    valid_before,
                    nonce,
                    version,
                })
            }
            SignOutcome::Sent(transfer) => SigningResult::Fallback(transfer),
        },
    )
}

async fn sign_token_transfer<W>(
    wallet: &W,
    intent: &TransferIntent,
    context: &SigningContext<'_>,
) -> Result<SigningResult, PaymentError>
where
    W: EvmWallet + ?Sized,
{
    let token = context.requirements.token_address;
    let fallback = token_transfer_request(intent, token);
    let nonce = account_nonce(wallet, intent.from).await?;
    let message = TokenTransfer {
        from: intent.from,
        to: intent.to,
        value: intent.value,
        nonce: U256::from(nonce),
        data: fallback.data.clone(),
    };
    let domain = h402_domain(context, Some(token));
    let request = typed_data_request(&message, domain)?;

    Ok(
        match sign_or_send(wallet, &request, &fallback, context.config).await? {
            SignOutcome::Signature(signature) => SigningResult::Signed(SignedTransfer::Token {
                signature,
                nonce,
                data: fallback.data,
            }),
            SignOutcome::Sent(transfer) => SigningResult::Fallback(transfer),
        },
    )
}

/// Length of the authorization validity window in seconds.
///
/// The configured validity is the upper bound; a non-zero `maxTimeoutSeconds`
/// from the resource server shortens it further. Never zero.
pub fn authorization_window(config: &ExactEvmClientConfig, max_timeout_seconds: Option<u64>) -> u64 {
    let cap = config.authorization_validity.as_secs().max(1);
    match max_timeout_seconds {
        Some(timeout) if timeout > 0 => cap.min(timeout),
        _ => cap,
    }
}

/// `(validAfter, validBefore)` for an authorization starting at `now`.
pub fn authorization_bounds(now: u64, window: u64) -> Result<(u64, u64), PaymentError> {
    let valid_before = now.checked_add(window).ok_or_else(|| {
        ConfigError::Invalid(format!(
            "authorization window of {window}s overflows the timestamp range"
        ))
    })?;
    Ok((now, valid_before))
}

/// Resolves the token's EIP-712 `(name, version)`.
///
/// Uses the override from `extra` when present, otherwise reads `name()` and
/// `version()` from the contract. A token without `version()` gets
/// [`DEFAULT_TOKEN_DOMAIN_VERSION`].
async fn token_domain<W>(
    wallet: &W,
    requirements: &PaymentRequirements,
) -> Result<(String, String), PaymentError>
where
    W: EvmWallet + ?Sized,
{
    if let Some(domain) = requirements.eip712_override() {
        return Ok((domain.name, domain.version));
    }

    let token = requirements.token_address;
    let raw_name = wallet
        .call(token, IERC20::nameCall {}.abi_encode().into())
        .await
        .map_err(PaymentError::ConstructionFailed)?;
    let name = IERC20::nameCall::abi_decode_returns(&raw_name).map_err(|e| {
        PaymentError::TokenDomainUnavailable {
            token,
            reason: format!("undecodable name(): {e}"),
        }
    })?;

    let version = match wallet
        .call(token, IERC20::versionCall {}.abi_encode().into())
        .await
    {
        Ok(raw) => IERC20::versionCall::abi_decode_returns(&raw)
            .unwrap_or_else(|_| DEFAULT_TOKEN_DOMAIN_VERSION.to_string()),
        Err(error) => {
            tracing::debug!(%token, %error, "token has no version(), using default");
            DEFAULT_TOKEN_DOMAIN_VERSION.to_string()
        }
    };
    Ok((name, version))
}

fn h402_domain(context: &SigningContext<'_>, verifying_contract: Option<Address>) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Borrowed(H402_DOMAIN_NAME)),
        Some(Cow::Owned(context.config.protocol_version.to_string())),
        Some(U256::from(context.chain_reference.inner())),
        verifying_contract,
        None,
    )
}

fn token_transfer_request(intent: &TransferIntent, token: Address) -> TransactionRequest {
    let data = IERC20::transferCall {
        to: intent.to,
        amount: intent.value,
    }
    .abi_encode();
    TransactionRequest {
        from: intent.from,
        to: token,
        value: U256::ZERO,
        data: data.into(),
    }
}

fn typed_data_request<T>(message: &T, domain: Eip712Domain) -> Result<TypedDataRequest, PaymentError>
where
    T: SolStruct + Serialize,
{
    Ok(TypedDataRequest {
        signing_hash: message.eip712_signing_hash(&domain),
        primary_type: T::NAME,
        encode_type: T::eip712_encode_type().into_owned(),
        message: serde_json::to_value(message)?,
        domain,
    })
}

async fn account_nonce<W>(wallet: &W, account: Address) -> Result<u64, PaymentError>
where
    W: EvmWallet + ?Sized,
{
    wallet
        .transaction_count(account)
        .await
        .map_err(PaymentError::ConstructionFailed)
}

enum SignOutcome {
    Signature(Bytes),
    Sent(FallbackTransfer),
}

/// Signs `request`, or sends `fallback` if the account cannot sign typed data.
async fn sign_or_send<W>(
    wallet: &W,
    request: &TypedDataRequest,
    fallback: &TransactionRequest,
    config: &ExactEvmClientConfig,
) -> Result<SignOutcome, PaymentError>
where
    W: EvmWallet + ?Sized,
{
    match wallet.sign_typed_data(request).await {
        Ok(signature) => Ok(SignOutcome::Signature(signature)),
        Err(WalletError::Unsupported(reason)) => {
            tracing::warn!(
                primary_type = request.primary_type,
                %reason,
                "typed-data signing unsupported, sending transaction instead"
            );
            send_and_confirm(wallet, fallback, config.confirmation_timeout)
                .await
                .map(SignOutcome::Sent)
        }
        Err(WalletError::Rejected(reason)) => Err(PaymentError::SignatureRejected(reason)),
        Err(other) => Err(PaymentError::ConstructionFailed(other)),
    }
}

/// Submits `request` and waits for it to be mined.
///
/// The hash is logged as soon as the node accepts the transaction. If the
/// returned future is dropped while waiting, the transaction stays in flight;
/// nothing here tries to replace or cancel it.
pub async fn send_and_confirm<W>(
    wallet: &W,
    request: &TransactionRequest,
    timeout: Option<Duration>,
) -> Result<FallbackTransfer, PaymentError>
where
    W: EvmWallet + ?Sized,
{
    let submitted = wallet
        .send_transaction(request)
        .await
        .map_err(|error| match error {
            WalletError::Rejected(reason) => PaymentError::SignatureRejected(reason),
            other => PaymentError::ConstructionFailed(other),
        })?;
    let transaction_hash = submitted.transaction_hash;
    tracing::info!(
        %transaction_hash,
        from = %request.from,
        to = %request.to,
        value = %request.value,
        "fallback transaction submitted"
    );

    let confirmation = wallet.wait_for_confirmation(transaction_hash);
    let confirmed = match timeout {
        Some(timeout) => match tokio::time::timeout(timeout, confirmation).await {
            Ok(confirmed) => confirmed,
            Err(_) => {
                tracing::warn!(%transaction_hash, ?timeout, "confirmation wait timed out");
                return Err(PaymentError::ConfirmationTimeout { transaction_hash });
            }
        },
        None => confirmation.await,
    };

    match confirmed {
        Ok(()) => {
            tracing::info!(%transaction_hash, "fallback transaction confirmed");
            Ok(FallbackTransfer {
                signature: submitted.signed_transaction,
                transaction_hash,
            })
        }
        Err(WalletError::Timeout(_)) => Err(PaymentError::ConfirmationTimeout { transaction_hash }),
        Err(other) => Err(PaymentError::ConstructionFailed(other)),
    }
}
