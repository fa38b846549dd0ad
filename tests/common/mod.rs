//! A scripted in-memory wallet for driving the payment client in tests.
//!
//! Signatures come from a real secp256k1 key so tests can recover the signer.
//! Contract calls, typed-data support and confirmation behaviour are scripted
//! per test, and every network-bound request is recorded.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::{Address, B256, Bytes, Signature, TxHash, U256, address, keccak256};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use h402_chain_evm::chain::{
    EvmChainReference, EvmWallet, SubmittedTransaction, TransactionRequest, TypedDataRequest,
    WalletError,
};
use h402_chain_evm::v1_evm_exact::probe::TRANSFER_WITH_AUTHORIZATION_SELECTOR;
use h402_chain_evm::v1_evm_exact::{IERC20, PaymentRequirements};

/// How the wallet answers typed-data signing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypedDataMode {
    Sign,
    Unsupported,
    Reject,
}

/// How the wallet answers confirmation waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationMode {
    Confirmed,
    Pending,
    Reverted,
}

/// A network-bound request observed by the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletCall {
    Call { to: Address, data: Bytes },
    SignTypedData { primary_type: &'static str },
    SendTransaction(TransactionRequest),
    WaitForConfirmation(TxHash),
    TransactionCount(Address),
}

pub struct ScriptedWallet {
    signer: PrivateKeySigner,
    has_account: bool,
    typed_data: TypedDataMode,
    confirmation: ConfirmationMode,
    nonce: u64,
    authorization_tokens: HashSet<Address>,
    token_domains: HashMap<Address, (String, Option<String>)>,
    call_failure: Option<WalletError>,
    sent: AtomicU64,
    calls: Mutex<Vec<WalletCall>>,
    typed_data_requests: Mutex<Vec<TypedDataRequest>>,
}

impl ScriptedWallet {
    pub fn new() -> Self {
        Self {
            signer: PrivateKeySigner::random(),
            has_account: true,
            typed_data: TypedDataMode::Sign,
            confirmation: ConfirmationMode::Confirmed,
            nonce: 0,
            authorization_tokens: HashSet::new(),
            token_domains: HashMap::new(),
            call_failure: None,
            sent: AtomicU64::new(0),
            calls: Mutex::new(Vec::new()),
            typed_data_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn without_account(mut self) -> Self {
        self.has_account = false;
        self
    }

    pub fn with_typed_data(mut self, mode: TypedDataMode) -> Self {
        self.typed_data = mode;
        self
    }

    pub fn with_confirmation(mut self, mode: ConfirmationMode) -> Self {
        self.confirmation = mode;
        self
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Makes `token` answer the ERC-3009 probe and expose `name()`/`version()`.
    pub fn with_authorization_token(
        mut self,
        token: Address,
        name: &str,
        version: Option<&str>,
    ) -> Self {
        self.authorization_tokens.insert(token);
        self.token_domains
            .insert(token, (name.to_string(), version.map(str::to_string)));
        self
    }

    /// Makes every read-only call fail with `error`, as an unreachable node would.
    pub fn with_call_failure(mut self, error: WalletError) -> Self {
        self.call_failure = Some(error);
        self
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn calls(&self) -> Vec<WalletCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn typed_data_requests(&self) -> Vec<TypedDataRequest> {
        self.typed_data_requests.lock().unwrap().clone()
    }

    pub fn probe_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| {
                matches!(call, WalletCall::Call { data, .. }
                    if &data[..] == TRANSFER_WITH_AUTHORIZATION_SELECTOR.as_slice())
            })
            .count()
    }

    fn record(&self, call: WalletCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl EvmWallet for ScriptedWallet {
    fn account(&self) -> Option<Address> {
        self.has_account.then(|| self.signer.address())
    }

    async fn sign_typed_data(&self, request: &TypedDataRequest) -> Result<Bytes, WalletError> {
        self.record(WalletCall::SignTypedData {
            primary_type: request.primary_type,
        });
        self.typed_data_requests.lock().unwrap().push(request.clone());
        match self.typed_data {
            TypedDataMode::Sign => {
                let signature = self
                    .signer
                    .sign_hash(&request.signing_hash)
                    .await
                    .map_err(|e| WalletError::Transport(e.to_string()))?;
                Ok(Bytes::copy_from_slice(&signature.as_bytes()))
            }
            TypedDataMode::Unsupported => Err(WalletError::Unsupported(
                "smart account cannot sign typed data".to_string(),
            )),
            TypedDataMode::Reject => Err(WalletError::Rejected("user denied".to_string())),
        }
    }

    async fn send_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<SubmittedTransaction, WalletError> {
        self.record(WalletCall::SendTransaction(request.clone()));
        let sequence = self.sent.fetch_add(1, Ordering::SeqCst);
        let raw = [
            request.to.as_slice(),
            request.value.to_be_bytes::<32>().as_slice(),
            &request.data[..],
            sequence.to_be_bytes().as_slice(),
        ]
        .concat();
        Ok(SubmittedTransaction {
            transaction_hash: keccak256(&raw),
            signed_transaction: Some(Bytes::from(raw)),
        })
    }

    async fn wait_for_confirmation(&self, transaction_hash: TxHash) -> Result<(), WalletError> {
        self.record(WalletCall::WaitForConfirmation(transaction_hash));
        match self.confirmation {
            ConfirmationMode::Confirmed => Ok(()),
            ConfirmationMode::Pending => std::future::pending().await,
            ConfirmationMode::Reverted => {
                Err(WalletError::Reverted("transfer amount exceeds balance".to_string()))
            }
        }
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, WalletError> {
        self.record(WalletCall::Call {
            to,
            data: data.clone(),
        });
        if let Some(error) = &self.call_failure {
            return Err(error.clone());
        }
        let selector = data.get(..4).unwrap_or_default();
        if selector == TRANSFER_WITH_AUTHORIZATION_SELECTOR.as_slice() {
            return if self.authorization_tokens.contains(&to) {
                Ok(Bytes::new())
            } else {
                Err(WalletError::Reverted("function selector not recognized".to_string()))
            };
        }
        let Some((name, version)) = self.token_domains.get(&to) else {
            return Err(WalletError::Reverted("no code at address".to_string()));
        };
        if selector == IERC20::nameCall::SELECTOR.as_slice() {
            return Ok((name.clone(),).abi_encode_params().into());
        }
        if selector == IERC20::versionCall::SELECTOR.as_slice() {
            return match version {
                Some(version) => Ok((version.clone(),).abi_encode_params().into()),
                None => Err(WalletError::Reverted("execution reverted".to_string())),
            };
        }
        Err(WalletError::Reverted("unexpected call".to_string()))
    }

    async fn transaction_count(&self, account: Address) -> Result<u64, WalletError> {
        self.record(WalletCall::TransactionCount(account));
        Ok(self.nonce)
    }
}

/// Recovers the address that produced `signature` over `hash`.
pub fn recover(signature: &Bytes, hash: B256) -> Address {
    let signature = Signature::try_from(&signature[..]).unwrap();
    signature.recover_address_from_prehash(&hash).unwrap()
}

pub const PAY_TO: Address = address!("0x000000000000000000000000000000000000bEEF");

pub const TOKEN: Address = address!("0x7777777777777777777777777777777777777777");

pub fn native_requirements(amount: u64) -> PaymentRequirements {
    PaymentRequirements::exact(
        EvmChainReference::new(8453),
        "https://example.com/image",
        PAY_TO,
        Address::ZERO,
        U256::from(amount),
    )
}

pub fn token_requirements(amount: u64) -> PaymentRequirements {
    PaymentRequirements::exact(
        EvmChainReference::new(8453),
        "https://example.com/image",
        PAY_TO,
        TOKEN,
        U256::from(amount),
    )
}
