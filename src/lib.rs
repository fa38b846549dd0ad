//! EVM support for the h402 pay-to-access protocol.
//!
//! This crate builds the payment proof a client attaches to a request for a
//! paid resource. Given the resource's payment requirements and a wallet, it
//! decides how the transfer should be expressed, obtains a signature (or, as a
//! last resort, broadcasts the transfer itself) and encodes the result into a
//! single transport string.
//!
//! # Architecture
//!
//! 1. **Probe** whether the token supports ERC-3009 `transferWithAuthorization`
//! 2. **Select** a signing strategy: native coin, authorization, or generic token transfer
//! 3. **Sign** an EIP-712 message, falling back to a sent transaction for
//!    accounts that cannot sign typed data
//! 4. **Encode** the payment envelope as base64url JSON
//!
//! # Feature Flags
//!
//! - `client` - Payment construction (strategies, probe, orchestrator)
//! - `server` - Price tag generation for protected resources
//!
//! # Usage
//!
//! ## Server: Creating a Price Tag
//!
//! ```ignore
//! use h402_chain_evm::{KnownNetworkEvm, USDC, V1EvmExact};
//!
//! let requirements = V1EvmExact::price_tag(
//!     pay_to,
//!     USDC::base().parse("0.01").unwrap(),
//!     "https://example.com/report",
//! );
//! ```
//!
//! ## Client: Paying for a Resource
//!
//! ```ignore
//! use h402_chain_evm::ExactEvmClient;
//! use h402_chain_evm::config::ExactEvmClientConfig;
//!
//! let client = ExactEvmClient::new(wallet, ExactEvmClientConfig::from_env()?);
//! let header = client.create_payment(&requirements).await?;
//! ```

pub mod chain;
pub mod config;
pub mod v1_evm_exact;

mod networks;
pub use networks::*;

pub use v1_evm_exact::V1EvmExact;
pub use v1_evm_exact::encoding::{decode_payment_payload, encode_payment_payload};
pub use v1_evm_exact::error::PaymentError;

#[cfg(feature = "client")]
pub use v1_evm_exact::client::ExactEvmClient;
