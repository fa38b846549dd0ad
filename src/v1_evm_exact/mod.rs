//! V1 EVM "exact" payment scheme implementation.
//!
//! This module implements the h402 "exact" scheme for EVM chains. The payer
//! proves intent to send exactly `amountRequired` to `payToAddress`, using
//! whichever mechanism the token and the account support.
//!
//! # Payment Model
//!
//! 1. Native coin: an EIP-712 `NativeTransfer` intent under the `h402` domain
//! 2. ERC-3009 tokens: a `TransferWithAuthorization` signed under the token's
//!    own domain, settled gaslessly by the facilitator
//! 3. Any other ERC-20: an EIP-712 `TokenTransfer` intent wrapping a
//!    `transfer(address,uint256)` call
//!
//! Accounts that cannot sign typed data send the equivalent transaction
//! themselves; the payload then carries the mined transaction hash.
//!
//! # Usage
//!
//! ```ignore
//! use h402_chain_evm::{ExactEvmClient, V1EvmExact};
//! use h402_chain_evm::config::ExactEvmClientConfig;
//!
//! let client = ExactEvmClient::new(wallet, ExactEvmClientConfig::default());
//! let header = client.create_payment(&requirements).await?;
//! ```

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "client")]
pub use client::*;

#[cfg(feature = "client")]
pub mod probe;
#[cfg(feature = "client")]
pub mod strategy;

pub mod encoding;
pub use encoding::*;

pub mod error;
pub use error::*;

pub mod types;
pub use types::*;

use x402_types::scheme::X402SchemeId;

use crate::chain::EVM_NAMESPACE;

/// The V1 EVM "exact" payment scheme.
///
/// Serves as the scheme identifier and as the factory for price tags.
pub struct V1EvmExact;

impl X402SchemeId for V1EvmExact {
    fn x402_version(&self) -> u8 {
        crate::config::H402_VERSION
    }

    fn namespace(&self) -> &str {
        EVM_NAMESPACE
    }

    fn scheme(&self) -> &str {
        ExactScheme.as_ref()
    }
}
