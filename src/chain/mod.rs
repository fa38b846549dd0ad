//! Core EVM chain types and the wallet interface.
//!
//! - [`EvmChainReference`] - Numeric chain id carried as `networkId`
//! - [`EvmTokenDeployment`] - Token deployment info and amount parsing
//! - [`NATIVE_TOKEN_ADDRESS`] - Sentinel address for the native coin
//! - [`EvmWallet`] - Account, signing and chain access used by the client

pub mod types;
pub use types::*;

pub mod wallet;
pub use wallet::*;
