//! Known EVM networks and token deployments.
//!
//! This module provides convenient methods to get chain identifiers and token
//! deployment information for well-known EVM networks.

use alloy_primitives::address;
use x402_types::chain::ChainId;

use crate::chain::{EvmChainReference, EvmTokenDeployment, NATIVE_TOKEN_ADDRESS};

/// Trait providing convenient methods for well-known EVM networks.
///
/// This trait can be implemented for any type to provide static methods that create
/// instances for well-known EVM networks.
///
/// # Example
///
/// ```ignore
/// use h402_chain_evm::KnownNetworkEvm;
/// use x402_types::chain::ChainId;
///
/// let base: ChainId = ChainId::base();
/// assert_eq!(base.to_string(), "evm:8453");
/// ```
pub trait KnownNetworkEvm<A> {
    /// Returns the instance for Base mainnet (evm:8453).
    fn base() -> A;
    /// Returns the instance for Base Sepolia (evm:84532).
    fn base_sepolia() -> A;
    /// Returns the instance for BNB Smart Chain (evm:56).
    fn bsc() -> A;
    /// Returns the instance for Ethereum mainnet (evm:1).
    fn ethereum() -> A;
}

impl KnownNetworkEvm<EvmChainReference> for EvmChainReference {
    fn base() -> EvmChainReference {
        EvmChainReference::new(8453)
    }

    fn base_sepolia() -> EvmChainReference {
        EvmChainReference::new(84532)
    }

    fn bsc() -> EvmChainReference {
        EvmChainReference::new(56)
    }

    fn ethereum() -> EvmChainReference {
        EvmChainReference::new(1)
    }
}

impl KnownNetworkEvm<ChainId> for ChainId {
    fn base() -> ChainId {
        EvmChainReference::base().into()
    }

    fn base_sepolia() -> ChainId {
        EvmChainReference::base_sepolia().into()
    }

    fn bsc() -> ChainId {
        EvmChainReference::bsc().into()
    }

    fn ethereum() -> ChainId {
        EvmChainReference::ethereum().into()
    }
}

/// Chain references of every network listed in [`KnownNetworkEvm`].
pub fn known_evm_chains() -> Vec<EvmChainReference> {
    vec![
        EvmChainReference::base(),
        EvmChainReference::base_sepolia(),
        EvmChainReference::bsc(),
        EvmChainReference::ethereum(),
    ]
}

/// Marker type for USDC deployments.
pub struct USDC;

impl KnownNetworkEvm<EvmTokenDeployment> for USDC {
    fn base() -> EvmTokenDeployment {
        EvmTokenDeployment {
            chain_reference: EvmChainReference::base(),
            address: address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
            decimals: 6,
        }
    }

    fn base_sepolia() -> EvmTokenDeployment {
        EvmTokenDeployment {
            chain_reference: EvmChainReference::base_sepolia(),
            address: address!("0x036CbD53842c5426634e7929541eC2318f3dCF7e"),
            decimals: 6,
        }
    }

    // Binance-Peg USDC uses 18 decimals.
    fn bsc() -> EvmTokenDeployment {
        EvmTokenDeployment {
            chain_reference: EvmChainReference::bsc(),
            address: address!("0x8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d"),
            decimals: 18,
        }
    }

    fn ethereum() -> EvmTokenDeployment {
        EvmTokenDeployment {
            chain_reference: EvmChainReference::ethereum(),
            address: address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
            decimals: 6,
        }
    }
}

/// Marker type for the chain's native coin (ETH, BNB).
pub struct NativeCoin;

impl KnownNetworkEvm<EvmTokenDeployment> for NativeCoin {
    fn base() -> EvmTokenDeployment {
        Self::on(EvmChainReference::base())
    }

    fn base_sepolia() -> EvmTokenDeployment {
        Self::on(EvmChainReference::base_sepolia())
    }

    fn bsc() -> EvmTokenDeployment {
        Self::on(EvmChainReference::bsc())
    }

    fn ethereum() -> EvmTokenDeployment {
        Self::on(EvmChainReference::ethereum())
    }
}

impl NativeCoin {
    /// The native coin of any EVM chain; all supported chains use 18 decimals.
    pub fn on(chain_reference: EvmChainReference) -> EvmTokenDeployment {
        EvmTokenDeployment {
            chain_reference,
            address: NATIVE_TOKEN_ADDRESS,
            decimals: 18,
        }
    }
}
