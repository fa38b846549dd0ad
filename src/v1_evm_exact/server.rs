//! Server-side price tag generation for the V1 EVM exact scheme.
//!
//! This module lets a resource server describe what a protected resource
//! costs, producing the [`PaymentRequirements`] that clients pay against.
//!
//! # Example
//!
//! ```ignore
//! use h402_chain_evm::{KnownNetworkEvm, USDC, V1EvmExact};
//!
//! let usdc = USDC::base();
//! let requirements = V1EvmExact::price_tag(
//!     "0x000000000000000000000000000000000000bEEF".parse().unwrap(),
//!     usdc.amount(10_000u64),
//!     "https://example.com/report",
//! );
//! ```

use alloy_primitives::Address;

use crate::V1EvmExact;
use crate::chain::EvmDeployedTokenAmount;
use crate::v1_evm_exact::types::PaymentRequirements;

/// Default `maxTimeoutSeconds` advertised in price tags.
pub const DEFAULT_MAX_TIMEOUT_SECONDS: u64 = 300;

impl V1EvmExact {
    /// Creates payment requirements for an EVM payment.
    ///
    /// The amount is expressed in the token's smallest unit. Token decimals
    /// are advertised so clients can display the price.
    ///
    /// # Parameters
    ///
    /// - `pay_to`: The recipient address
    /// - `asset`: The token deployment and amount required
    /// - `resource`: The URL being paid for
    pub fn price_tag(
        pay_to: Address,
        asset: EvmDeployedTokenAmount,
        resource: impl Into<String>,
    ) -> PaymentRequirements {
        let token = asset.token;
        let mut requirements = PaymentRequirements::exact(
            token.chain_reference,
            resource,
            pay_to,
            token.address,
            asset.amount,
        );
        requirements.max_timeout_seconds = Some(DEFAULT_MAX_TIMEOUT_SECONDS);
        requirements.token_decimals = Some(token.decimals);
        requirements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{EvmChainReference, EvmTokenDeployment, NATIVE_TOKEN_ADDRESS};
    use alloy_primitives::U256;

    #[test]
    fn test_price_tag_native() {
        let native = EvmTokenDeployment {
            chain_reference: EvmChainReference::new(56),
            address: NATIVE_TOKEN_ADDRESS,
            decimals: 18,
        };
        let pay_to = Address::repeat_byte(0x42);
        let requirements =
            V1EvmExact::price_tag(pay_to, native.parse("0.5").unwrap(), "https://a.test/x");
        assert_eq!(requirements.namespace, "evm");
        assert_eq!(requirements.network_id, "56");
        assert_eq!(requirements.pay_to_address, pay_to);
        assert_eq!(requirements.token_address, NATIVE_TOKEN_ADDRESS);
        assert_eq!(requirements.amount_required, "500000000000000000");
        assert_eq!(requirements.max_timeout_seconds, Some(300));
        assert_eq!(
            requirements.amount_in_smallest_unit().unwrap(),
            U256::from(500_000_000_000_000_000u64)
        );
    }
}
