//! Chain capability probing.
//!
//! Whether a token supports ERC-3009 is decided by calling the
//! `transferWithAuthorization` selector with no arguments. Any successful
//! return counts as support. Every failure counts as "unsupported".

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;

use crate::chain::EvmWallet;
use crate::v1_evm_exact::types::IERC3009;

/// Selector of ERC-3009 `transferWithAuthorization(address,address,uint256,uint256,uint256,bytes32,uint8,bytes32,bytes32)`.
pub const TRANSFER_WITH_AUTHORIZATION_SELECTOR: [u8; 4] =
    IERC3009::transferWithAuthorizationCall::SELECTOR;

/// Best-effort check that `token` exposes the entry point behind `selector`.
///
/// Issues a read-only call whose data is the bare selector. A successful call
/// returns `true` regardless of the returned bytes. Reverts, decode failures and
/// transport errors all return `false`; this function never fails.
pub async fn probe_authorization_support<W>(wallet: &W, token: Address, selector: [u8; 4]) -> bool
where
    W: EvmWallet + ?Sized,
{
    match wallet.call(token, Bytes::copy_from_slice(&selector)).await {
        Ok(_) => {
            tracing::debug!(%token, selector = %Bytes::copy_from_slice(&selector), "authorization probe succeeded");
            true
        }
        Err(error) => {
            tracing::debug!(%token, %error, "authorization probe failed, treating as unsupported");
            false
        }
    }
}
