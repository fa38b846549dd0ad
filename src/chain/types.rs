//! Wire format types for EVM chain interactions.
//!
//! This module provides types that handle serialization and deserialization
//! of EVM-specific values in the h402 protocol wire format.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use x402_types::chain::ChainId;

/// The namespace used by h402 for account-based EVM chains.
pub const EVM_NAMESPACE: &str = "evm";

/// Reserved token address that stands for the chain's native coin.
///
/// Requirements carrying this address ask for ETH, BNB, etc. instead of a
/// contract-based token.
pub const NATIVE_TOKEN_ADDRESS: Address = Address::ZERO;

/// Returns `true` if `token` is the native-asset sentinel.
pub fn is_native_token(token: &Address) -> bool {
    *token == NATIVE_TOKEN_ADDRESS
}

// ============================================================================
// EvmChainReference
// ============================================================================

/// An EVM chain reference, i.e. the numeric EIP-155 chain id.
///
/// On the wire this is the `networkId` field and is always a decimal string
/// (`"8453"`). Combined with the `evm` namespace it forms a chain id like
/// `evm:8453`.
///
/// # Example
///
/// ```
/// use h402_chain_evm::chain::EvmChainReference;
/// use x402_types::chain::ChainId;
///
/// let base = EvmChainReference::new(8453);
/// let chain_id: ChainId = base.into();
/// assert_eq!(chain_id.to_string(), "evm:8453");
/// ```
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct EvmChainReference(u64);

impl EvmChainReference {
    /// Creates a new chain reference from a numeric chain id.
    pub const fn new(chain_id: u64) -> Self {
        Self(chain_id)
    }

    /// Converts this chain reference to a [`ChainId`].
    pub fn as_chain_id(&self) -> ChainId {
        ChainId::new(EVM_NAMESPACE, self.0.to_string())
    }

    /// Returns the numeric chain id.
    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl Display for EvmChainReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<EvmChainReference> for ChainId {
    fn from(value: EvmChainReference) -> Self {
        value.as_chain_id()
    }
}

impl From<&EvmChainReference> for ChainId {
    fn from(value: &EvmChainReference) -> Self {
        value.as_chain_id()
    }
}

impl TryFrom<&ChainId> for EvmChainReference {
    type Error = EvmChainReferenceFormatError;

    fn try_from(value: &ChainId) -> Result<Self, Self::Error> {
        if value.namespace != EVM_NAMESPACE {
            return Err(EvmChainReferenceFormatError::InvalidNamespace(
                value.namespace.clone(),
            ));
        }
        EvmChainReference::from_str(&value.reference)
    }
}

impl TryFrom<ChainId> for EvmChainReference {
    type Error = EvmChainReferenceFormatError;

    fn try_from(value: ChainId) -> Result<Self, Self::Error> {
        EvmChainReference::try_from(&value)
    }
}

impl FromStr for EvmChainReference {
    type Err = EvmChainReferenceFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EvmChainReferenceFormatError::InvalidReference(
                s.to_string(),
            ));
        }
        s.parse::<u64>()
            .map(EvmChainReference)
            .map_err(|_| EvmChainReferenceFormatError::InvalidReference(s.to_string()))
    }
}

impl Serialize for EvmChainReference {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for EvmChainReference {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error returned when converting a namespace/network pair to an [`EvmChainReference`].
#[derive(Debug, thiserror::Error)]
pub enum EvmChainReferenceFormatError {
    /// The namespace is not `evm`.
    #[error("Invalid namespace {0}, expected evm")]
    InvalidNamespace(String),
    /// The network id is not a decimal chain id.
    #[error("Invalid network id {0}, expected a decimal chain id")]
    InvalidReference(String),
}

// ============================================================================
// EvmTokenDeployment
// ============================================================================

/// Information about a token deployment on an EVM chain.
///
/// Native coins are described with [`NATIVE_TOKEN_ADDRESS`] as their address.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct EvmTokenDeployment {
    /// The chain the token lives on.
    pub chain_reference: EvmChainReference,
    /// The token contract address, or the native sentinel.
    pub address: Address,
    /// Number of decimal places for the token (e.g., 6 for USDC).
    pub decimals: u8,
}

/// A token amount paired with its deployment information.
#[derive(Debug, Clone)]
pub struct EvmDeployedTokenAmount {
    /// The amount in the token's smallest unit.
    pub amount: U256,
    /// The token deployment this amount refers to.
    pub token: EvmTokenDeployment,
}

impl EvmTokenDeployment {
    /// Creates a token amount from a raw value already in the smallest unit.
    pub fn amount(&self, v: impl Into<U256>) -> EvmDeployedTokenAmount {
        EvmDeployedTokenAmount {
            amount: v.into(),
            token: self.clone(),
        }
    }

    /// Parses a human-readable amount string (`"10.50"`, `"1000"`) into token units.
    pub fn parse(&self, v: &str) -> Result<EvmDeployedTokenAmount, EvmAmountParseError> {
        Ok(EvmDeployedTokenAmount {
            amount: parse_units(v, self.decimals)?,
            token: self.clone(),
        })
    }

    /// Whether this deployment describes the chain's native coin.
    pub fn is_native(&self) -> bool {
        is_native_token(&self.address)
    }
}

/// Scales a human-readable decimal string by `10^decimals`.
///
/// # Errors
///
/// Fails on non-digit input, more fractional digits than `decimals`,
/// or a result that does not fit into 256 bits.
pub fn parse_units(v: &str, decimals: u8) -> Result<U256, EvmAmountParseError> {
    let (whole, frac) = match v.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (v, ""),
    };
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() || !is_digits(whole) || !is_digits(frac) {
        return Err(EvmAmountParseError::InvalidFormat(v.to_string()));
    }

    let frac_len = frac.len();
    if frac_len > decimals as usize {
        return Err(EvmAmountParseError::TooManyDecimals {
            got: frac_len as u32,
            max: decimals,
        });
    }

    let whole_val = U256::from_str(whole).map_err(|_| EvmAmountParseError::Overflow)?;
    let frac_val = if frac.is_empty() {
        U256::ZERO
    } else {
        U256::from_str(frac).map_err(|_| EvmAmountParseError::Overflow)?
    };

    let ten = U256::from(10u8);
    let scale = ten
        .checked_pow(U256::from(decimals))
        .ok_or(EvmAmountParseError::Overflow)?;
    let frac_scale = ten
        .checked_pow(U256::from(decimals as usize - frac_len))
        .ok_or(EvmAmountParseError::Overflow)?;

    whole_val
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac_val.checked_mul(frac_scale)?))
        .ok_or(EvmAmountParseError::Overflow)
}

/// Error returned when parsing a token amount.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EvmAmountParseError {
    /// The input string is not a valid decimal number.
    #[error("Invalid amount format: {0}")]
    InvalidFormat(String),
    /// Too many decimal places for the token.
    #[error("Too many decimal places: got {got}, max {max}")]
    TooManyDecimals { got: u32, max: u8 },
    /// The resulting amount overflows 256 bits.
    #[error("Amount overflow")]
    Overflow,
}

// ============================================================================
// Decimal string serde
// ============================================================================

/// Serde helpers that write integers as decimal strings.
///
/// Token amounts and timestamps are 256-bit or 64-bit values that do not
/// survive a round trip through JavaScript numbers, so the wire format keeps
/// them as strings. Deserialization also accepts plain JSON integers.
pub mod decimal {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt::{self, Display};
    use std::marker::PhantomData;
    use std::str::FromStr;

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DecimalVisitor(PhantomData))
    }

    struct DecimalVisitor<T>(PhantomData<T>);

    impl<T> DecimalVisitor<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        fn parse<E: de::Error>(v: &str) -> Result<T, E> {
            if v.is_empty() || !v.bytes().all(|b| b.is_ascii_digit()) {
                return Err(E::custom(format!("expected a decimal integer, got '{v}'")));
            }
            v.parse().map_err(E::custom)
        }
    }

    impl<'de, T> Visitor<'de> for DecimalVisitor<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        type Value = T;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a decimal integer string or an unsigned integer")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
            Self::parse(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<T, E> {
            Self::parse(&v.to_string())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
