//! Type definitions for the V1 EVM "exact" payment scheme.
//!
//! This module defines the h402 wire format: the requirements a protected
//! resource advertises, the payment envelope a client sends back, and the
//! intermediate results produced by the signing strategies.

use std::fmt;

use alloy_primitives::{Address, B256, Bytes, TxHash, U256};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::chain::{EvmAmountParseError, EvmChainReference, decimal, parse_units};

#[cfg(feature = "client")]
use alloy_sol_types::sol;

/// String literal for the "exact" scheme name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExactScheme;

impl AsRef<str> for ExactScheme {
    fn as_ref(&self) -> &str {
        "exact"
    }
}

impl std::fmt::Display for ExactScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "exact")
    }
}

impl Serialize for ExactScheme {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str("exact")
    }
}

impl<'de> Deserialize<'de> for ExactScheme {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s == "exact" {
            Ok(ExactScheme)
        } else {
            Err(serde::de::Error::custom(format!(
                "expected 'exact', got '{s}'"
            )))
        }
    }
}

// ============================================================================
// Requirements
// ============================================================================

/// How `amountRequired` is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AmountFormat {
    /// An integer in the token's smallest unit (wei, 10^-6 USDC, ...).
    #[default]
    SmallestUnit,
    /// A decimal string scaled by `tokenDecimals`.
    HumanReadable,
}

impl AmountFormat {
    fn is_default(&self) -> bool {
        *self == AmountFormat::SmallestUnit
    }
}

/// Payment requirements advertised by a protected resource.
///
/// Read-only input to the client. `token_address` equal to
/// [`NATIVE_TOKEN_ADDRESS`](crate::chain::NATIVE_TOKEN_ADDRESS) asks for the
/// chain's native coin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    pub scheme: ExactScheme,
    pub namespace: String,
    pub network_id: String,
    pub resource: String,
    pub pay_to_address: Address,
    /// Decimal string, or a JSON integer that fits in a `u64`. Larger or
    /// fractional amounts must be sent as strings.
    #[serde(deserialize_with = "amount_text")]
    pub amount_required: String,
    pub token_address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_timeout_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "AmountFormat::is_default")]
    pub amount_required_format: AmountFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_decimals: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Free-form extension data. `name` and `version` override the token's
    /// EIP-712 domain for authorization signing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl PaymentRequirements {
    /// Creates "exact" requirements for `amount` smallest units of `token`.
    pub fn exact(
        chain_reference: EvmChainReference,
        resource: impl Into<String>,
        pay_to_address: Address,
        token_address: Address,
        amount: U256,
    ) -> Self {
        Self {
            scheme: ExactScheme,
            namespace: crate::chain::EVM_NAMESPACE.to_string(),
            network_id: chain_reference.to_string(),
            resource: resource.into(),
            pay_to_address,
            amount_required: amount.to_string(),
            token_address,
            max_timeout_seconds: None,
            amount_required_format: AmountFormat::SmallestUnit,
            token_decimals: None,
            token_symbol: None,
            description: None,
            mime_type: None,
            extra: None,
        }
    }

    /// Resolves `amountRequired` to the token's smallest unit.
    pub fn amount_in_smallest_unit(&self) -> Result<U256, EvmAmountParseError> {
        match self.amount_required_format {
            AmountFormat::SmallestUnit => parse_units(&self.amount_required, 0),
            AmountFormat::HumanReadable => {
                let decimals = self.token_decimals.ok_or_else(|| {
                    EvmAmountParseError::InvalidFormat(format!(
                        "{} (tokenDecimals is required for humanReadable amounts)",
                        self.amount_required
                    ))
                })?;
                parse_units(&self.amount_required, decimals)
            }
        }
    }

    /// The EIP-712 domain override carried in `extra`, if any.
    pub fn eip712_override(&self) -> Option<Eip712DomainOverride> {
        let extra = self.extra.as_ref()?;
        serde_json::from_value(extra.clone()).ok()
    }
}

fn amount_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(AmountTextVisitor)
}

struct AmountTextVisitor;

impl AmountTextVisitor {
    const NUMBER_HINT: &'static str =
        "amountRequired above u64::MAX or fractional must be a decimal string";
}

impl<'de> Visitor<'de> for AmountTextVisitor {
    type Value = String;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a decimal string or an unsigned integer amount")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<String, E> {
        Ok(value)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<String, E> {
        u64::try_from(value)
            .map(|value| value.to_string())
            .map_err(|_| E::custom(format!("amountRequired must not be negative, got {value}")))
    }

    fn visit_u128<E: de::Error>(self, _value: u128) -> Result<String, E> {
        Err(E::custom(Self::NUMBER_HINT))
    }

    fn visit_f64<E: de::Error>(self, _value: f64) -> Result<String, E> {
        Err(E::custom(Self::NUMBER_HINT))
    }
}

/// Token EIP-712 domain parameters supplied by the resource server.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip712DomainOverride {
    pub name: String,
    pub version: String,
}

/// The address/amount triple common to every transfer mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferIntent {
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

// ============================================================================
// Signing results
// ============================================================================

/// Outcome of a signing strategy.
///
/// Either a detachable proof of intent, or a transfer that already
/// happened on-chain because the account could not sign typed data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningResult {
    Signed(SignedTransfer),
    Fallback(FallbackTransfer),
}

/// Mechanism-specific fields of an unbroadcast, signed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignedTransfer {
    Native {
        signature: Bytes,
        nonce: u64,
    },
    Authorization {
        signature: Bytes,
        valid_after: u64,
        valid_before: u64,
        nonce: B256,
        version: String,
    },
    Token {
        signature: Bytes,
        nonce: u64,
        data: Bytes,
    },
}

/// A transfer that was submitted and mined by the payer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackTransfer {
    /// The signed raw transaction, when the wallet exposes it.
    pub signature: Option<Bytes>,
    pub transaction_hash: TxHash,
}

// ============================================================================
// Payment payload
// ============================================================================

/// The payment envelope sent to the facilitator.
///
/// Field order is part of the wire contract, see
/// [`encoding`](crate::v1_evm_exact::encoding).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub version: u8,
    pub scheme: ExactScheme,
    pub namespace: String,
    pub network_id: String,
    pub resource: String,
    pub payload: ExactEvmPayload,
}

/// Mechanism-specific payload, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExactEvmPayload {
    NativeTransfer(NativeTransferPayload),
    Authorization(AuthorizationPayload),
    TokenTransfer(TokenTransferPayload),
    SignAndSendTransaction(SignAndSendTransactionPayload),
}

impl ExactEvmPayload {
    /// The wire tag of this variant.
    pub fn kind(&self) -> &'static str {
        match self {
            ExactEvmPayload::NativeTransfer(_) => "nativeTransfer",
            ExactEvmPayload::Authorization(_) => "authorization",
            ExactEvmPayload::TokenTransfer(_) => "tokenTransfer",
            ExactEvmPayload::SignAndSendTransaction(_) => "signAndSendTransaction",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeTransferPayload {
    pub signature: Bytes,
    pub transaction: TransferTransaction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationPayload {
    pub signature: Bytes,
    pub authorization: TransferAuthorization,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransferPayload {
    pub signature: Bytes,
    pub transaction: TransferTransaction,
}

/// The single fallback shape, whichever strategy produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignAndSendTransactionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_message: Option<Bytes>,
    pub transaction_hash: TxHash,
}

/// A signed transfer description (native coin or token call).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferTransaction {
    pub from: Address,
    pub to: Address,
    #[serde(with = "decimal")]
    pub value: U256,
    pub nonce: u64,
    /// ABI-encoded token call data; absent for native transfers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
}

/// ERC-3009 authorization fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferAuthorization {
    pub from: Address,
    pub to: Address,
    #[serde(with = "decimal")]
    pub value: U256,
    #[serde(with = "decimal")]
    pub valid_after: u64,
    #[serde(with = "decimal")]
    pub valid_before: u64,
    pub nonce: B256,
    /// EIP-712 domain version of the token contract.
    pub version: String,
}

// ============================================================================
// Solidity bindings
// ============================================================================

#[cfg(feature = "client")]
sol!(
    /// ERC-3009 `TransferWithAuthorization` as signed with EIP-712.
    #[derive(Serialize, Deserialize)]
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
);

#[cfg(feature = "client")]
sol!(
    /// Intent to send native coin, signed under the h402 domain.
    #[derive(Serialize, Deserialize)]
    struct NativeTransfer {
        address from;
        address to;
        uint256 value;
        uint256 nonce;
    }
);

#[cfg(feature = "client")]
sol!(
    /// Intent to execute a token call, signed under the h402 domain bound to the token.
    #[derive(Serialize, Deserialize)]
    struct TokenTransfer {
        address from;
        address to;
        uint256 value;
        uint256 nonce;
        bytes data;
    }
);

#[cfg(feature = "client")]
sol! {
    /// The ERC-20 subset used to build transfers and read the EIP-712 domain.
    #[allow(missing_docs)]
    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
        function name() external view returns (string);
        function version() external view returns (string);
    }
}

#[cfg(feature = "client")]
sol! {
    /// ERC-3009 entry point whose presence is probed on token contracts.
    #[allow(missing_docs)]
    interface IERC3009 {
        function transferWithAuthorization(
            address from,
            address to,
            uint256 value,
            uint256 validAfter,
            uint256 validBefore,
            bytes32 nonce,
            uint8 v,
            bytes32 r,
            bytes32 s
        ) external;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256, bytes};

    fn requirements_json() -> &'static str {
        r#"{
            "scheme": "exact",
            "namespace": "evm",
            "networkId": "8453",
            "resource": "https://example.com/image",
            "payToAddress": "0x000000000000000000000000000000000000bEEF",
            "amountRequired": 100,
            "tokenAddress": "0x0000000000000000000000000000000000000000"
        }"#
    }

    #[test]
    fn test_exact_scheme_serde() {
        let json = serde_json::to_string(&ExactScheme).unwrap();
        assert_eq!(json, "\"exact\"");
        assert!(serde_json::from_str::<ExactScheme>("\"upto\"").is_err());
    }

    #[test]
    fn test_requirements_accepts_numeric_amount() {
        let requirements: PaymentRequirements =
            serde_json::from_str(requirements_json()).unwrap();
        assert_eq!(requirements.amount_required, "100");
        assert_eq!(
            requirements.amount_in_smallest_unit().unwrap(),
            U256::from(100u64)
        );
        assert_eq!(requirements.max_timeout_seconds, None);
        assert_eq!(requirements.amount_required_format, AmountFormat::SmallestUnit);
    }

    #[test]
    fn test_requirements_rejects_numbers_beyond_u64() {
        for amount in ["18446744073709551616", "1e30", "1.5"] {
            let json = requirements_json().replace("100", amount);
            let err = serde_json::from_str::<PaymentRequirements>(&json).unwrap_err();
            assert!(err.to_string().contains("decimal string"), "{err}");
        }
        let json = requirements_json().replace("100", "-1");
        let err = serde_json::from_str::<PaymentRequirements>(&json).unwrap_err();
        assert!(err.to_string().contains("negative"), "{err}");

        let json = requirements_json().replace("100", "\"18446744073709551616\"");
        let requirements: PaymentRequirements = serde_json::from_str(&json).unwrap();
        assert_eq!(
            requirements.amount_in_smallest_unit().unwrap(),
            U256::from(u64::MAX) + U256::from(1u64)
        );
    }

    #[test]
    fn test_requirements_human_readable_amount() {
        let mut requirements: PaymentRequirements =
            serde_json::from_str(requirements_json()).unwrap();
        requirements.amount_required = "0.25".to_string();
        requirements.amount_required_format = AmountFormat::HumanReadable;
        assert!(requirements.amount_in_smallest_unit().is_err());

        requirements.token_decimals = Some(6);
        assert_eq!(
            requirements.amount_in_smallest_unit().unwrap(),
            U256::from(250_000u64)
        );
    }

    #[test]
    fn test_requirements_smallest_unit_rejects_fraction() {
        let mut requirements: PaymentRequirements =
            serde_json::from_str(requirements_json()).unwrap();
        requirements.amount_required = "1.5".to_string();
        assert!(requirements.amount_in_smallest_unit().is_err());
    }

    #[test]
    fn test_requirements_serialization_omits_defaults() {
        let requirements: PaymentRequirements =
            serde_json::from_str(requirements_json()).unwrap();
        let json = serde_json::to_value(&requirements).unwrap();
        assert_eq!(json["amountRequired"], "100");
        assert!(json.get("maxTimeoutSeconds").is_none());
        assert!(json.get("amountRequiredFormat").is_none());
        assert!(json.get("extra").is_none());
    }

    #[test]
    fn test_eip712_override_from_extra() {
        let mut requirements: PaymentRequirements =
            serde_json::from_str(requirements_json()).unwrap();
        assert!(requirements.eip712_override().is_none());
        requirements.extra = Some(serde_json::json!({"name": "USD Coin", "version": "2"}));
        assert_eq!(
            requirements.eip712_override(),
            Some(Eip712DomainOverride {
                name: "USD Coin".to_string(),
                version: "2".to_string(),
            })
        );
    }

    #[test]
    fn test_payload_tags() {
        let payload = ExactEvmPayload::SignAndSendTransaction(SignAndSendTransactionPayload {
            signed_message: None,
            transaction_hash: b256!(
                "0x1111111111111111111111111111111111111111111111111111111111111111"
            ),
        });
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "signAndSendTransaction");
        assert_eq!(payload.kind(), "signAndSendTransaction");
        assert!(json.get("signedMessage").is_none());
    }

    #[test]
    fn test_authorization_scalars_are_strings() {
        let payload = ExactEvmPayload::Authorization(AuthorizationPayload {
            signature: bytes!("0xdeadbeef"),
            authorization: TransferAuthorization {
                from: address!("0x00000000000000000000000000000000000000aa"),
                to: address!("0x000000000000000000000000000000000000bEEF"),
                value: U256::from(1_000_000u64),
                valid_after: 1_700_000_000,
                valid_before: 1_700_000_300,
                nonce: B256::repeat_byte(0x42),
                version: "2".to_string(),
            },
        });
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "authorization");
        assert_eq!(json["authorization"]["value"], "1000000");
        assert_eq!(json["authorization"]["validAfter"], "1700000000");
        assert_eq!(json["authorization"]["validBefore"], "1700000300");
        assert_eq!(json["signature"], "0xdeadbeef");
        let back: ExactEvmPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }
}
