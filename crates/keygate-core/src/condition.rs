//! Access conditions: on-chain predicates the escrow network evaluates
//! before releasing a key

use alloy_json_abi::Function;
use alloy_primitives::Address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Token the escrow network replaces with the requesting caller's address
pub const USER_ADDRESS_PLACEHOLDER: &str = ":userAddress";

/// One entry of a condition's parameter list
///
/// Serialized as a bare string: placeholders carry a leading `:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionParam {
    /// Passed to the contract as-is
    Literal(String),
    /// Substituted by the escrow network at evaluation time (name without `:`)
    Placeholder(String),
}

impl ConditionParam {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// The requesting caller's on-chain address
    pub fn user_address() -> Self {
        Self::Placeholder(USER_ADDRESS_PLACEHOLDER[1..].to_string())
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    /// Wire form
    pub fn as_wire(&self) -> String {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Placeholder(name) => format!(":{name}"),
        }
    }
}

impl From<&str> for ConditionParam {
    fn from(value: &str) -> Self {
        match value.strip_prefix(':') {
            Some(name) if !name.is_empty() => Self::Placeholder(name.to_string()),
            _ => Self::Literal(value.to_string()),
        }
    }
}

impl Serialize for ConditionParam {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_wire())
    }
}

impl<'de> Deserialize<'de> for ConditionParam {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

/// Expected result of the predicate call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnValueTest {
    /// Path within the result; empty means the whole value
    pub key: String,
    pub comparator: String,
    pub value: String,
}

impl ReturnValueTest {
    /// The whole return value must equal boolean `true`
    pub fn boolean_true() -> Self {
        Self {
            key: String::new(),
            comparator: "=".into(),
            value: "true".into(),
        }
    }
}

/// A predicate over a single contract method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCondition {
    /// Checksummed contract address
    pub contract_address: String,
    /// Chain the predicate is evaluated on
    pub chain: String,
    /// Interface fragment so the call can be re-encoded without the full ABI
    pub function_abi: Function,
    pub function_name: String,
    pub function_params: Vec<ConditionParam>,
    pub return_value_test: ReturnValueTest,
}

impl AccessCondition {
    pub fn new(
        address: Address,
        chain: impl Into<String>,
        function: &Function,
        params: Vec<ConditionParam>,
        expected: ReturnValueTest,
    ) -> Self {
        Self {
            contract_address: address.to_checksum(None),
            chain: chain.into(),
            function_abi: function.clone(),
            function_name: function.name.clone(),
            function_params: params,
            return_value_test: expected,
        }
    }
}
