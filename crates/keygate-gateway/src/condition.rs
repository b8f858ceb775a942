//! Access condition construction from registry bindings

use keygate_core::{AccessCondition, ConditionParam, ReturnValueTest};
use keygate_registry::ContractBinding;

use crate::error::{GatewayError, Result};

/// Build a predicate over `binding.method`. No I/O.
pub fn build_condition(
    binding: &ContractBinding,
    chain: &str,
    method: &str,
    params: Vec<ConditionParam>,
    expected: ReturnValueTest,
) -> Result<AccessCondition> {
    let function = binding
        .descriptor()
        .method(method)
        .ok_or_else(|| GatewayError::MethodNotFound {
            contract: binding.name().to_string(),
            method: method.to_string(),
        })?;

    Ok(AccessCondition::new(binding.address(), chain, function, params, expected))
}
