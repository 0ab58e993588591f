//! ERC-20 facts read back from a freshly deployed token

use alloy::primitives::Address;
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::amount::FixedPointAmount;
use crate::chain::ChainReader;
use crate::error::{Error, Result};
use crate::types::TokenSummary;

sol! {
    interface IERC20 {
        function symbol() external view returns (string);
        function totalSupply() external view returns (uint256);
    }
}

/// Read `symbol()` and `totalSupply()` from a deployed token
pub async fn read_token_summary(
    chain: &dyn ChainReader,
    contract: &str,
    address: Address,
) -> Result<TokenSummary> {
    let raw = chain
        .call(address, IERC20::symbolCall {}.abi_encode().into())
        .await?;
    let symbol = IERC20::symbolCall::abi_decode_returns(&raw)
        .map_err(|e| Error::Abi(format!("{}.symbol(): {}", contract, e)))?;

    let raw = chain
        .call(address, IERC20::totalSupplyCall {}.abi_encode().into())
        .await?;
    let total_supply = IERC20::totalSupplyCall::abi_decode_returns(&raw)
        .map_err(|e| Error::Abi(format!("{}.totalSupply(): {}", contract, e)))?;

    Ok(TokenSummary {
        contract: contract.to_string(),
        symbol,
        total_supply: FixedPointAmount::from_base_units(total_supply),
    })
}
