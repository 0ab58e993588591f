//! Constructor ABI parsing and argument encoding
//!
//! Constructor arguments are declared as JSON values and encoded against
//! the parameter types of the artifact's constructor.

use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::json_abi::{JsonAbi, Param, StateMutability};
use alloy::primitives::{Address, Bytes, FixedBytes, I256, U256};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// =============================================================================
// Abi Struct
// =============================================================================

/// Wrapper around alloy's JsonAbi
#[derive(Debug, Clone)]
pub struct Abi(JsonAbi);

impl Abi {
    /// Parse a JSON ABI string
    pub fn parse(json: &str) -> Result<Self> {
        let abi: JsonAbi = serde_json::from_str(json)
            .map_err(|e| Error::Abi(format!("Failed to parse ABI: {}", e)))?;
        Ok(Self(abi))
    }

    /// Parse from a serde_json::Value
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let abi: JsonAbi = serde_json::from_value(value.clone())
            .map_err(|e| Error::Abi(format!("Failed to parse ABI: {}", e)))?;
        Ok(Self(abi))
    }

    pub fn inner(&self) -> &JsonAbi {
        &self.0
    }

    /// Constructor information if the ABI declares one
    pub fn constructor(&self) -> Option<ConstructorInfo> {
        self.0.constructor.as_ref().map(|c| ConstructorInfo {
            inputs: c.inputs.iter().map(ParamInfo::from_abi_param).collect(),
            payable: c.state_mutability == StateMutability::Payable,
        })
    }

    /// Encode `args` for this ABI's constructor.
    ///
    /// An ABI without a constructor accepts no arguments.
    pub fn encode_constructor(&self, args: &[serde_json::Value]) -> Result<Vec<u8>> {
        match self.constructor() {
            Some(constructor) => encode_constructor_args(&constructor.inputs, args),
            None if args.is_empty() => Ok(Vec::new()),
            None => Err(Error::Abi(
                "Contract has no constructor but arguments were provided".to_string(),
            )),
        }
    }
}

// =============================================================================
// Constructor Types
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructorInfo {
    pub inputs: Vec<ParamInfo>,
    pub payable: bool,
}

/// A constructor parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamInfo {
    pub name: String,
    pub param_type: String,
}

impl ParamInfo {
    pub fn from_abi_param(param: &Param) -> Self {
        Self {
            name: param.name.clone(),
            // Tuples resolve to their full `(t1,t2)` form
            param_type: param.selector_type().into_owned(),
        }
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// ABI-encode constructor arguments as a parameter tuple
pub fn encode_constructor_args(inputs: &[ParamInfo], args: &[serde_json::Value]) -> Result<Vec<u8>> {
    if inputs.len() != args.len() {
        return Err(Error::Abi(format!(
            "Expected {} constructor arguments, got {}",
            inputs.len(),
            args.len()
        )));
    }

    let values = inputs
        .iter()
        .zip(args)
        .enumerate()
        .map(|(i, (input, value))| {
            json_to_sol_value(&input.param_type, value).map_err(|e| {
                Error::Abi(format!("Argument {} ({}): {}", i, input.name, e))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DynSolValue::Tuple(values).abi_encode_params())
}

fn json_to_sol_value(type_str: &str, value: &serde_json::Value) -> Result<DynSolValue> {
    let sol_type: DynSolType = type_str
        .parse()
        .map_err(|e| Error::Abi(format!("Unknown type '{}': {}", type_str, e)))?;
    to_sol_value(&sol_type, value)
}

fn to_sol_value(sol_type: &DynSolType, value: &serde_json::Value) -> Result<DynSolValue> {
    let expected = |what: &str| Error::Abi(format!("Expected {} for {}", what, sol_type));

    match sol_type {
        DynSolType::Address => {
            let raw = value.as_str().ok_or_else(|| expected("string"))?;
            let addr: Address = raw
                .parse()
                .map_err(|e| Error::Abi(format!("Invalid address '{}': {}", raw, e)))?;
            Ok(DynSolValue::Address(addr))
        }
        DynSolType::Bool => {
            let b = value.as_bool().ok_or_else(|| expected("boolean"))?;
            Ok(DynSolValue::Bool(b))
        }
        DynSolType::Uint(bits) => Ok(DynSolValue::Uint(parse_uint(value)?, *bits)),
        DynSolType::Int(bits) => Ok(DynSolValue::Int(parse_int(value)?, *bits)),
        DynSolType::Bytes => {
            let raw = value.as_str().ok_or_else(|| expected("hex string"))?;
            let bytes: Bytes = raw
                .parse()
                .map_err(|e| Error::Abi(format!("Invalid hex: {}", e)))?;
            Ok(DynSolValue::Bytes(bytes.to_vec()))
        }
        DynSolType::String => {
            let s = value.as_str().ok_or_else(|| expected("string"))?;
            Ok(DynSolValue::String(s.to_string()))
        }
        DynSolType::FixedBytes(size) => {
            let raw = value.as_str().ok_or_else(|| expected("hex string"))?;
            let bytes: Bytes = raw
                .parse()
                .map_err(|e| Error::Abi(format!("Invalid hex: {}", e)))?;
            if bytes.len() != *size {
                return Err(Error::Abi(format!(
                    "Expected {} bytes, got {}",
                    size,
                    bytes.len()
                )));
            }
            let mut word = FixedBytes::<32>::ZERO;
            word[..*size].copy_from_slice(&bytes);
            Ok(DynSolValue::FixedBytes(word, *size))
        }
        DynSolType::Array(inner) => {
            let items = value.as_array().ok_or_else(|| expected("array"))?;
            let values = items
                .iter()
                .map(|v| to_sol_value(inner, v))
                .collect::<Result<Vec<_>>>()?;
            Ok(DynSolValue::Array(values))
        }
        DynSolType::FixedArray(inner, len) => {
            let items = value.as_array().ok_or_else(|| expected("array"))?;
            if items.len() != *len {
                return Err(Error::Abi(format!(
                    "Expected {} elements, got {}",
                    len,
                    items.len()
                )));
            }
            let values = items
                .iter()
                .map(|v| to_sol_value(inner, v))
                .collect::<Result<Vec<_>>>()?;
            Ok(DynSolValue::FixedArray(values))
        }
        DynSolType::Tuple(types) => {
            let items = value.as_array().ok_or_else(|| expected("array"))?;
            if items.len() != types.len() {
                return Err(Error::Abi(format!(
                    "Expected {} tuple fields, got {}",
                    types.len(),
                    items.len()
                )));
            }
            let values = types
                .iter()
                .zip(items)
                .map(|(ty, v)| to_sol_value(ty, v))
                .collect::<Result<Vec<_>>>()?;
            Ok(DynSolValue::Tuple(values))
        }
        _ => Err(Error::Abi(format!("Unsupported type: {}", sol_type))),
    }
}

fn parse_uint(value: &serde_json::Value) -> Result<U256> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| Error::Abi(format!("Invalid uint: {}", n))),
        serde_json::Value::String(s) => s
            .parse::<U256>()
            .map_err(|e| Error::Abi(format!("Invalid uint '{}': {}", s, e))),
        _ => Err(Error::Abi("Expected number or string for uint".to_string())),
    }
}

fn parse_int(value: &serde_json::Value) -> Result<I256> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|i| I256::try_from(i).ok())
            .ok_or_else(|| Error::Abi(format!("Invalid int: {}", n))),
        serde_json::Value::String(s) => s
            .parse::<I256>()
            .map_err(|e| Error::Abi(format!("Invalid int '{}': {}", s, e))),
        _ => Err(Error::Abi("Expected number or string for int".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolValue;
    use serde_json::json;

    const TOKEN_ABI: &str = r#"[
        {
            "type": "constructor",
            "inputs": [{"name": "motherlodeVault", "type": "address"}],
            "stateMutability": "nonpayable"
        },
        {
            "type": "function",
            "name": "totalSupply",
            "inputs": [],
            "outputs": [{"name": "", "type": "uint256"}],
            "stateMutability": "view"
        }
    ]"#;

    #[test]
    fn test_constructor() {
        let abi = Abi::parse(TOKEN_ABI).unwrap();
        let constructor = abi.constructor().unwrap();

        assert_eq!(constructor.inputs.len(), 1);
        assert_eq!(constructor.inputs[0].name, "motherlodeVault");
        assert_eq!(constructor.inputs[0].param_type, "address");
        assert!(!constructor.payable);
    }

    #[test]
    fn test_parse_invalid_abi() {
        assert!(matches!(Abi::parse("{not json"), Err(Error::Abi(_))));
    }

    #[test]
    fn test_encode_address_arg() {
        let abi = Abi::parse(TOKEN_ABI).unwrap();
        let vault = Address::repeat_byte(0x77);

        let encoded = abi
            .encode_constructor(&[json!(vault.to_checksum(None))])
            .unwrap();

        assert_eq!(encoded, (vault,).abi_encode_params());
    }

    #[test]
    fn test_encode_arity_mismatch() {
        let abi = Abi::parse(TOKEN_ABI).unwrap();
        assert!(abi.encode_constructor(&[]).is_err());
    }

    #[test]
    fn test_no_constructor() {
        let abi = Abi::parse("[]").unwrap();
        assert!(abi.constructor().is_none());
        assert!(abi.encode_constructor(&[]).unwrap().is_empty());
        assert!(abi.encode_constructor(&[json!(1)]).is_err());
    }

    #[test]
    fn test_encode_mixed_args() {
        let inputs = vec![
            ParamInfo {
                name: "cap".into(),
                param_type: "uint256".into(),
            },
            ParamInfo {
                name: "delta".into(),
                param_type: "int8".into(),
            },
            ParamInfo {
                name: "name".into(),
                param_type: "string".into(),
            },
            ParamInfo {
                name: "ids".into(),
                param_type: "uint64[]".into(),
            },
            ParamInfo {
                name: "open".into(),
                param_type: "bool".into(),
            },
        ];
        let args = [
            json!("90000000000000000000000000000000"),
            json!(-3),
            json!("Genesis"),
            json!([1, 2, 3]),
            json!(true),
        ];

        let encoded = encode_constructor_args(&inputs, &args).unwrap();

        let expected = (
            U256::from_str_radix("90000000000000000000000000000000", 10).unwrap(),
            -3i8,
            "Genesis".to_string(),
            vec![1u64, 2, 3],
            true,
        )
            .abi_encode_params();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_encode_rejects_bad_values() {
        let uint = [ParamInfo {
            name: "cap".into(),
            param_type: "uint256".into(),
        }];
        assert!(encode_constructor_args(&uint, &[json!(-1)]).is_err());
        assert!(encode_constructor_args(&uint, &[json!("abc")]).is_err());

        let addr = [ParamInfo {
            name: "vault".into(),
            param_type: "address".into(),
        }];
        assert!(encode_constructor_args(&addr, &[json!("not-an-address")]).is_err());
        assert!(encode_constructor_args(&addr, &[json!(42)]).is_err());
    }

    #[test]
    fn test_fixed_bytes() {
        let inputs = [ParamInfo {
            name: "tag".into(),
            param_type: "bytes4".into(),
        }];
        let encoded = encode_constructor_args(&inputs, &[json!("0xdeadbeef")]).unwrap();
        assert_eq!(&encoded[..4], &[0xde, 0xad, 0xbe, 0xef]);
        assert!(encode_constructor_args(&inputs, &[json!("0xdead")]).is_err());
    }
}
