//! ABI parsing, encoding and log decoding utilities
//!
//! Provides the [`Abi`] struct for declarative access to a stored contract
//! interface (constructor, events), the JSON <-> Solidity value conversions
//! used to encode constructor arguments, and [`decode_event_log`], a pure
//! function from an event descriptor and a raw log to decoded arguments.

use alloy::dyn_abi::{DynSolType, DynSolValue, EventExt, Specifier};
use alloy::json_abi::{Event, JsonAbi, Param};
use alloy::primitives::{Address, Bytes, FixedBytes, LogData, B256, I256, U256};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

// =============================================================================
// Abi Struct
// =============================================================================

/// Wrapper around alloy's JsonAbi providing a declarative interface
/// for all ABI operations.
#[derive(Debug, Clone)]
pub struct Abi(JsonAbi);

impl Abi {
    /// Parse a JSON ABI string into an Abi struct
    pub fn parse(json: &str) -> Result<Self, Error> {
        let abi: JsonAbi = serde_json::from_str(json)
            .map_err(|e| Error::Abi(format!("Failed to parse ABI: {}", e)))?;
        Ok(Self(abi))
    }

    // -------------------------------------------------------------------------
    // Constructor
    // -------------------------------------------------------------------------

    /// Get constructor information if present
    pub fn constructor(&self) -> Option<ConstructorInfo> {
        self.0.constructor.as_ref().map(|c| ConstructorInfo {
            inputs: c.inputs.iter().map(ParamInfo::from_abi_param).collect(),
        })
    }

    /// Constructor inputs as `{name, type}` entries; empty when there is no constructor
    pub fn constructor_schema(&self) -> Vec<ParamInfo> {
        self.constructor().map(|c| c.inputs).unwrap_or_default()
    }

    /// ABI-encode constructor arguments supplied as a JSON object keyed by input name.
    ///
    /// Every constructor input must be present and no other key may appear.
    pub fn encode_constructor_args(&self, params: &Map<String, Value>) -> Result<Vec<u8>, Error> {
        let Some(constructor) = self.0.constructor.as_ref() else {
            if !params.is_empty() {
                return Err(Error::validation(
                    "Contract has no constructor but arguments were provided",
                ));
            }
            return Ok(Vec::new());
        };

        let keys: Vec<String> = constructor
            .inputs
            .iter()
            .enumerate()
            .map(|(i, input)| param_key(&input.name, i))
            .collect();

        if let Some(extra) = params.keys().find(|k| !keys.contains(k)) {
            return Err(Error::validation(format!(
                "Unknown constructor argument '{}'",
                extra
            )));
        }

        let mut sol_values = Vec::with_capacity(constructor.inputs.len());
        for (input, key) in constructor.inputs.iter().zip(&keys) {
            let value = params.get(key).ok_or_else(|| {
                Error::validation(format!("Missing constructor argument '{}'", key))
            })?;
            let sol_type = resolve_param(input)?;
            let sol_value = json_to_sol_value(&sol_type, value)
                .map_err(|e| Error::validation(format!("Argument '{}': {}", key, e)))?;
            sol_values.push(sol_value);
        }

        Ok(DynSolValue::Tuple(sol_values).abi_encode_params())
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Get an event by name (returns first overload if multiple exist)
    pub fn event(&self, name: &str) -> Option<&Event> {
        self.0.events.get(name).and_then(|events| events.first())
    }

    /// Topic hash used to filter logs of the named event
    pub fn event_topic(&self, name: &str) -> Option<B256> {
        self.event(name).map(|e| e.selector())
    }
}

// =============================================================================
// Constructor Types
// =============================================================================

/// Constructor information extracted from ABI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructorInfo {
    pub inputs: Vec<ParamInfo>,
}

// =============================================================================
// Parameter Types
// =============================================================================

/// Information about a constructor or event parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub components: Option<Vec<ParamInfo>>,
}

impl ParamInfo {
    /// Create ParamInfo from an alloy Param
    pub fn from_abi_param(param: &Param) -> Self {
        Self {
            name: param.name.clone(),
            param_type: param.ty.to_string(),
            components: if param.components.is_empty() {
                None
            } else {
                Some(param.components.iter().map(Self::from_abi_param).collect())
            },
        }
    }
}

// =============================================================================
// Log Decoding
// =============================================================================

/// Decode a raw log against an event descriptor.
///
/// Returns the arguments keyed by input name (position for unnamed inputs).
/// A log whose payload does not match the event shape yields [`Error::Decode`].
pub fn decode_event_log(event: &Event, log: &LogData) -> Result<Map<String, Value>, Error> {
    let decoded = event
        .decode_log(log)
        .map_err(|e| Error::Decode(format!("{}: {}", event.name, e)))?;

    let mut indexed = decoded.indexed.into_iter();
    let mut body = decoded.body.into_iter();
    let mut args = Map::new();

    for (i, input) in event.inputs.iter().enumerate() {
        let value = if input.indexed {
            indexed.next()
        } else {
            body.next()
        };
        let value = value.ok_or_else(|| {
            Error::Decode(format!("{}: missing value for input {}", event.name, i))
        })?;
        args.insert(param_key(&input.name, i), sol_value_to_json(&value));
    }

    Ok(args)
}

// =============================================================================
// Value Conversion
// =============================================================================

/// Convert a JSON value into a Solidity value of the given type
pub fn json_to_sol_value(sol_type: &DynSolType, value: &Value) -> Result<DynSolValue, String> {
    match sol_type {
        DynSolType::Address => {
            let addr_str = value.as_str().ok_or("Expected string for address")?;
            let addr: Address = addr_str
                .parse()
                .map_err(|e| format!("Invalid address '{}': {}", addr_str, e))?;
            Ok(DynSolValue::Address(addr))
        }
        DynSolType::Bool => {
            let b = value.as_bool().ok_or("Expected boolean")?;
            Ok(DynSolValue::Bool(b))
        }
        DynSolType::Uint(bits) => {
            let u = parse_uint(value)?;
            if *bits < 256 && u.bit_len() > *bits {
                return Err(format!("{} does not fit in uint{}", u, bits));
            }
            Ok(DynSolValue::Uint(u, *bits))
        }
        DynSolType::Int(bits) => {
            let i = parse_int(value)?;
            if !int_fits(i, *bits) {
                return Err(format!("{} does not fit in int{}", i, bits));
            }
            Ok(DynSolValue::Int(i, *bits))
        }
        DynSolType::Bytes => {
            let hex_str = value.as_str().ok_or("Expected hex string for bytes")?;
            let bytes: Bytes = hex_str.parse().map_err(|e| format!("Invalid hex: {}", e))?;
            Ok(DynSolValue::Bytes(bytes.to_vec()))
        }
        DynSolType::String => {
            let s = value.as_str().ok_or("Expected string")?;
            Ok(DynSolValue::String(s.to_string()))
        }
        DynSolType::FixedBytes(size) => {
            let hex_str = value.as_str().ok_or("Expected hex string")?;
            let bytes: Bytes = hex_str.parse().map_err(|e| format!("Invalid hex: {}", e))?;
            if bytes.len() != *size {
                return Err(format!("Expected {} bytes, got {}", size, bytes.len()));
            }
            let mut word = [0u8; 32];
            word[..*size].copy_from_slice(&bytes);
            Ok(DynSolValue::FixedBytes(FixedBytes::from(word), *size))
        }
        DynSolType::Array(inner) => {
            let arr = value.as_array().ok_or("Expected array")?;
            let values = arr
                .iter()
                .map(|v| json_to_sol_value(inner, v))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(DynSolValue::Array(values))
        }
        DynSolType::FixedArray(inner, len) => {
            let arr = value.as_array().ok_or("Expected array")?;
            if arr.len() != *len {
                return Err(format!("Expected {} elements, got {}", len, arr.len()));
            }
            let values = arr
                .iter()
                .map(|v| json_to_sol_value(inner, v))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(DynSolValue::FixedArray(values))
        }
        DynSolType::Tuple(types) => {
            let arr = value.as_array().ok_or("Expected array for tuple")?;
            if arr.len() != types.len() {
                return Err(format!(
                    "Expected {} tuple fields, got {}",
                    types.len(),
                    arr.len()
                ));
            }
            let values = types
                .iter()
                .zip(arr)
                .map(|(t, v)| json_to_sol_value(t, v))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(DynSolValue::Tuple(values))
        }
        other => Err(format!("Unsupported type: {}", other.sol_type_name())),
    }
}

/// Convert a decoded Solidity value into JSON.
///
/// Byte values become `0x`-hex strings. Integers that fit in 64 bits become
/// JSON numbers, wider ones decimal strings.
pub fn sol_value_to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Int(i, _) => match i64::try_from(*i) {
            Ok(n) => Value::from(n),
            Err(_) => Value::String(i.to_string()),
        },
        DynSolValue::Uint(u, _) => match u64::try_from(*u) {
            Ok(n) => Value::from(n),
            Err(_) => Value::String(u.to_string()),
        },
        DynSolValue::FixedBytes(word, size) => {
            Value::String(format!("0x{}", hex::encode(&word[..*size])))
        }
        DynSolValue::Address(addr) => Value::String(addr.to_checksum(None)),
        DynSolValue::Function(f) => Value::String(format!("0x{}", hex::encode(f.as_slice()))),
        DynSolValue::Bytes(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Array(values) | DynSolValue::FixedArray(values) | DynSolValue::Tuple(values) => {
            Value::Array(values.iter().map(sol_value_to_json).collect())
        }
        #[allow(unreachable_patterns)]
        other => other
            .as_tuple()
            .map(|values| Value::Array(values.iter().map(sol_value_to_json).collect()))
            .unwrap_or(Value::Null),
    }
}

/// Parse an unsigned integer from a JSON number or decimal/hex string
pub fn parse_uint(value: &Value) -> Result<U256, String> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Ok(U256::from(u))
            } else if n.as_i64().is_some() {
                Err("Negative number not allowed for uint".to_string())
            } else {
                Err("Number too large".to_string())
            }
        }
        Value::String(s) => s
            .parse::<U256>()
            .map_err(|e| format!("Invalid uint: {}", e)),
        _ => Err("Expected number or string for uint".to_string()),
    }
}

/// Parse a signed integer from a JSON number or decimal string
pub fn parse_int(value: &Value) -> Result<I256, String> {
    match value {
        Value::Number(n) => {
            let i = n.as_i64().ok_or("Number out of range")?;
            I256::try_from(i).map_err(|e| format!("Invalid int: {}", e))
        }
        Value::String(s) => s.parse::<I256>().map_err(|e| format!("Invalid int: {}", e)),
        _ => Err("Expected number or string for int".to_string()),
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn param_key(name: &str, index: usize) -> String {
    if name.is_empty() {
        index.to_string()
    } else {
        name.to_string()
    }
}

/// Two's complement range check: `-2^(bits-1) <= i <= 2^(bits-1) - 1`
fn int_fits(i: I256, bits: usize) -> bool {
    if bits >= 256 {
        return true;
    }
    let magnitude = i.unsigned_abs();
    let limit = U256::from(1u8) << (bits - 1);
    if i.is_negative() {
        magnitude <= limit
    } else {
        magnitude < limit
    }
}

fn resolve_param(param: &Param) -> Result<DynSolType, Error> {
    param
        .resolve()
        .map_err(|e| Error::Abi(format!("Unknown type '{}': {}", param.ty, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TEST_ABI: &str = r#"[
        {
            "type": "constructor",
            "inputs": [
                {"name": "name", "type": "string"},
                {"name": "supply", "type": "uint256"}
            ],
            "stateMutability": "payable"
        },
        {
            "type": "event",
            "name": "Transfer",
            "inputs": [
                {"name": "from", "type": "address", "indexed": true},
                {"name": "to", "type": "address", "indexed": true},
                {"name": "value", "type": "uint256", "indexed": false}
            ],
            "anonymous": false
        },
        {
            "type": "function",
            "name": "balanceOf",
            "inputs": [{"name": "owner", "type": "address"}],
            "outputs": [{"name": "", "type": "uint256"}],
            "stateMutability": "view"
        }
    ]"#;

    fn transfer_log(abi: &Abi, data: Vec<u8>) -> LogData {
        let from = Address::repeat_byte(0x11);
        let to = Address::repeat_byte(0x22);
        LogData::new_unchecked(
            vec![
                abi.event_topic("Transfer").unwrap(),
                from.into_word(),
                to.into_word(),
            ],
            data.into(),
        )
    }

    #[test]
    fn test_parse_rejects_non_list() {
        assert!(Abi::parse(r#"{"type": "constructor"}"#).is_err());
        assert!(Abi::parse("not json").is_err());
    }

    #[test]
    fn test_constructor() {
        let abi = Abi::parse(TEST_ABI).unwrap();
        let constructor = abi.constructor().unwrap();

        assert_eq!(constructor.inputs.len(), 2);
        assert_eq!(constructor.inputs[0].name, "name");
        assert_eq!(constructor.inputs[0].param_type, "string");
        assert_eq!(constructor.inputs[1].param_type, "uint256");
    }

    #[test]
    fn test_constructor_schema_serializes_name_and_type() {
        let abi = Abi::parse(
            r#"[{"type":"constructor","inputs":[{"name":"admin","type":"address"}]}]"#,
        )
        .unwrap();
        let schema = serde_json::to_value(abi.constructor_schema()).unwrap();
        assert_eq!(schema, json!([{"name": "admin", "type": "address"}]));
    }

    #[test]
    fn test_constructor_schema_empty_without_constructor() {
        let abi = Abi::parse(
            r#"[{"type": "function", "name": "foo", "inputs": [], "outputs": [], "stateMutability": "view"}]"#,
        )
        .unwrap();
        assert!(abi.constructor_schema().is_empty());
    }

    #[test]
    fn test_encode_constructor_args() {
        let abi = Abi::parse(TEST_ABI).unwrap();
        let params = json!({"name": "Token", "supply": 1000});
        let encoded = abi
            .encode_constructor_args(params.as_object().unwrap())
            .unwrap();

        let expected = DynSolValue::Tuple(vec![
            DynSolValue::String("Token".into()),
            DynSolValue::Uint(U256::from(1000), 256),
        ])
        .abi_encode_params();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_encode_constructor_args_missing_and_extra() {
        let abi = Abi::parse(TEST_ABI).unwrap();

        let missing = json!({"name": "Token"});
        let err = abi
            .encode_constructor_args(missing.as_object().unwrap())
            .unwrap_err();
        assert!(err.is_validation());

        let extra = json!({"name": "Token", "supply": 1, "owner": "0x00"});
        let err = abi
            .encode_constructor_args(extra.as_object().unwrap())
            .unwrap_err();
        assert!(err.is_validation());

        let wrong_type = json!({"name": "Token", "supply": "lots"});
        let err = abi
            .encode_constructor_args(wrong_type.as_object().unwrap())
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_encode_rejects_integers_wider_than_their_type() {
        let abi = Abi::parse(
            r#"[{"type":"constructor","inputs":[
                {"name":"small","type":"uint8"},
                {"name":"signed","type":"int8"}]}]"#,
        )
        .unwrap();
        let encode = |params: Value| abi.encode_constructor_args(params.as_object().unwrap());

        assert!(encode(json!({"small": 255, "signed": 127})).is_ok());
        assert!(encode(json!({"small": 0, "signed": -128})).is_ok());

        assert!(encode(json!({"small": 300, "signed": 0}))
            .unwrap_err()
            .is_validation());
        assert!(encode(json!({"small": "256", "signed": 0}))
            .unwrap_err()
            .is_validation());
        assert!(encode(json!({"small": 0, "signed": -129}))
            .unwrap_err()
            .is_validation());
        assert!(encode(json!({"small": 0, "signed": 128}))
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_int_width_bounds() {
        assert!(int_fits(I256::MAX, 256));
        assert!(int_fits(I256::MIN, 256));
        assert!(int_fits(I256::try_from(-32768i64).unwrap(), 16));
        assert!(!int_fits(I256::try_from(32768i64).unwrap(), 16));
        assert!(!int_fits(I256::try_from(-32769i64).unwrap(), 16));
    }

    #[test]
    fn test_encode_without_constructor() {
        let abi = Abi::parse("[]").unwrap();
        assert!(abi.encode_constructor_args(&Map::new()).unwrap().is_empty());

        let params = json!({"x": 1});
        assert!(abi
            .encode_constructor_args(params.as_object().unwrap())
            .is_err());
    }

    #[test]
    fn test_event_topic() {
        let abi = Abi::parse(TEST_ABI).unwrap();
        let topic = abi.event_topic("Transfer").unwrap();
        assert_eq!(
            topic,
            alloy::primitives::keccak256("Transfer(address,address,uint256)")
        );
        assert!(abi.event_topic("Approval").is_none());
    }

    #[test]
    fn test_decode_event_log() {
        let abi = Abi::parse(TEST_ABI).unwrap();
        let event = abi.event("Transfer").unwrap();
        let data = DynSolValue::Uint(U256::from(5), 256).abi_encode();

        let args = decode_event_log(event, &transfer_log(&abi, data)).unwrap();

        assert_eq!(
            args["from"],
            json!(Address::repeat_byte(0x11).to_checksum(None))
        );
        assert_eq!(
            args["to"],
            json!(Address::repeat_byte(0x22).to_checksum(None))
        );
        assert_eq!(args["value"], json!(5));
    }

    #[test]
    fn test_decode_event_log_shape_mismatch() {
        let abi = Abi::parse(TEST_ABI).unwrap();
        let event = abi.event("Transfer").unwrap();

        let err = decode_event_log(event, &transfer_log(&abi, Vec::new())).unwrap_err();
        assert_eq!(err.code(), "DECODE_ERROR");
    }

    #[test]
    fn test_sol_value_to_json() {
        assert_eq!(
            sol_value_to_json(&DynSolValue::Bytes(vec![0xde, 0xad])),
            json!("0xdead")
        );
        assert_eq!(
            sol_value_to_json(&DynSolValue::Uint(U256::MAX, 256)),
            json!(U256::MAX.to_string())
        );
        assert_eq!(
            sol_value_to_json(&DynSolValue::Int(I256::try_from(-3i64).unwrap(), 256)),
            json!(-3)
        );
        assert_eq!(
            sol_value_to_json(&DynSolValue::FixedBytes(B256::repeat_byte(0xab), 4)),
            json!("0xabababab")
        );
    }

    #[test]
    fn test_parse_uint() {
        assert_eq!(parse_uint(&json!(42)).unwrap(), U256::from(42));
        assert_eq!(parse_uint(&json!("42")).unwrap(), U256::from(42));
        assert!(parse_uint(&json!(-1)).is_err());
        assert!(parse_uint(&json!(true)).is_err());
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int(&json!(-7)).unwrap(), I256::try_from(-7i64).unwrap());
        assert!(parse_int(&json!("abc")).is_err());
    }
}
