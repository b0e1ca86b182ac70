//! Value codecs
//!
//! A codec turns a `serde_json::Value` into the bytes stored in Redis and
//! back. [`crate::cache::TypedCache`] layers typed access on top.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::client::registry::{DefaultRegistry, Strategy, StrategyRegistry};

pub const JSON: &str = "json";
pub const MSGPACK: &str = "msgpack";
pub const STRING: &str = "string";
pub const BYTE_ARRAY: &str = "byte-array";

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to encode value with {codec} codec: {message}")]
    Encode { codec: String, message: String },

    #[error("Failed to decode value with {codec} codec: {message}")]
    Decode { codec: String, message: String },
}

impl CodecError {
    fn encode(codec: &str, message: impl ToString) -> Self {
        CodecError::Encode {
            codec: codec.to_string(),
            message: message.to_string(),
        }
    }

    fn decode(codec: &str, message: impl ToString) -> Self {
        CodecError::Decode {
            codec: codec.to_string(),
            message: message.to_string(),
        }
    }
}

pub trait Codec: Strategy {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError>;
}

#[derive(Debug, Default)]
pub struct JsonCodec;

impl Strategy for JsonCodec {
    fn name(&self) -> &str {
        JSON
    }
}

impl Codec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::encode(JSON, e))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::decode(JSON, e))
    }
}

/// MessagePack, field names preserved
#[derive(Debug, Default)]
pub struct MsgPackCodec;

impl Strategy for MsgPackCodec {
    fn name(&self) -> &str {
        MSGPACK
    }
}

impl Codec for MsgPackCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        rmp_serde::to_vec_named(value).map_err(|e| CodecError::encode(MSGPACK, e))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        rmp_serde::from_slice(bytes).map_err(|e| CodecError::decode(MSGPACK, e))
    }
}

/// UTF-8 text; only string values can be encoded
#[derive(Debug, Default)]
pub struct StringCodec;

impl Strategy for StringCodec {
    fn name(&self) -> &str {
        STRING
    }
}

impl Codec for StringCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        match value {
            Value::String(s) => Ok(s.as_bytes().to_vec()),
            other => Err(CodecError::encode(
                STRING,
                format!("expected a string, got {other}"),
            )),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        String::from_utf8(bytes.to_vec())
            .map(Value::String)
            .map_err(|e| CodecError::decode(STRING, e))
    }
}

/// Raw bytes carried as a JSON array of numbers
#[derive(Debug, Default)]
pub struct ByteArrayCodec;

impl Strategy for ByteArrayCodec {
    fn name(&self) -> &str {
        BYTE_ARRAY
    }
}

impl Codec for ByteArrayCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let items = value
            .as_array()
            .ok_or_else(|| CodecError::encode(BYTE_ARRAY, "expected an array of bytes"))?;
        items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(|| CodecError::encode(BYTE_ARRAY, format!("{item} is not a byte")))
            })
            .collect()
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        Ok(Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()))
    }
}

impl DefaultRegistry for dyn Codec {
    fn default_registry() -> StrategyRegistry<Self> {
        StrategyRegistry::new("codec")
            .with(JSON, || Ok(Arc::new(JsonCodec) as Arc<dyn Codec>))
            .with(MSGPACK, || Ok(Arc::new(MsgPackCodec) as Arc<dyn Codec>))
            .with(STRING, || Ok(Arc::new(StringCodec) as Arc<dyn Codec>))
            .with(BYTE_ARRAY, || Ok(Arc::new(ByteArrayCodec) as Arc<dyn Codec>))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_and_msgpack_preserve_structure() {
        let value = json!({"id": 7, "tags": ["a", "b"], "nested": {"ok": true}});
        for codec in [&JsonCodec as &dyn Codec, &MsgPackCodec] {
            let bytes = codec.encode(&value).unwrap();
            assert_eq!(codec.decode(&bytes).unwrap(), value, "{}", codec.name());
        }
    }

    #[test]
    fn test_string_codec_rejects_non_strings() {
        assert_eq!(StringCodec.encode(&json!("hi")).unwrap(), b"hi");
        assert!(matches!(
            StringCodec.encode(&json!(1)),
            Err(CodecError::Encode { .. })
        ));
        assert!(StringCodec.decode(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn test_byte_array_codec() {
        assert_eq!(ByteArrayCodec.encode(&json!([1, 2, 255])).unwrap(), vec![1, 2, 255]);
        assert!(ByteArrayCodec.encode(&json!([256])).is_err());
        assert_eq!(ByteArrayCodec.decode(&[9]).unwrap(), json!([9]));
    }

    #[test]
    fn test_default_registry_keys() {
        let registry = <dyn Codec>::default_registry();
        assert_eq!(registry.keys(), vec!["byte-array", "json", "msgpack", "string"]);
        assert_eq!(registry.create("MsgPack").unwrap().name(), MSGPACK);
        assert!(registry.create("kryo").is_err());
    }
}
