//! Checkpoint payload serialization.
//!
//! `Checkpointer` implementations that persist to disk (e.g. `SqliteSaver`)
//! need to turn `S` into bytes and back; `Serializer<S>` is the seam for that,
//! so a caller with an `S` that isn't `Serialize` can still use `MemorySaver`.

use crate::memory::checkpointer::CheckpointError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Type tag for a `TypedData` envelope: payload is JSON-encoded.
pub const TYPE_JSON: u8 = 1;
/// Type tag for a `TypedData` envelope: payload is raw bytes, uninterpreted.
pub const TYPE_BYTES: u8 = 2;
/// Type tag for a `TypedData` envelope: no payload.
pub const TYPE_NULL: u8 = 0;

/// A tagged byte payload, so a reader can tell whether bytes are JSON, raw,
/// or absent without a side-channel.
#[derive(Debug, Clone)]
pub struct TypedData {
    pub type_tag: u8,
    pub bytes: Vec<u8>,
}

impl TypedData {
    pub fn null() -> Self {
        Self {
            type_tag: TYPE_NULL,
            bytes: Vec::new(),
        }
    }

    pub fn json(bytes: Vec<u8>) -> Self {
        Self {
            type_tag: TYPE_JSON,
            bytes,
        }
    }

    pub fn raw(bytes: Vec<u8>) -> Self {
        Self {
            type_tag: TYPE_BYTES,
            bytes,
        }
    }

    /// Flattens the envelope into a single byte buffer: one tag byte, then the payload.
    pub fn into_bytes(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.bytes.len());
        out.push(self.type_tag);
        out.extend(self.bytes);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let (tag, rest) = bytes
            .split_first()
            .ok_or_else(|| CheckpointError::Serialization("empty payload".into()))?;
        Ok(Self {
            type_tag: *tag,
            bytes: rest.to_vec(),
        })
    }
}

/// Converts a value to/from a tagged envelope. Blanket-implemented for any
/// `Serialize + DeserializeOwned` type via JSON; override for custom formats.
pub trait TypedSerializer: Sized {
    fn to_typed(&self) -> Result<TypedData, CheckpointError>;
    fn from_typed(data: TypedData) -> Result<Self, CheckpointError>;
}

impl<T> TypedSerializer for T
where
    T: Serialize + DeserializeOwned,
{
    fn to_typed(&self) -> Result<TypedData, CheckpointError> {
        let bytes =
            serde_json::to_vec(self).map_err(|e| CheckpointError::Serialization(e.to_string()))?;
        Ok(TypedData::json(bytes))
    }

    fn from_typed(data: TypedData) -> Result<Self, CheckpointError> {
        match data.type_tag {
            TYPE_JSON => serde_json::from_slice(&data.bytes)
                .map_err(|e| CheckpointError::Serialization(e.to_string())),
            TYPE_NULL => Err(CheckpointError::Serialization(
                "cannot decode null payload".into(),
            )),
            other => Err(CheckpointError::Serialization(format!(
                "unsupported type tag: {other}"
            ))),
        }
    }
}

/// Converts a checkpoint's channel values to/from bytes for durable storage.
pub trait Serializer<S>: Send + Sync {
    fn serialize(&self, value: &S) -> Result<Vec<u8>, CheckpointError>;
    fn deserialize(&self, bytes: &[u8]) -> Result<S, CheckpointError>;
}

/// JSON-backed serializer; `S` must be `Serialize + DeserializeOwned`.
pub struct JsonSerializer;

impl<S> Serializer<S> for JsonSerializer
where
    S: Serialize + DeserializeOwned + Send + Sync,
{
    fn serialize(&self, value: &S) -> Result<Vec<u8>, CheckpointError> {
        let typed = value.to_typed()?;
        Ok(typed.into_bytes())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<S, CheckpointError> {
        let typed = TypedData::from_bytes(bytes)?;
        S::from_typed(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        count: i32,
        label: String,
    }

    #[test]
    fn json_serializer_roundtrips() {
        let serializer = JsonSerializer;
        let value = Sample {
            count: 3,
            label: "hi".into(),
        };
        let bytes = Serializer::<Sample>::serialize(&serializer, &value).unwrap();
        let back: Sample = Serializer::<Sample>::deserialize(&serializer, &bytes).unwrap();
        assert_eq!(value, back);
    }

    #[test]
    fn typed_data_roundtrips_through_bytes() {
        let data = TypedData::json(b"{\"a\":1}".to_vec());
        let flat = data.clone().into_bytes();
        let back = TypedData::from_bytes(&flat).unwrap();
        assert_eq!(back.type_tag, TYPE_JSON);
        assert_eq!(back.bytes, data.bytes);
    }
}
