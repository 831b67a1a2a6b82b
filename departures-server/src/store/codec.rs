//! Value encoding for stored blobs.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Converts a stored value to and from its opaque byte form.
pub trait Codec<T>: Send + Sync {
    fn encode(&self, value: &T) -> Result<Vec<u8>, String>;
    fn decode(&self, bytes: &[u8]) -> Result<T, String>;
}

/// JSON encoding, the format every repository uses by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T> Codec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>, String> {
        serde_json::to_vec(value).map_err(|e| e.to_string())
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, String> {
        serde_json::from_slice(bytes).map_err(|e| e.to_string())
    }
}
