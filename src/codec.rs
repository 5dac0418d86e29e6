//! Body decoding boundary.

use crate::Result;
use serde::de::DeserializeOwned;

/// Turns a raw body into a typed value.
pub trait BodyDecoder {
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}

/// `serde_json` decoding; the default everywhere a decoder is implied.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl BodyDecoder for JsonDecoder {
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlDecoder;

impl BodyDecoder for YamlDecoder {
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        Ok(serde_yaml::from_slice(bytes)?)
    }
}
