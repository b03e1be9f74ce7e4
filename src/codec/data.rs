use crate::codec::{decode, encode, AmqpValue};
use crate::Result;

/// A typed-data slot holding one encoded value.
///
/// Local slots are filled by `put` when configuration is applied; remote
/// slots hold whatever bytes the peer sent and are decoded on every `get`,
/// so a malformed remote value surfaces to the reader instead of at
/// frame-processing time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Data {
    bytes: Vec<u8>,
}

impl Data {
    pub fn new() -> Self {
        Data::default()
    }

    /// Wrap raw encoded bytes without validating them
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Data { bytes }
    }

    /// Replace the slot contents with the encoding of `value`
    pub fn put(&mut self, value: &AmqpValue) -> Result<()> {
        self.bytes = encode(value)?;
        Ok(())
    }

    /// Decode the slot; an empty slot yields `None`
    pub fn get(&self) -> Result<Option<AmqpValue>> {
        if self.bytes.is_empty() {
            return Ok(None);
        }
        decode(&self.bytes).map(Some)
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
