mod byte_io;
mod impls;

pub use byte_io::{ByteReader, ByteWriter};

use thiserror::Error;

/// Returned when wire input is malformed or truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Malformed or truncated input while deserializing")]
pub struct SerdeErr;

/// A type that can round-trip itself through the wire byte stream.
pub trait Serde: Sized {
    /// Serialize self to the writer.
    fn ser(&self, writer: &mut ByteWriter);

    /// Deserialize an instance from the reader.
    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr>;
}
