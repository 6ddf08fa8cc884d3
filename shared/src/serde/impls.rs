use super::{ByteReader, ByteWriter, Serde, SerdeErr};
use crate::types::EntityId;

impl Serde for bool {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_byte(u8::from(*self));
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match reader.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(SerdeErr),
        }
    }
}

impl Serde for u8 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_byte(*self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        reader.read_byte()
    }
}

macro_rules! impl_serde_le_bytes {
    ($ty:ty, $width:expr) => {
        impl Serde for $ty {
            fn ser(&self, writer: &mut ByteWriter) {
                writer.write_bytes(&self.to_le_bytes());
            }

            fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
                let bytes = reader.read_bytes($width)?;
                let mut array = [0u8; $width];
                array.copy_from_slice(bytes);
                Ok(<$ty>::from_le_bytes(array))
            }
        }
    };
}

impl_serde_le_bytes!(u16, 2);
impl_serde_le_bytes!(u32, 4);
impl_serde_le_bytes!(u64, 8);
impl_serde_le_bytes!(i64, 8);
impl_serde_le_bytes!(f64, 8);

impl Serde for String {
    fn ser(&self, writer: &mut ByteWriter) {
        (self.len() as u32).ser(writer);
        writer.write_bytes(self.as_bytes());
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let length = u32::de(reader)? as usize;
        let bytes = reader.read_bytes(length)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| SerdeErr)
    }
}

impl Serde for EntityId {
    fn ser(&self, writer: &mut ByteWriter) {
        self.to_u64().ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(EntityId::new(u64::de(reader)?))
    }
}

impl<T: Serde> Serde for Vec<T> {
    fn ser(&self, writer: &mut ByteWriter) {
        (self.len() as u32).ser(writer);
        for item in self {
            item.ser(writer);
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let count = u32::de(reader)? as usize;
        // sanity bound: each element costs at least one byte on the wire
        if count > reader.remaining() {
            return Err(SerdeErr);
        }
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(T::de(reader)?);
        }
        Ok(items)
    }
}

impl<A: Serde, B: Serde> Serde for (A, B) {
    fn ser(&self, writer: &mut ByteWriter) {
        self.0.ser(writer);
        self.1.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok((A::de(reader)?, B::de(reader)?))
    }
}
