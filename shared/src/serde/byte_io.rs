use super::SerdeErr;

/// Growable buffer that wire values serialize themselves into.
pub struct ByteWriter {
    buffer: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(1024),
        }
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.buffer.push(byte);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn to_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl Default for ByteWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Cursor over a received payload that wire values deserialize themselves
/// from. Reads past the end surface as `SerdeErr` rather than panicking,
/// since the payload may be attacker-controlled.
pub struct ByteReader<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        let byte = *self.buffer.get(self.cursor).ok_or(SerdeErr)?;
        self.cursor += 1;
        Ok(byte)
    }

    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8], SerdeErr> {
        let end = self.cursor.checked_add(length).ok_or(SerdeErr)?;
        if end > self.buffer.len() {
            return Err(SerdeErr);
        }
        let bytes = &self.buffer[self.cursor..end];
        self.cursor = end;
        Ok(bytes)
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }
}
