//! Save states are a flat list of typed records. Every record starts with a
//! [`ValueTag`] byte, so a reader that gets out of step with the writer fails
//! with [`SerializerError::TypeMismatch`] instead of silently reading garbage.

use num_enum::TryFromPrimitive;
use std::convert::TryFrom;
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Copy, Clone, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum ValueTag {
    Byte = 0x01,
    Int = 0x03,
    String = 0x04,
    Bytes = 0x05,
}

#[derive(Debug)]
pub enum SerializerError {
    Io(io::Error),
    Truncated,
    UnknownTag(u8),
    TypeMismatch { expected: ValueTag, found: ValueTag },
    InvalidString,
}

impl Display for SerializerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SerializerError::Io(err) => write!(f, "I/O error: {}", err),
            SerializerError::Truncated => write!(f, "Unexpected end of state data"),
            SerializerError::UnknownTag(tag) => write!(f, "Unknown record tag {:#04X}", tag),
            SerializerError::TypeMismatch { expected, found } => {
                write!(f, "Expected a {:?} record, found {:?}", expected, found)
            }
            SerializerError::InvalidString => write!(f, "String record is not valid UTF-8"),
        }
    }
}

impl std::error::Error for SerializerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SerializerError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for SerializerError {
    fn from(err: io::Error) -> Self {
        SerializerError::Io(err)
    }
}

/// Collapses the result of reading one state record. Faults are logged here,
/// a record that belongs to somebody else was already reported by its reader.
pub(crate) fn accept_record<T>(
    owner: &str,
    record: Result<Option<T>, SerializerError>,
) -> Option<T> {
    match record {
        Ok(record) => record,
        Err(err) => {
            log::error!("Could not load {} state: {}", owner, err);
            None
        }
    }
}

/// An in-memory state buffer with a read cursor. Writes always append.
#[derive(Debug, Default, Clone)]
pub struct Serializer {
    data: Vec<u8>,
    position: usize,
}

impl Serializer {
    pub fn new() -> Serializer {
        Serializer::default()
    }

    pub fn from_bytes(data: Vec<u8>) -> Serializer {
        Serializer { data, position: 0 }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Serializer, SerializerError> {
        Ok(Serializer::from_bytes(fs::read(path)?))
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SerializerError> {
        fs::write(path, &self.data)?;
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Moves the read cursor back to the first record
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.data.len()
    }

    pub fn put_byte(&mut self, value: u8) {
        self.data.push(ValueTag::Byte as u8);
        self.data.push(value);
    }

    pub fn put_int(&mut self, value: u32) {
        self.data.push(ValueTag::Int as u8);
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_string(&mut self, value: &str) {
        self.data.push(ValueTag::String as u8);
        self.put_len(value.len());
        self.data.extend_from_slice(value.as_bytes());
    }

    pub fn put_bytes(&mut self, value: &[u8]) {
        self.data.push(ValueTag::Bytes as u8);
        self.put_len(value.len());
        self.data.extend_from_slice(value);
    }

    pub fn get_byte(&mut self) -> Result<u8, SerializerError> {
        self.expect_tag(ValueTag::Byte)?;
        Ok(self.take(1)?[0])
    }

    pub fn get_int(&mut self) -> Result<u32, SerializerError> {
        self.expect_tag(ValueTag::Int)?;
        self.take_u32()
    }

    pub fn get_string(&mut self) -> Result<String, SerializerError> {
        self.expect_tag(ValueTag::String)?;
        let len = self.take_u32()? as usize;
        let bytes = self.take(len)?.to_vec();

        String::from_utf8(bytes).map_err(|_| SerializerError::InvalidString)
    }

    pub fn get_bytes(&mut self) -> Result<Vec<u8>, SerializerError> {
        self.expect_tag(ValueTag::Bytes)?;
        let len = self.take_u32()? as usize;

        Ok(self.take(len)?.to_vec())
    }

    fn put_len(&mut self, len: usize) {
        // Nothing in a save state comes close to 4 GiB
        self.data.extend_from_slice(&(len as u32).to_le_bytes());
    }

    fn expect_tag(&mut self, expected: ValueTag) -> Result<(), SerializerError> {
        let raw = self.take(1)?[0];
        let found = ValueTag::try_from(raw).map_err(|_| SerializerError::UnknownTag(raw))?;

        if found == expected {
            Ok(())
        } else {
            Err(SerializerError::TypeMismatch { expected, found })
        }
    }

    fn take_u32(&mut self) -> Result<u32, SerializerError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn take(&mut self, len: usize) -> Result<&[u8], SerializerError> {
        let start = self.position;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(SerializerError::Truncated)?;

        self.position = end;
        Ok(&self.data[start..end])
    }
}
