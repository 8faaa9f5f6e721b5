//! Typed header values and the header block codec.
//!
//! Each header on the wire is:
//! ```text
//! ┌──────────┬────────────────┬──────────┬─────────────────┐
//! │ Name Len │ Name           │ Type     │ Value           │
//! │ uint8    │ ASCII, 1..=255 │ uint8    │ type-specific   │
//! └──────────┴────────────────┴──────────┴─────────────────┘
//! ```
//!
//! Scalars are fixed width and Big Endian. Byte arrays and strings carry a
//! `uint16` BE length prefix, so neither may exceed 65535 bytes.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::{BufMut, Bytes, BytesMut};
use uuid::Uuid;

use crate::error::{EventStreamError, Result};

/// Maximum length of a header name in bytes.
pub const MAX_HEADER_NAME_LEN: usize = u8::MAX as usize;

/// Maximum length of a byte-array or string header value in bytes.
pub const MAX_HEADER_VALUE_LEN: usize = u16::MAX as usize;

/// Wire type tag of a header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HeaderType {
    True = 0,
    False = 1,
    Byte = 2,
    Int16 = 3,
    Int32 = 4,
    Int64 = 5,
    ByteArray = 6,
    String = 7,
    Timestamp = 8,
    Uuid = 9,
}

impl HeaderType {
    /// Creates a header type from its tag byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::True),
            1 => Some(Self::False),
            2 => Some(Self::Byte),
            3 => Some(Self::Int16),
            4 => Some(Self::Int32),
            5 => Some(Self::Int64),
            6 => Some(Self::ByteArray),
            7 => Some(Self::String),
            8 => Some(Self::Timestamp),
            9 => Some(Self::Uuid),
            _ => None,
        }
    }

    /// Returns the tag byte.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Typed value carried by a header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HeaderValue {
    /// Boolean, encoded as the tag alone (`True` or `False`).
    Bool(bool),
    /// Signed 8-bit integer.
    Byte(i8),
    /// Signed 16-bit integer.
    Int16(i16),
    /// Signed 32-bit integer.
    Int32(i32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// Raw bytes with a 2-byte length prefix.
    ByteArray(Bytes),
    /// UTF-8 text with a 2-byte length prefix.
    String(String),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    /// 16 raw UUID bytes.
    Uuid(Uuid),
}

impl HeaderValue {
    /// Wire tag for this value. `Bool` maps to one of two tags.
    pub fn header_type(&self) -> HeaderType {
        match self {
            HeaderValue::Bool(true) => HeaderType::True,
            HeaderValue::Bool(false) => HeaderType::False,
            HeaderValue::Byte(_) => HeaderType::Byte,
            HeaderValue::Int16(_) => HeaderType::Int16,
            HeaderValue::Int32(_) => HeaderType::Int32,
            HeaderValue::Int64(_) => HeaderType::Int64,
            HeaderValue::ByteArray(_) => HeaderType::ByteArray,
            HeaderValue::String(_) => HeaderType::String,
            HeaderValue::Timestamp(_) => HeaderType::Timestamp,
            HeaderValue::Uuid(_) => HeaderType::Uuid,
        }
    }

    /// Variant name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            HeaderValue::Bool(_) => "Bool",
            HeaderValue::Byte(_) => "Byte",
            HeaderValue::Int16(_) => "Int16",
            HeaderValue::Int32(_) => "Int32",
            HeaderValue::Int64(_) => "Int64",
            HeaderValue::ByteArray(_) => "ByteArray",
            HeaderValue::String(_) => "String",
            HeaderValue::Timestamp(_) => "Timestamp",
            HeaderValue::Uuid(_) => "Uuid",
        }
    }

    /// Number of bytes this value occupies on the wire, tag included.
    pub fn encoded_len(&self) -> usize {
        1 + match self {
            HeaderValue::Bool(_) => 0,
            HeaderValue::Byte(_) => 1,
            HeaderValue::Int16(_) => 2,
            HeaderValue::Int32(_) => 4,
            HeaderValue::Int64(_) | HeaderValue::Timestamp(_) => 8,
            HeaderValue::ByteArray(bytes) => 2 + bytes.len(),
            HeaderValue::String(s) => 2 + s.len(),
            HeaderValue::Uuid(_) => 16,
        }
    }

    /// Encode the value (tag + payload) to a new buffer.
    ///
    /// # Example
    ///
    /// ```
    /// use aws_event_stream::protocol::HeaderValue;
    ///
    /// let bytes = HeaderValue::Int16(0x0102).encode().unwrap();
    /// assert_eq!(bytes, vec![3, 0x01, 0x02]);
    /// ```
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf)?;
        Ok(buf.to_vec())
    }

    /// Encode the value into `dst`.
    ///
    /// Nothing is written if the value is rejected.
    pub fn encode_into(&self, dst: &mut BytesMut) -> Result<()> {
        match self {
            HeaderValue::ByteArray(bytes) => check_value_len("ByteArray", bytes.len())?,
            HeaderValue::String(s) => check_value_len("String", s.len())?,
            _ => {}
        }

        dst.reserve(self.encoded_len());
        dst.put_u8(self.header_type().as_u8());
        match self {
            HeaderValue::Bool(_) => {}
            HeaderValue::Byte(v) => dst.put_i8(*v),
            HeaderValue::Int16(v) => dst.put_i16(*v),
            HeaderValue::Int32(v) => dst.put_i32(*v),
            HeaderValue::Int64(v) | HeaderValue::Timestamp(v) => dst.put_i64(*v),
            HeaderValue::ByteArray(bytes) => {
                dst.put_u16(bytes.len() as u16);
                dst.put_slice(bytes);
            }
            HeaderValue::String(s) => {
                dst.put_u16(s.len() as u16);
                dst.put_slice(s.as_bytes());
            }
            HeaderValue::Uuid(uuid) => dst.put_slice(uuid.as_bytes()),
        }
        Ok(())
    }

    /// Decode a value starting at `offset`.
    ///
    /// Returns the value and the number of bytes consumed (tag included).
    pub fn decode(buf: &[u8], offset: usize) -> Result<(HeaderValue, usize)> {
        let tag = take(buf, offset, 1, "header value type")?[0];
        let header_type = HeaderType::from_u8(tag).ok_or_else(|| {
            EventStreamError::Protocol(format!("Unknown header value type: {}", tag))
        })?;

        let body = offset + 1;
        let (value, len) = match header_type {
            HeaderType::True => (HeaderValue::Bool(true), 0),
            HeaderType::False => (HeaderValue::Bool(false), 0),
            HeaderType::Byte => {
                let b = take(buf, body, 1, "Byte value")?;
                (HeaderValue::Byte(b[0] as i8), 1)
            }
            HeaderType::Int16 => {
                let b = take(buf, body, 2, "Int16 value")?;
                (HeaderValue::Int16(i16::from_be_bytes([b[0], b[1]])), 2)
            }
            HeaderType::Int32 => {
                let b = take(buf, body, 4, "Int32 value")?;
                (
                    HeaderValue::Int32(i32::from_be_bytes([b[0], b[1], b[2], b[3]])),
                    4,
                )
            }
            HeaderType::Int64 => (HeaderValue::Int64(read_i64(buf, body, "Int64 value")?), 8),
            HeaderType::Timestamp => (
                HeaderValue::Timestamp(read_i64(buf, body, "Timestamp value")?),
                8,
            ),
            HeaderType::ByteArray | HeaderType::String => {
                let b = take(buf, body, 2, "value length")?;
                let len = u16::from_be_bytes([b[0], b[1]]) as usize;
                let raw = take(buf, body + 2, len, "variable-length value")?;
                let value = if header_type == HeaderType::String {
                    let s = std::str::from_utf8(raw).map_err(|e| {
                        EventStreamError::Protocol(format!("Invalid UTF-8 in String header value: {}", e))
                    })?;
                    HeaderValue::String(s.to_owned())
                } else {
                    HeaderValue::ByteArray(Bytes::copy_from_slice(raw))
                };
                (value, 2 + len)
            }
            HeaderType::Uuid => {
                let b = take(buf, body, 16, "Uuid value")?;
                let mut raw = [0u8; 16];
                raw.copy_from_slice(b);
                (HeaderValue::Uuid(Uuid::from_bytes(raw)), 16)
            }
        };

        Ok((value, 1 + len))
    }

    /// Timestamp value from a `SystemTime`, truncated to milliseconds.
    ///
    /// Times outside the `i64` millisecond range saturate to `i64::MAX` or
    /// `i64::MIN`.
    pub fn from_system_time(time: SystemTime) -> Self {
        let millis = match time.duration_since(UNIX_EPOCH) {
            Ok(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
            Err(e) => i64::try_from(e.duration().as_millis())
                .map(|m| -m)
                .unwrap_or(i64::MIN),
        };
        HeaderValue::Timestamp(millis)
    }

    /// The value of a `Bool` header.
    ///
    /// Fails with a `HeaderType` error for any other variant.
    pub fn expect_bool(&self) -> Result<bool> {
        match self {
            HeaderValue::Bool(v) => Ok(*v),
            other => Err(other.mismatch("Bool")),
        }
    }

    /// The value of a `Byte` header.
    pub fn expect_byte(&self) -> Result<i8> {
        match self {
            HeaderValue::Byte(v) => Ok(*v),
            other => Err(other.mismatch("Byte")),
        }
    }

    /// The value of an `Int16` header.
    pub fn expect_int16(&self) -> Result<i16> {
        match self {
            HeaderValue::Int16(v) => Ok(*v),
            other => Err(other.mismatch("Int16")),
        }
    }

    /// The value of an `Int32` header.
    pub fn expect_int32(&self) -> Result<i32> {
        match self {
            HeaderValue::Int32(v) => Ok(*v),
            other => Err(other.mismatch("Int32")),
        }
    }

    /// The value of an `Int64` header.
    pub fn expect_int64(&self) -> Result<i64> {
        match self {
            HeaderValue::Int64(v) => Ok(*v),
            other => Err(other.mismatch("Int64")),
        }
    }

    /// The bytes of a `ByteArray` header.
    pub fn expect_byte_array(&self) -> Result<&Bytes> {
        match self {
            HeaderValue::ByteArray(v) => Ok(v),
            other => Err(other.mismatch("ByteArray")),
        }
    }

    /// The text of a `String` header.
    pub fn expect_string(&self) -> Result<&str> {
        match self {
            HeaderValue::String(v) => Ok(v),
            other => Err(other.mismatch("String")),
        }
    }

    /// Milliseconds since the Unix epoch.
    pub fn expect_timestamp(&self) -> Result<i64> {
        match self {
            HeaderValue::Timestamp(v) => Ok(*v),
            other => Err(other.mismatch("Timestamp")),
        }
    }

    /// Timestamp value as a `SystemTime`.
    pub fn expect_system_time(&self) -> Result<SystemTime> {
        let millis = self.expect_timestamp()?;
        let offset = Duration::from_millis(millis.unsigned_abs());
        if millis >= 0 {
            Ok(UNIX_EPOCH + offset)
        } else {
            Ok(UNIX_EPOCH - offset)
        }
    }

    /// The value of a `Uuid` header.
    pub fn expect_uuid(&self) -> Result<Uuid> {
        match self {
            HeaderValue::Uuid(v) => Ok(*v),
            other => Err(other.mismatch("Uuid")),
        }
    }

    fn mismatch(&self, expected: &'static str) -> EventStreamError {
        EventStreamError::HeaderType {
            name: None,
            expected,
            found: self.type_name(),
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Bool(v) => write!(f, "{}", v),
            HeaderValue::Byte(v) => write!(f, "{}", v),
            HeaderValue::Int16(v) => write!(f, "{}", v),
            HeaderValue::Int32(v) => write!(f, "{}", v),
            HeaderValue::Int64(v) => write!(f, "{}", v),
            HeaderValue::ByteArray(v) => write!(f, "<{} bytes>", v.len()),
            HeaderValue::String(v) => f.write_str(v),
            HeaderValue::Timestamp(v) => write!(f, "{}ms", v),
            HeaderValue::Uuid(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for HeaderValue {
    fn from(value: bool) -> Self {
        HeaderValue::Bool(value)
    }
}

impl From<i8> for HeaderValue {
    fn from(value: i8) -> Self {
        HeaderValue::Byte(value)
    }
}

impl From<i16> for HeaderValue {
    fn from(value: i16) -> Self {
        HeaderValue::Int16(value)
    }
}

impl From<i32> for HeaderValue {
    fn from(value: i32) -> Self {
        HeaderValue::Int32(value)
    }
}

impl From<i64> for HeaderValue {
    fn from(value: i64) -> Self {
        HeaderValue::Int64(value)
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::String(value.to_owned())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::String(value)
    }
}

impl From<Bytes> for HeaderValue {
    fn from(value: Bytes) -> Self {
        HeaderValue::ByteArray(value)
    }
}

impl From<Vec<u8>> for HeaderValue {
    fn from(value: Vec<u8>) -> Self {
        HeaderValue::ByteArray(Bytes::from(value))
    }
}

impl From<Uuid> for HeaderValue {
    fn from(value: Uuid) -> Self {
        HeaderValue::Uuid(value)
    }
}

/// A named header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Header {
    /// ASCII name, 1 to 255 bytes.
    pub name: String,
    pub value: HeaderValue,
}

impl Header {
    /// Create a new header.
    pub fn new(name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Number of bytes this header occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        1 + self.name.len() + self.value.encoded_len()
    }

    /// Encode name and value into `dst`.
    pub fn encode_into(&self, dst: &mut BytesMut) -> Result<()> {
        if let Err(reason) = check_name(self.name.as_bytes()) {
            return Err(EventStreamError::Encoding(format!(
                "Invalid header name {:?}: {}",
                self.name, reason
            )));
        }

        // Validate the value before writing the name so a rejected header
        // leaves `dst` untouched.
        match &self.value {
            HeaderValue::ByteArray(bytes) => check_value_len("ByteArray", bytes.len())?,
            HeaderValue::String(s) => check_value_len("String", s.len())?,
            _ => {}
        }

        dst.reserve(self.encoded_len());
        dst.put_u8(self.name.len() as u8);
        dst.put_slice(self.name.as_bytes());
        self.value.encode_into(dst)
    }

    /// Decode one header starting at `offset`.
    ///
    /// Returns the header and the number of bytes consumed.
    pub fn decode(buf: &[u8], offset: usize) -> Result<(Header, usize)> {
        let name_len = take(buf, offset, 1, "header name length")?[0] as usize;
        let raw_name = take(buf, offset + 1, name_len, "header name")?;
        check_name(raw_name).map_err(|reason| {
            EventStreamError::Protocol(format!("Invalid header name: {}", reason))
        })?;
        // ASCII was checked above, so this cannot fail.
        let name = String::from_utf8_lossy(raw_name).into_owned();

        let (value, value_len) = HeaderValue::decode(buf, offset + 1 + name_len)?;
        Ok((Header { name, value }, 1 + name_len + value_len))
    }
}

/// Encode a sequence of headers, in order, into `dst`.
pub fn encode_headers(headers: &[Header], dst: &mut BytesMut) -> Result<()> {
    for header in headers {
        header.encode_into(dst)?;
    }
    Ok(())
}

/// Decode a complete header block.
///
/// The block must be consumed exactly; a header running past its end is a
/// protocol error. Duplicate names are rejected.
pub fn decode_headers(block: &[u8]) -> Result<Vec<Header>> {
    let mut headers: Vec<Header> = Vec::new();
    let mut offset = 0;

    while offset < block.len() {
        let (header, consumed) = Header::decode(block, offset)?;
        if headers.iter().any(|h| h.name == header.name) {
            return Err(EventStreamError::Protocol(format!(
                "Duplicate header name: {}",
                header.name
            )));
        }
        headers.push(header);
        offset += consumed;
    }

    Ok(headers)
}

fn check_name(name: &[u8]) -> std::result::Result<(), &'static str> {
    if name.is_empty() {
        return Err("name must not be empty");
    }
    if name.len() > MAX_HEADER_NAME_LEN {
        return Err("name longer than 255 bytes");
    }
    if !name.is_ascii() {
        return Err("name must be ASCII");
    }
    Ok(())
}

fn check_value_len(kind: &str, len: usize) -> Result<()> {
    if len > MAX_HEADER_VALUE_LEN {
        return Err(EventStreamError::Encoding(format!(
            "HeaderValue {} too long: {} bytes (max {})",
            kind, len, MAX_HEADER_VALUE_LEN
        )));
    }
    Ok(())
}

fn take<'a>(buf: &'a [u8], offset: usize, len: usize, what: &str) -> Result<&'a [u8]> {
    offset
        .checked_add(len)
        .and_then(|end| buf.get(offset..end))
        .ok_or_else(|| {
            EventStreamError::Protocol(format!(
                "Not enough bytes for {}: need {}, have {}",
                what,
                len,
                buf.len().saturating_sub(offset)
            ))
        })
}

fn read_i64(buf: &[u8], offset: usize, what: &str) -> Result<i64> {
    let b = take(buf, offset, 8, what)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(b);
    Ok(i64::from_be_bytes(raw))
}
