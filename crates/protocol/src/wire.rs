//! Primitive field encodings shared by every packet.
//!
//! Integers and floats are big-endian. VarInts are little-endian base-128 groups,
//! at most five bytes. Strings and byte arrays are prefixed with a VarInt length.

use crate::error::ProtocolError;
use crate::message::BlockPosition;
use crate::version::ProtocolVersion;
use bytes::{Buf, BufMut};
use uuid::Uuid;

/// Longest VarInt encoding of an `i32`.
pub const MAX_VAR_INT_LEN: usize = 5;

type Result<T> = std::result::Result<T, ProtocolError>;

/// Checked readers over any [`Buf`]. Running out of bytes is a malformed packet.
pub trait WireRead: Buf {
    /// Fail unless `n` more bytes are available.
    fn ensure(&self, n: usize, what: &str) -> Result<()> {
        if self.remaining() < n {
            return Err(ProtocolError::malformed(format!(
                "need {n} bytes for {what}, {} left",
                self.remaining()
            )));
        }
        Ok(())
    }

    /// Read a boolean encoded as `0x00` or `0x01`.
    fn read_bool(&mut self) -> Result<bool> {
        self.ensure(1, "bool")?;
        match self.get_u8() {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ProtocolError::InvalidValue {
                field: "bool",
                reason: format!("byte {other:#04x}"),
            }),
        }
    }

    /// Read an unsigned byte.
    fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1, "u8")?;
        Ok(self.get_u8())
    }

    /// Read a signed byte.
    fn read_i8(&mut self) -> Result<i8> {
        self.ensure(1, "i8")?;
        Ok(self.get_i8())
    }

    /// Read an unsigned short.
    fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2, "u16")?;
        Ok(self.get_u16())
    }

    /// Read a signed short.
    fn read_i16(&mut self) -> Result<i16> {
        self.ensure(2, "i16")?;
        Ok(self.get_i16())
    }

    /// Read a signed int.
    fn read_i32(&mut self) -> Result<i32> {
        self.ensure(4, "i32")?;
        Ok(self.get_i32())
    }

    /// Read a signed long.
    fn read_i64(&mut self) -> Result<i64> {
        self.ensure(8, "i64")?;
        Ok(self.get_i64())
    }

    /// Read a float.
    fn read_f32(&mut self) -> Result<f32> {
        self.ensure(4, "f32")?;
        Ok(self.get_f32())
    }

    /// Read a double.
    fn read_f64(&mut self) -> Result<f64> {
        self.ensure(8, "f64")?;
        Ok(self.get_f64())
    }

    /// Read a VarInt.
    fn read_var_int(&mut self) -> Result<i32> {
        let mut value: u32 = 0;
        for group in 0..MAX_VAR_INT_LEN {
            self.ensure(1, "VarInt")?;
            let byte = self.get_u8();
            value |= u32::from(byte & 0x7F) << (7 * group);
            if byte & 0x80 == 0 {
                return Ok(value as i32);
            }
        }
        Err(ProtocolError::malformed("VarInt longer than 5 bytes"))
    }

    /// Read a VarInt that must be a non-negative length.
    fn read_len(&mut self, what: &str) -> Result<usize> {
        let len = self.read_var_int()?;
        usize::try_from(len)
            .map_err(|_| ProtocolError::malformed(format!("negative length {len} for {what}")))
    }

    /// Read a length-prefixed UTF-8 string.
    fn read_string(&mut self) -> Result<String> {
        let len = self.read_len("string")?;
        self.ensure(len, "string body")?;
        let mut bytes = vec![0; len];
        self.copy_to_slice(&mut bytes);
        String::from_utf8(bytes).map_err(|err| ProtocolError::InvalidValue {
            field: "string",
            reason: err.to_string(),
        })
    }

    /// Read a length-prefixed byte array.
    fn read_byte_array(&mut self) -> Result<Vec<u8>> {
        let len = self.read_len("byte array")?;
        self.ensure(len, "byte array body")?;
        let mut bytes = vec![0; len];
        self.copy_to_slice(&mut bytes);
        Ok(bytes)
    }

    /// Read a UUID as two big-endian longs.
    fn read_uuid(&mut self) -> Result<Uuid> {
        self.ensure(16, "uuid")?;
        Ok(Uuid::from_u128(self.get_u128()))
    }

    /// Read a packed block position using the layout of `version`.
    fn read_position(&mut self, version: ProtocolVersion) -> Result<BlockPosition> {
        let packed = self.read_i64()?;
        Ok(BlockPosition::unpack(packed, version))
    }
}

impl<B: Buf> WireRead for B {}

/// Writers over any [`BufMut`].
pub trait WireWrite: BufMut {
    /// Write a boolean as `0x00` or `0x01`.
    fn put_bool(&mut self, value: bool) {
        self.put_u8(u8::from(value));
    }

    /// Write a VarInt.
    fn put_var_int(&mut self, value: i32) {
        let mut rest = value as u32;
        loop {
            if rest & !0x7F == 0 {
                self.put_u8(rest as u8);
                return;
            }
            self.put_u8((rest & 0x7F) as u8 | 0x80);
            rest >>= 7;
        }
    }

    /// Write a length-prefixed UTF-8 string.
    fn put_string(&mut self, value: &str) {
        self.put_var_int(value.len() as i32);
        self.put_slice(value.as_bytes());
    }

    /// Write a length-prefixed byte array.
    fn put_byte_array(&mut self, value: &[u8]) {
        self.put_var_int(value.len() as i32);
        self.put_slice(value);
    }

    /// Write a UUID as two big-endian longs.
    fn put_uuid(&mut self, value: &Uuid) {
        self.put_u128(value.as_u128());
    }

    /// Write a packed block position using the layout of `version`.
    fn put_position(&mut self, value: &BlockPosition, version: ProtocolVersion) {
        self.put_i64(value.pack(version));
    }
}

impl<B: BufMut> WireWrite for B {}

/// Number of bytes `value` takes as a VarInt.
pub fn var_int_len(value: i32) -> usize {
    let mut rest = value as u32;
    let mut len = 1;
    while rest & !0x7F != 0 {
        rest >>= 7;
        len += 1;
    }
    len
}
