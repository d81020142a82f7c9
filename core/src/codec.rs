// Copyright 2024. The Alt-PoP Development Community
//
// Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
// following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
// disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
// following disclaimer in the documentation and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
// products derived from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
// INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
// WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
// USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! Big/little-endian fixed-width integer codec and a bounds-checked cursor over a byte buffer.
//!
//! Mirrors the `ReadStream`/`WriteStream` pair of the original C++ implementation: a cursor
//! position that only moves forward, and errors instead of panics on truncated input.

use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum CodecError {
    #[error("read past end of buffer: needed {needed} bytes, {remaining} remaining")]
    ReadOob { needed: usize, remaining: usize },
    #[error("declared length {declared} exceeds maximum allowed {max_len}")]
    LenOverflow { declared: usize, max_len: usize },
    #[error("length-of-length byte {0} exceeds 8 bytes")]
    BadLengthWidth(u8),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// A capability trait for the fixed-width unsigned integers the wire format uses. Sealed so only
/// `u8`/`u16`/`u32`/`u64` ever implement it.
pub trait FixedWidthInt: Sized + Copy {
    const WIDTH: usize;

    fn from_be_bytes(bytes: &[u8]) -> Self;
    fn from_le_bytes(bytes: &[u8]) -> Self;
    fn to_be_bytes_vec(self) -> Vec<u8>;
    fn to_le_bytes_vec(self) -> Vec<u8>;
    fn to_usize(self) -> usize;
}

macro_rules! impl_fixed_width_int {
    ($t:ty) => {
        impl FixedWidthInt for $t {
            const WIDTH: usize = std::mem::size_of::<$t>();

            fn from_be_bytes(bytes: &[u8]) -> Self {
                let mut buf = [0u8; Self::WIDTH];
                buf.copy_from_slice(bytes);
                <$t>::from_be_bytes(buf)
            }

            fn from_le_bytes(bytes: &[u8]) -> Self {
                let mut buf = [0u8; Self::WIDTH];
                buf.copy_from_slice(bytes);
                <$t>::from_le_bytes(buf)
            }

            fn to_be_bytes_vec(self) -> Vec<u8> {
                self.to_be_bytes().to_vec()
            }

            fn to_le_bytes_vec(self) -> Vec<u8> {
                self.to_le_bytes().to_vec()
            }

            fn to_usize(self) -> usize {
                self as usize
            }
        }
    };
}

impl_fixed_width_int!(u8);
impl_fixed_width_int!(u16);
impl_fixed_width_int!(u32);
impl_fixed_width_int!(u64);

/// A read-only, bounds-checked cursor over a byte slice. Never panics on malformed input: every
/// read that would run past the end of the buffer returns `CodecError::ReadOob`.
pub struct ReadCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ReadCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(CodecError::ReadOob {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_be<T: FixedWidthInt>(&mut self) -> CodecResult<T> {
        let bytes = self.take(T::WIDTH)?;
        Ok(T::from_be_bytes(bytes))
    }

    pub fn read_le<T: FixedWidthInt>(&mut self) -> CodecResult<T> {
        let bytes = self.take(T::WIDTH)?;
        Ok(T::from_le_bytes(bytes))
    }

    /// Reads exactly `n` bytes.
    pub fn read_slice(&mut self, n: usize) -> CodecResult<Vec<u8>> {
        Ok(self.take(n)?.to_vec())
    }

    /// Reads a fixed-width array of `N` bytes.
    pub fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// One length-of-length byte, then that many big-endian length bytes, then the payload.
    /// Errors `LenOverflow` if the decoded length exceeds `max_len`.
    pub fn read_var_len_value(&mut self, max_len: usize) -> CodecResult<Vec<u8>> {
        let len_width = self.read_be::<u8>()? as usize;
        if len_width > 8 {
            return Err(CodecError::BadLengthWidth(len_width as u8));
        }
        let len_bytes = self.take(len_width)?;
        let mut declared = 0u64;
        for b in len_bytes {
            declared = (declared << 8) | (*b as u64);
        }
        let declared = declared as usize;
        if declared > max_len {
            return Err(CodecError::LenOverflow { declared, max_len });
        }
        self.read_slice(declared)
    }
}

/// A growable byte buffer with the mirrored write primitives of `ReadCursor`.
#[derive(Default)]
pub struct WriteCursor {
    buf: Vec<u8>,
}

impl WriteCursor {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_be<T: FixedWidthInt>(&mut self, value: T) {
        self.buf.extend(value.to_be_bytes_vec());
    }

    pub fn write_le<T: FixedWidthInt>(&mut self, value: T) {
        self.buf.extend(value.to_le_bytes_vec());
    }

    pub fn write_slice(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Mirrors `read_var_len_value`: writes the minimal length-of-length byte, the big-endian
    /// length, then the payload.
    pub fn write_var_len_value(&mut self, data: &[u8]) {
        let len = data.len() as u64;
        let len_bytes = len.to_be_bytes();
        let first_nonzero = len_bytes.iter().position(|b| *b != 0).unwrap_or(7);
        let trimmed = &len_bytes[first_nonzero..];
        self.write_be::<u8>(trimmed.len() as u8);
        self.buf.extend_from_slice(trimmed);
        self.buf.extend_from_slice(data);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip_integers() {
        let mut w = WriteCursor::new();
        w.write_be::<u32>(0xdead_beef);
        w.write_le::<u16>(0x1234);
        let bytes = w.into_vec();
        let mut r = ReadCursor::new(&bytes);
        assert_eq!(r.read_be::<u32>().unwrap(), 0xdead_beef);
        assert_eq!(r.read_le::<u16>().unwrap(), 0x1234);
    }

    #[test]
    fn read_oob_on_truncated_buffer() {
        let bytes = [0u8; 2];
        let mut r = ReadCursor::new(&bytes);
        assert_eq!(
            r.read_be::<u32>().unwrap_err(),
            CodecError::ReadOob { needed: 4, remaining: 2 }
        );
    }

    #[test]
    fn var_len_round_trip() {
        let mut w = WriteCursor::new();
        w.write_var_len_value(b"hello pop");
        let bytes = w.into_vec();
        let mut r = ReadCursor::new(&bytes);
        assert_eq!(r.read_var_len_value(64).unwrap(), b"hello pop".to_vec());
    }

    #[test]
    fn var_len_overflow_rejected() {
        let mut w = WriteCursor::new();
        w.write_var_len_value(&[0u8; 100]);
        let bytes = w.into_vec();
        let mut r = ReadCursor::new(&bytes);
        assert_eq!(
            r.read_var_len_value(10).unwrap_err(),
            CodecError::LenOverflow { declared: 100, max_len: 10 }
        );
    }
}
