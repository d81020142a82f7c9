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

use std::{convert::TryFrom, fmt};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, thiserror::Error)]
#[error("expected {expected} hex-encoded bytes, got {actual}")]
pub struct HexError {
    expected: usize,
    actual: usize,
}

macro_rules! fixed_hash {
    ($name:ident, $len:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
        pub struct $name(#[serde(with = "serde_bytes_array")] [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn as_slice(&self) -> &[u8] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            pub fn from_hex(s: &str) -> Result<Self, HexError> {
                let bytes = hex::decode(s).map_err(|_| HexError {
                    expected: $len,
                    actual: s.len() / 2,
                })?;
                Self::try_from(bytes.as_slice())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self([0u8; $len])
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = HexError;

            fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
                if value.len() != $len {
                    return Err(HexError {
                        expected: $len,
                        actual: value.len(),
                    });
                }
                let mut bytes = [0u8; $len];
                bytes.copy_from_slice(value);
                Ok(Self(bytes))
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }
    };
}

fixed_hash!(Hash72, 9, "72-bit fixed-width hash (truncated VBK keystone reference).");
fixed_hash!(Hash96, 12, "96-bit fixed-width hash (VBK short-id).");
fixed_hash!(Hash128, 16, "128-bit fixed-width hash (truncated VBK merkle root).");
fixed_hash!(Hash192, 24, "192-bit fixed-width hash (full VBK block hash).");
fixed_hash!(Hash256, 32, "256-bit fixed-width hash (BTC/ALT block hash, SHA-256 digest).");

impl Hash192 {
    /// The short-id used wherever a VBK hash needs to fit a 96-bit field: the first 12 bytes.
    pub fn short_id(&self) -> Hash96 {
        let mut out = [0u8; 12];
        out.copy_from_slice(&self.0[..12]);
        Hash96(out)
    }
}

impl Hash256 {
    pub fn sha256(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        Self::try_from(digest.as_slice()).expect("SHA-256 digest is always 32 bytes")
    }

    pub fn sha256d(data: &[u8]) -> Self {
        Self::sha256(&Sha256::digest(data))
    }
}

mod serde_bytes_array {
    use serde::{de::Error, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error> {
        serde_bytes::Bytes::new(bytes).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error> {
        let slice: Vec<u8> = serde_bytes::ByteBuf::deserialize(deserializer)?.into_vec();
        <[u8; N]>::try_from(slice).map_err(|v| D::Error::custom(format!("expected {} bytes, got {}", N, v.len())))
    }
}
