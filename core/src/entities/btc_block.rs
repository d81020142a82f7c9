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

use altpop_common_types::Hash256;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{
    codec::{CodecResult, ReadCursor, WriteCursor},
    entities::header::Header,
    pow::meets_target,
};

/// A Bitcoin block header. Identical wire layout to Bitcoin's 80-byte header.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BtcBlock {
    pub version: u32,
    pub previous_hash: Hash256,
    pub merkle_root: Hash256,
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl BtcBlock {
    pub fn to_vbk_encoding(&self) -> Vec<u8> {
        let mut w = WriteCursor::new();
        self.write(&mut w);
        w.into_vec()
    }

    fn write(&self, w: &mut WriteCursor) {
        w.write_le::<u32>(self.version);
        w.write_slice(self.previous_hash.as_slice());
        w.write_slice(self.merkle_root.as_slice());
        w.write_le::<u32>(self.timestamp);
        w.write_le::<u32>(self.bits);
        w.write_le::<u32>(self.nonce);
    }

    pub fn from_vbk_encoding(bytes: &[u8]) -> CodecResult<Self> {
        let mut r = ReadCursor::new(bytes);
        Ok(Self {
            version: r.read_le::<u32>()?,
            previous_hash: Hash256::from_bytes(r.read_array::<32>()?),
            merkle_root: Hash256::from_bytes(r.read_array::<32>()?),
            timestamp: r.read_le::<u32>()?,
            bits: r.read_le::<u32>()?,
            nonce: r.read_le::<u32>()?,
        })
    }

    /// Double-SHA256 of the 80-byte header, reversed to big-endian display order is NOT done
    /// here; the hash is kept in its natural little-endian digest form throughout the engine.
    pub fn compute_hash(&self) -> Hash256 {
        Hash256::sha256d(&self.to_vbk_encoding())
    }

    /// Verifies the header's own proof-of-work target: `hash(header) <= target(bits)`.
    pub fn check_pow(&self) -> bool {
        let hash = self.compute_hash();
        let as_uint = U256::from_big_endian(hash.as_slice());
        meets_target(as_uint, self.bits)
    }
}

/// A `BtcBlock` paired with the height/previous-hash it was accepted at, since the raw header
/// alone doesn't carry `Header::hash()` cheaply without recomputation; `BtcHeader` is the type the
/// BTC `BlockTree` is instantiated over.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BtcHeader {
    pub block: BtcBlock,
    hash: Hash256,
}

impl BtcHeader {
    pub fn new(block: BtcBlock) -> Self {
        let hash = block.compute_hash();
        Self { block, hash }
    }
}

impl Header for BtcHeader {
    type Hash = Hash256;

    fn hash(&self) -> Hash256 {
        self.hash
    }

    fn previous_hash(&self) -> Hash256 {
        self.block.previous_hash
    }

    fn timestamp(&self) -> u32 {
        self.block.timestamp
    }

    fn declared_height(&self) -> Option<i32> {
        None
    }
}
