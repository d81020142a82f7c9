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

use serde::{Deserialize, Serialize};

use crate::entities::header::Header;

/// An embedder-defined alt-chain block. Everything but hash/previous_hash/timestamp/height is
/// opaque to this engine, matching `original_source/include/veriblock/entities/altblock.hpp`
/// (`height_t = int32_t`, `hash_t = vector<uint8_t>`): the embedder is the only party that knows
/// how to parse or produce the rest of its own header.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AltBlock {
    pub hash: Vec<u8>,
    pub previous_hash: Vec<u8>,
    pub timestamp: u32,
    pub height: i32,
}

impl Header for AltBlock {
    type Hash = Vec<u8>;

    fn hash(&self) -> Vec<u8> {
        self.hash.clone()
    }

    fn previous_hash(&self) -> Vec<u8> {
        self.previous_hash.clone()
    }

    fn timestamp(&self) -> u32 {
        self.timestamp
    }

    fn declared_height(&self) -> Option<i32> {
        Some(self.height)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn header_accessors_reflect_fields() {
        let block = AltBlock {
            hash: vec![1, 2, 3],
            previous_hash: vec![0, 0, 0],
            timestamp: 100,
            height: 7,
        };
        assert_eq!(block.hash(), vec![1, 2, 3]);
        assert_eq!(block.previous_hash(), vec![0, 0, 0]);
        assert_eq!(block.declared_height(), Some(7));
    }
}
