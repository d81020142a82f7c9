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

use altpop_common_types::{Hash128, Hash256};
use serde::{Deserialize, Serialize};

use crate::codec::{CodecResult, ReadCursor, WriteCursor};

/// A Merkle authentication path proving a leaf (a transaction hash) is included under a VBK
/// block's merkle root. `index` is the leaf's position; `layers[i]` is the sibling hash at depth
/// `i`, ordered leaf-to-root, mirroring the tree's bottom-up combine.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct VbkMerklePath {
    pub index: u32,
    pub subject: Hash256,
    pub layers: Vec<Hash256>,
}

impl VbkMerklePath {
    pub fn to_vbk_encoding(&self) -> Vec<u8> {
        let mut w = WriteCursor::new();
        w.write_be::<u32>(self.index);
        w.write_slice(self.subject.as_slice());
        w.write_be::<u32>(self.layers.len() as u32);
        for layer in &self.layers {
            w.write_slice(layer.as_slice());
        }
        w.into_vec()
    }

    pub fn from_vbk_encoding(bytes: &[u8]) -> CodecResult<Self> {
        let mut r = ReadCursor::new(bytes);
        let index = r.read_be::<u32>()?;
        let subject = Hash256::from_bytes(r.read_array::<32>()?);
        let count = r.read_be::<u32>()? as usize;
        let mut layers = Vec::with_capacity(count);
        for _ in 0..count {
            layers.push(Hash256::from_bytes(r.read_array::<32>()?));
        }
        Ok(Self { index, subject, layers })
    }

    /// Walks the path from `subject` to the root, combining with each sibling via `sha256d` of
    /// the ordered pair. At depth `i`, `subject` is the left operand when bit `i` of `index` is
    /// 0, matching the original's layer-index/left-right convention.
    ///
    /// The VBK merkle root is truncated to 16 bytes on the wire (`VbkBlock::merkle_root`), so the
    /// final combined hash is compared against `root` only in its first 16 bytes.
    pub fn verify(&self, root: &Hash128) -> bool {
        let mut acc = self.subject;
        for (depth, sibling) in self.layers.iter().enumerate() {
            let left_is_subject = (self.index >> depth) & 1 == 0;
            let mut buf = Vec::with_capacity(64);
            if left_is_subject {
                buf.extend_from_slice(acc.as_slice());
                buf.extend_from_slice(sibling.as_slice());
            } else {
                buf.extend_from_slice(sibling.as_slice());
                buf.extend_from_slice(acc.as_slice());
            }
            acc = Hash256::sha256d(&buf);
        }
        &acc.as_slice()[..16] == root.as_slice()
    }
}
