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
use serde::{Deserialize, Serialize};

use crate::{
    codec::{CodecResult, ReadCursor, WriteCursor},
    entities::{merkle_path::VbkMerklePath, vbk_block::VbkBlock, vbk_tx::VbkTx},
};

/// Altchain-to-Veriblock proof: a signed VBK transaction, its Merkle path into `containing_block`,
/// and the containing VBK block itself. Proves an ALT block was endorsed in VBK.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ATV {
    pub version: u32,
    pub transaction: VbkTx,
    pub merkle_path: VbkMerklePath,
    pub containing_block: VbkBlock,
}

impl ATV {
    pub fn to_vbk_encoding(&self) -> Vec<u8> {
        let mut w = WriteCursor::new();
        w.write_be::<u32>(self.version);
        w.write_var_len_value(&self.transaction.to_vbk_encoding());
        w.write_var_len_value(&self.merkle_path.to_vbk_encoding());
        w.write_var_len_value(&self.containing_block.to_vbk_encoding());
        w.into_vec()
    }

    pub fn from_vbk_encoding(bytes: &[u8]) -> CodecResult<Self> {
        let mut r = ReadCursor::new(bytes);
        let version = r.read_be::<u32>()?;
        let transaction = VbkTx::from_vbk_encoding(&r.read_var_len_value(16384)?)?;
        let merkle_path = VbkMerklePath::from_vbk_encoding(&r.read_var_len_value(4096)?)?;
        let containing_block = VbkBlock::from_vbk_encoding(&r.read_var_len_value(256)?)?;
        Ok(Self {
            version,
            transaction,
            merkle_path,
            containing_block,
        })
    }

    /// `ATV.id = SHA256(ATV.to_vbk_encoding())`.
    pub fn id(&self) -> Hash256 {
        Hash256::sha256(&self.to_vbk_encoding())
    }

    /// Stateless structural check: the transaction's signature verifies, and its Merkle path hashes
    /// to `containing_block`'s declared merkle root.
    pub fn verify_structure(&self) -> bool {
        self.transaction.verify_signature() && self.merkle_path.verify(&self.containing_block.merkle_root)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::vbk_tx::PublicationData;
    use altpop_common_types::{Hash128, Hash72};

    fn sample_atv() -> ATV {
        ATV {
            version: 1,
            transaction: VbkTx {
                source_address: vec![1, 2, 3],
                publication_data: PublicationData {
                    identifier: 1,
                    header: vec![9, 9],
                    payout_info: vec![],
                    context_info: vec![],
                },
                signature: vec![0u8; 70],
                public_key: vec![0u8; 33],
            },
            merkle_path: VbkMerklePath {
                index: 0,
                subject: Hash256::sha256(b"leaf"),
                layers: vec![Hash256::sha256(b"sib")],
            },
            containing_block: VbkBlock {
                height: 42,
                version: 2,
                previous_block: altpop_common_types::Hash96::default(),
                previous_keystone: Hash72::default(),
                second_previous_keystone: Hash72::default(),
                merkle_root: Hash128::default(),
                timestamp: 1,
                difficulty: 1,
                nonce: 1,
            },
        }
    }

    #[test]
    fn round_trip_encoding() {
        let atv = sample_atv();
        let bytes = atv.to_vbk_encoding();
        let decoded = ATV::from_vbk_encoding(&bytes).unwrap();
        assert_eq!(atv, decoded);
        assert_eq!(atv.id(), decoded.id());
    }

    #[test]
    fn id_changes_with_content() {
        let a = sample_atv();
        let mut b = sample_atv();
        b.containing_block.nonce = 2;
        assert_ne!(a.id(), b.id());
    }
}
