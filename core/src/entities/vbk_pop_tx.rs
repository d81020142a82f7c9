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
    entities::{btc_block::BtcBlock, vbk_block::VbkBlock, vbk_tx::verify_ecdsa},
};

/// The VBK PoP transaction carried by a VTB: a signed claim that `published_block` is endorsed by
/// `block_of_proof`, a BTC block. `block_of_proof_context` is the chain of BTC blocks the signer
/// also submitted alongside, used to connect `block_of_proof` back to a block already known to the
/// BTC tree when it isn't the tip.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct VbkPopTx {
    pub address: Vec<u8>,
    pub published_block: VbkBlock,
    pub block_of_proof: BtcBlock,
    pub block_of_proof_context: Vec<BtcBlock>,
    pub signature: Vec<u8>,
    pub public_key: Vec<u8>,
}

impl VbkPopTx {
    pub fn to_vbk_encoding(&self) -> Vec<u8> {
        let mut w = WriteCursor::new();
        w.write_var_len_value(&self.address);
        w.write_var_len_value(&self.published_block.to_vbk_encoding());
        w.write_var_len_value(&self.block_of_proof.to_vbk_encoding());
        w.write_be::<u32>(self.block_of_proof_context.len() as u32);
        for ctx in &self.block_of_proof_context {
            w.write_var_len_value(&ctx.to_vbk_encoding());
        }
        w.write_var_len_value(&self.signature);
        w.write_var_len_value(&self.public_key);
        w.into_vec()
    }

    pub fn from_vbk_encoding(bytes: &[u8]) -> CodecResult<Self> {
        let mut r = ReadCursor::new(bytes);
        let address = r.read_var_len_value(128)?;
        let published_block = VbkBlock::from_vbk_encoding(&r.read_var_len_value(256)?)?;
        let block_of_proof = BtcBlock::from_vbk_encoding(&r.read_var_len_value(80)?)?;
        let context_count = r.read_be::<u32>()? as usize;
        let mut block_of_proof_context = Vec::with_capacity(context_count);
        for _ in 0..context_count {
            block_of_proof_context.push(BtcBlock::from_vbk_encoding(&r.read_var_len_value(80)?)?);
        }
        let signature = r.read_var_len_value(80)?;
        let public_key = r.read_var_len_value(65)?;
        Ok(Self {
            address,
            published_block,
            block_of_proof,
            block_of_proof_context,
            signature,
            public_key,
        })
    }

    pub fn tx_id(&self) -> Hash256 {
        Hash256::sha256(&self.to_vbk_encoding())
    }

    /// Stateless structural check: the signature over `published_block`'s encoding verifies, and
    /// `block_of_proof` satisfies its own proof-of-work target.
    pub fn verify_signature(&self) -> bool {
        verify_ecdsa(&self.published_block.to_vbk_encoding(), &self.signature, &self.public_key)
    }

    pub fn verify_block_of_proof_pow(&self) -> bool {
        self.block_of_proof.check_pow()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use altpop_common_types::{Hash128, Hash72};

    fn sample_vbk_block() -> VbkBlock {
        VbkBlock {
            height: 25,
            version: 2,
            previous_block: altpop_common_types::Hash96::default(),
            previous_keystone: Hash72::default(),
            second_previous_keystone: Hash72::default(),
            merkle_root: Hash128::default(),
            timestamp: 1_553_699_059,
            difficulty: 16_842_752,
            nonce: 1,
        }
    }

    fn sample_btc_block() -> BtcBlock {
        BtcBlock {
            version: 1,
            previous_hash: Hash256::default(),
            merkle_root: Hash256::sha256(b"merkle"),
            timestamp: 1_231_006_505,
            bits: 0x1d00_ffff,
            nonce: 2083236893,
        }
    }

    #[test]
    fn round_trip_encoding() {
        let tx = VbkPopTx {
            address: vec![1, 2, 3],
            published_block: sample_vbk_block(),
            block_of_proof: sample_btc_block(),
            block_of_proof_context: vec![sample_btc_block()],
            signature: vec![0u8; 70],
            public_key: vec![0u8; 33],
        };
        let bytes = tx.to_vbk_encoding();
        let decoded = VbkPopTx::from_vbk_encoding(&bytes).unwrap();
        assert_eq!(tx, decoded);
    }
}
