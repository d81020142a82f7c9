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

use std::cell::Cell;

use altpop_common_types::Hash256;
use serde::{Deserialize, Serialize};

use crate::{
    codec::{CodecResult, ReadCursor, WriteCursor},
    entities::{merkle_path::VbkMerklePath, vbk_block::VbkBlock, vbk_pop_tx::VbkPopTx},
};

/// Veriblock-to-Bitcoin publication: a PoP transaction, its Merkle path, and the VBK block that
/// contains it. Proves a VBK block is endorsed in BTC.
///
/// `checked` is a process-lifetime-only memoization of the stateless structural check (spec §9
/// design notes); it is not part of the wire encoding or equality, and `AltTree::remove_payloads`
/// clears it when the VTB is dropped from the payload store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VTB {
    pub version: u32,
    pub transaction: VbkPopTx,
    pub merkle_path: VbkMerklePath,
    pub containing_block: VbkBlock,
    #[serde(skip)]
    checked: Cell<Option<bool>>,
}

impl PartialEq for VTB {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
impl Eq for VTB {}

impl VTB {
    pub fn new(
        version: u32,
        transaction: VbkPopTx,
        merkle_path: VbkMerklePath,
        containing_block: VbkBlock,
    ) -> Self {
        Self {
            version,
            transaction,
            merkle_path,
            containing_block,
            checked: Cell::new(None),
        }
    }

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
        let transaction = VbkPopTx::from_vbk_encoding(&r.read_var_len_value(16384)?)?;
        let merkle_path = VbkMerklePath::from_vbk_encoding(&r.read_var_len_value(4096)?)?;
        let containing_block = VbkBlock::from_vbk_encoding(&r.read_var_len_value(256)?)?;
        Ok(Self::new(version, transaction, merkle_path, containing_block))
    }

    /// `VTB.id = SHA256(VTB.to_vbk_encoding())`.
    pub fn id(&self) -> Hash256 {
        Hash256::sha256(&self.to_vbk_encoding())
    }

    /// Runs (and memoizes) the stateless structural check: the PoP transaction's signature and
    /// its `block_of_proof`'s own PoW verify, and the Merkle path hashes to `containing_block`'s
    /// declared merkle root.
    pub fn check_structure(&self) -> bool {
        if let Some(result) = self.checked.get() {
            return result;
        }
        let result = self.transaction.verify_signature()
            && self.transaction.verify_block_of_proof_pow()
            && self.merkle_path.verify(&self.containing_block.merkle_root);
        self.checked.set(Some(result));
        result
    }

    /// Clears the memoized structural-check result. Called by `AltTree::remove_payloads`.
    pub fn clear_cache(&self) {
        self.checked.set(None);
    }
}
