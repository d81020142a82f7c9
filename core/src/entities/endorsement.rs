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

use altpop_common_types::{Hash192, Hash256};
use serde::{Deserialize, Serialize};

/// Binds a VBK block to the BTC block that contains its endorsing transaction.
///
/// `id = SHA256(tx_id || endorsed_hash || block_of_proof_hash || containing_hash)`, per spec.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct VbkEndorsement {
    pub id: Hash256,
    pub endorsed_hash: Hash192,
    pub containing_hash: Hash192,
    pub block_of_proof_hash: Hash256,
    pub payout_info: Vec<u8>,
}

impl VbkEndorsement {
    pub fn compute_id(
        tx_id: &Hash256,
        endorsed_hash: &Hash192,
        block_of_proof_hash: &Hash256,
        containing_hash: &Hash192,
    ) -> Hash256 {
        let mut buf = Vec::with_capacity(32 + 24 + 32 + 24);
        buf.extend_from_slice(tx_id.as_slice());
        buf.extend_from_slice(endorsed_hash.as_slice());
        buf.extend_from_slice(block_of_proof_hash.as_slice());
        buf.extend_from_slice(containing_hash.as_slice());
        Hash256::sha256(&buf)
    }

    pub fn new(
        tx_id: Hash256,
        endorsed_hash: Hash192,
        block_of_proof_hash: Hash256,
        containing_hash: Hash192,
        payout_info: Vec<u8>,
    ) -> Self {
        let id = Self::compute_id(&tx_id, &endorsed_hash, &block_of_proof_hash, &containing_hash);
        Self {
            id,
            endorsed_hash,
            containing_hash,
            block_of_proof_hash,
            payout_info,
        }
    }
}

/// Binds an ALT block to the VBK block that contains its endorsing ATV. ALT has no direct BTC
/// anchor of its own; the transitive BTC work behind an `AltEndorsement` is discovered by walking
/// `containing_hash` through the VBK tree to whatever `VbkEndorsement`s sit on its ancestry, which
/// is exactly what `AltTree`'s fork-choice comparator does (§4.5).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AltEndorsement {
    pub id: Hash256,
    pub endorsed_hash: Vec<u8>,
    pub containing_hash: Hash192,
    pub payout_info: Vec<u8>,
}

impl AltEndorsement {
    pub fn compute_id(tx_id: &Hash256, endorsed_hash: &[u8], containing_hash: &Hash192) -> Hash256 {
        let mut buf = Vec::with_capacity(32 + endorsed_hash.len() + 24);
        buf.extend_from_slice(tx_id.as_slice());
        buf.extend_from_slice(endorsed_hash);
        buf.extend_from_slice(containing_hash.as_slice());
        Hash256::sha256(&buf)
    }

    pub fn new(tx_id: Hash256, endorsed_hash: Vec<u8>, containing_hash: Hash192, payout_info: Vec<u8>) -> Self {
        let id = Self::compute_id(&tx_id, &endorsed_hash, &containing_hash);
        Self {
            id,
            endorsed_hash,
            containing_hash,
            payout_info,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn vbk_endorsement_id_is_deterministic() {
        let tx_id = Hash256::sha256(b"tx");
        let endorsed = Hash192::default();
        let proof = Hash256::sha256(b"btc");
        let containing = Hash192::default();
        let a = VbkEndorsement::new(tx_id, endorsed, proof, containing, vec![]);
        let b = VbkEndorsement::new(tx_id, endorsed, proof, containing, vec![]);
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn alt_endorsement_id_changes_with_endorsed_hash() {
        let tx_id = Hash256::sha256(b"tx");
        let containing = Hash192::default();
        let a = AltEndorsement::new(tx_id, vec![1, 2, 3], containing, vec![]);
        let b = AltEndorsement::new(tx_id, vec![4, 5, 6], containing, vec![]);
        assert_ne!(a.id, b.id);
    }
}
