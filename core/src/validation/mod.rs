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

//! Two-layer payload validation (spec §4.4): stateless structural checks live on the entities
//! themselves (`ATV::verify_structure`, `VTB::check_structure`); this module holds the shared
//! error taxonomy plus the structural entry points the coordinator calls before it attempts any
//! contextual (tree-dependent) check.

use thiserror::Error;

use crate::entities::{atv::ATV, vtb::VTB};

#[derive(Debug, Error, Eq, PartialEq)]
pub enum PayloadError {
    #[error("signature does not verify")]
    BadSignature,
    #[error("merkle path does not hash to the declared root")]
    BadMerkle,
    #[error("block of proof fails its own proof-of-work target")]
    BadWork,
    #[error("duplicate endorsement id within container")]
    DuplicateId,
    #[error("containing block is not known to its tree")]
    UnknownContainingBlock,
    #[error("block of proof is not known to the BTC tree")]
    UnknownBlockOfProof,
    #[error("referenced VBK context blocks do not chain to a known tip")]
    BadContext,
}

/// Runs `ATV::verify_structure`, translating the combined boolean into the specific
/// `PayloadError` variant the failure corresponds to, so callers get an actionable `ValidationState`.
pub fn validate_atv_structure(atv: &ATV) -> Result<(), PayloadError> {
    if !atv.transaction.verify_signature() {
        return Err(PayloadError::BadSignature);
    }
    if !atv.merkle_path.verify(&atv.containing_block.merkle_root) {
        return Err(PayloadError::BadMerkle);
    }
    Ok(())
}

/// Runs `VTB::check_structure`'s three checks individually so the first failing one is reported.
pub fn validate_vtb_structure(vtb: &VTB) -> Result<(), PayloadError> {
    if !vtb.transaction.verify_signature() {
        return Err(PayloadError::BadSignature);
    }
    if !vtb.transaction.verify_block_of_proof_pow() {
        return Err(PayloadError::BadWork);
    }
    if !vtb.merkle_path.verify(&vtb.containing_block.merkle_root) {
        return Err(PayloadError::BadMerkle);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::{vbk_pop_tx::VbkPopTx, vbk_tx::{PublicationData, VbkTx}, vbk_block::VbkBlock, btc_block::BtcBlock, merkle_path::VbkMerklePath};
    use altpop_common_types::{Hash128, Hash256, Hash72};

    #[test]
    fn atv_with_bad_signature_is_rejected() {
        let atv = ATV {
            version: 1,
            transaction: VbkTx {
                source_address: vec![1],
                publication_data: PublicationData {
                    identifier: 1,
                    header: vec![],
                    payout_info: vec![],
                    context_info: vec![],
                },
                signature: vec![0u8; 70],
                public_key: vec![0u8; 33],
            },
            merkle_path: VbkMerklePath {
                index: 0,
                subject: Hash256::sha256(b"leaf"),
                layers: vec![],
            },
            containing_block: VbkBlock {
                height: 1,
                version: 2,
                previous_block: altpop_common_types::Hash96::default(),
                previous_keystone: Hash72::default(),
                second_previous_keystone: Hash72::default(),
                merkle_root: Hash128::default(),
                timestamp: 1,
                difficulty: 1,
                nonce: 1,
            },
        };
        assert_eq!(validate_atv_structure(&atv).unwrap_err(), PayloadError::BadSignature);
    }

    #[test]
    fn vtb_with_failing_block_of_proof_pow_is_rejected_after_signature() {
        let secp = secp256k1::Secp256k1::new();
        let (sk, pk) = secp.generate_keypair(&mut rand::thread_rng());
        let vbk_block = VbkBlock {
            height: 1,
            version: 2,
            previous_block: altpop_common_types::Hash96::default(),
            previous_keystone: Hash72::default(),
            second_previous_keystone: Hash72::default(),
            merkle_root: Hash128::default(),
            timestamp: 1,
            difficulty: 1,
            nonce: 1,
        };
        let digest = Hash256::sha256d(&vbk_block.to_vbk_encoding());
        let msg = secp256k1::Message::from_digest_slice(digest.as_slice()).unwrap();
        let sig = secp.sign_ecdsa(&msg, &sk);

        let vtb = VTB::new(
            1,
            VbkPopTx {
                address: vec![],
                published_block: vbk_block.clone(),
                block_of_proof: BtcBlock {
                    version: 1,
                    previous_hash: Hash256::default(),
                    merkle_root: Hash256::default(),
                    timestamp: 1,
                    bits: 0x1d00_ffff,
                    nonce: 0,
                },
                block_of_proof_context: vec![],
                signature: sig.serialize_der().to_vec(),
                public_key: pk.serialize().to_vec(),
            },
            VbkMerklePath {
                index: 0,
                subject: Hash256::sha256(b"leaf"),
                layers: vec![],
            },
            vbk_block,
        );
        assert_eq!(validate_vtb_structure(&vtb).unwrap_err(), PayloadError::BadWork);
    }
}
