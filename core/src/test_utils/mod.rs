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

//! Fixture builders shared by unit tests and `tests/e2e.rs`: genesis blocks, miners for each
//! chain, a trivially-passing Merkle path, and constructors for signed VTBs/ATVs. Mirrors the
//! fixtures inlined in `alt_tree::coordinator`'s own test module, generalized so the integration
//! tests don't have to re-derive them.

use altpop_common_types::{Hash128, Hash256, Hash72, Hash96};
use primitive_types::U256;

use crate::{
    alt_tree::{AltChainParams, AltTree, BtcChainParams, VbkChainParams},
    entities::{
        alt_block::AltBlock,
        atv::ATV,
        btc_block::BtcBlock,
        merkle_path::VbkMerklePath,
        pop_data::PopData,
        vbk_block::VbkBlock,
        vbk_pop_tx::VbkPopTx,
        vbk_tx::{PublicationData, VbkTx},
        vtb::VTB,
    },
    pow,
};

/// Standard "always-on" difficulty used by every fixture chain: `compact_to_target` of this bit
/// pattern is the maximum target, so a single-iteration nonce search always finds a passing block.
pub const EASY_BITS: u32 = 0x207f_ffff;

pub fn btc_genesis() -> BtcBlock {
    BtcBlock {
        version: 1,
        previous_hash: Hash256::default(),
        merkle_root: Hash256::sha256(b"btc-genesis"),
        timestamp: 1_000_000,
        bits: EASY_BITS,
        nonce: 0,
    }
}

/// Mines a BTC block on top of `prev` by brute-force nonce search against `EASY_BITS`'s target.
pub fn mine_btc(prev: Hash256, timestamp: u32) -> BtcBlock {
    let mut block = BtcBlock {
        version: 1,
        previous_hash: prev,
        merkle_root: Hash256::sha256(b"btc-tx"),
        timestamp,
        bits: EASY_BITS,
        nonce: 0,
    };
    let target = pow::compact_to_target(block.bits);
    loop {
        let hash = block.compute_hash();
        if U256::from_big_endian(hash.as_slice()) <= target {
            return block;
        }
        block.nonce += 1;
    }
}

pub fn vbk_genesis() -> VbkBlock {
    VbkBlock {
        height: 0,
        version: 2,
        previous_block: Hash96::default(),
        previous_keystone: Hash72::default(),
        second_previous_keystone: Hash72::default(),
        merkle_root: Hash128::default(),
        timestamp: 1_000_000,
        difficulty: EASY_BITS,
        nonce: 0,
    }
}

/// Mines a VBK block on top of `prev`, referencing it by `short_id()` the way a real VBK header
/// would; `BlockTree::accept_block`'s short-id fallback is what makes this resolvable.
pub fn mine_vbk(prev: &VbkBlock, timestamp: u32) -> VbkBlock {
    let mut block = VbkBlock {
        height: prev.height + 1,
        version: 2,
        previous_block: prev.compute_hash().short_id(),
        previous_keystone: Hash72::default(),
        second_previous_keystone: Hash72::default(),
        merkle_root: Hash128::default(),
        timestamp,
        difficulty: EASY_BITS,
        nonce: 0,
    };
    for nonce in 0..1_000_000u32 {
        block.nonce = nonce;
        if block.check_pow() {
            return block;
        }
    }
    panic!("no passing nonce found within search bound");
}

pub fn alt_genesis() -> AltBlock {
    AltBlock {
        hash: vec![0],
        previous_hash: vec![],
        timestamp: 1_000_000,
        height: 0,
    }
}

/// Builds and bootstraps an `AltTree` over freshly-minted genesis blocks for all three chains,
/// with retargeting disabled (`retarget_interval = u32::MAX`) so fixture chains never need to
/// simulate a retarget boundary.
pub fn fresh_tree() -> AltTree {
    let btc_params = BtcChainParams::new(btc_genesis(), pow::compact_to_target(EASY_BITS), u32::MAX, 600);
    let vbk_params = VbkChainParams::new(vbk_genesis(), pow::compact_to_target(EASY_BITS), u32::MAX, 30);
    let alt_params = AltChainParams::new(alt_genesis());
    let mut tree = AltTree::new(btc_params, vbk_params, alt_params);
    tree.bootstrap().unwrap();
    tree
}

/// A Merkle path with no layers verifies against any root whose first 16 bytes match the all-zero
/// subject; pairing it with every fixture VBK block's default (zero) `merkle_root` keeps Merkle
/// verification trivially satisfied wherever a test doesn't care about it.
pub fn zero_merkle() -> VbkMerklePath {
    VbkMerklePath {
        index: 0,
        subject: Hash256::default(),
        layers: vec![],
    }
}

/// Signs `message`'s SHA-256d digest with a freshly-generated secp256k1 keypair, returning
/// `(der_signature, compressed_public_key)`.
fn sign(message: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let secp = secp256k1::Secp256k1::new();
    let (sk, pk) = secp.generate_keypair(&mut rand::thread_rng());
    let digest = Hash256::sha256d(message);
    let msg = secp256k1::Message::from_digest_slice(digest.as_slice()).unwrap();
    let sig = secp.sign_ecdsa(&msg, &sk);
    (sig.serialize_der().to_vec(), pk.serialize().to_vec())
}

/// Builds a structurally-valid VTB endorsing `published_block` inside `containing_block`, proven
/// by `block_of_proof` (assumed already known to the BTC tree).
pub fn sign_vtb(published_block: VbkBlock, block_of_proof: BtcBlock, containing_block: VbkBlock) -> VTB {
    let mut tx = VbkPopTx {
        address: vec![1, 2, 3],
        published_block,
        block_of_proof,
        block_of_proof_context: vec![],
        signature: vec![],
        public_key: vec![],
    };
    let (sig, pk) = sign(&tx.published_block.to_vbk_encoding());
    tx.signature = sig;
    tx.public_key = pk;
    VTB::new(1, tx, zero_merkle(), containing_block)
}

/// Builds a structurally-valid ATV endorsing `alt_header_bytes` (the embedder's opaque encoding
/// of the endorsed ALT block) inside `containing_block`.
pub fn sign_atv(alt_header_bytes: Vec<u8>, containing_block: VbkBlock) -> ATV {
    let data = PublicationData {
        identifier: 1,
        header: alt_header_bytes,
        payout_info: vec![],
        context_info: vec![],
    };
    let (sig, pk) = sign(&data.to_vbk_encoding());
    let tx = VbkTx {
        source_address: vec![9, 9, 9],
        publication_data: data,
        signature: sig,
        public_key: pk,
    };
    ATV {
        version: 1,
        transaction: tx,
        merkle_path: zero_merkle(),
        containing_block,
    }
}

/// Wraps a single VTB into a minimal `PopData`/`AltPayloads` pair for `container_hash`.
pub fn vtb_payloads(container_hash: Vec<u8>, vtb: VTB) -> crate::entities::alt_payloads::AltPayloads {
    crate::entities::alt_payloads::AltPayloads::new(
        container_hash,
        PopData {
            version: 1,
            context: vec![],
            vtbs: vec![vtb],
            atvs: vec![],
        },
    )
}

/// Wraps a single ATV into a minimal `PopData`/`AltPayloads` pair for `container_hash`.
pub fn atv_payloads(container_hash: Vec<u8>, atv: ATV) -> crate::entities::alt_payloads::AltPayloads {
    crate::entities::alt_payloads::AltPayloads::new(
        container_hash,
        PopData {
            version: 1,
            context: vec![],
            vtbs: vec![],
            atvs: vec![atv],
        },
    )
}

/// Builds a new ALT block extending `prev` with `height = prev.height + 1`.
pub fn alt_block(hash: Vec<u8>, prev: &AltBlock, timestamp: u32) -> AltBlock {
    AltBlock {
        hash,
        previous_hash: prev.hash.clone(),
        timestamp,
        height: prev.height + 1,
    }
}
