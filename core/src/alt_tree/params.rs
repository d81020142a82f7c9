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

//! One `ChainParams` implementation per chain (spec §9 design note), each holding the
//! embedder-supplied genesis and consensus constants explicitly — no global state (spec §5).

use altpop_common_types::ChainWork;
use primitive_types::U256;

use crate::{
    block_tree::{BlockIndex, ChainParams},
    entities::{btc_block::BtcBlock, btc_block::BtcHeader, header::Header, vbk_block::VbkBlock, vbk_block::VbkHeader, AltBlock},
    pow,
};

/// BTC chain parameters: genesis header plus standard Bitcoin-style retargeting constants.
/// Outside a retarget boundary, `check_difficulty` requires `bits` to be unchanged from the prior
/// block, matching Bitcoin's own rule; `retarget_interval = u32::MAX` disables retargeting
/// entirely for chains (e.g. regtest-style test fixtures) that never reach a boundary.
#[derive(Clone, Debug)]
pub struct BtcChainParams {
    pub genesis: BtcBlock,
    pub pow_limit: U256,
    pub retarget_interval: u32,
    pub target_spacing: u32,
}

impl BtcChainParams {
    pub fn new(genesis: BtcBlock, pow_limit: U256, retarget_interval: u32, target_spacing: u32) -> Self {
        Self {
            genesis,
            pow_limit,
            retarget_interval,
            target_spacing,
        }
    }
}

impl ChainParams<BtcHeader> for BtcChainParams {
    fn genesis_header(&self) -> BtcHeader {
        BtcHeader::new(self.genesis.clone())
    }

    fn block_work(&self, header: &BtcHeader) -> ChainWork {
        pow::work_from_bits(header.block.bits)
    }

    fn check_difficulty(&self, header: &BtcHeader, ancestors: &[&BlockIndex<BtcHeader>]) -> bool {
        let Some(parent) = ancestors.first() else {
            return true;
        };
        let next_height = parent.height + 1;
        if self.retarget_interval == 0 || next_height as u32 % self.retarget_interval != 0 {
            return header.block.bits == parent.header.block.bits;
        }
        let window = ancestors.len();
        let Some(first) = ancestors.get(window.saturating_sub(1)) else {
            return header.block.bits == parent.header.block.bits;
        };
        let expected = pow::retarget(
            first.header.block.timestamp,
            parent.header.block.timestamp,
            parent.header.block.bits,
            self.retarget_interval,
            self.target_spacing,
            self.pow_limit,
        );
        header.block.bits == expected
    }

    fn verify_proof_of_work(&self, header: &BtcHeader) -> bool {
        header.block.check_pow()
    }

    fn check_block_time(&self, header: &BtcHeader, recent: &[u32]) -> bool {
        pow::check_median_time_past(header.block.timestamp, recent)
    }

    fn difficulty_window(&self) -> usize {
        self.retarget_interval.max(1) as usize
    }
}

/// VBK chain parameters. VBK's difficulty retargeting follows the same bounded-ratio algorithm as
/// BTC (`pow::retarget`); the original's keystone-aware "progpow"-adjacent algorithm is out of
/// scope (this engine verifies, never mines).
#[derive(Clone, Debug)]
pub struct VbkChainParams {
    pub genesis: VbkBlock,
    pub pow_limit: U256,
    pub retarget_interval: u32,
    pub target_spacing: u32,
}

impl VbkChainParams {
    pub fn new(genesis: VbkBlock, pow_limit: U256, retarget_interval: u32, target_spacing: u32) -> Self {
        Self {
            genesis,
            pow_limit,
            retarget_interval,
            target_spacing,
        }
    }
}

impl ChainParams<VbkHeader> for VbkChainParams {
    fn genesis_header(&self) -> VbkHeader {
        VbkHeader::new(self.genesis.clone())
    }

    fn block_work(&self, header: &VbkHeader) -> ChainWork {
        pow::work_from_bits(header.block.difficulty)
    }

    fn check_difficulty(&self, header: &VbkHeader, ancestors: &[&BlockIndex<VbkHeader>]) -> bool {
        let Some(parent) = ancestors.first() else {
            return true;
        };
        let next_height = parent.height + 1;
        if self.retarget_interval == 0 || next_height as u32 % self.retarget_interval != 0 {
            return header.block.difficulty == parent.header.block.difficulty;
        }
        let window = ancestors.len();
        let Some(first) = ancestors.get(window.saturating_sub(1)) else {
            return header.block.difficulty == parent.header.block.difficulty;
        };
        let expected = pow::retarget(
            first.header.block.timestamp,
            parent.header.block.timestamp,
            parent.header.block.difficulty,
            self.retarget_interval,
            self.target_spacing,
            self.pow_limit,
        );
        header.block.difficulty == expected
    }

    fn verify_proof_of_work(&self, header: &VbkHeader) -> bool {
        header.block.check_pow()
    }

    fn check_block_time(&self, header: &VbkHeader, recent: &[u32]) -> bool {
        pow::check_median_time_past(header.block.timestamp, recent)
    }

    fn difficulty_window(&self) -> usize {
        self.retarget_interval.max(1) as usize
    }
}

/// ALT chain parameters. ALT headers are embedder-opaque: difficulty and timestamp rules are the
/// embedder's problem, not this engine's (spec §4.3); `block_work` returns a constant so ALT
/// `chain_work` is purely height-proportional and never itself decides fork choice (§4.5
/// overrides the comparison with `comparePopScore`).
#[derive(Clone, Debug)]
pub struct AltChainParams {
    pub genesis: AltBlock,
}

impl AltChainParams {
    pub fn new(genesis: AltBlock) -> Self {
        Self { genesis }
    }
}

impl ChainParams<AltBlock> for AltChainParams {
    fn genesis_header(&self) -> AltBlock {
        self.genesis.clone()
    }

    fn block_work(&self, _header: &AltBlock) -> ChainWork {
        ChainWork::from_u64(1)
    }

    fn check_difficulty(&self, _header: &AltBlock, _ancestors: &[&BlockIndex<AltBlock>]) -> bool {
        true
    }

    fn check_block_time(&self, _header: &AltBlock, _recent: &[u32]) -> bool {
        true
    }

    fn median_time_past_window(&self) -> usize {
        0
    }

    fn difficulty_window(&self) -> usize {
        1
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use altpop_common_types::Hash256;

    #[test]
    fn btc_params_genesis_hash_matches_block() {
        let genesis = BtcBlock {
            version: 1,
            previous_hash: Hash256::default(),
            merkle_root: Hash256::sha256(b"genesis"),
            timestamp: 1_000_000,
            bits: 0x207f_ffff,
            nonce: 0,
        };
        let params = BtcChainParams::new(genesis.clone(), pow::compact_to_target(0x207f_ffff), u32::MAX, 600);
        assert_eq!(params.genesis_header().hash(), genesis.compute_hash());
    }
}
