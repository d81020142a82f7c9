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

//! The generic block tree: one instantiation per chain (BTC, VBK, ALT), parameterized over the
//! header type `H` and that chain's `ChainParams`. Mirrors `original_source`'s
//! `base_block_index.hpp` template, expressed in Rust as a concrete generic rather than a C++
//! class template (spec §9).

use std::collections::HashMap;

use log::{debug, warn};
use thiserror::Error;

use crate::{
    block_tree::{index::BlockIndex, params::ChainParams, status::BlockStatus},
    entities::header::Header,
};

#[derive(Debug, Error, Eq, PartialEq)]
pub enum TreeError {
    #[error("tree already bootstrapped")]
    AlreadyBootstrapped,
    #[error("tree not yet bootstrapped")]
    NotBootstrapped,
    #[error("no known parent for block")]
    NoParent,
    #[error("block fails its own proof-of-work/declared-work check")]
    BadWork,
    #[error("block timestamp fails the median-time-past rule")]
    BadTime,
    #[error("block already known")]
    Duplicate,
    #[error("block fails the chain's difficulty retarget rule")]
    BadDifficulty,
    #[error("block height does not match prev.height + 1")]
    BadHeight,
    #[error("unknown block hash")]
    UnknownBlock,
}

/// Number of leading bytes of a hash kept in `BlockTree::short_index`. Matches the width of VBK's
/// `previousBlock` short-id reference (`Hash96`, 12 bytes); BTC and ALT headers reference their
/// parent by full hash and never hit the fallback path this index exists for.
const SHORT_ID_LEN: usize = 12;

pub struct BlockTree<H: Header, P: ChainParams<H>> {
    params: P,
    indices: HashMap<H::Hash, BlockIndex<H>>,
    /// Maps a hash's leading `SHORT_ID_LEN` bytes back to its full hash, so `accept_block` can
    /// resolve a header whose `previous_hash()` only carries a truncated reference (VBK).
    short_index: HashMap<Vec<u8>, H::Hash>,
    genesis_hash: Option<H::Hash>,
    best_chain: Vec<H::Hash>,
    next_seq: u64,
}

impl<H: Header, P: ChainParams<H>> BlockTree<H, P> {
    pub fn new(params: P) -> Self {
        Self {
            params,
            indices: HashMap::new(),
            short_index: HashMap::new(),
            genesis_hash: None,
            best_chain: Vec::new(),
            next_seq: 0,
        }
    }

    fn index_short_id(&mut self, hash: &H::Hash) {
        let bytes = hash.as_ref();
        let prefix = bytes[..SHORT_ID_LEN.min(bytes.len())].to_vec();
        self.short_index.insert(prefix, hash.clone());
    }

    /// Resolves `reference` to a full, known hash: first by exact match, then by treating it as a
    /// `SHORT_ID_LEN`-byte-prefixed reference into `short_index`.
    fn resolve_hash(&self, reference: &H::Hash) -> Option<H::Hash> {
        if self.indices.contains_key(reference) {
            return Some(reference.clone());
        }
        let bytes = reference.as_ref();
        let prefix = &bytes[..SHORT_ID_LEN.min(bytes.len())];
        self.short_index.get(prefix).cloned()
    }

    pub fn params(&self) -> &P {
        &self.params
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.genesis_hash.is_some()
    }

    pub fn get(&self, hash: &H::Hash) -> Option<&BlockIndex<H>> {
        self.indices.get(hash)
    }

    pub fn get_mut(&mut self, hash: &H::Hash) -> Option<&mut BlockIndex<H>> {
        self.indices.get_mut(hash)
    }

    /// Raises `hash`'s validity to include `up_to`, delegating to `BlockStatus::raise_validity`.
    /// Used by the coordinator once a container's payloads pass structural validation.
    pub fn raise_validity(&mut self, hash: &H::Hash, up_to: BlockStatus) -> Result<bool, TreeError> {
        let idx = self.indices.get_mut(hash).ok_or(TreeError::UnknownBlock)?;
        Ok(idx.status.raise_validity(up_to))
    }

    /// Removes a just-inserted leaf index. Used to roll back a speculative VBK context extension
    /// within a single `AltTree::add_payloads` call that ultimately fails structural validation.
    /// Only sound when `hash` was inserted by this same call and has no children yet.
    pub(crate) fn remove_leaf(&mut self, hash: &H::Hash) {
        if let Some(idx) = self.indices.remove(hash) {
            if let Some(prev) = idx.prev {
                if let Some(parent) = self.indices.get_mut(&prev) {
                    parent.next.remove(hash);
                }
            }
        }
        let bytes = hash.as_ref();
        let prefix = bytes[..SHORT_ID_LEN.min(bytes.len())].to_vec();
        if self.short_index.get(&prefix) == Some(hash) {
            self.short_index.remove(&prefix);
        }
        self.reselect_best_chain();
    }

    pub fn tip(&self) -> Option<&BlockIndex<H>> {
        self.best_chain.last().and_then(|h| self.indices.get(h))
    }

    pub fn best_chain(&self) -> &[H::Hash] {
        &self.best_chain
    }

    /// Sets the root of the tree. Must be called exactly once before any `accept_block`.
    pub fn bootstrap(&mut self, genesis: H) -> Result<(), TreeError> {
        if self.is_bootstrapped() {
            return Err(TreeError::AlreadyBootstrapped);
        }
        let hash = genesis.hash();
        let chain_work = self.params.block_work(&genesis);
        let index = BlockIndex {
            height: genesis.declared_height().unwrap_or(0),
            header: genesis,
            prev: None,
            next: Default::default(),
            chain_work,
            status: BlockStatus::VALID_TREE,
            ref_counter: 0,
            endorsed_by: Default::default(),
            containing_endorsements: Default::default(),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.genesis_hash = Some(hash.clone());
        self.best_chain = vec![hash.clone()];
        self.index_short_id(&hash);
        self.indices.insert(hash, index);
        debug!("tree bootstrapped");
        Ok(())
    }

    fn ancestors_of(&self, start: &H::Hash, count: usize) -> Vec<&BlockIndex<H>> {
        let mut out = Vec::with_capacity(count);
        let mut cursor = Some(start.clone());
        while let Some(h) = cursor {
            if out.len() >= count {
                break;
            }
            match self.indices.get(&h) {
                Some(idx) => {
                    out.push(idx);
                    cursor = idx.prev.clone();
                }
                None => break,
            }
        }
        out
    }

    /// Looks up the parent, validates structural/contextual rules, and inserts a new index.
    pub fn accept_block(&mut self, header: H) -> Result<&BlockIndex<H>, TreeError> {
        if !self.is_bootstrapped() {
            return Err(TreeError::NotBootstrapped);
        }
        let hash = header.hash();
        if self.indices.contains_key(&hash) {
            return Err(TreeError::Duplicate);
        }
        let prev_ref = header.previous_hash();
        let parent_hash = self.resolve_hash(&prev_ref).ok_or(TreeError::NoParent)?;
        let parent = self.indices.get(&parent_hash).expect("resolve_hash returned a known hash");
        let parent_height = parent.height;
        let parent_chain_work = parent.chain_work;
        let parent_failed = parent.is_failed();

        let height = parent_height + 1;
        if let Some(declared) = header.declared_height() {
            if declared != height {
                return Err(TreeError::BadHeight);
            }
        }

        let mtp_window = self.params.median_time_past_window();
        let recent_timestamps: Vec<u32> = self
            .ancestors_of(&parent_hash, mtp_window)
            .iter()
            .map(|idx| idx.header.timestamp())
            .collect();
        if !self.params.check_block_time(&header, &recent_timestamps) {
            return Err(TreeError::BadTime);
        }

        let diff_window = self.params.difficulty_window().max(1);
        let ancestors = self.ancestors_of(&parent_hash, diff_window);
        if !self.params.check_difficulty(&header, &ancestors) {
            return Err(TreeError::BadDifficulty);
        }

        if !self.params.verify_proof_of_work(&header) {
            return Err(TreeError::BadWork);
        }

        let block_work = self.params.block_work(&header);
        let chain_work = parent_chain_work + block_work;
        let mut status = BlockStatus::VALID_TREE;
        if parent_failed {
            status |= BlockStatus::FAILED_CHILD;
        }

        let index = BlockIndex {
            height,
            header,
            prev: Some(parent_hash.clone()),
            next: Default::default(),
            chain_work,
            status,
            ref_counter: 0,
            endorsed_by: Default::default(),
            containing_endorsements: Default::default(),
            seq: self.next_seq,
        };
        self.next_seq += 1;

        self.indices.get_mut(&parent_hash).expect("parent exists").next.insert(hash.clone());
        self.index_short_id(&hash);
        self.indices.insert(hash.clone(), index);

        self.maybe_update_best_chain(&hash);
        Ok(self.indices.get(&hash).expect("just inserted"))
    }

    /// Walks `prev` links from `index` to find the ancestor at `height`. O(height delta), per
    /// spec §9's acknowledged open design choice (no skip-list).
    pub fn get_ancestor(&self, hash: &H::Hash, height: i32) -> Option<&BlockIndex<H>> {
        let start = self.indices.get(hash)?;
        if height < 0 || height > start.height {
            return None;
        }
        let mut current = start;
        while current.height > height {
            let prev_hash = current.prev.as_ref()?;
            current = self.indices.get(prev_hash)?;
        }
        Some(current)
    }

    /// Marks `hash` with `reason` (a `FAILED_*` bit), propagates `FAILED_CHILD` to all
    /// descendants, and re-selects the best chain if necessary.
    pub fn invalidate(&mut self, hash: &H::Hash, reason: BlockStatus) -> Result<(), TreeError> {
        if !self.indices.contains_key(hash) {
            return Err(TreeError::UnknownBlock);
        }
        self.indices.get_mut(hash).unwrap().status |= reason;
        self.mark_descendants_failed_child(hash);
        self.reselect_best_chain();
        warn!("block invalidated");
        Ok(())
    }

    /// Inverse of `invalidate`: clears `reason`, re-scans descendants (clearing `FAILED_CHILD`
    /// where no failed ancestor remains), and re-selects the best chain.
    pub fn revalidate(&mut self, hash: &H::Hash, reason: BlockStatus) -> Result<(), TreeError> {
        if !self.indices.contains_key(hash) {
            return Err(TreeError::UnknownBlock);
        }
        self.indices.get_mut(hash).unwrap().status.remove(reason);
        self.rescan_descendants_failed_child(hash);
        self.reselect_best_chain();
        Ok(())
    }

    fn children_of(&self, hash: &H::Hash) -> Vec<H::Hash> {
        self.indices.get(hash).map(|idx| idx.next.iter().cloned().collect()).unwrap_or_default()
    }

    fn mark_descendants_failed_child(&mut self, hash: &H::Hash) {
        let mut stack = self.children_of(hash);
        while let Some(child) = stack.pop() {
            if let Some(idx) = self.indices.get_mut(&child) {
                idx.status |= BlockStatus::FAILED_CHILD;
            }
            stack.extend(self.children_of(&child));
        }
    }

    fn rescan_descendants_failed_child(&mut self, hash: &H::Hash) {
        let mut stack = self.children_of(hash);
        while let Some(child) = stack.pop() {
            let parent_still_failed = self
                .indices
                .get(&child)
                .and_then(|idx| idx.prev.as_ref())
                .and_then(|p| self.indices.get(p))
                .map(|p| p.is_failed())
                .unwrap_or(false);
            if let Some(idx) = self.indices.get_mut(&child) {
                if !parent_still_failed {
                    idx.status.remove(BlockStatus::FAILED_CHILD);
                }
            }
            stack.extend(self.children_of(&child));
        }
    }

    fn maybe_update_best_chain(&mut self, candidate: &H::Hash) {
        let current_tip_work = self.tip().map(|t| t.chain_work);
        let candidate_index = self.indices.get(candidate).expect("candidate exists");
        if candidate_index.is_failed() {
            return;
        }
        let should_update = match current_tip_work {
            None => true,
            Some(tip_work) => candidate_index.chain_work > tip_work,
        };
        if should_update {
            self.set_best_chain_tip(candidate.clone());
        }
    }

    /// Re-selects the best chain among all known non-failed tips, maximizing `chain_work` with
    /// ties broken by first-seen (`seq`). A block counts as a "tip" candidate whenever none of its
    /// children are non-failed — a block whose only children all carry `FAILED_MASK` is as much a
    /// tip as a genuine leaf.
    fn reselect_best_chain(&mut self) {
        let mut has_live_child: std::collections::HashSet<&H::Hash> = std::collections::HashSet::new();
        for idx in self.indices.values() {
            if idx.is_failed() {
                continue;
            }
            if let Some(prev) = idx.prev.as_ref() {
                has_live_child.insert(prev);
            }
        }
        let mut best: Option<(altpop_common_types::ChainWork, u64, H::Hash)> = None;
        for (hash, idx) in &self.indices {
            if idx.is_failed() || has_live_child.contains(hash) {
                continue;
            }
            let candidate = (idx.chain_work, idx.seq, hash.clone());
            best = Some(match best {
                None => candidate,
                Some(current) => {
                    if candidate.0 > current.0 || (candidate.0 == current.0 && candidate.1 < current.1) {
                        candidate
                    } else {
                        current
                    }
                }
            });
        }
        if let Some((_, _, hash)) = best {
            self.set_best_chain_tip(hash);
        } else {
            self.best_chain.clear();
        }
    }

    fn set_best_chain_tip(&mut self, tip: H::Hash) {
        let mut chain = Vec::new();
        let mut cursor = Some(tip);
        while let Some(h) = cursor {
            let idx = match self.indices.get(&h) {
                Some(idx) => idx,
                None => break,
            };
            chain.push(h.clone());
            cursor = idx.prev.clone();
        }
        chain.reverse();
        self.best_chain = chain;
    }
}

#[cfg(test)]
mod test {
    use altpop_common_types::Hash256;
    use primitive_types::U256;

    use super::*;
    use crate::{entities::btc_block::{BtcBlock, BtcHeader}, pow};

    struct TestBtcParams;

    impl ChainParams<BtcHeader> for TestBtcParams {
        fn genesis_header(&self) -> BtcHeader {
            BtcHeader::new(BtcBlock {
                version: 1,
                previous_hash: Hash256::default(),
                merkle_root: Hash256::sha256(b"genesis"),
                timestamp: 1_000_000,
                bits: 0x207f_ffff,
                nonce: 0,
            })
        }

        fn block_work(&self, header: &BtcHeader) -> altpop_common_types::ChainWork {
            pow::work_from_bits(header.block.bits)
        }

        fn check_difficulty(&self, header: &BtcHeader, _ancestors: &[&BlockIndex<BtcHeader>]) -> bool {
            header.block.bits == 0x207f_ffff
        }

        fn verify_proof_of_work(&self, header: &BtcHeader) -> bool {
            header.block.check_pow()
        }

        fn check_block_time(&self, header: &BtcHeader, recent: &[u32]) -> bool {
            pow::check_median_time_past(header.block.timestamp, recent)
        }
    }

    fn mine_on_top(prev_hash: Hash256, timestamp: u32) -> BtcHeader {
        let mut block = BtcBlock {
            version: 1,
            previous_hash: prev_hash,
            merkle_root: Hash256::sha256(b"tx"),
            timestamp,
            bits: 0x207f_ffff,
            nonce: 0,
        };
        let target = pow::compact_to_target(block.bits);
        loop {
            let header = BtcHeader::new(block.clone());
            let as_uint = U256::from_big_endian(header.hash().as_slice());
            if as_uint <= target {
                return header;
            }
            block.nonce += 1;
        }
    }

    #[test]
    fn bootstrap_then_accept_extends_best_chain() {
        let params = TestBtcParams;
        let genesis = params.genesis_header();
        let genesis_hash = genesis.hash();
        let mut tree: BlockTree<BtcHeader, TestBtcParams> = BlockTree::new(params);
        tree.bootstrap(genesis).unwrap();

        let block1 = mine_on_top(genesis_hash, 1_000_100);
        let hash1 = block1.hash();
        tree.accept_block(block1).unwrap();

        assert_eq!(tree.best_chain().last(), Some(&hash1));
        assert_eq!(tree.get(&hash1).unwrap().height, 1);
    }

    #[test]
    fn duplicate_block_is_rejected() {
        let params = TestBtcParams;
        let genesis = params.genesis_header();
        let genesis_hash = genesis.hash();
        let mut tree: BlockTree<BtcHeader, TestBtcParams> = BlockTree::new(params);
        tree.bootstrap(genesis).unwrap();

        let block1 = mine_on_top(genesis_hash, 1_000_100);
        tree.accept_block(block1.clone()).unwrap();
        assert_eq!(tree.accept_block(block1).unwrap_err(), TreeError::Duplicate);
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let params = TestBtcParams;
        let genesis = params.genesis_header();
        let mut tree: BlockTree<BtcHeader, TestBtcParams> = BlockTree::new(params);
        tree.bootstrap(genesis).unwrap();

        let orphan = mine_on_top(Hash256::try_from(&[7u8; 32][..]).unwrap(), 1_000_100);
        assert_eq!(tree.accept_block(orphan).unwrap_err(), TreeError::NoParent);
    }

    #[test]
    fn get_ancestor_walks_prev_links() {
        let params = TestBtcParams;
        let genesis = params.genesis_header();
        let genesis_hash = genesis.hash();
        let mut tree: BlockTree<BtcHeader, TestBtcParams> = BlockTree::new(params);
        tree.bootstrap(genesis).unwrap();

        let mut prev = genesis_hash;
        let mut hashes = vec![prev];
        for i in 0..10 {
            let block = mine_on_top(prev, 1_000_100 + i * 100);
            prev = block.hash();
            hashes.push(prev);
            tree.accept_block(block).unwrap();
        }

        let tip_hash = *hashes.last().unwrap();
        for (height, hash) in hashes.iter().enumerate() {
            let found = tree.get_ancestor(&tip_hash, height as i32).unwrap();
            assert_eq!(&found.header.hash(), hash);
        }
        assert!(tree.get_ancestor(&tip_hash, -1).is_none());
        assert!(tree.get_ancestor(&tip_hash, 11).is_none());
    }

    #[test]
    fn accept_block_resolves_short_id_prefix_parent_reference() {
        let params = TestBtcParams;
        let genesis = params.genesis_header();
        let genesis_hash = genesis.hash();
        let mut tree: BlockTree<BtcHeader, TestBtcParams> = BlockTree::new(params);
        tree.bootstrap(genesis).unwrap();

        // A header referencing only the leading 12 bytes of the parent's hash, zero-padded to
        // full width the way `VbkHeader::previous_hash` does, must still resolve.
        let mut short_ref = [0u8; 32];
        short_ref[..12].copy_from_slice(&genesis_hash.as_slice()[..12]);
        let truncated_parent = Hash256::from_bytes(short_ref);
        assert_ne!(truncated_parent, genesis_hash);

        let block1 = mine_on_top(truncated_parent, 1_000_100);
        let hash1 = block1.hash();
        tree.accept_block(block1).unwrap();
        assert_eq!(tree.get(&hash1).unwrap().prev, Some(genesis_hash));
    }

    #[test]
    fn invalidate_reselects_best_chain() {
        let params = TestBtcParams;
        let genesis = params.genesis_header();
        let genesis_hash = genesis.hash();
        let mut tree: BlockTree<BtcHeader, TestBtcParams> = BlockTree::new(params);
        tree.bootstrap(genesis).unwrap();

        let block1 = mine_on_top(genesis_hash, 1_000_100);
        let hash1 = block1.hash();
        tree.accept_block(block1).unwrap();

        tree.invalidate(&hash1, BlockStatus::FAILED_BLOCK).unwrap();
        assert_eq!(tree.best_chain().last(), Some(&genesis_hash));
    }
}
