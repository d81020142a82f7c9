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

use altpop_common_types::ChainWork;

use crate::{block_tree::index::BlockIndex, entities::header::Header};

/// The per-chain capability set the spec's §9 design note calls for: one `ChainParams`
/// implementation per block kind (BTC, VBK, ALT), each plugged into the same generic `BlockTree`.
pub trait ChainParams<H: Header> {
    /// The header(s) this chain bootstraps from. `BlockTree::bootstrap` accepts exactly one.
    fn genesis_header(&self) -> H;

    /// Work contributed by a single block. BTC/VBK derive this from the header's difficulty
    /// target; ALT returns a constant, since ALT's own fork choice never decides ties on work
    /// alone (§4.5).
    fn block_work(&self, header: &H) -> ChainWork;

    /// Checks `header`'s declared difficulty against the chain built from `ancestors` (closest
    /// ancestor first) — i.e. that the retargeting rule was followed, not that the header's hash
    /// satisfies it (see `verify_proof_of_work`).
    fn check_difficulty(&self, header: &H, ancestors: &[&BlockIndex<H>]) -> bool;

    /// Checks the header's own proof-of-work against its declared difficulty. ALT headers are
    /// opaque and carry no verifiable PoW, so the default accepts unconditionally; BTC and VBK
    /// override this to call their `check_pow`.
    fn verify_proof_of_work(&self, _header: &H) -> bool {
        true
    }

    /// Median-time-past check: `header.timestamp()` against `recent_timestamps` (most recent
    /// first).
    fn check_block_time(&self, header: &H, recent_timestamps: &[u32]) -> bool;

    /// How many ancestor timestamps `check_block_time` needs.
    fn median_time_past_window(&self) -> usize {
        11
    }

    /// How many ancestors `check_difficulty` needs for retargeting.
    fn difficulty_window(&self) -> usize {
        1
    }
}
