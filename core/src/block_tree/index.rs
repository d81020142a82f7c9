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

use std::collections::HashSet;

use altpop_common_types::{ChainWork, Hash256};

use crate::{block_tree::status::BlockStatus, entities::header::Header};

/// The in-memory node wrapping a header. Owned exclusively by the `BlockTree` that created it;
/// `prev`/`next` are non-owning references resolved by hash lookup into that tree, per spec §9
/// ("cyclic ownership" design note).
#[derive(Debug, Clone)]
pub struct BlockIndex<H: Header> {
    pub header: H,
    pub height: i32,
    pub prev: Option<H::Hash>,
    pub next: HashSet<H::Hash>,
    pub chain_work: ChainWork,
    pub status: BlockStatus,
    pub ref_counter: u32,
    /// Endorsement ids whose *endorsed* block is this one (VBK and ALT indices only).
    pub endorsed_by: HashSet<Hash256>,
    /// Endorsement ids *contained* in this block.
    pub containing_endorsements: HashSet<Hash256>,
    /// Insertion order, used to break chain-work ties in fork choice (first-seen wins).
    pub(crate) seq: u64,
}

impl<H: Header> BlockIndex<H> {
    pub fn is_valid(&self, up_to: BlockStatus) -> bool {
        self.status.is_valid(up_to)
    }

    pub fn is_failed(&self) -> bool {
        self.status.is_failed()
    }
}
