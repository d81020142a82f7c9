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

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStatus(u8);

bitflags! {
    impl BlockStatus: u8 {
        const VALID_UNKNOWN = 0;
        const VALID_TREE = 1;
        const VALID_PAYLOADS = 2;
        const FAILED_BLOCK = 4;
        const FAILED_POP = 8;
        const FAILED_CHILD = 16;
        const VALID_MASK = Self::VALID_TREE.bits() | Self::VALID_PAYLOADS.bits();
        const FAILED_MASK = Self::FAILED_BLOCK.bits() | Self::FAILED_POP.bits() | Self::FAILED_CHILD.bits();
    }
}

impl Default for BlockStatus {
    fn default() -> Self {
        BlockStatus::VALID_UNKNOWN
    }
}

impl BlockStatus {
    pub fn is_failed(&self) -> bool {
        self.intersects(BlockStatus::FAILED_MASK)
    }

    /// True when every bit of `up_to` is set and no `FAILED_MASK` bit is set.
    pub fn is_valid(&self, up_to: BlockStatus) -> bool {
        !self.is_failed() && self.contains(up_to)
    }

    /// Raises validity to include `up_to`. No-op, returning `false`, once any `FAILED_MASK` bit is
    /// set; `VALID_PAYLOADS` can only be raised when `VALID_TREE` is already set.
    pub fn raise_validity(&mut self, up_to: BlockStatus) -> bool {
        if self.is_failed() {
            return false;
        }
        if up_to.contains(BlockStatus::VALID_PAYLOADS) && !self.contains(BlockStatus::VALID_TREE) {
            return false;
        }
        *self |= up_to & BlockStatus::VALID_MASK;
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn raise_validity_is_monotonic() {
        let mut status = BlockStatus::VALID_TREE;
        assert!(status.raise_validity(BlockStatus::VALID_PAYLOADS));
        assert!(status.contains(BlockStatus::VALID_MASK));
    }

    #[test]
    fn raise_validity_rejects_payloads_before_tree() {
        let mut status = BlockStatus::VALID_UNKNOWN;
        assert!(!status.raise_validity(BlockStatus::VALID_PAYLOADS));
        assert_eq!(status, BlockStatus::VALID_UNKNOWN);
    }

    #[test]
    fn raise_validity_is_noop_once_failed() {
        let mut status = BlockStatus::VALID_TREE | BlockStatus::FAILED_POP;
        assert!(!status.raise_validity(BlockStatus::VALID_PAYLOADS));
        assert!(status.is_failed());
    }

    #[test]
    fn is_valid_respects_failed_mask() {
        let status = BlockStatus::VALID_TREE | BlockStatus::FAILED_CHILD;
        assert!(!status.is_valid(BlockStatus::VALID_TREE));
    }
}
