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

use thiserror::Error;

use crate::{alt_tree::CoordinatorError, block_tree::TreeError, codec::CodecError, validation::PayloadError};

/// Carries the offending block hash, the error kind's short message, alongside a structural or
/// contextual `Error`. Attached to every `Err` that crosses the coordinator's public API, per the
/// propagation policy: it never mutates tree state beyond the rollback the caller already got.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ValidationState {
    pub block_hash: Option<Vec<u8>>,
    pub message: String,
}

impl ValidationState {
    pub fn new(block_hash: Option<Vec<u8>>, message: impl Into<String>) -> Self {
        Self {
            block_hash,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.block_hash {
            Some(h) => write!(f, "{} (block {})", self.message, hex::encode(h)),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Structural and contextual error taxonomy (spec §7). These are always recoverable by the
/// caller: tree state beyond the targeted rollback is untouched.
#[derive(Debug, Error)]
pub enum Error {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("block tree error: {0}")]
    Tree(#[from] TreeError),
    #[error("payload validation error: {0}")]
    Payload(#[from] PayloadError),
    #[error("duplicate endorsement id within container")]
    DuplicateEndorsementId,
    #[error("coordinator error: {0}")]
    Coordinator(#[from] CoordinatorError),
}

/// Fatal/storage errors (spec §7). These are never wrapped in a `ValidationState`: they propagate
/// out of the core unmodified and the embedder is expected to restart, per the original's
/// `UnrecoverableError`/`StateCorruptedException` split.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("state corrupted: {0}")]
    StateCorrupted(String),
    #[error("storage io error: {0}")]
    Io(String),
}
