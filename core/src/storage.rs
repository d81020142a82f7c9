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

//! The storage collaborator's interface contract (spec §6). This crate consumes, but never
//! implements, a key-value backend: the embedder wires `Batch`/iteration to whatever persistence
//! layer it runs (LMDB, sled, etc.), the same "adapter trait, no shipped impl" shape
//! `tari_core::chain_storage` uses for its `BlockchainBackend` trait.

use thiserror::Error;

/// Fatal storage failures (spec §7). Never wrapped in a `ValidationState`; propagates out of the
/// core unmodified, mirroring `FatalError`.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(String),
    #[error("storage state corrupted: {0}")]
    Corrupted(String),
}

/// An atomic write batch. Keys are an entity's canonical encoding hash; values are its canonical
/// `to_vbk_encoding()` bytes (spec §6).
pub trait Batch {
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>);
    fn write(self) -> Result<(), StorageError>;
}

/// Bootstrap restore reads the full key/value space back out of the backend once, in whatever
/// order the backend iterates in; the coordinator re-derives tree/index structure purely from the
/// decoded entities, so iteration order carries no semantic weight.
pub trait KeyValueIterator {
    fn next_entry(&mut self) -> Option<(Vec<u8>, Vec<u8>)>;
}

#[cfg(test)]
mod test {
    use super::*;

    struct InMemoryBatch {
        writes: Vec<(Vec<u8>, Vec<u8>)>,
    }

    impl Batch for InMemoryBatch {
        fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
            self.writes.push((key, value));
        }

        fn write(self) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn batch_accumulates_writes_before_committing() {
        let mut batch = InMemoryBatch { writes: vec![] };
        batch.put(vec![1], vec![2]);
        batch.put(vec![3], vec![4]);
        assert_eq!(batch.writes.len(), 2);
        assert!(batch.write().is_ok());
    }
}
