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

use crate::entities::pop_data::PopData;

/// The top-level payload container an embedder submits to `AltTree::add_payloads` for a single
/// ALT block: the `PopData` carrying that block's VTBs, ATVs, and VBK context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AltPayloads {
    pub container_hash: Vec<u8>,
    pub pop_data: PopData,
}

impl AltPayloads {
    pub fn new(container_hash: Vec<u8>, pop_data: PopData) -> Self {
        Self { container_hash, pop_data }
    }

    pub fn to_vbk_encoding(&self) -> Vec<u8> {
        let mut w = crate::codec::WriteCursor::new();
        w.write_var_len_value(&self.container_hash);
        w.write_var_len_value(&self.pop_data.to_vbk_encoding());
        w.into_vec()
    }

    pub fn from_vbk_encoding(bytes: &[u8]) -> crate::codec::CodecResult<Self> {
        let mut r = crate::codec::ReadCursor::new(bytes);
        let container_hash = r.read_var_len_value(64)?;
        let pop_data = PopData::from_vbk_encoding(&r.read_var_len_value(1_000_000)?)?;
        Ok(Self { container_hash, pop_data })
    }
}
