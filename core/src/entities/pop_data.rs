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

use altpop_common_types::Hash256;

use crate::{
    codec::{CodecResult, ReadCursor, WriteCursor},
    entities::{atv::ATV, vbk_block::VbkBlock, vtb::VTB},
};

/// Bundle of context blocks, VTBs, and ATVs delivered with an ALT block.
#[derive(Clone, Debug)]
pub struct PopData {
    pub version: u32,
    pub context: Vec<VbkBlock>,
    pub vtbs: Vec<VTB>,
    pub atvs: Vec<ATV>,
}

impl PartialEq for PopData {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.context == other.context
            && self.vtbs.len() == other.vtbs.len()
            && self.vtbs.iter().zip(&other.vtbs).all(|(a, b)| a.id() == b.id())
            && self.atvs == other.atvs
    }
}
impl Eq for PopData {}

impl PopData {
    pub fn to_vbk_encoding(&self) -> Vec<u8> {
        let mut w = WriteCursor::new();
        w.write_be::<u32>(self.version);
        w.write_be::<u32>(self.context.len() as u32);
        for block in &self.context {
            w.write_var_len_value(&block.to_vbk_encoding());
        }
        w.write_be::<u32>(self.vtbs.len() as u32);
        for vtb in &self.vtbs {
            w.write_var_len_value(&vtb.to_vbk_encoding());
        }
        w.write_be::<u32>(self.atvs.len() as u32);
        for atv in &self.atvs {
            w.write_var_len_value(&atv.to_vbk_encoding());
        }
        w.into_vec()
    }

    pub fn from_vbk_encoding(bytes: &[u8]) -> CodecResult<Self> {
        let mut r = ReadCursor::new(bytes);
        let version = r.read_be::<u32>()?;

        let context_count = r.read_be::<u32>()? as usize;
        let mut context = Vec::with_capacity(context_count);
        for _ in 0..context_count {
            context.push(VbkBlock::from_vbk_encoding(&r.read_var_len_value(256)?)?);
        }

        let vtb_count = r.read_be::<u32>()? as usize;
        let mut vtbs = Vec::with_capacity(vtb_count);
        for _ in 0..vtb_count {
            vtbs.push(VTB::from_vbk_encoding(&r.read_var_len_value(65536)?)?);
        }

        let atv_count = r.read_be::<u32>()? as usize;
        let mut atvs = Vec::with_capacity(atv_count);
        for _ in 0..atv_count {
            atvs.push(ATV::from_vbk_encoding(&r.read_var_len_value(65536)?)?);
        }

        Ok(Self {
            version,
            context,
            vtbs,
            atvs,
        })
    }

    pub fn id(&self) -> Hash256 {
        Hash256::sha256(&self.to_vbk_encoding())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip_encoding_of_empty_pop_data() {
        let data = PopData {
            version: 1,
            context: vec![],
            vtbs: vec![],
            atvs: vec![],
        };
        let bytes = data.to_vbk_encoding();
        let decoded = PopData::from_vbk_encoding(&bytes).unwrap();
        assert_eq!(data, decoded);
        assert_eq!(data.id(), decoded.id());
    }
}
