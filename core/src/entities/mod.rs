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

pub mod alt_block;
pub mod alt_payloads;
pub mod atv;
pub mod btc_block;
pub mod endorsement;
pub mod header;
pub mod merkle_path;
pub mod pop_data;
pub mod vbk_block;
pub mod vbk_pop_tx;
pub mod vbk_tx;
pub mod vtb;

pub use alt_block::AltBlock;
pub use alt_payloads::AltPayloads;
pub use atv::ATV;
pub use btc_block::{BtcBlock, BtcHeader};
pub use endorsement::{AltEndorsement, VbkEndorsement};
pub use header::Header;
pub use merkle_path::VbkMerklePath;
pub use pop_data::PopData;
pub use vbk_block::{VbkBlock, VbkHeader};
pub use vbk_pop_tx::VbkPopTx;
pub use vbk_tx::{PublicationData, VbkTx};
pub use vtb::VTB;
