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
use secp256k1::{ecdsa::Signature, Message, PublicKey};
use serde::{Deserialize, Serialize};

use crate::codec::{CodecResult, ReadCursor, WriteCursor};

/// The payload an ATV carries: an embedder-defined reference to the ALT block being endorsed,
/// plus opaque payout/context bytes. Recovered from
/// `original_source/test/entities/payloads_test.cpp`'s `PublicationData` fixture.
///
/// `header` is the embedder's encoding of the endorsed ALT block; this engine decodes only enough
/// of it (via `AltBlock::hash`/`height`, supplied separately by the embedder at `addPayloads`
/// time) to recover the endorsed hash, and otherwise treats it as opaque, per spec Non-goals.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PublicationData {
    pub identifier: u64,
    pub header: Vec<u8>,
    pub payout_info: Vec<u8>,
    pub context_info: Vec<u8>,
}

impl PublicationData {
    pub fn to_vbk_encoding(&self) -> Vec<u8> {
        let mut w = WriteCursor::new();
        w.write_be::<u64>(self.identifier);
        w.write_var_len_value(&self.header);
        w.write_var_len_value(&self.payout_info);
        w.write_var_len_value(&self.context_info);
        w.into_vec()
    }

    pub fn from_vbk_encoding(bytes: &[u8]) -> CodecResult<Self> {
        let mut r = ReadCursor::new(bytes);
        Ok(Self {
            identifier: r.read_be::<u64>()?,
            header: r.read_var_len_value(4096)?,
            payout_info: r.read_var_len_value(4096)?,
            context_info: r.read_var_len_value(4096)?,
        })
    }
}

/// The VBK transaction carried by an ATV: a signed publication of `PublicationData`, proving the
/// named VBK address authorized this endorsement of the ALT block it references.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct VbkTx {
    pub source_address: Vec<u8>,
    pub publication_data: PublicationData,
    pub signature: Vec<u8>,
    pub public_key: Vec<u8>,
}

impl VbkTx {
    pub fn to_vbk_encoding(&self) -> Vec<u8> {
        let mut w = WriteCursor::new();
        w.write_var_len_value(&self.source_address);
        w.write_var_len_value(&self.publication_data.to_vbk_encoding());
        w.write_var_len_value(&self.signature);
        w.write_var_len_value(&self.public_key);
        w.into_vec()
    }

    pub fn from_vbk_encoding(bytes: &[u8]) -> CodecResult<Self> {
        let mut r = ReadCursor::new(bytes);
        let source_address = r.read_var_len_value(128)?;
        let publication_data = PublicationData::from_vbk_encoding(&r.read_var_len_value(16384)?)?;
        let signature = r.read_var_len_value(80)?;
        let public_key = r.read_var_len_value(65)?;
        Ok(Self {
            source_address,
            publication_data,
            signature,
            public_key,
        })
    }

    pub fn tx_id(&self) -> Hash256 {
        Hash256::sha256(&self.to_vbk_encoding())
    }

    /// Stateless structural check: the signature over `publication_data`'s encoding verifies
    /// against `public_key` using ECDSA/secp256k1 (the curve the VBK network itself uses for
    /// signed transactions).
    pub fn verify_signature(&self) -> bool {
        verify_ecdsa(&self.publication_data.to_vbk_encoding(), &self.signature, &self.public_key)
    }
}

/// Shared by `VbkTx` and `VbkPopTx`: verifies an ECDSA/secp256k1 signature over the SHA-256 digest
/// of `message`. Grounded on `alpenlabs-alpen`'s use of `secp256k1::SECP256K1` as a static
/// verification context (`crates/asm/subprotocols/bridge-v1/src/txs/deposit/validation.rs`).
pub(crate) fn verify_ecdsa(message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
    let digest = Hash256::sha256d(message);
    let msg = match Message::from_digest_slice(digest.as_slice()) {
        Ok(msg) => msg,
        Err(_) => return false,
    };
    let sig = match Signature::from_der(signature).or_else(|_| Signature::from_compact(signature)) {
        Ok(sig) => sig,
        Err(_) => return false,
    };
    let pk = match PublicKey::from_slice(public_key) {
        Ok(pk) => pk,
        Err(_) => return false,
    };
    secp256k1::SECP256K1.verify_ecdsa(&msg, &sig, &pk).is_ok()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn publication_data_round_trip() {
        let data = PublicationData {
            identifier: 42,
            header: vec![1, 2, 3],
            payout_info: vec![4, 5],
            context_info: vec![],
        };
        let bytes = data.to_vbk_encoding();
        let decoded = PublicationData::from_vbk_encoding(&bytes).unwrap();
        assert_eq!(data, decoded);
    }

    #[test]
    fn signed_publication_data_verifies() {
        let secp = secp256k1::Secp256k1::new();
        let (sk, pk) = secp.generate_keypair(&mut rand::thread_rng());
        let data = PublicationData {
            identifier: 7,
            header: b"alt-header".to_vec(),
            payout_info: vec![],
            context_info: vec![],
        };
        let digest = Hash256::sha256d(&data.to_vbk_encoding());
        let msg = Message::from_digest_slice(digest.as_slice()).unwrap();
        let sig = secp.sign_ecdsa(&msg, &sk);

        let tx = VbkTx {
            source_address: vec![0u8; 20],
            publication_data: data,
            signature: sig.serialize_der().to_vec(),
            public_key: pk.serialize().to_vec(),
        };
        assert!(tx.verify_signature());
    }

    #[test]
    fn tampered_signature_fails() {
        let secp = secp256k1::Secp256k1::new();
        let (sk, pk) = secp.generate_keypair(&mut rand::thread_rng());
        let data = PublicationData {
            identifier: 7,
            header: b"alt-header".to_vec(),
            payout_info: vec![],
            context_info: vec![],
        };
        let digest = Hash256::sha256d(&data.to_vbk_encoding());
        let msg = Message::from_digest_slice(digest.as_slice()).unwrap();
        let sig = secp.sign_ecdsa(&msg, &sk);

        let mut tx = VbkTx {
            source_address: vec![0u8; 20],
            publication_data: data,
            signature: sig.serialize_der().to_vec(),
            public_key: pk.serialize().to_vec(),
        };
        tx.publication_data.identifier = 8;
        assert!(!tx.verify_signature());
    }
}
