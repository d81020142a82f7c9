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

//! Bitcoin-compatible "compact" difficulty encoding, chain-work accounting, and retargeting.

use altpop_common_types::{ChainWork, CompactDifficulty};
use primitive_types::U256;

/// Decodes a compact ("nBits") difficulty into its full 256-bit target.
pub fn compact_to_target(bits: CompactDifficulty) -> U256 {
    let exponent = (bits >> 24) as u32;
    let mantissa = U256::from(bits & 0x007f_ffff);
    if exponent <= 3 {
        mantissa >> (8 * (3 - exponent))
    } else {
        mantissa << (8 * (exponent - 3))
    }
}

/// Encodes a 256-bit target into its minimal compact representation.
pub fn target_to_compact(target: U256) -> CompactDifficulty {
    if target.is_zero() {
        return 0;
    }
    let mut size = (target.bits() + 7) / 8;
    let mut compact = if size <= 3 {
        (target.low_u64() << (8 * (3 - size))) as u32
    } else {
        (target >> (8 * (size - 3) as u32)).low_u32()
    };
    // The 0x00800000 bit is the sign bit; if set, shift the mantissa right one byte and bump size.
    if compact & 0x0080_0000 != 0 {
        compact >>= 8;
        size += 1;
    }
    compact | ((size as u32) << 24)
}

/// Chain work contributed by a single block at the given compact difficulty: `~target / (target +
/// 1) + 1`, identical to Bitcoin's `GetBlockProof`.
pub fn work_from_bits(bits: CompactDifficulty) -> ChainWork {
    let target = compact_to_target(bits);
    if target.is_zero() {
        return ChainWork::ZERO;
    }
    let work = (!target / (target + U256::one())) + U256::one();
    ChainWork::from_u256(work)
}

/// The maximum (easiest) target permitted by a chain's proof-of-work limit.
pub fn meets_target(hash_as_uint: U256, bits: CompactDifficulty) -> bool {
    let target = compact_to_target(bits);
    !target.is_zero() && hash_as_uint <= target
}

/// Standard median-time-past rule: `timestamp` must exceed the median of up to the last
/// `window` timestamps (most recent first).
pub fn check_median_time_past(timestamp: u32, recent_timestamps: &[u32]) -> bool {
    if recent_timestamps.is_empty() {
        return true;
    }
    let mut sorted = recent_timestamps.to_vec();
    sorted.sort_unstable();
    let median = sorted[sorted.len() / 2];
    timestamp > median
}

/// Simple bounded-ratio retarget: compares the actual timespan of the last `interval` blocks
/// against the expected timespan (`interval * target_spacing`), clamps the adjustment ratio to
/// `[1/4, 4]`, and clamps the resulting target to `pow_limit`.
pub fn retarget(
    first_timestamp: u32,
    last_timestamp: u32,
    last_bits: CompactDifficulty,
    interval: u32,
    target_spacing: u32,
    pow_limit: U256,
) -> CompactDifficulty {
    let expected_timespan = (interval as u64) * (target_spacing as u64);
    let mut actual_timespan = last_timestamp.saturating_sub(first_timestamp) as u64;
    let min_timespan = expected_timespan / 4;
    let max_timespan = expected_timespan * 4;
    actual_timespan = actual_timespan.clamp(min_timespan, max_timespan);

    let prev_target = compact_to_target(last_bits);
    let mut new_target = prev_target
        .saturating_mul(U256::from(actual_timespan))
        / U256::from(expected_timespan.max(1));
    if new_target > pow_limit {
        new_target = pow_limit;
    }
    target_to_compact(new_target)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn compact_round_trip() {
        for bits in [0x1d00_ffffu32, 0x1b04_4454, 0x2100_0001] {
            let target = compact_to_target(bits);
            let back = target_to_compact(target);
            assert_eq!(compact_to_target(back), target, "bits={:#x}", bits);
        }
    }

    #[test]
    fn easier_target_gives_less_work() {
        let easy = work_from_bits(0x2000_ffff);
        let hard = work_from_bits(0x1d00_ffff);
        assert!(hard.as_u256() > easy.as_u256());
    }

    #[test]
    fn median_time_past_rejects_non_increasing() {
        let recent = [100, 110, 120, 130, 140];
        assert!(!check_median_time_past(120, &recent));
        assert!(check_median_time_past(121, &recent));
    }
}
