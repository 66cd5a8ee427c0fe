// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::ucd::PackedValue;

/// One lookup table of a multi-stage trie.
///
/// The root stage is indexed by `cp >> shift` directly, every other stage by
/// `prev + ((cp >> shift) & mask)` where `prev` is the previous stage's value.
/// The root stage has no mask in a formal sense, which is represented by the
/// `usize::MAX` sentinel.
#[derive(Clone, Default)]
pub struct Stage {
    pub values: Vec<u32>,
    pub index: usize,
    pub shift: usize,
    pub mask: usize,
    pub bits: usize,
}

#[derive(Clone, Default)]
pub struct Trie {
    pub stages: Vec<Stage>,
    pub total_size: usize,
}

/// Enumerates all shift combinations in `min_shift..=max_shift` for the given
/// stage count and builds one trie per combination, keeping the smallest.
///
/// The builds are independent of each other and run in parallel. Ties on the
/// total size are broken by the first tuple in enumeration order, which keeps
/// the winner deterministic for a given input.
pub fn build_best_trie(
    uncompressed: &[PackedValue],
    min_shift: usize,
    max_shift: usize,
    stages: usize,
) -> Trie {
    let uncompressed: Vec<u32> = uncompressed.iter().map(|c| c.value()).collect();
    let depth = stages - 1;
    let delta = max_shift - min_shift + 1;
    let total = delta.pow(depth as u32);

    // Mixed-radix decomposition of the iteration index, rightmost digit fastest.
    let mut tasks = Vec::new();
    for i in 0..total {
        let mut shifts = vec![0; depth];
        let mut index = i;
        for s in &mut shifts {
            *s = min_shift + (index % delta);
            index /= delta;
        }
        tasks.push(shifts);
    }

    tasks
        .par_iter()
        .map(|shifts| build_trie(uncompressed.clone(), shifts))
        .min_by_key(|t| t.total_size)
        .unwrap()
}

/// Builds an N-stage trie from the flat value array, bottom up:
/// each shift compresses the current array into chunks of `1 << shift`
/// elements and replaces it with the per-chunk offset array, which the next
/// shift then compresses in turn. The last offset array becomes the root.
pub fn build_trie(mut uncompressed: Vec<u32>, shifts: &[usize]) -> Trie {
    let mut cumulative_shift = 0;
    let mut stages = Vec::new();

    for &shift in shifts {
        let chunk_size = 1 << shift;
        let mut cache = HashMap::new();
        let mut compressed: Vec<u32> = Vec::new();
        let mut offsets = Vec::new();
        let mut off = 0;

        while off < uncompressed.len() {
            // The last chunk may be shorter than chunk_size. It's treated as
            // a full chunk of its own length, without padding.
            let chunk = &uncompressed[off..off + chunk_size.min(uncompressed.len() - off)];

            let offset = *cache.entry(chunk).or_insert_with(|| {
                if let Some(existing) = find_existing(&compressed, chunk) {
                    existing as u32
                } else {
                    let overlap = measure_overlap(&compressed, chunk);
                    compressed.extend_from_slice(&chunk[overlap..]);
                    (compressed.len() - chunk.len()) as u32
                }
            });

            offsets.push(offset);
            off += chunk.len();
        }

        stages.push(Stage {
            values: compressed,
            index: shifts.len() - stages.len(),
            shift: cumulative_shift,
            mask: chunk_size - 1,
            bits: 0,
        });

        uncompressed = offsets;
        cumulative_shift += shift;
    }

    stages.push(Stage {
        values: uncompressed,
        index: 0,
        shift: cumulative_shift,
        mask: usize::MAX,
        bits: 0,
    });

    stages.reverse();

    for stage in stages.iter_mut() {
        let max_val = stage.values.iter().max().cloned().unwrap_or(0);
        stage.bits = match max_val {
            0..0x100 => 8,
            0x100..0x10000 => 16,
            _ => 32,
        };
    }

    let total_size: usize = stages.iter().map(|stage| (stage.bits / 8) * stage.values.len()).sum();

    Trie { stages, total_size }
}

/// Earliest occurrence of `needle` as a full sub-sequence of `haystack`.
/// The search runs over whole elements, so a match can never straddle an
/// element boundary.
fn find_existing(haystack: &[u32], needle: &[u32]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Largest suffix of `prev` that is also a prefix of `next`.
fn measure_overlap(prev: &[u32], next: &[u32]) -> usize {
    (0..prev.len().min(next.len()))
        .rev()
        .find(|&i| prev[prev.len() - i..] == next[..i])
        .unwrap_or(0)
}

/// Replays the stage lookups for every codepoint and compares the result with
/// the flat input array. A mismatch is a generator bug and aborts.
pub fn verify(trie: &Trie, uncompressed: &[PackedValue]) {
    for (cp, expected) in uncompressed.iter().enumerate() {
        let actual = lookup(trie, cp);
        assert_eq!(expected.value(), actual, "trie sanity check failed for U+{cp:04X}");
    }
}

fn lookup(trie: &Trie, cp: usize) -> u32 {
    let mut i = 0;
    for s in &trie.stages {
        i = s.values[i as usize + ((cp >> s.shift) & s.mask)];
    }
    i
}
