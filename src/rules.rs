// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Used as an indicator in our rules for ÷ ("does not join").
// Underscore is one of the few characters that are permitted as an identifier,
// are monospace in most fonts and also visually distinct from the digits.
const X: i32 = -1;

// The following rules are based on the Grapheme Cluster Boundaries section of Unicode Standard Annex #29,
// but slightly modified to allow for use with a plain MxN lookup table.
//
// Break at the start and end of text, unless the text is empty.
// GB1:   ~ sot ÷ Any
// GB2:   ~ Any ÷ eot
//        Handled by the emitted ucd* functions.
//
// Do not break between a CR and LF. Otherwise, break before and after controls.
// GB3:   ~ CR × LF
//        dropped, because CR, LF, and the remaining controls share a single
//        Control class here. These characters won't normally reach the text
//        storage of a terminal, and historically it stores them in separate cells.
// GB4:   ✓ (Control | CR | LF) ÷
// GB5:   ✓ ÷ (Control | CR | LF)
//
// Do not break Hangul syllable or other conjoining sequences.
// GB6:   ✓ L × (L | V | LV | LVT)
// GB7:   ✓ (LV | V) × (V | T)
// GB8:   ✓ (LVT | T) × T
//
// Do not break before extending characters or ZWJ.
// GB9:   ✓ × (Extend | ZWJ)
//
// Do not break before SpacingMarks, or after Prepend characters.
// GB9a:  ✓ × SpacingMark
// GB9b:  ✓ Prepend ×
//
// Do not break within certain combinations with Indic_Conjunct_Break (InCB)=Linker.
// GB9c:  ~ \p{InCB=Linker} × \p{InCB=Consonant}
//                          × \p{InCB=Linker}
//        modified from
//          \p{InCB=Consonant} [ \p{InCB=Extend} \p{InCB=Linker} ]* \p{InCB=Linker} [ \p{InCB=Extend} \p{InCB=Linker} ]* × \p{InCB=Consonant}
//        because this has almost the same effect from what I can tell for most text, and greatly simplifies our design.
//
// Do not break within emoji modifier sequences or emoji zwj sequences.
// GB11:  ~ ZWJ × \p{Extended_Pictographic}    modified from    \p{Extended_Pictographic} Extend* ZWJ × \p{Extended_Pictographic}
//        because this allows us to use LUTs, while working for most valid text.
//
// Do not break within emoji flag sequences. That is, do not break between regional indicator (RI) symbols if there is an odd number of RI characters before the break point.
// GB12:  ~ sot (RI RI)* RI × RI
// GB13:  ~ [^RI] (RI RI)* RI × RI
//        approximated as "pair up RIs, then break": the first RI × RI join moves
//        to the second table below, which forbids further RI joins. Odd-length
//        RI runs thus pair up from the left, which is accepted for terminal use.
//
// Otherwise, break everywhere.
// GB999: ✓ Any ÷ Any
//
// This is a great reference for the resulting table:
// https://www.unicode.org/Public/UCD/latest/ucd/auxiliary/GraphemeBreakTest.html
#[rustfmt::skip]
pub const JOIN_RULES_GRAPHEME_CLUSTER: [[[i32; 14]; 14]; 2] = [
    // Base table
    [
        /* ↓ leading        → trailing codepoint                                                                                                                   */
        /*               |   Other  |  Control |  Extend  |    RI    | Prepend  |  HangulL |  HangulV |  HangulT | HangulLV | HangulLVT | InCBLinker | InCBConsonant |  ExtPic  |    ZWJ   | */
        /* Other         | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /*  |  */, 0 /*  |     */, X /*     | */, X /* | */, 0 /* | */],
        /* Control       | */ [X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /*  |  */, X /*  |     */, X /*     | */, X /* | */, X /* | */],
        /* Extend        | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /*  |  */, 0 /*  |     */, X /*     | */, X /* | */, 0 /* | */],
        /* RI            | */ [X /* | */, X /* | */, 0 /* | */, 1 /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /*  |  */, 0 /*  |     */, X /*     | */, X /* | */, 0 /* | */],
        /* Prepend       | */ [0 /* | */, X /* | */, 0 /* | */, 0 /* | */, 0 /* | */, 0 /* | */, 0 /* | */, 0 /* | */, 0 /* | */, 0 /*  |  */, 0 /*  |     */, 0 /*     | */, 0 /* | */, 0 /* | */],
        /* HangulL       | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, 0 /* | */, 0 /* | */, X /* | */, 0 /* | */, 0 /*  |  */, 0 /*  |     */, X /*     | */, X /* | */, 0 /* | */],
        /* HangulV       | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, X /* | */, 0 /* | */, 0 /* | */, X /* | */, X /*  |  */, 0 /*  |     */, X /*     | */, X /* | */, 0 /* | */],
        /* HangulT       | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, X /* | */, X /* | */, 0 /* | */, X /* | */, X /*  |  */, 0 /*  |     */, X /*     | */, X /* | */, 0 /* | */],
        /* HangulLV      | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, X /* | */, 0 /* | */, 0 /* | */, X /* | */, X /*  |  */, 0 /*  |     */, X /*     | */, X /* | */, 0 /* | */],
        /* HangulLVT     | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, X /* | */, X /* | */, 0 /* | */, X /* | */, X /*  |  */, 0 /*  |     */, X /*     | */, X /* | */, 0 /* | */],
        /* InCBLinker    | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /*  |  */, 0 /*  |     */, 0 /*     | */, X /* | */, 0 /* | */],
        /* InCBConsonant | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /*  |  */, 0 /*  |     */, X /*     | */, X /* | */, 0 /* | */],
        /* ExtPic        | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /*  |  */, 0 /*  |     */, X /*     | */, X /* | */, 0 /* | */],
        /* ZWJ           | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /*  |  */, 0 /*  |     */, X /*     | */, 0 /* | */, 0 /* | */],
    ],
    // Once we have encountered a Regional Indicator pair we'll enter this table.
    // It's a copy of the base table, but instead of RI × RI, we're RI ÷ RI.
    [
        /* ↓ leading        → trailing codepoint                                                                                                                   */
        /*               |   Other  |  Control |  Extend  |    RI    | Prepend  |  HangulL |  HangulV |  HangulT | HangulLV | HangulLVT | InCBLinker | InCBConsonant |  ExtPic  |    ZWJ   | */
        /* Other         | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /*  |  */, 0 /*  |     */, X /*     | */, X /* | */, 0 /* | */],
        /* Control       | */ [X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /*  |  */, X /*  |     */, X /*     | */, X /* | */, X /* | */],
        /* Extend        | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /*  |  */, 0 /*  |     */, X /*     | */, X /* | */, 0 /* | */],
        /* RI            | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /*  |  */, 0 /*  |     */, X /*     | */, X /* | */, 0 /* | */],
        /* Prepend       | */ [0 /* | */, X /* | */, 0 /* | */, 0 /* | */, 0 /* | */, 0 /* | */, 0 /* | */, 0 /* | */, 0 /* | */, 0 /*  |  */, 0 /*  |     */, 0 /*     | */, 0 /* | */, 0 /* | */],
        /* HangulL       | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, 0 /* | */, 0 /* | */, X /* | */, 0 /* | */, 0 /*  |  */, 0 /*  |     */, X /*     | */, X /* | */, 0 /* | */],
        /* HangulV       | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, X /* | */, 0 /* | */, 0 /* | */, X /* | */, X /*  |  */, 0 /*  |     */, X /*     | */, X /* | */, 0 /* | */],
        /* HangulT       | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, X /* | */, X /* | */, 0 /* | */, X /* | */, X /*  |  */, 0 /*  |     */, X /*     | */, X /* | */, 0 /* | */],
        /* HangulLV      | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, X /* | */, 0 /* | */, 0 /* | */, X /* | */, X /*  |  */, 0 /*  |     */, X /*     | */, X /* | */, 0 /* | */],
        /* HangulLVT     | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, X /* | */, X /* | */, 0 /* | */, X /* | */, X /*  |  */, 0 /*  |     */, X /*     | */, X /* | */, 0 /* | */],
        /* InCBLinker    | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /*  |  */, 0 /*  |     */, 0 /*     | */, X /* | */, 0 /* | */],
        /* InCBConsonant | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /*  |  */, 0 /*  |     */, X /*     | */, X /* | */, 0 /* | */],
        /* ExtPic        | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /*  |  */, 0 /*  |     */, X /*     | */, X /* | */, 0 /* | */],
        /* ZWJ           | */ [X /* | */, X /* | */, 0 /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /* | */, X /*  |  */, 0 /*  |     */, X /*     | */, 0 /* | */, 0 /* | */],
    ],
];

/// Packs the two-bit-per-cell join tables into one `u32` per row.
///
/// Rows are padded out to 16 entries per state; the emitted code indexes them
/// with `class & 15`. The pad rows stay 0 and are unreachable, because no
/// class ordinal exceeds 13.
pub fn pack_join_rules(rules: &[[[i32; 14]; 14]; 2]) -> [[u32; 16]; 2] {
    let mut packed = [[0u32; 16]; 2];
    for (state, table) in rules.iter().enumerate() {
        assert!(table.len() <= packed[state].len(), "join rule table has too many rows");
        for (lead, row) in table.iter().enumerate() {
            packed[state][lead] = prepare_rules_row(row, 2, 3);
        }
    }
    packed
}

fn prepare_rules_row(row: &[i32], bit_width: usize, non_joiner_value: i32) -> u32 {
    assert!(row.len() * bit_width <= 32, "join rule row with {} cells doesn't fit u32", row.len());
    row.iter().enumerate().fold(0u32, |acc, (trail, &value)| {
        let value = if value < 0 { non_joiner_value } else { value };
        assert!((value as u32) < (1 << bit_width), "join rule cell {value} out of range");
        acc | ((value as u32) << (trail * bit_width))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ucd::ClusterBreak;
    use crate::ucd::ClusterBreak::*;

    // Mirrors the emitted ucdGraphemeJoins routine.
    fn joins(packed: &[[u32; 16]; 2], state: u32, lead: ClusterBreak, trail: ClusterBreak) -> u32 {
        let l = lead as usize & 15;
        let t = trail as usize & 15;
        (packed[state as usize][l] >> (t * 2)) & 3
    }

    #[test]
    fn test_packing_roundtrip() {
        let packed = pack_join_rules(&JOIN_RULES_GRAPHEME_CLUSTER);
        for (state, table) in JOIN_RULES_GRAPHEME_CLUSTER.iter().enumerate() {
            for (lead, row) in table.iter().enumerate() {
                for (trail, &cell) in row.iter().enumerate() {
                    let expected = if cell < 0 { 3 } else { cell as u32 };
                    assert_eq!((packed[state][lead] >> (trail * 2)) & 3, expected);
                }
            }
        }
        // The pad rows beyond the 14 classes stay zero.
        for table in &packed {
            assert_eq!(table[14], 0);
            assert_eq!(table[15], 0);
        }
    }

    #[test]
    fn test_prepare_rules_row() {
        assert_eq!(prepare_rules_row(&[X, 0, 1, X], 2, 3), 0b11_01_00_11);
        assert_eq!(prepare_rules_row(&[1, 0, 1], 1, 0), 0b101);
    }

    #[test]
    #[should_panic(expected = "doesn't fit u32")]
    fn test_row_too_long() {
        prepare_rules_row(&[0; 17], 2, 3);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_cell_out_of_range() {
        prepare_rules_row(&[4], 2, 3);
    }

    #[test]
    fn test_combining_mark_joins() {
        let packed = pack_join_rules(&JOIN_RULES_GRAPHEME_CLUSTER);
        // U+0041 U+0301: no break between a letter and a combining mark.
        assert_eq!(joins(&packed, 0, Other, Extend), 0);
        // U+FE0F behaves like any other extender.
        assert_eq!(joins(&packed, 0, Extend, Extend), 0);
        // Controls never join.
        assert_eq!(joins(&packed, 0, Control, Extend), 3);
        assert_eq!(joins(&packed, 0, Other, Control), 3);
    }

    #[test]
    fn test_regional_indicator_pairs() {
        let packed = pack_join_rules(&JOIN_RULES_GRAPHEME_CLUSTER);
        // Four RIs (two flags): join, forced break, join.
        let s = joins(&packed, 0, RI, RI);
        assert_eq!(s, 1);
        let s = joins(&packed, s, RI, RI);
        assert_eq!(s, 3);
        // After the break the machine restarts in the base table.
        let s = joins(&packed, 0, RI, RI);
        assert_eq!(s, 1);
    }

    #[test]
    fn test_indic_conjuncts() {
        let packed = pack_join_rules(&JOIN_RULES_GRAPHEME_CLUSTER);
        // U+0915 U+094D U+0915 (KA, VIRAMA, KA) forms a single cluster.
        assert_eq!(joins(&packed, 0, InCBConsonant, InCBLinker), 0);
        assert_eq!(joins(&packed, 0, InCBLinker, InCBConsonant), 0);
    }

    #[test]
    fn test_emoji_zwj_sequences() {
        let packed = pack_join_rules(&JOIN_RULES_GRAPHEME_CLUSTER);
        // ExtPic ZWJ ExtPic chains stay joined.
        assert_eq!(joins(&packed, 0, ExtPic, ZWJ), 0);
        assert_eq!(joins(&packed, 0, ZWJ, ExtPic), 0);
        // But a bare ExtPic doesn't join a following one.
        assert_eq!(joins(&packed, 0, ExtPic, ExtPic), 3);
    }

    #[test]
    fn test_hangul_syllables() {
        let packed = pack_join_rules(&JOIN_RULES_GRAPHEME_CLUSTER);
        assert_eq!(joins(&packed, 0, HangulL, HangulV), 0);
        assert_eq!(joins(&packed, 0, HangulV, HangulT), 0);
        assert_eq!(joins(&packed, 0, HangulLV, HangulT), 0);
        assert_eq!(joins(&packed, 0, HangulLVT, HangulT), 0);
        assert_eq!(joins(&packed, 0, HangulT, HangulL), 3);
    }

    #[test]
    fn test_second_table_forbids_ri_joins_only() {
        let packed = pack_join_rules(&JOIN_RULES_GRAPHEME_CLUSTER);
        for lead in 0..14 {
            for trail in 0..14 {
                let base = (packed[0][lead] >> (trail * 2)) & 3;
                let paired = (packed[1][lead] >> (trail * 2)) & 3;
                if lead == RI as usize && trail == RI as usize {
                    assert_eq!(base, 1);
                    assert_eq!(paired, 3);
                } else {
                    assert_eq!(base, paired);
                }
            }
        }
    }
}
