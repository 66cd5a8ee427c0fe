// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::ops::RangeInclusive;

use anyhow::{Context, bail};

/// `CharacterWidth` is 2 bits.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum CharacterWidth {
    ZeroWidth,
    Narrow,
    Wide,
    Ambiguous,
}

/// `ClusterBreak` is 4 bits.
/// NOTE: The order of these items must match `JOIN_RULES_GRAPHEME_CLUSTER`,
/// because the packed rule rows are indexed by `class & 15`.
#[derive(Clone, Copy, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum ClusterBreak {
    Other,         // GB999
    Control,       // GB4, GB5 -- includes CR and LF
    Extend,        // GB9, GB9a -- includes SpacingMark
    RI,            // GB12, GB13
    Prepend,       // GB9b
    HangulL,       // GB6, GB7, GB8
    HangulV,       // GB6, GB7, GB8
    HangulT,       // GB6, GB7, GB8
    HangulLV,      // GB6, GB7, GB8
    HangulLVT,     // GB6, GB7, GB8
    InCBLinker,    // GB9c
    InCBConsonant, // GB9c
    ExtPic,        // GB11
    ZWJ,           // GB9, GB11
}

pub const CLUSTER_BREAK_COUNT: usize = ClusterBreak::ZWJ as usize + 1;
const _: () = assert!(CLUSTER_BREAK_COUNT <= 16);

pub const MASK_CLUSTER_BREAK: u32 = 15;
pub const SHIFT_CHARACTER_WIDTH: u32 = 6;

/// An 8-bit `(ClusterBreak, CharacterWidth)` pair.
///
/// The low 4 bits hold the `ClusterBreak` ordinal and the top 2 bits hold the
/// `CharacterWidth` ordinal, so that extracting the width is a single shift.
/// Bits 4 and 5 are always zero.
#[repr(transparent)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedValue(u8);

impl PackedValue {
    pub fn new(cb: ClusterBreak, cw: CharacterWidth) -> Self {
        let cb = cb as u32;
        let cw = cw as u32;
        assert!(cb <= MASK_CLUSTER_BREAK);
        assert!(cw <= 3);
        Self((cb | (cw << SHIFT_CHARACTER_WIDTH)) as u8)
    }

    pub fn value(self) -> u32 {
        self.0 as u32
    }
}

#[derive(Default, Debug)]
pub struct Ucd {
    pub description: String,
    pub values: Vec<PackedValue>,
}

pub fn extract_values_from_ucd(doc: &roxmltree::Document) -> anyhow::Result<Ucd> {
    let mut values = vec![PackedValue::new(ClusterBreak::Other, CharacterWidth::Narrow); 1114112];

    let ns = "http://www.unicode.org/ns/2003/ucd/1.0";
    let root = doc.root_element();
    let description = root
        .children()
        .find(|n| n.has_tag_name((ns, "description")))
        .context("missing ucd description")?;
    let repertoire = root
        .children()
        .find(|n| n.has_tag_name((ns, "repertoire")))
        .context("missing ucd repertoire")?;
    let description = description.text().unwrap_or_default().to_string();

    for group in repertoire.children().filter(|n| n.is_element()) {
        const DEFAULT_ATTRIBUTES: UcdAttributes = UcdAttributes {
            general_category: "",
            grapheme_cluster_break: "",
            indic_conjunct_break: "",
            extended_pictographic: "",
            east_asian: "",
        };
        let group_attributes = extract_attributes(&group, &DEFAULT_ATTRIBUTES);

        for char in group.children().filter(|n| n.is_element()) {
            let char_attributes = extract_attributes(&char, &group_attributes);
            let range = extract_range(&char);

            let mut cb = match char_attributes.grapheme_cluster_break {
                "XX" => ClusterBreak::Other, // Anything else
                // We ignore GB3 which demands that CR × LF do not break apart, because
                // * these control characters won't normally reach our text storage
                // * a terminal historically stores them in separate cells anyway
                // This lets CR, LF, and the remaining controls share a single class.
                "CR" | "LF" | "CN" => ClusterBreak::Control,
                "EX" | "SM" => ClusterBreak::Extend, // Extend, SpacingMark
                "PP" => ClusterBreak::Prepend,       // Prepend
                "ZWJ" => ClusterBreak::ZWJ,          // Zero Width Joiner
                "RI" => ClusterBreak::RI,            // Regional Indicator
                "L" => ClusterBreak::HangulL,        // Hangul Syllable Type L
                "V" => ClusterBreak::HangulV,        // Hangul Syllable Type V
                "T" => ClusterBreak::HangulT,        // Hangul Syllable Type T
                "LV" => ClusterBreak::HangulLV,      // Hangul Syllable Type LV
                "LVT" => ClusterBreak::HangulLVT,    // Hangul Syllable Type LVT
                _ => bail!(
                    "Unrecognized GCB {:?} for U+{:04X} to U+{:04X}",
                    char_attributes.grapheme_cluster_break,
                    range.start(),
                    range.end()
                ),
            };

            if char_attributes.extended_pictographic == "Y" {
                // Currently every single Extended_Pictographic codepoint happens to be GCB=XX.
                // This is fantastic for us because it means we can stuff it into the ClusterBreak enum
                // and treat it as an alias of EXTEND, but with the special GB11 properties.
                if cb != ClusterBreak::Other {
                    bail!(
                        "Unexpected GCB {:?} with ExtPict=Y for U+{:04X} to U+{:04X}",
                        char_attributes.grapheme_cluster_break,
                        range.start(),
                        range.end()
                    );
                }

                cb = ClusterBreak::ExtPic;
            }

            cb = match char_attributes.indic_conjunct_break {
                "None" | "Extend" => cb,
                // InCB=Linker is a subset of GCB=EX and InCB=Consonant a subset of GCB=XX.
                // Anything else means the UCD changed in a way this mapping doesn't understand.
                "Linker" if cb == ClusterBreak::Extend => ClusterBreak::InCBLinker,
                "Consonant" if cb == ClusterBreak::Other => ClusterBreak::InCBConsonant,
                "Linker" | "Consonant" => bail!(
                    "Unexpected GCB {:?} with InCB={:?} for U+{:04X} to U+{:04X}",
                    char_attributes.grapheme_cluster_break,
                    char_attributes.indic_conjunct_break,
                    range.start(),
                    range.end()
                ),
                _ => bail!(
                    "Unrecognized InCB {:?} for U+{:04X} to U+{:04X}",
                    char_attributes.indic_conjunct_break,
                    range.start(),
                    range.end()
                ),
            };

            let mut cw = match char_attributes.east_asian {
                "N" | "Na" | "H" => CharacterWidth::Narrow, // Half-width, Narrow, Neutral
                "F" | "W" => CharacterWidth::Wide,          // Wide, Full-width
                "A" => CharacterWidth::Ambiguous,           // Ambiguous
                _ => bail!(
                    "Unrecognized ea {:?} for U+{:04X} to U+{:04X}",
                    char_attributes.east_asian,
                    range.start(),
                    range.end()
                ),
            };

            // There's no "ea" attribute for "zero width" so we need to do that ourselves. This matches:
            //   M*: Mark, all subtypes
            //   Cf: Control, format
            if char_attributes.general_category.starts_with('M')
                || char_attributes.general_category == "Cf"
            {
                cw = CharacterWidth::ZeroWidth;
            }

            values[range].fill(PackedValue::new(cb, cw));
        }
    }

    // U+2500 to U+257F: Box Drawing block
    // U+2580 to U+259F: Block Elements block
    // By default, CharacterWidth::Ambiguous, but by convention Narrow in terminals.
    values[0x2500..=0x259F].fill(PackedValue::new(ClusterBreak::Other, CharacterWidth::Narrow));

    // U+FE0F Variation Selector-16 is used to turn unqualified Emojis into qualified ones.
    // By convention, this turns them from being ambiguous width (= narrow) into wide ones.
    // We achieve this here by explicitly giving this codepoint a wide width.
    values[0xFE0F] = PackedValue::new(ClusterBreak::Extend, CharacterWidth::Wide);

    Ok(Ucd { description, values })
}

struct UcdAttributes<'a> {
    general_category: &'a str,
    grapheme_cluster_break: &'a str,
    indic_conjunct_break: &'a str,
    extended_pictographic: &'a str,
    east_asian: &'a str,
}

fn extract_attributes<'a>(
    node: &'a roxmltree::Node,
    default: &'a UcdAttributes,
) -> UcdAttributes<'a> {
    UcdAttributes {
        general_category: node.attribute("gc").unwrap_or(default.general_category),
        grapheme_cluster_break: node.attribute("GCB").unwrap_or(default.grapheme_cluster_break),
        indic_conjunct_break: node.attribute("InCB").unwrap_or(default.indic_conjunct_break),
        extended_pictographic: node.attribute("ExtPict").unwrap_or(default.extended_pictographic),
        east_asian: node.attribute("ea").unwrap_or(default.east_asian),
    }
}

fn extract_range(node: &roxmltree::Node) -> RangeInclusive<usize> {
    let (first, last) = match node.attribute("cp") {
        Some(val) => {
            let cp = usize::from_str_radix(val, 16).unwrap();
            (cp, cp)
        }
        None => (
            usize::from_str_radix(node.attribute("first-cp").unwrap_or("0"), 16).unwrap(),
            usize::from_str_radix(node.attribute("last-cp").unwrap_or("0"), 16).unwrap(),
        ),
    };
    first..=last
}
