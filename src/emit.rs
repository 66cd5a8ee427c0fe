// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Write as FmtWrite;

use indoc::writedoc;

use crate::trie::Trie;
use crate::ucd::{MASK_CLUSTER_BREAK, SHIFT_CHARACTER_WIDTH, Ucd};

/// Renders the generated module: the stage arrays, the packed join rules,
/// and the four accessor routines, bracketed by clang-format directives.
pub fn generate_c(ucd: &Ucd, trie: &Trie, rules: &[[u32; 16]; 2], total_size: usize) -> String {
    let mut buf = String::new();

    _ = writedoc!(
        buf,
        "
        // BEGIN: Generated by ucd-table-gen
        // on {}, from {}, {} bytes
        // clang-format off
        ",
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        ucd.description,
        total_size,
    );

    for stage in &trie.stages {
        let mut width = 16;
        if stage.index != 0 {
            width = stage.mask + 1;
        }

        _ = write!(buf, "static const uint{}_t s_stage{}[] = {{", stage.bits, stage.index + 1);
        for (j, &value) in stage.values.iter().enumerate() {
            if j % width == 0 {
                buf.push_str("\n   ");
            }
            _ = write!(buf, " 0x{:01$x},", value, stage.bits / 4);
        }
        buf.push_str("\n};\n");
    }

    _ = writeln!(buf, "static const uint32_t s_joinRules[{}][{}] = {{", rules.len(), rules[0].len());
    for table in rules {
        buf.push_str("    {\n");
        for &r in table {
            _ = writeln!(buf, "        0b{r:032b},");
        }
        buf.push_str("    },\n");
    }
    buf.push_str("};\n");

    let leaf_bits = trie.stages.last().unwrap().bits;
    _ = writedoc!(
        buf,
        "
        inline uint{}_t ucdLookup(const uint32_t cp)
        {{
        ",
        leaf_bits,
    );
    for stage in &trie.stages {
        if stage.index == 0 {
            _ = writeln!(
                buf,
                "    const uint{}_t s1 = s_stage1[cp >> {}];",
                stage.bits, stage.shift,
            );
        } else {
            _ = writeln!(
                buf,
                "    const uint{}_t s{} = s_stage{}[s{} + ((cp >> {}) & {})];",
                stage.bits,
                stage.index + 1,
                stage.index + 1,
                stage.index,
                stage.shift,
                stage.mask,
            );
        }
    }
    _ = writedoc!(
        buf,
        "
            return s{};
        }}
        ",
        trie.stages.len(),
    );

    _ = writedoc!(
        buf,
        "
        inline int ucdGraphemeJoins(const int state, const int lead, const int trail)
        {{
            const int l = lead & {0};
            const int t = trail & {0};
            return (s_joinRules[state][l] >> (t * 2)) & 3;
        }}
        inline bool ucdGraphemeDone(const int state)
        {{
            return state == 3;
        }}
        inline int ucdToCharacterWidth(const int val)
        {{
            return val >> {1};
        }}
        ",
        MASK_CLUSTER_BREAK,
        SHIFT_CHARACTER_WIDTH,
    );

    buf.push_str("// clang-format on\n// END: Generated by ucd-table-gen\n");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{JOIN_RULES_GRAPHEME_CLUSTER, pack_join_rules};
    use crate::trie::build_trie;
    use crate::ucd::{CharacterWidth, ClusterBreak, PackedValue};

    fn sample() -> (Ucd, Trie, [[u32; 16]; 2], usize) {
        let values: Vec<PackedValue> = (0..1024)
            .map(|i| {
                if i % 7 == 0 {
                    PackedValue::new(ClusterBreak::Extend, CharacterWidth::ZeroWidth)
                } else {
                    PackedValue::new(ClusterBreak::Other, CharacterWidth::Narrow)
                }
            })
            .collect();
        let flat: Vec<u32> = values.iter().map(|v| v.value()).collect();
        let trie = build_trie(flat, &[3, 2]);
        let rules = pack_join_rules(&JOIN_RULES_GRAPHEME_CLUSTER);
        let total_size = trie.total_size + rules.len() * 16 * 4;
        let ucd = Ucd { description: "Unicode 16.0.0".to_string(), values };
        (ucd, trie, rules, total_size)
    }

    #[test]
    fn test_generated_module_shape() {
        let (ucd, trie, rules, total_size) = sample();
        let out = generate_c(&ucd, &trie, &rules, total_size);

        assert!(out.starts_with("// BEGIN: Generated by ucd-table-gen\n"));
        assert!(out.ends_with("// clang-format on\n// END: Generated by ucd-table-gen\n"));
        assert!(out.contains("from Unicode 16.0.0,"));
        assert!(out.contains(&format!("{total_size} bytes")));

        // Stages are numbered root-first, starting at 1.
        assert!(out.contains("s_stage1[] = {"));
        assert!(out.contains("s_stage2[] = {"));
        assert!(out.contains("s_stage3[] = {"));
        assert!(!out.contains("s_stage4"));

        assert!(out.contains("static const uint32_t s_joinRules[2][16] = {"));
        // Rule rows are printed as 32-bit binary literals.
        assert_eq!(out.matches("        0b").count(), 32);

        assert!(out.contains("inline uint8_t ucdLookup(const uint32_t cp)"));
        assert!(out.contains("const uint8_t s1 = s_stage1[cp >> 5];"));
        assert!(out.contains("s_stage3[s2 + ((cp >> 0) & 7)];"));
        assert!(out.contains("return s3;"));
        assert!(out.contains("return (s_joinRules[state][l] >> (t * 2)) & 3;"));
        assert!(out.contains("return state == 3;"));
        assert!(out.contains("return val >> 6;"));
    }
}
