// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod emit;
mod rules;
mod trie;
mod ucd;

use std::io::Write as IoWrite;
use std::path::PathBuf;

use anyhow::bail;

const HELP: &str = "\
Usage: ucd-table-gen <ucd.nounihan.grouped.xml>
  -h, --help            Prints help information

Reads the grouped, XML flavor of the Unicode Character Database and writes
a C module with East Asian width and grapheme cluster break lookup tables
to stdout. Download ucd.nounihan.grouped.xml at:
  https://www.unicode.org/Public/UCD/latest/ucdxml/ucd.nounihan.grouped.zip
";

fn main() -> anyhow::Result<()> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        eprint!("{HELP}");
        return Ok(());
    }

    let arg_input = match args
        .opt_free_from_os_str(|s| -> Result<PathBuf, &'static str> { Ok(s.into()) })?
    {
        Some(path) => path,
        None => {
            eprint!("{HELP}");
            std::process::exit(1);
        }
    };
    let arg_remaining = args.finish();
    if !arg_remaining.is_empty() {
        bail!("unrecognized arguments: {:?}", arg_remaining);
    }

    let input = std::fs::read_to_string(arg_input)?;
    let doc = roxmltree::Document::parse(&input)?;
    let ucd = ucd::extract_values_from_ucd(&doc)?;

    // Find the best trie configuration over the given block sizes (2^2 - 2^8) and stages (4).
    // More stages = Less size. The trajectory roughly follows a+b*c^stages, where c < 1.
    // 4 still gives ~30% savings over 3 stages and going beyond 5 gives diminishing returns (<10%).
    let trie = trie::build_best_trie(&ucd.values, 2, 8, 4);

    // The join rules have 2 bits per cell. This packs them into 32-bit integers to save space.
    let rules = rules::pack_join_rules(&rules::JOIN_RULES_GRAPHEME_CLUSTER);

    // Each rules table is 16 items of 32 bits = 4 bytes each.
    let total_size = trie.total_size + rules.len() * 16 * 4;

    // Run a quick sanity check to ensure that the trie works as expected.
    // Nothing is emitted unless every codepoint round-trips.
    trie::verify(&trie, &ucd.values);

    let buf = emit::generate_c(&ucd, &trie, &rules, total_size);
    std::io::stdout().write_all(buf.as_bytes())?;
    Ok(())
}
