// nfst-decode: decode input lines against a compiled n-fst.
//
// Reads lines from stdin and prints the best-path output for each line.
// Lines that cannot be decoded are reported on stderr and skipped.
//
// Usage:
//   nfst-decode -f FST.nfst [-b BEAM]
//
// Options:
//   -f, --fst PATH     Compiled n-fst binary
//   -b, --beam SIZE    Beam width (default: 8)
//   -h, --help         Print help

use std::io::{self, BufRead, Write};

use nfst::{Decoder, Fst};

fn main() {
    nfst_cli::init_tracing();
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if nfst_cli::wants_help(&args) || args.is_empty() {
        println!("nfst-decode: decode stdin lines against a compiled n-fst.");
        println!();
        println!("Usage: nfst-decode -f FST.nfst [-b BEAM]");
        println!();
        println!("Options:");
        println!("  -f, --fst PATH     Compiled n-fst binary");
        println!("  -b, --beam SIZE    Beam width (default: 8)");
        println!("  -h, --help         Print this help");
        return;
    }

    let fst_path = nfst_cli::take_flag(&mut args, "-f", "--fst")
        .unwrap_or_else(|| nfst_cli::fatal("an fst file is required (-f FST.nfst)"));
    let beam_size = nfst_cli::take_flag(&mut args, "-b", "--beam")
        .map(|s| {
            s.parse::<usize>()
                .ok()
                .filter(|&b| b > 0)
                .unwrap_or_else(|| nfst_cli::fatal("beam size must be a positive integer"))
        })
        .unwrap_or(8);

    let mut file = std::fs::File::open(&fst_path)
        .unwrap_or_else(|e| nfst_cli::fatal(&format!("failed to open {fst_path}: {e}")));
    let fst = Fst::read(&mut file)
        .unwrap_or_else(|e| nfst_cli::fatal(&format!("failed to read {fst_path}: {e}")));
    let decoder = Decoder::new(&fst, beam_size);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    for (line_no, line) in stdin.lock().lines().enumerate() {
        let line = line.unwrap_or_else(|e| nfst_cli::fatal(&format!("failed to read stdin: {e}")));
        match decoder.decode_string(&line) {
            Ok(output) => {
                let _ = writeln!(out, "{}", output.join(""));
            }
            Err(e) => {
                eprintln!("line {}: {e}", line_no + 1);
            }
        }
    }
}
