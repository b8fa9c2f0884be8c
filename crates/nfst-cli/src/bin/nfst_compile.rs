// nfst-compile: compile an n-regex grammar file into an n-fst binary.
//
// Usage:
//   nfst-compile -r ROOT [-o OUT.nfst] GRAMMAR
//
// Options:
//   -r, --rule NAME     Root rule to compile
//   -o, --output PATH   Output file (default: GRAMMAR with .nfst extension)
//   -h, --help          Print help

use std::path::PathBuf;

use nregex::Grammar;

fn main() {
    nfst_cli::init_tracing();
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if nfst_cli::wants_help(&args) || args.is_empty() {
        println!("nfst-compile: compile an n-regex grammar into an n-fst binary.");
        println!();
        println!("Usage: nfst-compile -r ROOT [-o OUT.nfst] GRAMMAR");
        println!();
        println!("Options:");
        println!("  -r, --rule NAME     Root rule to compile");
        println!("  -o, --output PATH   Output file (default: GRAMMAR with .nfst extension)");
        println!("  -h, --help          Print this help");
        return;
    }

    let rule = nfst_cli::take_flag(&mut args, "-r", "--rule")
        .unwrap_or_else(|| nfst_cli::fatal("a root rule is required (-r ROOT)"));
    let output = nfst_cli::take_flag(&mut args, "-o", "--output");

    let [grammar_path] = args.as_slice() else {
        nfst_cli::fatal("exactly one grammar file is expected");
    };

    let grammar = Grammar::from_file(grammar_path)
        .unwrap_or_else(|e| nfst_cli::fatal(&format!("failed to load grammar: {e}")));
    let fst = grammar
        .build_fst(&rule)
        .unwrap_or_else(|e| nfst_cli::fatal(&format!("failed to build fst: {e}")));

    let output = output.map(PathBuf::from).unwrap_or_else(|| {
        let mut path = PathBuf::from(grammar_path);
        path.set_extension("nfst");
        path
    });

    let mut file = std::fs::File::create(&output)
        .unwrap_or_else(|e| nfst_cli::fatal(&format!("failed to create {}: {e}", output.display())));
    fst.write(&mut file)
        .unwrap_or_else(|e| nfst_cli::fatal(&format!("failed to write {}: {e}", output.display())));

    println!(
        "{}: {} states, {} arcs, {} epsilon arcs, {} range arcs",
        output.display(),
        fst.states.len(),
        fst.arcs.len(),
        fst.epsilon_arcs.len(),
        fst.range_arcs.len()
    );
}
