//! End-to-end tests: grammar source → compact FST → beam decoding.

use nfst::{Decoder, Fst};
use nregex::Grammar;

/// Build the FST for `rule` out of `source`, panicking on any build error.
fn build(source: &str, rule: &str) -> Fst {
    let grammar = Grammar::from_string(source).expect("grammar must parse");
    grammar.build_fst(rule).expect("fst must build")
}

fn assert_decode(decoder: &Decoder<'_>, input: &str, output: &str) {
    let result = decoder.decode_string(input).expect("decode must succeed");
    assert_eq!(result.join(""), output, "input: {input}");
}

fn assert_decode_fail(decoder: &Decoder<'_>, input: &str) {
    assert!(
        decoder.decode_string(input).is_err(),
        "decode of {input:?} should fail"
    );
}

#[test]
fn literal_sequence() {
    let fst = build("<weather> ::= weather in seattle", "weather");
    let decoder = Decoder::new(&fst, 8);
    assert_decode(&decoder, "weather in seattle", "weather in seattle");
    assert_decode_fail(&decoder, "weather in bellevue");
}

#[test]
fn escaped_and_unicode_literals() {
    let fst = build("<weather> ::= hi\\tseattle", "weather");
    let decoder = Decoder::new(&fst, 8);
    assert_decode(&decoder, "hi\tseattle", "hi\tseattle");

    let fst = build("<hello> ::= hello \u{4e16}界", "hello");
    let decoder = Decoder::new(&fst, 8);
    assert_decode(&decoder, "hello 世界", "hello 世界");
}

#[test]
fn inline_parallel() {
    let fst = build("<weather> ::= weather (in|of) seattle", "weather");
    let decoder = Decoder::new(&fst, 8);
    assert_decode(&decoder, "weather in seattle", "weather in seattle");
    assert_decode(&decoder, "weather of seattle", "weather of seattle");
    assert_decode_fail(&decoder, "weather at seattle");
}

#[test]
fn rule_references() {
    let source = "<weather> ::= <city> weather\n\
                  <city> ::= (seattle|bellevue|redmond)\n";
    let fst = build(source, "weather");
    let decoder = Decoder::new(&fst, 8);
    assert_decode(&decoder, "seattle weather", "seattle weather");
    assert_decode(&decoder, "bellevue weather", "bellevue weather");
    assert_decode(&decoder, "redmond weather", "redmond weather");
    assert_decode_fail(&decoder, "suzhou weather");
}

#[test]
fn star_closure() {
    let fst = build("<hello> ::= he*llo", "hello");
    let decoder = Decoder::new(&fst, 8);
    assert_decode(&decoder, "hllo", "hllo");
    assert_decode(&decoder, "hello", "hello");
    assert_decode(&decoder, "heello", "heello");
    assert_decode(&decoder, "heeello", "heeello");
    assert_decode_fail(&decoder, "helllo");
}

#[test]
fn plus_closure() {
    let fst = build("<hello> ::= he+llo", "hello");
    let decoder = Decoder::new(&fst, 8);
    assert_decode(&decoder, "hello", "hello");
    assert_decode(&decoder, "heello", "heello");
    assert_decode(&decoder, "heeello", "heeello");
    assert_decode_fail(&decoder, "hllo");
}

#[test]
fn optional_closure() {
    let fst = build("<hello> ::= he?llo", "hello");
    let decoder = Decoder::new(&fst, 8);
    assert_decode(&decoder, "hllo", "hllo");
    assert_decode(&decoder, "hello", "hello");
    assert_decode_fail(&decoder, "heello");
    assert_decode_fail(&decoder, "heeello");
}

#[test]
fn exact_closure() {
    let fst = build("<hello> ::= he{3}llo", "hello");
    let decoder = Decoder::new(&fst, 8);
    assert_decode(&decoder, "heeello", "heeello");
    assert_decode_fail(&decoder, "hello");
    assert_decode_fail(&decoder, "heeeello");
}

#[test]
fn at_least_closure() {
    let fst = build("<hello> ::= he{3,}llo", "hello");
    let decoder = Decoder::new(&fst, 8);
    assert_decode(&decoder, "heeello", "heeello");
    assert_decode(&decoder, "heeeello", "heeeello");
    assert_decode(&decoder, "heeeeello", "heeeeello");
    assert_decode_fail(&decoder, "hllo");
    assert_decode_fail(&decoder, "hello");
    assert_decode_fail(&decoder, "heello");
}

#[test]
fn bounded_closure() {
    let fst = build("<hello> ::= he{2,4}llo", "hello");
    let decoder = Decoder::new(&fst, 8);
    assert_decode(&decoder, "heello", "heello");
    assert_decode(&decoder, "heeello", "heeello");
    assert_decode(&decoder, "heeeello", "heeeello");
    assert_decode_fail(&decoder, "hllo");
    assert_decode_fail(&decoder, "hello");
    assert_decode_fail(&decoder, "heeeeello");
}

#[test]
fn closure_over_references() {
    let source = "<city> ::= ( bellevue| redmond| seattle)\n\
                  <weather> ::= weather( in)?<city>*\n";
    let fst = build(source, "weather");
    let decoder = Decoder::new(&fst, 8);
    assert_decode(&decoder, "weather bellevue", "weather bellevue");
    assert_decode(&decoder, "weather in seattle", "weather in seattle");
    assert_decode(&decoder, "weather", "weather");
    assert_decode(
        &decoder,
        "weather in seattle bellevue",
        "weather in seattle bellevue",
    );
}

#[test]
fn character_class_with_capture() {
    let fst = build("<hi> ::= hi [abc0-9]+", "hi");
    let decoder = Decoder::new(&fst, 8);
    assert_decode(&decoder, "hi a9c", "hi a9c");
    assert_decode(
        &decoder,
        "hi abc123cbaaabbcc002233",
        "hi abc123cbaaabbcc002233",
    );
    assert_decode_fail(&decoder, "hi xyz");
}

#[test]
fn complemented_character_class() {
    let fst = build("<na> ::= [^a]", "na");
    let decoder = Decoder::new(&fst, 8);
    assert_decode(&decoder, "b", "b");
    assert_decode(&decoder, "世", "世");
    assert_decode_fail(&decoder, "a");
}

#[test]
fn multi_line_rule() {
    let source = "<city> ::= ( \n\
                  \tbellevue\n\
                  \tredmond\n\
                  \tseattle\n\
                  )\n\
                  <weather> ::= weather in <city>\n";
    let fst = build(source, "weather");
    let decoder = Decoder::new(&fst, 8);
    assert_decode(&decoder, "weather in bellevue", "weather in bellevue");
    assert_decode(&decoder, "weather in seattle", "weather in seattle");
}

#[test]
fn capture_brackets_rule_expansion() {
    let source = "$capture = <city>\n\
                  <city> ::= ( \n\
                  \tbellevue\n\
                  \tredmond\n\
                  \tseattle\n\
                  )\n\
                  <weather> ::= weather in <city>\n";
    let fst = build(source, "weather");
    let decoder = Decoder::new(&fst, 8);
    assert_decode(
        &decoder,
        "weather in seattle",
        "weather in <city>seattle</city>",
    );
}

#[test]
fn decoding_is_deterministic() {
    let source = "<city> ::= ( bellevue| redmond| seattle)\n\
                  <weather> ::= weather( in)?<city>*\n";
    let fst = build(source, "weather");
    let decoder = Decoder::new(&fst, 8);

    let first = decoder.decode_string("weather in seattle").unwrap();
    for _ in 0..10 {
        assert_eq!(decoder.decode_string("weather in seattle").unwrap(), first);
    }
}

#[test]
fn capture_parity_on_best_path() {
    let fst = build("<num> ::= [0-9]{3}", "num");
    let decoder = Decoder::new(&fst, 8);
    let output = decoder.decode_string("407").unwrap();
    // every <alpha> output was substituted by exactly one captured codepoint
    assert_eq!(output, vec!["4".to_string(), "0".to_string(), "7".to_string()]);
}

#[test]
fn file_round_trip_decodes_identically() {
    let source = "$capture = <city>\n\
                  <city> ::= (bellevue|redmond|seattle)\n\
                  <weather> ::= weather in <city>\n";
    let fst = build(source, "weather");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weather.nfst");
    let mut file = std::fs::File::create(&path).unwrap();
    fst.write(&mut file).unwrap();
    drop(file);

    let mut file = std::fs::File::open(&path).unwrap();
    let read_back = Fst::read(&mut file).unwrap();

    assert_eq!(read_back.states, fst.states);
    assert_eq!(read_back.arcs, fst.arcs);
    assert_eq!(read_back.epsilon_arcs, fst.epsilon_arcs);
    assert_eq!(read_back.range_arcs, fst.range_arcs);
    assert_eq!(read_back.output_symbols, fst.output_symbols);
    assert_eq!(read_back.input_symbols, fst.input_symbols);

    let before = Decoder::new(&fst, 8);
    let after = Decoder::new(&read_back, 8);
    for input in ["weather in seattle", "weather in redmond"] {
        assert_eq!(
            before.decode_string(input).unwrap(),
            after.decode_string(input).unwrap()
        );
    }
}

#[test]
fn shared_fst_across_threads() {
    let fst = build("<hello> ::= he*llo", "hello");
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let decoder = Decoder::new(&fst, 8);
                assert_decode(&decoder, "heello", "heello");
            });
        }
    });
}
