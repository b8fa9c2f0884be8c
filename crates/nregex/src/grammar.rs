// Grammar container: rule parsing, reference checking and FST building.

use std::path::Path;

use hashbrown::{HashMap, HashSet};
use tracing::debug;

use nfst_build::MutableFst;

use crate::ast::Ast;
use crate::parse::{parse_expr, read_and_check, read_name, skip_spaces};
use crate::reader::Reader;
use crate::{detail, syntax_error, Error};

/// A collection of named n-regex rules plus the set of capture rules.
///
/// Capture rules bracket their expansion in the output stream with
/// `<name>` / `</name>` tokens; they are declared with a
/// `$capture = <name> ...` line.
#[derive(Debug, Default)]
pub struct Grammar {
    rules: HashMap<String, Ast>,
    captures: HashSet<String>,
}

impl Grammar {
    /// Parse a grammar from in-memory source text.
    pub fn from_string(text: &str) -> Result<Grammar, Error> {
        Self::read(&mut Reader::from_string(text, "<inline>"))
    }

    /// Parse a grammar from a source file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Grammar, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::read(&mut Reader::from_string(&text, &path.to_string_lossy()))
    }

    fn read(reader: &mut Reader) -> Result<Grammar, Error> {
        let mut grammar = Grammar::default();
        while reader.scan_line() {
            if reader.at_eol() {
                continue;
            }
            match reader.rune() {
                '$' => grammar.parse_arg_decl(reader)?,
                '<' => grammar.parse_rule_decl(reader)?,
                _ => return Err(syntax_error(reader, detail::UNEXPECTED_CHAR)),
            }
        }
        Ok(grammar)
    }

    /// Parse a `$name = <rule> ...` argument line. The only accepted
    /// argument is `capture`.
    fn parse_arg_decl(&mut self, reader: &mut Reader) -> Result<(), Error> {
        reader.next_rune(); // consume '$'
        skip_spaces(reader);
        let name = read_name(reader, &['=', ' ', '\t'])?;
        skip_spaces(reader);
        read_and_check(reader, "=")?;
        if name != "capture" {
            return Err(syntax_error(reader, detail::UNEXPECTED_ARG_NAME));
        }

        loop {
            skip_spaces(reader);
            if reader.at_eol() {
                break;
            }
            if reader.rune() != '<' {
                return Err(syntax_error(reader, detail::UNEXPECTED_CHAR));
            }
            reader.next_rune();
            let rule = read_name(reader, &['>'])?;
            if rule.is_empty() {
                return Err(syntax_error(reader, detail::UNEXPECTED_CHAR));
            }
            reader.next_rune(); // consume '>'
            self.captures.insert(rule);
        }
        Ok(())
    }

    /// Parse a `<name> ::= ...` rule line, including the multi-line form
    /// whose right-hand side is a lone `(` followed by one branch per line
    /// and a closing `)` line.
    fn parse_rule_decl(&mut self, reader: &mut Reader) -> Result<(), Error> {
        reader.next_rune(); // consume '<'
        let name = read_name(reader, &['>'])?;
        if name.is_empty() {
            return Err(syntax_error(reader, detail::UNEXPECTED_CHAR));
        }
        reader.next_rune(); // consume '>'

        skip_spaces(reader);
        read_and_check(reader, "::=")?;
        skip_spaces(reader);
        if reader.at_eol() {
            return Err(syntax_error(reader, detail::EMPTY_EXPR));
        }

        let ast = if reader.rune() == '(' && reader.look_forward().is_none() {
            self.parse_multi_line_branches(reader)?
        } else {
            parse_expr(reader, &[])?
        };

        self.rules.insert(name, ast);
        Ok(())
    }

    /// Parse the branch lines of a multi-line rule. Every non-empty line up
    /// to the closing `)` is one parallel branch with weight 1.
    fn parse_multi_line_branches(&mut self, reader: &mut Reader) -> Result<Ast, Error> {
        let mut branches = Vec::new();
        loop {
            if !reader.scan_line() {
                return Err(syntax_error(reader, detail::UNEXPECTED_EOF));
            }
            if reader.at_eol() {
                continue;
            }
            if reader.rune() == ')' && reader.look_forward().is_none() {
                reader.next_rune();
                break;
            }
            branches.push(parse_expr(reader, &[])?);
        }

        match branches.len() {
            0 => Err(syntax_error(reader, detail::EMPTY_EXPR)),
            1 => Ok(branches.pop().unwrap()),
            _ => {
                let weights = vec![1.0; branches.len()];
                Ok(Ast::Parallel { branches, weights })
            }
        }
    }

    /// Look up a rule by name.
    pub fn rule(&self, name: &str) -> Option<&Ast> {
        self.rules.get(name)
    }

    /// Whether `name` was declared as a capture rule.
    pub fn is_capture(&self, name: &str) -> bool {
        self.captures.contains(name)
    }

    /// Validate the grammar reachable from `root`: the root and every
    /// referenced rule must exist, and reference chains must be acyclic.
    pub fn check(&self, root: &str) -> Result<(), Error> {
        let Some(ast) = self.rules.get(root) else {
            return Err(Error::Grammar {
                detail: format!("rule <{root}> not exist"),
                ref_stack: vec![root.to_string()],
            });
        };
        let mut ref_stack = vec![root.to_string()];
        ast.check(self, &mut ref_stack)
    }

    /// Compile the rule `root` into a compact FST: check, build the mutable
    /// FST, mark the end state final, erase disambiguation symbols, pack.
    pub fn build_fst(&self, root: &str) -> Result<nfst::Fst, Error> {
        self.check(root)?;
        let ast = self
            .rules
            .get(root)
            .expect("check verified the root rule exists");

        let mut fst = MutableFst::new();
        let end = ast.add_to_fst(self, &mut fst, 0);
        fst.set_final(end, 0.0);
        debug!(
            rule = root,
            states = fst.num_states(),
            input_symbols = fst.num_input_symbols(),
            "compiled rule"
        );

        let fst = fst.rm_disambig();
        Ok(nfst_build::build(&fst)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rules_and_captures() {
        let grammar = Grammar::from_string(
            "$capture = <city>\n\
             <city> ::= (bellevue|redmond|seattle)\n\
             <weather> ::= weather in <city>\n",
        )
        .unwrap();

        assert!(grammar.rule("city").is_some());
        assert!(grammar.rule("weather").is_some());
        assert!(grammar.is_capture("city"));
        assert!(!grammar.is_capture("weather"));
    }

    #[test]
    fn parse_multi_line_rule() {
        let grammar = Grammar::from_string(
            "<city> ::= (\n\
             \tbellevue\n\
             \tredmond\n\
             )\n",
        )
        .unwrap();

        let Some(Ast::Parallel { branches, weights }) = grammar.rule("city") else {
            panic!("parallel rule expected");
        };
        assert_eq!(branches.len(), 2);
        assert_eq!(weights, &[1.0, 1.0]);
    }

    #[test]
    fn multi_line_rule_without_closing_paren() {
        let err = Grammar::from_string("<city> ::= (\n\tbellevue\n").unwrap_err();
        let Error::Syntax { detail, .. } = err else {
            panic!("syntax error expected");
        };
        assert_eq!(detail, crate::detail::UNEXPECTED_EOF);
    }

    #[test]
    fn reject_unknown_argument() {
        let err = Grammar::from_string("$weights = <x>\n").unwrap_err();
        let Error::Syntax { detail, .. } = err else {
            panic!("syntax error expected");
        };
        assert_eq!(detail, crate::detail::UNEXPECTED_ARG_NAME);
    }

    #[test]
    fn reject_stray_line() {
        let err = Grammar::from_string("hello ::= world\n").unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));
    }

    #[test]
    fn reject_empty_rule_body() {
        let err = Grammar::from_string("<x> ::=\n").unwrap_err();
        let Error::Syntax { detail, .. } = err else {
            panic!("syntax error expected");
        };
        assert_eq!(detail, crate::detail::EMPTY_EXPR);
    }

    #[test]
    fn check_reports_unknown_reference() {
        let grammar = Grammar::from_string("<x> ::= <y>\n").unwrap();
        let err = grammar.check("x").unwrap_err();
        let Error::Grammar { detail, ref_stack } = err else {
            panic!("grammar error expected");
        };
        assert!(detail.contains("<y>"));
        assert_eq!(ref_stack, vec!["x".to_string()]);
    }

    #[test]
    fn check_reports_missing_root() {
        let grammar = Grammar::from_string("<x> ::= a\n").unwrap();
        assert!(grammar.check("nope").is_err());
    }

    #[test]
    fn check_reports_direct_cycle() {
        let grammar = Grammar::from_string("<x> ::= a <x>\n").unwrap();
        let err = grammar.check("x").unwrap_err();
        let Error::Grammar { detail, .. } = err else {
            panic!("grammar error expected");
        };
        assert!(detail.contains("cyclic"));
    }

    #[test]
    fn check_reports_indirect_cycle() {
        let grammar = Grammar::from_string(
            "<a> ::= x <b>\n\
             <b> ::= <c> y\n\
             <c> ::= <a>\n",
        )
        .unwrap();
        let err = grammar.check("a").unwrap_err();
        let Error::Grammar { detail, ref_stack } = err else {
            panic!("grammar error expected");
        };
        assert!(detail.contains("cyclic"));
        assert_eq!(
            ref_stack,
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn diamond_references_are_not_cycles() {
        let grammar = Grammar::from_string(
            "<a> ::= <b> <b>\n\
             <b> ::= x\n",
        )
        .unwrap();
        assert!(grammar.check("a").is_ok());
    }

    #[test]
    fn build_fst_rejects_unknown_reference() {
        let grammar = Grammar::from_string("<x> ::= <y>\n").unwrap();
        assert!(matches!(grammar.build_fst("x"), Err(Error::Grammar { .. })));
    }
}
