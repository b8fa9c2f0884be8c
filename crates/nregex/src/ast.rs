// The n-regex expression tree and its compilation into a mutable FST.

use nfst_build::{Arc, MutableFst, Symbol};

use crate::grammar::Grammar;
use crate::{detail, Error};

/// An n-regex expression.
///
/// One tagged sum covers every expression form; compilation and checking are
/// exhaustive matches over it.
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    /// A single codepoint matched and emitted verbatim.
    Literal(char),
    /// A character class: explicit codepoints plus inclusive codepoint
    /// spans. Spans match through range arcs and emit `<alpha>`.
    Range {
        chars: Vec<char>,
        ranges: Vec<(u32, u32)>,
    },
    /// Weighted alternation. `branches` and `weights` run in parallel; all
    /// weights are positive.
    Parallel { branches: Vec<Ast>, weights: Vec<f32> },
    /// Repetition of `body` between `min` and `max` times; `None` means
    /// unbounded.
    Closure {
        min: u32,
        max: Option<u32>,
        body: Box<Ast>,
    },
    /// A reference to a named rule, inlined at compile time.
    Reference(String),
    Sequence(Vec<Ast>),
}

impl Ast {
    /// Compile this expression into `fst` starting at `state`; returns the
    /// end state of the compiled fragment.
    ///
    /// Rule references must have been validated with [`Ast::check`] first.
    pub fn add_to_fst(&self, grammar: &Grammar, fst: &mut MutableFst, state: usize) -> usize {
        match self {
            Ast::Literal(c) => {
                let symbol = Symbol::literal(String::from(*c));
                let next = fst.add_state();
                fst.add_arc(
                    state,
                    Arc {
                        next_state: next,
                        input: symbol.clone(),
                        output: symbol,
                        weight: 0.0,
                    },
                );
                next
            }

            Ast::Range { chars, ranges } => {
                let end = fst.add_state();
                for &c in chars {
                    let symbol = Symbol::literal(String::from(c));
                    fst.add_arc(
                        state,
                        Arc {
                            next_state: end,
                            input: symbol.clone(),
                            output: symbol,
                            weight: 0.0,
                        },
                    );
                }
                for &(begin, end_cp) in ranges {
                    fst.add_arc(
                        state,
                        Arc {
                            next_state: end,
                            input: Symbol::range(begin, end_cp),
                            output: Symbol::ALPHA,
                            weight: 0.0,
                        },
                    );
                }
                end
            }

            Ast::Parallel { branches, weights } => {
                let end = fst.add_state();
                let total: f32 = weights.iter().sum();
                for (i, branch) in branches.iter().enumerate() {
                    let tail = branch.add_to_fst(grammar, fst, state);
                    // disambig input keeps the branch distinguishable until
                    // the pre-packing cleanup
                    fst.add_arc(
                        tail,
                        Arc {
                            next_state: end,
                            input: Symbol::disambig(i as u32 + 1),
                            output: Symbol::Epsilon,
                            weight: -(weights[i] / total).ln(),
                        },
                    );
                }
                end
            }

            Ast::Closure { min, max, body } => {
                let mut state = state;
                for _ in 0..*min {
                    state = body.add_to_fst(grammar, fst, state);
                }

                let end = fst.add_state();
                fst.add_arc(
                    state,
                    Arc {
                        next_state: end,
                        input: Symbol::Epsilon,
                        output: Symbol::Epsilon,
                        weight: 0.0,
                    },
                );

                match max {
                    None => {
                        // unbounded: one more body copy looping back to end
                        let tail = body.add_to_fst(grammar, fst, end);
                        fst.add_arc(
                            tail,
                            Arc {
                                next_state: end,
                                input: Symbol::disambig(1),
                                output: Symbol::Epsilon,
                                weight: 0.0,
                            },
                        );
                    }
                    Some(max) => {
                        for _ in *min..*max {
                            state = body.add_to_fst(grammar, fst, state);
                            fst.add_arc(
                                state,
                                Arc {
                                    next_state: end,
                                    input: Symbol::disambig(1),
                                    output: Symbol::Epsilon,
                                    weight: 0.0,
                                },
                            );
                        }
                    }
                }
                end
            }

            Ast::Reference(name) => {
                let ast = grammar
                    .rule(name)
                    .expect("references are checked before compilation");
                if !grammar.is_capture(name) {
                    return ast.add_to_fst(grammar, fst, state);
                }

                // bracket the captured expansion with <name> / </name>
                let pre = fst.add_state();
                fst.add_arc(
                    state,
                    Arc {
                        next_state: pre,
                        input: Symbol::Epsilon,
                        output: Symbol::literal(format!("<{name}>")),
                        weight: 0.0,
                    },
                );
                let mid = ast.add_to_fst(grammar, fst, pre);
                let post = fst.add_state();
                fst.add_arc(
                    mid,
                    Arc {
                        next_state: post,
                        input: Symbol::Epsilon,
                        output: Symbol::literal(format!("</{name}>")),
                        weight: 0.0,
                    },
                );
                post
            }

            Ast::Sequence(children) => children
                .iter()
                .fold(state, |state, child| child.add_to_fst(grammar, fst, state)),
        }
    }

    /// Validate this expression against the grammar: every referenced rule
    /// must exist and reference chains must not cycle (the compiler inlines
    /// references, so a cycle would never terminate).
    pub fn check(&self, grammar: &Grammar, ref_stack: &mut Vec<String>) -> Result<(), Error> {
        match self {
            Ast::Literal(_) | Ast::Range { .. } => Ok(()),

            Ast::Parallel { branches, weights } => {
                if branches.len() != weights.len() {
                    return Err(Error::Grammar {
                        detail: detail::INTERNAL.to_string(),
                        ref_stack: ref_stack.clone(),
                    });
                }
                for branch in branches {
                    branch.check(grammar, ref_stack)?;
                }
                Ok(())
            }

            Ast::Closure { body, .. } => body.check(grammar, ref_stack),

            Ast::Reference(name) => {
                let Some(ast) = grammar.rule(name) else {
                    return Err(Error::Grammar {
                        detail: format!("reference rule <{name}> not exist"),
                        ref_stack: ref_stack.clone(),
                    });
                };
                if ref_stack.iter().any(|r| r == name) {
                    return Err(Error::Grammar {
                        detail: format!("cyclic reference to rule <{name}>"),
                        ref_stack: ref_stack.clone(),
                    });
                }
                ref_stack.push(name.clone());
                ast.check(grammar, ref_stack)?;
                ref_stack.pop();
                Ok(())
            }

            Ast::Sequence(children) => {
                for child in children {
                    child.check(grammar, ref_stack)?;
                }
                Ok(())
            }
        }
    }
}
