// Recursive-descent parser for n-regex expressions.

use crate::ast::Ast;
use crate::detail;
use crate::reader::Reader;
use crate::{syntax_error, syntax_error_at, Error};

/// Characters that terminate a literal run and carry structure instead.
const NON_LITERAL: &str = "<>?*+()[]{}|.^$/";

/// Characters forbidden in rule and argument names.
const INVALID_NAME: &str = " \t\r\n<>?*+()[]{}|^$:;,\\~!@#$%&-=`\"'/";

/// Parse one expression from the current line until end of line or one of
/// `end_chars` is reached (the terminator is left unconsumed).
pub(crate) fn parse_expr(reader: &mut Reader, end_chars: &[char]) -> Result<Ast, Error> {
    let mut asts: Vec<Ast> = Vec::new();

    while !reader.at_eol() {
        let ch = reader.rune();
        if end_chars.contains(&ch) {
            break;
        }

        let ast = if ch == '(' {
            read_parallel(reader)?
        } else if ch == '<' {
            read_reference(reader)?
        } else if matches!(ch, '*' | '+' | '?' | '{') {
            read_closure(reader, asts.pop())?
        } else if ch == '[' {
            read_bracket_range(reader)?
        } else if ch == '\\' && matches!(reader.look_forward(), Some('s' | 'w' | 'd')) {
            read_escaped_range(reader)?
        } else {
            Ast::Literal(read_rune(reader)?)
        };
        asts.push(ast);
    }

    match asts.len() {
        0 => Err(syntax_error(reader, detail::EMPTY_EXPR)),
        1 => Ok(asts.pop().unwrap()),
        _ => Ok(Ast::Sequence(asts)),
    }
}

/// Read a `\uXXXX` codepoint escape; the cursor sits on the `u`.
fn read_unicode_escaped_rune(reader: &mut Reader) -> Result<char, Error> {
    reader.next_rune();

    let mut hex = String::with_capacity(4);
    for _ in 0..4 {
        if reader.at_eol() {
            return Err(syntax_error(reader, detail::UNEXPECTED_EOL));
        }
        hex.push(reader.rune());
        reader.next_rune();
    }

    u32::from_str_radix(&hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| syntax_error(reader, detail::UNEXPECTED_CHAR))
}

/// Read an escaped rune; the cursor sits on the backslash.
fn read_escaped_rune(reader: &mut Reader) -> Result<char, Error> {
    reader.next_rune();
    if reader.at_eol() {
        return Err(syntax_error(reader, detail::UNEXPECTED_EOL));
    }

    let ch = reader.rune();
    match ch {
        'n' => {
            reader.next_rune();
            Ok('\n')
        }
        't' => {
            reader.next_rune();
            Ok('\t')
        }
        'r' => {
            reader.next_rune();
            Ok('\r')
        }
        'S' => {
            reader.next_rune();
            Ok(' ')
        }
        'u' => read_unicode_escaped_rune(reader),
        ch if !ch.is_alphanumeric() => {
            reader.next_rune();
            Ok(ch)
        }
        _ => Err(syntax_error(reader, detail::UNEXPECTED_CHAR)),
    }
}

/// Read one literal rune, following escapes.
fn read_rune(reader: &mut Reader) -> Result<char, Error> {
    if reader.at_eol() {
        return Err(syntax_error(reader, detail::UNEXPECTED_EOL));
    }

    let ch = reader.rune();
    if ch == '\\' {
        read_escaped_rune(reader)
    } else if NON_LITERAL.contains(ch) {
        Err(syntax_error(reader, detail::UNEXPECTED_CHAR))
    } else {
        reader.next_rune();
        Ok(ch)
    }
}

/// Read a parenthesized parallel group `(expr|expr|...)`. Every inline
/// branch carries weight 1.
fn read_parallel(reader: &mut Reader) -> Result<Ast, Error> {
    reader.next_rune(); // consume '('

    let mut branches = Vec::new();
    loop {
        let branch = parse_expr(reader, &[')', '|'])?;
        if reader.at_eol() {
            return Err(syntax_error(reader, detail::UNEXPECTED_EOL));
        }
        branches.push(branch);

        let ch = reader.rune();
        reader.next_rune();
        if ch == ')' {
            break;
        }
        // otherwise ch == '|', next branch
    }

    if branches.len() == 1 {
        return Ok(branches.pop().unwrap());
    }
    let weights = vec![1.0; branches.len()];
    Ok(Ast::Parallel { branches, weights })
}

/// Read a rule reference `<name>`.
fn read_reference(reader: &mut Reader) -> Result<Ast, Error> {
    reader.next_rune(); // consume '<'
    let name = read_name(reader, &['>'])?;
    if name.is_empty() {
        return Err(syntax_error(reader, detail::UNEXPECTED_CHAR));
    }
    reader.next_rune(); // consume '>'
    Ok(Ast::Reference(name))
}

/// Read an unsigned decimal number for a closure bound.
fn read_number(reader: &mut Reader) -> Result<u32, Error> {
    let mut digits = String::new();
    while !reader.at_eol() && reader.rune().is_ascii_digit() {
        digits.push(reader.rune());
        reader.next_rune();
    }
    digits
        .parse()
        .map_err(|_| syntax_error(reader, detail::INVALID_CLOSURE))
}

/// Read a `{m}`, `{m,}` or `{m,n}` bound suffix; the cursor sits on `{`.
fn read_bounds(reader: &mut Reader) -> Result<(u32, Option<u32>), Error> {
    reader.next_rune(); // consume '{'
    let min = read_number(reader)?;

    if reader.at_eol() {
        return Err(syntax_error(reader, detail::UNEXPECTED_EOL));
    }
    match reader.rune() {
        '}' => {
            reader.next_rune();
            Ok((min, Some(min)))
        }
        ',' => {
            reader.next_rune();
            if reader.at_eol() {
                return Err(syntax_error(reader, detail::UNEXPECTED_EOL));
            }
            if reader.rune() == '}' {
                reader.next_rune();
                return Ok((min, None));
            }
            let max = read_number(reader)?;
            if reader.at_eol() || reader.rune() != '}' {
                return Err(syntax_error(reader, detail::INVALID_CLOSURE));
            }
            reader.next_rune();
            if max < min {
                return Err(syntax_error(reader, detail::INVALID_CLOSURE));
            }
            Ok((min, Some(max)))
        }
        _ => Err(syntax_error(reader, detail::INVALID_CLOSURE)),
    }
}

/// Read a closure suffix and apply it to the preceding token.
fn read_closure(reader: &mut Reader, body: Option<Ast>) -> Result<Ast, Error> {
    let Some(body) = body else {
        return Err(syntax_error(reader, detail::INVALID_CLOSURE));
    };
    let body = Box::new(body);

    let (min, max) = match reader.rune() {
        '*' => {
            reader.next_rune();
            (0, None)
        }
        '+' => {
            reader.next_rune();
            (1, None)
        }
        '?' => {
            reader.next_rune();
            (0, Some(1))
        }
        '{' => read_bounds(reader)?,
        _ => return Err(syntax_error(reader, detail::INVALID_CLOSURE)),
    };

    Ok(Ast::Closure { min, max, body })
}

/// Read a `\s`, `\w` or `\d` class; the cursor sits on the backslash.
fn read_escaped_range(reader: &mut Reader) -> Result<Ast, Error> {
    reader.next_rune(); // consume '\'
    let ch = reader.rune();
    reader.next_rune();
    match ch {
        's' => Ok(Ast::Range {
            chars: vec![' ', '\t', '\r', '\n'],
            ranges: Vec::new(),
        }),
        'w' => Ok(Ast::Range {
            chars: vec!['_'],
            ranges: vec![
                ('A' as u32, 'Z' as u32),
                ('a' as u32, 'z' as u32),
                ('0' as u32, '9' as u32),
            ],
        }),
        'd' => Ok(Ast::Range {
            chars: Vec::new(),
            ranges: vec![('0' as u32, '9' as u32)],
        }),
        _ => Err(syntax_error(reader, detail::UNEXPECTED_CHAR)),
    }
}

/// Read a `[...]` character class; the cursor sits on `[`.
///
/// A leading `^` complements the class; a `-` right after `[` or `[^` is a
/// literal dash; `a-b` spans are inclusive and must be in order.
fn read_bracket_range(reader: &mut Reader) -> Result<Ast, Error> {
    let begin_pos = reader.position();
    reader.next_rune(); // consume '['

    let mut chars: Vec<char> = Vec::new();
    let mut ranges: Vec<(u32, u32)> = Vec::new();

    let mut complemented = false;
    if !reader.at_eol() && reader.rune() == '^' {
        complemented = true;
        reader.next_rune();
    }
    if !reader.at_eol() && reader.rune() == '-' {
        chars.push('-');
        reader.next_rune();
    }

    let mut closed = false;
    while !reader.at_eol() {
        if reader.rune() == ']' {
            reader.next_rune();
            closed = true;
            break;
        }

        let token = read_rune(reader)?;
        if reader.at_eol() {
            // the closing ']' can never follow
            return Err(syntax_error(reader, detail::UNEXPECTED_EOL));
        }
        if reader.rune() != '-' {
            chars.push(token);
            continue;
        }

        let dash_pos = reader.position();
        reader.next_rune();
        if reader.at_eol() {
            return Err(syntax_error(reader, detail::UNEXPECTED_EOL));
        }
        if reader.rune() == ']' {
            return Err(syntax_error(reader, detail::UNEXPECTED_CHAR));
        }
        let end_token = read_rune(reader)?;
        if token > end_token {
            return Err(syntax_error_at(reader, dash_pos, detail::RANGE_OUT_OF_ORDER));
        }
        ranges.push((token as u32, end_token as u32));
    }

    if !closed {
        return Err(syntax_error(reader, detail::UNEXPECTED_EOL));
    }
    if chars.is_empty() && ranges.is_empty() {
        return Err(syntax_error_at(reader, begin_pos, detail::EMPTY_EXPR));
    }

    if complemented {
        let (chars, ranges) = complement(&chars, &ranges);
        return Ok(Ast::Range { chars, ranges });
    }
    Ok(Ast::Range { chars, ranges })
}

/// Complement a character class against the full codepoint range: sort the
/// included spans, emit the gaps between them (single-codepoint gaps as
/// chars, wider gaps as ranges) and the tail up to the maximum codepoint.
fn complement(chars: &[char], ranges: &[(u32, u32)]) -> (Vec<char>, Vec<(u32, u32)>) {
    let mut included: Vec<(u32, u32)> = ranges.to_vec();
    included.extend(chars.iter().map(|&c| (c as u32, c as u32)));
    included.sort_by_key(|span| span.0);

    let mut out_chars = Vec::new();
    let mut out_ranges = Vec::new();
    let mut next: u32 = 0;
    for (begin, end) in included {
        if next + 1 < begin {
            out_ranges.push((next, begin - 1));
            next = end + 1;
        } else if next + 1 == begin {
            match char::from_u32(next) {
                Some(c) => out_chars.push(c),
                // surrogate gap; keep it as a width-1 range
                None => out_ranges.push((next, next)),
            }
            next = end + 1;
        } else if next >= begin && next <= end {
            next = end + 1;
        }
        // next > end: span already covered
    }
    if next <= char::MAX as u32 {
        out_ranges.push((next, char::MAX as u32));
    }

    (out_chars, out_ranges)
}

/// Read a name until one of `until` is reached (left unconsumed).
pub(crate) fn read_name(reader: &mut Reader, until: &[char]) -> Result<String, Error> {
    let mut name = String::new();
    loop {
        if reader.at_eol() {
            return Err(syntax_error(reader, detail::UNEXPECTED_EOL));
        }
        let ch = reader.rune();
        if until.contains(&ch) {
            break;
        }
        if INVALID_NAME.contains(ch) {
            return Err(syntax_error(reader, detail::UNEXPECTED_CHAR));
        }
        name.push(ch);
        reader.next_rune();
    }
    Ok(name)
}

/// Skip whitespace on the current line.
pub(crate) fn skip_spaces(reader: &mut Reader) {
    while !reader.at_eol() && reader.rune().is_whitespace() {
        reader.next_rune();
    }
}

/// Read and require the exact string `expected`; on mismatch the cursor is
/// restored to where it started.
pub(crate) fn read_and_check(reader: &mut Reader, expected: &str) -> Result<(), Error> {
    let begin = reader.position();
    for want in expected.chars() {
        if reader.at_eol() {
            return Err(syntax_error(reader, detail::UNEXPECTED_EOL));
        }
        if reader.rune() != want {
            reader.set_position(begin);
            return Err(syntax_error(reader, detail::UNEXPECTED_CHAR));
        }
        reader.next_rune();
    }
    Ok(())
}
