// The symbol model: literals, reserved symbols, disambiguation symbols and
// codepoint ranges, with their escaped and raw textual forms.

use std::fmt;

use crate::BuildError;

/// The seven reserved marker symbols. Together with epsilon they occupy the
/// fixed ids 0..=7 in every symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reserved {
    Alpha,
    Beta,
    Gamma,
    Delta,
    Rho,
    Sigma,
    Phi,
}

impl Reserved {
    /// All reserved symbols in id order (alpha = 1 .. phi = 7).
    pub const ALL: [Reserved; 7] = [
        Reserved::Alpha,
        Reserved::Beta,
        Reserved::Gamma,
        Reserved::Delta,
        Reserved::Rho,
        Reserved::Sigma,
        Reserved::Phi,
    ];

    fn name(self) -> &'static str {
        match self {
            Reserved::Alpha => "<alpha>",
            Reserved::Beta => "<beta>",
            Reserved::Gamma => "<gamma>",
            Reserved::Delta => "<delta>",
            Reserved::Rho => "<rho>",
            Reserved::Sigma => "<sigma>",
            Reserved::Phi => "<phi>",
        }
    }
}

/// A symbol on an FST arc.
///
/// `Literal` holds raw (unescaped) UTF-8 text; everything else is a marker
/// with no raw form. The escaped form returned by `Display` is what symbol
/// tables and grammar-facing printers show: literals get `\<`-style escapes,
/// markers print as `<eps>`, `#1`, `<range:61-7a>` and so on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    Epsilon,
    Reserved(Reserved),
    /// Disambiguation marker `#k`, `k >= 1`. Construction-time only.
    Disambig(u32),
    /// Matches any codepoint in `[begin, end]`.
    Range { begin: u32, end: u32 },
    Literal(String),
}

impl Symbol {
    /// Shorthand for the `<alpha>` captured-codepoint marker.
    pub const ALPHA: Symbol = Symbol::Reserved(Reserved::Alpha);

    /// Create a literal symbol from raw text.
    ///
    /// Panics on empty text; literal symbols are never empty.
    pub fn literal(text: impl Into<String>) -> Symbol {
        let text = text.into();
        assert!(!text.is_empty(), "empty literal symbol");
        Symbol::Literal(text)
    }

    /// Create a disambiguation symbol `#id`, `id >= 1`.
    pub fn disambig(id: u32) -> Symbol {
        assert!(id > 0, "disambig id must be positive");
        Symbol::Disambig(id)
    }

    /// Create a range symbol covering `[begin, end]` codepoints.
    pub fn range(begin: u32, end: u32) -> Symbol {
        assert!(begin <= end, "range begin must not exceed end");
        Symbol::Range { begin, end }
    }

    /// The fixed table id of epsilon and the reserved symbols, if any.
    pub fn fixed_id(&self) -> Option<u32> {
        match self {
            Symbol::Epsilon => Some(0),
            Symbol::Reserved(r) => Some(match r {
                Reserved::Alpha => 1,
                Reserved::Beta => 2,
                Reserved::Gamma => 3,
                Reserved::Delta => 4,
                Reserved::Rho => 5,
                Reserved::Sigma => 6,
                Reserved::Phi => 7,
            }),
            _ => None,
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Symbol::Range { .. })
    }

    pub fn is_disambig(&self) -> bool {
        matches!(self, Symbol::Disambig(_))
    }

    /// The raw text of a literal symbol. Marker symbols have no raw form.
    pub fn value(&self) -> Result<&str, BuildError> {
        match self {
            Symbol::Literal(text) => Ok(text),
            other => Err(BuildError::SpecialSymbol(other.to_string())),
        }
    }

    /// The escaped textual form, same as `Display`.
    pub fn escaped(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Epsilon => f.write_str("<eps>"),
            Symbol::Reserved(r) => f.write_str(r.name()),
            Symbol::Disambig(id) => write!(f, "#{id}"),
            Symbol::Range { begin, end } => write!(f, "<range:{begin:x}-{end:x}>"),
            Symbol::Literal(text) => f.write_str(&escape(text)),
        }
    }
}

/// Escape literal text for display: backslash first, then the structural
/// characters and whitespace.
pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '<' => escaped.push_str("\\<"),
            '>' => escaped.push_str("\\>"),
            '#' => escaped.push_str("\\#"),
            ' ' => escaped.push_str("\\S"),
            '\t' => escaped.push_str("\\t"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Invert [`escape`]. A trailing lone backslash or unknown escape is left
/// as-is.
pub fn unescape(escaped: &str) -> String {
    let mut raw = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            raw.push(c);
            continue;
        }
        match chars.next() {
            Some('<') => raw.push('<'),
            Some('>') => raw.push('>'),
            Some('#') => raw.push('#'),
            Some('S') => raw.push(' '),
            Some('t') => raw.push('\t'),
            Some('n') => raw.push('\n'),
            Some('r') => raw.push('\r'),
            Some('\\') => raw.push('\\'),
            Some(other) => {
                raw.push('\\');
                raw.push(other);
            }
            None => raw.push('\\'),
        }
    }
    raw
}
