// Line reader with filename, line and column tracking.

/// A line-oriented reader over grammar source text.
///
/// `scan_line` advances to the next line, trimmed of outer whitespace, and
/// resets the rune cursor; the cursor methods then walk the current line.
/// Line numbers are 1-based, columns are 0-based rune offsets into the
/// trimmed line.
pub struct Reader {
    filename: String,
    lines: Vec<String>,
    line: usize,
    chars: Vec<char>,
    pos: usize,
}

impl Reader {
    /// Create a reader over in-memory source text.
    pub fn from_string(text: &str, filename: &str) -> Reader {
        Reader {
            filename: filename.to_string(),
            lines: text.lines().map(str::to_string).collect(),
            line: 0,
            chars: Vec::new(),
            pos: 0,
        }
    }

    /// Advance to the next line. Returns `false` at end of input.
    pub fn scan_line(&mut self) -> bool {
        if self.line >= self.lines.len() {
            self.chars.clear();
            self.pos = 0;
            return false;
        }
        self.chars = self.lines[self.line].trim().chars().collect();
        self.line += 1;
        self.pos = 0;
        true
    }

    /// True when the cursor is past the last rune of the current line.
    pub fn at_eol(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// The rune under the cursor. Callers must check [`at_eol`](Self::at_eol)
    /// first.
    pub fn rune(&self) -> char {
        self.chars[self.pos]
    }

    /// The rune after the cursor, or `None` when the cursor is on the last
    /// rune of the line.
    pub fn look_forward(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    /// Current rune offset within the line.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Reset the rune offset within the current line.
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Advance the cursor one rune.
    pub fn next_rune(&mut self) {
        self.pos += 1;
    }

    /// Advance the cursor `n` runes.
    pub fn move_forward(&mut self, n: usize) {
        self.pos += n;
    }

    /// Current line number, 1-based. 0 before the first `scan_line`.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }
}
