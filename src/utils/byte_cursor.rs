//! Cursor over a loaded file for formats that mix whitespace separated text with raw
//! big-endian binary blocks (legacy VTK, MNI objects).

use std::str::FromStr;

pub(crate) struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteCursor { data, pos: 0 }
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.data.len() && self.data[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    /// Next whitespace delimited token, `None` at the end of data.
    pub fn token(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        let start = self.pos;
        while self.pos < self.data.len() && !self.data[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if start == self.pos {
            return None;
        }
        std::str::from_utf8(&self.data[start..self.pos]).ok()
    }

    /// Token without consuming it.
    pub fn peek_token(&mut self) -> Option<&'a str> {
        let saved = self.pos;
        let token = self.token();
        self.pos = saved;
        token
    }

    pub fn expect_token(&mut self, what: &str) -> Result<&'a str, String> {
        self.token()
            .ok_or_else(|| format!("unexpected end of data, expected {}", what))
    }

    pub fn parse<T: FromStr>(&mut self, what: &str) -> Result<T, String> {
        let token = self.expect_token(what)?;
        token
            .parse()
            .map_err(|_| format!("invalid {}: '{}'", what, token))
    }

    /// Rest of the current line without the line terminator.
    pub fn line(&mut self) -> Option<&'a str> {
        if self.pos >= self.data.len() {
            return None;
        }
        let start = self.pos;
        while self.pos < self.data.len() && self.data[self.pos] != b'\n' {
            self.pos += 1;
        }
        let end = self.pos;
        if self.pos < self.data.len() {
            self.pos += 1;
        }
        let line = std::str::from_utf8(&self.data[start..end]).ok()?;
        Some(line.trim_end_matches('\r'))
    }

    /// Moves past the next line break. Binary blocks start right after the line that
    /// announces them.
    pub fn skip_line_end(&mut self) {
        while self.pos < self.data.len() && self.data[self.pos] != b'\n' {
            self.pos += 1;
        }
        if self.pos < self.data.len() {
            self.pos += 1;
        }
    }

    pub fn bytes(&mut self, n: usize, what: &str) -> Result<&'a [u8], String> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| format!("unexpected end of data while reading {}", what))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn be_i32(&mut self, what: &str) -> Result<i32, String> {
        let b = self.bytes(4, what)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn be_f32(&mut self, what: &str) -> Result<f32, String> {
        let b = self.bytes(4, what)?;
        Ok(f32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Product of a count read from a file and a per-item size, failing on overflow.
pub(crate) fn checked_count(count: usize, per_item: usize, what: &str) -> Result<usize, String> {
    count
        .checked_mul(per_item)
        .ok_or_else(|| format!("{} count {} is too large", what, count))
}

/// Converts a count or index read from a file, rejecting negative values.
pub(crate) fn to_index(value: i64, what: &str) -> Result<usize, String> {
    usize::try_from(value).map_err(|_| format!("negative {}: {}", what, value))
}
