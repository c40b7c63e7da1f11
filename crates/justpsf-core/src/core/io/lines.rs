use std::io::{self, BufRead};

/// Returns the trimmed text of columns `start..end`, or `""` if the line is
/// shorter than `start` or the range splits a character.
pub(crate) fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    line.get(start..end).unwrap_or("").trim()
}

/// Line-by-line view of a text file with a single-line lookahead.
///
/// Line numbers are 1-based; at end of input, [`LineCursor::line_number`]
/// points one past the last line.
#[derive(Debug, Clone)]
pub(crate) struct LineCursor {
    lines: Vec<String>,
    position: usize,
}

impl LineCursor {
    pub(crate) fn read(reader: &mut impl BufRead) -> io::Result<Self> {
        let lines = reader
            .lines()
            .map(|line| line.map(|l| l.trim_end_matches('\r').to_string()))
            .collect::<io::Result<Vec<_>>>()?;
        Ok(Self { lines, position: 0 })
    }

    pub(crate) fn current(&self) -> Option<&str> {
        self.lines.get(self.position).map(String::as_str)
    }

    pub(crate) fn line_number(&self) -> usize {
        self.position + 1
    }

    pub(crate) fn advance(&mut self) {
        if self.position < self.lines.len() {
            self.position += 1;
        }
    }

    pub(crate) fn at_end(&self) -> bool {
        self.position >= self.lines.len()
    }

    /// Whether the current line exists and holds nothing but whitespace.
    pub(crate) fn at_blank(&self) -> bool {
        self.current().is_some_and(|l| l.trim().is_empty())
    }

    /// Whether the current line is blank or input is exhausted.
    pub(crate) fn at_blank_or_end(&self) -> bool {
        self.at_end() || self.at_blank()
    }

    /// The lines from the current one up to the next blank line, without consuming them.
    pub(crate) fn block(&self) -> impl Iterator<Item = &str> {
        self.lines
            .get(self.position..)
            .unwrap_or_default()
            .iter()
            .map(String::as_str)
            .take_while(|line| !line.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_and_trim_tolerates_short_lines() {
        assert_eq!(slice_and_trim("ATOM  12", 6, 12), "12");
        assert_eq!(slice_and_trim("ATOM", 6, 12), "");
        assert_eq!(slice_and_trim("  ab  cd", 0, 4), "ab");
    }

    #[test]
    fn cursor_walks_lines_and_strips_carriage_returns() {
        let mut cursor = LineCursor::read(&mut "first\r\n\nthird\n".as_bytes()).unwrap();
        assert_eq!(cursor.current(), Some("first"));
        assert_eq!(cursor.line_number(), 1);
        cursor.advance();
        assert!(cursor.at_blank());
        cursor.advance();
        assert_eq!(cursor.current(), Some("third"));
        cursor.advance();
        assert!(cursor.at_end());
        assert!(cursor.at_blank_or_end());
        assert!(!cursor.at_blank());
        assert_eq!(cursor.line_number(), 4);
        cursor.advance();
        assert_eq!(cursor.line_number(), 4);
    }

    #[test]
    fn block_stops_at_blank_line_without_consuming() {
        let mut cursor = LineCursor::read(&mut "a\nb\n\nc\n".as_bytes()).unwrap();
        assert_eq!(cursor.block().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(cursor.current(), Some("a"));
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.block().count(), 0);
        cursor.advance();
        cursor.advance();
        assert!(cursor.at_end());
        assert_eq!(cursor.block().count(), 0);
    }
}
