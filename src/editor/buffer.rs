use ropey::Rope;

/// Cursor position in an [`EditorBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based column, in chars from the start of the line.
    pub col: usize,
    /// Column to return to when moving vertically through short lines.
    sticky_col: usize,
}

impl Cursor {
    pub const fn at(line: usize, col: usize) -> Self {
        Self {
            line,
            col,
            sticky_col: col,
        }
    }

    const fn place(&mut self, line: usize, col: usize) {
        self.line = line;
        self.col = col;
        self.sticky_col = col;
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::at(0, 0)
    }
}

/// Direction for cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Rope-backed text with a cursor.
///
/// Every text mutation bumps [`revision`](Self::revision); cursor movement
/// does not. Observers compare revisions to tell edits from navigation.
pub struct EditorBuffer {
    rope: Rope,
    cursor: Cursor,
    revision: u64,
}

impl EditorBuffer {
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            cursor: Cursor::default(),
            revision: 0,
        }
    }

    pub fn empty() -> Self {
        Self::from_text("")
    }

    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub const fn revision(&self) -> u64 {
        self.revision
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Content of a line without its line break.
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let mut line = self.rope.line(line_idx).to_string();
        while line.ends_with(['\n', '\r']) {
            line.pop();
        }
        Some(line)
    }

    /// Length of a line in chars, without its line break.
    pub fn line_len(&self, line_idx: usize) -> usize {
        if line_idx >= self.rope.len_lines() {
            return 0;
        }
        let line = self.rope.line(line_idx);
        let mut len = line.len_chars();
        while len > 0 && matches!(line.char(len - 1), '\n' | '\r') {
            len -= 1;
        }
        len
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Replace the whole text, keeping the cursor as close as possible.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        let line = self.cursor.line.min(self.line_count().saturating_sub(1));
        let col = self.cursor.col.min(self.line_len(line));
        self.cursor.place(line, col);
        self.touch();
    }

    pub fn insert_char(&mut self, ch: char) {
        let idx = self.cursor_char_idx();
        self.rope.insert_char(idx, ch);
        if ch == '\n' {
            self.cursor.place(self.cursor.line + 1, 0);
        } else {
            self.cursor.place(self.cursor.line, self.cursor.col + 1);
        }
        self.touch();
    }

    /// Insert a string at the cursor and move past it.
    pub fn insert_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        let idx = self.cursor_char_idx();
        self.rope.insert(idx, s);
        let end_idx = idx + s.chars().count();
        let end_line = self.rope.char_to_line(end_idx);
        let col = end_idx - self.rope.line_to_char(end_line);
        self.cursor.place(end_line, col);
        self.touch();
    }

    /// Break the line at the cursor.
    pub fn split_line(&mut self) {
        self.insert_char('\n');
    }

    /// Delete the char before the cursor, joining lines at column zero.
    ///
    /// Returns `true` if anything was deleted.
    pub fn delete_back(&mut self) -> bool {
        let idx = self.cursor_char_idx();
        if idx == 0 {
            return false;
        }
        if self.cursor.col == 0 {
            let prev = self.cursor.line - 1;
            let prev_len = self.line_len(prev);
            // Remove the whole line break, CRLF included.
            let break_start = self.rope.line_to_char(prev) + prev_len;
            self.rope.remove(break_start..idx);
            self.cursor.place(prev, prev_len);
        } else {
            self.rope.remove(idx - 1..idx);
            self.cursor.place(self.cursor.line, self.cursor.col - 1);
        }
        self.touch();
        true
    }

    /// Delete the char under the cursor, joining lines at end of line.
    ///
    /// Returns `true` if anything was deleted.
    pub fn delete_forward(&mut self) -> bool {
        let idx = self.cursor_char_idx();
        if idx >= self.rope.len_chars() {
            return false;
        }
        if self.cursor.col >= self.line_len(self.cursor.line) {
            let next_start = if self.cursor.line + 1 < self.line_count() {
                self.rope.line_to_char(self.cursor.line + 1)
            } else {
                self.rope.len_chars()
            };
            self.rope.remove(idx..next_start);
        } else {
            self.rope.remove(idx..=idx);
        }
        self.touch();
        true
    }

    pub fn move_cursor(&mut self, direction: Direction) {
        let Cursor { line, col, .. } = self.cursor;
        match direction {
            Direction::Left if col > 0 => self.cursor.place(line, col - 1),
            Direction::Left if line > 0 => self.cursor.place(line - 1, self.line_len(line - 1)),
            Direction::Right if col < self.line_len(line) => self.cursor.place(line, col + 1),
            Direction::Right if line + 1 < self.line_count() => self.cursor.place(line + 1, 0),
            Direction::Up if line > 0 => self.move_vertical(line - 1),
            Direction::Down if line + 1 < self.line_count() => self.move_vertical(line + 1),
            _ => {}
        }
    }

    pub const fn move_home(&mut self) {
        self.cursor.place(self.cursor.line, 0);
    }

    pub fn move_end(&mut self) {
        self.cursor
            .place(self.cursor.line, self.line_len(self.cursor.line));
    }

    /// Jump to the start of the previous word (Ctrl+Left).
    pub fn move_word_left(&mut self) {
        let Cursor { line, col, .. } = self.cursor;
        if col == 0 {
            self.move_cursor(Direction::Left);
            return;
        }
        let chars: Vec<char> = self.line_at(line).unwrap_or_default().chars().collect();
        let mut pos = col.min(chars.len());
        while pos > 0 && !is_word_char(chars[pos - 1]) {
            pos -= 1;
        }
        while pos > 0 && is_word_char(chars[pos - 1]) {
            pos -= 1;
        }
        self.cursor.place(line, pos);
    }

    /// Jump past the current word and the gap after it (Ctrl+Right).
    pub fn move_word_right(&mut self) {
        let Cursor { line, col, .. } = self.cursor;
        let chars: Vec<char> = self.line_at(line).unwrap_or_default().chars().collect();
        if col >= chars.len() {
            self.move_cursor(Direction::Right);
            return;
        }
        let mut pos = col;
        while pos < chars.len() && is_word_char(chars[pos]) {
            pos += 1;
        }
        while pos < chars.len() && !is_word_char(chars[pos]) {
            pos += 1;
        }
        self.cursor.place(line, pos);
    }

    /// Move to `(line, col)`, clamped to the text.
    pub fn move_to(&mut self, line: usize, col: usize) {
        let line = line.min(self.line_count().saturating_sub(1));
        self.cursor.place(line, col.min(self.line_len(line)));
    }

    pub const fn move_to_start(&mut self) {
        self.cursor.place(0, 0);
    }

    pub fn move_to_end(&mut self) {
        let last = self.line_count().saturating_sub(1);
        self.cursor.place(last, self.line_len(last));
    }

    fn move_vertical(&mut self, line: usize) {
        let sticky = self.cursor.sticky_col;
        self.cursor.line = line;
        self.cursor.col = sticky.min(self.line_len(line));
    }

    fn cursor_char_idx(&self) -> usize {
        let line = self.cursor.line.min(self.line_count().saturating_sub(1));
        self.rope.line_to_char(line) + self.cursor.col.min(self.line_len(line))
    }

    const fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field(
                "rope",
                &format_args!("Rope({} lines)", self.rope.len_lines()),
            )
            .field("cursor", &self.cursor)
            .field("revision", &self.revision)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer_has_one_line() {
        let buf = EditorBuffer::empty();
        assert_eq!(buf.line_count(), 1);
        assert_eq!(buf.line_at(0), Some(String::new()));
    }

    #[test]
    fn test_line_at_strips_crlf() {
        let buf = EditorBuffer::from_text("project(a)\r\nadd_subdirectory(b)");
        assert_eq!(buf.line_at(0), Some("project(a)".to_string()));
        assert_eq!(buf.line_len(0), 10);
        assert_eq!(buf.line_at(2), None);
    }

    #[test]
    fn test_insert_char_advances_cursor_and_revision() {
        let mut buf = EditorBuffer::from_text("set()");
        buf.move_to(0, 4);
        buf.insert_char('X');
        assert_eq!(buf.text(), "set(X)");
        assert_eq!(buf.cursor(), Cursor::at(0, 5));
        assert_eq!(buf.revision(), 1);
    }

    #[test]
    fn test_cursor_movement_does_not_bump_revision() {
        let mut buf = EditorBuffer::from_text("a\nb");
        buf.move_cursor(Direction::Down);
        buf.move_end();
        buf.move_to_start();
        assert_eq!(buf.revision(), 0);
    }

    #[test]
    fn test_multibyte_chars_count_as_one_column() {
        let mut buf = EditorBuffer::from_text("é");
        buf.move_end();
        assert_eq!(buf.cursor().col, 1);
        buf.insert_char('ß');
        assert_eq!(buf.text(), "éß");
        assert!(buf.delete_back());
        assert_eq!(buf.text(), "é");
    }

    #[test]
    fn test_split_and_join_lines() {
        let mut buf = EditorBuffer::from_text("if(A)endif()");
        buf.move_to(0, 5);
        buf.split_line();
        assert_eq!(buf.text(), "if(A)\nendif()");
        assert_eq!(buf.cursor(), Cursor::at(1, 0));

        assert!(buf.delete_back());
        assert_eq!(buf.text(), "if(A)endif()");
        assert_eq!(buf.cursor(), Cursor::at(0, 5));
    }

    #[test]
    fn test_delete_back_at_origin_is_noop() {
        let mut buf = EditorBuffer::from_text("x");
        assert!(!buf.delete_back());
        assert_eq!(buf.revision(), 0);
    }

    #[test]
    fn test_delete_forward_joins_crlf_lines() {
        let mut buf = EditorBuffer::from_text("a\r\nb");
        buf.move_end();
        assert!(buf.delete_forward());
        assert_eq!(buf.text(), "ab");
        buf.move_to_end();
        assert!(!buf.delete_forward());
    }

    #[test]
    fn test_insert_str_places_cursor_after_text() {
        let mut buf = EditorBuffer::from_text("()");
        buf.move_to(0, 1);
        buf.insert_str("A\nB C");
        assert_eq!(buf.text(), "(A\nB C)");
        assert_eq!(buf.cursor(), Cursor::at(1, 3));
    }

    #[test]
    fn test_vertical_movement_remembers_column() {
        let mut buf = EditorBuffer::from_text("long line\nab\nanother long");
        buf.move_to(0, 7);
        buf.move_cursor(Direction::Down);
        assert_eq!(buf.cursor().col, 2);
        buf.move_cursor(Direction::Down);
        assert_eq!(buf.cursor().col, 7);
    }

    #[test]
    fn test_word_movement() {
        let mut buf = EditorBuffer::from_text("add_library(foo foo.cpp)");
        buf.move_word_right();
        assert_eq!(buf.cursor().col, 12);
        buf.move_word_right();
        assert_eq!(buf.cursor().col, 16);
        buf.move_word_left();
        assert_eq!(buf.cursor().col, 12);
        buf.move_word_left();
        assert_eq!(buf.cursor().col, 0);
    }

    #[test]
    fn test_set_text_clamps_cursor() {
        let mut buf = EditorBuffer::from_text("one\ntwo\nthree");
        buf.move_to_end();
        buf.set_text("x");
        assert_eq!(buf.cursor(), Cursor::at(0, 1));
        assert_eq!(buf.revision(), 1);
    }
}
