//! Single-line text input used by the consultation chat and by form fields.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
    Frame,
};
use unicode_width::UnicodeWidthChar;

/// State for one input box.
#[derive(Default, Clone)]
pub struct ComposeState {
    /// Current input text.
    pub input: String,
    /// Cursor position (character offset into `input`).
    pub cursor_pos: usize,
}

impl ComposeState {
    /// Insert a character at the current cursor position.
    pub fn insert_char(&mut self, c: char) {
        let byte_pos = self.char_to_byte(self.cursor_pos);
        self.input.insert(byte_pos, c);
        self.cursor_pos += 1;
    }

    /// Delete the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if self.cursor_pos > 0 {
            let byte_pos = self.char_to_byte(self.cursor_pos);
            let prev_byte_pos = self.char_to_byte(self.cursor_pos - 1);
            self.input.drain(prev_byte_pos..byte_pos);
            self.cursor_pos -= 1;
        }
    }

    /// Delete the character at the cursor (delete key).
    pub fn delete(&mut self) {
        let char_count = self.input.chars().count();
        if self.cursor_pos < char_count {
            let byte_pos = self.char_to_byte(self.cursor_pos);
            let next_byte_pos = self.char_to_byte(self.cursor_pos + 1);
            self.input.drain(byte_pos..next_byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
        }
    }

    pub fn move_right(&mut self) {
        let char_count = self.input.chars().count();
        if self.cursor_pos < char_count {
            self.cursor_pos += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor_pos = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_pos = self.input.chars().count();
    }

    /// Clear all input text (Ctrl+U).
    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor_pos = 0;
    }

    /// Take the trimmed text and clear the box.
    /// Returns None if the input is empty or whitespace-only.
    pub fn take(&mut self) -> Option<String> {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return None;
        }
        self.clear();
        Some(text)
    }

    /// Convert a char-based cursor position to a byte offset.
    fn char_to_byte(&self, char_pos: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Height of the chat compose box: border + input + hint + border.
pub const COMPOSE_HEIGHT: u16 = 4;

/// Render the chat compose box and place the terminal cursor when focused.
pub fn render(
    area: Rect,
    frame: &mut Frame,
    state: &ComposeState,
    placeholder: &str,
    hint: &str,
    focused: bool,
) {
    let (border_style, border_type) = if focused {
        (Style::default().fg(Color::Yellow), BorderType::Double)
    } else {
        (Style::default().fg(Color::DarkGray), BorderType::Plain)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let input_area = Rect::new(inner.x, inner.y, inner.width, 1);
    let cursor = render_input(input_area, frame.buffer_mut(), state, placeholder, false);
    if focused {
        frame.set_cursor_position(cursor);
    }

    if inner.height >= 2 {
        let hint_area = Rect::new(inner.x, inner.y + 1, inner.width, 1);
        Paragraph::new(Line::from(Span::styled(
            format!(" {}", hint),
            Style::default().fg(Color::DarkGray),
        )))
        .render(hint_area, frame.buffer_mut());
    }
}

/// Render one input line (placeholder or text). Returns where the cursor goes.
///
/// With `masked` set every character is drawn as `*`.
pub fn render_input(
    area: Rect,
    buf: &mut Buffer,
    state: &ComposeState,
    placeholder: &str,
    masked: bool,
) -> (u16, u16) {
    let w = area.width as usize;

    if state.input.is_empty() {
        let truncated: String = format!(" {}", placeholder).chars().take(w).collect();
        Paragraph::new(Line::from(Span::styled(
            truncated,
            Style::default().fg(Color::DarkGray),
        )))
        .render(area, buf);
        return (area.x + 1, area.y);
    }

    let masked_text;
    let source = if masked {
        masked_text = "*".repeat(state.input.chars().count());
        &masked_text
    } else {
        &state.input
    };

    let display = compose_display_text(source, state.cursor_pos, w);
    Paragraph::new(Line::from(Span::styled(
        format!(" {}", display.visible),
        Style::default().fg(Color::White),
    )))
    .render(area, buf);

    (area.x + 1 + display.cursor_offset as u16, area.y)
}

/// What to draw and where the cursor lands.
#[derive(Debug, PartialEq)]
struct DisplayText {
    /// The visible portion of text to render.
    visible: String,
    /// Cursor offset within the visible text, in terminal columns.
    cursor_offset: usize,
}

/// Compute the visible text and cursor column for a single display line.
///
/// Newlines are shown as " | ". Scrolls horizontally to keep the cursor in
/// view. Column math uses display width, so wide characters take two cells.
fn compose_display_text(input: &str, cursor_pos: usize, width: usize) -> DisplayText {
    let mut flat: Vec<char> = Vec::with_capacity(input.len());
    let mut flat_cursor = 0;
    for (char_idx, ch) in input.chars().enumerate() {
        if char_idx == cursor_pos {
            flat_cursor = flat.len();
        }
        if ch == '\n' {
            flat.extend([' ', '|', ' ']);
        } else {
            flat.push(ch);
        }
    }
    if cursor_pos >= input.chars().count() {
        flat_cursor = flat.len();
    }

    // One column is taken by the leading space
    let avail = width.saturating_sub(1);
    if avail == 0 {
        return DisplayText {
            visible: String::new(),
            cursor_offset: 0,
        };
    }

    let widths: Vec<usize> = flat.iter().map(|c| c.width().unwrap_or(0)).collect();
    let total: usize = widths.iter().sum();
    let mut cursor_col: usize = widths[..flat_cursor].iter().sum();

    if total <= avail {
        return DisplayText {
            visible: flat.into_iter().collect(),
            cursor_offset: cursor_col,
        };
    }

    let mut start = 0;
    while cursor_col + 1 > avail && start < flat_cursor {
        cursor_col -= widths[start];
        start += 1;
    }
    let mut used = 0;
    let mut end = start;
    while end < flat.len() && used + widths[end] <= avail {
        used += widths[end];
        end += 1;
    }

    DisplayText {
        visible: flat[start..end].iter().collect(),
        cursor_offset: cursor_col,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> ComposeState {
        let mut s = ComposeState::default();
        for c in text.chars() {
            s.insert_char(c);
        }
        s
    }

    #[test]
    fn test_editing_multibyte() {
        let mut s = typed("héllo");
        s.move_left();
        s.move_left();
        s.backspace();
        assert_eq!(s.input, "hélo");
        s.move_home();
        s.delete();
        assert_eq!(s.input, "élo");
        s.move_end();
        s.insert_char('!');
        assert_eq!(s.input, "élo!");
    }

    #[test]
    fn test_take_trims_and_clears() {
        let mut s = typed("  hello  ");
        assert_eq!(s.take().as_deref(), Some("hello"));
        assert!(s.input.is_empty());
        assert_eq!(s.cursor_pos, 0);

        let mut blank = typed("   ");
        assert_eq!(blank.take(), None);
    }

    #[test]
    fn test_display_fits() {
        let d = compose_display_text("abc", 3, 10);
        assert_eq!(d.visible, "abc");
        assert_eq!(d.cursor_offset, 3);
    }

    #[test]
    fn test_display_wide_chars() {
        let d = compose_display_text("日本", 2, 10);
        assert_eq!(d.cursor_offset, 4);
        let d = compose_display_text("日本", 1, 10);
        assert_eq!(d.cursor_offset, 2);
    }

    #[test]
    fn test_display_scrolls_to_cursor() {
        let d = compose_display_text("abcdefghij", 10, 6);
        assert_eq!(d.visible, "ghij");
        assert_eq!(d.cursor_offset, 4);

        let d = compose_display_text("abcdefghij", 0, 6);
        assert_eq!(d.visible, "abcde");
        assert_eq!(d.cursor_offset, 0);
    }

    #[test]
    fn test_display_newline_expansion() {
        let d = compose_display_text("a\nb", 2, 20);
        assert_eq!(d.visible, "a | b");
        assert_eq!(d.cursor_offset, 4);
    }
}
