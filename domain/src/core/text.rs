//! Text helpers for log previews.

/// First `max_chars` characters of `s`, with `…` appended when cut.
///
/// Counts characters rather than bytes so Japanese persona text is never
/// split mid-character.
pub fn preview(s: &str, max_chars: usize) -> String {
    let single_line = s.replace('\n', " ");
    match single_line.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &single_line[..cut]),
        None => single_line,
    }
}
