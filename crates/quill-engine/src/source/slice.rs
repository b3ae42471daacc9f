use std::ops::Range;

use xi_rope::Rope;

/// Extracts the text for a byte range from the rope as an owned String.
///
/// This allocates; prefer working with spans where possible.
pub fn slice_to_string(rope: &Rope, range: Range<usize>) -> String {
    rope.slice_to_cow(range).into_owned()
}

/// Extracts text for a range, truncating to at most `max` bytes with a "..."
/// suffix if needed. Truncation backs off to a char boundary.
///
/// Used for human-readable snapshot output.
pub fn preview(rope: &Rope, range: Range<usize>, max: usize) -> String {
    let mut s = slice_to_string(rope, range);
    if s.len() > max {
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push_str("...");
    }
    s
}
