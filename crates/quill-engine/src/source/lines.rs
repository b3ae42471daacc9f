use xi_rope::Rope;

/// Byte offset of the start of every line in the rope.
///
/// Uses `lines_raw` so newline bytes stay part of the line they end; a
/// trailing newline opens one more (empty) line. The first entry is always 0.
pub fn line_starts(rope: &Rope) -> Vec<usize> {
    let mut starts = vec![0];
    let mut offset = 0usize;
    for line in rope.lines_raw(..) {
        offset += line.len();
        if line.ends_with('\n') {
            starts.push(offset);
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", vec![0])]
    #[case("abc", vec![0])]
    #[case("a\nb", vec![0, 2])]
    #[case("a\n", vec![0, 2])]
    #[case("a\r\nb\n\nc", vec![0, 3, 5, 6])]
    fn starts_for(#[case] text: &str, #[case] expected: Vec<usize>) {
        assert_eq!(line_starts(&Rope::from(text)), expected);
    }
}
