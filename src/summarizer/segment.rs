//! Line-based partitioning of log text into fixed-size sections.

use crate::error::{Error, Result};

/// A contiguous slice of the original log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSection<'a> {
    /// 0-based position of this section.
    pub index: usize,
    /// The section text, line terminators included.
    pub content: &'a str,
}

impl LogSection<'_> {
    /// Number of lines in the section, counting an unterminated last line.
    pub fn line_count(&self) -> usize {
        self.content.split_inclusive('\n').count()
    }
}

/// Splits `text` into sections of `section_size_lines` lines each.
///
/// Concatenating the returned sections in order reproduces `text` exactly.
/// Every section but the last holds exactly `section_size_lines` lines; the
/// last holds the remainder. Empty input yields no sections.
pub fn segment(text: &str, section_size_lines: usize) -> Result<Vec<LogSection<'_>>> {
    if section_size_lines == 0 {
        return Err(Error::InvalidSectionSize(section_size_lines));
    }

    let mut sections = Vec::new();
    let mut start = 0;
    let mut lines = 0;
    for (newline, _) in text.match_indices('\n') {
        lines += 1;
        if lines == section_size_lines {
            let end = newline + 1;
            sections.push(LogSection {
                index: sections.len(),
                content: &text[start..end],
            });
            start = end;
            lines = 0;
        }
    }
    if start < text.len() {
        sections.push(LogSection {
            index: sections.len(),
            content: &text[start..],
        });
    }
    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejoin(sections: &[LogSection<'_>]) -> String {
        sections.iter().map(|s| s.content).collect()
    }

    #[test]
    fn test_segment_even_and_remainder() {
        let sections = segment("l1\nl2\nl3\nl4\nl5\n", 2).unwrap();
        assert_eq!(
            sections,
            vec![
                LogSection { index: 0, content: "l1\nl2\n" },
                LogSection { index: 1, content: "l3\nl4\n" },
                LogSection { index: 2, content: "l5\n" },
            ]
        );
    }

    #[test]
    fn test_segment_exact_multiple_has_no_empty_tail() {
        let sections = segment("a\nb\nc\nd\n", 2).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].content, "c\nd\n");
    }

    #[test]
    fn test_segment_unterminated_last_line() {
        let text = "a\nb\nc";
        let sections = segment(text, 2).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].content, "c");
        assert_eq!(sections[1].line_count(), 1);
        assert_eq!(rejoin(&sections), text);
    }

    #[test]
    fn test_segment_empty_text() {
        assert!(segment("", 3).unwrap().is_empty());
    }

    #[test]
    fn test_segment_zero_size_rejected() {
        let err = segment("a\n", 0).unwrap_err();
        assert!(matches!(err, Error::InvalidSectionSize(0)));
    }

    #[test]
    fn test_segment_reconstructs_and_sizes() {
        let text: String = (0..23).map(|i| format!("line {i}\r\n")).collect::<String>() + "tail";
        for size in 1..=30 {
            let sections = segment(&text, size).unwrap();
            assert_eq!(rejoin(&sections), text, "size {size}");
            let (last, full) = sections.split_last().unwrap();
            for (i, s) in full.iter().enumerate() {
                assert_eq!(s.index, i);
                assert_eq!(s.line_count(), size);
            }
            assert!(!last.content.is_empty());
            assert!(last.line_count() <= size);
        }
    }

    #[test]
    fn test_segment_blank_lines_count() {
        let sections = segment("\n\n\n", 2).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].content, "\n\n");
        assert_eq!(sections[1].content, "\n");
    }
}
