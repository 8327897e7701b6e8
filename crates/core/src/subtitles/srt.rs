//! SubRip helpers: decoding, cue splitting and timestamp extraction.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static TIMESTAMP_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,2}:\d{2}:\d{2}[,.]\d{1,3}\s*-->\s*\d{1,2}:\d{2}:\d{2}[,.]\d{1,3}")
        .expect("static regex is valid")
});

/// Decode subtitle bytes, dropping a UTF-8 BOM and normalising newlines.
pub fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).replace("\r\n", "\n").replace('\r', "\n")
}

/// Split SRT text into cues, one per blank-line separated paragraph.
pub fn split_cues(text: &str) -> Vec<String> {
    let mut cues = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                cues.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        cues.push(current.join("\n"));
    }
    cues
}

/// Group cues into blocks of at most `per_block` cues each.
pub fn blocks(text: &str, per_block: usize) -> Vec<String> {
    let per_block = per_block.max(1);
    split_cues(text)
        .chunks(per_block)
        .map(|chunk| chunk.join("\n\n"))
        .collect()
}

/// Timestamp lines (`00:00:01,000 --> 00:00:02,500`) of a block, trimmed.
pub fn timestamp_lines(block: &str) -> Vec<&str> {
    block
        .lines()
        .map(str::trim)
        .filter(|line| TIMESTAMP_LINE.is_match(line))
        .collect()
}

/// Whether the text contains at least one SRT cue.
pub fn looks_like_srt(text: &str) -> bool {
    text.lines().any(|line| TIMESTAMP_LINE.is_match(line.trim()))
}

/// Join translated blocks back into one SRT document.
pub fn join_blocks<S: AsRef<str>>(blocks: &[S]) -> String {
    let mut out = blocks
        .iter()
        .map(|b| b.as_ref().trim())
        .filter(|b| !b.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n00:00:01,000 --> 00:00:02,000\nHello\n\n2\n00:00:03,000 --> 00:00:04,500\nWorld\nsecond line\n\n\n3\n00:00:05,000 --> 00:00:06,000\nBye\n";

    #[test]
    fn test_decode_strips_bom_and_crlf() {
        let raw = b"\xEF\xBB\xBF1\r\n00:00:01,000 --> 00:00:02,000\r\nHi\r\n";
        assert_eq!(decode(raw), "1\n00:00:01,000 --> 00:00:02,000\nHi\n");
    }

    #[test]
    fn test_split_cues() {
        let cues = split_cues(SAMPLE);
        assert_eq!(cues.len(), 3);
        assert_eq!(cues[1], "2\n00:00:03,000 --> 00:00:04,500\nWorld\nsecond line");
    }

    #[test]
    fn test_blocks() {
        let b = blocks(SAMPLE, 2);
        assert_eq!(b.len(), 2);
        assert!(b[0].starts_with("1\n"));
        assert!(b[0].contains("\n\n2\n"));
        assert!(b[1].starts_with("3\n"));

        assert_eq!(blocks(SAMPLE, 0).len(), 3);
        assert!(blocks("", 10).is_empty());
    }

    #[test]
    fn test_timestamp_lines() {
        assert_eq!(
            timestamp_lines(SAMPLE),
            vec![
                "00:00:01,000 --> 00:00:02,000",
                "00:00:03,000 --> 00:00:04,500",
                "00:00:05,000 --> 00:00:06,000"
            ]
        );
        assert!(timestamp_lines("no cues here").is_empty());
    }

    #[test]
    fn test_looks_like_srt() {
        assert!(looks_like_srt(SAMPLE));
        assert!(!looks_like_srt("<html>quota exceeded</html>"));
    }

    #[test]
    fn test_join_blocks() {
        let joined = join_blocks(&["1\na\n", "", "2\nb"]);
        assert_eq!(joined, "1\na\n\n2\nb\n");
    }
}
