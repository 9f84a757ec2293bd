//! Line-bounded chunking of document text.

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Splits only on line boundaries. A single line longer than `max_chars`
/// becomes its own (oversized) chunk rather than being cut.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        // +1 for the newline joining it to the previous line
        let joined_len = if current_len == 0 {
            line_len
        } else {
            current_len + 1 + line_len
        };

        if joined_len > max_chars && current_len > 0 {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if current_len > 0 {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.trim().is_empty() {
        chunks.push(current);
    }

    chunks.retain(|c| !c.trim().is_empty());
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(split_into_chunks("a\nb", 10), vec!["a\nb".to_string()]);
    }

    #[test]
    fn test_splits_on_line_boundaries() {
        let text = "aaaa\nbbbb\ncccc";
        let chunks = split_into_chunks(text, 9);
        assert_eq!(chunks, vec!["aaaa\nbbbb".to_string(), "cccc".to_string()]);
    }

    #[test]
    fn test_never_splits_mid_line() {
        let text = "short\nthis line is far too long\nend";
        let chunks = split_into_chunks(text, 8);
        assert_eq!(
            chunks,
            vec![
                "short".to_string(),
                "this line is far too long".to_string(),
                "end".to_string()
            ]
        );
    }

    #[test]
    fn test_chunks_cover_all_lines() {
        let text: String = (0..1000).map(|i| format!("Item {} - {}\n", i, i * 10)).collect();
        let chunks = split_into_chunks(&text, 500);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 500));
        let rejoined = chunks.join("\n");
        assert_eq!(rejoined.trim_end(), text.trim_end());
    }
}
