/// Split `text` into segments of at most `max_words` words each.
///
/// Words are separated by runs of whitespace. Each segment is the words joined
/// by a single space, in their original order. Empty or whitespace-only input
/// gives no segments.
///
/// A `max_words` of zero is treated as one.
pub fn chunk(text: &str, max_words: usize) -> Vec<String> {
    let max_words = max_words.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(max_words)
        .map(|segment| segment.join(" "))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::chunk;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn empty_input_gives_no_chunks() {
        assert!(chunk("", 25).is_empty());
        assert!(chunk(" \t\n  ", 25).is_empty());
    }

    #[test]
    fn thirty_words_make_two_chunks() {
        let chunks = chunk(&words(30), 25);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].split(' ').count(), 25);
        assert_eq!(chunks[1].split(' ').count(), 5);
        assert_eq!(chunks[1], "w25 w26 w27 w28 w29");
    }

    #[test]
    fn whitespace_runs_are_normalized() {
        let chunks = chunk("  Hello,\n\n  world!\tThis   is\r\nfine ", 2);
        assert_eq!(chunks, ["Hello, world!", "This is", "fine"]);
    }

    #[test]
    fn counts_and_order_hold_for_many_sizes() {
        for word_count in [1, 2, 24, 25, 26, 49, 50, 51, 137] {
            let text = words(word_count);
            for max_words in [1, 3, 7, 25, 200] {
                let chunks = chunk(&text, max_words);
                assert_eq!(chunks.len(), word_count.div_ceil(max_words));
                assert!(
                    chunks.iter().all(|c| c.split(' ').count() <= max_words),
                    "oversized chunk for {word_count} words / {max_words}"
                );
                assert_eq!(chunks.join(" "), text);
            }
        }
    }

    #[test]
    fn zero_budget_is_one_word_per_chunk() {
        assert_eq!(chunk("a b c", 0), ["a", "b", "c"]);
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = words(60);
        assert_eq!(chunk(&text, 25), chunk(&text, 25));
    }
}
