//! Meaningful-word extraction shared by the relevance and peer heuristics.

/// Words of this many characters or fewer are ignored.
const MIN_EXCLUSIVE_LEN: usize = 4;

/// Lowercased words longer than four characters, punctuation trimmed,
/// de-duplicated in first-seen order and capped at `limit`.
pub fn meaningful_words(text: &str, limit: usize) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for raw in text.split_whitespace() {
        if words.len() >= limit {
            break;
        }
        let word = raw
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if word.chars().count() > MIN_EXCLUSIVE_LEN && !words.contains(&word) {
            words.push(word);
        }
    }
    words
}

/// True when the two texts have at least one meaningful word in common.
pub fn shares_meaningful_word(a: &str, b: &str) -> bool {
    let left = meaningful_words(a, usize::MAX);
    let right = meaningful_words(b, usize::MAX);
    left.iter().any(|w| right.contains(w))
}
