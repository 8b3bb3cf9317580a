use regex::Regex;
use std::sync::OnceLock;

fn boundary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // A sentence ends at terminal punctuation only when whitespace
        // follows, so decimals, abbreviations and URLs stay intact.
        // Consecutive punctuation ("?!") stays attached as one run.
        Regex::new(r"[.?!]+\s+").expect("valid sentence boundary regex")
    })
}

/// Keeps the first `cap` sentences of `text`, rejoined with single spaces.
///
/// Sentence boundaries are `.`, `?` and `!` followed by whitespace, with
/// the punctuation staying attached to the preceding sentence. A trailing
/// fragment without terminal punctuation still counts as a sentence.
/// Applied to every successful backend result before it reaches the caller.
pub fn truncate_sentences(text: &str, cap: usize) -> String {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in boundary_re().find_iter(text) {
        let punct_len = m.as_str().trim_end().len();
        let sentence = text[start..m.start() + punct_len].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = m.end();
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences.into_iter().take(cap).collect::<Vec<_>>().join(" ")
}
