use std::sync::LazyLock;

use regex::Regex;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[\w']+\b").expect("word pattern is valid"));

/// Number of words in `text`. A word is a run of word characters and
/// apostrophes, so `don't` and `Hana's` count once.
pub fn count_words(text: &str) -> usize {
    WORD.find_iter(text).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_contractions_once() {
        assert_eq!(count_words("Hana didn't look back."), 4);
    }

    #[test]
    fn punctuation_and_markup_are_not_words() {
        assert_eq!(count_words("***\n\n# Chapter 01: Rain -- *again*"), 4);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn unicode_words() {
        assert_eq!(count_words("Kyōto, 京都 — café"), 3);
    }
}
