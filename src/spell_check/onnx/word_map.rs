use std::collections::HashMap;

/// Default WordPiece continuation marker
pub const CONTINUATION_PREFIX: &str = "##";

/// Word index of every sub-word token, keyed by token position.
///
/// A continuation token shares the index of the nearest preceding word-initial
/// token; every word-initial token opens the next index. A continuation token
/// with no preceding word maps to index 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordIndexMap {
    indexes: Vec<usize>,
}

impl WordIndexMap {
    pub fn build<S: AsRef<str>>(tokens: &[S], continuation_prefix: &str) -> Self {
        let is_continuation =
            |token: &str| !continuation_prefix.is_empty() && token.starts_with(continuation_prefix);

        let (indexes, _) = tokens.iter().fold(
            (Vec::with_capacity(tokens.len()), None::<usize>),
            |(mut indexes, current), token| {
                let current = if is_continuation(token.as_ref()) {
                    indexes.push(current.unwrap_or(0));
                    current
                } else {
                    let next = current.map_or(0, |index| index + 1);
                    indexes.push(next);
                    Some(next)
                };
                (indexes, current)
            },
        );

        Self { indexes }
    }

    /// Word index of the token at `position`
    pub fn word_index(&self, position: usize) -> Option<usize> {
        self.indexes.get(position).copied()
    }

    /// Number of tokens mapped
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Number of distinct words covered
    pub fn word_count(&self) -> usize {
        self.indexes.iter().max().map_or(0, |&max| max + 1)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.indexes
    }

    /// Token-text keyed view, as a dictionary keyed by token value would hold it.
    ///
    /// Repeated token strings collapse to one entry and the last occurrence wins.
    pub fn by_value<S: AsRef<str>>(&self, tokens: &[S]) -> HashMap<String, usize> {
        tokens
            .iter()
            .zip(&self.indexes)
            .map(|(token, &index)| (token.as_ref().to_string(), index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_words_get_increasing_indexes() {
        let tokens = ["This", "is", "a", "test"];
        let map = WordIndexMap::build(&tokens, CONTINUATION_PREFIX);
        assert_eq!(map.as_slice(), &[0, 1, 2, 3]);
        assert_eq!(map.word_count(), 4);
    }

    #[test]
    fn test_continuations_share_previous_index() {
        let tokens = ["This", "is", "a", "sm", "##ple", "test", "."];
        let map = WordIndexMap::build(&tokens, CONTINUATION_PREFIX);
        assert_eq!(map.as_slice(), &[0, 1, 2, 3, 3, 4, 5]);
    }

    #[test]
    fn test_multiple_continuations() {
        let tokens = ["un", "##bel", "##iev", "##able", "day"];
        let map = WordIndexMap::build(&tokens, CONTINUATION_PREFIX);
        assert_eq!(map.as_slice(), &[0, 0, 0, 0, 1]);
        assert_eq!(map.word_count(), 2);
    }

    #[test]
    fn test_leading_continuation_maps_to_zero() {
        let tokens = ["##ing", "cat", "##s"];
        let map = WordIndexMap::build(&tokens, CONTINUATION_PREFIX);
        assert_eq!(map.as_slice(), &[0, 0, 0]);
    }

    #[test]
    fn test_empty_tokens() {
        let tokens: [&str; 0] = [];
        let map = WordIndexMap::build(&tokens, CONTINUATION_PREFIX);
        assert!(map.is_empty());
        assert_eq!(map.word_count(), 0);
        assert_eq!(map.word_index(0), None);
    }

    #[test]
    fn test_empty_prefix_never_marks_continuation() {
        let tokens = ["a", "##b"];
        let map = WordIndexMap::build(&tokens, "");
        assert_eq!(map.as_slice(), &[0, 1]);
    }

    #[test]
    fn test_custom_prefix() {
        let tokens = ["hel", "@@lo", "world"];
        let map = WordIndexMap::build(&tokens, "@@");
        assert_eq!(map.as_slice(), &[0, 0, 1]);
    }

    #[test]
    fn test_repeated_tokens_keep_positional_identity() {
        let tokens = ["teh", "cat", "and", "teh", "dog"];
        let map = WordIndexMap::build(&tokens, CONTINUATION_PREFIX);
        assert_eq!(map.word_index(0), Some(0));
        assert_eq!(map.word_index(3), Some(3));
    }

    #[test]
    fn test_value_view_collapses_repeated_tokens() {
        let tokens = ["teh", "cat", "and", "teh", "dog"];
        let map = WordIndexMap::build(&tokens, CONTINUATION_PREFIX);
        let by_value = map.by_value(&tokens);

        assert_eq!(by_value.len(), 4);
        // the first "teh" is no longer addressable by value
        assert_eq!(by_value["teh"], 3);
    }
}
