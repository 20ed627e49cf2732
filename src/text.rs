//! Tokenization of report text and source lines.
//!
//! The engine only sees the [`Tokenizer`] trait. [`RakeTokenizer`] is the
//! built-in implementation: lowercase alphabetic words, function-word removal,
//! a light plural lemmatizer, camelCase splitting for identifiers and
//! RAKE-style keyword phrases for reports.

use std::collections::HashSet;

pub trait Tokenizer: Send + Sync {
    /// Ordered content tokens of a natural-language text.
    fn nl_tokens(&self, text: &str) -> Vec<String>;

    /// Keyword set used for guided line selection.
    fn nl_keywords(&self, text: &str) -> HashSet<String>;

    /// Ordered tokens of one source line.
    fn pl_tokens(&self, line: &str) -> Vec<String>;
}

/// Determiners, pronouns, prepositions, conjunctions, modals and wh-words.
const FUNCTION_WORDS: &[&str] = &[
    // conjunctions
    "and", "or", "but", "nor", "yet", "so",
    // determiners
    "a", "an", "the", "this", "that", "these", "those", "each", "every", "all", "any", "some",
    "no", "another", "both", "either", "neither", "such",
    // existential
    "there",
    // prepositions and subordinators
    "of", "in", "on", "at", "by", "for", "with", "from", "about", "as", "into", "like",
    "through", "after", "over", "between", "out", "against", "during", "without", "before",
    "under", "around", "among", "if", "because", "while", "since", "than", "whether",
    "although", "though", "unless", "until", "upon", "within", "via", "per",
    // modals
    "can", "could", "may", "might", "must", "shall", "should", "will", "would",
    // pronouns
    "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them", "myself",
    "yourself", "himself", "herself", "itself", "ourselves", "themselves",
    // possessives
    "my", "your", "his", "its", "our", "their", "mine", "yours", "ours", "theirs",
    // infinitive marker
    "to",
    // interjections
    "oh", "hi", "hello", "please", "yes", "ok", "okay",
    // wh-words
    "which", "whatever", "whichever", "who", "whom", "whose", "what", "how", "when", "where",
    "why",
];

/// Extra phrase delimiters for keyword extraction, on top of [`FUNCTION_WORDS`].
const PHRASE_BREAKERS: &[&str] = &[
    "is", "are", "was", "were", "be", "been", "being", "am", "do", "does", "did", "done",
    "have", "has", "had", "not", "also", "just", "very", "then", "only", "too", "here",
    "again", "more", "most", "other", "same", "own",
];

const JAVA_RESERVED_WORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class",
    "const", "continue", "default", "do", "double", "else", "enum", "extends", "final",
    "finally", "float", "for", "goto", "if", "implements", "import", "instanceof", "int",
    "interface", "long", "native", "new", "package", "private", "protected", "public",
    "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this",
    "throw", "throws", "transient", "try", "void", "volatile", "while", "true", "false",
    "null",
];

#[derive(Debug, Clone)]
pub struct RakeTokenizer {
    function_words: HashSet<&'static str>,
    phrase_breakers: HashSet<&'static str>,
    reserved: HashSet<&'static str>,
    max_phrase_words: usize,
    min_word_chars: usize,
}

impl Default for RakeTokenizer {
    fn default() -> Self {
        Self {
            function_words: FUNCTION_WORDS.iter().copied().collect(),
            phrase_breakers: PHRASE_BREAKERS.iter().copied().collect(),
            reserved: JAVA_RESERVED_WORDS.iter().copied().collect(),
            max_phrase_words: 3,
            min_word_chars: 3,
        }
    }
}

impl RakeTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn content_words<I>(&self, words: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        words
            .into_iter()
            .filter(|w| !self.function_words.contains(w.as_str()))
            .map(|w| lemmatize(&w))
            .collect()
    }

    /// Candidate keyword phrases: maximal runs of words between delimiters,
    /// kept when short enough and made of long enough words.
    pub fn phrases(&self, text: &str) -> Vec<String> {
        let mut phrases = Vec::new();
        let mut current: Vec<String> = Vec::new();

        let mut flush = |current: &mut Vec<String>| {
            if !current.is_empty()
                && current.len() <= self.max_phrase_words
                && current.iter().all(|w| w.chars().count() >= self.min_word_chars)
            {
                phrases.push(current.join(" "));
            }
            current.clear();
        };

        for raw in text.split_whitespace() {
            let trimmed = raw.trim_matches(|c: char| !c.is_alphanumeric());
            let ends_clause = raw
                .chars()
                .last()
                .is_some_and(|c| matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | ')'));
            let starts_clause = raw.starts_with(|c: char| matches!(c, '(' | '"' | '\''));
            if starts_clause {
                flush(&mut current);
            }

            let word = trimmed.to_lowercase();
            let is_word = !word.is_empty() && word.chars().all(char::is_alphabetic);
            if !is_word
                || self.function_words.contains(word.as_str())
                || self.phrase_breakers.contains(word.as_str())
            {
                flush(&mut current);
            } else {
                current.push(word);
            }

            if ends_clause {
                flush(&mut current);
            }
        }
        flush(&mut current);
        phrases
    }
}

impl Tokenizer for RakeTokenizer {
    fn nl_tokens(&self, text: &str) -> Vec<String> {
        let words = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty() && w.chars().all(char::is_alphabetic))
            .map(str::to_lowercase);
        self.content_words(words)
    }

    fn nl_keywords(&self, text: &str) -> HashSet<String> {
        let joined = self.phrases(text).join(" ");
        self.nl_tokens(&joined).into_iter().collect()
    }

    fn pl_tokens(&self, line: &str) -> Vec<String> {
        let words = line
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| !w.is_empty() && !self.reserved.contains(*w))
            .flat_map(split_camel_case)
            .map(|w| w.to_lowercase());
        self.content_words(words)
    }
}

/// Splits an identifier where an uppercase letter follows a lowercase one.
pub fn split_camel_case(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_alphabetic() {
            if prev_lower && ch.is_uppercase() && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            current.push(ch);
            prev_lower = ch.is_lowercase();
        } else {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Reduces regular English plurals to their singular form.
pub fn lemmatize(word: &str) -> String {
    let len = word.len();
    if len > 4 && word.ends_with("ies") {
        return format!("{}y", &word[..len - 3]);
    }
    if word.ends_with("sses") {
        return word[..len - 2].to_string();
    }
    if len > 4
        && (word.ends_with("xes")
            || word.ends_with("ches")
            || word.ends_with("shes")
            || word.ends_with("zzes"))
    {
        return word[..len - 2].to_string();
    }
    if len > 3
        && word.ends_with('s')
        && !word.ends_with("ss")
        && !word.ends_with("us")
        && !word.ends_with("is")
    {
        return word[..len - 1].to_string();
    }
    word.to_string()
}
