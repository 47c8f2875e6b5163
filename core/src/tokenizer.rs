use crate::indonesian::{self, INDONESIAN_STOPWORDS};
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref ENGLISH_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Maps raw text to a whitespace-separated string of index terms.
///
/// Implementations must be deterministic and free of side effects: the same
/// instance normalizes documents at build time and queries at search time.
pub trait Normalizer: Send + Sync {
    /// Stable identifier, folded into the cache fingerprint.
    fn name(&self) -> &str;
    fn normalize(&self, text: &str) -> String;
}

/// Stopword list and stemmer bundled by [`StemmingNormalizer::for_language`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Indonesian,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Self::English),
            "indonesian" | "id" => Ok(Self::Indonesian),
            other => Err(format!("unsupported language {other:?} (expected english or indonesian)")),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::English => "english",
            Self::Indonesian => "indonesian",
        })
    }
}

enum StemRule {
    Snowball(Stemmer),
    Indonesian,
}

impl StemRule {
    fn stem(&self, token: &str) -> String {
        match self {
            Self::Snowball(stemmer) => stemmer.stem(token).into_owned(),
            Self::Indonesian => indonesian::stem(token),
        }
    }
}

/// NFKC, lowercase, letters only, stopword removal, stemming.
pub struct StemmingNormalizer {
    name: String,
    word: Regex,
    stemmer: StemRule,
    stopwords: HashSet<String>,
}

impl StemmingNormalizer {
    pub fn new(name: impl Into<String>, algorithm: Algorithm, stopwords: impl IntoIterator<Item = String>) -> Self {
        Self::with_rule(name.into(), StemRule::Snowball(Stemmer::create(algorithm)), stopwords)
    }

    fn with_rule(name: String, stemmer: StemRule, stopwords: impl IntoIterator<Item = String>) -> Self {
        Self {
            name,
            // Letter runs with inner apostrophes; digits and punctuation fall out.
            word: Regex::new(r"(?u)\p{L}+(?:'\p{L}+)*").expect("valid regex"),
            stemmer,
            stopwords: stopwords.into_iter().collect(),
        }
    }

    pub fn english() -> Self {
        Self::new(
            "snowball-english",
            Algorithm::English,
            ENGLISH_STOPWORDS.iter().map(|w| w.to_string()),
        )
    }

    /// Sastrawi stopwords with the Tala affix stemmer.
    pub fn indonesian() -> Self {
        Self::with_rule(
            "tala-indonesian".to_string(),
            StemRule::Indonesian,
            INDONESIAN_STOPWORDS.iter().map(|w| w.to_string()),
        )
    }

    pub fn for_language(language: Language) -> Self {
        match language {
            Language::English => Self::english(),
            Language::Indonesian => Self::indonesian(),
        }
    }

    fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }
}

impl Normalizer for StemmingNormalizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn normalize(&self, text: &str) -> String {
        let lowered = text.nfkc().collect::<String>().to_lowercase();
        let mut out = String::with_capacity(lowered.len());
        for mat in self.word.find_iter(&lowered) {
            let token = mat.as_str();
            if self.is_stopword(token) {
                continue;
            }
            let stem = self.stemmer.stem(token);
            if stem.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&stem);
        }
        out
    }
}

/// For input that is already normalized: only collapses whitespace.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityNormalizer;

impl Normalizer for IdentityNormalizer {
    fn name(&self) -> &str {
        "identity"
    }

    fn normalize(&self, text: &str) -> String {
        tokenize(text).collect::<Vec<_>>().join(" ")
    }
}

/// Splits a normalized string into terms.
pub fn tokenize(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split_whitespace()
}
