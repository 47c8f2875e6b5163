use douggle_core::tokenizer::{tokenize, IdentityNormalizer, Normalizer, StemmingNormalizer};

#[test]
fn it_normalizes_and_stems() {
    let n = StemmingNormalizer::english();
    let out = n.normalize("Running Runners RUN! The café's menu.");
    let words: Vec<&str> = tokenize(&out).collect();
    assert!(words.contains(&"run"));
    assert!(words.contains(&"menu"));
    assert!(!words.iter().any(|w| w.chars().any(|c| c.is_uppercase() || (c.is_ascii_punctuation() && c != '\''))));
}

#[test]
fn it_filters_stopwords() {
    let n = StemmingNormalizer::english();
    let out = n.normalize("The quick brown fox and the lazy dog");
    let words: Vec<&str> = tokenize(&out).collect();
    assert!(!words.contains(&"the"));
    assert!(!words.contains(&"and"));
    assert_eq!(words.len(), 5);
}

#[test]
fn it_is_deterministic() {
    let n = StemmingNormalizer::english();
    let text = "Evaluation metrics for search engines: precision, recall, F1 (2024).";
    assert_eq!(n.normalize(text), n.normalize(text));
    assert_eq!(n.normalize(""), "");
}

#[test]
fn names_distinguish_normalizers() {
    assert_ne!(StemmingNormalizer::english().name(), IdentityNormalizer.name());
}

#[test]
fn it_normalizes_indonesian_text() {
    let n = StemmingNormalizer::for_language("indonesian".parse().unwrap());
    let out = n.normalize("Sistem Temu Kembali Informasi untuk pencarian dokumen-dokumen, 2024!");
    let words: Vec<&str> = tokenize(&out).collect();
    assert!(!words.contains(&"untuk"));
    assert!(!words.contains(&"kembali"));
    assert!(words.contains(&"cari"));
    assert_ne!(n.name(), StemmingNormalizer::english().name());
}
