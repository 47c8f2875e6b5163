//! Indonesian stopwords and affix-stripping stemmer.
//!
//! The stemmer follows the Tala rules as published in the Snowball
//! Indonesian algorithm: particles (`-kah`, `-lah`, `-pun`), possessive
//! pronouns (`-ku`, `-mu`, `-nya`), first and second order prefixes and
//! derivational suffixes (`-kan`, `-an`, `-i`). It is purely rule based, so
//! it needs no root-word dictionary.

use lazy_static::lazy_static;
use std::collections::HashSet;

lazy_static! {
    pub(crate) static ref INDONESIAN_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "yang","untuk","pada","ke","para","namun","menurut","antara","dia","dua","ia","seperti","jika",
            "sehingga","kembali","dan","tidak","ini","karena","kepada","oleh","saat","harus","sementara",
            "setelah","belum","kami","sekitar","bagi","serta","di","dari","telah","sebagai","masih","hal",
            "ketika","adalah","itu","dalam","bisa","bahwa","atau","hanya","kita","dengan","akan","juga",
            "ada","mereka","sudah","saya","terhadap","secara","agar","lain","anda","begitu","mengapa",
            "kenapa","yaitu","yakni","daripada","itulah","lagi","maka","tentang","demi","dimana","kemana",
            "pula","sambil","sebelum","sesudah","supaya","guna","kah","pun","sampai","sedangkan","selagi",
            "tetapi","apakah","kecuali","sebab","selain","seolah","seraya","seterusnya","tanpa","agak",
            "boleh","dapat","dsb","dst","dll","dahulu","dulunya","anu","demikian","tapi","ingin","nggak",
            "mari","nanti","melainkan","oh","ok","seharusnya","sebetulnya","setiap","setidaknya",
            "sesuatu","pasti","saja","toh","ya","walau","tolong","tentu","amat","apalagi","bagaimanapun"
        ];
        words.iter().copied().collect()
    };
}

/// Which prefix family was stripped; it restricts the suffixes that may follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prefix {
    None,
    /// di-, ter-, me- and its nasal variants
    Me,
    /// pe-, per-, ber-
    Ber,
    /// ke-, pe- nasal variants
    Pe,
    /// belajar, be-C-er
    Be,
}

struct Word {
    chars: Vec<char>,
    measure: usize,
    prefix: Prefix,
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

impl Word {
    fn new(token: &str) -> Self {
        let chars: Vec<char> = token.chars().collect();
        let measure = chars.iter().filter(|c| is_vowel(**c)).count();
        Self { chars, measure, prefix: Prefix::None }
    }

    fn ends_with(&self, suffix: &str) -> bool {
        let s: Vec<char> = suffix.chars().collect();
        self.chars.len() >= s.len() && self.chars[self.chars.len() - s.len()..] == s[..]
    }

    fn starts_with(&self, prefix: &str) -> bool {
        let p: Vec<char> = prefix.chars().collect();
        self.chars.len() >= p.len() && self.chars[..p.len()] == p[..]
    }

    fn char_at(&self, i: usize) -> Option<char> {
        self.chars.get(i).copied()
    }

    fn drop_suffix(&mut self, len: usize) {
        self.chars.truncate(self.chars.len() - len);
        self.measure -= 1;
    }

    /// Replaces the first `len` chars with `with`.
    fn replace_prefix(&mut self, len: usize, with: &str) {
        self.chars.splice(..len, with.chars());
        self.measure -= 1;
    }

    fn remove_particle(&mut self) {
        if let Some(s) = ["kah", "lah", "pun"].iter().find(|s| self.ends_with(s)) {
            self.drop_suffix(s.len());
        }
    }

    fn remove_possessive_pronoun(&mut self) {
        if let Some(s) = ["nya", "ku", "mu"].iter().find(|s| self.ends_with(s)) {
            self.drop_suffix(s.chars().count());
        }
    }

    fn remove_suffix(&mut self) -> bool {
        if self.ends_with("kan") && !matches!(self.prefix, Prefix::Pe | Prefix::Ber) {
            self.drop_suffix(3);
        } else if self.ends_with("an") && self.prefix != Prefix::Me {
            self.drop_suffix(2);
        } else if self.ends_with("i")
            && matches!(self.prefix, Prefix::None | Prefix::Me | Prefix::Ber)
            && self.chars.len() >= 2
            && self.chars[self.chars.len() - 2] != 's'
        {
            self.drop_suffix(1);
        } else {
            return false;
        }
        true
    }

    fn remove_first_order_prefix(&mut self) -> bool {
        let followed_by_vowel = |w: &Word, n: usize| w.char_at(n).is_some_and(is_vowel);
        let (len, with, prefix) = if self.starts_with("meny") && followed_by_vowel(self, 4) {
            (4, "s", Prefix::Me)
        } else if self.starts_with("peny") && followed_by_vowel(self, 4) {
            (4, "s", Prefix::Pe)
        } else if self.starts_with("meng") {
            (4, "", Prefix::Me)
        } else if self.starts_with("peng") {
            (4, "", Prefix::Pe)
        } else if self.starts_with("mem") {
            (3, if followed_by_vowel(self, 3) { "p" } else { "" }, Prefix::Me)
        } else if self.starts_with("pem") {
            (3, if followed_by_vowel(self, 3) { "p" } else { "" }, Prefix::Pe)
        } else if self.starts_with("men") || self.starts_with("ter") {
            (3, "", Prefix::Me)
        } else if self.starts_with("pen") {
            (3, "", Prefix::Pe)
        } else if self.starts_with("me") || self.starts_with("di") {
            (2, "", Prefix::Me)
        } else if self.starts_with("ke") {
            (2, "", Prefix::Pe)
        } else {
            return false;
        };
        self.replace_prefix(len, with);
        self.prefix = prefix;
        true
    }

    fn remove_second_order_prefix(&mut self) -> bool {
        let (len, with, prefix) = if self.starts_with("pelajar") {
            (7, "ajar", Prefix::Ber)
        } else if self.starts_with("belajar") {
            (7, "ajar", Prefix::Be)
        } else if self.starts_with("per") || self.starts_with("ber") {
            (3, "", Prefix::Ber)
        } else if self.starts_with("pe") {
            (2, "", Prefix::Ber)
        } else if self.starts_with("be")
            && self.char_at(2).is_some_and(|c| !is_vowel(c))
            && self.char_at(3) == Some('e')
            && self.char_at(4) == Some('r')
        {
            (2, "", Prefix::Be)
        } else {
            return false;
        };
        self.replace_prefix(len, with);
        self.prefix = prefix;
        true
    }
}

/// Stems one lowercase token. Words with two or fewer vowels are kept as is.
pub fn stem(token: &str) -> String {
    let mut word = Word::new(token);
    if word.measure <= 2 {
        return token.to_string();
    }

    word.remove_particle();
    if word.measure > 2 {
        word.remove_possessive_pronoun();
    }
    if word.measure <= 2 {
        return word.chars.into_iter().collect();
    }

    if word.remove_first_order_prefix() {
        if word.measure > 2 {
            word.remove_suffix();
        }
        if word.measure > 2 {
            word.remove_second_order_prefix();
        }
    } else {
        word.remove_second_order_prefix();
        if word.measure > 2 {
            word.remove_suffix();
        }
    }
    word.chars.into_iter().collect()
}
