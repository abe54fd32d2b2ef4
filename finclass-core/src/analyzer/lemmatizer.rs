//! Rule-based English lemmatizer.
//!
//! Maps inflected surface forms to a dictionary base form without a lexicon:
//!
//! 1. irregular forms (`paid` → `pay`, `was` → `be`) from a fixed table
//! 2. invariant words that only look inflected (`during`, `series`, `need`)
//! 3. `-ing` / `-ed` verb endings, undoubling (`stopped` → `stop`) and
//!    restoring a silent `e` (`charged` → `charge`, `ignoring` → `ignore`)
//! 4. `-ies` / `-es` / `-s` plural and third-person endings
//!
//! The rules are part of the normalization contract: any change to them must
//! bump [`RULESET_ID`], which feeds the profile fingerprint.

use std::borrow::Cow;

use rustc_hash::{FxHashMap, FxHashSet};

/// Identifier of the current rule set.
pub const RULESET_ID: &str = "rule-en/1";

#[rustfmt::skip]
const IRREGULAR: &[(&str, &str)] = &[
    ("am", "be"), ("is", "be"), ("are", "be"), ("was", "be"), ("were", "be"),
    ("been", "be"), ("being", "be"),
    ("has", "have"), ("had", "have"), ("having", "have"),
    ("does", "do"), ("did", "do"), ("done", "do"), ("doing", "do"),
    ("goes", "go"), ("went", "go"), ("gone", "go"),
    ("said", "say"), ("paid", "pay"), ("made", "make"),
    ("took", "take"), ("taken", "take"), ("gave", "give"), ("given", "give"),
    ("got", "get"), ("gotten", "get"), ("sent", "send"), ("sold", "sell"),
    ("bought", "buy"), ("left", "leave"), ("lost", "lose"), ("kept", "keep"),
    ("felt", "feel"), ("came", "come"), ("saw", "see"), ("seen", "see"),
    ("knew", "know"), ("known", "know"), ("thought", "think"), ("found", "find"),
    ("held", "hold"), ("brought", "bring"), ("began", "begin"), ("begun", "begin"),
    ("spent", "spend"), ("lent", "lend"), ("wrote", "write"), ("written", "write"),
    ("stole", "steal"), ("stolen", "steal"), ("chose", "choose"), ("chosen", "choose"),
    ("spoke", "speak"), ("spoken", "speak"), ("understood", "understand"),
    ("meant", "mean"), ("heard", "hear"), ("ran", "run"), ("won", "win"),
    ("fell", "fall"), ("fallen", "fall"), ("became", "become"), ("built", "build"),
    ("forgot", "forget"), ("forgotten", "forget"), ("withdrew", "withdraw"),
    ("withdrawn", "withdraw"), ("drew", "draw"), ("drawn", "draw"), ("shown", "show"),
    ("told", "tell"), ("met", "meet"), ("led", "lead"), ("misled", "mislead"),
    ("owed", "owe"), ("owing", "owe"), ("died", "die"), ("dying", "die"),
    ("lied", "lie"), ("lying", "lie"), ("tied", "tie"), ("tying", "tie"),
    ("agreed", "agree"), ("disagreed", "disagree"), ("guaranteed", "guarantee"),
    ("freed", "free"), ("focuses", "focus"),
    ("children", "child"), ("men", "man"), ("women", "woman"),
    ("feet", "foot"), ("teeth", "tooth"),
];

#[rustfmt::skip]
const INVARIANT: &[&str] = &[
    "always", "perhaps", "news", "series", "species", "bias", "alias", "canvas",
    "atlas", "texas", "whereas",
    "during", "nothing", "something", "anything", "everything", "morning",
    "evening", "ceiling", "banking", "billing", "funding", "housing", "building",
    "meeting",
    "hundred", "indeed", "proceed", "exceed", "succeed", "need", "feed", "seed",
    "deed", "weed", "heed", "speed", "bleed", "breed", "greed", "sacred", "naked",
    "wicked", "kindred",
];

/// Verb stems whose base form the suffix rules would get wrong.
#[rustfmt::skip]
const STEMS: &[(&str, &str)] = &[
    ("creat", "create"), ("invit", "invite"), ("excit", "excite"),
    ("controll", "control"), ("patroll", "patrol"),
    ("focus", "focus"), ("bias", "bias"), ("factor", "factor"),
    ("sponsor", "sponsor"), ("mentor", "mentor"), ("anchor", "anchor"),
    ("censor", "censor"), ("hang", "hang"), ("bang", "bang"),
];

/// Deterministic English lemmatizer.
///
/// Input is a single lowercase ASCII word. Words it has no rule for are
/// returned unchanged, borrowed.
///
/// # Examples
///
/// ```
/// use finclass_core::analyzer::RuleLemmatizer;
///
/// let lemmatizer = RuleLemmatizer::new();
/// assert_eq!(lemmatizer.lemmatize("charged"), "charge");
/// assert_eq!(lemmatizer.lemmatize("companies"), "company");
/// assert_eq!(lemmatizer.lemmatize("bank"), "bank");
/// ```
#[derive(Debug, Clone)]
pub struct RuleLemmatizer {
    irregular: FxHashMap<&'static str, &'static str>,
    invariant: FxHashSet<&'static str>,
    stems: FxHashMap<&'static str, &'static str>,
}

impl Default for RuleLemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleLemmatizer {
    /// Builds the lookup tables.
    pub fn new() -> Self {
        Self {
            irregular: IRREGULAR.iter().copied().collect(),
            invariant: INVARIANT.iter().copied().collect(),
            stems: STEMS.iter().copied().collect(),
        }
    }

    /// Returns the lemma of `word`.
    pub fn lemmatize<'a>(&self, word: &'a str) -> Cow<'a, str> {
        if word.len() < 3 || !word.is_ascii() {
            return Cow::Borrowed(word);
        }
        if let Some(&lemma) = self.irregular.get(word) {
            return Cow::Owned(lemma.to_string());
        }
        if self.invariant.contains(word) {
            return Cow::Borrowed(word);
        }

        if word.len() > 4 {
            if let Some(stem) = word.strip_suffix("ing") {
                if has_vowel(stem) {
                    return Cow::Owned(self.verb_stem(stem));
                }
                return Cow::Borrowed(word);
            }
        }

        if word.len() > 3 {
            if let Some(stem) = word.strip_suffix("ed") {
                if word.ends_with("eed") {
                    return Cow::Borrowed(word);
                }
                if word.len() > 4 && stem.ends_with('i') {
                    return Cow::Owned(format!("{}y", &stem[..stem.len() - 1]));
                }
                if has_vowel(stem) {
                    return Cow::Owned(self.verb_stem(stem));
                }
                return Cow::Borrowed(word);
            }
        }

        if word.len() > 3 && word.ends_with('s') {
            return self.singular(word);
        }

        Cow::Borrowed(word)
    }

    fn singular<'a>(&self, word: &'a str) -> Cow<'a, str> {
        if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
            return Cow::Borrowed(word);
        }
        if word.len() > 4 {
            if let Some(stem) = word.strip_suffix("ies") {
                return Cow::Owned(format!("{stem}y"));
            }
        }
        for sibilant in ["sses", "xes", "ches", "shes", "zzes"] {
            if word.ends_with(sibilant) {
                return Cow::Borrowed(&word[..word.len() - 2]);
            }
        }
        Cow::Borrowed(&word[..word.len() - 1])
    }

    fn verb_stem(&self, stem: &str) -> String {
        if let Some(&fixed) = self.stems.get(stem) {
            return fixed.to_string();
        }

        let b = stem.as_bytes();
        let n = b.len();

        // stopped -> stop, submitted -> submit; keep call, pass, stuff, buzz
        if n >= 4 && b[n - 1] == b[n - 2] && !is_vowel(b[n - 1]) && !b"lsfz".contains(&b[n - 1])
        {
            return stem[..n - 1].to_string();
        }
        // cancelled -> cancel, labelled -> label; keep spell, dwell
        if n > 5 && stem.ends_with("ell") {
            return stem[..n - 1].to_string();
        }

        if needs_silent_e(b) {
            format!("{stem}e")
        } else {
            stem.to_string()
        }
    }
}

#[inline(always)]
fn is_vowel(b: u8) -> bool {
    matches!(b, b'a' | b'e' | b'i' | b'o' | b'u')
}

/// `u` after `q` acts as a consonant (`quot`).
#[inline(always)]
fn is_consonant_at(b: &[u8], i: usize) -> bool {
    !is_vowel(b[i]) || (b[i] == b'u' && i > 0 && b[i - 1] == b'q')
}

fn has_vowel(s: &str) -> bool {
    s.bytes().any(|b| is_vowel(b) || b == b'y')
}

/// Exactly one vowel group, ending consonant-vowel-consonant.
fn one_syllable_cvc(b: &[u8]) -> bool {
    let n = b.len();
    if n < 3 || matches!(b[n - 1], b'w' | b'x' | b'y') || is_vowel(b[n - 1]) {
        return false;
    }
    if !is_vowel(b[n - 2]) || !is_consonant_at(b, n - 3) {
        return false;
    }
    let mut groups = 0;
    let mut in_vowel = false;
    for i in 0..n {
        let vowel = !is_consonant_at(b, i) || (b[i] == b'y' && i > 0);
        if vowel && !in_vowel {
            groups += 1;
        }
        in_vowel = vowel;
    }
    groups == 1
}

/// Whether the bare stem of an `-ed`/`-ing` form drops a final `e`.
fn needs_silent_e(b: &[u8]) -> bool {
    let n = b.len();
    if n < 2 {
        return false;
    }
    let last = b[n - 1];
    let prev = b[n - 2];
    if last == prev {
        return false;
    }
    let c2 = n >= 3 && is_consonant_at(b, n - 3);
    let c3_or_start = n < 4 || is_consonant_at(b, n - 4);

    match last {
        b'v' | b'z' | b'u' | b'c' | b's' => true,
        b'g' => matches!(prev, b'r' | b'd' | b'a') || (prev == b'n' && n >= 3 && b[n - 3] == b'a'),
        b'l' => {
            (!is_vowel(prev) && !matches!(prev, b'l' | b'r' | b'w'))
                || (matches!(prev, b'u' | b'i') && c2)
        }
        b't' => match prev {
            b'a' | b'u' | b'o' => c2,
            b'e' => n >= 3 && matches!(b[n - 3], b'l' | b'p'),
            b'i' => one_syllable_cvc(b),
            _ => false,
        },
        b'd' => matches!(prev, b'i' | b'u' | b'a' | b'o') && (c2 || (n >= 3 && b[n - 3] == b'u')),
        b'r' => match prev {
            b'a' | b'u' => c2,
            b'i' => c2 || (n >= 3 && b[n - 3] == b'u'),
            b'o' => c2 && c3_or_start,
            _ => false,
        },
        b'k' => is_vowel(prev) && c2,
        b'm' => matches!(prev, b'a' | b'i' | b'o' | b'u') && c2,
        b'n' => (prev == b'i' && c2) || (prev == b'o' && one_syllable_cvc(b)),
        b'b' => prev == b'i' && c2,
        _ => one_syllable_cvc(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lemma(word: &str) -> String {
        RuleLemmatizer::new().lemmatize(word).into_owned()
    }

    fn check(cases: &[(&str, &str)]) {
        for &(word, expected) in cases {
            assert_eq!(lemma(word), expected, "lemma of {word:?}");
        }
    }

    #[test]
    fn uninflected_words_unchanged() {
        check(&[
            ("bank", "bank"),
            ("card", "card"),
            ("contact", "contact"),
            ("fraudulent", "fraudulent"),
            ("charge", "charge"),
            ("mortgage", "mortgage"),
        ]);
    }

    #[test]
    fn unchanged_words_are_borrowed() {
        let l = RuleLemmatizer::new();
        assert!(matches!(l.lemmatize("bank"), Cow::Borrowed(_)));
        assert!(matches!(l.lemmatize("fees"), Cow::Borrowed(_)));
    }

    #[test]
    fn silent_e_restored() {
        check(&[
            ("charged", "charge"),
            ("charging", "charge"),
            ("ignoring", "ignore"),
            ("received", "receive"),
            ("closed", "close"),
            ("used", "use"),
            ("disputed", "dispute"),
            ("filed", "file"),
            ("stated", "state"),
            ("purchased", "purchase"),
            ("making", "make"),
            ("issued", "issue"),
            ("provided", "provide"),
            ("required", "require"),
            ("secured", "secure"),
            ("declared", "declare"),
            ("mortgaged", "mortgage"),
            ("changed", "change"),
            ("handled", "handle"),
            ("scheduled", "schedule"),
            ("deleted", "delete"),
            ("quoted", "quote"),
            ("assumed", "assume"),
            ("determined", "determine"),
            ("described", "describe"),
            ("hoping", "hope"),
        ]);
    }

    #[test]
    fn no_silent_e_where_base_has_none() {
        check(&[
            ("contacted", "contact"),
            ("reported", "report"),
            ("failed", "fail"),
            ("called", "call"),
            ("billed", "bill"),
            ("opened", "open"),
            ("ordered", "order"),
            ("requested", "request"),
            ("explained", "explain"),
            ("informed", "inform"),
            ("emailed", "email"),
            ("played", "play"),
            ("paying", "pay"),
            ("visited", "visit"),
            ("harassed", "harass"),
            ("garnished", "garnish"),
            ("avoided", "avoid"),
            ("asked", "ask"),
            ("looking", "look"),
            ("claimed", "claim"),
            ("needed", "need"),
        ]);
    }

    #[test]
    fn doubled_consonants_undone() {
        check(&[
            ("stopped", "stop"),
            ("submitted", "submit"),
            ("getting", "get"),
            ("transferred", "transfer"),
            ("occurred", "occur"),
            ("cancelled", "cancel"),
            ("controlled", "control"),
            ("added", "add"),
            ("telling", "tell"),
        ]);
    }

    #[test]
    fn ied_and_ies_become_y() {
        check(&[
            ("denied", "deny"),
            ("applied", "apply"),
            ("verified", "verify"),
            ("companies", "company"),
            ("agencies", "agency"),
            ("inquiries", "inquiry"),
        ]);
    }

    #[test]
    fn plurals_and_third_person() {
        check(&[
            ("fees", "fee"),
            ("cards", "card"),
            ("payments", "payment"),
            ("charges", "charge"),
            ("collectors", "collector"),
            ("taxes", "tax"),
            ("branches", "branch"),
            ("addresses", "address"),
            ("days", "day"),
            ("lies", "lie"),
        ]);
    }

    #[test]
    fn words_that_only_look_inflected() {
        check(&[
            ("process", "process"),
            ("status", "status"),
            ("basis", "basis"),
            ("previous", "previous"),
            ("series", "series"),
            ("always", "always"),
            ("during", "during"),
            ("thing", "thing"),
            ("bring", "bring"),
            ("hundred", "hundred"),
            ("proceed", "proceed"),
            ("shed", "shed"),
            ("was", "be"),
            ("its", "its"),
        ]);
    }

    #[test]
    fn irregular_forms() {
        check(&[
            ("paid", "pay"),
            ("sent", "send"),
            ("told", "tell"),
            ("owed", "owe"),
            ("owing", "owe"),
            ("agreed", "agree"),
            ("stolen", "steal"),
            ("children", "child"),
            ("created", "create"),
        ]);
    }

    #[test]
    fn short_and_non_ascii_words_untouched() {
        check(&[("us", "us"), ("ed", "ed"), ("as", "as")]);
        assert_eq!(lemma("cafés"), "cafés");
    }

    #[test]
    fn lemmatization_is_deterministic() {
        let a = RuleLemmatizer::new();
        let b = RuleLemmatizer::new();
        for word in ["charged", "companies", "ignoring", "paid", "fees"] {
            assert_eq!(a.lemmatize(word), b.lemmatize(word));
        }
    }
}
