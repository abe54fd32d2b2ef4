//! Raw complaint text to `NormalizedText`.
//!
//! Six ordered stages, each a pure deletion:
//!
//! 1. case folding (optionally folding Latin diacritics to ASCII)
//! 2. anonymization-mask removal (`xxxx`, `xx/xx/xxxx`, `{$xxxx.xx}`)
//! 3. URL and HTML-tag removal (`http...` and `www...` up to the next space)
//! 4. character-class filtering down to `a`-`z` and whitespace
//! 5. placeholder removal (`productpurchased` and friends)
//! 6. whitespace collapse and trim
//!
//! Masks go before character filtering so that `xx/xx/xxxx` disappears as one
//! run instead of leaving `xxxxxxxx`. Filtering and placeholder removal can
//! splice new masks, URL prefixes or placeholders together (`x<b>x`,
//! `h.ttp`), so stages 5, 2, 3 and 6 repeat on the letters-only text until
//! nothing changes. That keeps the normalizer idempotent.
//!
//! The fixed patterns are versioned by [`RULESET_ID`], which feeds the
//! profile fingerprint.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Identifier of the fixed patterns below. Bump it when any of them changes.
pub const RULESET_ID: &str = "norm-en/1";

/// Placeholder strings the complaint portal substitutes for product fields.
pub const DEFAULT_PLACEHOLDERS: &[&str] = &[
    "have issue productpurchased assist",
    "productpurchased",
    "productpurchase",
];

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http\S+|www\S+").expect("URL_PATTERN: invalid pattern"));

static HTML_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("HTML_PATTERN: invalid pattern"));

/// Configuration options for text normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Character the source dataset uses to redact personal data.
    pub mask_char: char,
    /// Shortest run of mask characters treated as a redaction. Values below
    /// 2 are raised to 2 so ordinary single letters survive.
    pub min_mask_run: u8,
    /// Remove every run of non-space characters starting with `http` or
    /// `www`, including words such as `httpd`.
    pub strip_urls: bool,
    /// Remove `<...>` tag-like substrings.
    pub strip_html: bool,
    /// Map accented Latin letters to ASCII ("café" becomes "cafe") instead
    /// of dropping them in the character filter.
    pub fold_diacritics: bool,
    /// Substrings deleted from the letters-only text, in order. Entries are
    /// lowercased; empty entries are ignored.
    pub placeholders: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            mask_char: 'x',
            min_mask_run: 2,
            strip_urls: true,
            strip_html: true,
            fold_diacritics: false,
            placeholders: DEFAULT_PLACEHOLDERS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Deterministic, stateless complaint-text normalizer.
///
/// Output contains only ASCII lowercase letters and single spaces, with no
/// leading or trailing space. Never fails: empty, whitespace-only or binary
/// garbage input yields the empty string.
///
/// # Examples
///
/// ```
/// use finclass_core::analyzer::TextNormalizer;
///
/// let normalizer = TextNormalizer::default();
/// assert_eq!(
///     normalizer.normalize("My account XXXX-XXXX was charged $45.00!"),
///     "my account was charged"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    config: NormalizerConfig,
    mask_pattern: Regex,
    placeholders: Vec<String>,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

impl TextNormalizer {
    /// Creates a new normalizer with the specified configuration.
    pub fn new(config: NormalizerConfig) -> Self {
        let extra = config.min_mask_run.max(2) - 1;
        let mask = regex::escape(&config.mask_char.to_string());
        // A mask run may carry redaction punctuation between its characters,
        // but never letters or whitespace.
        let pattern = format!(r"{mask}(?:[^a-z\s]*{mask}){{{extra},}}");
        let mask_pattern =
            Regex::new(&pattern).expect("mask pattern is built from an escaped literal");
        let placeholders = config
            .placeholders
            .iter()
            .map(|p| p.to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self {
            config,
            mask_pattern,
            placeholders,
        }
    }

    /// Normalizes text into an existing String buffer.
    ///
    /// Clears the buffer before writing.
    pub fn normalize_into(&self, input: &str, out: &mut String) {
        out.clear();
        if input.trim().is_empty() {
            return;
        }

        let mut folded = String::with_capacity(input.len());
        fold_case(input, self.config.fold_diacritics, &mut folded);

        let unmasked = self.strip_masks(&folded);
        let unlinked = self.strip_markup(&unmasked);

        let mut letters = String::with_capacity(unlinked.len());
        retain_letters(&unlinked, &mut letters);
        collapse_whitespace(&letters, out);

        // Every pass only deletes, so an unchanged length means a fixed point.
        loop {
            let before = out.len();
            let swept = self.sweep_letters(out);
            out.clear();
            collapse_whitespace(&swept, out);
            if out.len() == before {
                break;
            }
        }
    }

    /// Normalizes text and returns a new String.
    #[inline]
    pub fn normalize(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        self.normalize_into(input, &mut out);
        out
    }

    fn strip_masks<'a>(&self, text: &'a str) -> Cow<'a, str> {
        self.mask_pattern.replace_all(text, "")
    }

    /// Stages 5, 2 and 3 again, on letters-only text.
    fn sweep_letters(&self, text: &str) -> String {
        let text = self.strip_placeholders(text);
        let text = self.strip_masks(&text);
        if self.config.strip_urls {
            URL_PATTERN.replace_all(&text, "").into_owned()
        } else {
            text.into_owned()
        }
    }

    fn strip_placeholders<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut text = Cow::Borrowed(text);
        for placeholder in &self.placeholders {
            if text.contains(placeholder.as_str()) {
                text = Cow::Owned(text.replace(placeholder.as_str(), ""));
            }
        }
        text
    }

    fn strip_markup<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let text = if self.config.strip_urls {
            URL_PATTERN.replace_all(text, "")
        } else {
            Cow::Borrowed(text)
        };
        if self.config.strip_html && HTML_PATTERN.is_match(&text) {
            return Cow::Owned(HTML_PATTERN.replace_all(&text, "").into_owned());
        }
        text
    }
}

/// Stage 1: Unicode lowercase, ASCII fast path.
fn fold_case(input: &str, strip: bool, out: &mut String) {
    for ch in input.chars() {
        if ch.is_ascii() {
            out.push(ch.to_ascii_lowercase());
            continue;
        }
        for lowered in ch.to_lowercase() {
            let folded = if strip { fold_latin1(lowered) } else { lowered };
            if folded != '\0' {
                out.push(folded);
            }
        }
    }
}

/// Stage 4: keep `a`-`z`, turn any whitespace into a plain space.
fn retain_letters(input: &str, out: &mut String) {
    for ch in input.chars() {
        if ch.is_ascii_lowercase() {
            out.push(ch);
        } else if ch.is_whitespace() {
            out.push(' ');
        }
    }
}

/// Stage 6: single spaces, no leading or trailing space.
fn collapse_whitespace(input: &str, out: &mut String) {
    let mut prev_space = true;
    for ch in input.chars() {
        if ch == ' ' {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
}

#[inline(always)]
fn fold_latin1(c: char) -> char {
    if ('\u{0300}'..='\u{036F}').contains(&c) {
        return '\0';
    }

    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'ā' | 'ă' | 'ą' | 'æ' => 'a',
        'ç' | 'ć' | 'č' | 'ĉ' | 'ċ' => 'c',
        'ð' | 'đ' => 'd',
        'é' | 'è' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'í' | 'ì' | 'î' | 'ï' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
        'ñ' | 'ń' | 'ň' | 'ņ' => 'n',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ō' | 'ŏ' | 'ő' | 'ø' | 'œ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ý' | 'ÿ' => 'y',
        'ś' | 'š' | 'ş' | 'ß' => 's',
        'ź' | 'ž' | 'ż' => 'z',
        'ł' => 'l',
        _ => c,
    }
}
