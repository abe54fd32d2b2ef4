//! Canonical text: the exact string the vectorizer sees.

/// Joins lemmas with single spaces. No lemmas give `""`.
///
/// ```
/// use finclass_core::canonical::join;
///
/// assert_eq!(join(["contact", "bank"]), "contact bank");
/// assert_eq!(join(Vec::<&str>::new()), "");
/// ```
pub fn join<I, S>(lemmas: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for lemma in lemmas {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(lemma.as_ref());
    }
    out
}
