//! Output redaction for generated answers.

/// Replacement for every blocked match, whatever its length.
pub const MASK: &str = "****";

/// Words stripped from every generated answer.
pub const DEFAULT_BLOCKLIST: &[&str] = &["badword1", "badword2", "offensiveword"];

/// Replace blocked substrings with [`MASK`].
///
/// Entries apply one after another, each to the output of the previous one,
/// so a later entry can match text produced by an earlier redaction. Matching
/// is exact and case-sensitive. Empty entries are skipped.
pub fn filter<S: AsRef<str>>(text: &str, blocklist: &[S]) -> String {
    let mut out = text.to_string();
    for word in blocklist {
        let word: &str = word.as_ref();
        if word.is_empty() {
            continue;
        }
        out = out.replace(word, MASK);
    }
    out
}
