//! Badge code matching
//!
//! Pure lookup of a scanned string against a roster snapshot. Decoders
//! regularly wrap the badge code in framing noise, so a scan matches when
//! it equals a student's code or merely contains it.

use tutordesk_common::model::Student;

/// Match a raw scanned string against a roster snapshot
///
/// Matching is case-insensitive. An exact code match always wins; when no
/// code matches exactly, the raw text is searched for each code as a
/// substring and the first roster entry whose code is contained wins.
///
/// Known ambiguity: when one student's code is a prefix of another's
/// (e.g. `M10` and `M102`), the substring pass resolves ties by roster
/// order. Keep codes prefix-free when assigning them.
///
/// Empty or whitespace-only input never matches, and students with empty
/// codes are never matched. Never fails.
pub fn match_code<'a>(raw_text: &str, roster: &'a [Student]) -> Option<&'a Student> {
    let needle = raw_text.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    // Exact match takes precedence over any substring collision
    if let Some(student) = roster
        .iter()
        .find(|s| !s.code.is_empty() && s.code.to_lowercase() == needle)
    {
        return Some(student);
    }

    roster
        .iter()
        .find(|s| !s.code.is_empty() && needle.contains(&s.code.to_lowercase()))
}
