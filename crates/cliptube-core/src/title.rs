//! Title normalization for recording filenames.
//!
//! Recording stems frequently arrive with broken text: double-encoded
//! umlauts, lone-surrogate escape sequences from the capture tooling, or
//! umlauts dropped entirely. This module turns a raw filename stem (type
//! prefix and extension already removed) into a display title:
//!
//! 1. underscores become spaces;
//! 2. a Latin-1 round trip repairs double-encoded text when it strictly
//!    reduces the number of replacement characters;
//! 3. canonical Unicode normalization (NFC);
//! 4. an ordered rule list reinserts German umlauts in consonant-cluster
//!    contexts - a best-effort heuristic, not an exact decoder;
//! 5. literal `\udcXX` escape sequences become their umlaut characters;
//! 6. leftover replacement markers and control characters are stripped and
//!    whitespace is collapsed;
//! 7. if the repair lost more than 30% of the input (escape sequences
//!    counted in translated form), the marker-stripped original is
//!    returned instead.
//!
//! The function is deterministic and idempotent: feeding its output back in
//! yields the same string.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Ordered umlaut repair rules, most specific first.
///
/// The first group targets an explicit corruption marker (U+FFFD or a stray
/// `?`) between consonants; the second targets consonant clusters German
/// spelling does not produce without a vowel. Rules only fire on uppercase
/// clusters, which is where the corruption shows up in practice.
static REPAIR_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    let rules: &[(&str, &str)] = &[
        // Corrupted-marker repairs.
        (r"GL[\u{FFFD}?]CK", "GLÜCK"),
        (r"H[\u{FFFD}?]R", "HÖR"),
        (r"H[\u{FFFD}?]([NLT])", "HÄ${1}"),
        (r"([BCDFGKLMNPRSTVWXZ])[\u{FFFD}?]CK", "${1}ÜCK"),
        (r"([BCDFGKLMNPRSTVWXZ])[\u{FFFD}?]([NRT])", "${1}Ä${2}"),
        // Ä is the statistically most common fallback.
        (
            r"([BCDFGHJKLMNPQRSTVWXYZ])[\u{FFFD}?]([BCDFGHJKLMNPQRSTVWXYZ])",
            "${1}Ä${2}",
        ),
        // Missing-vowel repairs.
        (r"\bGLCK(\w*)", "GLÜCK${1}"),
        (r"\bHRT\b", "HÖRT"),
        (r"\b([BCDFGHJKLMNPQRSTVWXZ])NGT\b", "${1}ÄNGT"),
        (r"\b(DR|BL|GL|R|Z)CK\b", "${1}ÜCK"),
    ];

    rules
        .iter()
        .map(|(pattern, replacement)| {
            (
                Regex::new(pattern).expect("repair rule pattern is valid"),
                *replacement,
            )
        })
        .collect()
});

/// Literal lone-surrogate escape sequences left behind by the capture
/// tooling, translated to their character form.
const UNICODE_ESCAPES: &[(&str, &str)] = &[
    (r"\udcc4", "Ä"),
    (r"\udce4", "ä"),
    (r"\udcd6", "Ö"),
    (r"\udcf6", "ö"),
    (r"\udcdc", "Ü"),
    (r"\udcfc", "ü"),
    (r"\udcdf", "ß"),
];

/// Normalize a raw filename stem into a display title.
#[must_use]
pub fn normalize_title(stem: &str) -> String {
    // Step 1: underscores were spaces before the capture tooling mangled them.
    let original = stem.replace('_', " ").trim().to_string();

    // Length baseline for the fallback guard. Escape sequences are counted
    // in translated form, since shrinking six characters of escape text to
    // one umlaut is not a loss.
    let mut baseline = original.clone();
    for (escape, literal) in UNICODE_ESCAPES {
        baseline = baseline.replace(escape, literal);
    }

    // Step 2: Latin-1 round trip for double-encoded text.
    let mut text = repair_double_encoding(&original);

    // Step 3: canonical composition.
    text = text.nfc().collect();

    // Step 4: ordered umlaut repairs.
    for (pattern, replacement) in REPAIR_RULES.iter() {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }

    // Step 5: literal escape sequences.
    for (escape, literal) in UNICODE_ESCAPES {
        text = text.replace(escape, literal);
    }

    // Step 6: final cleanup.
    text = strip_markers(&text, false);

    // Step 7: the repair must not eat the title.
    let baseline_len = baseline.chars().count() as f64;
    if text.is_empty() || (text.chars().count() as f64) < baseline_len * 0.7 {
        return strip_markers(&baseline, true);
    }

    text
}

/// Reinterpret the string through a Latin-1 -> UTF-8 round trip.
///
/// Characters above U+00FF cannot be Latin-1 and are dropped, mirroring an
/// encode with errors ignored. The result is kept only when it has strictly
/// fewer replacement characters than the input.
fn repair_double_encoding(text: &str) -> String {
    let has_latin1_range = text.chars().any(|c| (0x80..0x100).contains(&(c as u32)));
    if !has_latin1_range {
        return text.to_string();
    }

    let bytes: Vec<u8> = text
        .chars()
        .filter_map(|c| u8::try_from(c as u32).ok())
        .collect();
    let decoded = String::from_utf8_lossy(&bytes);

    if replacement_count(&decoded) < replacement_count(text) {
        decoded.into_owned()
    } else {
        text.to_string()
    }
}

fn replacement_count(text: &str) -> usize {
    text.chars().filter(|c| *c == '\u{FFFD}').count()
}

/// Drop unrecoverable markers and control characters, collapse whitespace.
///
/// `strict` additionally removes stray `?` characters; it is used for the
/// fallback path where markers may have been written out as question marks.
fn strip_markers(text: &str, strict: bool) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| {
            if *c == '\u{FFFD}' {
                return false;
            }
            if strict && *c == '?' {
                return false;
            }
            !matches!(*c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}')
        })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
