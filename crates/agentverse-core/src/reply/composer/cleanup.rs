//! Post-processing for generated replies: filler stripping, filler
//! detection, and the length cap.

use std::sync::LazyLock;

use regex::Regex;

/// Marker appended to replies cut at the length cap.
pub const ELLIPSIS: &str = "...";

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\r?\n){3,}").expect("hardcoded regex"));

static LEADING_FILLER: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(
            r"(?i)^(?:sure|okay|ok|alright|absolutely|certainly|of course|great question|good question)\b[\s!,.:;\-]*",
        )
        .expect("hardcoded regex"),
        Regex::new(r"(?i)^here(?:'s|’s| is)\b[^:\n]*:\s*").expect("hardcoded regex"),
        Regex::new(
            r"(?i)^(?:let me (?:check|see|look)|one moment|hold on)\b[^.!?\n]*(?:[.!?]+|…)\s*",
        )
        .expect("hardcoded regex"),
    ]
});

/// A closer only counts as its own trailing sentence: at the start of the
/// text or right after a sentence terminator or line break.
static TRAILING_FILLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|(?P<end>[.!?…]|\n))\s*(?:i\s+)?(?:hope (?:this|that) helps\b|let me know if\b[^.!?\n]*|feel free to\b[^.!?\n]*|happy to help\b|cheers\b)[\s!.,:)]*$",
    )
    .expect("hardcoded regex")
});

/// Stalling phrases that trigger one stricter regeneration.
pub const STALLING_PHRASES: &[&str] = &[
    "wait",
    "let me check",
    "i'll share",
    "i will share",
    "being confirmed",
    "pulling up",
    "stay tuned",
    "i'll check",
    "i'll get back",
    "give me a moment",
    "one moment",
    "checking now",
    "let me look",
];

static STALLING: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = STALLING_PHRASES
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternatives})\b")).expect("hardcoded regex")
});

/// Clean a generated reply until nothing more changes.
///
/// Trims, collapses runs of three or more newlines to two, and strips filler
/// openers and closers. Everything else is left as generated.
pub fn clean_response(raw: &str) -> String {
    let mut current = raw.to_string();
    loop {
        let next = clean_once(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn clean_once(text: &str) -> String {
    let mut out = EXCESS_NEWLINES.replace_all(text.trim(), "\n\n").into_owned();

    for pattern in LEADING_FILLER.iter() {
        out = pattern.replace(&out, "").into_owned();
    }
    out = TRAILING_FILLER.replace(&out, "${end}").into_owned();

    out.trim().to_string()
}

/// True when the text still contains a stalling phrase.
pub fn contains_filler(text: &str) -> bool {
    STALLING.is_match(text)
}

/// Cut `text` to exactly `max` characters, the last three being [`ELLIPSIS`].
///
/// Texts within the cap are returned unchanged. Caps below three characters
/// are a plain cut with no marker.
pub fn enforce_length(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let marker_len = ELLIPSIS.chars().count();
    if max < marker_len {
        return text.chars().take(max).collect();
    }
    let mut cut: String = text.chars().take(max - marker_len).collect();
    cut.push_str(ELLIPSIS);
    cut
}
