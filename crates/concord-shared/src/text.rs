use once_cell::sync::Lazy;
use regex::Regex;

static E164_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[1-9][0-9]{6,18}$").expect("static E.164 pattern"));

/// Strict E.164: a `+`, a non-zero leading digit, 7 to 19 digits in total.
pub fn is_valid_e164(number: &str) -> bool {
    E164_PATTERN.is_match(number)
}

/// True when the string would render as nothing: empty, or made only of
/// whitespace and invisible formatting characters.
pub fn is_visually_empty(value: &str) -> bool {
    value.chars().all(is_invisible)
}

fn is_invisible(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '\u{00AD}'              // soft hyphen
                | '\u{034F}'        // combining grapheme joiner
                | '\u{115F}'..='\u{1160}'
                | '\u{17B4}'..='\u{17B5}'
                | '\u{180E}'
                | '\u{200B}'..='\u{200F}'
                | '\u{202A}'..='\u{202E}'
                | '\u{2060}'..='\u{206F}'
                | '\u{3164}'
                | '\u{FE00}'..='\u{FE0F}'
                | '\u{FEFF}'
                | '\u{FFA0}'
        )
}
