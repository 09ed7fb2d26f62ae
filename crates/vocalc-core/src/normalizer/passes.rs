//! Substitution passes of the normalizer pipeline.
//!
//! Each pass is a total `&str -> String` function. They are order-sensitive:
//! later passes assume earlier ones already ran (e.g. function phrases expect
//! digits, not number words).

use regex::Captures;

use super::patterns::*;

/// A named pass, so the pipeline can trace what each step did.
pub type Pass = (&'static str, fn(&str) -> String);

/// The passes in the order they must run.
pub const PIPELINE: [Pass; 6] = [
    ("multiplier_units", expand_multipliers),
    ("number_words", number_words_to_digits),
    ("operator_words", operator_words_to_symbols),
    ("function_phrases", function_phrases_to_calls),
    ("filler_words", strip_filler_words),
    ("whitespace", collapse_whitespace),
];

/// `5 million` -> `5*1000000`, `5 hundred` -> `500`.
///
/// Only digits directly before a scale word are expanded; spelled-out numbers
/// have not been converted yet at this point.
pub fn expand_multipliers(text: &str) -> String {
    let mut out = text.to_string();
    for (pattern, scale) in SCALE_WORDS.iter() {
        out = pattern
            .replace_all(&out, |caps: &Captures| format!("{}*{}", &caps[1], scale))
            .into_owned();
    }
    HUNDRED.replace_all(&out, "${1}00").into_owned()
}

/// `five` -> `5`, `ninety` -> `90`.
pub fn number_words_to_digits(text: &str) -> String {
    NUMBER_WORD
        .replace_all(text, |caps: &Captures| {
            number_word_value(&caps[1]).unwrap_or(&caps[1]).to_string()
        })
        .into_owned()
}

/// `plus` -> `+`, `open bracket` -> `(`, `3 x 4` -> `3*4`.
pub fn operator_words_to_symbols(text: &str) -> String {
    let mut out = text.to_string();
    for (pattern, symbol) in OPERATOR_WORDS.iter() {
        out = pattern.replace_all(&out, *symbol).into_owned();
    }

    // Chained `2 x 3 x 4` shares operands between matches.
    loop {
        let next = LETTER_TIMES.replace_all(&out, "${1}*${2}").into_owned();
        if next == out {
            return out;
        }
        out = next;
    }
}

/// `square root of 9` -> `sqrt(9)`, `2 squared` -> `2^2`, `pi` -> `PI`.
pub fn function_phrases_to_calls(text: &str) -> String {
    let mut out = text.to_string();
    for (pattern, function) in FUNCTION_PHRASES.iter() {
        out = pattern
            .replace_all(&out, |caps: &Captures| format!("{}({})", function, &caps[1]))
            .into_owned();
    }

    out = SQUARED.replace_all(&out, "${1}^2").into_owned();
    out = POWER.replace_all(&out, "${1}^${2}").into_owned();
    out = PI_WORD.replace_all(&out, "PI").into_owned();
    out = E_WORD.replace_all(&out, "E").into_owned();
    RANDOM_WORDS.replace_all(&out, "rand").into_owned()
}

pub fn strip_filler_words(text: &str) -> String {
    FILLER_WORDS.replace_all(text, "").into_owned()
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, "").into_owned()
}
