//! Regex patterns for the voice-to-math normalizer.
//!
//! Every pattern here runs against lower-cased, trimmed text. Patterns are
//! grouped by the pipeline pass that uses them; the passes themselves live in
//! `passes.rs` and decide the order in which these are applied.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::CommandTag;

/// A number as it appears after the number-word pass: `12` or `3.5`.
const NUM: &str = r"(\d+(?:\.\d+)?)";

fn function_phrase(words: &str) -> Regex {
    Regex::new(&format!(r"\b(?:{})\b\s*(?:of\s*)?{}\b", words, NUM)).unwrap()
}

lazy_static! {
    // =========================================================================
    // COMMAND PATTERNS (checked in CommandTag::PRIORITY order)
    // =========================================================================

    pub static ref CLEAR_COMMAND: Regex = Regex::new(
        r"(?:^|\s)(?:clear all|clear|reset|erase)(?:\s(?:display|screen))?(?:$|\s)"
    ).unwrap();

    pub static ref CALCULATE_COMMAND: Regex = Regex::new(
        r"(?:^|\s)(?:what is|equals|equal|is|calculate|solve|answer)\b"
    ).unwrap();

    pub static ref REPEAT_COMMAND: Regex = Regex::new(
        r"(?:^|\s)(?:what was the last result|last result|say again|repeat)\b"
    ).unwrap();

    pub static ref HISTORY_COMMAND: Regex = Regex::new(
        r"(?:^|\s)(?:show history|open history|past calculations|history)\b"
    ).unwrap();

    // =========================================================================
    // MULTIPLIER UNITS
    // =========================================================================

    /// Scale words and the literal digits they expand to, in application order.
    pub static ref SCALE_WORDS: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"(\d+)\s*trillion").unwrap(), "1000000000000"),
        (Regex::new(r"(\d+)\s*billion").unwrap(), "1000000000"),
        (Regex::new(r"(\d+)\s*million").unwrap(), "1000000"),
        (Regex::new(r"(\d+)\s*lakh").unwrap(), "100000"),
        (Regex::new(r"(\d+)\s*crore").unwrap(), "10000000"),
    ];

    pub static ref HUNDRED: Regex = Regex::new(r"(\d+)\s+hundred\b").unwrap();

    // =========================================================================
    // NUMBER WORDS
    // =========================================================================

    pub static ref NUMBER_WORD: Regex = Regex::new(
        r"\b(zero|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|thirteen|fourteen|fifteen|sixteen|seventeen|eighteen|nineteen|twenty|thirty|forty|fifty|sixty|seventy|eighty|ninety)\b"
    ).unwrap();

    // =========================================================================
    // OPERATOR WORDS
    // =========================================================================

    /// Operator phrases and their symbols. Longer phrasings come first.
    pub static ref OPERATOR_WORDS: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"\b(?:plus|add)\b").unwrap(), "+"),
        (Regex::new(r"\b(?:minus|subtract)\b").unwrap(), "-"),
        (Regex::new(r"\b(?:multiplied by|multiply by|times|multiply)\b").unwrap(), "*"),
        (Regex::new(r"\b(?:divided by|divide by|divide)\b").unwrap(), "/"),
        (Regex::new(r"\b(?:point|dot)\b").unwrap(), "."),
        (Regex::new(r"\bopen (?:parenthesis|bracket)\b").unwrap(), "("),
        (Regex::new(r"\bclose (?:parenthesis|bracket)\b").unwrap(), ")"),
    ];

    /// `3 x 4` spoken or typed as a letter.
    pub static ref LETTER_TIMES: Regex = Regex::new(r"(\d+)\s*x\s*(\d+)").unwrap();

    // =========================================================================
    // FUNCTION PHRASES
    // =========================================================================

    /// Unary function phrases and the call they become. `natural log` and the
    /// `log two` forms precede plain `log` so the shorter word cannot claim them.
    pub static ref FUNCTION_PHRASES: Vec<(Regex, &'static str)> = vec![
        (function_phrase("sine|sin"), "sin"),
        (function_phrase("cosine|cos"), "cos"),
        (function_phrase("tangent|tan"), "tan"),
        (function_phrase(r"natural\s*log|ln"), "ln"),
        (Regex::new(&format!(r"\blog\s*(?:two|2)\s+(?:of\s+)?{}\b", NUM)).unwrap(), "log2"),
        (function_phrase("log2"), "log2"),
        (function_phrase("log"), "log"),
        (function_phrase("exponential|exp"), "exp"),
        (Regex::new(&format!(r"\bsquare\s*root\s*(?:of\s*)?{}\b", NUM)).unwrap(), "sqrt"),
    ];

    pub static ref SQUARED: Regex = Regex::new(&format!(r"{}\s*squared\b", NUM)).unwrap();

    pub static ref POWER: Regex = Regex::new(
        &format!(r"{}\s*(?:to\s*the\s*)?power\s*(?:of\s*)?{}\b", NUM, NUM)
    ).unwrap();

    pub static ref PI_WORD: Regex = Regex::new(r"\bpi\b").unwrap();

    pub static ref E_WORD: Regex = Regex::new(r"\be\b").unwrap();

    pub static ref RANDOM_WORDS: Regex = Regex::new(
        r"\b(?:random\s*number|roll\s*dice|random)\b"
    ).unwrap();

    // =========================================================================
    // CLEANUP & VALIDATION
    // =========================================================================

    pub static ref FILLER_WORDS: Regex = Regex::new(
        r"\b(?:the|a|an|result|value|do|can|you|me|please|give|show|tell)\b"
    ).unwrap();

    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    /// The complete expression alphabet, plus one optional trailing `=`.
    pub static ref EXPRESSION_ALPHABET: Regex = Regex::new(
        r"^(?:[0-9+\-*/.()^]|sqrt|sin|cos|tan|log2|log|ln|exp|rand|PI|E)*=?$"
    ).unwrap();
}

/// The pattern that detects a command tag.
pub fn command_pattern(tag: CommandTag) -> &'static Regex {
    match tag {
        CommandTag::Clear => &CLEAR_COMMAND,
        CommandTag::Calculate => &CALCULATE_COMMAND,
        CommandTag::Repeat => &REPEAT_COMMAND,
        CommandTag::History => &HISTORY_COMMAND,
    }
}

/// Digit string for a number word in the fixed vocabulary.
pub fn number_word_value(word: &str) -> Option<&'static str> {
    let digits = match word {
        "zero" => "0",
        "one" => "1",
        "two" => "2",
        "three" => "3",
        "four" => "4",
        "five" => "5",
        "six" => "6",
        "seven" => "7",
        "eight" => "8",
        "nine" => "9",
        "ten" => "10",
        "eleven" => "11",
        "twelve" => "12",
        "thirteen" => "13",
        "fourteen" => "14",
        "fifteen" => "15",
        "sixteen" => "16",
        "seventeen" => "17",
        "eighteen" => "18",
        "nineteen" => "19",
        "twenty" => "20",
        "thirty" => "30",
        "forty" => "40",
        "fifty" => "50",
        "sixty" => "60",
        "seventy" => "70",
        "eighty" => "80",
        "ninety" => "90",
        _ => return None,
    };
    Some(digits)
}
