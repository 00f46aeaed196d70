//! Uyghur script transliteration.
//!
//! Every conversion goes through the Common Turkic Script (CTS): the
//! source text is first rewritten into CTS, then from CTS into the target.
//!
//! | Code    | Script                                |
//! |---------|---------------------------------------|
//! | `UAS`   | Uyghur Arabic script                  |
//! | `ULS`   | Uyghur Latin script                   |
//! | `UYS`   | Uyghur Yengi (new) script             |
//! | `UCS`   | Uyghur Cyrillic script                |
//! | `CTS`   | Common Turkic script                  |
//! | `UZBEK` | Uzbek Latin (target only)             |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const HAMZA: char = '\u{0626}';

const UAS_GROUP: [&str; 37] = [
    "ا", "ە", "ب", "پ", "ت", "ج", "چ", "خ", "د", "ر", "ز", "ژ", "س", "ش", "ف", "ڭ", "ل", "لا",
    "م", "ھ", "و", "ۇ", "ۆ", "ۈ", "ۋ", "ې", "ى", "ي", "ق", "ك", "گ", "ن", "غ", "؟", "،", "؛",
    "٭",
];

const CTS_GROUP: [&str; 37] = [
    "a", "e", "b", "p", "t", "c", "ç", "x", "d", "r", "z", "j", "s", "ş", "f", "ñ", "l", "la",
    "m", "h", "o", "u", "ö", "ü", "v", "é", "i", "y", "q", "k", "g", "n", "ğ", "?", ",", ";",
    "*",
];

const UCS_GROUP: [&str; 37] = [
    "а", "ә", "б", "п", "т", "җ", "ч", "х", "д", "р", "з", "ж", "с", "ш", "ф", "ң", "л", "ла",
    "м", "һ", "о", "у", "ө", "ү", "в", "е", "и", "й", "қ", "к", "г", "н", "ғ", "?", ",", ";",
    "*",
];

const ULS_TO_CTS: [(&str, &str); 13] = [
    ("ng", "ñ"),
    ("ə", "e"),
    ("ⱬ", "j"),
    ("j", "c"),
    ("ⱪ", "q"),
    ("q", "ç"),
    ("ⱨ", "h"),
    ("h", "x"),
    ("x", "ş"),
    ("ø", "ö"),
    ("w", "v"),
    ("e", "é"),
    ("ƣ", "ğ"),
];

const UYS_TO_CTS: [(&str, &str); 13] = [
    ("n'g", "ñ"),
    ("ə", "e"),
    ("ⱬ", "j"),
    ("j", "c"),
    ("ⱪ", "q"),
    ("q", "ç"),
    ("ⱨ", "h"),
    ("h", "x"),
    ("x", "ş"),
    ("ø", "ö"),
    ("w", "v"),
    ("e", "é"),
    ("ƣ", "ğ"),
];

const CTS_TO_ULS: [(&str, &str); 13] = [
    ("ñ", "ng"),
    ("e", "ə"),
    ("j", "ⱬ"),
    ("c", "j"),
    ("q", "ⱪ"),
    ("ç", "q"),
    ("h", "ⱨ"),
    ("x", "h"),
    ("ş", "x"),
    ("ö", "ø"),
    ("v", "w"),
    ("é", "e"),
    ("ğ", "ƣ"),
];

const CTS_TO_UYS: [(&str, &str); 13] = [
    ("ñ", "n'g"),
    ("e", "ə"),
    ("j", "ⱬ"),
    ("c", "j"),
    ("q", "ⱪ"),
    ("ç", "q"),
    ("h", "ⱨ"),
    ("x", "h"),
    ("ş", "x"),
    ("ö", "ø"),
    ("v", "w"),
    ("é", "e"),
    ("ğ", "ƣ"),
];

const CTS_TO_UZBEK: [(&str, &str); 1] = [("ñ", "ng")];

const VOWELS: &str = "aeéiouöü";
const CONSONANTS: &str = "bptcçxdrzjsşfñlmhvyqkgnğ";
const LETTERS: &str = "aebptcçxdrzjsşfñlmhouöüvéiyqkgnğ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Script {
    Uas,
    Uls,
    Uys,
    Ucs,
    Cts,
    Uzbek,
}

impl Script {
    pub fn code(&self) -> &'static str {
        match self {
            Script::Uas => "UAS",
            Script::Uls => "ULS",
            Script::Uys => "UYS",
            Script::Ucs => "UCS",
            Script::Cts => "CTS",
            Script::Uzbek => "UZBEK",
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Script {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UAS" => Ok(Script::Uas),
            "ULS" => Ok(Script::Uls),
            "UYS" => Ok(Script::Uys),
            "UCS" => Ok(Script::Ucs),
            "CTS" => Ok(Script::Cts),
            "UZBEK" => Ok(Script::Uzbek),
            _ => Err(ScriptError::UnknownScript(s.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("unknown script: {0}")]
    UnknownScript(String),

    #[error("{0} is only supported as a target script")]
    UnsupportedSource(Script),
}

/// Converts text between two Uyghur scripts.
#[derive(Debug, Clone, Copy)]
pub struct ScriptConverter {
    source: Script,
    target: Script,
    apostrophe: bool,
}

impl ScriptConverter {
    /// `apostrophe` selects the convention where a hamza is written only at
    /// word starts and `'` separates vowels inside a word.
    pub fn new(source: Script, target: Script, apostrophe: bool) -> Result<Self, ScriptError> {
        if source == Script::Uzbek && target != Script::Uzbek {
            return Err(ScriptError::UnsupportedSource(source));
        }
        Ok(Self {
            source,
            target,
            apostrophe,
        })
    }

    pub fn source(&self) -> Script {
        self.source
    }

    pub fn target(&self) -> Script {
        self.target
    }

    pub fn convert(&self, text: &str) -> String {
        if self.source == self.target {
            return text.to_string();
        }

        let cts = match self.source {
            Script::Uas => uas_to_cts(text, self.apostrophe),
            Script::Uls => apply_map(text, &ULS_TO_CTS),
            Script::Uys => apply_map(text, &UYS_TO_CTS),
            Script::Ucs => ucs_to_cts(text),
            Script::Cts | Script::Uzbek => text.to_string(),
        };

        match self.target {
            Script::Uas => cts_to_uas(&cts, self.apostrophe),
            Script::Uls => apply_map(&cts, &CTS_TO_ULS),
            Script::Uys => apply_map(&cts, &CTS_TO_UYS),
            Script::Uzbek => apply_map(&cts, &CTS_TO_UZBEK),
            Script::Ucs => cts_to_ucs(&cts),
            Script::Cts => cts,
        }
    }
}

/// Replace every entry of `from` with its counterpart in `to`, one table
/// row at a time.
fn replace_via_table(text: &str, from: &[&str], to: &[&str]) -> String {
    from.iter()
        .zip(to)
        .fold(text.to_string(), |acc, (f, t)| acc.replace(f, t))
}

/// Single left-to-right pass; at each position the first listed key that
/// matches wins.
fn apply_map(text: &str, pairs: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    'outer: while let Some(c) = rest.chars().next() {
        for (key, value) in pairs {
            if rest.starts_with(key) {
                out.push_str(value);
                rest = &rest[key.len()..];
                continue 'outer;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}

fn uas_to_cts(text: &str, apostrophe: bool) -> String {
    let cts = replace_via_table(text, &UAS_GROUP, &CTS_GROUP);
    revise_cts(&cts, apostrophe)
}

fn revise_cts(text: &str, apostrophe: bool) -> String {
    let chars: Vec<char> = text.chars().collect();

    // Hamza opening a word carries no sound.
    let mut stripped = Vec::with_capacity(chars.len());
    for (i, &c) in chars.iter().enumerate() {
        let word_start = i == 0 || chars[i - 1].is_whitespace();
        let letter_follows = chars
            .get(i + 1)
            .map_or(false, |n| n.is_alphanumeric() || *n == '_');
        if c == HAMZA && word_start && letter_follows {
            continue;
        }
        stripped.push(c);
    }

    let mut out = String::with_capacity(text.len());
    for (i, &c) in stripped.iter().enumerate() {
        if c != HAMZA {
            out.push(c);
            continue;
        }
        let after_vowel = i > 0 && VOWELS.contains(stripped[i - 1]);
        if !apostrophe && after_vowel {
            continue;
        }
        out.push('\'');
    }
    out
}

fn cts_to_uas(text: &str, apostrophe: bool) -> String {
    let chars: Vec<char> = text.chars().collect();
    let boundary = if apostrophe { LETTERS } else { CONSONANTS };

    let mut with_hamza: Vec<char> = Vec::with_capacity(chars.len() + 8);
    for (i, &c) in chars.iter().enumerate() {
        let opens_syllable = i == 0 || !boundary.contains(chars[i - 1]);
        if VOWELS.contains(c) && opens_syllable {
            with_hamza.push(HAMZA);
        }
        with_hamza.push(c);
    }

    let prepared: String = if apostrophe {
        let is_letter = |c: char| c == HAMZA || LETTERS.contains(c);
        with_hamza
            .iter()
            .enumerate()
            .filter(|&(i, &c)| {
                let between_letters = i > 0
                    && is_letter(with_hamza[i - 1])
                    && with_hamza.get(i + 1).map_or(false, |&n| is_letter(n));
                !(c == '\'' && between_letters)
            })
            .map(|(_, &c)| c)
            .collect()
    } else {
        with_hamza.into_iter().collect()
    };

    let uas = replace_via_table(&prepared, &CTS_GROUP, &UAS_GROUP);
    if apostrophe {
        uas
    } else {
        uas.replace(&format!("'{}", HAMZA), &HAMZA.to_string())
    }
}

fn ucs_to_cts(text: &str) -> String {
    let lowered = text.to_lowercase().replace('я', "ya").replace('ю', "yu");
    replace_via_table(&lowered, &UCS_GROUP, &CTS_GROUP)
}

fn cts_to_ucs(text: &str) -> String {
    let lowered = text.to_lowercase().replace("ya", "я").replace("yu", "ю");
    replace_via_table(&lowered, &CTS_GROUP, &UCS_GROUP)
}
