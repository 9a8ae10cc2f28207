use crate::parser::parse_rules;
use crate::types::RuleSet;

// Bundled rule sets: (name, description, rules)
const PRESET_TEXTS: [(&str, &str, &str); 4] = [
    (
        "Binary Increment",
        "Adds one to a binary number",
        include_str!("../programs/binary-increment.rules"),
    ),
    (
        "Lexicographic Successor",
        "Replaces a binary string with the next one in length-then-lexicographic order",
        include_str!("../programs/lexicographic-successor.rules"),
    ),
    (
        "Even Parity",
        "Accepts binary strings with an even number of ones",
        include_str!("../programs/even-parity.rules"),
    ),
    (
        "Palindrome",
        "Accepts binary palindromes",
        include_str!("../programs/palindrome.rules"),
    ),
];

lazy_static::lazy_static! {
    pub static ref PRESETS: Vec<Preset> = PRESET_TEXTS
        .iter()
        .filter_map(|&(name, description, text)| {
            parse_rules(text).ok().map(|rules| Preset {
                name,
                description,
                text,
                rules: RuleSet::from(rules),
            })
        })
        .collect();
}

/// A named rule set shipped with the crate.
#[derive(Debug, Clone)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    /// The rule notation the preset was parsed from.
    pub text: &'static str,
    pub rules: RuleSet,
}

pub struct PresetManager;

impl PresetManager {
    /// All presets, in a stable order.
    pub fn list() -> &'static [Preset] {
        &PRESETS
    }

    /// Get the number of available presets
    pub fn count() -> usize {
        PRESETS.len()
    }

    /// Get a preset by its index
    pub fn get_by_index(index: usize) -> Option<&'static Preset> {
        PRESETS.get(index)
    }

    /// Get a preset by its name.
    ///
    /// Matching ignores case and treats `-` and `_` as spaces, so `binary-increment`
    /// finds "Binary Increment".
    pub fn get_by_name(name: &str) -> Option<&'static Preset> {
        let wanted = normalize(name);
        PRESETS.iter().find(|preset| normalize(preset.name) == wanted)
    }

    /// List all preset names
    pub fn names() -> Vec<&'static str> {
        PRESETS.iter().map(|preset| preset.name).collect()
    }
}

fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '-' | '_' => ' ',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}
