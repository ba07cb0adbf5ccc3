//! Sentiment lexicon and the fixed word lists used by the rule model
//!
//! The lexicon maps lowercase tokens (words and emoticons) to a valence in
//! roughly [-4, 4]. It is read from a tab-separated resource: one token and its
//! valence per line, extra columns ignored, `#` lines skipped. A lexicon file in
//! the VADER distribution layout loads unchanged.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{PipelineError, Result};

/// Built-in lexicon resource
const BUILTIN_LEXICON: &str = include_str!("../data/sentiment_lexicon.tsv");

/// Built-in emoji description resource
const BUILTIN_EMOJI: &str = include_str!("../data/emoji_descriptions.tsv");

/// Increment applied by boosters such as "very"
pub const B_INCR: f64 = 0.293;
/// Decrement applied by dampeners such as "slightly"
pub const B_DECR: f64 = -0.293;
/// Emphasis added to ALL-CAPS sentiment words when the text mixes case
pub const C_INCR: f64 = 0.733;
/// Scalar applied to negated valences
pub const N_SCALAR: f64 = -0.74;

/// Token to valence mapping
#[derive(Debug, Clone)]
pub struct Lexicon {
    valences: HashMap<String, f64>,
}

impl Lexicon {
    /// The lexicon bundled with the crate
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_LEXICON)
    }

    /// Load a lexicon from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Lexicon(format!("Cannot read lexicon {}: {e}", path.display()))
        })?;
        Self::parse(&source)
    }

    /// Parse tab-separated `token<TAB>valence` lines
    pub fn parse(source: &str) -> Result<Self> {
        let mut valences = HashMap::new();

        for (index, line) in source.lines().enumerate() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let mut columns = line.split('\t');
            let token = columns.next().unwrap_or_default().trim();
            let valence = columns
                .next()
                .ok_or_else(|| malformed(index, "missing valence column"))?
                .trim()
                .parse::<f64>()
                .map_err(|e| malformed(index, &e.to_string()))?;

            if token.is_empty() {
                return Err(malformed(index, "empty token"));
            }

            valences.insert(token.to_lowercase(), valence);
        }

        if valences.is_empty() {
            return Err(PipelineError::Lexicon("Lexicon contains no entries".to_string()));
        }

        Ok(Self { valences })
    }

    /// Valence of a lowercase token
    #[must_use]
    pub fn valence(&self, token: &str) -> Option<f64> {
        self.valences.get(token).copied()
    }

    /// True when the lowercase token carries a valence
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.valences.contains_key(token)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.valences.len()
    }

    /// True when empty (never, for a parsed lexicon)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.valences.is_empty()
    }
}

/// Emoji to plain-text description, e.g. 😂 to "face with tears of joy"
///
/// Only single code point emoji are listed; variation selectors, joiners and
/// skin tone modifiers are dropped when describing a text.
#[derive(Debug, Clone)]
pub struct EmojiDescriptions {
    descriptions: HashMap<char, String>,
}

impl EmojiDescriptions {
    /// The table bundled with the crate
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_EMOJI)
    }

    /// Parse tab-separated `emoji<TAB>description` lines
    pub fn parse(source: &str) -> Result<Self> {
        let mut descriptions = HashMap::new();

        for (index, line) in source.lines().enumerate() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let (emoji, description) = line
                .split_once('\t')
                .ok_or_else(|| malformed(index, "missing description column"))?;
            let mut chars = emoji.chars();
            let (Some(emoji), None) = (chars.next(), chars.next()) else {
                return Err(malformed(index, "emoji must be a single code point"));
            };
            let description = description.trim();
            if description.is_empty() {
                return Err(malformed(index, "empty description"));
            }

            descriptions.insert(emoji, description.to_string());
        }

        Ok(Self { descriptions })
    }

    /// Description of a single emoji
    #[must_use]
    pub fn description(&self, emoji: char) -> Option<&str> {
        self.descriptions.get(&emoji).map(String::as_str)
    }

    /// Replace every known emoji in `text` with its description
    ///
    /// A description is separated from preceding text by a single space.
    #[must_use]
    pub fn describe(&self, text: &str) -> String {
        let mut described = String::with_capacity(text.len());
        let mut prev_space = true;

        for c in text.chars() {
            if is_emoji_modifier(c) {
                continue;
            }
            if let Some(description) = self.descriptions.get(&c) {
                if !prev_space {
                    described.push(' ');
                }
                described.push_str(description);
                prev_space = false;
            } else {
                described.push(c);
                prev_space = c == ' ';
            }
        }

        described.trim().to_string()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    /// True when empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }
}

/// Variation selector-16, zero width joiner and the skin tone modifiers
const fn is_emoji_modifier(c: char) -> bool {
    matches!(c, '\u{FE0F}' | '\u{200D}' | '\u{1F3FB}'..='\u{1F3FF}')
}

fn malformed(index: usize, reason: &str) -> PipelineError {
    PipelineError::Lexicon(format!("Malformed lexicon line {}: {reason}", index + 1))
}

/// Intensity shift of a booster or dampener word (or bigram)
#[must_use]
pub fn booster(word: &str) -> Option<f64> {
    match word {
        "absolutely" | "amazingly" | "awfully" | "completely" | "considerable" | "considerably"
        | "decidedly" | "deeply" | "effing" | "enormous" | "enormously" | "entirely" | "especially"
        | "exceptional" | "exceptionally" | "extreme" | "extremely" | "fabulously" | "flipping"
        | "flippin" | "frackin" | "fracking" | "fricking" | "frickin" | "frigging" | "friggin"
        | "fully" | "fuckin" | "fucking" | "fuggin" | "fugging" | "greatly" | "hella" | "highly"
        | "hugely" | "incredible" | "incredibly" | "intensely" | "major" | "majorly" | "more"
        | "most" | "particularly" | "purely" | "quite" | "really" | "remarkably" | "so"
        | "substantially" | "thoroughly" | "total" | "totally" | "tremendous" | "tremendously"
        | "uber" | "unbelievably" | "unusually" | "utter" | "utterly" | "very" => Some(B_INCR),
        "almost" | "barely" | "hardly" | "just enough" | "kind of" | "kinda" | "kindof"
        | "kind-of" | "less" | "little" | "marginal" | "marginally" | "occasional"
        | "occasionally" | "partly" | "scarce" | "scarcely" | "slight" | "slightly" | "somewhat"
        | "sort of" | "sorta" | "sortof" | "sort-of" => Some(B_DECR),
        _ => None,
    }
}

/// True for words that negate what follows
#[must_use]
pub fn is_negation(word: &str) -> bool {
    matches!(
        word,
        "aint" | "arent" | "cannot" | "cant" | "couldnt" | "darent" | "didnt" | "doesnt"
            | "ain't" | "aren't" | "can't" | "couldn't" | "daren't" | "didn't" | "doesn't"
            | "dont" | "hadnt" | "hasnt" | "havent" | "isnt" | "mightnt" | "mustnt" | "neither"
            | "don't" | "hadn't" | "hasn't" | "haven't" | "isn't" | "mightn't" | "mustn't"
            | "neednt" | "needn't" | "never" | "none" | "nope" | "nor" | "not" | "nothing"
            | "nowhere" | "oughtnt" | "shant" | "shouldnt" | "uhuh" | "wasnt" | "werent"
            | "oughtn't" | "shan't" | "shouldn't" | "uh-uh" | "wasn't" | "weren't" | "without"
            | "wont" | "wouldnt" | "won't" | "wouldn't" | "rarely" | "seldom" | "despite"
    )
}

/// Fixed valence of multi-word idioms, overriding their parts
#[must_use]
pub fn idiom(phrase: &str) -> Option<f64> {
    match phrase {
        "the shit" | "the bomb" | "to die for" => Some(3.0),
        "bad ass" | "badass" => Some(1.5),
        "bus stop" => Some(0.0),
        "yeah right" => Some(-2.0),
        "kiss of death" => Some(-1.5),
        "hand to mouth" => Some(-2.0),
        "beating heart" => Some(3.1),
        "broken heart" => Some(-2.9),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lexicon_loads() {
        let lexicon = Lexicon::builtin().unwrap();
        assert!(lexicon.len() > 700);
        assert_eq!(lexicon.valence("wtf"), Some(-2.8));
        assert_eq!(lexicon.valence("lmao"), Some(2.0));
        assert_eq!(lexicon.valence("good"), Some(1.9));
        assert_eq!(lexicon.valence(":)"), Some(2.0));
        assert!(!lexicon.contains("sky"));
    }

    #[test]
    fn test_parse_ignores_extra_columns_and_comments() {
        let lexicon = Lexicon::parse("# header\nGood\t1.9\t0.9\t[2, 2]\n\nbad\t-2.5\n").unwrap();
        assert_eq!(lexicon.valence("good"), Some(1.9));
        assert_eq!(lexicon.valence("bad"), Some(-2.5));
        assert_eq!(lexicon.len(), 2);
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert!(matches!(Lexicon::parse("good\n"), Err(PipelineError::Lexicon(_))));
        assert!(matches!(Lexicon::parse("good\tvery\n"), Err(PipelineError::Lexicon(_))));
        assert!(matches!(Lexicon::parse("# only a comment\n"), Err(PipelineError::Lexicon(_))));
    }

    #[test]
    fn test_missing_file_is_lexicon_error() {
        let result = Lexicon::from_file(Path::new("/definitely/not/here.tsv"));
        assert!(matches!(result, Err(PipelineError::Lexicon(_))));
    }

    #[test]
    fn test_builtin_emoji_descriptions() {
        let emoji = EmojiDescriptions::builtin().unwrap();
        assert!(emoji.len() > 1000);
        assert_eq!(emoji.description('😂'), Some("face with tears of joy"));
        assert_eq!(emoji.description('❤'), Some("red heart"));
        assert_eq!(emoji.description('a'), None);
    }

    #[test]
    fn test_describe_spaces_descriptions() {
        let emoji = EmojiDescriptions::parse("😂\tjoy\n❤\tred heart\n").unwrap();
        assert_eq!(emoji.describe("😂😂"), "joy joy");
        assert_eq!(emoji.describe("I ❤\u{FE0F} this"), "I red heart this");
        assert_eq!(emoji.describe("so funny😂!"), "so funny joy!");
        assert_eq!(emoji.describe("no emoji here"), "no emoji here");
    }

    #[test]
    fn test_emoji_parse_rejects_malformed_lines() {
        assert!(matches!(EmojiDescriptions::parse("😂\n"), Err(PipelineError::Lexicon(_))));
        assert!(matches!(EmojiDescriptions::parse("ab\tletters\n"), Err(PipelineError::Lexicon(_))));
        assert!(matches!(EmojiDescriptions::parse("😂\t \n"), Err(PipelineError::Lexicon(_))));
    }

    #[test]
    fn test_word_lists() {
        assert_eq!(booster("very"), Some(B_INCR));
        assert_eq!(booster("kind of"), Some(B_DECR));
        assert_eq!(booster("good"), None);
        assert!(is_negation("isn't"));
        assert!(!is_negation("is"));
        assert_eq!(idiom("yeah right"), Some(-2.0));
    }
}
