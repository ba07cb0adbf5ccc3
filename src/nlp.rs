use std::path::Path;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::lexicon::{booster, idiom, is_negation, EmojiDescriptions, Lexicon, C_INCR, N_SCALAR};
use crate::models::{Batch, PolarityScores, ScoredRecord, SearchRecord, TextField};

/// Normalization constant approximating the maximum expected raw score
const ALPHA: f64 = 15.0;

/// Rule-based lexicon sentiment model
///
/// Scores a text from the valences of its tokens, adjusted for boosters,
/// negation, contrast ("but"), capitalization and punctuation emphasis.
/// Emoji are replaced by their descriptions first when a table is attached.
#[derive(Debug, Clone)]
pub struct SentimentAnalyzer {
    lexicon: Lexicon,
    emoji: Option<EmojiDescriptions>,
}

/// Tokenized view of a text
struct SentiText {
    tokens: Vec<String>,
    lower: Vec<String>,
    is_cap_diff: bool,
}

impl SentiText {
    fn new(text: &str) -> Self {
        let tokens: Vec<String> = text.split_whitespace().map(strip_punctuation).collect();
        let lower = tokens.iter().map(|t| t.to_lowercase()).collect();
        let is_cap_diff = allcap_differential(&tokens);
        Self {
            tokens,
            lower,
            is_cap_diff,
        }
    }
}

/// Strip surrounding punctuation unless that leaves two characters or fewer (keeps emoticons)
fn strip_punctuation(token: &str) -> String {
    let stripped = token.trim_matches(|c: char| c.is_ascii_punctuation());
    if stripped.chars().count() <= 2 {
        token.to_string()
    } else {
        stripped.to_string()
    }
}

fn is_upper(token: &str) -> bool {
    token.chars().any(char::is_uppercase) && !token.chars().any(char::is_lowercase)
}

/// True when some, but not all, tokens are ALL CAPS
fn allcap_differential(tokens: &[String]) -> bool {
    let allcaps = tokens.iter().filter(|t| is_upper(t)).count();
    allcaps > 0 && allcaps < tokens.len()
}

fn normalize(score: f64) -> f64 {
    let normalized = score / (score * score + ALPHA).sqrt();
    normalized.clamp(-1.0, 1.0)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

impl SentimentAnalyzer {
    /// Analyzer over the built-in lexicon and emoji table
    pub fn new() -> Result<Self> {
        Ok(Self::with_lexicon(Lexicon::builtin()?).with_emoji(EmojiDescriptions::builtin()?))
    }

    /// Analyzer over a caller-supplied lexicon, without emoji descriptions
    #[must_use]
    pub const fn with_lexicon(lexicon: Lexicon) -> Self {
        Self { lexicon, emoji: None }
    }

    /// Describe emoji with `emoji` before scoring
    #[must_use]
    pub fn with_emoji(mut self, emoji: EmojiDescriptions) -> Self {
        self.emoji = Some(emoji);
        self
    }

    /// The lexicon in use
    #[must_use]
    pub const fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Score a text
    #[must_use]
    pub fn polarity_scores(&self, text: &str) -> PolarityScores {
        let described;
        let text = match &self.emoji {
            Some(emoji) => {
                described = emoji.describe(text);
                described.as_str()
            },
            None => text,
        };
        let senti = SentiText::new(text);
        let mut sentiments = Vec::with_capacity(senti.tokens.len());

        for (i, word) in senti.lower.iter().enumerate() {
            if booster(word).is_some() {
                sentiments.push(0.0);
                continue;
            }
            if word == "kind" && senti.lower.get(i + 1).is_some_and(|next| next == "of") {
                sentiments.push(0.0);
                continue;
            }
            sentiments.push(self.sentiment_valence(&senti, i));
        }

        but_check(&senti.lower, &mut sentiments);
        score_valence(&sentiments, text)
    }

    fn sentiment_valence(&self, senti: &SentiText, i: usize) -> f64 {
        let words = &senti.lower;
        let Some(base) = self.lexicon.valence(&words[i]) else {
            return 0.0;
        };
        let mut valence = base;

        // "no" directly before another sentiment word only negates it
        if words[i] == "no" && words.get(i + 1).is_some_and(|next| self.lexicon.contains(next)) {
            valence = 0.0;
        }
        if (i > 0 && words[i - 1] == "no")
            || (i > 1 && words[i - 2] == "no")
            || (i > 2 && words[i - 3] == "no" && matches!(words[i - 1].as_str(), "or" | "nor"))
        {
            valence = base * N_SCALAR;
        }

        if is_upper(&senti.tokens[i]) && senti.is_cap_diff {
            valence += if valence > 0.0 { C_INCR } else { -C_INCR };
        }

        for start_i in 0..3 {
            if i > start_i && !self.lexicon.contains(&words[i - (start_i + 1)]) {
                let mut scalar = scalar_inc_dec(senti, i - (start_i + 1), valence);
                if start_i == 1 {
                    scalar *= 0.95;
                } else if start_i == 2 {
                    scalar *= 0.9;
                }
                valence += scalar;
                valence = negation_check(valence, words, start_i, i);
                if start_i == 2 {
                    valence = special_idioms_check(valence, words, i);
                }
            }
        }

        least_check(valence, words, i, &self.lexicon)
    }
}

fn scalar_inc_dec(senti: &SentiText, index: usize, valence: f64) -> f64 {
    let Some(mut scalar) = booster(&senti.lower[index]) else {
        return 0.0;
    };
    if valence < 0.0 {
        scalar = -scalar;
    }
    if is_upper(&senti.tokens[index]) && senti.is_cap_diff {
        scalar += if valence > 0.0 { C_INCR } else { -C_INCR };
    }
    scalar
}

fn negated(word: &str) -> bool {
    is_negation(word) || word.contains("n't")
}

fn negation_check(valence: f64, words: &[String], start_i: usize, i: usize) -> f64 {
    match start_i {
        0 => {
            if negated(&words[i - 1]) {
                return valence * N_SCALAR;
            }
        },
        1 => {
            if words[i - 2] == "never" && matches!(words[i - 1].as_str(), "so" | "this") {
                return valence * 1.25;
            } else if words[i - 2] == "without" && words[i - 1] == "doubt" {
                return valence;
            } else if negated(&words[i - 2]) {
                return valence * N_SCALAR;
            }
        },
        _ => {
            let so_or_this = |w: &str| matches!(w, "so" | "this");
            if (words[i - 3] == "never" && so_or_this(&words[i - 2])) || so_or_this(&words[i - 1]) {
                return valence * 1.25;
            } else if words[i - 3] == "without" && (words[i - 2] == "doubt" || words[i - 1] == "doubt") {
                return valence;
            } else if negated(&words[i - 3]) {
                return valence * N_SCALAR;
            }
        },
    }
    valence
}

/// Only reached with three preceding words available
fn special_idioms_check(mut valence: f64, words: &[String], i: usize) -> f64 {
    let one_zero = format!("{} {}", words[i - 1], words[i]);
    let two_one_zero = format!("{} {} {}", words[i - 2], words[i - 1], words[i]);
    let two_one = format!("{} {}", words[i - 2], words[i - 1]);
    let three_two_one = format!("{} {} {}", words[i - 3], words[i - 2], words[i - 1]);
    let three_two = format!("{} {}", words[i - 3], words[i - 2]);

    if let Some(fixed) = [&one_zero, &two_one_zero, &two_one, &three_two_one, &three_two]
        .into_iter()
        .find_map(|sequence| idiom(sequence))
    {
        valence = fixed;
    }

    if let Some(next) = words.get(i + 1) {
        if let Some(fixed) = idiom(&format!("{} {next}", words[i])) {
            valence = fixed;
        }
        if let Some(after) = words.get(i + 2) {
            if let Some(fixed) = idiom(&format!("{} {next} {after}", words[i])) {
                valence = fixed;
            }
        }
    }

    // booster bigrams such as "kind of" ahead of the word
    for n_gram in [&three_two_one, &three_two, &two_one] {
        if let Some(shift) = booster(n_gram) {
            valence += shift;
        }
    }

    valence
}

fn least_check(valence: f64, words: &[String], i: usize, lexicon: &Lexicon) -> f64 {
    if i > 0 && words[i - 1] == "least" && !lexicon.contains("least") {
        let at_or_very = i > 1 && matches!(words[i - 2].as_str(), "at" | "very");
        if !at_or_very {
            return valence * N_SCALAR;
        }
    }
    valence
}

/// Words before "but" count half, words after it count one and a half
fn but_check(words: &[String], sentiments: &mut [f64]) {
    if let Some(but_index) = words.iter().position(|w| w == "but") {
        for (index, sentiment) in sentiments.iter_mut().enumerate() {
            if index < but_index {
                *sentiment *= 0.5;
            } else if index > but_index {
                *sentiment *= 1.5;
            }
        }
    }
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(4);
    let questions = text.matches('?').count();
    let question_amplifier = match questions {
        0 | 1 => 0.0,
        2 | 3 => questions as f64 * 0.18,
        _ => 0.96,
    };
    exclamations as f64 * 0.292 + question_amplifier
}

fn score_valence(sentiments: &[f64], text: &str) -> PolarityScores {
    if sentiments.is_empty() {
        return PolarityScores::default();
    }

    let emphasis = punctuation_emphasis(text);
    let mut sum: f64 = sentiments.iter().sum();
    if sum > 0.0 {
        sum += emphasis;
    } else if sum < 0.0 {
        sum -= emphasis;
    }
    let compound = normalize(sum);

    let (mut pos_sum, mut neg_sum, mut neu_count) = (0.0, 0.0, 0.0);
    for &sentiment in sentiments {
        if sentiment > 0.0 {
            pos_sum += sentiment + 1.0;
        } else if sentiment < 0.0 {
            neg_sum += sentiment - 1.0;
        } else {
            neu_count += 1.0;
        }
    }

    if pos_sum > neg_sum.abs() {
        pos_sum += emphasis;
    } else if pos_sum < neg_sum.abs() {
        neg_sum -= emphasis;
    }

    let total = pos_sum + neg_sum.abs() + neu_count;
    PolarityScores {
        neg: round_to((neg_sum / total).abs(), 3),
        neu: round_to((neu_count / total).abs(), 3),
        pos: round_to((pos_sum / total).abs(), 3),
        compound: round_to(compound, 4),
    }
}

/// Cleans tweet text and attaches sentiment scores to batches
pub struct SentimentScorer {
    mention_or_url_regex: Regex,
    analyzer: SentimentAnalyzer,
}

impl SentimentScorer {
    /// Create a scorer over the built-in lexicon
    pub fn new() -> Result<Self> {
        Self::with_analyzer(SentimentAnalyzer::new()?)
    }

    /// Create a scorer over the lexicon at `path`, or the built-in one when `None`
    pub fn from_lexicon_path(path: Option<&Path>) -> Result<Self> {
        let lexicon = match path {
            Some(path) => Lexicon::from_file(path)?,
            None => Lexicon::builtin()?,
        };
        let emoji = EmojiDescriptions::builtin()?;
        info!(entries = lexicon.len(), emoji = emoji.len(), "Sentiment lexicon loaded");
        Self::with_analyzer(SentimentAnalyzer::with_lexicon(lexicon).with_emoji(emoji))
    }

    /// Create a scorer around an existing analyzer
    pub fn with_analyzer(analyzer: SentimentAnalyzer) -> Result<Self> {
        // Initialize regular expression for mention/URL removal
        let mention_or_url_regex = Regex::new(r"(@[A-Za-z0-9]+)|(\w+://\S+)")
            .map_err(|e| PipelineError::Other(format!("Failed to compile mention/URL regex: {e}")))?;

        Ok(Self {
            mention_or_url_regex,
            analyzer,
        })
    }

    /// Replace every @mention and scheme://URL with a single space
    ///
    /// Substitution repeats until nothing matches, so the result is a fixed point.
    #[must_use]
    pub fn clean_text(&self, text: &str) -> String {
        let mut cleaned = text.to_string();
        while self.mention_or_url_regex.is_match(&cleaned) {
            cleaned = self.mention_or_url_regex.replace_all(&cleaned, " ").into_owned();
        }
        cleaned
    }

    /// Copy of `batch` with `field` cleaned in every record
    #[must_use]
    pub fn clean(&self, batch: &Batch<SearchRecord>, field: TextField) -> Batch<SearchRecord> {
        batch
            .iter()
            .map(|record| {
                let mut cleaned = record.clone();
                *cleaned.field_mut(field) = self.clean_text(record.field(field));
                cleaned
            })
            .collect()
    }

    /// Polarity scores and label for a text
    #[must_use]
    pub fn score(&self, text: &str) -> PolarityScores {
        self.analyzer.polarity_scores(text)
    }

    /// Clean `field` and score it for every record, keeping all original fields
    #[must_use]
    pub fn annotate(&self, batch: &Batch<SearchRecord>, field: TextField) -> Batch<ScoredRecord> {
        let scored: Batch<ScoredRecord> = self
            .clean(batch, field)
            .into_iter()
            .map(|record| {
                let scores = self.score(record.field(field));
                ScoredRecord::new(record, scores)
            })
            .collect();
        debug!(records = scored.len(), field = field.column(), "Annotated batch");
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_punctuation_keeps_emoticons() {
        assert_eq!(strip_punctuation("great!!"), "great");
        assert_eq!(strip_punctuation(":)"), ":)");
        assert_eq!(strip_punctuation("'ok'"), "ok");
        assert_eq!(strip_punctuation("ok!"), "ok!");
    }

    #[test]
    fn test_allcap_differential() {
        let tokens = |s: &str| s.split_whitespace().map(String::from).collect::<Vec<_>>();
        assert!(allcap_differential(&tokens("this is GREAT")));
        assert!(!allcap_differential(&tokens("THIS IS GREAT")));
        assert!(!allcap_differential(&tokens("this is great")));
    }

    #[test]
    fn test_punctuation_emphasis() {
        assert_eq!(punctuation_emphasis("fine"), 0.0);
        assert!((punctuation_emphasis("wow!!") - 0.584).abs() < 1e-9);
        assert!((punctuation_emphasis("!!!!!!!") - 4.0 * 0.292).abs() < 1e-9);
        assert_eq!(punctuation_emphasis("really?"), 0.0);
        assert!((punctuation_emphasis("really??") - 0.36).abs() < 1e-9);
        assert!((punctuation_emphasis("really?????") - 0.96).abs() < 1e-9);
    }

    #[test]
    fn test_but_check_weights() {
        let words: Vec<String> = ["good", "but", "bad"].iter().map(ToString::to_string).collect();
        let mut sentiments = vec![2.0, 0.0, -2.0];
        but_check(&words, &mut sentiments);
        assert_eq!(sentiments, vec![1.0, 0.0, -3.0]);
    }

    #[test]
    fn test_normalize_bounds() {
        assert_eq!(normalize(0.0), 0.0);
        assert!(normalize(1000.0) <= 1.0);
        assert!(normalize(-1000.0) >= -1.0);
    }

    #[test]
    fn test_booster_increases_intensity() {
        let analyzer = SentimentAnalyzer::new().unwrap();
        let plain = analyzer.polarity_scores("The movie was good");
        let boosted = analyzer.polarity_scores("The movie was very good");
        assert!(boosted.compound > plain.compound);
        let dampened = analyzer.polarity_scores("The movie was slightly good");
        assert!(dampened.compound < plain.compound);
    }

    #[test]
    fn test_caps_emphasis_in_mixed_case_text() {
        let analyzer = SentimentAnalyzer::new().unwrap();
        let plain = analyzer.polarity_scores("the food was great");
        let shouted = analyzer.polarity_scores("the food was GREAT");
        assert!(shouted.compound > plain.compound);
    }
}
