//! Token extraction rules used to recognise the first page of a record.
//!
//! Each rule looks for one token anywhere in a page's text and returns the first
//! match. Rules know nothing about each other; [`BoundaryClassifier`] combines
//! them.
//!
//! [`BoundaryClassifier`]: crate::classifier::BoundaryClassifier

use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// "Madame DUPONT" / "Monsieur JEAN-PIERRE MARTIN"
    static ref RE_CIVILITY: Regex =
        Regex::new(r"\b(?:Madame|Monsieur)\b\s+([A-ZÀ-ÖØ-Ý][A-ZÀ-ÖØ-Ý \t\-']+)").unwrap();

    /// A whole line made of two or more uppercase words
    static ref RE_UPPER_NAME_LINE: Regex =
        Regex::new(r"^[A-ZÀ-ÖØ-Ý]{2,}(?:[\s\-'][A-ZÀ-ÖØ-Ý]{2,})+$").unwrap();

    /// Word separators inside an uppercase name line
    static ref RE_NAME_SEPARATOR: Regex = Regex::new(r"[\s\-']+").unwrap();

    /// "Période : 12.2025"
    static ref RE_PERIOD: Regex = Regex::new(r"Période\s*:\s*([0-9]{2})\.([0-9]{4})").unwrap();
}

/// Uppercase lines containing one of these words are company or document
/// headers, not employee names.
const NAME_LINE_EXCLUDED_WORDS: &[&str] =
    &["OSAD", "HELVETIA", "SARL", "DECOMPTE", "DÉCOMPTE", "SALAIRE"];

/// Only the top of the page is searched for an uppercase name line.
const NAME_LINE_SEARCH_DEPTH: usize = 25;

/// A pure `text -> token` extraction rule.
///
/// Implementations must be deterministic: the same text always yields the same
/// token. The first textual match is authoritative.
pub trait ExtractionRule: Send + Sync {
    /// Field name the token is stored under (also the report column name).
    fn field(&self) -> &str;

    /// Extract the token from a page's text, or `None` if it is not present.
    fn extract(&self, text: &str) -> Option<String>;
}

/// Generic rule backed by a regular expression.
///
/// Without a template the token is capture group 1, or the whole match when
/// the pattern has no groups. A template such as `"$1-$2"` is expanded against
/// the captures of the first match.
///
/// # Example
///
/// ```
/// use payslip_split::rules::{ExtractionRule, RegexRule};
///
/// let rule = RegexRule::new("id", r"\b([A-Z]{3}-\d{3})\b").unwrap();
/// assert_eq!(rule.extract("Employee AAA-001, ref BBB-002"), Some("AAA-001".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct RegexRule {
    field: String,
    regex: Regex,
    template: Option<String>,
}

impl RegexRule {
    /// Build a rule from a field name and a regex pattern.
    pub fn new(field: impl Into<String>, pattern: &str) -> Result<Self> {
        let field = field.into();
        let regex = Regex::new(pattern)
            .map_err(|e| Error::InvalidRule(format!("field '{}': {}", field, e)))?;
        Ok(Self {
            field,
            regex,
            template: None,
        })
    }

    /// Expand matches through a `$n` template instead of taking group 1.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }
}

impl ExtractionRule for RegexRule {
    fn field(&self) -> &str {
        &self.field
    }

    fn extract(&self, text: &str) -> Option<String> {
        let caps = self.regex.captures(text)?;
        let token = match &self.template {
            Some(template) => {
                let mut out = String::new();
                caps.expand(template, &mut out);
                out
            },
            None => caps.get(1).or_else(|| caps.get(0))?.as_str().to_string(),
        };
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }
}

/// Pay period printed as `Période : MM.YYYY`, normalised to `MM-YYYY`.
#[derive(Debug, Clone)]
pub struct PeriodRule {
    field: String,
}

impl PeriodRule {
    /// Rule storing its token under `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl Default for PeriodRule {
    fn default() -> Self {
        Self::new("period")
    }
}

impl ExtractionRule for PeriodRule {
    fn field(&self) -> &str {
        &self.field
    }

    fn extract(&self, text: &str) -> Option<String> {
        let caps = RE_PERIOD.captures(text)?;
        Some(format!("{}-{}", &caps[1], &caps[2]))
    }
}

/// Employee name, title-cased.
///
/// Looks for a civility (`Madame`/`Monsieur`) followed by an uppercase name
/// first. Failing that, takes the first line near the top of the page that is
/// entirely uppercase words and is not a known company/document header.
#[derive(Debug, Clone)]
pub struct HolderNameRule {
    field: String,
}

impl HolderNameRule {
    /// Rule storing its token under `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    fn from_civility(text: &str) -> Option<String> {
        let caps = RE_CIVILITY.captures(text)?;
        let name = caps[1].trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }

    fn from_uppercase_line(text: &str) -> Option<String> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(NAME_LINE_SEARCH_DEPTH)
            .find(|line| {
                RE_UPPER_NAME_LINE.is_match(line)
                    && !RE_NAME_SEPARATOR
                        .split(line)
                        .any(|word| NAME_LINE_EXCLUDED_WORDS.contains(&word))
            })
            .map(str::to_string)
    }
}

impl Default for HolderNameRule {
    fn default() -> Self {
        Self::new("name")
    }
}

impl ExtractionRule for HolderNameRule {
    fn field(&self) -> &str {
        &self.field
    }

    fn extract(&self, text: &str) -> Option<String> {
        Self::from_civility(text)
            .or_else(|| Self::from_uppercase_line(text))
            .map(|name| title_case(&name))
    }
}

/// Capitalise the first letter of every alphabetic run, lowercase the rest.
///
/// `"JEAN-PIERRE D'ARC"` becomes `"Jean-Pierre D'Arc"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_rule_formats_month_and_year() {
        let rule = PeriodRule::default();
        assert_eq!(rule.extract("Période : 03.2026\nBrut"), Some("03-2026".to_string()));
        assert_eq!(rule.extract("Période:12.2025"), Some("12-2025".to_string()));
    }

    #[test]
    fn test_period_rule_first_match_wins() {
        let rule = PeriodRule::default();
        let text = "Période : 01.2026\n...\nPériode : 02.2026";
        assert_eq!(rule.extract(text), Some("01-2026".to_string()));
    }

    #[test]
    fn test_period_rule_missing() {
        let rule = PeriodRule::default();
        assert_eq!(rule.extract("Periode 01/2026"), None);
        assert_eq!(rule.extract(""), None);
    }

    #[test]
    fn test_name_rule_civility() {
        let rule = HolderNameRule::default();
        let text = "DECOMPTE DE SALAIRE\nMonsieur JEAN-PIERRE MARTIN\nRue du Lac 4";
        assert_eq!(rule.extract(text), Some("Jean-Pierre Martin".to_string()));
    }

    #[test]
    fn test_name_rule_uppercase_line_skips_headers() {
        let rule = HolderNameRule::default();
        let text = "HELVETIA SARL\nDECOMPTE SALAIRE\nDUPONT MARIE\nPériode : 12.2025";
        assert_eq!(rule.extract(text), Some("Dupont Marie".to_string()));
    }

    #[test]
    fn test_name_rule_ignores_single_words_and_deep_lines() {
        let rule = HolderNameRule::default();
        assert_eq!(rule.extract("TOTAL\nNet 4200.00"), None);

        let mut text = String::new();
        for i in 0..30 {
            text.push_str(&format!("line {}\n", i));
        }
        text.push_str("DUPONT MARIE\n");
        assert_eq!(rule.extract(&text), None);
    }

    #[test]
    fn test_regex_rule_group_and_template() {
        let id = RegexRule::new("id", r"([A-Z]{3}-\d{3})").unwrap();
        assert_eq!(id.extract("ref: AAA-001"), Some("AAA-001".to_string()));

        let whole = RegexRule::new("code", r"[A-Z]{3}-\d{3}").unwrap();
        assert_eq!(whole.extract("ref: ZZZ-999"), Some("ZZZ-999".to_string()));

        let period = RegexRule::new("period", r"(\d{2})/(\d{4})")
            .unwrap()
            .with_template("$1-$2");
        assert_eq!(period.extract("Period 12/2025"), Some("12-2025".to_string()));
    }

    #[test]
    fn test_regex_rule_invalid_pattern() {
        let err = RegexRule::new("broken", r"(unclosed").unwrap_err();
        assert!(matches!(err, Error::InvalidRule(_)));
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("DUPONT"), "Dupont");
        assert_eq!(title_case("JEAN-PIERRE D'ARC"), "Jean-Pierre D'Arc");
        assert_eq!(title_case("ÉLODIE ÇA"), "Élodie Ça");
    }
}
