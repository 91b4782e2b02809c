//! Boundary classification: does a page open a new record?
//!
//! A page is a boundary when every rule of the classifier finds its token.
//! Partial matches never count.

use crate::rules::{ExtractionRule, HolderNameRule, PeriodRule};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Tokens extracted from a page, keyed by field name in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RecordIdentity {
    tokens: IndexMap<String, String>,
}

impl RecordIdentity {
    /// Create an empty identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an identity from `(field, value)` pairs, keeping their order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            tokens: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Token for `field`, if present.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.tokens.get(field).map(String::as_str)
    }

    /// Iterate `(field, value)` pairs in rule order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tokens.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True if no token was found.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn insert(&mut self, field: &str, value: String) {
        self.tokens.insert(field.to_string(), value);
    }
}

impl fmt::Display for RecordIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, value) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", field, value)?;
            first = false;
        }
        Ok(())
    }
}

/// Ordered conjunction of extraction rules.
///
/// # Example
///
/// ```
/// use payslip_split::classifier::BoundaryClassifier;
///
/// let classifier = BoundaryClassifier::payslip();
/// let page = "Monsieur MARTIN PAUL\nPériode : 12.2025\nSalaire brut 5200.00";
/// let identity = classifier.classify(page).unwrap();
/// assert_eq!(identity.get("name"), Some("Martin Paul"));
/// assert_eq!(identity.get("period"), Some("12-2025"));
///
/// assert!(classifier.classify("Page 2 / 2").is_none());
/// ```
pub struct BoundaryClassifier {
    rules: Vec<Box<dyn ExtractionRule>>,
}

impl Default for BoundaryClassifier {
    fn default() -> Self {
        Self::payslip()
    }
}

impl BoundaryClassifier {
    /// Classifier with no rules. Add rules with [`with_rule`](Self::with_rule).
    ///
    /// A classifier without rules never reports a boundary.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Payslip rules: employee name, then pay period.
    pub fn payslip() -> Self {
        Self::new()
            .with_rule(HolderNameRule::default())
            .with_rule(PeriodRule::default())
    }

    /// Append a rule. Rule order defines field order in names and reports.
    pub fn with_rule(mut self, rule: impl ExtractionRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Field names in rule order.
    pub fn fields(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.field().to_string()).collect()
    }

    /// Run every rule and keep whatever matched, complete or not.
    pub fn extract_tokens(&self, text: &str) -> RecordIdentity {
        let mut identity = RecordIdentity::new();
        if text.trim().is_empty() {
            return identity;
        }
        for rule in &self.rules {
            if let Some(token) = rule.extract(text) {
                identity.insert(rule.field(), token);
            }
        }
        identity
    }

    /// True if `identity` holds a token for every rule.
    pub fn is_complete(&self, identity: &RecordIdentity) -> bool {
        !self.rules.is_empty()
            && self
                .rules
                .iter()
                .all(|rule| identity.get(rule.field()).is_some())
    }

    /// Complete identity if every rule matched, otherwise `None`.
    pub fn classify(&self, text: &str) -> Option<RecordIdentity> {
        let identity = self.extract_tokens(text);
        if self.is_complete(&identity) {
            Some(identity)
        } else {
            None
        }
    }
}

impl fmt::Debug for BoundaryClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundaryClassifier")
            .field("fields", &self.fields())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RegexRule;

    fn period_and_id() -> BoundaryClassifier {
        BoundaryClassifier::new()
            .with_rule(
                RegexRule::new("period", r"(\d{2})-(\d{4})")
                    .unwrap()
                    .with_template("$1-$2"),
            )
            .with_rule(RegexRule::new("id", r"([A-Z]{3}-\d{3})").unwrap())
    }

    #[test]
    fn test_complete_identity() {
        let c = period_and_id();
        let identity = c.classify("Period 12-2025\nEmployee AAA-001").unwrap();
        assert_eq!(identity.get("period"), Some("12-2025"));
        assert_eq!(identity.get("id"), Some("AAA-001"));
        assert_eq!(identity.to_string(), "period=12-2025, id=AAA-001");
    }

    #[test]
    fn test_partial_identity_is_not_a_boundary() {
        let c = period_and_id();
        assert!(c.classify("Period 12-2025 only").is_none());
        let partial = c.extract_tokens("Period 12-2025 only");
        assert_eq!(partial.len(), 1);
        assert_eq!(partial.get("period"), Some("12-2025"));
    }

    #[test]
    fn test_empty_text_is_not_a_boundary() {
        let c = period_and_id();
        assert!(c.classify("").is_none());
        assert!(c.classify("   \n\t").is_none());
        assert!(c.extract_tokens("").is_empty());
    }

    #[test]
    fn test_classification_is_deterministic() {
        let c = period_and_id();
        let text = "AAA-001 BBB-002 01-2026 02-2026";
        let first = c.classify(text);
        let second = c.classify(text);
        assert_eq!(first, second);
        assert_eq!(first.unwrap().get("id"), Some("AAA-001"));
    }

    #[test]
    fn test_field_order_follows_rules() {
        let c = period_and_id();
        assert_eq!(c.fields(), vec!["period".to_string(), "id".to_string()]);
        let identity = c.classify("AAA-001 then 12-2025").unwrap();
        let fields: Vec<&str> = identity.iter().map(|(k, _)| k).collect();
        assert_eq!(fields, vec!["period", "id"]);
    }

    #[test]
    fn test_no_rules_never_matches() {
        assert!(BoundaryClassifier::new().classify("anything").is_none());
    }

    #[test]
    fn test_payslip_defaults() {
        let c = BoundaryClassifier::payslip();
        assert_eq!(c.fields(), vec!["name".to_string(), "period".to_string()]);
        let page = "OSAD SARL\nDUPONT MARIE\nPériode : 01.2026";
        let identity = c.classify(page).unwrap();
        assert_eq!(identity.get("name"), Some("Dupont Marie"));
        assert_eq!(identity.get("period"), Some("01-2026"));
    }
}
