//! Response validation pipeline.
//!
//! A `ValidationEngine` runs an ordered list of independent rules over a
//! candidate response and folds their outcomes into a `ValidationReport`.
//! Every rule always runs. A rule that errors or panics is recorded as a
//! failed outcome and never aborts the remaining rules.

use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

/// Default minimum response length, in characters.
pub const DEFAULT_MIN_LENGTH: usize = 10;

/// Default maximum response length, in characters.
pub const DEFAULT_MAX_LENGTH: usize = 2000;

/// Outcome of a single rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RuleOutcome {
    pub fn pass() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// A named check over candidate text.
pub trait ValidationRule: Send + Sync {
    /// Name under which the outcome is reported.
    fn name(&self) -> &str;

    /// Evaluate the rule. An `Err` is recorded as a failed outcome.
    fn evaluate(&self, text: &str) -> anyhow::Result<RuleOutcome>;
}

// ---------------------------------------------------------------------------
// Built-in rules
// ---------------------------------------------------------------------------

/// Rejects responses shorter than `min` or longer than `max` characters.
///
/// Both bounds are inclusive. Length is counted in `char`s, so multi-byte
/// text is not penalized.
#[derive(Debug, Clone)]
pub struct LengthRule {
    min: usize,
    max: usize,
}

impl LengthRule {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

impl Default for LengthRule {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_LENGTH, DEFAULT_MAX_LENGTH)
    }
}

impl ValidationRule for LengthRule {
    fn name(&self) -> &str {
        "content_length"
    }

    fn evaluate(&self, text: &str) -> anyhow::Result<RuleOutcome> {
        let len = text.chars().count();
        if len < self.min {
            return Ok(RuleOutcome::fail(format!(
                "Response is too short (minimum {} characters)",
                self.min
            )));
        }
        if len > self.max {
            return Ok(RuleOutcome::fail(format!(
                "Response is too long (maximum {} characters)",
                self.max
            )));
        }
        Ok(RuleOutcome::pass())
    }
}

/// Requires at least one sentence terminator (`.`, `!` or `?`).
#[derive(Debug, Clone, Default)]
pub struct SentenceRule;

impl ValidationRule for SentenceRule {
    fn name(&self) -> &str {
        "response_format"
    }

    fn evaluate(&self, text: &str) -> anyhow::Result<RuleOutcome> {
        if text.contains(&['.', '!', '?'][..]) {
            Ok(RuleOutcome::pass())
        } else {
            Ok(RuleOutcome::fail(
                "Response should contain at least one complete sentence",
            ))
        }
    }
}

/// Case-insensitive substring denylist.
#[derive(Debug, Clone, Default)]
pub struct SafetyRule {
    denylist: Vec<String>,
}

impl SafetyRule {
    /// Terms are lowercased up front; blank terms are dropped since they
    /// would match every response.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let denylist = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { denylist }
    }

    pub fn terms(&self) -> &[String] {
        &self.denylist
    }
}

impl ValidationRule for SafetyRule {
    fn name(&self) -> &str {
        "safety_check"
    }

    fn evaluate(&self, text: &str) -> anyhow::Result<RuleOutcome> {
        let lowered = text.to_lowercase();
        if self.denylist.iter().any(|term| lowered.contains(term.as_str())) {
            Ok(RuleOutcome::fail("Response contains inappropriate content"))
        } else {
            Ok(RuleOutcome::pass())
        }
    }
}

/// Adapts a closure into a rule.
pub struct FnRule<F> {
    name: String,
    check: F,
}

impl<F> FnRule<F>
where
    F: Fn(&str) -> anyhow::Result<RuleOutcome> + Send + Sync,
{
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

impl<F> ValidationRule for FnRule<F>
where
    F: Fn(&str) -> anyhow::Result<RuleOutcome> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, text: &str) -> anyhow::Result<RuleOutcome> {
        (self.check)(text)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Settings for the built-in rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// Terms that make a response unsafe, matched case-insensitively.
    #[serde(default)]
    pub denylist: Vec<String>,
}

fn default_min_length() -> usize {
    DEFAULT_MIN_LENGTH
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            max_length: DEFAULT_MAX_LENGTH,
            denylist: Vec::new(),
        }
    }
}

/// Ordered rule set.
pub struct ValidationEngine {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl ValidationEngine {
    /// Engine with the standard rules: length, sentence format, safety.
    pub fn new(config: &ValidationConfig) -> Self {
        Self::empty()
            .with_rule(LengthRule::new(config.min_length, config.max_length))
            .with_rule(SentenceRule)
            .with_rule(SafetyRule::new(&config.denylist))
    }

    /// Engine with no rules. Every text is valid.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule; rules run in the order they were added.
    pub fn with_rule(mut self, rule: impl ValidationRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every rule over `text`.
    pub fn validate(&self, text: &str) -> ValidationReport {
        let results = self
            .rules
            .iter()
            .map(|rule| {
                let outcome = evaluate_isolated(rule.as_ref(), text);
                RuleResult {
                    rule: rule.name().to_string(),
                    valid: outcome.valid,
                    message: outcome.message,
                }
            })
            .collect();
        ValidationReport::from_results(results)
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new(&ValidationConfig::default())
    }
}

fn evaluate_isolated(rule: &dyn ValidationRule, text: &str) -> RuleOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(text))) {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            tracing::error!("error in validation rule {}: {e:#}", rule.name());
            RuleOutcome::fail(format!("Error in validation: {e}"))
        }
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "rule panicked".to_string());
            tracing::error!("validation rule {} panicked: {reason}", rule.name());
            RuleOutcome::fail(format!("Error in validation: {reason}"))
        }
    }
}

/// One rule's entry in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule: String,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Aggregated outcome of a validation run.
///
/// `is_valid` is derived from the results at construction and is true iff
/// every rule passed. Deserializing recomputes it from `results`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ReportFields")]
pub struct ValidationReport {
    is_valid: bool,
    results: Vec<RuleResult>,
}

#[derive(Deserialize)]
struct ReportFields {
    #[serde(default)]
    results: Vec<RuleResult>,
}

impl From<ReportFields> for ValidationReport {
    fn from(fields: ReportFields) -> Self {
        Self::from_results(fields.results)
    }
}

impl ValidationReport {
    pub fn from_results(results: Vec<RuleResult>) -> Self {
        let is_valid = results.iter().all(|r| r.valid);
        Self { is_valid, results }
    }

    /// A report with no rule results, used when validation is skipped.
    pub fn skipped() -> Self {
        Self::from_results(Vec::new())
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn results(&self) -> &[RuleResult] {
        &self.results
    }

    /// Look up a rule's result by name.
    pub fn outcome(&self, rule: &str) -> Option<&RuleResult> {
        self.results.iter().find(|r| r.rule == rule)
    }

    /// Messages of failing rules, in rule order.
    pub fn error_messages(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| !r.valid)
            .map(|r| {
                r.message
                    .clone()
                    .unwrap_or_else(|| format!("{} failed", r.rule))
            })
            .collect()
    }
}
