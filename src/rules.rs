use indexmap::IndexMap;
use std::collections::HashMap;

use crate::excel_validator::ValidatorError;

/// Result of running one rule against one field value
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    /// Value passes, keep it as-is
    Pass,
    /// Value passes and the rule produced a cleaned form of it
    Sanitized(String),
    /// Value fails; the fragment is prefixed with the column key and
    /// suffixed with the row context by the caller
    Fail(String),
}

/// A single validation rule, registered by name in the [`RuleEngine`]
///
/// Implementations must be stateless with respect to individual values -
/// the same engine is reused for every field of every row in a run.
pub trait Rule: Send + Sync {
    fn evaluate(&self, value: &str, params: &[String]) -> RuleOutcome;
}

/// One parsed rule token: a name plus optional `:`-separated parameters,
/// e.g. `required` or `in:red,green,blue`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDescriptor {
    pub name: String,
    pub params: Vec<String>,
}

impl RuleDescriptor {
    pub fn parse(token: &str) -> Self {
        match token.split_once(':') {
            Some((name, params)) => RuleDescriptor {
                name: name.trim().to_string(),
                params: params.split(',').map(|p| p.trim().to_string()).collect(),
            },
            None => RuleDescriptor {
                name: token.trim().to_string(),
                params: Vec::new(),
            },
        }
    }
}

/// Caller-declared mapping of canonical column key to the rules bound to
/// that column, in declaration order
///
/// Declaration order is observable: it fixes both the column order of the
/// produced row data and the within-row ordering of failure messages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSpec {
    fields: IndexMap<String, Vec<RuleDescriptor>>,
}

impl RuleSpec {
    pub fn new() -> Self {
        RuleSpec::default()
    }

    /// Bind a pipe-separated rule list to a column key, e.g.
    /// `spec.field("email", "required|email")`
    pub fn field(mut self, key: &str, rules: &str) -> Self {
        let descriptors = rules
            .split('|')
            .filter(|token| !token.trim().is_empty())
            .map(RuleDescriptor::parse)
            .collect();
        self.fields.insert(key.to_string(), descriptors);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<RuleDescriptor>)> {
        self.fields.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// Engine output for one (column, value) pair: the value to carry into
/// the row data plus every failure message the bound rules produced
#[derive(Debug, Clone, PartialEq)]
pub struct FieldOutcome {
    pub sanitized: String,
    pub failures: Vec<String>,
}

/// Registry of named rules with the built-in set pre-registered
///
/// Engines are cheap to build and hold no per-run state; construct one
/// per validation context so concurrent runs never share anything mutable.
pub struct RuleEngine {
    rules: HashMap<String, Box<dyn Rule>>,
}

impl RuleEngine {
    pub fn with_builtins() -> Self {
        let mut engine = RuleEngine {
            rules: HashMap::new(),
        };
        engine.register("required", Box::new(RequiredRule));
        engine.register("numeric", Box::new(NumericRule));
        engine.register("email", Box::new(EmailRule));
        engine.register("in", Box::new(InSetRule));
        engine
    }

    /// Register a custom rule, replacing any existing rule with the same name
    pub fn register(&mut self, name: &str, rule: Box<dyn Rule>) {
        self.rules.insert(name.to_string(), rule);
    }

    /// Verify every rule named by the spec is registered
    ///
    /// Run once before any row is processed so a typo in a rule name fails
    /// the whole run instead of silently skipping the check.
    pub fn check_spec(&self, spec: &RuleSpec) -> Result<(), ValidatorError> {
        for (_, descriptors) in spec.iter() {
            for descriptor in descriptors {
                if !self.rules.contains_key(&descriptor.name) {
                    return Err(ValidatorError::UnknownRule(descriptor.name.clone()));
                }
            }
        }
        Ok(())
    }

    /// Evaluate every rule bound to a column against the resolved value
    ///
    /// Rules run independently: a failing rule does not stop the rest, and
    /// each failure contributes its own message. Sanitized replacements
    /// from passing rules are carried forward.
    pub fn evaluate(&self, key: &str, value: &str, descriptors: &[RuleDescriptor]) -> FieldOutcome {
        let mut sanitized = value.to_string();
        let mut failures = Vec::new();

        for descriptor in descriptors {
            let Some(rule) = self.rules.get(&descriptor.name) else {
                // check_spec() has already rejected unknown names
                continue;
            };

            match rule.evaluate(&sanitized, &descriptor.params) {
                RuleOutcome::Pass => {}
                RuleOutcome::Sanitized(cleaned) => sanitized = cleaned,
                RuleOutcome::Fail(fragment) => failures.push(format!("{} {}", key, fragment)),
            }
        }

        FieldOutcome {
            sanitized,
            failures,
        }
    }
}

//////////////////////////////////////////////////////////////
///  Built-in rules
//////////////////////////////////////////////////////////////

/// Fails only on a zero-length value
///
/// The check is purely length-based, so `"0"` and whitespace-only strings
/// count as present. This matches the historical message semantics
/// callers depend on.
pub struct RequiredRule;

impl Rule for RequiredRule {
    fn evaluate(&self, value: &str, _params: &[String]) -> RuleOutcome {
        if value.is_empty() {
            RuleOutcome::Fail("is missing".to_string())
        } else {
            RuleOutcome::Pass
        }
    }
}

/// Accepts any value that parses as a number after trimming
pub struct NumericRule;

impl Rule for NumericRule {
    fn evaluate(&self, value: &str, _params: &[String]) -> RuleOutcome {
        if value.trim().parse::<f64>().is_ok() {
            RuleOutcome::Pass
        } else {
            RuleOutcome::Fail("must be numeric".to_string())
        }
    }
}

/// Structural email check; passing values are normalized to trimmed lower case
pub struct EmailRule;

impl Rule for EmailRule {
    fn evaluate(&self, value: &str, _params: &[String]) -> RuleOutcome {
        let normalized = value.trim().to_lowercase();

        let valid = match normalized.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            }
            None => false,
        };

        if valid {
            RuleOutcome::Sanitized(normalized)
        } else {
            RuleOutcome::Fail("must be a valid email address".to_string())
        }
    }
}

/// Membership check against the rule's parameter list, e.g. `in:red,green`
pub struct InSetRule;

impl Rule for InSetRule {
    fn evaluate(&self, value: &str, params: &[String]) -> RuleOutcome {
        if params.iter().any(|allowed| allowed == value) {
            RuleOutcome::Pass
        } else {
            RuleOutcome::Fail(format!("must be one of {}", params.join(", ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rule_length_semantics() {
        let rule = RequiredRule;
        assert_eq!(
            rule.evaluate("", &[]),
            RuleOutcome::Fail("is missing".to_string())
        );
        // "0" and a lone space both have length > 0 and must pass
        assert_eq!(rule.evaluate("0", &[]), RuleOutcome::Pass);
        assert_eq!(rule.evaluate(" ", &[]), RuleOutcome::Pass);
    }

    #[test]
    fn test_numeric_rule() {
        let rule = NumericRule;
        assert_eq!(rule.evaluate("42", &[]), RuleOutcome::Pass);
        assert_eq!(rule.evaluate(" 3.14 ", &[]), RuleOutcome::Pass);
        assert_eq!(rule.evaluate("-7", &[]), RuleOutcome::Pass);
        assert!(matches!(rule.evaluate("abc", &[]), RuleOutcome::Fail(_)));
        assert!(matches!(rule.evaluate("", &[]), RuleOutcome::Fail(_)));
    }

    #[test]
    fn test_email_rule_normalizes_on_pass() {
        let rule = EmailRule;
        assert_eq!(
            rule.evaluate(" Bob@X.Com ", &[]),
            RuleOutcome::Sanitized("bob@x.com".to_string())
        );
        assert!(matches!(rule.evaluate("not-an-email", &[]), RuleOutcome::Fail(_)));
        assert!(matches!(rule.evaluate("bob@nodot", &[]), RuleOutcome::Fail(_)));
        assert!(matches!(rule.evaluate("@x.com", &[]), RuleOutcome::Fail(_)));
    }

    #[test]
    fn test_in_set_rule_uses_params() {
        let rule = InSetRule;
        let params = vec!["red".to_string(), "green".to_string()];
        assert_eq!(rule.evaluate("red", &params), RuleOutcome::Pass);
        assert_eq!(
            rule.evaluate("blue", &params),
            RuleOutcome::Fail("must be one of red, green".to_string())
        );
    }

    #[test]
    fn test_descriptor_parse_with_params() {
        let descriptor = RuleDescriptor::parse("in:red, green,blue");
        assert_eq!(descriptor.name, "in");
        assert_eq!(descriptor.params, vec!["red", "green", "blue"]);

        let bare = RuleDescriptor::parse("required");
        assert_eq!(bare.name, "required");
        assert!(bare.params.is_empty());
    }

    #[test]
    fn test_rule_spec_preserves_declaration_order() {
        let spec = RuleSpec::new()
            .field("zulu", "required")
            .field("alpha", "required");

        let keys: Vec<&String> = spec.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["zulu", "alpha"]);
    }

    #[test]
    fn test_engine_accumulates_all_failures() {
        let engine = RuleEngine::with_builtins();
        let descriptors = vec![
            RuleDescriptor::parse("required"),
            RuleDescriptor::parse("numeric"),
        ];

        let outcome = engine.evaluate("age", "", &descriptors);
        assert_eq!(
            outcome.failures,
            vec!["age is missing".to_string(), "age must be numeric".to_string()]
        );
    }

    #[test]
    fn test_check_spec_rejects_unknown_rule() {
        let engine = RuleEngine::with_builtins();
        let spec = RuleSpec::new().field("email", "required|no_such_rule");

        let err = engine.check_spec(&spec).unwrap_err();
        assert!(matches!(err, ValidatorError::UnknownRule(name) if name == "no_such_rule"));
    }

    #[test]
    fn test_custom_rule_registration() {
        struct Uppercase;
        impl Rule for Uppercase {
            fn evaluate(&self, value: &str, _params: &[String]) -> RuleOutcome {
                if value.chars().all(|c| !c.is_lowercase()) {
                    RuleOutcome::Pass
                } else {
                    RuleOutcome::Fail("must be upper case".to_string())
                }
            }
        }

        let mut engine = RuleEngine::with_builtins();
        engine.register("uppercase", Box::new(Uppercase));

        let descriptors = vec![RuleDescriptor::parse("uppercase")];
        assert!(engine.evaluate("code", "ABC", &descriptors).failures.is_empty());
        assert_eq!(
            engine.evaluate("code", "abc", &descriptors).failures,
            vec!["code must be upper case".to_string()]
        );
    }
}
