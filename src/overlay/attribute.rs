//! Attribute kinds found in a translation and how each is merged onto a rule.

use crate::errors::OverlayError;
use crate::rules::types::{MOSAIQUE, SUGGESTIONS, scalar_key};
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;

/// Attributes ending with this suffix point at the source of a translation.
pub const REFERENCE_SUFFIX: &str = ".ref";

/// One translated attribute, classified by its merge strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum TranslatedAttribute {
    /// Provenance marker, never copied into the output
    Reference,
    /// Translated suggestion keys, matched to the base values by position
    Suggestions(Vec<String>),
    /// Translated keys for `mosaique.suggestions`
    Mosaique(Vec<String>),
    /// Any other attribute, replaced wholesale
    Plain(Value),
}

impl TranslatedAttribute {
    /// Classify and validate the translated value of `name` for `rule`.
    pub fn parse(rule: &str, name: &str, value: &Value) -> Result<Self, OverlayError> {
        if name.ends_with(REFERENCE_SUFFIX) {
            return Ok(TranslatedAttribute::Reference);
        }

        match name {
            SUGGESTIONS => parse_keys(rule, SUGGESTIONS, value).map(TranslatedAttribute::Suggestions),
            MOSAIQUE => {
                let suggestions = value
                    .as_mapping()
                    .and_then(|mosaique| mosaique.get(SUGGESTIONS))
                    .ok_or_else(|| OverlayError::MalformedMosaique {
                        rule: rule.to_string(),
                    })?;
                parse_keys(rule, MOSAIQUE_SUGGESTIONS, suggestions).map(TranslatedAttribute::Mosaique)
            }
            _ => Ok(TranslatedAttribute::Plain(value.clone())),
        }
    }

    /// Merge this attribute into `target`, the rule's entry in the output.
    ///
    /// The new value is computed before anything is written, so an error
    /// leaves `target` as it was.
    pub fn apply(self, rule: &str, name: &str, target: &mut Value) -> Result<(), OverlayError> {
        match self {
            TranslatedAttribute::Reference => Ok(()),
            TranslatedAttribute::Plain(value) => {
                attributes_mut(rule, target)?.insert(Value::String(name.to_string()), value);
                Ok(())
            }
            TranslatedAttribute::Suggestions(keys) => {
                let base = target
                    .get(SUGGESTIONS)
                    .and_then(Value::as_mapping)
                    .ok_or_else(|| OverlayError::MissingSuggestions {
                        rule: rule.to_string(),
                        path: SUGGESTIONS.to_string(),
                    })?;
                let rebound = rebind_suggestions(rule, SUGGESTIONS, base, keys)?;
                attributes_mut(rule, target)?
                    .insert(Value::String(SUGGESTIONS.to_string()), Value::Mapping(rebound));
                Ok(())
            }
            TranslatedAttribute::Mosaique(keys) => {
                let missing = || OverlayError::MissingSuggestions {
                    rule: rule.to_string(),
                    path: MOSAIQUE_SUGGESTIONS.to_string(),
                };
                let base = target
                    .get(MOSAIQUE)
                    .and_then(|mosaique| mosaique.get(SUGGESTIONS))
                    .and_then(Value::as_mapping)
                    .ok_or_else(missing)?;
                let rebound = rebind_suggestions(rule, MOSAIQUE_SUGGESTIONS, base, keys)?;
                match target.get_mut(MOSAIQUE) {
                    Some(Value::Mapping(mosaique)) => {
                        mosaique.insert(Value::String(SUGGESTIONS.to_string()), Value::Mapping(rebound));
                        Ok(())
                    }
                    _ => Err(missing()),
                }
            }
        }
    }
}

const MOSAIQUE_SUGGESTIONS: &str = "mosaique.suggestions";

fn parse_keys(rule: &str, path: &str, value: &Value) -> Result<Vec<String>, OverlayError> {
    let items = value
        .as_sequence()
        .ok_or_else(|| OverlayError::ExpectedKeyList {
            rule: rule.to_string(),
            path: path.to_string(),
        })?;

    let mut seen = HashSet::with_capacity(items.len());
    let mut keys = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let key = scalar_key(item).ok_or_else(|| OverlayError::InvalidKey {
            rule: rule.to_string(),
            path: path.to_string(),
            index,
        })?;
        if !seen.insert(key.clone()) {
            return Err(OverlayError::DuplicateKey {
                rule: rule.to_string(),
                path: path.to_string(),
                key,
            });
        }
        keys.push(key);
    }
    Ok(keys)
}

/// Give the base suggestion values, in their order, the translated keys.
fn rebind_suggestions(
    rule: &str,
    path: &str,
    base: &Mapping,
    keys: Vec<String>,
) -> Result<Mapping, OverlayError> {
    if keys.len() != base.len() {
        return Err(OverlayError::CountMismatch {
            rule: rule.to_string(),
            path: path.to_string(),
            expected: base.len(),
            found: keys.len(),
        });
    }

    Ok(keys
        .into_iter()
        .map(Value::String)
        .zip(base.values().cloned())
        .collect())
}

/// The rule's attribute mapping, materializing one for a bare `null` rule.
fn attributes_mut<'a>(rule: &str, target: &'a mut Value) -> Result<&'a mut Mapping, OverlayError> {
    if target.is_null() {
        *target = Value::Mapping(Mapping::new());
    }
    match target {
        Value::Mapping(attributes) => Ok(attributes),
        _ => Err(OverlayError::NotAttributeMapping {
            rule: rule.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(content: &str) -> Value {
        serde_yaml::from_str(content).unwrap()
    }

    #[test]
    fn test_classifies_attributes() {
        assert_eq!(
            TranslatedAttribute::parse("r", "titre.ref", &yaml("Titre")).unwrap(),
            TranslatedAttribute::Reference
        );
        assert_eq!(
            TranslatedAttribute::parse("r", "suggestions.ref", &yaml("[a, b]")).unwrap(),
            TranslatedAttribute::Reference
        );
        assert_eq!(
            TranslatedAttribute::parse("r", "suggestions", &yaml("[low, 2]")).unwrap(),
            TranslatedAttribute::Suggestions(vec!["low".into(), "2".into()])
        );
        assert_eq!(
            TranslatedAttribute::parse("r", "mosaique", &yaml("suggestions: [p, q]\ntype: x")).unwrap(),
            TranslatedAttribute::Mosaique(vec!["p".into(), "q".into()])
        );
        assert_eq!(
            TranslatedAttribute::parse("r", "title", &yaml("Hello")).unwrap(),
            TranslatedAttribute::Plain(Value::from("Hello"))
        );
    }

    #[test]
    fn test_rejects_malformed_keys() {
        let err = TranslatedAttribute::parse("r", "suggestions", &yaml("low: 1")).unwrap_err();
        assert!(matches!(err, OverlayError::ExpectedKeyList { .. }));

        let err = TranslatedAttribute::parse("r", "suggestions", &yaml("[a, [b]]")).unwrap_err();
        assert_eq!(
            err,
            OverlayError::InvalidKey {
                rule: "r".into(),
                path: "suggestions".into(),
                index: 1
            }
        );

        let err = TranslatedAttribute::parse("r", "suggestions", &yaml("[a, a]")).unwrap_err();
        assert!(matches!(err, OverlayError::DuplicateKey { .. }));

        let err = TranslatedAttribute::parse("r", "mosaique", &yaml("[p, q]")).unwrap_err();
        assert!(matches!(err, OverlayError::MalformedMosaique { .. }));
    }

    #[test]
    fn test_failed_apply_leaves_target_untouched() {
        let mut target = yaml("suggestions:\n  a: 1\n  b: 2\n");
        let before = target.clone();

        let err = TranslatedAttribute::Suggestions(vec!["x".into()])
            .apply("r", "suggestions", &mut target)
            .unwrap_err();
        assert!(matches!(err, OverlayError::CountMismatch { expected: 2, found: 1, .. }));
        assert_eq!(target, before);

        let mut bare = Value::Null;
        let err = TranslatedAttribute::Suggestions(vec!["x".into()])
            .apply("r", "suggestions", &mut bare)
            .unwrap_err();
        assert!(matches!(err, OverlayError::MissingSuggestions { .. }));
        assert!(bare.is_null());
    }

    #[test]
    fn test_plain_on_bare_and_scalar_rules() {
        let mut bare = Value::Null;
        TranslatedAttribute::Plain(Value::from("Bonjour"))
            .apply("r", "titre", &mut bare)
            .unwrap();
        assert_eq!(bare, yaml("titre: Bonjour"));

        let mut formula = Value::from("a + b");
        let err = TranslatedAttribute::Plain(Value::from("Bonjour"))
            .apply("r", "titre", &mut formula)
            .unwrap_err();
        assert!(matches!(err, OverlayError::NotAttributeMapping { .. }));
    }
}
