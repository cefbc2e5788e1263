use super::attribute::TranslatedAttribute;
use super::translation::Translation;
use crate::errors::OverlayError;
use crate::rules::types::{RuleSet, scalar_key};
use serde::Serialize;
use serde_yaml::Value;

/// How strictly a translation is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayOptions {
    /// Skip attributes that fail validation, keeping their base value.
    pub lenient: bool,
    /// Drop translations of rules the base rule set does not define.
    pub prune_unknown_rules: bool,
}

/// What an overlay did to the base rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverlayStats {
    pub rules_translated: usize,
    pub attributes_applied: usize,
    pub references_skipped: usize,
    pub attributes_skipped: usize,
    pub unknown_rules_pruned: usize,
}

/// A translated rule set together with its statistics.
#[derive(Debug, Clone)]
pub struct Overlaid {
    pub rules: RuleSet,
    pub stats: OverlayStats,
}

/// Apply `translation` onto `base` with strict validation.
///
/// `base` is never modified; the result differs from it only at the
/// translated attribute paths.
pub fn apply_overlay(base: &RuleSet, translation: &Translation) -> Result<RuleSet, OverlayError> {
    apply_overlay_with(base, translation, OverlayOptions::default()).map(|overlaid| overlaid.rules)
}

pub fn apply_overlay_with(
    base: &RuleSet,
    translation: &Translation,
    options: OverlayOptions,
) -> Result<Overlaid, OverlayError> {
    let mut rules = base.clone();
    let mut stats = OverlayStats::default();

    // Lenient mode downgrades a structural error to a warning for that entry.
    let tolerate = |error: OverlayError, stats: &mut OverlayStats| {
        if options.lenient {
            tracing::warn!(rule = error.rule(), "Keeping untranslated value: {error}");
            stats.attributes_skipped += 1;
            Ok(())
        } else {
            Err(error)
        }
    };

    for (rule_key, attributes) in translation.entries() {
        let Some(rule) = scalar_key(rule_key) else {
            tolerate(
                OverlayError::InvalidEntry {
                    rule: format!("{rule_key:?}"),
                },
                &mut stats,
            )?;
            continue;
        };

        let Some(target) = rules.get_mut(&rule) else {
            if options.prune_unknown_rules {
                tracing::warn!("Dropping translation of unknown rule '{rule}'");
                stats.unknown_rules_pruned += 1;
                continue;
            }
            return Err(OverlayError::UnknownRule { rule });
        };

        let attributes = match attributes {
            Value::Mapping(attributes) => attributes,
            Value::Null => continue,
            _ => {
                tolerate(OverlayError::InvalidEntry { rule: rule.clone() }, &mut stats)?;
                continue;
            }
        };

        let mut touched = false;
        for (attribute_key, value) in attributes {
            let Some(name) = scalar_key(attribute_key) else {
                tolerate(OverlayError::InvalidEntry { rule: rule.clone() }, &mut stats)?;
                continue;
            };

            let applied = TranslatedAttribute::parse(&rule, &name, value).and_then(|attribute| {
                let is_reference = matches!(attribute, TranslatedAttribute::Reference);
                attribute.apply(&rule, &name, target).map(|()| is_reference)
            });

            match applied {
                Ok(true) => stats.references_skipped += 1,
                Ok(false) => {
                    stats.attributes_applied += 1;
                    touched = true;
                }
                Err(error) => tolerate(error, &mut stats)?,
            }
        }

        if touched {
            stats.rules_translated += 1;
        }
    }

    tracing::debug!(
        "Translated {} attributes across {} rules ({} references skipped)",
        stats.attributes_applied,
        stats.rules_translated,
        stats.references_skipped
    );
    Ok(Overlaid { rules, stats })
}
