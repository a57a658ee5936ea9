use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::analysis::error::RulesError;
use crate::analysis::profile::SkinProfile;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductRule {
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub product_classes: Vec<String>,
}

/// Static skin-type -> recommendation lookup, keyed by lowercase label.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: HashMap<String, ProductRule>,
}

impl RuleTable {
    pub fn from_rules<I, K>(rules: I) -> Self
    where
        I: IntoIterator<Item = (K, ProductRule)>,
        K: Into<String>,
    {
        let rules = rules
            .into_iter()
            .map(|(skin_type, rule)| (skin_type.into().to_lowercase(), rule))
            .collect();
        RuleTable { rules }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let parsed: HashMap<String, ProductRule> = serde_json::from_str(raw)?;
        Ok(Self::from_rules(parsed))
    }

    pub fn load(path: &Path) -> Result<Self, RulesError> {
        let raw = fs::read_to_string(path).map_err(|source| RulesError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_json(&raw).map_err(|source| RulesError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            "Loaded {} product rule(s) from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, skin_type: &str) -> Option<&ProductRule> {
        self.rules.get(&skin_type.to_lowercase())
    }

    /// Appends rule-table suggestions the model did not already make.
    pub fn merge_rules(&self, mut profile: SkinProfile) -> SkinProfile {
        let Some(rule) = self.get(&profile.skin_type) else {
            debug!("No product rule for skin_type={:?}", profile.skin_type);
            return profile;
        };

        append_missing(&mut profile.ingredients, &rule.ingredients);
        append_missing(&mut profile.product_classes, &rule.product_classes);
        profile
    }
}

fn append_missing(target: &mut Vec<String>, additions: &[String]) {
    for item in additions {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::profile::Routine;
    use crate::analysis::testing::strings;

    fn profile(skin_type: &str, ingredients: &[&str], product_classes: &[&str]) -> SkinProfile {
        SkinProfile {
            age_band: "30-39".to_string(),
            skin_type: skin_type.to_string(),
            concerns: strings(&["redness"]),
            routine: Routine::default(),
            ingredients: strings(ingredients),
            product_classes: strings(product_classes),
            warning: None,
        }
    }

    fn table() -> RuleTable {
        RuleTable::from_rules([(
            "Oily",
            ProductRule {
                ingredients: strings(&["niacinamide", "salicylic acid"]),
                product_classes: strings(&["oil-free moisturizer"]),
            },
        )])
    }

    #[test]
    fn appends_missing_entries_after_model_suggestions() {
        let merged = table().merge_rules(profile(
            "OILY",
            &["salicylic acid", "zinc"],
            &["gel cleanser"],
        ));
        assert_eq!(
            merged.ingredients,
            strings(&["salicylic acid", "zinc", "niacinamide"])
        );
        assert_eq!(
            merged.product_classes,
            strings(&["gel cleanser", "oil-free moisturizer"])
        );
        assert_eq!(merged.concerns, strings(&["redness"]));
    }

    #[test]
    fn merge_is_idempotent() {
        let rules = table();
        let once = rules.merge_rules(profile("oily", &["zinc"], &[]));
        let twice = rules.merge_rules(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_skin_type_passes_through_unchanged() {
        let original = profile("sensitive", &["ceramides", "panthenol"], &["barrier cream"]);
        let merged = table().merge_rules(original.clone());
        assert_eq!(merged, original);
    }

    #[test]
    fn parses_rule_file_with_missing_lists() {
        let rules = RuleTable::from_json(
            r#"{"Dry": {"ingredients": ["ceramides"]}, "normal": {"product_classes": ["SPF 30"]}}"#,
        )
        .unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.get("dry").unwrap().ingredients, strings(&["ceramides"]));
        assert!(rules.get("NORMAL").unwrap().ingredients.is_empty());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = RuleTable::load(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, RulesError::Read { .. }));
    }

    #[test]
    fn bundled_rule_file_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("rules/product_rules.json");
        let rules = RuleTable::load(&path).unwrap();
        assert!(rules.get("oily").is_some());
    }
}
