use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, WalletError};
use crate::models::CategoryRule;

/// Label for expenses that no rule claims.
pub const OTHER_LABEL: &str = "Other";

/// Ordered category rules, shaped like `categories.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub categories: Vec<CategoryRule>,
}

impl RuleSet {
    /// Keywords are trimmed and lowercased; blanks and repeats are dropped.
    pub fn new(categories: Vec<CategoryRule>) -> Self {
        let categories = categories
            .into_iter()
            .map(|mut rule| {
                let mut keywords: Vec<String> = Vec::with_capacity(rule.keywords.len());
                for kw in rule.keywords.drain(..) {
                    let kw = kw.trim().to_lowercase();
                    if !kw.is_empty() && !keywords.contains(&kw) {
                        keywords.push(kw);
                    }
                }
                rule.label = rule.label.trim().to_string();
                rule.keywords = keywords;
                rule
            })
            .collect();
        Self { categories }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RuleSet = serde_json::from_str(json)
            .map_err(|e| WalletError::Other(format!("Invalid category configuration: {e}")))?;
        Ok(Self::new(raw.categories))
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn get(&self, label: &str) -> Option<&CategoryRule> {
        self.categories.iter().find(|r| r.label == label)
    }

    /// Sum of all configured budget percentages.
    pub fn budget_total(&self) -> f64 {
        self.categories.iter().filter_map(|r| r.budget_percent).sum()
    }

    /// True when the budgets hand out more than the whole reference budget.
    pub fn budget_overcommitted(&self) -> bool {
        self.budget_total() > 100.0
    }
}

fn matches(description: &str, keyword: &str) -> bool {
    let keyword = keyword.trim();
    !keyword.is_empty() && description.contains(&keyword.to_lowercase())
}

/// First rule (in order) with a keyword contained in `description` wins.
pub fn resolve<'a>(description: &str, rules: &'a RuleSet) -> &'a str {
    let desc_lower = description.to_lowercase();
    for rule in &rules.categories {
        if rule.keywords.iter().any(|kw| matches(&desc_lower, kw)) {
            return &rule.label;
        }
    }
    OTHER_LABEL
}

/// Load `categories.json`. A missing or malformed file gives an empty rule set,
/// so every expense falls into [`OTHER_LABEL`].
pub fn load_rules(path: &Path) -> RuleSet {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "category configuration not readable, using no rules");
            return RuleSet::default();
        }
    };
    match RuleSet::from_json(&content) {
        Ok(rules) => {
            debug!(path = %path.display(), rules = rules.len(), "loaded category rules");
            rules
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "category configuration malformed, using no rules");
            RuleSet::default()
        }
    }
}

pub fn save_rules(path: &Path, rules: &RuleSet) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(rules)
        .map_err(|e| WalletError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// RuleBook: the current rule set, swappable on reload
// ---------------------------------------------------------------------------

/// Holds the active [`RuleSet`]. Readers take an `Arc` snapshot; a reload
/// replaces the reference, so a running aggregation keeps the rules it started with.
pub struct RuleBook {
    source: Option<PathBuf>,
    current: RwLock<Arc<RuleSet>>,
}

impl RuleBook {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            source: None,
            current: RwLock::new(Arc::new(rules)),
        }
    }

    pub fn load(path: &Path) -> Self {
        Self {
            source: Some(path.to_path_buf()),
            current: RwLock::new(Arc::new(load_rules(path))),
        }
    }

    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, rules: RuleSet) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(rules);
    }

    /// Re-read the backing file, if any, and return the new snapshot.
    pub fn reload(&self) -> Arc<RuleSet> {
        if let Some(path) = &self.source {
            self.replace(load_rules(path));
        }
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(label: &str, keywords: &[&str]) -> CategoryRule {
        CategoryRule {
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            budget_percent: None,
        }
    }

    fn sample_rules() -> RuleSet {
        RuleSet::new(vec![
            rule("Ristorazione", &["mcdonald", "pizzeria", "bar"]),
            rule("Carburante", &["benzina", "eni"]),
            rule("Alimentari", &["supermercato", "market"]),
        ])
    }

    #[test]
    fn test_contains_rule() {
        let rules = sample_rules();
        assert_eq!(
            resolve("spesa pagobancomat - carta *3579-mcdonald's", &rules),
            "Ristorazione"
        );
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let rules = sample_rules();
        assert_eq!(resolve("SUPERMERCATO CONAD", &rules), "Alimentari");
        let raw = RuleSet {
            categories: vec![rule("Salute", &["FARMACIA"])],
        };
        assert_eq!(resolve("Farmacia Centrale", &raw), "Salute");
    }

    #[test]
    fn test_first_rule_wins_on_overlap() {
        // "bar" (Ristorazione) and "market" (Alimentari) both occur.
        let rules = sample_rules();
        assert_eq!(resolve("minimarket del bar", &rules), "Ristorazione");

        let reordered = RuleSet::new(vec![
            rule("Alimentari", &["market"]),
            rule("Ristorazione", &["bar"]),
        ]);
        assert_eq!(resolve("minimarket del bar", &reordered), "Alimentari");
    }

    #[test]
    fn test_unmatched_is_other() {
        assert_eq!(resolve("bonifico a mario rossi", &sample_rules()), OTHER_LABEL);
        assert_eq!(resolve("anything", &RuleSet::default()), OTHER_LABEL);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let rules = sample_rules();
        let first = resolve("rifornimento eni station", &rules).to_string();
        for _ in 0..10 {
            assert_eq!(resolve("rifornimento eni station", &rules), first);
        }
    }

    #[test]
    fn test_new_normalizes_keywords() {
        let rules = RuleSet::new(vec![rule(" Casa ", &[" Affitto ", "affitto", "", "   ", "IKEA"])]);
        assert_eq!(rules.categories[0].label, "Casa");
        assert_eq!(rules.categories[0].keywords, vec!["affitto", "ikea"]);
        // a blank keyword must not match everything
        assert_eq!(resolve("stipendio", &rules), OTHER_LABEL);
    }

    #[test]
    fn test_blank_keyword_never_matches_unnormalized_rules() {
        let raw: RuleSet = serde_json::from_str(
            r#"{"categories": [{"label": "Tutto", "keywords": [" ", ""]}, {"label": "Bar", "keywords": [" bar "]}]}"#,
        )
        .unwrap();
        assert_eq!(resolve("bonifico a mario rossi", &raw), OTHER_LABEL);
        assert_eq!(resolve("Bar Sport", &raw), "Bar");
    }

    #[test]
    fn test_from_json_reads_budget() {
        let json = r#"{"categories": [
            {"label": "Ristorazione", "keywords": ["mcdonald"], "budget": 10},
            {"label": "Salute", "keywords": ["farmacia"]}
        ]}"#;
        let rules = RuleSet::from_json(json).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.get("Ristorazione").unwrap().budget_percent, Some(10.0));
        assert_eq!(rules.get("Salute").unwrap().budget_percent, None);
        assert_eq!(rules.budget_total(), 10.0);
        assert!(!rules.budget_overcommitted());
    }

    #[test]
    fn test_budget_overcommitted() {
        let json = r#"{"categories": [
            {"label": "A", "keywords": ["a"], "budget": 60},
            {"label": "B", "keywords": ["b"], "budget": 45}
        ]}"#;
        let rules = RuleSet::from_json(json).unwrap();
        assert_eq!(rules.budget_total(), 105.0);
        assert!(rules.budget_overcommitted());
    }

    #[test]
    fn test_load_rules_degrades_gracefully() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_rules(&dir.path().join("missing.json")).is_empty());

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(load_rules(&broken).is_empty());

        let wrong_shape = dir.path().join("wrong.json");
        std::fs::write(&wrong_shape, r#"{"categories": "nope"}"#).unwrap();
        assert!(load_rules(&wrong_shape).is_empty());

        let no_categories = dir.path().join("empty.json");
        std::fs::write(&no_categories, "{}").unwrap();
        assert!(load_rules(&no_categories).is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("categories.json");
        save_rules(&path, &sample_rules()).unwrap();
        assert_eq!(load_rules(&path), sample_rules());
    }

    #[test]
    fn test_rule_book_reload_keeps_old_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categories.json");
        std::fs::write(&path, r#"{"categories": [{"label": "Bar", "keywords": ["bar"]}]}"#).unwrap();

        let book = RuleBook::load(&path);
        let before = book.snapshot();
        assert_eq!(resolve("bar sport", &before), "Bar");

        std::fs::write(&path, r#"{"categories": [{"label": "Svago", "keywords": ["bar"]}]}"#).unwrap();
        let after = book.reload();

        assert_eq!(resolve("bar sport", &before), "Bar");
        assert_eq!(resolve("bar sport", &after), "Svago");
        assert_eq!(resolve("bar sport", &book.snapshot()), "Svago");
    }

    #[test]
    fn test_rule_book_replace() {
        let book = RuleBook::new(RuleSet::default());
        assert!(book.snapshot().is_empty());
        book.replace(sample_rules());
        assert_eq!(book.snapshot().len(), 3);
        // no backing file: reload keeps the current rules
        assert_eq!(book.reload().len(), 3);
    }
}
