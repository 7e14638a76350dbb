use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::categorizer::{save_rules, RuleSet};
use crate::models::CategoryRule;
use crate::settings::{config_dir, load_settings, save_settings, settings_file_exists, shellexpand_path};

pub fn run(force: bool) -> Result<()> {
    let settings = load_settings();

    if force || !settings_file_exists() {
        save_settings(&settings)?;
        println!("Wrote settings to {}", config_dir().join("settings.json").display());
    } else {
        println!("Settings already exist in {}", config_dir().display());
    }

    let rules_path = PathBuf::from(shellexpand_path(&settings.rules_path));
    if force || !rules_path.exists() {
        save_rules(&rules_path, &starter_rules())
            .with_context(|| format!("could not write {}", rules_path.display()))?;
        println!("Wrote starter categories to {}", rules_path.display());
    } else {
        println!("Keeping existing categories in {}", rules_path.display());
    }
    Ok(())
}

fn category(label: &str, keywords: &[&str], budget: Option<f64>) -> CategoryRule {
    CategoryRule {
        label: label.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        budget_percent: budget,
    }
}

/// Common Italian spending categories to start from.
pub fn starter_rules() -> RuleSet {
    RuleSet::new(vec![
        category("Ristorazione", &["mcdonald", "ristorante", "bar", "pizzeria"], Some(10.0)),
        category("Alimentari", &["supermercato", "market", "alimentari"], Some(25.0)),
        category("Carburante", &["benzina", "carburante", "esso", "eni"], Some(10.0)),
        category("Salute", &["farmacia", "medico", "ospedale"], Some(5.0)),
        category("Abbigliamento", &["abbigliamento", "scarpe", "moda"], Some(5.0)),
        category("Utenze", &["bolletta", "utenze", "gas", "luce"], Some(15.0)),
        category("Bancarie", &["banca", "commissioni", "canone"], Some(2.0)),
        category("Stipendio", &["stipendio", "bonifico in entrata"], None),
    ])
}
