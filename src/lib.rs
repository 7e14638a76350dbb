pub mod categorizer;
pub mod cli;
pub mod error;
pub mod fmt;
pub mod importer;
pub mod models;
pub mod normalizer;
pub mod reports;
pub mod settings;

pub use categorizer::{resolve, RuleBook, RuleSet, OTHER_LABEL};
pub use error::{Result, WalletError};
pub use importer::{import_bytes, import_file, ImportOptions, InputFormat, Separator};
pub use models::{CategoryRule, Transaction};
pub use reports::{aggregate, budget_overages, Summary};
