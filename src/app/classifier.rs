use crate::app::matcher::{PatternError, PatternSet};
use crate::app::models::{Classification, ExcludeConfig};

/// Splits discovered tables into those whose data is skipped and those dumped in full.
#[derive(Debug, Clone)]
pub struct TableClassifier {
    patterns: PatternSet,
}

impl TableClassifier {
    pub fn new(config: &ExcludeConfig) -> Result<Self, PatternError> {
        Ok(Self {
            patterns: PatternSet::new(config)?,
        })
    }

    pub fn is_excluded(&self, table: &str) -> bool {
        self.patterns.matches(table)
    }

    /// Each occurrence lands in exactly one list; input order is kept in both.
    pub fn classify<S: AsRef<str>>(&self, tables: &[S]) -> Classification {
        let (excluded, included): (Vec<String>, Vec<String>) = tables
            .iter()
            .map(|t| t.as_ref().to_string())
            .partition(|t| self.is_excluded(t));
        Classification { excluded, included }
    }

    pub fn excluded_tables<S: AsRef<str>>(&self, tables: &[S]) -> Vec<String> {
        self.classify(tables).excluded
    }

    pub fn included_tables<S: AsRef<str>>(&self, tables: &[S]) -> Vec<String> {
        self.classify(tables).included
    }
}
