use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CategoryRule {
    pub(crate) id: String,
    pub(crate) category: String,
    pub(crate) patterns: Vec<String>,
}

impl CategoryRule {
    pub(crate) fn new(id: String, category: String, patterns: Vec<String>) -> Self {
        let patterns = patterns
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Self {
            id,
            category,
            patterns,
        }
    }
}
