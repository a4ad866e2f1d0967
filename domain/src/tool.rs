//! Tool / ToolCatalog: the aggregator's (C1) output shape, handed to the
//! reasoning graph. Assembled per execution, never persisted (spec.md §3).

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters_schema: serde_json::Value,
    pub provider_tag: String,
}

/// An ordered collection of tools assembled per execution.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct ToolCatalog {
    pub tools: Vec<Tool>,
}

impl ToolCatalog {
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_catalog_reports_empty() {
        let cat = ToolCatalog::default();
        assert!(cat.is_empty());
        assert_eq!(cat.len(), 0);
    }
}
