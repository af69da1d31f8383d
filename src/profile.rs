//! Correction profiles: the per-dataset binding between column keys and
//! ordered rule references.
//!
//! A profile is created per loaded dataset, either supplied as a YAML file
//! or auto-generated from the first row's keys, and is mutated only through
//! the explicit add/remove operations below.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::data::Row;

/// Declared column type. Documentation for profile readers; the engine does
/// not consult it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    String,
    Number,
    Boolean,
}

/// Reference to a catalog rule plus its execution position within one
/// column's pipeline. Orders need not be contiguous; ordering is relative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleBinding {
    pub rule_id: u32,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub key: String,
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
    #[serde(default)]
    pub rules: Vec<RuleBinding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
}

impl Profile {
    /// Builds a profile from the first row's key enumeration order: one
    /// string-typed column spec per key, no rules attached. Empty input
    /// yields zero columns.
    pub fn from_rows(rows: &[Row], name: Option<&str>) -> Self {
        let columns = rows
            .first()
            .map(|first| {
                first
                    .keys()
                    .map(|key| ColumnSpec {
                        key: key.to_string(),
                        column_type: ColumnType::String,
                        rules: Vec::new(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| format!("profile_{}", Local::now().format("%Y%m%d%H%M%S")));
        Profile {
            name,
            description: "Auto-generated from dataset headers".to_string(),
            columns,
        }
    }

    pub fn column(&self, key: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|column| column.key == key)
    }

    fn column_mut(&mut self, key: &str) -> Option<&mut ColumnSpec> {
        self.columns.iter_mut().find(|column| column.key == key)
    }

    /// Appends `rule_id` at the end of the column's pipeline. No-op when the
    /// column does not exist or the rule is already bound there.
    pub fn add_rule(&mut self, column_key: &str, rule_id: u32) {
        let Some(column) = self.column_mut(column_key) else {
            return;
        };
        if column.rules.iter().any(|binding| binding.rule_id == rule_id) {
            return;
        }
        let order = column
            .rules
            .iter()
            .map(|binding| binding.order)
            .max()
            .map_or(1, |max| max + 1);
        column.rules.push(RuleBinding { rule_id, order });
    }

    /// Removes the binding for `rule_id` from the column. No-op when absent.
    /// Surviving bindings keep their `order` values; gaps are fine.
    pub fn remove_rule(&mut self, column_key: &str, rule_id: u32) {
        if let Some(column) = self.column_mut(column_key) {
            column.rules.retain(|binding| binding.rule_id != rule_id);
        }
    }

    /// Whether any column has at least one rule bound.
    pub fn has_rules(&self) -> bool {
        self.columns.iter().any(|column| !column.rules.is_empty())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Opening profile {path:?}"))?;
        let profile = serde_yaml::from_str(&raw).context("Parsing profile YAML")?;
        Ok(profile)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_yaml::to_string(self).context("Serializing profile YAML")?;
        std::fs::write(path, serialized).with_context(|| format!("Writing profile {path:?}"))
    }
}
