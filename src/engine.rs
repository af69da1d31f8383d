//! The rule application engine.
//!
//! Consumes `(rows, profile, catalog)` and produces either fully corrected
//! rows (`apply_rules_to_rows`) or rows annotated with per-column diffs
//! (`apply_rules_preview`). The engine is pure: it performs no I/O, holds no
//! state, never mutates its inputs, and yields identical output for
//! identical input. Rows are processed independently and never read across
//! one another.
//!
//! Both modes share the same resolution step: each column's bindings map to
//! catalog rules (dangling ids dropped), stable-sorted ascending by `order`
//! so equal orders keep binding insertion sequence. Resolution depends only
//! on the profile and catalog, so it runs once per column per call.
//!
//! The two modes differ in write-back timing: final application writes a
//! column's value back only after its whole pipeline ran, while preview
//! writes each individual change into the row immediately so later rules
//! (and their conditions) observe it.

use serde::Serialize;

use crate::{
    catalog::{Rule, RuleCatalog},
    data::{Row, Value},
    error::CorrectionError,
    profile::{ColumnSpec, Profile},
};

/// Net effect of one column's pipeline on one row: `old` is the value before
/// the first rule that changed it, `new` the value after the last one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnChange {
    pub column: String,
    pub old: Value,
    pub new: Value,
}

/// A corrected row together with the changes that produced it. `changes`
/// holds one entry per column that some rule actually changed, in column
/// application order.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRow {
    pub row: Row,
    pub changes: Vec<ColumnChange>,
}

impl PreviewRow {
    pub fn change_for(&self, column: &str) -> Option<&ColumnChange> {
        self.changes.iter().find(|change| change.column == column)
    }
}

fn resolve_pipeline<'a>(spec: &ColumnSpec, catalog: &'a RuleCatalog) -> Vec<&'a Rule> {
    let mut resolved: Vec<(u32, &Rule)> = spec
        .rules
        .iter()
        .filter_map(|binding| {
            catalog
                .find(binding.rule_id)
                .map(|rule| (binding.order, rule))
        })
        .collect();
    // sort_by_key is stable: equal orders keep binding insertion sequence.
    resolved.sort_by_key(|(order, _)| *order);
    resolved.into_iter().map(|(_, rule)| rule).collect()
}

fn row_error(err: CorrectionError, row: usize, column: &str) -> CorrectionError {
    CorrectionError::Row {
        row,
        column: column.to_string(),
        source: Box::new(err),
    }
}

/// Final application: returns a new set of corrected rows, inputs untouched.
///
/// Per row, columns run in profile order; each rule whose condition holds
/// against the row as corrected so far folds the column's value forward. The
/// result is written back once the column's pipeline completes, so rules
/// within one column observe the column's pre-pipeline value through the row
/// while still threading the folded value between themselves.
pub fn apply_rules_to_rows(
    rows: &[Row],
    profile: &Profile,
    catalog: &RuleCatalog,
) -> Result<Vec<Row>, CorrectionError> {
    let pipelines: Vec<Vec<&Rule>> = profile
        .columns
        .iter()
        .map(|spec| resolve_pipeline(spec, catalog))
        .collect();

    let mut corrected = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let mut out = row.clone();
        for (spec, pipeline) in profile.columns.iter().zip(&pipelines) {
            let mut value = out.get(&spec.key).cloned().unwrap_or(Value::Empty);
            for rule in pipeline {
                if !rule.applies_to(&out) {
                    continue;
                }
                value = rule
                    .transform
                    .apply(&value, &out)
                    .map_err(|err| row_error(err, index + 1, &spec.key))?;
            }
            out.set(&spec.key, value);
        }
        corrected.push(out);
    }
    Ok(corrected)
}

/// Preview: same traversal as final application, but every individual change
/// is written into the row immediately and recorded. `old` is sticky to the
/// first observed change for the column in that row; `new` always reflects
/// the latest. Rules that leave the value unchanged touch nothing.
pub fn apply_rules_preview(
    rows: &[Row],
    profile: &Profile,
    catalog: &RuleCatalog,
) -> Result<Vec<PreviewRow>, CorrectionError> {
    let pipelines: Vec<Vec<&Rule>> = profile
        .columns
        .iter()
        .map(|spec| resolve_pipeline(spec, catalog))
        .collect();

    let mut previews = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let mut out = row.clone();
        let mut changes: Vec<ColumnChange> = Vec::new();
        for (spec, pipeline) in profile.columns.iter().zip(&pipelines) {
            let mut value = out.get(&spec.key).cloned().unwrap_or(Value::Empty);
            for rule in pipeline {
                if !rule.applies_to(&out) {
                    continue;
                }
                let new_value = rule
                    .transform
                    .apply(&value, &out)
                    .map_err(|err| row_error(err, index + 1, &spec.key))?;
                if new_value != value {
                    out.set(&spec.key, new_value.clone());
                    match changes.iter_mut().find(|change| change.column == spec.key) {
                        Some(change) => change.new = new_value.clone(),
                        None => changes.push(ColumnChange {
                            column: spec.key.clone(),
                            old: value.clone(),
                            new: new_value.clone(),
                        }),
                    }
                    value = new_value;
                }
            }
        }
        previews.push(PreviewRow { row: out, changes });
    }
    Ok(previews)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Rule, Transform};
    use crate::profile::{ColumnType, RuleBinding};

    fn catalog_with(rules: Vec<Rule>) -> RuleCatalog {
        RuleCatalog::new(rules)
    }

    fn rule(id: u32, transform: Transform) -> Rule {
        Rule {
            id,
            description: format!("rule {id}"),
            condition: None,
            transform,
        }
    }

    fn column(key: &str, bindings: &[(u32, u32)]) -> ColumnSpec {
        ColumnSpec {
            key: key.to_string(),
            column_type: ColumnType::String,
            rules: bindings
                .iter()
                .map(|&(rule_id, order)| RuleBinding { rule_id, order })
                .collect(),
        }
    }

    fn profile_with(columns: Vec<ColumnSpec>) -> Profile {
        Profile {
            name: "test".to_string(),
            description: String::new(),
            columns,
        }
    }

    fn row(cells: &[(&str, Value)]) -> Row {
        cells
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn resolution_drops_dangling_ids_and_sorts_by_order() {
        let catalog = catalog_with(vec![
            rule(1, Transform::Trim),
            rule(2, Transform::Lowercase),
        ]);
        // Binding order 5 before order 2; id 99 is dangling.
        let spec = column("name", &[(1, 5), (99, 1), (2, 2)]);
        let pipeline = resolve_pipeline(&spec, &catalog);
        let ids: Vec<u32> = pipeline.iter().map(|rule| rule.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn equal_orders_keep_binding_insertion_sequence() {
        let catalog = catalog_with(vec![
            rule(7, Transform::Trim),
            rule(8, Transform::Lowercase),
            rule(9, Transform::Uppercase),
        ]);
        let spec = column("name", &[(9, 1), (7, 1), (8, 1)]);
        let ids: Vec<u32> = resolve_pipeline(&spec, &catalog)
            .iter()
            .map(|rule| rule.id)
            .collect();
        assert_eq!(ids, vec![9, 7, 8]);
    }

    #[test]
    fn apply_writes_missing_column_back_as_empty() {
        let catalog = catalog_with(vec![rule(1, Transform::Trim)]);
        let profile = profile_with(vec![column("ghost", &[(1, 1)])]);
        let rows = vec![row(&[("present", Value::Integer(1))])];
        let corrected = apply_rules_to_rows(&rows, &profile, &catalog).unwrap();
        assert_eq!(corrected[0].get("ghost"), Some(&Value::Empty));
        // Preview only writes on change, so the cell stays absent there.
        let previews = apply_rules_preview(&rows, &profile, &catalog).unwrap();
        assert_eq!(previews[0].row.get("ghost"), None);
    }

    #[test]
    fn apply_defers_column_write_until_pipeline_end() {
        // Both rules guard on the same column being blank. During final
        // application the row is only updated after the pipeline, so the
        // second rule still sees the original blank cell and overwrites the
        // first rule's fill.
        let catalog = catalog_with(vec![
            Rule {
                id: 1,
                description: "fill yes".into(),
                condition: Some(crate::catalog::Condition::ColumnBlank {
                    column: "status".into(),
                }),
                transform: Transform::SetValue {
                    value: Value::String("Yes".into()),
                },
            },
            Rule {
                id: 2,
                description: "fill no".into(),
                condition: Some(crate::catalog::Condition::ColumnBlank {
                    column: "status".into(),
                }),
                transform: Transform::SetValue {
                    value: Value::String("No".into()),
                },
            },
        ]);
        let profile = profile_with(vec![column("status", &[(1, 1), (2, 2)])]);
        let rows = vec![row(&[("status", Value::Empty)])];

        let corrected = apply_rules_to_rows(&rows, &profile, &catalog).unwrap();
        assert_eq!(corrected[0].get("status"), Some(&Value::String("No".into())));

        let previews = apply_rules_preview(&rows, &profile, &catalog).unwrap();
        assert_eq!(
            previews[0].row.get("status"),
            Some(&Value::String("Yes".into()))
        );
    }

    #[test]
    fn later_columns_observe_earlier_corrections() {
        let catalog = catalog_with(vec![
            rule(1, Transform::NormalizeNumber),
            Rule {
                id: 2,
                description: "flag when source filled".into(),
                condition: Some(crate::catalog::Condition::ColumnPresent {
                    column: "amount".into(),
                }),
                transform: Transform::FillFrom {
                    column: "amount".into(),
                },
            },
        ]);
        let profile = profile_with(vec![
            column("amount", &[(1, 1)]),
            column("copy", &[(2, 1)]),
        ]);
        let rows = vec![row(&[
            ("amount", Value::String("2,5".into())),
            ("copy", Value::Empty),
        ])];
        let corrected = apply_rules_to_rows(&rows, &profile, &catalog).unwrap();
        assert_eq!(corrected[0].get("copy"), Some(&Value::Float(2.5)));
    }

    #[test]
    fn preview_brackets_net_effect_with_sticky_old() {
        let catalog = catalog_with(vec![
            rule(1, Transform::NormalizeNumber),
            rule(2, Transform::RoundToInteger),
        ]);
        let profile = profile_with(vec![column("avg", &[(1, 1), (2, 2)])]);
        let rows = vec![row(&[("avg", Value::String("3,7".into()))])];
        let previews = apply_rules_preview(&rows, &profile, &catalog).unwrap();

        let change = previews[0].change_for("avg").expect("diff entry");
        assert_eq!(change.old, Value::String("3,7".into()));
        assert_eq!(change.new, Value::Integer(4));
        assert_eq!(previews[0].row.get("avg"), Some(&Value::Integer(4)));
        assert_eq!(previews[0].changes.len(), 1);
    }

    #[test]
    fn unchanged_values_produce_no_diff_entries() {
        let catalog = catalog_with(vec![rule(3, Transform::Trim)]);
        let profile = profile_with(vec![column("name", &[(3, 1)])]);
        let rows = vec![row(&[("name", Value::String("clean".into()))])];
        let previews = apply_rules_preview(&rows, &profile, &catalog).unwrap();
        assert!(previews[0].changes.is_empty());
    }

    #[test]
    fn transform_errors_carry_row_and_column_context() {
        let catalog = catalog_with(vec![rule(
            1,
            Transform::ReplacePattern {
                pattern: "(".into(),
                replacement: String::new(),
            },
        )]);
        let profile = profile_with(vec![column("name", &[(1, 1)])]);
        let rows = vec![
            row(&[("name", Value::String("first".into()))]),
            row(&[("name", Value::String("second".into()))]),
        ];
        let err = apply_rules_to_rows(&rows, &profile, &catalog).unwrap_err();
        match err {
            CorrectionError::Row { row, column, .. } => {
                assert_eq!(row, 1);
                assert_eq!(column, "name");
            }
            other => panic!("expected row context, got {other}"),
        }
    }
}
