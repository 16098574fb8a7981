//! Runs a [`CompiledPlan`] against a [`Table`]: the filter phase first,
//! in declaration order, then the projection phase over what survives.

use tracing::{debug, instrument};

use crate::ast::FilterAction;
use crate::compiler::CompiledPlan;
use crate::error::Result;
use crate::eval::{eval_bool, eval_column};
use crate::table::Table;

#[instrument(skip_all, fields(filters = plan.filters.len(), projections = plan.projections.len()))]
pub fn execute(plan: &CompiledPlan, table: &Table) -> Result<Table> {
    let mut current = table.clone();
    for action in &plan.filters {
        current = apply_filter(action, &current)?;
        debug!(height = current.height(), "applied filter action");
    }

    let mut columns = Vec::with_capacity(plan.projections.len());
    for projection in &plan.projections {
        let column = eval_column(&projection.target, &projection.expr, &current)?;
        columns.push(column);
    }
    let result = Table::from_columns(columns)?;
    debug!(height = result.height(), width = result.width(), "projection phase complete");
    Ok(result)
}

fn apply_filter(action: &FilterAction, table: &Table) -> Result<Table> {
    let height = table.height();
    match action {
        FilterAction::IncludeIf(cond) => {
            let mut mask = Vec::with_capacity(height);
            for row in 0..height {
                mask.push(eval_bool(cond, table, row)?);
            }
            Ok(table.filter_rows(&mask))
        }
        FilterAction::ExcludeIf(cond) => {
            let mut mask = Vec::with_capacity(height);
            for row in 0..height {
                mask.push(!eval_bool(cond, table, row)?);
            }
            Ok(table.filter_rows(&mask))
        }
        FilterAction::Limit(n) => {
            let mask: Vec<bool> = (0..height).map(|i| i < *n).collect();
            Ok(table.filter_rows(&mask))
        }
        FilterAction::Offset(n) => {
            let mask: Vec<bool> = (0..height).map(|i| i >= *n).collect();
            Ok(table.filter_rows(&mask))
        }
    }
}
