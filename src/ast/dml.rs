// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ast::expr::Expr;
use crate::ast::select::{
    IntoColumnList, IntoExprList, IntoProjections, Projection, SelectQuery,
};
use crate::ast::table::{Column, ColumnRef, Table, TableExpr, TableSource};
use crate::error::Error;
use crate::serialize::{SqlBuilder, Statement, StatementCtx};
use crate::typed::{IntoTyped, SqlType, TypedExpr};
use crate::types::Bool;

/// INSERT with a VALUES list or a query source, optional ON CONFLICT and
/// optional RETURNING. A RETURNING list turns the statement into a row
/// source that feeds the scanner exactly like a SELECT.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InsertStatement {
    pub(crate) table: Table,
    pub(crate) columns: Vec<ColumnRef>,
    pub(crate) source: InsertSource,
    pub(crate) on_conflict: Option<OnConflict>,
    pub(crate) returning: Vec<Projection>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub(crate) enum InsertSource {
    Unset,
    Values(Vec<Vec<Expr>>),
    Query(Box<SelectQuery>),
}

impl InsertStatement {
    pub(crate) fn new(table: Table, columns: Vec<ColumnRef>) -> Self {
        Self {
            table,
            columns,
            source: InsertSource::Unset,
            on_conflict: None,
            returning: Vec::new(),
        }
    }

    /// Appends one VALUES row. The row arity is checked against the column
    /// list at serialization time.
    #[must_use]
    pub fn values<R: IntoExprList>(mut self, row: R) -> Self {
        let row = row.into_expr_list();
        match &mut self.source {
            InsertSource::Values(rows) => rows.push(row),
            _ => self.source = InsertSource::Values(vec![row]),
        }
        self
    }

    /// Inserts the rows produced by a query instead of a VALUES list.
    #[must_use]
    pub fn query(mut self, query: impl Into<SelectQuery>) -> Self {
        self.source = InsertSource::Query(Box::new(query.into()));
        self
    }

    #[must_use]
    pub fn on_conflict(mut self, on_conflict: OnConflict) -> Self {
        self.on_conflict = Some(on_conflict);
        self
    }

    #[must_use]
    pub fn returning<P: IntoProjections>(mut self, projections: P) -> Self {
        self.returning = projections.into_projections();
        self
    }
}

impl Statement for InsertStatement {
    fn write_stmt(&self, out: &mut SqlBuilder<'_>) -> Result<(), Error> {
        out.write_word("INSERT INTO");
        self.table.write_from(out);

        if self.columns.is_empty() {
            return Err(Error::construction("INSERT has no column list"));
        }
        out.write_word("(");
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                out.write_raw(", ");
            }
            out.write_ident(&column.name);
        }
        out.write_raw(")");

        match &self.source {
            InsertSource::Unset => {
                return Err(Error::construction("INSERT has no VALUES or query source"))
            }
            InsertSource::Values(rows) => {
                out.new_line();
                out.write_word("VALUES");
                out.increase_indent();
                for (i, row) in rows.iter().enumerate() {
                    if row.len() != self.columns.len() {
                        return Err(Error::construction(format!(
                            "VALUES row has {} expressions for {} columns",
                            row.len(),
                            self.columns.len()
                        )));
                    }
                    if i > 0 {
                        out.write_raw(",");
                        out.new_line();
                    }
                    out.write_word("(");
                    for (j, item) in row.iter().enumerate() {
                        if j > 0 {
                            out.write_raw(", ");
                        }
                        item.write(out)?;
                    }
                    out.write_raw(")");
                }
                out.decrease_indent();
            }
            InsertSource::Query(query) => {
                out.new_line();
                query.write(out, StatementCtx::TopLevel)?;
            }
        }

        if let Some(on_conflict) = &self.on_conflict {
            if !out.dialect().supports_on_conflict {
                return Err(Error::serialization(format!(
                    "ON CONFLICT is not supported on {}",
                    out.dialect().name
                )));
            }
            on_conflict.write(out)?;
        }

        write_returning(&self.returning, out)
    }
}

/// The conflict clause of an INSERT: target columns plus DO NOTHING or
/// DO UPDATE SET.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OnConflict {
    pub(crate) targets: Vec<ColumnRef>,
    pub(crate) action: ConflictAction,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub(crate) enum ConflictAction {
    DoNothing,
    DoUpdate(Vec<(ColumnRef, Expr)>),
}

impl OnConflict {
    pub fn do_nothing<C: IntoColumnList>(targets: C) -> Self {
        Self {
            targets: targets.into_column_list(),
            action: ConflictAction::DoNothing,
        }
    }

    pub fn do_update<C: IntoColumnList>(targets: C) -> Self {
        Self {
            targets: targets.into_column_list(),
            action: ConflictAction::DoUpdate(Vec::new()),
        }
    }

    /// Adds one assignment to the DO UPDATE SET list.
    #[must_use]
    pub fn set<T: SqlType>(mut self, column: &Column<T>, value: impl IntoTyped<T>) -> Self {
        let assignment = (column.column_ref().clone(), value.into_typed().into_expr());
        match &mut self.action {
            ConflictAction::DoUpdate(assignments) => assignments.push(assignment),
            ConflictAction::DoNothing => {
                self.action = ConflictAction::DoUpdate(vec![assignment]);
            }
        }
        self
    }

    fn write(&self, out: &mut SqlBuilder<'_>) -> Result<(), Error> {
        out.new_line();
        out.write_word("ON CONFLICT");
        if !self.targets.is_empty() {
            out.write_word("(");
            for (i, target) in self.targets.iter().enumerate() {
                if i > 0 {
                    out.write_raw(", ");
                }
                out.write_ident(&target.name);
            }
            out.write_raw(")");
        }
        match &self.action {
            ConflictAction::DoNothing => {
                out.write_word("DO NOTHING");
                Ok(())
            }
            ConflictAction::DoUpdate(assignments) => {
                if assignments.is_empty() {
                    return Err(Error::construction("DO UPDATE has no SET assignments"));
                }
                out.write_word("DO UPDATE SET");
                write_assignment_list(assignments, out)
            }
        }
    }
}

/// UPDATE with SET assignments, optional FROM, mandatory WHERE and optional
/// RETURNING. The missing-WHERE guard exists so a chain cannot silently
/// rewrite a whole table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UpdateStatement {
    pub(crate) table: Table,
    pub(crate) assignments: Vec<(ColumnRef, Expr)>,
    pub(crate) from: Option<TableExpr>,
    pub(crate) where_: Option<Expr>,
    pub(crate) returning: Vec<Projection>,
}

impl UpdateStatement {
    pub(crate) fn new(table: Table) -> Self {
        Self {
            table,
            assignments: Vec::new(),
            from: None,
            where_: None,
            returning: Vec::new(),
        }
    }

    #[must_use]
    pub fn set<T: SqlType>(mut self, column: &Column<T>, value: impl IntoTyped<T>) -> Self {
        self.assignments
            .push((column.column_ref().clone(), value.into_typed().into_expr()));
        self
    }

    #[must_use]
    pub fn from<S: TableSource>(mut self, source: &S) -> Self {
        self.from = Some(source.as_table_expr());
        self
    }

    #[must_use]
    pub fn where_(mut self, predicate: TypedExpr<Bool>) -> Self {
        self.where_ = Some(predicate.into_expr());
        self
    }

    #[must_use]
    pub fn returning<P: IntoProjections>(mut self, projections: P) -> Self {
        self.returning = projections.into_projections();
        self
    }
}

impl Statement for UpdateStatement {
    fn write_stmt(&self, out: &mut SqlBuilder<'_>) -> Result<(), Error> {
        out.write_word("UPDATE");
        self.table.write_from(out);

        if self.assignments.is_empty() {
            return Err(Error::construction("UPDATE has no SET assignments"));
        }
        out.new_line();
        out.write_word("SET");
        write_assignment_list(&self.assignments, out)?;

        if let Some(from) = &self.from {
            out.new_line();
            out.write_word("FROM");
            out.increase_indent();
            from.write(out)?;
            out.decrease_indent();
        }

        match &self.where_ {
            None => return Err(Error::construction("UPDATE requires a WHERE clause")),
            Some(where_) => {
                out.new_line();
                out.write_word("WHERE");
                where_.write(out)?;
            }
        }

        write_returning(&self.returning, out)
    }
}

/// DELETE with optional USING, mandatory WHERE and optional RETURNING.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeleteStatement {
    pub(crate) table: Table,
    pub(crate) using: Option<TableExpr>,
    pub(crate) where_: Option<Expr>,
    pub(crate) returning: Vec<Projection>,
}

impl DeleteStatement {
    pub(crate) fn new(table: Table) -> Self {
        Self {
            table,
            using: None,
            where_: None,
            returning: Vec::new(),
        }
    }

    #[must_use]
    pub fn using<S: TableSource>(mut self, source: &S) -> Self {
        self.using = Some(source.as_table_expr());
        self
    }

    #[must_use]
    pub fn where_(mut self, predicate: TypedExpr<Bool>) -> Self {
        self.where_ = Some(predicate.into_expr());
        self
    }

    #[must_use]
    pub fn returning<P: IntoProjections>(mut self, projections: P) -> Self {
        self.returning = projections.into_projections();
        self
    }
}

impl Statement for DeleteStatement {
    fn write_stmt(&self, out: &mut SqlBuilder<'_>) -> Result<(), Error> {
        out.write_word("DELETE FROM");
        self.table.write_from(out);

        if let Some(using) = &self.using {
            out.new_line();
            out.write_word("USING");
            out.increase_indent();
            using.write(out)?;
            out.decrease_indent();
        }

        match &self.where_ {
            None => return Err(Error::construction("DELETE requires a WHERE clause")),
            Some(where_) => {
                out.new_line();
                out.write_word("WHERE");
                where_.write(out)?;
            }
        }

        write_returning(&self.returning, out)
    }
}

fn write_assignment_list(
    assignments: &[(ColumnRef, Expr)],
    out: &mut SqlBuilder<'_>,
) -> Result<(), Error> {
    out.increase_indent();
    for (i, (column, value)) in assignments.iter().enumerate() {
        if i > 0 {
            out.write_raw(",");
            out.new_line();
        }
        out.write_ident(&column.name);
        out.write_word("=");
        value.write(out)?;
    }
    out.decrease_indent();
    Ok(())
}

fn write_returning(returning: &[Projection], out: &mut SqlBuilder<'_>) -> Result<(), Error> {
    if returning.is_empty() {
        return Ok(());
    }
    if !out.dialect().supports_returning {
        return Err(Error::serialization(format!(
            "RETURNING is not supported on {}",
            out.dialect().name
        )));
    }
    out.new_line();
    out.write_word("RETURNING");
    out.increase_indent();
    for (i, projection) in returning.iter().enumerate() {
        if i > 0 {
            out.write_raw(",");
            out.new_line();
        }
        projection.write(out)?;
    }
    out.decrease_indent();
    Ok(())
}
