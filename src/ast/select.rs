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

use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ast::expr::Expr;
use crate::ast::set::SetStatement;
use crate::ast::table::{Column, ColumnRef, ColumnSource, DerivedTable, Table, TableExpr, TableSource};
use crate::ast::value::Value;
use crate::error::Error;
use crate::serialize::{SqlBuilder, Statement, StatementCtx};
use crate::typed::{SqlType, TypedExpr};
use crate::types::Bool;

/// One item of a projection list: an expression with an optional alias.
/// Plain column projections label themselves with the canonical
/// `"Table.Column"` string the scanner keys on.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Projection {
    pub(crate) expr: Expr,
    pub(crate) alias: Option<String>,
}

impl Projection {
    pub(crate) fn column(r: ColumnRef) -> Self {
        Projection {
            expr: Expr::Column(r),
            alias: None,
        }
    }

    pub(crate) fn aliased(expr: Expr, alias: impl Into<String>) -> Self {
        Projection {
            expr,
            alias: Some(alias.into()),
        }
    }

    pub(crate) fn unnamed(expr: Expr) -> Self {
        Projection { expr, alias: None }
    }

    /// The output label, when the projection produces one.
    pub fn label(&self) -> Option<String> {
        if let Some(alias) = &self.alias {
            return Some(alias.clone());
        }
        match &self.expr {
            Expr::Column(column) => Some(column.label()),
            _ => None,
        }
    }

    pub(crate) fn write(&self, out: &mut SqlBuilder<'_>) -> Result<(), Error> {
        match (&self.expr, &self.alias) {
            (Expr::Column(column), None) => column.write_projection(out),
            (expr, Some(alias)) => {
                match expr {
                    Expr::Column(column) => column.write_qualified(out)?,
                    other => other.write(out)?,
                }
                out.write_word("AS");
                out.write_ident(alias);
                Ok(())
            }
            (expr, None) => expr.write(out),
        }
    }
}

/// An ORDER BY item: an expression with optional direction and NULLS
/// placement.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderByExpr {
    pub(crate) expr: Expr,
    pub(crate) asc: Option<bool>,
    pub(crate) nulls_first: Option<bool>,
}

impl OrderByExpr {
    pub(crate) fn plain(expr: Expr) -> Self {
        Self {
            expr,
            asc: None,
            nulls_first: None,
        }
    }

    pub(crate) fn ascending(expr: Expr) -> Self {
        Self {
            expr,
            asc: Some(true),
            nulls_first: None,
        }
    }

    pub(crate) fn descending(expr: Expr) -> Self {
        Self {
            expr,
            asc: Some(false),
            nulls_first: None,
        }
    }

    #[must_use]
    pub fn nulls_first(mut self) -> Self {
        self.nulls_first = Some(true);
        self
    }

    #[must_use]
    pub fn nulls_last(mut self) -> Self {
        self.nulls_first = Some(false);
        self
    }

    /// `label_form` makes column items render as their quoted projection
    /// label — the only name a combined set-statement result understands.
    pub(crate) fn write(&self, out: &mut SqlBuilder<'_>, label_form: bool) -> Result<(), Error> {
        match (&self.expr, label_form) {
            (Expr::Column(column), true) => column.write_label(out)?,
            (expr, _) => expr.write(out)?,
        }
        match self.asc {
            Some(true) => out.write_word("ASC"),
            Some(false) => out.write_word("DESC"),
            None => {}
        }
        match self.nulls_first {
            Some(true) => out.write_word("NULLS FIRST"),
            Some(false) => out.write_word("NULLS LAST"),
            None => {}
        }
        Ok(())
    }
}

/// `FOR UPDATE` / `FOR SHARE`, with optional `NOWAIT` / `SKIP LOCKED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RowLock {
    pub(crate) kind: LockKind,
    pub(crate) wait: Option<LockWait>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LockKind {
    Update,
    Share,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LockWait {
    NoWait,
    SkipLocked,
}

impl RowLock {
    fn write(&self, out: &mut SqlBuilder<'_>) {
        out.write_word(match self.kind {
            LockKind::Update => "FOR UPDATE",
            LockKind::Share => "FOR SHARE",
        });
        match self.wait {
            Some(LockWait::NoWait) => out.write_word("NOWAIT"),
            Some(LockWait::SkipLocked) => out.write_word("SKIP LOCKED"),
            None => {}
        }
    }
}

/// A common table expression: `name [(columns)] AS (query)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cte {
    pub(crate) name: String,
    pub(crate) columns: Vec<String>,
    pub(crate) query: Box<SelectQuery>,
    pub(crate) labels: Vec<String>,
}

/// Starts a CTE from a select or set statement.
pub fn cte(name: impl Into<String>, query: impl Into<SelectQuery>) -> Cte {
    let query = query.into();
    let labels = query.projection_labels().into_iter().flatten().collect();
    Cte {
        name: name.into(),
        columns: Vec::new(),
        query: Box::new(query),
        labels,
    }
}

impl Cte {
    /// Overrides the column names the CTE exposes.
    #[must_use]
    pub fn columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    /// A table handle addressing this CTE in a FROM clause.
    pub fn table(&self) -> Table {
        Table::unqualified(&self.name)
    }

    fn write(&self, out: &mut SqlBuilder<'_>) -> Result<(), Error> {
        out.write_ident(&self.name);
        if !self.columns.is_empty() {
            out.write_word("(");
            for (i, column) in self.columns.iter().enumerate() {
                if i > 0 {
                    out.write_raw(", ");
                }
                out.write_ident(column);
            }
            out.write_raw(")");
        }
        out.write_word("AS");
        self.query.write(out, StatementCtx::Nested)
    }
}

impl ColumnSource for Cte {
    fn source_alias(&self) -> &str {
        &self.name
    }

    fn projects_label(&self, label: &str) -> bool {
        if !self.columns.is_empty() {
            return self.columns.iter().any(|c| c == label);
        }
        self.labels.iter().any(|l| l == label)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct With {
    pub(crate) recursive: bool,
    pub(crate) ctes: Vec<Cte>,
}

impl With {
    fn write(&self, out: &mut SqlBuilder<'_>) -> Result<(), Error> {
        out.write_word("WITH");
        if self.recursive {
            out.write_word("RECURSIVE");
        }
        for (i, cte) in self.ctes.iter().enumerate() {
            if i > 0 {
                out.write_raw(",");
                out.new_line();
            }
            cte.write(out)?;
        }
        Ok(())
    }
}

/// The WITH prefix of a statement under construction.
#[derive(Debug, Clone)]
pub struct WithClause(With);

pub fn with(ctes: impl Into<Vec<Cte>>) -> WithClause {
    WithClause(With {
        recursive: false,
        ctes: ctes.into(),
    })
}

pub fn with_recursive(ctes: impl Into<Vec<Cte>>) -> WithClause {
    WithClause(With {
        recursive: true,
        ctes: ctes.into(),
    })
}

impl WithClause {
    pub fn select<P: IntoProjections>(self, projections: P) -> SelectStatement {
        let mut statement = select(projections);
        statement.with = Some(self.0);
        statement
    }
}

/// A SELECT statement or a set statement — the two row-producing query
/// forms that can serve as a sub-query, CTE body or derived table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SelectQuery {
    Select(Box<SelectStatement>),
    Set(Box<SetStatement>),
}

impl SelectQuery {
    pub(crate) fn write(&self, out: &mut SqlBuilder<'_>, ctx: StatementCtx) -> Result<(), Error> {
        match self {
            SelectQuery::Select(statement) => statement.write(out, ctx),
            SelectQuery::Set(statement) => statement.write(out, ctx),
        }
    }

    pub(crate) fn projection_labels(&self) -> Vec<Option<String>> {
        match self {
            SelectQuery::Select(statement) => statement.projection_labels(),
            SelectQuery::Set(statement) => statement.projection_labels(),
        }
    }
}

impl From<SelectStatement> for SelectQuery {
    fn from(statement: SelectStatement) -> Self {
        SelectQuery::Select(Box::new(statement))
    }
}

impl From<SetStatement> for SelectQuery {
    fn from(statement: SetStatement) -> Self {
        SelectQuery::Set(Box::new(statement))
    }
}

/// A SELECT statement under construction. Every builder method takes the
/// statement by value and returns a fresh one; nothing validates until
/// serialization, which keeps chains fluent and composable.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SelectStatement {
    pub(crate) with: Option<With>,
    pub(crate) distinct: Option<DistinctClause>,
    pub(crate) projections: Vec<Projection>,
    pub(crate) from: Option<TableExpr>,
    pub(crate) where_: Option<Expr>,
    pub(crate) group_by: Vec<Expr>,
    pub(crate) having: Option<Expr>,
    pub(crate) order_by: Vec<OrderByExpr>,
    pub(crate) limit: Option<i64>,
    pub(crate) offset: Option<i64>,
    pub(crate) lock: Option<RowLock>,
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DistinctClause {
    pub(crate) on: Vec<Expr>,
}

/// The free-standing SELECT form; pair it with [`SelectStatement::from`]
/// for table access. Table-first construction goes through
/// [`TableSource::select`].
pub fn select<P: IntoProjections>(projections: P) -> SelectStatement {
    SelectStatement {
        with: None,
        distinct: None,
        projections: projections.into_projections(),
        from: None,
        where_: None,
        group_by: Vec::new(),
        having: None,
        order_by: Vec::new(),
        limit: None,
        offset: None,
        lock: None,
    }
}

impl SelectStatement {
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
    pub fn distinct(mut self) -> Self {
        self.distinct = Some(DistinctClause::default());
        self
    }

    /// PostgreSQL `DISTINCT ON (exprs)`; other dialects refuse it at
    /// serialization time.
    #[must_use]
    pub fn distinct_on<E: IntoExprList>(mut self, exprs: E) -> Self {
        self.distinct = Some(DistinctClause {
            on: exprs.into_expr_list(),
        });
        self
    }

    #[must_use]
    pub fn group_by<E: IntoExprList>(mut self, exprs: E) -> Self {
        self.group_by.extend(exprs.into_expr_list());
        self
    }

    #[must_use]
    pub fn having(mut self, predicate: TypedExpr<Bool>) -> Self {
        self.having = Some(predicate.into_expr());
        self
    }

    #[must_use]
    pub fn order_by<O: IntoOrderBy>(mut self, order: O) -> Self {
        self.order_by.extend(order.into_order_by());
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn for_update(mut self) -> Self {
        self.lock = Some(RowLock {
            kind: LockKind::Update,
            wait: None,
        });
        self
    }

    #[must_use]
    pub fn for_share(mut self) -> Self {
        self.lock = Some(RowLock {
            kind: LockKind::Share,
            wait: None,
        });
        self
    }

    /// Applies to the row lock set by `for_update`/`for_share`.
    #[must_use]
    pub fn nowait(mut self) -> Self {
        if let Some(lock) = &mut self.lock {
            lock.wait = Some(LockWait::NoWait);
        }
        self
    }

    #[must_use]
    pub fn skip_locked(mut self) -> Self {
        if let Some(lock) = &mut self.lock {
            lock.wait = Some(LockWait::SkipLocked);
        }
        self
    }

    /// Turns this statement into a derived table whose projection labels
    /// become addressable columns.
    pub fn as_table(self, alias: impl Into<String>) -> DerivedTable {
        DerivedTable::new(SelectQuery::from(self), alias)
    }

    /// Uses this statement as a scalar sub-query expression. The caller
    /// asserts the type tag of its single projection.
    pub fn as_scalar<T: SqlType>(self) -> TypedExpr<T> {
        TypedExpr::new(Expr::Subquery(Box::new(SelectQuery::from(self))))
    }

    pub(crate) fn projection_labels(&self) -> Vec<Option<String>> {
        self.projections.iter().map(Projection::label).collect()
    }

    pub(crate) fn write(&self, out: &mut SqlBuilder<'_>, ctx: StatementCtx) -> Result<(), Error> {
        if ctx == StatementCtx::Nested {
            out.write_word("(");
            out.increase_indent();
            out.new_line();
        }
        self.write_body(out)?;
        if ctx == StatementCtx::Nested {
            out.decrease_indent();
            out.new_line();
            out.write_raw(")");
        }
        Ok(())
    }

    fn write_body(&self, out: &mut SqlBuilder<'_>) -> Result<(), Error> {
        if let Some(with) = &self.with {
            with.write(out)?;
            out.new_line();
        }

        if self.projections.is_empty() {
            return Err(Error::construction("projection list is empty"));
        }
        let mut seen = HashSet::new();
        for label in self.projection_labels().into_iter().flatten() {
            if !seen.insert(label.clone()) {
                return Err(Error::construction(format!(
                    "duplicate projection label \"{}\"",
                    label
                )));
            }
        }

        out.write_word("SELECT");
        if let Some(distinct) = &self.distinct {
            out.write_word("DISTINCT");
            if !distinct.on.is_empty() {
                if !out.dialect().supports_distinct_on {
                    return Err(Error::serialization(format!(
                        "DISTINCT ON is not supported on {}",
                        out.dialect().name
                    )));
                }
                out.write_word("ON");
                out.write_word("(");
                for (i, expr) in distinct.on.iter().enumerate() {
                    if i > 0 {
                        out.write_raw(", ");
                    }
                    expr.write(out)?;
                }
                out.write_raw(")");
            }
        }

        out.increase_indent();
        for (i, projection) in self.projections.iter().enumerate() {
            if i > 0 {
                out.write_raw(",");
                out.new_line();
            }
            projection.write(out)?;
        }
        out.decrease_indent();

        if let Some(from) = &self.from {
            out.new_line();
            out.write_word("FROM");
            out.increase_indent();
            from.write(out)?;
            out.decrease_indent();
        }

        if let Some(where_) = &self.where_ {
            out.new_line();
            out.write_word("WHERE");
            where_.write(out)?;
        }

        if !self.group_by.is_empty() {
            out.new_line();
            out.write_word("GROUP BY");
            for (i, expr) in self.group_by.iter().enumerate() {
                if i > 0 {
                    out.write_raw(", ");
                }
                expr.write(out)?;
            }
        }

        if let Some(having) = &self.having {
            out.new_line();
            out.write_word("HAVING");
            having.write(out)?;
        }

        if !self.order_by.is_empty() {
            out.new_line();
            out.write_word("ORDER BY");
            for (i, order) in self.order_by.iter().enumerate() {
                if i > 0 {
                    out.write_raw(", ");
                }
                order.write(out, false)?;
            }
        }

        write_limit_offset(self.limit, self.offset, out)?;

        if let Some(lock) = &self.lock {
            if !out.dialect().supports_row_locks {
                return Err(Error::serialization(format!(
                    "row locks are not supported on {}",
                    out.dialect().name
                )));
            }
            out.new_line();
            lock.write(out);
        }

        Ok(())
    }
}

/// LIMIT and OFFSET render as parameterized arguments. `None` is the unset
/// sentinel; zero is a real bound.
pub(crate) fn write_limit_offset(
    limit: Option<i64>,
    offset: Option<i64>,
    out: &mut SqlBuilder<'_>,
) -> Result<(), Error> {
    if offset.is_some() && limit.is_none() && out.dialect().offset_requires_limit {
        return Err(Error::serialization(format!(
            "OFFSET requires LIMIT on {}",
            out.dialect().name
        )));
    }
    if let Some(limit) = limit {
        out.new_line();
        out.write_word("LIMIT");
        out.push_arg(Value::Int(limit));
    }
    if let Some(offset) = offset {
        out.new_line();
        out.write_word("OFFSET");
        out.push_arg(Value::Int(offset));
    }
    Ok(())
}

impl Statement for SelectStatement {
    fn write_stmt(&self, out: &mut SqlBuilder<'_>) -> Result<(), Error> {
        self.write(out, StatementCtx::TopLevel)
    }
}

/// Conversion into a projection list: single columns, typed expressions,
/// ready-made projections, vectors of them, and tuples mixing all of the
/// above.
pub trait IntoProjections {
    fn into_projections(self) -> Vec<Projection>;
}

impl IntoProjections for Projection {
    fn into_projections(self) -> Vec<Projection> {
        vec![self]
    }
}

impl IntoProjections for Vec<Projection> {
    fn into_projections(self) -> Vec<Projection> {
        self
    }
}

impl<T: SqlType> IntoProjections for &Column<T> {
    fn into_projections(self) -> Vec<Projection> {
        vec![Projection::column(self.column_ref().clone())]
    }
}

impl<T: SqlType> IntoProjections for Column<T> {
    fn into_projections(self) -> Vec<Projection> {
        vec![Projection::column(self.column_ref().clone())]
    }
}

impl<T: SqlType> IntoProjections for TypedExpr<T> {
    fn into_projections(self) -> Vec<Projection> {
        vec![Projection::unnamed(self.into_expr())]
    }
}

/// Conversion into an expression list (GROUP BY, DISTINCT ON, VALUES rows).
pub trait IntoExprList {
    fn into_expr_list(self) -> Vec<Expr>;
}

impl IntoExprList for Expr {
    fn into_expr_list(self) -> Vec<Expr> {
        vec![self]
    }
}

impl IntoExprList for Vec<Expr> {
    fn into_expr_list(self) -> Vec<Expr> {
        self
    }
}

impl<T: SqlType> IntoExprList for &Column<T> {
    fn into_expr_list(self) -> Vec<Expr> {
        vec![Expr::Column(self.column_ref().clone())]
    }
}

impl<T: SqlType> IntoExprList for TypedExpr<T> {
    fn into_expr_list(self) -> Vec<Expr> {
        vec![self.into_expr()]
    }
}

/// Conversion into a column-name list (INSERT columns, ON CONFLICT
/// targets).
pub trait IntoColumnList {
    fn into_column_list(self) -> Vec<ColumnRef>;
}

impl IntoColumnList for Vec<ColumnRef> {
    fn into_column_list(self) -> Vec<ColumnRef> {
        self
    }
}

impl<T: SqlType> IntoColumnList for &Column<T> {
    fn into_column_list(self) -> Vec<ColumnRef> {
        vec![self.column_ref().clone()]
    }
}

impl<T: SqlType> IntoColumnList for Column<T> {
    fn into_column_list(self) -> Vec<ColumnRef> {
        vec![self.column_ref().clone()]
    }
}

/// Conversion into an ORDER BY list.
pub trait IntoOrderBy {
    fn into_order_by(self) -> Vec<OrderByExpr>;
}

impl IntoOrderBy for OrderByExpr {
    fn into_order_by(self) -> Vec<OrderByExpr> {
        vec![self]
    }
}

impl IntoOrderBy for Vec<OrderByExpr> {
    fn into_order_by(self) -> Vec<OrderByExpr> {
        self
    }
}

impl<T: SqlType> IntoOrderBy for &Column<T> {
    fn into_order_by(self) -> Vec<OrderByExpr> {
        vec![OrderByExpr::plain(Expr::Column(self.column_ref().clone()))]
    }
}

impl<T: SqlType> IntoOrderBy for Column<T> {
    fn into_order_by(self) -> Vec<OrderByExpr> {
        vec![OrderByExpr::plain(Expr::Column(self.column_ref().clone()))]
    }
}

impl<T: SqlType> IntoOrderBy for TypedExpr<T> {
    fn into_order_by(self) -> Vec<OrderByExpr> {
        vec![OrderByExpr::plain(self.into_expr())]
    }
}

macro_rules! impl_list_conversions_for_tuple {
    ($($item:ident)+) => {
        impl<$($item: IntoProjections),+> IntoProjections for ($($item,)+) {
            fn into_projections(self) -> Vec<Projection> {
                #[allow(non_snake_case)]
                let ($($item,)+) = self;
                let mut list = Vec::new();
                $(list.extend($item.into_projections());)+
                list
            }
        }

        impl<$($item: IntoExprList),+> IntoExprList for ($($item,)+) {
            fn into_expr_list(self) -> Vec<Expr> {
                #[allow(non_snake_case)]
                let ($($item,)+) = self;
                let mut list = Vec::new();
                $(list.extend($item.into_expr_list());)+
                list
            }
        }

        impl<$($item: IntoColumnList),+> IntoColumnList for ($($item,)+) {
            fn into_column_list(self) -> Vec<ColumnRef> {
                #[allow(non_snake_case)]
                let ($($item,)+) = self;
                let mut list = Vec::new();
                $(list.extend($item.into_column_list());)+
                list
            }
        }

        impl<$($item: IntoOrderBy),+> IntoOrderBy for ($($item,)+) {
            fn into_order_by(self) -> Vec<OrderByExpr> {
                #[allow(non_snake_case)]
                let ($($item,)+) = self;
                let mut list = Vec::new();
                $(list.extend($item.into_order_by());)+
                list
            }
        }
    };
}

impl_list_conversions_for_tuple!(A);
impl_list_conversions_for_tuple!(A B);
impl_list_conversions_for_tuple!(A B C);
impl_list_conversions_for_tuple!(A B C D);
impl_list_conversions_for_tuple!(A B C D E);
impl_list_conversions_for_tuple!(A B C D E F);
impl_list_conversions_for_tuple!(A B C D E F G);
impl_list_conversions_for_tuple!(A B C D E F G H);
impl_list_conversions_for_tuple!(A B C D E F G H I);
impl_list_conversions_for_tuple!(A B C D E F G H I J);
impl_list_conversions_for_tuple!(A B C D E F G H I J K);
impl_list_conversions_for_tuple!(A B C D E F G H I J K L);
