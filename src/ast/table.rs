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

use std::marker::PhantomData;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ast::dml::{DeleteStatement, InsertStatement, UpdateStatement};
use crate::ast::expr::Expr;
use crate::ast::select::{select, IntoColumnList, IntoProjections, Projection, SelectQuery, SelectStatement};
use crate::error::Error;
use crate::serialize::{SqlBuilder, StatementCtx};
use crate::typed::{SqlType, TypedExpr};
use crate::types::Bool;

/// A table handle: schema, name and an optional alias.
///
/// Handles are value-typed; [`Table::as_`] and [`Table::from_schema`] return
/// fresh handles sharing no mutable state with the original, so a rebound
/// handle and its source can be used side by side in the same statement
/// (the self-join case).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Table {
    pub(crate) schema: Option<String>,
    pub(crate) name: String,
    pub(crate) alias: Option<String>,
}

impl Table {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
            alias: None,
        }
    }

    /// A table addressed without a schema (CTE references, SQLite).
    pub fn unqualified(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            alias: None,
        }
    }

    /// Returns an aliased copy of this handle. Columns created from the
    /// copy qualify with the alias.
    #[must_use]
    pub fn as_(&self, alias: impl Into<String>) -> Table {
        Table {
            schema: self.schema.clone(),
            name: self.name.clone(),
            alias: Some(alias.into()),
        }
    }

    /// Returns a copy of this handle bound to another schema.
    #[must_use]
    pub fn from_schema(&self, schema: impl Into<String>) -> Table {
        Table {
            schema: Some(schema.into()),
            name: self.name.clone(),
            alias: self.alias.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name columns qualify with: the alias when one is set.
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Creates a typed column handle owned by this table.
    pub fn column<T: SqlType>(&self, name: impl Into<String>) -> Column<T> {
        Column {
            r: ColumnRef {
                qualifier: self.qualifier().to_string(),
                name: name.into(),
                alias: None,
                invalid: None,
            },
            _tag: PhantomData,
        }
    }

    pub fn insert<C: IntoColumnList>(&self, columns: C) -> InsertStatement {
        InsertStatement::new(self.clone(), columns.into_column_list())
    }

    pub fn update(&self) -> UpdateStatement {
        UpdateStatement::new(self.clone())
    }

    pub fn delete(&self) -> DeleteStatement {
        DeleteStatement::new(self.clone())
    }

    /// Emits `schema."Name" [AS "alias"]`. The schema is not quoted; table
    /// and alias are.
    pub(crate) fn write_from(&self, out: &mut SqlBuilder<'_>) {
        if let Some(schema) = &self.schema {
            out.write_word(schema);
            out.write_raw(".");
        }
        out.write_ident(&self.name);
        if let Some(alias) = &self.alias {
            out.write_word("AS");
            out.write_ident(alias);
        }
    }
}

/// An untyped column reference inside an expression tree.
///
/// `name` may itself contain a dot after a derived-table rebind, in which
/// case it is already the canonical projection label.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColumnRef {
    pub(crate) qualifier: String,
    pub(crate) name: String,
    pub(crate) alias: Option<String>,
    pub(crate) invalid: Option<String>,
}

impl ColumnRef {
    /// The projection label: the explicit alias, the name itself when it is
    /// already a label, else `"Qualifier.Name"`. The scanner groups cells
    /// by this exact string.
    pub fn label(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        if self.name.contains('.') {
            return self.name.clone();
        }
        format!("{}.{}", self.qualifier, self.name)
    }

    pub(crate) fn check(&self) -> Result<(), Error> {
        match &self.invalid {
            Some(message) => Err(Error::construction(message.clone())),
            None => Ok(()),
        }
    }

    /// `"Qualifier"."Name"` — the form used everywhere except projection
    /// lists and set-statement ORDER BY.
    pub(crate) fn write_qualified(&self, out: &mut SqlBuilder<'_>) -> Result<(), Error> {
        self.check()?;
        out.write_ident(&self.qualifier);
        out.write_raw(".");
        out.write_ident(&self.name);
        Ok(())
    }

    /// `"Qualifier"."Name" AS "label"` — the projection-list form.
    pub(crate) fn write_projection(&self, out: &mut SqlBuilder<'_>) -> Result<(), Error> {
        self.write_qualified(out)?;
        out.write_word("AS");
        out.write_ident(&self.label());
        Ok(())
    }

    /// `"Qualifier.Name"` — the label quoted as a single identifier, used
    /// by ORDER BY on a set statement where the combined result only knows
    /// the output labels.
    pub(crate) fn write_label(&self, out: &mut SqlBuilder<'_>) -> Result<(), Error> {
        self.check()?;
        out.write_ident(&self.label());
        Ok(())
    }
}

/// A typed column handle produced by the generated schema bindings.
/// Operator methods come from the capability traits in [`crate::typed`].
pub struct Column<T: SqlType> {
    pub(crate) r: ColumnRef,
    _tag: PhantomData<T>,
}

impl<T: SqlType> Column<T> {
    pub fn name(&self) -> &str {
        &self.r.name
    }

    pub fn label(&self) -> String {
        self.r.label()
    }

    /// Returns a copy with an explicit projection alias.
    #[must_use]
    pub fn alias(&self, alias: impl Into<String>) -> Column<T> {
        let mut r = self.r.clone();
        r.alias = Some(alias.into());
        Column {
            r,
            _tag: PhantomData,
        }
    }

    /// Rebinds this column to a derived table or CTE that projects it,
    /// addressing it as `"source_alias"."original label"`. Rebinding to a
    /// source that does not project the column is remembered and reported
    /// when the statement is serialized.
    #[must_use]
    pub fn from_source<S: ColumnSource>(&self, source: &S) -> Column<T> {
        let label = self.r.label();
        let r = if source.projects_label(&label) {
            ColumnRef {
                qualifier: source.source_alias().to_string(),
                name: label,
                alias: None,
                invalid: None,
            }
        } else {
            ColumnRef {
                qualifier: source.source_alias().to_string(),
                name: label.clone(),
                alias: None,
                invalid: Some(format!(
                    "column \"{}\" is not projected by \"{}\"",
                    label,
                    source.source_alias()
                )),
            }
        };
        Column {
            r,
            _tag: PhantomData,
        }
    }

    pub(crate) fn column_ref(&self) -> &ColumnRef {
        &self.r
    }
}

impl<T: SqlType> Clone for Column<T> {
    fn clone(&self) -> Self {
        Column {
            r: self.r.clone(),
            _tag: PhantomData,
        }
    }
}

impl<T: SqlType> std::fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("qualifier", &self.r.qualifier)
            .field("name", &self.r.name)
            .finish()
    }
}

/// A source a column can be rebound to: a derived table or a CTE.
pub trait ColumnSource {
    fn source_alias(&self) -> &str;
    fn projects_label(&self, label: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    fn keyword(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

/// The FROM clause tree: a table, a binary join, a derived table or a
/// VALUES list.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TableExpr {
    Table(Table),
    Join {
        kind: JoinKind,
        lhs: Box<TableExpr>,
        rhs: Box<TableExpr>,
        on: Option<Expr>,
    },
    Derived(DerivedTable),
    Values {
        rows: Vec<Vec<Expr>>,
        alias: String,
        columns: Vec<String>,
    },
}

impl TableExpr {
    pub fn values(
        rows: Vec<Vec<Expr>>,
        alias: impl Into<String>,
        columns: Vec<String>,
    ) -> TableExpr {
        TableExpr::Values {
            rows,
            alias: alias.into(),
            columns,
        }
    }

    pub(crate) fn write(&self, out: &mut SqlBuilder<'_>) -> Result<(), Error> {
        match self {
            TableExpr::Table(table) => {
                table.write_from(out);
                Ok(())
            }
            TableExpr::Join {
                kind,
                lhs,
                rhs,
                on,
            } => {
                lhs.write(out)?;
                out.new_line();
                out.write_word(kind.keyword());
                rhs.write(out)?;
                match (kind, on) {
                    (JoinKind::Cross, _) => {}
                    (_, Some(on)) => {
                        out.write_word("ON");
                        out.write_word("(");
                        on.write(out)?;
                        out.write_raw(")");
                    }
                    (_, None) => {
                        return Err(Error::construction(format!(
                            "{} requires an ON predicate",
                            kind.keyword()
                        )))
                    }
                }
                Ok(())
            }
            TableExpr::Derived(derived) => derived.write(out),
            TableExpr::Values {
                rows,
                alias,
                columns,
            } => {
                if rows.is_empty() {
                    return Err(Error::construction("VALUES list is empty"));
                }
                out.write_word("(");
                out.write_word("VALUES");
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        out.write_raw(", ");
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
                out.write_raw(")");
                out.write_word("AS");
                out.write_ident(alias);
                if !columns.is_empty() {
                    out.write_word("(");
                    for (i, column) in columns.iter().enumerate() {
                        if i > 0 {
                            out.write_raw(", ");
                        }
                        out.write_ident(column);
                    }
                    out.write_raw(")");
                }
                Ok(())
            }
        }
    }
}

/// A sub-query given a table-like alias. Its projection labels become
/// addressable columns: `Artist.ArtistId` re-exported by a derived table
/// aliased `first10Artist` is referenced as
/// `"first10Artist"."Artist.ArtistId"`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DerivedTable {
    pub(crate) query: Box<SelectQuery>,
    pub(crate) alias: String,
    pub(crate) labels: Vec<String>,
}

impl DerivedTable {
    pub(crate) fn new(query: SelectQuery, alias: impl Into<String>) -> Self {
        let labels = query.projection_labels().into_iter().flatten().collect();
        Self {
            query: Box::new(query),
            alias: alias.into(),
            labels,
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// One projection per label the inner query exports, each keeping its
    /// original label.
    pub fn all_columns(&self) -> Vec<Projection> {
        self.labels
            .iter()
            .map(|label| {
                Projection::column(ColumnRef {
                    qualifier: self.alias.clone(),
                    name: label.clone(),
                    alias: None,
                    invalid: None,
                })
            })
            .collect()
    }

    fn write(&self, out: &mut SqlBuilder<'_>) -> Result<(), Error> {
        self.query.write(out, StatementCtx::Nested)?;
        out.write_word("AS");
        out.write_ident(&self.alias);
        Ok(())
    }
}

impl ColumnSource for DerivedTable {
    fn source_alias(&self) -> &str {
        &self.alias
    }

    fn projects_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Anything that can stand in a FROM clause and grow joins: a table handle,
/// a join tree under construction, a derived table, a CTE reference, or a
/// generated binding (through `Deref<Target = Table>`).
pub trait TableSource {
    fn as_table_expr(&self) -> TableExpr;

    fn select<P: IntoProjections>(&self, projections: P) -> SelectStatement
    where
        Self: Sized,
    {
        select(projections).from(self)
    }

    fn inner_join<R: TableSource>(&self, rhs: &R, on: TypedExpr<Bool>) -> TableExpr
    where
        Self: Sized,
    {
        self.join(JoinKind::Inner, rhs, Some(on))
    }

    fn left_join<R: TableSource>(&self, rhs: &R, on: TypedExpr<Bool>) -> TableExpr
    where
        Self: Sized,
    {
        self.join(JoinKind::Left, rhs, Some(on))
    }

    fn right_join<R: TableSource>(&self, rhs: &R, on: TypedExpr<Bool>) -> TableExpr
    where
        Self: Sized,
    {
        self.join(JoinKind::Right, rhs, Some(on))
    }

    fn full_join<R: TableSource>(&self, rhs: &R, on: TypedExpr<Bool>) -> TableExpr
    where
        Self: Sized,
    {
        self.join(JoinKind::Full, rhs, Some(on))
    }

    fn cross_join<R: TableSource>(&self, rhs: &R) -> TableExpr
    where
        Self: Sized,
    {
        self.join(JoinKind::Cross, rhs, None)
    }

    #[doc(hidden)]
    fn join<R: TableSource>(
        &self,
        kind: JoinKind,
        rhs: &R,
        on: Option<TypedExpr<Bool>>,
    ) -> TableExpr
    where
        Self: Sized,
    {
        TableExpr::Join {
            kind,
            lhs: Box::new(self.as_table_expr()),
            rhs: Box::new(rhs.as_table_expr()),
            on: on.map(TypedExpr::into_expr),
        }
    }
}

impl TableSource for Table {
    fn as_table_expr(&self) -> TableExpr {
        TableExpr::Table(self.clone())
    }
}

impl TableSource for TableExpr {
    fn as_table_expr(&self) -> TableExpr {
        self.clone()
    }
}

impl TableSource for DerivedTable {
    fn as_table_expr(&self) -> TableExpr {
        TableExpr::Derived(self.clone())
    }
}
