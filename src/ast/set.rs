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
    write_limit_offset, IntoOrderBy, OrderByExpr, SelectQuery, SelectStatement,
};
use crate::ast::table::DerivedTable;
use crate::error::Error;
use crate::serialize::{SqlBuilder, Statement, StatementCtx};
use crate::typed::{SqlType, TypedExpr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SetOperator {
    Union,
    Intersect,
    Except,
}

impl SetOperator {
    fn keyword(&self) -> &'static str {
        match self {
            SetOperator::Union => "UNION",
            SetOperator::Intersect => "INTERSECT",
            SetOperator::Except => "EXCEPT",
        }
    }
}

/// Combines select statements with UNION / INTERSECT / EXCEPT.
///
/// The node is itself select-like: it exposes the projections of its first
/// operand and owns an ORDER BY / LIMIT / OFFSET applied to the combined
/// result. At least two operands are required; fewer fail at serialization
/// like every other construction defect.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SetStatement {
    pub(crate) op: SetOperator,
    pub(crate) all: bool,
    pub(crate) selects: Vec<SelectStatement>,
    pub(crate) order_by: Vec<OrderByExpr>,
    pub(crate) limit: Option<i64>,
    pub(crate) offset: Option<i64>,
}

fn set_statement(op: SetOperator, all: bool, selects: Vec<SelectStatement>) -> SetStatement {
    SetStatement {
        op,
        all,
        selects,
        order_by: Vec::new(),
        limit: None,
        offset: None,
    }
}

/// UNION of the given selects, eliminating duplicate rows.
pub fn union(selects: impl Into<Vec<SelectStatement>>) -> SetStatement {
    set_statement(SetOperator::Union, false, selects.into())
}

/// UNION ALL of the given selects, keeping duplicate rows.
pub fn union_all(selects: impl Into<Vec<SelectStatement>>) -> SetStatement {
    set_statement(SetOperator::Union, true, selects.into())
}

pub fn intersect(selects: impl Into<Vec<SelectStatement>>) -> SetStatement {
    set_statement(SetOperator::Intersect, false, selects.into())
}

pub fn intersect_all(selects: impl Into<Vec<SelectStatement>>) -> SetStatement {
    set_statement(SetOperator::Intersect, true, selects.into())
}

/// Rows of `lhs` that do not appear in `rhs`.
pub fn except(lhs: SelectStatement, rhs: SelectStatement) -> SetStatement {
    set_statement(SetOperator::Except, false, vec![lhs, rhs])
}

pub fn except_all(lhs: SelectStatement, rhs: SelectStatement) -> SetStatement {
    set_statement(SetOperator::Except, true, vec![lhs, rhs])
}

impl SetStatement {
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

    pub fn as_table(self, alias: impl Into<String>) -> DerivedTable {
        DerivedTable::new(SelectQuery::from(self), alias)
    }

    pub fn as_scalar<T: SqlType>(self) -> TypedExpr<T> {
        TypedExpr::new(Expr::Subquery(Box::new(SelectQuery::from(self))))
    }

    /// A set statement exposes the projections of its first operand.
    pub(crate) fn projection_labels(&self) -> Vec<Option<String>> {
        self.selects
            .first()
            .map(SelectStatement::projection_labels)
            .unwrap_or_default()
    }

    pub(crate) fn write(&self, out: &mut SqlBuilder<'_>, ctx: StatementCtx) -> Result<(), Error> {
        if self.selects.len() < 2 {
            return Err(Error::construction(
                "set statement must have at least two SELECT statements",
            ));
        }

        let wrap = ctx == StatementCtx::Nested;
        if wrap {
            out.write_word("(");
            out.increase_indent();
            out.new_line();
        }

        for (i, select) in self.selects.iter().enumerate() {
            if i > 0 {
                out.new_line();
                out.write_word(self.op.keyword());
                if self.all {
                    out.write_word("ALL");
                }
                out.new_line();
            }
            select.write(out, StatementCtx::Nested)?;
        }

        if !self.order_by.is_empty() {
            out.new_line();
            out.write_word("ORDER BY");
            for (i, order) in self.order_by.iter().enumerate() {
                if i > 0 {
                    out.write_raw(", ");
                }
                // The combined result only knows output labels, not the
                // operand tables.
                order.write(out, true)?;
            }
        }

        write_limit_offset(self.limit, self.offset, out)?;

        if wrap {
            out.decrease_indent();
            out.new_line();
            out.write_raw(")");
        }
        Ok(())
    }
}

impl Statement for SetStatement {
    fn write_stmt(&self, out: &mut SqlBuilder<'_>) -> Result<(), Error> {
        self.write(out, StatementCtx::TopLevel)
    }
}
