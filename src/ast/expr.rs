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

use crate::ast::select::{OrderByExpr, SelectQuery};
use crate::ast::table::ColumnRef;
use crate::ast::value::Value;
use crate::dialect::{CastStyle, ConcatStyle};
use crate::error::Error;
use crate::serialize::{SqlBuilder, StatementCtx};

/// A SQL expression tree. Construction never mutates existing nodes; every
/// operator method produces a fresh value, so sub-expressions can be shared
/// freely between statements.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Expr {
    /// A typed literal. Parameterized on serialization, inlined in debug
    /// mode.
    Literal(Value),
    Column(ColumnRef),
    /// `*`, as in `COUNT(*)`.
    Wildcard,
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Function {
        name: String,
        args: Vec<Expr>,
        distinct: bool,
    },
    /// A function call with an OVER clause.
    WindowCall {
        func: Box<Expr>,
        window: Window,
    },
    Cast {
        expr: Box<Expr>,
        ty: String,
    },
    Case {
        whens: Vec<(Expr, Expr)>,
        else_: Option<Box<Expr>>,
    },
    Extract {
        field: DateTimeField,
        expr: Box<Expr>,
    },
    /// A row value: `(a, b, c)`.
    Row(Vec<Expr>),
    /// A scalar sub-query.
    Subquery(Box<SelectQuery>),
    Exists(Box<SelectQuery>),
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    InSubquery {
        expr: Box<Expr>,
        query: Box<SelectQuery>,
        negated: bool,
    },
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    /// A construction defect detected while building (e.g. a column rebound
    /// to a sub-query that does not project it). Reported when serialized,
    /// keeping builder chains fluent.
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Like,
    NotLike,
    IsDistinctFrom,
    IsNotDistinctFrom,
    Add,
    Sub,
    Concat,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UnaryOp {
    /// Prefix `NOT`.
    Not,
    /// Prefix `-`.
    Neg,
    /// Postfix `IS NULL`.
    IsNull,
    IsNotNull,
    IsTrue,
    IsFalse,
}

/// The OVER clause of a window-function call.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Window {
    pub(crate) partition_by: Vec<Expr>,
    pub(crate) order_by: Vec<OrderByExpr>,
}

impl Window {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partition_by(mut self, exprs: impl Into<Vec<Expr>>) -> Self {
        self.partition_by = exprs.into();
        self
    }

    pub fn order_by(mut self, order: impl Into<Vec<OrderByExpr>>) -> Self {
        self.order_by = order.into();
        self
    }
}

/// Field names accepted by `EXTRACT(<field> FROM <expr>)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DateTimeField {
    Year,
    Quarter,
    Month,
    Week,
    Day,
    Dow,
    Doy,
    Hour,
    Minute,
    Second,
    Epoch,
    Microseconds,
    Milliseconds,
    Timezone,
}

impl DateTimeField {
    fn keyword(&self) -> &'static str {
        match self {
            DateTimeField::Year => "YEAR",
            DateTimeField::Quarter => "QUARTER",
            DateTimeField::Month => "MONTH",
            DateTimeField::Week => "WEEK",
            DateTimeField::Day => "DAY",
            DateTimeField::Dow => "DOW",
            DateTimeField::Doy => "DOY",
            DateTimeField::Hour => "HOUR",
            DateTimeField::Minute => "MINUTE",
            DateTimeField::Second => "SECOND",
            DateTimeField::Epoch => "EPOCH",
            DateTimeField::Microseconds => "MICROSECONDS",
            DateTimeField::Milliseconds => "MILLISECONDS",
            DateTimeField::Timezone => "TIMEZONE",
        }
    }
}

// Precedence ordinals, loosest binding first. A child wraps in parentheses
// when it binds more loosely than its parent operator.
const PREC_OR: u8 = 1;
const PREC_AND: u8 = 2;
const PREC_NOT: u8 = 3;
const PREC_COMPARISON: u8 = 4;
const PREC_ADDITIVE: u8 = 5;
const PREC_MULTIPLICATIVE: u8 = 6;
const PREC_UNARY: u8 = 7;
const PREC_ATOM: u8 = 8;

impl BinaryOp {
    fn keyword(&self) -> &'static str {
        match self {
            BinaryOp::Or => "OR",
            BinaryOp::And => "AND",
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Like => "LIKE",
            BinaryOp::NotLike => "NOT LIKE",
            BinaryOp::IsDistinctFrom => "IS DISTINCT FROM",
            BinaryOp::IsNotDistinctFrom => "IS NOT DISTINCT FROM",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Concat => "||",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => PREC_OR,
            BinaryOp::And => PREC_AND,
            BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::LtEq
            | BinaryOp::Gt
            | BinaryOp::GtEq
            | BinaryOp::Like
            | BinaryOp::NotLike
            | BinaryOp::IsDistinctFrom
            | BinaryOp::IsNotDistinctFrom => PREC_COMPARISON,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Concat => PREC_ADDITIVE,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => PREC_MULTIPLICATIVE,
        }
    }

    /// `a - b - c` must not reassociate; the right operand wraps even on
    /// equal precedence.
    fn right_associates(&self) -> bool {
        !matches!(self, BinaryOp::Sub | BinaryOp::Div | BinaryOp::Mod)
    }
}

impl Expr {
    pub(crate) fn precedence(&self) -> u8 {
        match self {
            Expr::Binary { op, .. } => op.precedence(),
            Expr::Unary { op, .. } => match op {
                UnaryOp::Not => PREC_NOT,
                UnaryOp::Neg => PREC_UNARY,
                _ => PREC_COMPARISON,
            },
            Expr::InList { .. } | Expr::InSubquery { .. } | Expr::Between { .. } => {
                PREC_COMPARISON
            }
            _ => PREC_ATOM,
        }
    }

    pub(crate) fn write(&self, out: &mut SqlBuilder<'_>) -> Result<(), Error> {
        match self {
            Expr::Literal(value) => {
                out.push_arg(value.clone());
                Ok(())
            }
            Expr::Column(column) => column.write_qualified(out),
            Expr::Wildcard => {
                out.write_word("*");
                Ok(())
            }
            Expr::Binary { op, lhs, rhs } => {
                if *op == BinaryOp::Concat
                    && out.dialect().concat_style == ConcatStyle::Function
                {
                    out.write_word("CONCAT");
                    out.write_raw("(");
                    lhs.write(out)?;
                    out.write_raw(", ");
                    rhs.write(out)?;
                    out.write_raw(")");
                    return Ok(());
                }
                lhs.write_operand(op.precedence(), false, out)?;
                out.write_word(op.keyword());
                rhs.write_operand(op.precedence(), !op.right_associates(), out)
            }
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => {
                    out.write_word("NOT");
                    operand.write_operand(PREC_NOT, false, out)
                }
                UnaryOp::Neg => {
                    out.write_word("-");
                    out.glue_next();
                    operand.write_operand(PREC_UNARY, true, out)
                }
                UnaryOp::IsNull => {
                    operand.write_operand(PREC_COMPARISON, false, out)?;
                    out.write_word("IS NULL");
                    Ok(())
                }
                UnaryOp::IsNotNull => {
                    operand.write_operand(PREC_COMPARISON, false, out)?;
                    out.write_word("IS NOT NULL");
                    Ok(())
                }
                UnaryOp::IsTrue => {
                    operand.write_operand(PREC_COMPARISON, false, out)?;
                    out.write_word("IS TRUE");
                    Ok(())
                }
                UnaryOp::IsFalse => {
                    operand.write_operand(PREC_COMPARISON, false, out)?;
                    out.write_word("IS FALSE");
                    Ok(())
                }
            },
            Expr::Function {
                name,
                args,
                distinct,
            } => {
                let transform = out.dialect().function_transforms.get(name).cloned();
                if let Some(transform) = transform {
                    let mut rendered = Vec::with_capacity(args.len());
                    for arg in args {
                        rendered.push(out.render_fragment(|out| arg.write(out))?);
                    }
                    let call = transform.transform(name, &rendered);
                    out.write_word(&call);
                    return Ok(());
                }
                out.write_word(name);
                out.write_raw("(");
                if *distinct {
                    out.write_word("DISTINCT");
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.write_raw(", ");
                    }
                    arg.write(out)?;
                }
                out.write_raw(")");
                Ok(())
            }
            Expr::WindowCall { func, window } => {
                func.write(out)?;
                out.write_word("OVER");
                out.write_word("(");
                if !window.partition_by.is_empty() {
                    out.write_word("PARTITION BY");
                    for (i, expr) in window.partition_by.iter().enumerate() {
                        if i > 0 {
                            out.write_raw(", ");
                        }
                        expr.write(out)?;
                    }
                }
                if !window.order_by.is_empty() {
                    out.write_word("ORDER BY");
                    for (i, order) in window.order_by.iter().enumerate() {
                        if i > 0 {
                            out.write_raw(", ");
                        }
                        order.write(out, false)?;
                    }
                }
                out.write_raw(")");
                Ok(())
            }
            Expr::Cast { expr, ty } => match out.dialect().cast_style {
                CastStyle::Standard => {
                    out.write_word("CAST");
                    out.write_raw("(");
                    expr.write(out)?;
                    out.write_word("AS");
                    out.write_word(ty);
                    out.write_raw(")");
                    Ok(())
                }
                CastStyle::DoubleColon => {
                    expr.write_operand(PREC_ATOM, false, out)?;
                    out.write_raw("::");
                    out.glue_next();
                    out.write_word(ty);
                    Ok(())
                }
            },
            Expr::Case { whens, else_ } => {
                if whens.is_empty() {
                    return Err(Error::construction("CASE expression has no WHEN arm"));
                }
                out.write_word("CASE");
                for (condition, result) in whens {
                    out.write_word("WHEN");
                    condition.write(out)?;
                    out.write_word("THEN");
                    result.write(out)?;
                }
                if let Some(else_) = else_ {
                    out.write_word("ELSE");
                    else_.write(out)?;
                }
                out.write_word("END");
                Ok(())
            }
            Expr::Extract { field, expr } => {
                out.write_word("EXTRACT");
                out.write_raw("(");
                out.write_word(field.keyword());
                out.write_word("FROM");
                expr.write(out)?;
                out.write_raw(")");
                Ok(())
            }
            Expr::Row(items) => {
                out.write_word("(");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.write_raw(", ");
                    }
                    item.write(out)?;
                }
                out.write_raw(")");
                Ok(())
            }
            Expr::Subquery(query) => query.write(out, StatementCtx::Nested),
            Expr::Exists(query) => {
                out.write_word("EXISTS");
                query.write(out, StatementCtx::Nested)
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                if list.is_empty() {
                    return Err(Error::construction("IN list is empty"));
                }
                expr.write_operand(PREC_COMPARISON, false, out)?;
                out.write_word(if *negated { "NOT IN" } else { "IN" });
                out.write_word("(");
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        out.write_raw(", ");
                    }
                    item.write(out)?;
                }
                out.write_raw(")");
                Ok(())
            }
            Expr::InSubquery {
                expr,
                query,
                negated,
            } => {
                expr.write_operand(PREC_COMPARISON, false, out)?;
                out.write_word(if *negated { "NOT IN" } else { "IN" });
                query.write(out, StatementCtx::Nested)
            }
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                expr.write_operand(PREC_COMPARISON, false, out)?;
                out.write_word(if *negated { "NOT BETWEEN" } else { "BETWEEN" });
                low.write_operand(PREC_COMPARISON, true, out)?;
                out.write_word("AND");
                high.write_operand(PREC_COMPARISON, true, out)
            }
            Expr::Invalid(message) => Err(Error::construction(message.clone())),
        }
    }

    /// Writes the expression as an operand of a parent with the given
    /// precedence, wrapping it in parentheses when it binds more loosely
    /// (or equally, when the parent is non-associative on that side).
    fn write_operand(
        &self,
        parent_precedence: u8,
        wrap_on_equal: bool,
        out: &mut SqlBuilder<'_>,
    ) -> Result<(), Error> {
        let precedence = self.precedence();
        let wrap = precedence < parent_precedence
            || (wrap_on_equal && precedence == parent_precedence);
        if wrap {
            out.write_word("(");
            self.write(out)?;
            out.write_raw(")");
            Ok(())
        } else {
            self.write(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::serialize::SqlBuilder;

    fn render(expr: &Expr, dialect: &Dialect) -> String {
        let mut out = SqlBuilder::new(dialect, true);
        expr.write(&mut out).unwrap();
        let (sql, _) = out.finalize();
        sql.trim_end_matches(';').to_string()
    }

    fn lit(i: i64) -> Expr {
        Expr::Literal(Value::Int(i))
    }

    fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    #[test]
    fn weaker_children_are_parenthesized() {
        let or = binary(BinaryOp::Or, lit(1), lit(2));
        let and = binary(BinaryOp::And, or, lit(3));
        assert_eq!(render(&and, &Dialect::postgres()), "(1 OR 2) AND 3");
    }

    #[test]
    fn equal_precedence_chains_stay_flat() {
        let inner = binary(BinaryOp::And, lit(1), lit(2));
        let outer = binary(BinaryOp::And, inner, lit(3));
        assert_eq!(render(&outer, &Dialect::postgres()), "1 AND 2 AND 3");
    }

    #[test]
    fn subtraction_wraps_its_right_operand() {
        let rhs = binary(BinaryOp::Sub, lit(2), lit(3));
        let outer = binary(BinaryOp::Sub, lit(1), rhs);
        assert_eq!(render(&outer, &Dialect::postgres()), "1 - (2 - 3)");
    }

    #[test]
    fn concat_becomes_a_function_on_mysql() {
        let concat = binary(
            BinaryOp::Concat,
            Expr::Literal(Value::Text("a".into())),
            Expr::Literal(Value::Text("b".into())),
        );
        assert_eq!(render(&concat, &Dialect::postgres()), "'a' || 'b'");
        assert_eq!(render(&concat, &Dialect::mysql()), "CONCAT('a', 'b')");
    }

    #[test]
    fn case_requires_at_least_one_when() {
        let case = Expr::Case {
            whens: vec![],
            else_: None,
        };
        let dialect = Dialect::postgres();
        let mut out = SqlBuilder::new(&dialect, false);
        assert!(matches!(
            case.write(&mut out),
            Err(Error::Construction(_))
        ));
    }

    #[test]
    fn sqlite_floor_goes_through_the_transform() {
        let floor = Expr::Function {
            name: "FLOOR".into(),
            args: vec![lit(7)],
            distinct: false,
        };
        assert_eq!(render(&floor, &Dialect::sqlite()), "round(7 - 0.5)");
        assert_eq!(render(&floor, &Dialect::postgres()), "FLOOR(7)");
    }

    #[test]
    fn extract_spells_the_field_keyword() {
        let extract = Expr::Extract {
            field: DateTimeField::Year,
            expr: Box::new(lit(0)),
        };
        assert_eq!(render(&extract, &Dialect::postgres()), "EXTRACT(YEAR FROM 0)");
    }
}
