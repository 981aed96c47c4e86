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

//! Type tags and the operator surface.
//!
//! Expressions carry an uninhabited marker type; capability traits gate the
//! operator methods so that a boolean cannot be added to and a byte string
//! cannot be compared with `<` — the mistakes are compile errors, not
//! runtime SQL errors. The traits have blanket impls for both
//! [`TypedExpr`] and the generated [`Column`] handles.

use std::marker::PhantomData;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use ordered_float::OrderedFloat;

use crate::ast::expr::{BinaryOp, Expr, UnaryOp, Window};
use crate::ast::select::{OrderByExpr, Projection, SelectQuery};
use crate::ast::table::Column;
use crate::ast::value::{Interval as IntervalValue, Value};

/// The SQL type tags. Uninhabited: they exist only at the type level.
pub mod types {
    macro_rules! marker {
        ($(#[$doc:meta])* $name:ident) => {
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub enum $name {}
        };
    }

    marker!(Bool);
    marker!(Int);
    marker!(Float);
    marker!(Text);
    marker!(Bytes);
    marker!(Timestamp);
    marker!(Date);
    marker!(Time);
    marker!(Interval);
    marker!(
        /// A database enum; its values travel as text.
        EnumTag
    );
    marker!(
        /// A row value, e.g. `(a, b)`.
        RowTag
    );
}

/// Implemented by every type tag.
pub trait SqlType: 'static {}

/// Tags whose values have a total order the comparison operators respect.
pub trait Orderable: SqlType {}

/// Tags supporting arithmetic.
pub trait Numeric: Orderable {}

impl SqlType for types::Bool {}
impl SqlType for types::Int {}
impl SqlType for types::Float {}
impl SqlType for types::Text {}
impl SqlType for types::Bytes {}
impl SqlType for types::Timestamp {}
impl SqlType for types::Date {}
impl SqlType for types::Time {}
impl SqlType for types::Interval {}
impl SqlType for types::EnumTag {}
impl SqlType for types::RowTag {}

impl Orderable for types::Int {}
impl Orderable for types::Float {}
impl Orderable for types::Text {}
impl Orderable for types::Timestamp {}
impl Orderable for types::Date {}
impl Orderable for types::Time {}

impl Numeric for types::Int {}
impl Numeric for types::Float {}

/// An expression carrying its type tag.
pub struct TypedExpr<T: SqlType> {
    expr: Expr,
    _tag: PhantomData<T>,
}

impl<T: SqlType> TypedExpr<T> {
    pub(crate) fn new(expr: Expr) -> Self {
        Self {
            expr,
            _tag: PhantomData,
        }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn into_expr(self) -> Expr {
        self.expr
    }
}

impl<T: SqlType> Clone for TypedExpr<T> {
    fn clone(&self) -> Self {
        Self::new(self.expr.clone())
    }
}

impl<T: SqlType> std::fmt::Debug for TypedExpr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TypedExpr").field(&self.expr).finish()
    }
}

/// Conversion into a typed expression of tag `T`. Implemented by typed
/// expressions, column handles and the plain Rust values each tag accepts,
/// so `col.eq(1)` and `col.eq(int(1))` build the same tree.
pub trait IntoTyped<T: SqlType> {
    fn into_typed(self) -> TypedExpr<T>;
}

impl<T: SqlType> IntoTyped<T> for TypedExpr<T> {
    fn into_typed(self) -> TypedExpr<T> {
        self
    }
}

impl<T: SqlType> IntoTyped<T> for &TypedExpr<T> {
    fn into_typed(self) -> TypedExpr<T> {
        self.clone()
    }
}

impl<T: SqlType> IntoTyped<T> for &Column<T> {
    fn into_typed(self) -> TypedExpr<T> {
        TypedExpr::new(Expr::Column(self.column_ref().clone()))
    }
}

impl IntoTyped<types::Int> for i64 {
    fn into_typed(self) -> TypedExpr<types::Int> {
        int(self)
    }
}

impl IntoTyped<types::Int> for i32 {
    fn into_typed(self) -> TypedExpr<types::Int> {
        int(self as i64)
    }
}

impl IntoTyped<types::Float> for f64 {
    fn into_typed(self) -> TypedExpr<types::Float> {
        float(self)
    }
}

impl IntoTyped<types::Text> for &str {
    fn into_typed(self) -> TypedExpr<types::Text> {
        text(self)
    }
}

impl IntoTyped<types::Text> for String {
    fn into_typed(self) -> TypedExpr<types::Text> {
        text(self)
    }
}

impl IntoTyped<types::Bool> for bool {
    fn into_typed(self) -> TypedExpr<types::Bool> {
        boolean(self)
    }
}

impl IntoTyped<types::Bytes> for Vec<u8> {
    fn into_typed(self) -> TypedExpr<types::Bytes> {
        bytes(self)
    }
}

impl IntoTyped<types::Bytes> for &[u8] {
    fn into_typed(self) -> TypedExpr<types::Bytes> {
        bytes(self.to_vec())
    }
}

impl IntoTyped<types::Timestamp> for NaiveDateTime {
    fn into_typed(self) -> TypedExpr<types::Timestamp> {
        timestamp(self)
    }
}

impl IntoTyped<types::Date> for NaiveDate {
    fn into_typed(self) -> TypedExpr<types::Date> {
        date(self)
    }
}

impl IntoTyped<types::Time> for NaiveTime {
    fn into_typed(self) -> TypedExpr<types::Time> {
        time(self)
    }
}

impl IntoTyped<types::Interval> for IntervalValue {
    fn into_typed(self) -> TypedExpr<types::Interval> {
        interval(self)
    }
}

/// Conversion into a bare AST expression, for the few surfaces (CAST, row
/// values) that accept any tag.
pub trait IntoExpr {
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl<T: SqlType> IntoExpr for TypedExpr<T> {
    fn into_expr(self) -> Expr {
        self.expr
    }
}

impl<T: SqlType> IntoExpr for &Column<T> {
    fn into_expr(self) -> Expr {
        Expr::Column(self.column_ref().clone())
    }
}

// ---------------------------------------------------------------------------
// Literal constructors
// ---------------------------------------------------------------------------

pub fn int(value: i64) -> TypedExpr<types::Int> {
    TypedExpr::new(Expr::Literal(Value::Int(value)))
}

pub fn float(value: f64) -> TypedExpr<types::Float> {
    TypedExpr::new(Expr::Literal(Value::Float(OrderedFloat(value))))
}

pub fn text(value: impl Into<String>) -> TypedExpr<types::Text> {
    TypedExpr::new(Expr::Literal(Value::Text(value.into())))
}

pub fn boolean(value: bool) -> TypedExpr<types::Bool> {
    TypedExpr::new(Expr::Literal(Value::Bool(value)))
}

pub fn bytes(value: impl Into<Vec<u8>>) -> TypedExpr<types::Bytes> {
    TypedExpr::new(Expr::Literal(Value::Bytes(value.into())))
}

pub fn timestamp(value: NaiveDateTime) -> TypedExpr<types::Timestamp> {
    TypedExpr::new(Expr::Literal(Value::Timestamp(value)))
}

pub fn date(value: NaiveDate) -> TypedExpr<types::Date> {
    TypedExpr::new(Expr::Literal(Value::Date(value)))
}

pub fn time(value: NaiveTime) -> TypedExpr<types::Time> {
    TypedExpr::new(Expr::Literal(Value::Time(value)))
}

pub fn interval(value: IntervalValue) -> TypedExpr<types::Interval> {
    TypedExpr::new(Expr::Literal(Value::Interval(value)))
}

/// A database enum value; serialized as its text representation.
pub fn enum_value(value: impl Into<String>) -> TypedExpr<types::EnumTag> {
    TypedExpr::new(Expr::Literal(Value::Text(value.into())))
}

/// A NULL literal of any tag.
pub fn null<T: SqlType>() -> TypedExpr<T> {
    TypedExpr::new(Expr::Literal(Value::Null))
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn postfix(op: UnaryOp, operand: Expr) -> Expr {
    Expr::Unary {
        op,
        operand: Box::new(operand),
    }
}

/// Operations available on every expression, whatever its tag.
pub trait ExprOps<T: SqlType> {
    fn as_typed(&self) -> TypedExpr<T>;

    fn eq(&self, rhs: impl IntoTyped<T>) -> TypedExpr<types::Bool> {
        TypedExpr::new(binary(
            BinaryOp::Eq,
            self.as_typed().into_expr(),
            rhs.into_typed().into_expr(),
        ))
    }

    fn not_eq(&self, rhs: impl IntoTyped<T>) -> TypedExpr<types::Bool> {
        TypedExpr::new(binary(
            BinaryOp::NotEq,
            self.as_typed().into_expr(),
            rhs.into_typed().into_expr(),
        ))
    }

    /// NULL-safe equality.
    fn is_distinct_from(&self, rhs: impl IntoTyped<T>) -> TypedExpr<types::Bool> {
        TypedExpr::new(binary(
            BinaryOp::IsDistinctFrom,
            self.as_typed().into_expr(),
            rhs.into_typed().into_expr(),
        ))
    }

    fn is_not_distinct_from(&self, rhs: impl IntoTyped<T>) -> TypedExpr<types::Bool> {
        TypedExpr::new(binary(
            BinaryOp::IsNotDistinctFrom,
            self.as_typed().into_expr(),
            rhs.into_typed().into_expr(),
        ))
    }

    fn is_null(&self) -> TypedExpr<types::Bool> {
        TypedExpr::new(postfix(UnaryOp::IsNull, self.as_typed().into_expr()))
    }

    fn is_not_null(&self) -> TypedExpr<types::Bool> {
        TypedExpr::new(postfix(UnaryOp::IsNotNull, self.as_typed().into_expr()))
    }

    fn in_list<I>(&self, items: I) -> TypedExpr<types::Bool>
    where
        I: IntoIterator,
        I::Item: IntoTyped<T>,
    {
        TypedExpr::new(Expr::InList {
            expr: Box::new(self.as_typed().into_expr()),
            list: items
                .into_iter()
                .map(|item| item.into_typed().into_expr())
                .collect(),
            negated: false,
        })
    }

    fn not_in_list<I>(&self, items: I) -> TypedExpr<types::Bool>
    where
        I: IntoIterator,
        I::Item: IntoTyped<T>,
    {
        TypedExpr::new(Expr::InList {
            expr: Box::new(self.as_typed().into_expr()),
            list: items
                .into_iter()
                .map(|item| item.into_typed().into_expr())
                .collect(),
            negated: true,
        })
    }

    fn in_subquery(&self, query: impl Into<SelectQuery>) -> TypedExpr<types::Bool> {
        TypedExpr::new(Expr::InSubquery {
            expr: Box::new(self.as_typed().into_expr()),
            query: Box::new(query.into()),
            negated: false,
        })
    }

    fn not_in_subquery(&self, query: impl Into<SelectQuery>) -> TypedExpr<types::Bool> {
        TypedExpr::new(Expr::InSubquery {
            expr: Box::new(self.as_typed().into_expr()),
            query: Box::new(query.into()),
            negated: true,
        })
    }

    /// Projects this expression under an explicit output label.
    fn aliased(&self, alias: impl Into<String>) -> Projection {
        Projection::aliased(self.as_typed().into_expr(), alias)
    }

    fn asc(&self) -> OrderByExpr {
        OrderByExpr::ascending(self.as_typed().into_expr())
    }

    fn desc(&self) -> OrderByExpr {
        OrderByExpr::descending(self.as_typed().into_expr())
    }

    /// Attaches an OVER clause, turning a function call into a window call.
    fn over(&self, window: Window) -> TypedExpr<T> {
        TypedExpr::new(Expr::WindowCall {
            func: Box::new(self.as_typed().into_expr()),
            window,
        })
    }
}

impl<T: SqlType> ExprOps<T> for TypedExpr<T> {
    fn as_typed(&self) -> TypedExpr<T> {
        self.clone()
    }
}

impl<T: SqlType> ExprOps<T> for Column<T> {
    fn as_typed(&self) -> TypedExpr<T> {
        TypedExpr::new(Expr::Column(self.column_ref().clone()))
    }
}

/// Boolean connectives and predicates.
pub trait BoolOps: ExprOps<types::Bool> {
    fn and(&self, rhs: impl IntoTyped<types::Bool>) -> TypedExpr<types::Bool> {
        TypedExpr::new(binary(
            BinaryOp::And,
            self.as_typed().into_expr(),
            rhs.into_typed().into_expr(),
        ))
    }

    fn or(&self, rhs: impl IntoTyped<types::Bool>) -> TypedExpr<types::Bool> {
        TypedExpr::new(binary(
            BinaryOp::Or,
            self.as_typed().into_expr(),
            rhs.into_typed().into_expr(),
        ))
    }

    fn not(&self) -> TypedExpr<types::Bool> {
        TypedExpr::new(Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self.as_typed().into_expr()),
        })
    }

    fn is_true(&self) -> TypedExpr<types::Bool> {
        TypedExpr::new(postfix(UnaryOp::IsTrue, self.as_typed().into_expr()))
    }

    fn is_false(&self) -> TypedExpr<types::Bool> {
        TypedExpr::new(postfix(UnaryOp::IsFalse, self.as_typed().into_expr()))
    }
}

impl<E: ExprOps<types::Bool>> BoolOps for E {}

/// Comparisons on ordered tags.
pub trait OrderedOps<T: Orderable>: ExprOps<T> {
    fn lt(&self, rhs: impl IntoTyped<T>) -> TypedExpr<types::Bool> {
        TypedExpr::new(binary(
            BinaryOp::Lt,
            self.as_typed().into_expr(),
            rhs.into_typed().into_expr(),
        ))
    }

    fn lt_eq(&self, rhs: impl IntoTyped<T>) -> TypedExpr<types::Bool> {
        TypedExpr::new(binary(
            BinaryOp::LtEq,
            self.as_typed().into_expr(),
            rhs.into_typed().into_expr(),
        ))
    }

    fn gt(&self, rhs: impl IntoTyped<T>) -> TypedExpr<types::Bool> {
        TypedExpr::new(binary(
            BinaryOp::Gt,
            self.as_typed().into_expr(),
            rhs.into_typed().into_expr(),
        ))
    }

    fn gt_eq(&self, rhs: impl IntoTyped<T>) -> TypedExpr<types::Bool> {
        TypedExpr::new(binary(
            BinaryOp::GtEq,
            self.as_typed().into_expr(),
            rhs.into_typed().into_expr(),
        ))
    }

    fn between(
        &self,
        low: impl IntoTyped<T>,
        high: impl IntoTyped<T>,
    ) -> TypedExpr<types::Bool> {
        TypedExpr::new(Expr::Between {
            expr: Box::new(self.as_typed().into_expr()),
            low: Box::new(low.into_typed().into_expr()),
            high: Box::new(high.into_typed().into_expr()),
            negated: false,
        })
    }

    fn not_between(
        &self,
        low: impl IntoTyped<T>,
        high: impl IntoTyped<T>,
    ) -> TypedExpr<types::Bool> {
        TypedExpr::new(Expr::Between {
            expr: Box::new(self.as_typed().into_expr()),
            low: Box::new(low.into_typed().into_expr()),
            high: Box::new(high.into_typed().into_expr()),
            negated: true,
        })
    }
}

impl<T: Orderable, E: ExprOps<T>> OrderedOps<T> for E {}

/// Arithmetic on numeric tags.
pub trait NumericOps<T: Numeric>: ExprOps<T> {
    fn add(&self, rhs: impl IntoTyped<T>) -> TypedExpr<T> {
        TypedExpr::new(binary(
            BinaryOp::Add,
            self.as_typed().into_expr(),
            rhs.into_typed().into_expr(),
        ))
    }

    fn sub(&self, rhs: impl IntoTyped<T>) -> TypedExpr<T> {
        TypedExpr::new(binary(
            BinaryOp::Sub,
            self.as_typed().into_expr(),
            rhs.into_typed().into_expr(),
        ))
    }

    fn mul(&self, rhs: impl IntoTyped<T>) -> TypedExpr<T> {
        TypedExpr::new(binary(
            BinaryOp::Mul,
            self.as_typed().into_expr(),
            rhs.into_typed().into_expr(),
        ))
    }

    fn div(&self, rhs: impl IntoTyped<T>) -> TypedExpr<T> {
        TypedExpr::new(binary(
            BinaryOp::Div,
            self.as_typed().into_expr(),
            rhs.into_typed().into_expr(),
        ))
    }

    fn rem(&self, rhs: impl IntoTyped<T>) -> TypedExpr<T> {
        TypedExpr::new(binary(
            BinaryOp::Mod,
            self.as_typed().into_expr(),
            rhs.into_typed().into_expr(),
        ))
    }

    fn neg(&self) -> TypedExpr<T> {
        TypedExpr::new(Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(self.as_typed().into_expr()),
        })
    }
}

impl<T: Numeric, E: ExprOps<T>> NumericOps<T> for E {}

/// Pattern matching and concatenation on text.
pub trait TextOps: ExprOps<types::Text> {
    fn like(&self, pattern: impl IntoTyped<types::Text>) -> TypedExpr<types::Bool> {
        TypedExpr::new(binary(
            BinaryOp::Like,
            self.as_typed().into_expr(),
            pattern.into_typed().into_expr(),
        ))
    }

    fn not_like(&self, pattern: impl IntoTyped<types::Text>) -> TypedExpr<types::Bool> {
        TypedExpr::new(binary(
            BinaryOp::NotLike,
            self.as_typed().into_expr(),
            pattern.into_typed().into_expr(),
        ))
    }

    fn concat(&self, rhs: impl IntoTyped<types::Text>) -> TypedExpr<types::Text> {
        TypedExpr::new(binary(
            BinaryOp::Concat,
            self.as_typed().into_expr(),
            rhs.into_typed().into_expr(),
        ))
    }
}

impl<E: ExprOps<types::Text>> TextOps for E {}
