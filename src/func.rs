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

//! Function-call constructors, the CASE builder, CAST and window functions.

use crate::ast::expr::{DateTimeField, Expr};
use crate::ast::select::SelectQuery;
use crate::typed::{types, IntoExpr, IntoTyped, Numeric, Orderable, SqlType, TypedExpr};

fn call<T: SqlType>(name: &str, args: Vec<Expr>) -> TypedExpr<T> {
    TypedExpr::new(Expr::Function {
        name: name.to_string(),
        args,
        distinct: false,
    })
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

pub fn count<T: SqlType>(expr: impl IntoTyped<T>) -> TypedExpr<types::Int> {
    call("COUNT", vec![expr.into_typed().into_expr()])
}

pub fn count_star() -> TypedExpr<types::Int> {
    call("COUNT", vec![Expr::Wildcard])
}

pub fn count_distinct<T: SqlType>(expr: impl IntoTyped<T>) -> TypedExpr<types::Int> {
    TypedExpr::new(Expr::Function {
        name: "COUNT".to_string(),
        args: vec![expr.into_typed().into_expr()],
        distinct: true,
    })
}

pub fn min<T: Orderable>(expr: impl IntoTyped<T>) -> TypedExpr<T> {
    call("MIN", vec![expr.into_typed().into_expr()])
}

pub fn max<T: Orderable>(expr: impl IntoTyped<T>) -> TypedExpr<T> {
    call("MAX", vec![expr.into_typed().into_expr()])
}

pub fn sum<T: Numeric>(expr: impl IntoTyped<T>) -> TypedExpr<T> {
    call("SUM", vec![expr.into_typed().into_expr()])
}

pub fn avg<T: Numeric>(expr: impl IntoTyped<T>) -> TypedExpr<types::Float> {
    call("AVG", vec![expr.into_typed().into_expr()])
}

// ---------------------------------------------------------------------------
// Scalar functions
// ---------------------------------------------------------------------------

/// The first non-NULL of the given expressions.
pub fn coalesce<T, I>(exprs: I) -> TypedExpr<T>
where
    T: SqlType,
    I: IntoIterator<Item = TypedExpr<T>>,
{
    call(
        "COALESCE",
        exprs.into_iter().map(TypedExpr::into_expr).collect(),
    )
}

/// NULL when both arguments are equal, the first argument otherwise.
pub fn nullif<T: SqlType>(a: impl IntoTyped<T>, b: impl IntoTyped<T>) -> TypedExpr<T> {
    call(
        "NULLIF",
        vec![a.into_typed().into_expr(), b.into_typed().into_expr()],
    )
}

pub fn lower(expr: impl IntoTyped<types::Text>) -> TypedExpr<types::Text> {
    call("LOWER", vec![expr.into_typed().into_expr()])
}

pub fn upper(expr: impl IntoTyped<types::Text>) -> TypedExpr<types::Text> {
    call("UPPER", vec![expr.into_typed().into_expr()])
}

/// `SUBSTR(text, from, count)` with 1-based indexing.
pub fn substr(
    expr: impl IntoTyped<types::Text>,
    from: impl IntoTyped<types::Int>,
    count: impl IntoTyped<types::Int>,
) -> TypedExpr<types::Text> {
    call(
        "SUBSTR",
        vec![
            expr.into_typed().into_expr(),
            from.into_typed().into_expr(),
            count.into_typed().into_expr(),
        ],
    )
}

pub fn abs<T: Numeric>(expr: impl IntoTyped<T>) -> TypedExpr<T> {
    call("ABS", vec![expr.into_typed().into_expr()])
}

pub fn round(expr: impl IntoTyped<types::Float>) -> TypedExpr<types::Float> {
    call("ROUND", vec![expr.into_typed().into_expr()])
}

/// Rendered through the dialect's function-transform table where the
/// backend lacks the function (SQLite).
pub fn floor(expr: impl IntoTyped<types::Float>) -> TypedExpr<types::Float> {
    call("FLOOR", vec![expr.into_typed().into_expr()])
}

pub fn ceil(expr: impl IntoTyped<types::Float>) -> TypedExpr<types::Float> {
    call("CEIL", vec![expr.into_typed().into_expr()])
}

pub fn extract(
    field: DateTimeField,
    expr: impl IntoTyped<types::Timestamp>,
) -> TypedExpr<types::Float> {
    TypedExpr::new(Expr::Extract {
        field,
        expr: Box::new(expr.into_typed().into_expr()),
    })
}

/// A row value: `(a, b, ...)`.
pub fn row(items: Vec<Expr>) -> TypedExpr<types::RowTag> {
    TypedExpr::new(Expr::Row(items))
}

/// `EXISTS (sub-query)`.
pub fn exists(query: impl Into<SelectQuery>) -> TypedExpr<types::Bool> {
    TypedExpr::new(Expr::Exists(Box::new(query.into())))
}

/// `CAST(expr AS ty)`, spelled per dialect. The caller picks the resulting
/// tag: `cast::<types::Int, _>(price, "INTEGER")`.
pub fn cast<T: SqlType, E: IntoExpr>(expr: E, ty: &str) -> TypedExpr<T> {
    TypedExpr::new(Expr::Cast {
        expr: Box::new(expr.into_expr()),
        ty: ty.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Window functions
// ---------------------------------------------------------------------------

pub fn row_number() -> TypedExpr<types::Int> {
    call("ROW_NUMBER", Vec::new())
}

pub fn rank() -> TypedExpr<types::Int> {
    call("RANK", Vec::new())
}

pub fn dense_rank() -> TypedExpr<types::Int> {
    call("DENSE_RANK", Vec::new())
}

// ---------------------------------------------------------------------------
// CASE
// ---------------------------------------------------------------------------

/// Starts a CASE expression. The first `then` fixes the result tag:
///
/// ```ignore
/// case()
///     .when(total.gt(int(100))).then(text("large"))
///     .when(total.gt(int(10))).then(text("medium"))
///     .otherwise(text("small"))
/// ```
pub fn case() -> CaseBuilder {
    CaseBuilder(())
}

pub struct CaseBuilder(());

impl CaseBuilder {
    pub fn when(self, condition: impl IntoTyped<types::Bool>) -> CaseWhen {
        CaseWhen {
            condition: condition.into_typed().into_expr(),
        }
    }
}

pub struct CaseWhen {
    condition: Expr,
}

impl CaseWhen {
    pub fn then<T: SqlType>(self, result: impl IntoTyped<T>) -> CaseExpr<T> {
        CaseExpr {
            whens: vec![(self.condition, result.into_typed().into_expr())],
            _tag: std::marker::PhantomData,
        }
    }
}

pub struct CaseExpr<T: SqlType> {
    whens: Vec<(Expr, Expr)>,
    _tag: std::marker::PhantomData<T>,
}

impl<T: SqlType> CaseExpr<T> {
    pub fn when(self, condition: impl IntoTyped<types::Bool>) -> TypedCaseWhen<T> {
        TypedCaseWhen {
            whens: self.whens,
            condition: condition.into_typed().into_expr(),
            _tag: std::marker::PhantomData,
        }
    }

    /// Closes the CASE with an ELSE arm.
    pub fn otherwise(self, result: impl IntoTyped<T>) -> TypedExpr<T> {
        TypedExpr::new(Expr::Case {
            whens: self.whens,
            else_: Some(Box::new(result.into_typed().into_expr())),
        })
    }

    /// Closes the CASE without an ELSE arm; unmatched rows yield NULL.
    pub fn end(self) -> TypedExpr<T> {
        TypedExpr::new(Expr::Case {
            whens: self.whens,
            else_: None,
        })
    }
}

pub struct TypedCaseWhen<T: SqlType> {
    whens: Vec<(Expr, Expr)>,
    condition: Expr,
    _tag: std::marker::PhantomData<T>,
}

impl<T: SqlType> TypedCaseWhen<T> {
    pub fn then(mut self, result: impl IntoTyped<T>) -> CaseExpr<T> {
        self.whens
            .push((self.condition, result.into_typed().into_expr()));
        CaseExpr {
            whens: self.whens,
            _tag: std::marker::PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::expr::Window;
    use crate::ast::table::{Column, Table};
    use crate::dialect::Dialect;
    use crate::serialize::SqlBuilder;
    use crate::typed::{int, null, text, ExprOps, OrderedOps};

    fn render(expr: &Expr, dialect: &Dialect) -> String {
        let mut out = SqlBuilder::new(dialect, true);
        expr.write(&mut out).unwrap();
        out.finalize().0.trim_end_matches(';').to_string()
    }

    #[test]
    fn aggregates_render_their_arguments() {
        let table = Table::new("chinook", "Track");
        let ms: Column<types::Int> = table.column("Milliseconds");
        assert_eq!(
            render(count(&ms).expr(), &Dialect::postgres()),
            "COUNT(\"Track\".\"Milliseconds\")"
        );
        assert_eq!(render(count_star().expr(), &Dialect::postgres()), "COUNT(*)");
        assert_eq!(
            render(count_distinct(&ms).expr(), &Dialect::postgres()),
            "COUNT(DISTINCT \"Track\".\"Milliseconds\")"
        );
    }

    #[test]
    fn coalesce_takes_a_uniformly_tagged_list() {
        let expr = coalesce(vec![null::<types::Int>(), int(0)]);
        assert_eq!(render(expr.expr(), &Dialect::postgres()), "COALESCE(NULL, 0)");
    }

    #[test]
    fn case_builder_renders_all_arms() {
        let table = Table::new("chinook", "Invoice");
        let total: Column<types::Int> = table.column("Total");
        let expr = case()
            .when(total.gt(int(100)))
            .then(text("large"))
            .when(total.gt(int(10)))
            .then(text("medium"))
            .otherwise(text("small"));
        assert_eq!(
            render(expr.expr(), &Dialect::postgres()),
            "CASE WHEN \"Invoice\".\"Total\" > 100 THEN 'large' \
             WHEN \"Invoice\".\"Total\" > 10 THEN 'medium' ELSE 'small' END"
        );
    }

    #[test]
    fn cast_spells_per_dialect() {
        let expr = cast::<types::Int, _>(text("42"), "INTEGER");
        assert_eq!(
            render(expr.expr(), &Dialect::postgres()),
            "CAST('42' AS INTEGER)"
        );
    }

    #[test]
    fn window_call_renders_partition_and_order() {
        let table = Table::new("chinook", "Track");
        let album_id: Column<types::Int> = table.column("AlbumId");
        let ms: Column<types::Int> = table.column("Milliseconds");
        let expr = row_number().over(
            Window::new()
                .partition_by(vec![Expr::Column(album_id.column_ref().clone())])
                .order_by(vec![ms.desc()]),
        );
        assert_eq!(
            render(expr.expr(), &Dialect::postgres()),
            "ROW_NUMBER() OVER (PARTITION BY \"Track\".\"AlbumId\" ORDER BY \"Track\".\"Milliseconds\" DESC)"
        );
    }
}
