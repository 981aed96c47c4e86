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

//! Type-safe SQL query construction and result mapping.
//!
//! Statements are composed as immutable values through a fluent builder
//! that mirrors SQL, serialized against a per-backend [`Dialect`] into
//! parameterized text, and — once executed — their flat, joined result
//! sets are reassembled into nested destination values by the row
//! scanner.
//!
//! ```ignore
//! let album = Album::new();
//! let stmt = album
//!     .select(album.all_columns())
//!     .where_(album.artist_id.eq(int(1)))
//!     .order_by(album.album_id.asc());
//!
//! let (sql, args) = stmt.sql(&Dialect::postgres())?;
//! let rows: Vec<model::Album> = stmt.query(&Dialect::postgres(), &mut conn)?;
//! ```
//!
//! Construction is permissive: malformed chains (an empty projection, a
//! set statement with one operand) fail when serialized, not when built.
//! Statement values never mutate on serialization, so they can be shared
//! and rendered concurrently.

pub mod ast;
pub mod dialect;
pub mod error;
pub mod exec;
pub mod func;
pub mod scan;
pub mod serialize;
pub mod typed;

pub use ast::{
    cte, except, except_all, intersect, intersect_all, select, union, union_all, with,
    with_recursive, BinaryOp, Column, ColumnRef, ColumnSource, Cte, DateTimeField,
    DeleteStatement, DerivedTable, Expr, InsertStatement, Interval, IntoColumnList,
    IntoExprList, IntoOrderBy, IntoProjections, JoinKind, OnConflict, OrderByExpr, Projection,
    SelectQuery, SelectStatement, SetOperator, SetStatement, Table, TableExpr, TableSource,
    UnaryOp, UpdateStatement, Value, Window, WithClause,
};
pub use dialect::Dialect;
pub use error::Error;
pub use exec::{CancelToken, Connection, DriverError, Execute};
pub use func::{
    abs, avg, case, cast, ceil, coalesce, count, count_distinct, count_star, dense_rank, exists,
    extract, floor, lower, max, min, nullif, rank, round, row, row_number, substr, sum, upper,
};
pub use scan::{
    scan_one, scan_rows, FromValue, GroupPlan, GroupRow, Record, Relation, RowSet, Shape,
    ShapeNode,
};
pub use serialize::{SqlBuilder, Statement};
pub use typed::{
    boolean, bytes, date, enum_value, float, int, interval, null, text, time, timestamp, types,
    BoolOps, ExprOps, IntoExpr, IntoTyped, Numeric, NumericOps, Orderable, OrderedOps, SqlType,
    TextOps, TypedExpr,
};

/// The traits and constructors a statement-building file usually wants in
/// scope.
pub mod prelude {
    pub use crate::ast::table::{ColumnSource, TableSource};
    pub use crate::ast::{
        cte, except, except_all, intersect, intersect_all, select, union, union_all, with,
        with_recursive,
    };
    pub use crate::dialect::Dialect;
    pub use crate::error::Error;
    pub use crate::exec::{CancelToken, Connection, Execute};
    pub use crate::func::*;
    pub use crate::scan::{
        scan_one, scan_rows, FromValue, GroupPlan, GroupRow, Record, RowSet, Shape, ShapeNode,
    };
    pub use crate::serialize::Statement;
    pub use crate::typed::{
        boolean, bytes, date, enum_value, float, int, interval, null, text, time, timestamp,
        types, BoolOps, ExprOps, IntoExpr, IntoTyped, NumericOps, OrderedOps, TextOps,
    };
}
