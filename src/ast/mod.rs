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

//! The statement AST: values, expressions, identifier handles, clause
//! nodes and the five statement kinds.

pub mod dml;
pub mod expr;
pub mod select;
pub mod set;
pub mod table;
pub mod value;

pub use dml::{DeleteStatement, InsertStatement, OnConflict, UpdateStatement};
pub use expr::{BinaryOp, DateTimeField, Expr, UnaryOp, Window};
pub use select::{
    cte, select, with, with_recursive, Cte, IntoColumnList, IntoExprList, IntoOrderBy,
    IntoProjections, OrderByExpr, Projection, SelectQuery, SelectStatement, WithClause,
};
pub use set::{
    except, except_all, intersect, intersect_all, union, union_all, SetOperator, SetStatement,
};
pub use table::{
    Column, ColumnRef, ColumnSource, DerivedTable, JoinKind, Table, TableExpr, TableSource,
};
pub use value::{Interval, Value};
