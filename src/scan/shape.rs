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

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::ast::value::{Interval, Value};
use crate::error::Error;
use crate::scan::plan::{Field, GroupPlan, ResolvedPlan};
use crate::scan::GroupNode;

/// A generated model record: the flat fields of one table, with its
/// declared group name and primary key. The schema generator emits one
/// implementation per table; hand-written implementations work the same
/// way.
pub trait Record: Sized {
    /// The group name, matching the table part of the projection labels.
    const GROUP: &'static str;
    /// Field names forming the identity; empty delegates to the scanner's
    /// fallback rules.
    const PRIMARY_KEY: &'static [&'static str];

    fn from_group(row: &GroupRow<'_>) -> Result<Self, Error>;
}

/// A destination shape: a plan describing its nested groups, and the
/// assembly of one instance from a grouped node. Every [`Record`] is a
/// leaf shape; composite shapes nest records via
/// [`ShapeNode::one`]/[`ShapeNode::optional`]/[`ShapeNode::many`].
pub trait Shape: Sized {
    fn plan() -> GroupPlan;
    fn from_node(node: &ShapeNode<'_>) -> Result<Self, Error>;
}

impl<R: Record> Shape for R {
    fn plan() -> GroupPlan {
        GroupPlan::record::<R>()
    }

    fn from_node(node: &ShapeNode<'_>) -> Result<Self, Error> {
        R::from_group(&node.row())
    }
}

/// Typed access to the cells of one group within one logical row.
pub struct GroupRow<'a> {
    pub(crate) group: &'a str,
    pub(crate) fields: &'a [Field],
    pub(crate) values: &'a [Value],
}

impl GroupRow<'_> {
    /// Reads a field by name, converting the cell to `V`. Mismatches fail
    /// with a `"Group.Field"`-qualified message.
    pub fn get<V: FromValue>(&self, field: &str) -> Result<V, Error> {
        let index = self
            .fields
            .iter()
            .position(|f| f.name == field)
            .ok_or_else(|| {
                Error::scan(format!(
                    "no column \"{}.{}\" in the result set",
                    self.group, field
                ))
            })?;
        V::from_value(&self.values[index]).map_err(|message| {
            Error::scan(format!(
                "column \"{}.{}\": {}",
                self.group, field, message
            ))
        })
    }
}

/// One grouped instance during assembly: its own cells plus its grouped
/// children.
pub struct ShapeNode<'a> {
    pub(crate) node: &'a GroupNode,
    pub(crate) plan: &'a ResolvedPlan,
}

impl ShapeNode<'_> {
    pub fn row(&self) -> GroupRow<'_> {
        GroupRow {
            group: &self.plan.group,
            fields: &self.plan.fields,
            values: &self.node.values,
        }
    }

    fn child(&self, index: usize) -> Result<(&ResolvedPlan, &super::GroupMap), Error> {
        match (self.plan.children.get(index), self.node.children.get(index)) {
            (Some((_, plan)), Some(map)) => Ok((plan, map)),
            _ => Err(Error::scan(format!(
                "shape child {} does not exist under group \"{}\"",
                index, self.plan.group
            ))),
        }
    }

    /// A required single child. Zero instances in the rows is a scan
    /// error, as is more than one distinct identity.
    pub fn one<S: Shape>(&self, index: usize) -> Result<S, Error> {
        let (plan, map) = self.child(index)?;
        match map.len() {
            0 => Err(Error::scan(format!(
                "required group \"{}\" is absent from the rows",
                plan.group
            ))),
            1 => S::from_node(&ShapeNode {
                node: &map[0],
                plan,
            }),
            n => Err(Error::scan(format!(
                "group \"{}\" is single but matched {} identities",
                plan.group, n
            ))),
        }
    }

    /// An optional single child: `None` until a row carries a non-null
    /// identity for it.
    pub fn optional<S: Shape>(&self, index: usize) -> Result<Option<S>, Error> {
        let (plan, map) = self.child(index)?;
        match map.len() {
            0 => Ok(None),
            1 => Ok(Some(S::from_node(&ShapeNode {
                node: &map[0],
                plan,
            })?)),
            n => Err(Error::scan(format!(
                "group \"{}\" is optional but matched {} identities",
                plan.group, n
            ))),
        }
    }

    /// A sequence child, in encounter order, deduplicated by identity.
    pub fn many<S: Shape>(&self, index: usize) -> Result<Vec<S>, Error> {
        let (plan, map) = self.child(index)?;
        map.values()
            .map(|node| S::from_node(&ShapeNode { node, plan }))
            .collect()
    }
}

/// Conversion from a result cell into a destination field. Strict: only
/// the matching [`Value`] variant converts, with checked narrowing for
/// `i32`/`i16` and `Option` for nullable fields.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, String>;
}

fn mismatch(value: &Value, expected: &str) -> String {
    match value {
        Value::Null => format!("unexpected NULL for a non-nullable {} field", expected),
        other => format!("cannot read {} as {}", other.type_name(), expected),
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Int(i) => Ok(*i),
            other => Err(mismatch(other, "int")),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Int(i) => i32::try_from(*i).map_err(|_| format!("{} overflows i32", i)),
            other => Err(mismatch(other, "int")),
        }
    }
}

impl FromValue for i16 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Int(i) => i16::try_from(*i).map_err(|_| format!("{} overflows i16", i)),
            other => Err(mismatch(other, "int")),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Float(f) => Ok(f.into_inner()),
            other => Err(mismatch(other, "float")),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch(other, "bool")),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            other => Err(mismatch(other, "text")),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            other => Err(mismatch(other, "bytes")),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Timestamp(ts) => Ok(*ts),
            other => Err(mismatch(other, "timestamp")),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Date(d) => Ok(*d),
            other => Err(mismatch(other, "date")),
        }
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Time(t) => Ok(*t),
            other => Err(mismatch(other, "time")),
        }
    }
}

impl FromValue for Interval {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Interval(i) => Ok(*i),
            other => Err(mismatch(other, "interval")),
        }
    }
}

impl<V: FromValue> FromValue for Option<V> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => V::from_value(other).map(Some),
        }
    }
}

/// Raw cell access; never fails.
impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        Ok(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_conversions_reject_other_variants() {
        assert_eq!(i64::from_value(&Value::Int(7)), Ok(7));
        assert!(i64::from_value(&Value::Text("7".into())).is_err());
        assert!(String::from_value(&Value::Int(7)).is_err());
    }

    #[test]
    fn narrowing_is_checked() {
        assert_eq!(i32::from_value(&Value::Int(7)), Ok(7));
        assert!(i32::from_value(&Value::Int(i64::MAX)).is_err());
    }

    #[test]
    fn option_absorbs_null() {
        assert_eq!(Option::<i64>::from_value(&Value::Null), Ok(None));
        assert_eq!(Option::<i64>::from_value(&Value::Int(3)), Ok(Some(3)));
        assert!(i64::from_value(&Value::Null).is_err());
    }
}
