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

use crate::error::Error;
use crate::scan::shape::Record;
use crate::scan::split_label;

/// How a nested group relates to its parent in a destination shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Exactly one record; its absence from the rows is a scan error.
    One,
    /// Zero or one record; absent when no row carries a non-null identity.
    Optional,
    /// A sequence, appended in encounter order and deduplicated by
    /// identity.
    Many,
}

/// The precomputed description of a destination type: its group name, its
/// primary-key fields and its nested children. Plans are plain immutable
/// data; computing one has no per-row cost and the same plan value can be
/// shared between scans and threads.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPlan {
    pub(crate) group: String,
    pub(crate) primary_key: Vec<String>,
    pub(crate) children: Vec<(Relation, GroupPlan)>,
}

impl GroupPlan {
    /// The plan of a generated model record: its declared group name and
    /// primary key, no children.
    pub fn record<R: Record>() -> Self {
        Self {
            group: R::GROUP.to_string(),
            primary_key: R::PRIMARY_KEY.iter().map(|k| k.to_string()).collect(),
            children: Vec::new(),
        }
    }

    /// A plan for a group known only by name; the primary key falls back
    /// to the `Id`-suffix rule, then to whole-row identity.
    pub fn named(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            primary_key: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Renames the group this plan matches, the way an `alias` annotation
    /// overrides a record's declared name (the self-join `Manager` case).
    #[must_use]
    pub fn aliased(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    #[must_use]
    pub fn one(mut self, child: GroupPlan) -> Self {
        self.children.push((Relation::One, child));
        self
    }

    #[must_use]
    pub fn optional(mut self, child: GroupPlan) -> Self {
        self.children.push((Relation::Optional, child));
        self
    }

    #[must_use]
    pub fn many(mut self, child: GroupPlan) -> Self {
        self.children.push((Relation::Many, child));
        self
    }
}

/// One projected column claimed by a group: its index in the row and its
/// field name (the label part after the dot).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Field {
    pub(crate) column: usize,
    pub(crate) name: String,
}

/// A plan bound to a concrete column list.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedPlan {
    pub(crate) group: String,
    pub(crate) fields: Vec<Field>,
    /// Indices into `fields` forming the identity key.
    pub(crate) pk: Vec<usize>,
    pub(crate) children: Vec<(Relation, ResolvedPlan)>,
}

/// Binds a plan tree to the labels of a row set. Every group in the plan
/// must claim at least one column; columns belonging to no planned group
/// are ignored, permitting partial scans.
pub(crate) fn resolve(plan: &GroupPlan, columns: &[String]) -> Result<ResolvedPlan, Error> {
    resolve_node(plan, columns, true)
}

fn resolve_node(
    plan: &GroupPlan,
    columns: &[String],
    is_root: bool,
) -> Result<ResolvedPlan, Error> {
    let mut fields = Vec::new();
    for (column, label) in columns.iter().enumerate() {
        match split_label(label) {
            (Some(group), name) if group == plan.group => fields.push(Field {
                column,
                name: name.to_string(),
            }),
            // Labels without a group belong to the outermost record.
            (None, name) if is_root => fields.push(Field {
                column,
                name: name.to_string(),
            }),
            _ => {}
        }
    }
    if fields.is_empty() {
        return Err(Error::scan(format!(
            "no projected columns for group \"{}\"",
            plan.group
        )));
    }

    let pk = primary_key_fields(plan, &fields);

    let mut children = Vec::with_capacity(plan.children.len());
    for (relation, child) in &plan.children {
        children.push((*relation, resolve_node(child, columns, false)?));
    }

    Ok(ResolvedPlan {
        group: plan.group.clone(),
        fields,
        pk,
        children,
    })
}

/// Identity discovery: an explicitly declared primary key wins; else the
/// first `Id`-named or `Id`-suffixed field; else every field of the group.
fn primary_key_fields(plan: &GroupPlan, fields: &[Field]) -> Vec<usize> {
    let declared: Vec<usize> = plan
        .primary_key
        .iter()
        .filter_map(|key| fields.iter().position(|f| &f.name == key))
        .collect();
    if !declared.is_empty() {
        return declared;
    }
    if let Some(id) = fields
        .iter()
        .position(|f| f.name == "Id" || f.name.ends_with("Id"))
    {
        return vec![id];
    }
    (0..fields.len()).collect()
}
