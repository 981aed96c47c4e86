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

//! The row scanner: reassembles a flat, joined result set into nested
//! destination values.
//!
//! Every projected column is labelled `"Table.Column"`; the scanner splits
//! each label on its first dot, matches the group part against the
//! destination's [`GroupPlan`], and groups rows by primary-key identity —
//! per parent instance, in encounter order. The caller keeps rows sorted by
//! the primary-key chain from the outermost group inward (the ORDER BY
//! contract); unsorted input still produces well-formed output, but
//! non-contiguous duplicates surface as separate records.

mod plan;
mod shape;

pub use plan::{GroupPlan, Relation};
pub use shape::{FromValue, GroupRow, Record, Shape, ShapeNode};

use indexmap::IndexMap;

use crate::ast::value::Value;
use crate::error::Error;
use plan::{resolve, ResolvedPlan};

/// A fully drained result set: column labels plus row cells. This is what
/// the executor hands over after the driver finishes streaming.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }
}

/// Splits a projection label on its first dot into `(group, field)`.
/// Labels without a dot are flat fields of the outermost record.
pub(crate) fn split_label(label: &str) -> (Option<&str>, &str) {
    match label.find('.') {
        Some(dot) => (Some(&label[..dot]), &label[dot + 1..]),
        None => (None, label),
    }
}

/// Siblings of one group under one parent instance, keyed by identity,
/// iterated in first-seen order.
pub(crate) type GroupMap = IndexMap<Vec<Value>, GroupNode>;

/// One grouped instance: its cell snapshot (from the first row that
/// introduced its identity) and one sibling map per planned child.
#[derive(Debug, Clone)]
pub(crate) struct GroupNode {
    pub(crate) values: Vec<Value>,
    pub(crate) children: Vec<GroupMap>,
}

/// Scans a result set into a vector of destination values, one per
/// distinct non-null root identity.
pub fn scan_rows<T: Shape>(rows: &RowSet) -> Result<Vec<T>, Error> {
    let plan = T::plan();
    let resolved = resolve(&plan, &rows.columns)?;

    let mut roots = GroupMap::new();
    for (index, row) in rows.rows.iter().enumerate() {
        if row.len() != rows.columns.len() {
            return Err(Error::scan(format!(
                "row {} has {} cells for {} columns",
                index,
                row.len(),
                rows.columns.len()
            )));
        }
        insert_row(&mut roots, &resolved, row);
    }

    roots
        .values()
        .map(|node| {
            T::from_node(&ShapeNode {
                node,
                plan: &resolved,
            })
        })
        .collect()
}

/// Scans a result set expected to hold at least one root record.
pub fn scan_one<T: Shape>(rows: &RowSet) -> Result<T, Error> {
    scan_rows::<T>(rows)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::scan("result set is empty".to_string()))
}

/// The single grouping pass: walk the plan top-down for one row, find or
/// create the instance carrying this row's identity at each level, recurse
/// into the children. An identity that is NULL across all of its key
/// columns marks the group absent for this row, and absence propagates
/// downward.
fn insert_row(map: &mut GroupMap, plan: &ResolvedPlan, row: &[Value]) {
    let key: Vec<Value> = plan
        .pk
        .iter()
        .map(|&field| row[plan.fields[field].column].clone())
        .collect();
    if key.iter().all(Value::is_null) {
        return;
    }

    let node = map.entry(key).or_insert_with(|| GroupNode {
        values: plan.fields.iter().map(|f| row[f.column].clone()).collect(),
        children: plan.children.iter().map(|_| GroupMap::new()).collect(),
    });

    for (index, (_, child)) in plan.children.iter().enumerate() {
        insert_row(&mut node.children[index], child, row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Album {
        album_id: i64,
        title: String,
    }

    impl Record for Album {
        const GROUP: &'static str = "Album";
        const PRIMARY_KEY: &'static [&'static str] = &["AlbumId"];

        fn from_group(row: &GroupRow<'_>) -> Result<Self, Error> {
            Ok(Self {
                album_id: row.get("AlbumId")?,
                title: row.get("Title")?,
            })
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Track {
        track_id: i64,
        name: String,
    }

    impl Record for Track {
        const GROUP: &'static str = "Track";
        const PRIMARY_KEY: &'static [&'static str] = &["TrackId"];

        fn from_group(row: &GroupRow<'_>) -> Result<Self, Error> {
            Ok(Self {
                track_id: row.get("TrackId")?,
                name: row.get("Name")?,
            })
        }
    }

    #[derive(Debug, PartialEq)]
    struct AlbumWithTracks {
        album: Album,
        tracks: Vec<Track>,
    }

    impl Shape for AlbumWithTracks {
        fn plan() -> GroupPlan {
            GroupPlan::record::<Album>().many(GroupPlan::record::<Track>())
        }

        fn from_node(node: &ShapeNode<'_>) -> Result<Self, Error> {
            Ok(Self {
                album: Album::from_group(&node.row())?,
                tracks: node.many(0)?,
            })
        }
    }

    fn cell(i: i64) -> Value {
        Value::Int(i)
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn album_track_rows() -> RowSet {
        RowSet::new(
            vec![
                "Album.AlbumId".into(),
                "Album.Title".into(),
                "Track.TrackId".into(),
                "Track.Name".into(),
            ],
            vec![
                vec![cell(1), text("For Those About To Rock"), cell(1), text("Breaking The Law")],
                vec![cell(1), text("For Those About To Rock"), cell(2), text("Balls to the Wall")],
                vec![cell(2), text("Restless and Wild"), Value::Null, Value::Null],
            ],
        )
    }

    #[test]
    fn flat_scan_returns_one_record_per_identity() {
        let rows = RowSet::new(
            vec!["Album.AlbumId".into(), "Album.Title".into()],
            vec![
                vec![cell(1), text("A")],
                vec![cell(2), text("B")],
                vec![cell(2), text("B")],
            ],
        );
        let albums: Vec<Album> = scan_rows(&rows).unwrap();
        assert_eq!(albums.len(), 2);
        assert_eq!(albums[0].title, "A");
    }

    #[test]
    fn sequences_dedup_by_identity_and_keep_order() {
        let albums: Vec<AlbumWithTracks> = scan_rows(&album_track_rows()).unwrap();
        assert_eq!(albums.len(), 2);
        assert_eq!(albums[0].tracks.len(), 2);
        assert_eq!(albums[0].tracks[0].name, "Breaking The Law");
        assert!(albums[1].tracks.is_empty());
    }

    #[test]
    fn null_identity_marks_the_group_absent() {
        let rows = RowSet::new(
            vec!["Album.AlbumId".into(), "Album.Title".into()],
            vec![vec![Value::Null, Value::Null], vec![cell(1), text("A")]],
        );
        let albums: Vec<Album> = scan_rows(&rows).unwrap();
        assert_eq!(albums.len(), 1);
    }

    #[test]
    fn scan_one_requires_a_row() {
        let empty = RowSet::new(
            vec!["Album.AlbumId".into(), "Album.Title".into()],
            Vec::new(),
        );
        assert!(matches!(scan_one::<Album>(&empty), Err(Error::Scan(_))));
    }

    #[test]
    fn type_mismatch_names_the_column() {
        let rows = RowSet::new(
            vec!["Album.AlbumId".into(), "Album.Title".into()],
            vec![vec![text("not an id"), text("A")]],
        );
        let err = scan_rows::<Album>(&rows).unwrap_err();
        assert!(err.to_string().contains("\"Album.AlbumId\""));
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let rows = RowSet::new(
            vec!["Album.AlbumId".into(), "Album.Title".into()],
            vec![vec![cell(1)]],
        );
        assert!(matches!(scan_rows::<Album>(&rows), Err(Error::Scan(_))));
    }
}
