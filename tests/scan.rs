//! Scanner scenarios: the self-join alias shape, a deeply nested
//! destination over a sorted row set, partial scans and the error cases.

mod common;

use common::*;
use ordered_float::OrderedFloat;
use pretty_assertions::assert_eq;
use sqlbuild::{scan_rows, Error, GroupPlan, Record, RowSet, Shape, ShapeNode, Value};

fn i(v: i64) -> Value {
    Value::Int(v)
}

fn t(v: &str) -> Value {
    Value::Text(v.to_string())
}

fn f(v: f64) -> Value {
    Value::Float(OrderedFloat(v))
}

fn n() -> Value {
    Value::Null
}

#[derive(Debug, PartialEq)]
struct EmployeeWithManager {
    employee: Employee,
    manager: Option<Employee>,
}

impl Shape for EmployeeWithManager {
    fn plan() -> GroupPlan {
        GroupPlan::record::<Employee>()
            .optional(GroupPlan::record::<Employee>().aliased("Manager"))
    }

    fn from_node(node: &ShapeNode<'_>) -> Result<Self, Error> {
        Ok(Self {
            employee: Employee::from_group(&node.row())?,
            manager: node.optional(0)?,
        })
    }
}

fn employee_columns(prefix: &str) -> Vec<String> {
    ["EmployeeId", "FirstName", "LastName", "ReportsTo"]
        .iter()
        .map(|c| format!("{}.{}", prefix, c))
        .collect()
}

#[test]
fn self_join_populates_the_manager_only_when_reports_to_is_set() {
    let mut columns = employee_columns("Employee");
    columns.extend(employee_columns("Manager"));
    let rows = RowSet::new(
        columns,
        vec![
            vec![i(1), t("Andrew"), t("Adams"), n(), n(), n(), n(), n()],
            vec![i(2), t("Nancy"), t("Edwards"), i(1), i(1), t("Andrew"), t("Adams"), n()],
        ],
    );

    let dest: Vec<EmployeeWithManager> = scan_rows(&rows).unwrap();
    assert_eq!(dest.len(), 2);
    assert_eq!(dest[0].employee.first_name, "Andrew");
    assert_eq!(dest[0].manager, None);
    let manager = dest[1].manager.as_ref().unwrap();
    assert_eq!(manager.employee_id, 1);
    assert_eq!(manager.last_name, "Adams");
}

#[derive(Debug, PartialEq)]
struct CustomerWithRep {
    customer: Customer,
    rep: Option<EmployeeWithManager>,
}

impl Shape for CustomerWithRep {
    fn plan() -> GroupPlan {
        GroupPlan::record::<Customer>().optional(EmployeeWithManager::plan())
    }

    fn from_node(node: &ShapeNode<'_>) -> Result<Self, Error> {
        Ok(Self {
            customer: Customer::from_group(&node.row())?,
            rep: node.optional(0)?,
        })
    }
}

#[derive(Debug, PartialEq)]
struct InvoiceTree {
    invoice: Invoice,
    customer: CustomerWithRep,
}

impl Shape for InvoiceTree {
    fn plan() -> GroupPlan {
        GroupPlan::record::<Invoice>().one(CustomerWithRep::plan())
    }

    fn from_node(node: &ShapeNode<'_>) -> Result<Self, Error> {
        Ok(Self {
            invoice: Invoice::from_group(&node.row())?,
            customer: node.one(0)?,
        })
    }
}

#[derive(Debug, PartialEq)]
struct TrackTree {
    track: Track,
    invoices: Vec<InvoiceTree>,
}

impl Shape for TrackTree {
    fn plan() -> GroupPlan {
        GroupPlan::record::<Track>().many(InvoiceTree::plan())
    }

    fn from_node(node: &ShapeNode<'_>) -> Result<Self, Error> {
        Ok(Self {
            track: Track::from_group(&node.row())?,
            invoices: node.many(0)?,
        })
    }
}

#[derive(Debug, PartialEq)]
struct AlbumTree {
    album: Album,
    tracks: Vec<TrackTree>,
}

impl Shape for AlbumTree {
    fn plan() -> GroupPlan {
        GroupPlan::record::<Album>().many(TrackTree::plan())
    }

    fn from_node(node: &ShapeNode<'_>) -> Result<Self, Error> {
        Ok(Self {
            album: Album::from_group(&node.row())?,
            tracks: node.many(0)?,
        })
    }
}

#[derive(Debug, PartialEq)]
struct ArtistTree {
    artist: Artist,
    albums: Vec<AlbumTree>,
}

impl Shape for ArtistTree {
    fn plan() -> GroupPlan {
        GroupPlan::record::<Artist>().many(AlbumTree::plan())
    }

    fn from_node(node: &ShapeNode<'_>) -> Result<Self, Error> {
        Ok(Self {
            artist: Artist::from_group(&node.row())?,
            albums: node.many(0)?,
        })
    }
}

fn joined_everything_columns() -> Vec<String> {
    let mut columns: Vec<String> = [
        "Artist.ArtistId",
        "Artist.Name",
        "Album.AlbumId",
        "Album.Title",
        "Album.ArtistId",
        "Track.TrackId",
        "Track.Name",
        "Track.AlbumId",
        "Track.Milliseconds",
        "Invoice.InvoiceId",
        "Invoice.CustomerId",
        "Invoice.Total",
        "Customer.CustomerId",
        "Customer.FirstName",
        "Customer.LastName",
        "Customer.SupportRepId",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect();
    columns.extend(employee_columns("Employee"));
    columns.extend(employee_columns("Manager"));
    columns
}

/// Rows sorted by the primary-key chain from the outermost group inward,
/// the way the ORDER BY contract requires.
fn joined_everything_rows() -> RowSet {
    let track1_invoice = vec![
        i(1), t("AC/DC"),
        i(1), t("For Those About To Rock We Salute You"), i(1),
        i(1), t("Breaking The Rules"), i(1), i(263288),
        i(10), i(100), f(3.96),
        i(100), t("Frank"), t("Harris"), i(3),
        i(3), t("Jane"), t("Peacock"), i(1),
        i(1), t("Andrew"), t("Adams"), n(),
    ];
    // Same album through a second track; the album must deduplicate.
    let track2_no_invoice = vec![
        i(1), t("AC/DC"),
        i(1), t("For Those About To Rock We Salute You"), i(1),
        i(2), t("Put The Finger On You"), i(1), i(205662),
        n(), n(), n(),
        n(), n(), n(), n(),
        n(), n(), n(), n(),
        n(), n(), n(), n(),
    ];
    // A second album; its invoice's customer has no support rep.
    let track3_invoice_no_rep = vec![
        i(1), t("AC/DC"),
        i(2), t("Let There Be Rock"), i(1),
        i(3), t("Go Down"), i(2), i(331180),
        i(11), i(101), f(5.94),
        i(101), t("Astrid"), t("Gruber"), n(),
        n(), n(), n(), n(),
        n(), n(), n(), n(),
    ];
    // An artist with no albums at all.
    let artist_without_albums = vec![
        i(2), t("Accept"),
        n(), n(), n(),
        n(), n(), n(), n(),
        n(), n(), n(),
        n(), n(), n(), n(),
        n(), n(), n(), n(),
        n(), n(), n(), n(),
    ];
    RowSet::new(
        joined_everything_columns(),
        vec![
            track1_invoice,
            track2_no_invoice,
            track3_invoice_no_rep,
            artist_without_albums,
        ],
    )
}

#[test]
fn nested_shape_reconstructs_the_object_graph() {
    let dest: Vec<ArtistTree> = scan_rows(&joined_everything_rows()).unwrap();

    // One entry per distinct non-null outer primary key.
    assert_eq!(dest.len(), 2);

    let acdc = &dest[0];
    assert_eq!(acdc.artist.name.as_deref(), Some("AC/DC"));
    assert_eq!(acdc.albums.len(), 2);

    let first_album = &acdc.albums[0];
    assert_eq!(first_album.album.title, "For Those About To Rock We Salute You");
    assert_eq!(first_album.tracks.len(), 2);

    let sold_track = &first_album.tracks[0];
    assert_eq!(sold_track.invoices.len(), 1);
    let invoice = &sold_track.invoices[0];
    assert_eq!(invoice.invoice.total, 3.96);
    assert_eq!(invoice.customer.customer.last_name, "Harris");
    let rep = invoice.customer.rep.as_ref().unwrap();
    assert_eq!(rep.employee.first_name, "Jane");
    assert_eq!(rep.manager.as_ref().unwrap().first_name, "Andrew");

    let unsold_track = &first_album.tracks[1];
    assert!(unsold_track.invoices.is_empty());

    let second_album = &acdc.albums[1];
    assert_eq!(second_album.tracks.len(), 1);
    let no_rep_invoice = &second_album.tracks[0].invoices[0];
    assert_eq!(no_rep_invoice.customer.rep, None);

    let accept = &dest[1];
    assert_eq!(accept.artist.name.as_deref(), Some("Accept"));
    assert!(accept.albums.is_empty());
}

#[test]
fn outer_collection_matches_distinct_outer_keys() {
    let rows = joined_everything_rows();
    let dest: Vec<ArtistTree> = scan_rows(&rows).unwrap();

    let mut distinct = std::collections::HashSet::new();
    let artist_id_column = rows
        .columns
        .iter()
        .position(|c| c == "Artist.ArtistId")
        .unwrap();
    for row in &rows.rows {
        if !row[artist_id_column].is_null() {
            distinct.insert(row[artist_id_column].clone());
        }
    }
    assert_eq!(dest.len(), distinct.len());
}

#[test]
fn projection_groups_without_a_destination_are_ignored() {
    // The full joined row set scans into the flat Artist model: every
    // other group is simply not claimed.
    let dest: Vec<Artist> = scan_rows(&joined_everything_rows()).unwrap();
    assert_eq!(dest.len(), 2);
}

#[test]
fn destination_group_missing_from_the_rows_fails() {
    let rows = RowSet::new(
        vec!["Artist.ArtistId".into(), "Artist.Name".into()],
        vec![vec![i(1), t("AC/DC")]],
    );
    let err = scan_rows::<ArtistTree>(&rows).unwrap_err();
    assert!(err.to_string().contains("\"Album\""));
}

#[test]
fn required_single_group_must_be_present() {
    let mut columns = vec![
        "Invoice.InvoiceId".to_string(),
        "Invoice.CustomerId".to_string(),
        "Invoice.Total".to_string(),
        "Customer.CustomerId".to_string(),
        "Customer.FirstName".to_string(),
        "Customer.LastName".to_string(),
        "Customer.SupportRepId".to_string(),
    ];
    columns.extend(employee_columns("Employee"));
    columns.extend(employee_columns("Manager"));
    let rows = RowSet::new(
        columns,
        vec![vec![
            i(10), i(100), f(1.98),
            n(), n(), n(), n(),
            n(), n(), n(), n(),
            n(), n(), n(), n(),
        ]],
    );
    let err = scan_rows::<InvoiceTree>(&rows).unwrap_err();
    assert!(err.to_string().contains("\"Customer\""));
}

#[test]
fn interleaved_identities_still_group_by_key() {
    // The caller owns the ordering contract, but grouping is keyed on
    // identity per parent, so interleaved rows still land in well-formed
    // output.
    let rows = RowSet::new(
        vec![
            "Album.AlbumId".into(),
            "Album.Title".into(),
            "Album.ArtistId".into(),
            "Track.TrackId".into(),
            "Track.Name".into(),
            "Track.AlbumId".into(),
            "Track.Milliseconds".into(),
        ],
        vec![
            vec![i(1), t("A"), i(1), i(1), t("t1"), i(1), i(100)],
            vec![i(2), t("B"), i(1), i(3), t("t3"), i(2), i(100)],
            vec![i(1), t("A"), i(1), i(2), t("t2"), i(1), i(100)],
        ],
    );
    let dest: Vec<AlbumTree> = scan_rows(&rows).unwrap();
    assert_eq!(dest.len(), 2);
    assert_eq!(dest[0].tracks.len(), 2);
    assert_eq!(dest[1].tracks.len(), 1);
}
