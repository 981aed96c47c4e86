//! Serializer scenarios against the chinook schema: exact debug SQL,
//! argument lists, and the sharing/idempotence guarantees.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use sqlbuild::prelude::*;
use sqlbuild::Value;

fn pg() -> Dialect {
    Dialect::postgres()
}

#[test]
fn select_all_columns_ordered() {
    let album = AlbumTable::new();
    let stmt = album
        .select(album.all_columns())
        .order_by(album.album_id.asc());

    let expected = "\
SELECT \"Album\".\"AlbumId\" AS \"Album.AlbumId\",
     \"Album\".\"Title\" AS \"Album.Title\",
     \"Album\".\"ArtistId\" AS \"Album.ArtistId\"
FROM chinook.\"Album\"
ORDER BY \"Album\".\"AlbumId\" ASC;";

    assert_eq!(stmt.debug_sql(&pg()).unwrap(), expected);

    let (sql, args) = stmt.sql(&pg()).unwrap();
    assert_eq!(sql, expected);
    assert!(args.is_empty());
}

#[test]
fn serialization_never_mutates_the_statement() {
    let album = AlbumTable::new();
    let stmt = album
        .select(album.all_columns())
        .where_(album.album_id.eq(int(1)))
        .order_by(album.album_id.asc());

    let first = stmt.sql(&pg()).unwrap();
    let second = stmt.sql(&pg()).unwrap();
    assert_eq!(first, second);

    // Two independently consumed references to a shared statement.
    let shared = &stmt;
    assert_eq!(shared.debug_sql(&pg()).unwrap(), stmt.debug_sql(&pg()).unwrap());
}

#[test]
fn self_join_with_an_aliased_table() {
    let employee = EmployeeTable::new();
    let manager = employee.as_("Manager");

    let stmt = employee
        .left_join(&manager, employee.reports_to.eq(&manager.employee_id))
        .select((
            &employee.employee_id,
            &employee.first_name,
            &employee.last_name,
            &manager.employee_id,
            &manager.first_name,
            &manager.last_name,
        ))
        .order_by(&employee.employee_id);

    assert_eq!(
        stmt.debug_sql(&pg()).unwrap(),
        "\
SELECT \"Employee\".\"EmployeeId\" AS \"Employee.EmployeeId\",
     \"Employee\".\"FirstName\" AS \"Employee.FirstName\",
     \"Employee\".\"LastName\" AS \"Employee.LastName\",
     \"Manager\".\"EmployeeId\" AS \"Manager.EmployeeId\",
     \"Manager\".\"FirstName\" AS \"Manager.FirstName\",
     \"Manager\".\"LastName\" AS \"Manager.LastName\"
FROM chinook.\"Employee\"
     LEFT JOIN chinook.\"Employee\" AS \"Manager\" ON (\"Employee\".\"ReportsTo\" = \"Manager\".\"EmployeeId\")
ORDER BY \"Employee\".\"EmployeeId\";"
    );
}

#[test]
fn union_all_parenthesizes_operands_and_orders_by_label() {
    let album = AlbumTable::new();
    let stmt = union_all(vec![
        album
            .select(album.all_columns())
            .where_(album.album_id.eq(int(1))),
        album
            .select(album.all_columns())
            .where_(album.album_id.eq(int(2))),
    ])
    .order_by(&album.album_id);

    assert_eq!(
        stmt.debug_sql(&pg()).unwrap(),
        "\
(
     SELECT \"Album\".\"AlbumId\" AS \"Album.AlbumId\",
          \"Album\".\"Title\" AS \"Album.Title\",
          \"Album\".\"ArtistId\" AS \"Album.ArtistId\"
     FROM chinook.\"Album\"
     WHERE \"Album\".\"AlbumId\" = 1
)
UNION ALL
(
     SELECT \"Album\".\"AlbumId\" AS \"Album.AlbumId\",
          \"Album\".\"Title\" AS \"Album.Title\",
          \"Album\".\"ArtistId\" AS \"Album.ArtistId\"
     FROM chinook.\"Album\"
     WHERE \"Album\".\"AlbumId\" = 2
)
ORDER BY \"Album.AlbumId\";"
    );

    let (sql, args) = stmt.sql(&pg()).unwrap();
    assert_eq!(args, vec![Value::Int(1), Value::Int(2)]);
    assert!(sql.contains("WHERE \"Album\".\"AlbumId\" = $1"));
    assert!(sql.contains("WHERE \"Album\".\"AlbumId\" = $2"));

    // Inlining the args into the parameterized form reproduces the debug
    // text.
    let inlined = sql.replace("$1", "1").replace("$2", "2");
    assert_eq!(inlined, stmt.debug_sql(&pg()).unwrap());
}

#[test]
fn sub_queries_requalify_their_projection_labels() {
    let artist = ArtistTable::new();
    let album = AlbumTable::new();

    let first10_artist = artist
        .select(artist.all_columns())
        .order_by(&artist.artist_id)
        .limit(10)
        .as_table("first10Artist");
    let artist_id = artist.artist_id.from_source(&first10_artist);

    let first10_albums = album
        .select(album.all_columns())
        .order_by(&album.album_id)
        .limit(10)
        .as_table("first10Albums");
    let album_artist_id = album.artist_id.from_source(&first10_albums);

    let stmt = first10_artist
        .inner_join(&first10_albums, artist_id.eq(&album_artist_id))
        .select((first10_artist.all_columns(), first10_albums.all_columns()))
        .order_by(&artist_id);

    assert_eq!(
        stmt.debug_sql(&pg()).unwrap(),
        "\
SELECT \"first10Artist\".\"Artist.ArtistId\" AS \"Artist.ArtistId\",
     \"first10Artist\".\"Artist.Name\" AS \"Artist.Name\",
     \"first10Albums\".\"Album.AlbumId\" AS \"Album.AlbumId\",
     \"first10Albums\".\"Album.Title\" AS \"Album.Title\",
     \"first10Albums\".\"Album.ArtistId\" AS \"Album.ArtistId\"
FROM (
          SELECT \"Artist\".\"ArtistId\" AS \"Artist.ArtistId\",
               \"Artist\".\"Name\" AS \"Artist.Name\"
          FROM chinook.\"Artist\"
          ORDER BY \"Artist\".\"ArtistId\"
          LIMIT 10
     ) AS \"first10Artist\"
     INNER JOIN (
          SELECT \"Album\".\"AlbumId\" AS \"Album.AlbumId\",
               \"Album\".\"Title\" AS \"Album.Title\",
               \"Album\".\"ArtistId\" AS \"Album.ArtistId\"
          FROM chinook.\"Album\"
          ORDER BY \"Album\".\"AlbumId\"
          LIMIT 10
     ) AS \"first10Albums\" ON (\"first10Artist\".\"Artist.ArtistId\" = \"first10Albums\".\"Album.ArtistId\")
ORDER BY \"first10Artist\".\"Artist.ArtistId\";"
    );

    let (_, args) = stmt.sql(&pg()).unwrap();
    assert_eq!(args, vec![Value::Int(10), Value::Int(10)]);
}

#[test]
fn schema_rebind_flows_into_derived_tables() {
    let artist2 = ArtistTable::new().from_schema("chinook2");
    let album2 = AlbumTable::new().from_schema("chinook2");

    let first10_artist = artist2
        .select(artist2.all_columns())
        .order_by(&artist2.artist_id)
        .limit(10)
        .as_table("first10Artist");
    let artist_id = artist2.artist_id.from_source(&first10_artist);

    let first10_albums = album2
        .select(album2.all_columns())
        .order_by(&album2.album_id)
        .limit(10)
        .as_table("first10Albums");
    let album_artist_id = album2.artist_id.from_source(&first10_albums);

    let stmt = select((first10_artist.all_columns(), first10_albums.all_columns()))
        .from(&first10_artist.inner_join(&first10_albums, artist_id.eq(&album_artist_id)))
        .order_by(&artist_id);

    let sql = stmt.debug_sql(&pg()).unwrap();
    assert!(sql.contains("FROM chinook2.\"Artist\""));
    assert!(sql.contains("FROM chinook2.\"Album\""));
    assert!(sql.contains("\"first10Artist\".\"Artist.ArtistId\" AS \"Artist.ArtistId\""));
}

#[test]
fn rebinding_a_missing_column_surfaces_at_serialization() {
    let artist = ArtistTable::new();
    let album = AlbumTable::new();

    let first10_artist = artist
        .select(&artist.artist_id)
        .limit(10)
        .as_table("first10Artist");
    // Album.Title is not projected by first10Artist.
    let missing = album.title.from_source(&first10_artist);

    let stmt = select(&missing).from(&first10_artist);
    let err = stmt.sql(&pg()).unwrap_err();
    assert!(err.to_string().contains("Album.Title"));
}

#[test]
fn cross_join_omits_the_on_clause() {
    let album = AlbumTable::new();
    let track = TrackTable::new();
    let stmt = album
        .cross_join(&track)
        .select((&album.album_id, &track.track_id));

    assert_eq!(
        stmt.debug_sql(&pg()).unwrap(),
        "\
SELECT \"Album\".\"AlbumId\" AS \"Album.AlbumId\",
     \"Track\".\"TrackId\" AS \"Track.TrackId\"
FROM chinook.\"Album\"
     CROSS JOIN chinook.\"Track\";"
    );
}

#[test]
fn join_chain_keeps_every_join_at_the_same_depth() {
    let artist = ArtistTable::new();
    let album = AlbumTable::new();
    let track = TrackTable::new();

    let stmt = artist
        .left_join(&album, artist.artist_id.eq(&album.artist_id))
        .left_join(&track, track.album_id.eq(&album.album_id))
        .select((&artist.artist_id, &album.album_id, &track.track_id))
        .order_by((&artist.artist_id, &album.album_id, &track.track_id));

    assert_eq!(
        stmt.debug_sql(&pg()).unwrap(),
        "\
SELECT \"Artist\".\"ArtistId\" AS \"Artist.ArtistId\",
     \"Album\".\"AlbumId\" AS \"Album.AlbumId\",
     \"Track\".\"TrackId\" AS \"Track.TrackId\"
FROM chinook.\"Artist\"
     LEFT JOIN chinook.\"Album\" ON (\"Artist\".\"ArtistId\" = \"Album\".\"ArtistId\")
     LEFT JOIN chinook.\"Track\" ON (\"Track\".\"AlbumId\" = \"Album\".\"AlbumId\")
ORDER BY \"Artist\".\"ArtistId\", \"Album\".\"AlbumId\", \"Track\".\"TrackId\";"
    );
}

#[test]
fn projection_labels_round_trip() {
    let album = AlbumTable::new();
    let labels: Vec<String> = album
        .all_columns()
        .iter()
        .map(|p| p.label().unwrap())
        .collect();
    assert_eq!(labels, vec!["Album.AlbumId", "Album.Title", "Album.ArtistId"]);
    for label in labels {
        let (group, field) = label.split_once('.').unwrap();
        assert_eq!(group, "Album");
        assert!(!field.is_empty());
    }
}

#[test]
fn mysql_spells_placeholders_and_quotes_differently() {
    let album = AlbumTable::new();
    let stmt = album
        .select((&album.album_id, &album.title))
        .where_(album.album_id.eq(int(1)));

    let (sql, args) = stmt.sql(&Dialect::mysql()).unwrap();
    assert!(sql.contains("`Album`.`AlbumId` AS `Album.AlbumId`"));
    assert!(sql.contains("WHERE `Album`.`AlbumId` = ?"));
    assert_eq!(args, vec![Value::Int(1)]);
}

#[test]
fn group_by_and_having_render_after_where() {
    let track = TrackTable::new();
    let stmt = track
        .select((&track.album_id, count(&track.track_id).aliased("trackCount")))
        .where_(track.milliseconds.gt(int(0)))
        .group_by(&track.album_id)
        .having(count(&track.track_id).gt(int(5)))
        .order_by(&track.album_id);

    assert_eq!(
        stmt.debug_sql(&pg()).unwrap(),
        "\
SELECT \"Track\".\"AlbumId\" AS \"Track.AlbumId\",
     COUNT(\"Track\".\"TrackId\") AS \"trackCount\"
FROM chinook.\"Track\"
WHERE \"Track\".\"Milliseconds\" > 0
GROUP BY \"Track\".\"AlbumId\"
HAVING COUNT(\"Track\".\"TrackId\") > 5
ORDER BY \"Track\".\"AlbumId\";"
    );
}

#[test]
fn scalar_subquery_and_exists_wrap_in_parens() {
    let album = AlbumTable::new();
    let track = TrackTable::new();

    let has_tracks = exists(
        track
            .select(&track.track_id)
            .where_(track.album_id.eq(&album.album_id)),
    );
    let stmt = album.select(&album.album_id).where_(has_tracks);
    let sql = stmt.debug_sql(&pg()).unwrap();
    assert!(sql.contains("WHERE EXISTS ("));

    let track_count = track
        .select(count_star())
        .where_(track.album_id.eq(&album.album_id))
        .as_scalar::<sqlbuild::types::Int>();
    let stmt = album.select((&album.album_id, track_count.aliased("count")));
    let sql = stmt.debug_sql(&pg()).unwrap();
    assert!(sql.contains("SELECT COUNT(*)"));
    assert!(sql.contains(") AS \"count\""));
}

#[test]
fn distinct_and_in_subquery() {
    let album = AlbumTable::new();
    let track = TrackTable::new();

    let stmt = album
        .select(&album.artist_id)
        .distinct()
        .where_(
            album
                .album_id
                .in_subquery(track.select(&track.album_id).where_(track.milliseconds.gt(int(300_000)))),
        );
    let sql = stmt.debug_sql(&pg()).unwrap();
    assert!(sql.starts_with("SELECT DISTINCT \"Album\".\"ArtistId\""));
    assert!(sql.contains("\"Album\".\"AlbumId\" IN ("));
}
