//! Hand-rolled chinook schema bindings and model records, shaped the way
//! the schema generator emits them: a table struct carrying typed column
//! handles, plus a plain model record per table.

#![allow(dead_code)]

use sqlbuild::types::{Float, Int, Text};
use sqlbuild::{Column, Error, GroupRow, Projection, Record, Table, TableExpr, TableSource};

macro_rules! binding {
    (
        $table_struct:ident, $table_name:literal,
        $( $field:ident: $tag:ty = $column_name:literal ),+ $(,)?
    ) => {
        pub struct $table_struct {
            pub table: Table,
            $( pub $field: Column<$tag>, )+
        }

        impl $table_struct {
            pub fn new() -> Self {
                Self::bound(Table::new("chinook", $table_name))
            }

            fn bound(table: Table) -> Self {
                Self {
                    $( $field: table.column($column_name), )+
                    table,
                }
            }

            pub fn as_(&self, alias: &str) -> Self {
                Self::bound(self.table.as_(alias))
            }

            pub fn from_schema(&self, schema: &str) -> Self {
                Self::bound(self.table.from_schema(schema))
            }

            pub fn all_columns(&self) -> Vec<Projection> {
                use sqlbuild::IntoProjections;
                let mut columns = Vec::new();
                $( columns.extend((&self.$field).into_projections()); )+
                columns
            }
        }

        impl TableSource for $table_struct {
            fn as_table_expr(&self) -> TableExpr {
                self.table.as_table_expr()
            }
        }

        impl std::ops::Deref for $table_struct {
            type Target = Table;

            fn deref(&self) -> &Table {
                &self.table
            }
        }
    };
}

binding!(ArtistTable, "Artist",
    artist_id: Int = "ArtistId",
    name: Text = "Name",
);

binding!(AlbumTable, "Album",
    album_id: Int = "AlbumId",
    title: Text = "Title",
    artist_id: Int = "ArtistId",
);

binding!(TrackTable, "Track",
    track_id: Int = "TrackId",
    name: Text = "Name",
    album_id: Int = "AlbumId",
    milliseconds: Int = "Milliseconds",
);

binding!(InvoiceLineTable, "InvoiceLine",
    invoice_line_id: Int = "InvoiceLineId",
    invoice_id: Int = "InvoiceId",
    track_id: Int = "TrackId",
);

binding!(InvoiceTable, "Invoice",
    invoice_id: Int = "InvoiceId",
    customer_id: Int = "CustomerId",
    total: Float = "Total",
);

binding!(CustomerTable, "Customer",
    customer_id: Int = "CustomerId",
    first_name: Text = "FirstName",
    last_name: Text = "LastName",
    support_rep_id: Int = "SupportRepId",
);

binding!(EmployeeTable, "Employee",
    employee_id: Int = "EmployeeId",
    first_name: Text = "FirstName",
    last_name: Text = "LastName",
    reports_to: Int = "ReportsTo",
);

// ---------------------------------------------------------------------------
// Model records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub artist_id: i64,
    pub name: Option<String>,
}

impl Record for Artist {
    const GROUP: &'static str = "Artist";
    const PRIMARY_KEY: &'static [&'static str] = &["ArtistId"];

    fn from_group(row: &GroupRow<'_>) -> Result<Self, Error> {
        Ok(Self {
            artist_id: row.get("ArtistId")?,
            name: row.get("Name")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Album {
    pub album_id: i64,
    pub title: String,
    pub artist_id: i64,
}

impl Record for Album {
    const GROUP: &'static str = "Album";
    const PRIMARY_KEY: &'static [&'static str] = &["AlbumId"];

    fn from_group(row: &GroupRow<'_>) -> Result<Self, Error> {
        Ok(Self {
            album_id: row.get("AlbumId")?,
            title: row.get("Title")?,
            artist_id: row.get("ArtistId")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub track_id: i64,
    pub name: String,
    pub album_id: Option<i64>,
    pub milliseconds: i64,
}

impl Record for Track {
    const GROUP: &'static str = "Track";
    const PRIMARY_KEY: &'static [&'static str] = &["TrackId"];

    fn from_group(row: &GroupRow<'_>) -> Result<Self, Error> {
        Ok(Self {
            track_id: row.get("TrackId")?,
            name: row.get("Name")?,
            album_id: row.get("AlbumId")?,
            milliseconds: row.get("Milliseconds")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub invoice_id: i64,
    pub customer_id: i64,
    pub total: f64,
}

impl Record for Invoice {
    const GROUP: &'static str = "Invoice";
    const PRIMARY_KEY: &'static [&'static str] = &["InvoiceId"];

    fn from_group(row: &GroupRow<'_>) -> Result<Self, Error> {
        Ok(Self {
            invoice_id: row.get("InvoiceId")?,
            customer_id: row.get("CustomerId")?,
            total: row.get("Total")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub customer_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub support_rep_id: Option<i64>,
}

impl Record for Customer {
    const GROUP: &'static str = "Customer";
    const PRIMARY_KEY: &'static [&'static str] = &["CustomerId"];

    fn from_group(row: &GroupRow<'_>) -> Result<Self, Error> {
        Ok(Self {
            customer_id: row.get("CustomerId")?,
            first_name: row.get("FirstName")?,
            last_name: row.get("LastName")?,
            support_rep_id: row.get("SupportRepId")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub employee_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub reports_to: Option<i64>,
}

impl Record for Employee {
    const GROUP: &'static str = "Employee";
    const PRIMARY_KEY: &'static [&'static str] = &["EmployeeId"];

    fn from_group(row: &GroupRow<'_>) -> Result<Self, Error> {
        Ok(Self {
            employee_id: row.get("EmployeeId")?,
            first_name: row.get("FirstName")?,
            last_name: row.get("LastName")?,
            reports_to: row.get("ReportsTo")?,
        })
    }
}
