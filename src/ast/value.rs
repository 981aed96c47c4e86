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
use ordered_float::OrderedFloat;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dialect::{BytesLiteralStyle, Dialect, TimestampLiteralStyle};

/// A typed SQL value: a literal inside a statement, a bound argument, or a
/// cell in a scanned result row.
///
/// `Float` wraps [`OrderedFloat`] so that value vectors can serve as
/// identity keys in the row scanner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    Interval(Interval),
}

/// A calendar-aware interval, kept as separate month/day/microsecond
/// components because none of them convert into the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interval {
    pub months: i32,
    pub days: i32,
    pub microseconds: i64,
}

impl Interval {
    pub fn new(months: i32, days: i32, microseconds: i64) -> Self {
        Self {
            months,
            days,
            microseconds,
        }
    }
}

impl Value {
    /// The name used in scan-error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Interval(_) => "interval",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Renders the value as an inline SQL literal for the debug form.
    /// Strings single-quote with doubled quotes, bytes render as a hex
    /// literal, temporal values render in ISO form with the dialect's cast
    /// spelling.
    pub fn literal(&self, dialect: &Dialect) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => dialect.bool_literal(*b).to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.into_inner().to_string(),
            Value::Text(s) => quote_string(s),
            Value::Bytes(bytes) => {
                let mut hex = String::with_capacity(bytes.len() * 2);
                for byte in bytes {
                    hex.push_str(&format!("{:02X}", byte));
                }
                match dialect.bytes_literal {
                    BytesLiteralStyle::EscapedBytea => format!("'\\x{}'::bytea", hex),
                    BytesLiteralStyle::HexPrefix => format!("X'{}'", hex),
                }
            }
            Value::Timestamp(ts) => {
                let iso = ts.format("%Y-%m-%d %H:%M:%S%.f").to_string();
                match dialect.timestamp_literal {
                    TimestampLiteralStyle::TypedCast => format!("'{}'::timestamp", iso),
                    TimestampLiteralStyle::Keyword => format!("TIMESTAMP '{}'", iso),
                    TimestampLiteralStyle::Plain => format!("'{}'", iso),
                }
            }
            Value::Date(d) => {
                let iso = d.format("%Y-%m-%d").to_string();
                match dialect.timestamp_literal {
                    TimestampLiteralStyle::TypedCast => format!("'{}'::date", iso),
                    TimestampLiteralStyle::Keyword => format!("DATE '{}'", iso),
                    TimestampLiteralStyle::Plain => format!("'{}'", iso),
                }
            }
            Value::Time(t) => {
                let iso = t.format("%H:%M:%S%.f").to_string();
                match dialect.timestamp_literal {
                    TimestampLiteralStyle::TypedCast => format!("'{}'::time", iso),
                    TimestampLiteralStyle::Keyword => format!("TIME '{}'", iso),
                    TimestampLiteralStyle::Plain => format!("'{}'", iso),
                }
            }
            Value::Interval(interval) => {
                let mut parts = Vec::new();
                if interval.months != 0 {
                    parts.push(format!("{} mons", interval.months));
                }
                if interval.days != 0 {
                    parts.push(format!("{} days", interval.days));
                }
                if interval.microseconds != 0 || parts.is_empty() {
                    let seconds = interval.microseconds as f64 / 1_000_000.0;
                    parts.push(format!("{} secs", seconds));
                }
                format!("INTERVAL '{}'", parts.join(" "))
            }
        }
    }
}

/// Single-quotes a string, doubling embedded single quotes.
pub fn quote_string(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('\'');
    for c in s.chars() {
        if c == '\'' {
            quoted.push('\'');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}
