use core::fmt::Debug;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-backend spelling rules consumed by the serializer.
///
/// Statement construction is dialect-agnostic; the same AST renders for each
/// backend by serializing it against a different `Dialect` value. Feature
/// fields that a backend lacks (RETURNING on MySQL, row locks on SQLite)
/// make the serializer fail with a serialization error rather than emit SQL
/// the server would reject.
#[derive(Clone, Debug)]
pub struct Dialect {
    pub name: &'static str,
    /// The identifier quote character. Doubled when it appears inside an
    /// identifier.
    pub quote_char: char,
    pub placeholder: PlaceholderStyle,
    pub bool_literal: BoolLiteralStyle,
    pub supports_returning: bool,
    pub supports_distinct_on: bool,
    pub supports_row_locks: bool,
    pub supports_on_conflict: bool,
    /// MySQL and SQLite reject OFFSET without an accompanying LIMIT.
    pub offset_requires_limit: bool,
    pub concat_style: ConcatStyle,
    pub cast_style: CastStyle,
    pub bytes_literal: BytesLiteralStyle,
    pub timestamp_literal: TimestampLiteralStyle,
    pub function_transforms: HashMap<String, Arc<dyn FunctionTransform>>,
}

/// Rewrites a function call the backend spells differently, receiving the
/// already-rendered argument fragments.
pub trait FunctionTransform: Debug + Send + Sync {
    fn transform(&self, name: &str, args: &[String]) -> String;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `$1`, `$2`, ...
    Dollar,
    /// `?` for every argument.
    Question,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoolLiteralStyle {
    /// `TRUE` / `FALSE`
    Keyword,
    /// `1` / `0`
    Numeric,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConcatStyle {
    /// `a || b`
    Operator,
    /// `CONCAT(a, b)` — MySQL treats `||` as logical OR.
    Function,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastStyle {
    /// `CAST(x AS type)`
    Standard,
    /// `x::type`
    DoubleColon,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BytesLiteralStyle {
    /// `'\xDEADBEEF'::bytea`
    EscapedBytea,
    /// `X'DEADBEEF'`
    HexPrefix,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimestampLiteralStyle {
    /// `'2011-01-01 10:00:00'::timestamp`
    TypedCast,
    /// `TIMESTAMP '2011-01-01 10:00:00'`
    Keyword,
    /// `'2011-01-01 10:00:00'`
    Plain,
}

impl Dialect {
    pub fn postgres() -> Self {
        Self {
            name: "postgres",
            quote_char: '"',
            placeholder: PlaceholderStyle::Dollar,
            bool_literal: BoolLiteralStyle::Keyword,
            supports_returning: true,
            supports_distinct_on: true,
            supports_row_locks: true,
            supports_on_conflict: true,
            offset_requires_limit: false,
            concat_style: ConcatStyle::Operator,
            cast_style: CastStyle::Standard,
            bytes_literal: BytesLiteralStyle::EscapedBytea,
            timestamp_literal: TimestampLiteralStyle::TypedCast,
            function_transforms: Default::default(),
        }
    }

    pub fn mysql() -> Self {
        Self {
            name: "mysql",
            quote_char: '`',
            placeholder: PlaceholderStyle::Question,
            bool_literal: BoolLiteralStyle::Keyword,
            supports_returning: false,
            supports_distinct_on: false,
            supports_row_locks: true,
            supports_on_conflict: false,
            offset_requires_limit: true,
            concat_style: ConcatStyle::Function,
            cast_style: CastStyle::Standard,
            bytes_literal: BytesLiteralStyle::HexPrefix,
            timestamp_literal: TimestampLiteralStyle::Keyword,
            function_transforms: Default::default(),
        }
    }

    pub fn sqlite() -> Self {
        let mut function_transforms: HashMap<String, Arc<dyn FunctionTransform>> =
            Default::default();
        function_transforms.insert("FLOOR".to_string(), Arc::new(SqliteFloorTransform));
        function_transforms.insert("CEIL".to_string(), Arc::new(SqliteCeilTransform));

        Self {
            name: "sqlite",
            quote_char: '"',
            placeholder: PlaceholderStyle::Question,
            bool_literal: BoolLiteralStyle::Numeric,
            supports_returning: true,
            supports_distinct_on: false,
            supports_row_locks: false,
            supports_on_conflict: true,
            offset_requires_limit: true,
            concat_style: ConcatStyle::Operator,
            cast_style: CastStyle::Standard,
            bytes_literal: BytesLiteralStyle::HexPrefix,
            timestamp_literal: TimestampLiteralStyle::Plain,
            function_transforms,
        }
    }

    /// Quotes an identifier, doubling any embedded quote character.
    pub fn quote(&self, ident: &str) -> String {
        let mut quoted = String::with_capacity(ident.len() + 2);
        quoted.push(self.quote_char);
        for c in ident.chars() {
            if c == self.quote_char {
                quoted.push(c);
            }
            quoted.push(c);
        }
        quoted.push(self.quote_char);
        quoted
    }

    /// The placeholder for the 1-based argument position `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self.placeholder {
            PlaceholderStyle::Dollar => format!("${}", index),
            PlaceholderStyle::Question => "?".to_string(),
        }
    }

    pub fn bool_literal(&self, value: bool) -> &'static str {
        match (self.bool_literal, value) {
            (BoolLiteralStyle::Keyword, true) => "TRUE",
            (BoolLiteralStyle::Keyword, false) => "FALSE",
            (BoolLiteralStyle::Numeric, true) => "1",
            (BoolLiteralStyle::Numeric, false) => "0",
        }
    }
}

// SQLite ships no FLOOR/CEIL; round() against a half-offset input is the
// usual workaround.
#[derive(Clone, Debug)]
struct SqliteFloorTransform;
impl FunctionTransform for SqliteFloorTransform {
    fn transform(&self, _name: &str, args: &[String]) -> String {
        format!("round({} - 0.5)", &args[0])
    }
}

#[derive(Clone, Debug)]
struct SqliteCeilTransform;
impl FunctionTransform for SqliteCeilTransform {
    fn transform(&self, _name: &str, args: &[String]) -> String {
        format!("round({} + 0.5)", &args[0])
    }
}
