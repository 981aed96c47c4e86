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

use crate::ast::value::Value;
use crate::dialect::Dialect;
use crate::error::Error;

/// Number of spaces per indent level in the emitted SQL.
const INDENT_WIDTH: usize = 5;

/// Where a statement sits while being serialized. Nested statements wrap
/// themselves in parentheses and indent their body one level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StatementCtx {
    TopLevel,
    Nested,
}

/// Accumulates the SQL text and the argument list for one serialization
/// pass. Serialization is a pure function of `(statement, dialect)`; the
/// builder itself is transient state created per [`Statement::sql`] call.
pub struct SqlBuilder<'a> {
    dialect: &'a Dialect,
    debug: bool,
    buf: String,
    args: Vec<Value>,
    indent: usize,
    glue_next: bool,
}

impl<'a> SqlBuilder<'a> {
    pub(crate) fn new(dialect: &'a Dialect, debug: bool) -> Self {
        Self {
            dialect,
            debug,
            buf: String::new(),
            args: Vec::new(),
            indent: 0,
            glue_next: false,
        }
    }

    pub(crate) fn dialect(&self) -> &'a Dialect {
        self.dialect
    }

    /// Writes a token, separating it from the previous one with a single
    /// space unless the buffer ends in an opening paren or whitespace.
    pub(crate) fn write_word(&mut self, word: &str) {
        if self.glue_next {
            self.glue_next = false;
        } else {
            match self.buf.as_bytes().last() {
                None | Some(b'(') | Some(b'.') | Some(b' ') | Some(b'\n') => {}
                _ => self.buf.push(' '),
            }
        }
        self.buf.push_str(word);
    }

    /// Writes text verbatim, with no separator logic. Used for commas,
    /// dots and closing parens.
    pub(crate) fn write_raw(&mut self, text: &str) {
        self.glue_next = false;
        self.buf.push_str(text);
    }

    /// The next `write_word` attaches to the current token without a
    /// separating space (e.g. the operand of unary minus).
    pub(crate) fn glue_next(&mut self) {
        self.glue_next = true;
    }

    /// Writes a quoted identifier as a word.
    pub(crate) fn write_ident(&mut self, name: &str) {
        let quoted = self.dialect.quote(name);
        self.write_word(&quoted);
    }

    /// Starts a new line at the current indent level. A no-op at the very
    /// start of the output so top-level statements do not lead with a
    /// newline.
    pub(crate) fn new_line(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        self.buf.push('\n');
        for _ in 0..self.indent * INDENT_WIDTH {
            self.buf.push(' ');
        }
    }

    pub(crate) fn increase_indent(&mut self) {
        self.indent += 1;
    }

    pub(crate) fn decrease_indent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// Emits one argument: a placeholder in parameterized mode, the inlined
    /// literal in debug mode.
    pub(crate) fn push_arg(&mut self, value: Value) {
        if self.debug {
            let literal = value.literal(self.dialect);
            self.write_word(&literal);
        } else {
            self.args.push(value);
            let placeholder = self.dialect.placeholder(self.args.len());
            self.write_word(&placeholder);
        }
    }

    /// Serializes a sub-tree into a detached text fragment while argument
    /// numbering keeps running in this builder. Used for dialect function
    /// transforms, which rewrite rendered argument text.
    pub(crate) fn render_fragment<F>(&mut self, serialize: F) -> Result<String, Error>
    where
        F: FnOnce(&mut Self) -> Result<(), Error>,
    {
        let saved_buf = std::mem::take(&mut self.buf);
        let saved_indent = std::mem::replace(&mut self.indent, 0);
        let saved_glue = std::mem::replace(&mut self.glue_next, false);
        let result = serialize(self);
        let fragment = std::mem::replace(&mut self.buf, saved_buf);
        self.indent = saved_indent;
        self.glue_next = saved_glue;
        result?;
        Ok(fragment)
    }

    pub(crate) fn finalize(mut self) -> (String, Vec<Value>) {
        self.buf.push(';');
        (self.buf, self.args)
    }
}

/// A serializable statement: SELECT, a set statement, INSERT, UPDATE or
/// DELETE.
///
/// Statement values are immutable; serializing one twice yields identical
/// text and arguments, and any number of threads may serialize a shared
/// statement concurrently.
pub trait Statement {
    #[doc(hidden)]
    fn write_stmt(&self, out: &mut SqlBuilder<'_>) -> Result<(), Error>;

    /// Renders the parameterized SQL text and its argument list.
    fn sql(&self, dialect: &Dialect) -> Result<(String, Vec<Value>), Error> {
        let mut out = SqlBuilder::new(dialect, false);
        self.write_stmt(&mut out)?;
        Ok(out.finalize())
    }

    /// Renders the SQL with every argument inlined as a literal. Debugging
    /// aid only; the parameterized form is what should reach the server.
    fn debug_sql(&self, dialect: &Dialect) -> Result<String, Error> {
        let mut out = SqlBuilder::new(dialect, true);
        self.write_stmt(&mut out)?;
        Ok(out.finalize().0)
    }
}
