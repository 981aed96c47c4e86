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

use thiserror::Error;

/// Errors reported by statement construction, serialization, execution and
/// row scanning.
///
/// Construction is permissive: a malformed builder chain (empty projection,
/// set statement with a single operand, a column rebound to a subquery that
/// does not project it) only surfaces once the statement is serialized or
/// executed. Driver errors keep their original identity through
/// [`std::error::Error::source`].
#[derive(Debug, Error)]
pub enum Error {
    /// The statement tree is malformed.
    #[error("sqlbuild: {0}")]
    Construction(String),

    /// The active dialect cannot express a requested feature.
    #[error("sqlbuild: {0}")]
    Serialization(String),

    /// The driver reported a failure while executing a statement.
    #[error("sqlbuild: {context}")]
    Execution {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The result set does not fit the destination shape.
    #[error("sqlbuild: {0}")]
    Scan(String),

    /// The statement was cancelled or its deadline expired.
    #[error("sqlbuild: cancelled: {0}")]
    Cancelled(String),
}

impl Error {
    pub(crate) fn construction(msg: impl Into<String>) -> Self {
        Error::Construction(msg.into())
    }

    pub(crate) fn serialization(msg: impl Into<String>) -> Self {
        Error::Serialization(msg.into())
    }

    pub(crate) fn scan(msg: impl Into<String>) -> Self {
        Error::Scan(msg.into())
    }
}
