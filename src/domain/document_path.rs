//! Fully-qualified document names.

use std::fmt;

/// Builds `projects/{project}/databases/(default)/documents/{collection}/{id}`
/// names for documents of the watched collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPathTemplate {
    project: String,
    collection: String,
}

impl DocumentPathTemplate {
    /// Creates a template for `collection` inside `project`.
    #[must_use]
    pub fn new(project: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            collection: collection.into(),
        }
    }

    /// Project identifier.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Collection path relative to the database root.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the fully-qualified name of `document_id`.
    #[must_use]
    pub fn document_name(&self, document_id: &str) -> String {
        format!("{self}/{document_id}")
    }
}

impl fmt::Display for DocumentPathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/databases/(default)/documents/{}",
            self.project, self.collection
        )
    }
}
