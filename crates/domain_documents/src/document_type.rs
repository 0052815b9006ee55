//! Document type descriptors
//!
//! Document types are data-driven, not an enum: tenants define their own set
//! (invoice, quote, credit note, ...) as rows. A type's identity is immutable
//! once documents reference it.

use serde::{Deserialize, Serialize};

use core_kernel::{DocumentTypeId, TenantId};

use crate::error::DocumentError;

/// A data-driven document type descriptor
///
/// The `key` is unique per tenant, case-insensitively; it is normalized to
/// lowercase on construction so uniqueness checks and lookups are plain
/// equality everywhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentType {
    /// Unique identifier
    pub id: DocumentTypeId,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Stable lookup key, lowercase
    pub key: String,
    /// Display name
    pub name: String,
    /// Prefix substituted into generated document numbers
    pub prefix: String,
    /// Whether documents of this type are invoices
    pub is_invoice: bool,
    /// Whether documents of this type correct another document
    pub is_correction: bool,
    /// Whether documents of this type must carry a due date
    pub requires_due_date: bool,
    /// Inactive types cannot be used for new documents
    pub is_active: bool,
}

impl DocumentType {
    /// Creates a new document type
    ///
    /// # Errors
    ///
    /// Returns a validation error if the key is empty or contains whitespace.
    pub fn new(
        tenant_id: TenantId,
        key: impl Into<String>,
        name: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Result<Self, DocumentError> {
        let key = key.into().trim().to_lowercase();
        if key.is_empty() {
            return Err(DocumentError::validation("Document type key must not be empty"));
        }
        if key.chars().any(char::is_whitespace) {
            return Err(DocumentError::validation(format!(
                "Document type key '{}' must not contain whitespace",
                key
            )));
        }

        Ok(Self {
            id: DocumentTypeId::new_v7(),
            tenant_id,
            key,
            name: name.into(),
            prefix: prefix.into(),
            is_invoice: false,
            is_correction: false,
            requires_due_date: false,
            is_active: true,
        })
    }

    /// Marks this type as an invoice type
    pub fn invoice(mut self) -> Self {
        self.is_invoice = true;
        self.requires_due_date = true;
        self
    }

    /// Marks this type as a correction type
    pub fn correction(mut self) -> Self {
        self.is_correction = true;
        self
    }

    /// Sets whether a due date is required
    pub fn with_due_date_required(mut self, required: bool) -> Self {
        self.requires_due_date = required;
        self
    }

    /// Case-insensitive key comparison
    pub fn key_matches(&self, key: &str) -> bool {
        self.key == key.trim().to_lowercase()
    }
}
