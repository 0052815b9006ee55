//! Contract run history
//!
//! One immutable record per (contract, run date): the append-only audit
//! trail of every generation attempt. Records are created once by the
//! scheduler and never mutated afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ContractId, ContractRunId, DocumentId, TenantId};

/// Terminal outcome of one generation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// A document was generated and the schedule advanced
    Success,
    /// Generation failed and was rolled back; the message holds the cause
    Failed,
    /// Nothing was generated because a run for the period already existed
    Skipped,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
            RunStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(RunStatus::Success),
            "failed" => Ok(RunStatus::Failed),
            "skipped" => Ok(RunStatus::Skipped),
            other => Err(format!("Unknown run status '{}'", other)),
        }
    }
}

/// One immutable generation record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractRun {
    /// Unique identifier
    pub id: ContractRunId,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// The contract this run belongs to
    pub contract_id: ContractId,
    /// The scheduled date this run covered
    pub run_date: NaiveDate,
    /// Terminal outcome
    pub status: RunStatus,
    /// The generated document, on success
    pub document_id: Option<DocumentId>,
    /// Free-text detail (error message, skip reason)
    pub message: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl ContractRun {
    /// Records a successful generation linking the new document
    pub fn success(
        tenant_id: TenantId,
        contract_id: ContractId,
        run_date: NaiveDate,
        document_id: DocumentId,
    ) -> Self {
        Self {
            id: ContractRunId::new_v7(),
            tenant_id,
            contract_id,
            run_date,
            status: RunStatus::Success,
            document_id: Some(document_id),
            message: None,
            created_at: Utc::now(),
        }
    }

    /// Records a failed generation with the captured error message
    pub fn failed(
        tenant_id: TenantId,
        contract_id: ContractId,
        run_date: NaiveDate,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: ContractRunId::new_v7(),
            tenant_id,
            contract_id,
            run_date,
            status: RunStatus::Failed,
            document_id: None,
            message: Some(message.into()),
            created_at: Utc::now(),
        }
    }

    /// Records a skipped generation
    pub fn skipped(
        tenant_id: TenantId,
        contract_id: ContractId,
        run_date: NaiveDate,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: ContractRunId::new_v7(),
            tenant_id,
            contract_id,
            run_date,
            status: RunStatus::Skipped,
            document_id: None,
            message: Some(message.into()),
            created_at: Utc::now(),
        }
    }
}
