//! Number ranges
//!
//! A number range is the single counter row behind one (tenant, scope) pair.
//! The reset and increment rules live here as pure methods; the locking that
//! makes them safe under concurrency is the store's job.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{two_digit_year, DocumentTypeId, NumberRangeId, TenantId};

use crate::error::NumberingError;

/// Default format template: prefix, two-digit year, dash, four-digit sequence
pub const DEFAULT_FORMAT_TEMPLATE: &str = "{prefix}{yy}-{seq}";

/// The key identifying an independent sequence counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CounterScope {
    /// Numbers for documents of one type
    DocumentType(DocumentTypeId),
    /// The fixed scope for contract numbers
    ContractNumbering,
}

impl CounterScope {
    /// Stable storage key for this scope
    pub fn storage_key(&self) -> String {
        match self {
            CounterScope::DocumentType(id) => format!("doctype:{}", id.as_uuid()),
            CounterScope::ContractNumbering => "contract".to_string(),
        }
    }
}

impl fmt::Display for CounterScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.storage_key())
    }
}

/// When the sequence restarts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetPolicy {
    /// Restart at 1 with the first allocation of a new year
    Yearly,
    /// Monotonic forever; only the rendered year token changes
    Never,
}

impl ResetPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResetPolicy::Yearly => "yearly",
            ResetPolicy::Never => "never",
        }
    }
}

impl std::str::FromStr for ResetPolicy {
    type Err = NumberingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yearly" => Ok(ResetPolicy::Yearly),
            "never" => Ok(ResetPolicy::Never),
            other => Err(NumberingError::store(format!("Unknown reset policy '{}'", other))),
        }
    }
}

/// Defaults applied when a range row is lazily created on first allocation
#[derive(Debug, Clone)]
pub struct RangeDefaults {
    pub format_template: String,
    pub reset_policy: ResetPolicy,
}

impl Default for RangeDefaults {
    fn default() -> Self {
        Self {
            format_template: DEFAULT_FORMAT_TEMPLATE.to_string(),
            reset_policy: ResetPolicy::Yearly,
        }
    }
}

/// One sequence counter row
///
/// # Invariants
///
/// - Exactly one row exists per (tenant, scope)
/// - `current_seq` only increases within a `current_year` epoch; a `Yearly`
///   rollover resets it to 0 before the next increment
/// - Mutated exclusively under the store's per-scope lock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumberRange {
    pub id: NumberRangeId,
    pub tenant_id: TenantId,
    pub scope: CounterScope,
    pub format_template: String,
    pub reset_policy: ResetPolicy,
    /// Two-digit year of the most recent allocation
    pub current_year: u32,
    /// Last allocated sequence within the current epoch
    pub current_seq: i64,
}

impl NumberRange {
    /// Creates a fresh range positioned before its first allocation
    pub fn new(
        tenant_id: TenantId,
        scope: CounterScope,
        defaults: &RangeDefaults,
        effective_date: NaiveDate,
    ) -> Self {
        Self {
            id: NumberRangeId::new_v7(),
            tenant_id,
            scope,
            format_template: defaults.format_template.clone(),
            reset_policy: defaults.reset_policy,
            current_year: two_digit_year(effective_date),
            current_seq: 0,
        }
    }

    /// Advances the counter for an allocation effective on `effective_date`
    ///
    /// Applies the yearly reset when the policy demands it, increments, and
    /// returns the sequence number to render. Must only be called while the
    /// caller holds the per-scope lock.
    pub fn next_sequence(&mut self, effective_date: NaiveDate) -> i64 {
        let yy = two_digit_year(effective_date);
        if self.reset_policy == ResetPolicy::Yearly && self.current_year != yy {
            self.current_year = yy;
            self.current_seq = 0;
        } else {
            self.current_year = yy;
        }
        self.current_seq += 1;
        self.current_seq
    }

    /// Renders a document number from the format template
    ///
    /// Tokens: `{prefix}`, `{yy}` (two-digit year), `{seq}` (zero-padded to
    /// four digits).
    ///
    /// # Errors
    ///
    /// Returns `InvalidTemplate` if the template contains unknown tokens.
    pub fn render(
        &self,
        prefix: &str,
        sequence: i64,
        effective_date: NaiveDate,
    ) -> Result<String, NumberingError> {
        let rendered = self
            .format_template
            .replace("{prefix}", prefix)
            .replace("{yy}", &format!("{:02}", two_digit_year(effective_date)))
            .replace("{seq}", &format!("{:04}", sequence));

        if rendered.contains('{') || rendered.contains('}') {
            return Err(NumberingError::InvalidTemplate(self.format_template.clone()));
        }
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn range(policy: ResetPolicy) -> NumberRange {
        let defaults = RangeDefaults {
            format_template: DEFAULT_FORMAT_TEMPLATE.to_string(),
            reset_policy: policy,
        };
        NumberRange::new(
            TenantId::new(),
            CounterScope::ContractNumbering,
            &defaults,
            d(2026, 1, 1),
        )
    }

    #[test]
    fn test_sequence_increments_within_year() {
        let mut range = range(ResetPolicy::Yearly);
        assert_eq!(range.next_sequence(d(2026, 1, 1)), 1);
        assert_eq!(range.next_sequence(d(2026, 6, 1)), 2);
        assert_eq!(range.next_sequence(d(2026, 12, 31)), 3);
    }

    #[test]
    fn test_yearly_policy_resets_in_new_year() {
        let mut range = range(ResetPolicy::Yearly);
        assert_eq!(range.next_sequence(d(2026, 12, 31)), 1);
        assert_eq!(range.next_sequence(d(2027, 1, 1)), 1);
        assert_eq!(range.current_year, 27);
        assert_eq!(range.next_sequence(d(2027, 1, 2)), 2);
    }

    #[test]
    fn test_never_policy_continues_across_years() {
        let mut range = range(ResetPolicy::Never);
        assert_eq!(range.next_sequence(d(2026, 12, 31)), 1);
        assert_eq!(range.next_sequence(d(2027, 1, 1)), 2);
        assert_eq!(range.next_sequence(d(2028, 3, 1)), 3);
    }

    #[test]
    fn test_render_default_template() {
        let range = range(ResetPolicy::Yearly);
        assert_eq!(range.render("RE", 1, d(2026, 1, 1)).unwrap(), "RE26-0001");
        assert_eq!(range.render("RE", 423, d(2027, 5, 1)).unwrap(), "RE27-0423");
        assert_eq!(range.render("RE", 12345, d(2026, 1, 1)).unwrap(), "RE26-12345");
    }

    #[test]
    fn test_render_rejects_unknown_tokens() {
        let mut range = range(ResetPolicy::Yearly);
        range.format_template = "{prefix}-{year}-{seq}".to_string();
        assert!(matches!(
            range.render("RE", 1, d(2026, 1, 1)),
            Err(NumberingError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_scope_storage_keys() {
        let dt = DocumentTypeId::new();
        assert_eq!(
            CounterScope::DocumentType(dt).storage_key(),
            format!("doctype:{}", dt.as_uuid())
        );
        assert_eq!(CounterScope::ContractNumbering.storage_key(), "contract");
    }
}
