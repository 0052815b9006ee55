//! Deterministic totals calculation
//!
//! This is the one place that turns line items into amounts. It is a pure
//! function: callers decide whether and where to persist the result.
//!
//! # Algorithm
//!
//! A line is included iff it is NORMAL or selected. For every line (included
//! or not): `net = round2(quantity * unit_price)`, `tax = round2(net * rate)`,
//! `gross = round2(net + tax)`, each step HALF_UP. Document totals are the
//! plain sums of included lines' already-rounded amounts and are never
//! re-rounded. Negative quantities are valid; corrections carry negative
//! totals by design.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::round_half_up;

use crate::document::SalesDocumentLine;

/// Computed amounts for one line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAmounts {
    pub net: Decimal,
    pub tax: Decimal,
    pub gross: Decimal,
    /// Whether the line counts toward document totals
    pub included: bool,
}

/// Computed totals for a document
///
/// `lines` holds amounts for every input line in order, including excluded
/// ones (callers commonly persist those for display); only included lines
/// contribute to the aggregate fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTotals {
    pub total_net: Decimal,
    pub total_tax: Decimal,
    pub total_gross: Decimal,
    pub lines: Vec<LineAmounts>,
}

impl DocumentTotals {
    fn empty() -> Self {
        Self {
            total_net: Decimal::ZERO,
            total_tax: Decimal::ZERO,
            total_gross: Decimal::ZERO,
            lines: Vec::new(),
        }
    }
}

/// Calculates per-line and document totals for an ordered list of lines
pub fn calculate_totals(lines: &[SalesDocumentLine]) -> DocumentTotals {
    let mut totals = DocumentTotals::empty();
    totals.lines.reserve(lines.len());

    for line in lines {
        let net = round_half_up(line.quantity * line.unit_price_net);
        let tax = line.tax_rate.tax_on(net);
        let gross = round_half_up(net + tax);
        let included = line.counts_toward_totals();

        if included {
            totals.total_net += net;
            totals.total_tax += tax;
            totals.total_gross += gross;
        }

        totals.lines.push(LineAmounts {
            net,
            tax,
            gross,
            included,
        });
    }

    totals
}
