//! Totals engine: subtotal, tax and grand total derived from line items.
//!
//! Amounts are plain `f64`; no rounding is applied here, callers format for display.

use serde::Serialize;

/// Anything that contributes `quantity × unit_price` to an invoice subtotal.
pub trait LineAmount {
    fn quantity(&self) -> f64;

    fn unit_price(&self) -> f64;

    fn amount(&self) -> f64 {
        self.quantity() * self.unit_price()
    }
}

/// Derived financial totals of an invoice. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total: f64,
}

impl Totals {
    /// Compute totals for `items` at `tax_rate` percent.
    ///
    /// Negative quantities or prices are accepted and lower the subtotal.
    pub fn compute<L: LineAmount>(items: &[L], tax_rate: f64) -> Self {
        let subtotal = items.iter().fold(0.0, |acc, item| acc + item.amount());
        Self::from_subtotal(subtotal, tax_rate)
    }

    pub fn from_subtotal(subtotal: f64, tax_rate: f64) -> Self {
        let tax_amount = subtotal * tax_rate / 100.0;
        Self {
            subtotal,
            tax_amount,
            total: subtotal + tax_amount,
        }
    }
}
