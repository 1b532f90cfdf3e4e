//! Business-metric math for the vendor sales summary
//!
//! All four ratios share one edge-case policy: a division that produces a
//! non-finite value (positive or negative infinity, or NaN from 0/0) is
//! replaced with 0. A zero numerator over a nonzero denominator already
//! yields 0 and is left untouched.

/// Replace a non-finite value with 0.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Gross profit: sales dollars minus purchase dollars. May be negative.
pub fn gross_profit(total_sales_dollars: f64, total_purchase_dollars: f64) -> f64 {
    total_sales_dollars - total_purchase_dollars
}

/// Profit margin as a percentage of sales dollars.
///
/// The non-finite replacement happens before the scaling to percent, so a
/// zero-sales row reports a margin of exactly 0.
pub fn profit_margin(gross_profit: f64, total_sales_dollars: f64) -> f64 {
    finite_or_zero(gross_profit / total_sales_dollars) * 100.0
}

/// Stock turnover: units sold per unit purchased.
pub fn stock_turnover(total_sales_quantity: f64, total_purchase_quantity: f64) -> f64 {
    finite_or_zero(total_sales_quantity / total_purchase_quantity)
}

/// Ratio of sales dollars to purchase dollars.
pub fn sales_purchase_ratio(total_sales_dollars: f64, total_purchase_dollars: f64) -> f64 {
    finite_or_zero(total_sales_dollars / total_purchase_dollars)
}
