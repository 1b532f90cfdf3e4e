//! Vendor summary service: aggregation and metric derivation
//!
//! Runs the grouped-join summary query over purchases, sales, and freight,
//! then cleans the raw rows and derives the business ratios.

use serde::Serialize;
use sqlx::{sqlite::SqliteRow, FromRow, Row, SqlitePool};

use crate::error::{AppError, AppResult};
use crate::services::ingest::{Column, ColumnType, SqlValue, TableData};
use shared::{metrics, VendorSalesSummary};

/// The grouped-join aggregation: one row per purchase grouping key, with sales
/// and freight totals left-joined on. `Volume` is selected as text so that
/// numeric coercion (and its failure mode) stays in [`SummaryService::clean`]
/// whatever the column's storage class.
const SUMMARY_QUERY: &str = r#"
    WITH FreightSummary AS (
        SELECT
            VendorNumber,
            SUM(Freight) AS FreightCost
        FROM vendor_invoice
        GROUP BY VendorNumber
    ),

    PurchaseSummary AS (
        SELECT
            p.VendorNumber,
            p.VendorName,
            p.Brand,
            p.PurchasePrice,
            p.Description,
            CAST(pp.Volume AS TEXT) AS Volume,
            pp.Price AS ActualPrice,
            SUM(p.Quantity) AS TotalPurchaseQuantity,
            SUM(p.Dollars) AS TotalPurchaseDollars
        FROM purchases p
        JOIN purchase_prices pp
            ON p.Brand = pp.Brand
        WHERE p.PurchasePrice > 0
        GROUP BY p.VendorNumber, p.VendorName, p.Brand, p.PurchasePrice,
                 p.Description, pp.Volume, pp.Price
    ),

    SalesSummary AS (
        SELECT
            VendorNo,
            Brand,
            SUM(SalesDollars) AS TotalSalesDollars,
            SUM(SalesPrice) AS TotalSalesPrice,
            SUM(SalesQuantity) AS TotalSalesQuantity,
            SUM(ExciseTax) AS TotalExciseTax
        FROM sales
        GROUP BY VendorNo, Brand
    )

    SELECT
        ps.VendorNumber,
        ps.VendorName,
        ps.Brand,
        ps.Description,
        ps.PurchasePrice,
        ps.ActualPrice,
        ps.Volume,
        ps.TotalPurchaseQuantity,
        ps.TotalPurchaseDollars,
        ss.TotalSalesQuantity,
        ss.TotalSalesDollars,
        ss.TotalSalesPrice,
        ss.TotalExciseTax,
        fs.FreightCost
    FROM PurchaseSummary ps
    LEFT JOIN SalesSummary ss
        ON ps.VendorNumber = ss.VendorNo
        AND ps.Brand = ss.Brand
    LEFT JOIN FreightSummary fs
        ON ps.VendorNumber = fs.VendorNumber
    ORDER BY ps.TotalPurchaseDollars DESC
"#;

/// Raw aggregation output, before cleaning. `Option` fields are the left-join
/// gap columns; `volume` is still text at this point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VendorSummaryRow {
    pub vendor_number: i64,
    pub vendor_name: String,
    pub brand: i64,
    pub description: String,
    pub purchase_price: f64,
    pub actual_price: f64,
    pub volume: Option<String>,
    pub total_purchase_quantity: f64,
    pub total_purchase_dollars: f64,
    pub total_sales_quantity: Option<f64>,
    pub total_sales_dollars: Option<f64>,
    pub total_sales_price: Option<f64>,
    pub total_excise_tax: Option<f64>,
    pub freight_cost: Option<f64>,
}

// Decoded with try_get_unchecked: SQLite reports the storage class of each
// value, so a SUM over an INTEGER column arrives as INTEGER and the strict
// derive would reject it for an f64 field. The unchecked decode applies
// SQLite's own numeric coercion instead.
impl<'r> FromRow<'r, SqliteRow> for VendorSummaryRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            vendor_number: row.try_get_unchecked("VendorNumber")?,
            vendor_name: row.try_get_unchecked("VendorName")?,
            brand: row.try_get_unchecked("Brand")?,
            description: row.try_get_unchecked("Description")?,
            purchase_price: row.try_get_unchecked("PurchasePrice")?,
            actual_price: row.try_get_unchecked("ActualPrice")?,
            volume: row.try_get_unchecked("Volume")?,
            total_purchase_quantity: row.try_get_unchecked("TotalPurchaseQuantity")?,
            total_purchase_dollars: row.try_get_unchecked("TotalPurchaseDollars")?,
            total_sales_quantity: row.try_get_unchecked("TotalSalesQuantity")?,
            total_sales_dollars: row.try_get_unchecked("TotalSalesDollars")?,
            total_sales_price: row.try_get_unchecked("TotalSalesPrice")?,
            total_excise_tax: row.try_get_unchecked("TotalExciseTax")?,
            freight_cost: row.try_get_unchecked("FreightCost")?,
        })
    }
}

/// Vendor summary service
#[derive(Clone)]
pub struct SummaryService {
    db: SqlitePool,
}

impl SummaryService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Run the aggregation query. One row per distinct purchase grouping key,
    /// ordered by total purchase dollars descending.
    pub async fn aggregate(&self) -> AppResult<Vec<VendorSummaryRow>> {
        let rows = sqlx::query_as::<_, VendorSummaryRow>(SUMMARY_QUERY)
            .fetch_all(&self.db)
            .await?;

        Ok(rows)
    }

    /// Clean the raw rows: coerce volume to a number, trim the string
    /// columns, zero-fill the left-join gaps, and derive the four ratios.
    ///
    /// Coercion runs before the zero fill, so a NULL volume survives it and
    /// becomes 0 with the other gap columns; a non-null, non-numeric volume
    /// fails the whole run.
    pub fn clean(&self, rows: Vec<VendorSummaryRow>) -> AppResult<Vec<VendorSalesSummary>> {
        rows.into_iter().map(clean_row).collect()
    }

    /// Aggregate then clean, logging a preview of each stage.
    pub async fn build(&self, preview_rows: usize) -> AppResult<Vec<VendorSalesSummary>> {
        let raw = self.aggregate().await?;
        log_preview("aggregate", &raw, preview_rows);

        let cleaned = self.clean(raw)?;
        log_preview("clean", &cleaned, preview_rows);

        Ok(cleaned)
    }

    /// Export rows as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)?;
        }
        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }
}

fn clean_row(row: VendorSummaryRow) -> AppResult<VendorSalesSummary> {
    let volume = match &row.volume {
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| AppError::InvalidVolume {
                value: raw.clone(),
                vendor_number: row.vendor_number,
                brand: row.brand,
            })?,
        None => 0.0,
    };

    let total_sales_quantity = row.total_sales_quantity.unwrap_or(0.0);
    let total_sales_dollars = row.total_sales_dollars.unwrap_or(0.0);
    let total_sales_price = row.total_sales_price.unwrap_or(0.0);
    let total_excise_tax = row.total_excise_tax.unwrap_or(0.0);
    let freight_cost = row.freight_cost.unwrap_or(0.0);

    let gross_profit = metrics::gross_profit(total_sales_dollars, row.total_purchase_dollars);
    let profit_margin = metrics::profit_margin(gross_profit, total_sales_dollars);
    let stock_turnover = metrics::stock_turnover(total_sales_quantity, row.total_purchase_quantity);
    let sales_purchase_ratio =
        metrics::sales_purchase_ratio(total_sales_dollars, row.total_purchase_dollars);

    Ok(VendorSalesSummary {
        vendor_number: row.vendor_number,
        vendor_name: row.vendor_name.trim().to_string(),
        brand: row.brand,
        description: row.description.trim().to_string(),
        purchase_price: row.purchase_price,
        actual_price: row.actual_price,
        volume,
        total_purchase_quantity: row.total_purchase_quantity,
        total_purchase_dollars: row.total_purchase_dollars,
        total_sales_quantity,
        total_sales_dollars,
        total_sales_price,
        total_excise_tax,
        freight_cost,
        gross_profit,
        profit_margin,
        stock_turnover,
        sales_purchase_ratio,
    })
}

fn log_preview<T: Serialize>(stage: &str, rows: &[T], limit: usize) {
    let head = &rows[..rows.len().min(limit)];
    match serde_json::to_string(head) {
        Ok(json) => tracing::debug!(stage, rows = rows.len(), preview = %json),
        Err(e) => tracing::warn!(stage, "preview serialization failed: {}", e),
    }
}

/// Convert cleaned summary rows into a writable table with the 18 output
/// columns in persisted order.
pub fn to_table_data(rows: &[VendorSalesSummary], table_name: &str) -> TableData {
    let types = [
        ColumnType::Integer, // VendorNumber
        ColumnType::Text,    // VendorName
        ColumnType::Integer, // Brand
        ColumnType::Text,    // Description
        ColumnType::Real,    // PurchasePrice
        ColumnType::Real,    // ActualPrice
        ColumnType::Real,    // Volume
        ColumnType::Real,    // TotalPurchaseQuantity
        ColumnType::Real,    // TotalPurchaseDollars
        ColumnType::Real,    // TotalSalesQuantity
        ColumnType::Real,    // TotalSalesDollars
        ColumnType::Real,    // TotalSalesPrice
        ColumnType::Real,    // TotalExciseTax
        ColumnType::Real,    // FreightCost
        ColumnType::Real,    // GrossProfit
        ColumnType::Real,    // ProfitMargin
        ColumnType::Real,    // StockTurnover
        ColumnType::Real,    // SalesPurchaseRatio
    ];

    let columns = VendorSalesSummary::COLUMNS
        .iter()
        .zip(types)
        .map(|(name, column_type)| Column {
            name: (*name).to_string(),
            column_type,
        })
        .collect();

    let data = rows
        .iter()
        .map(|r| {
            vec![
                SqlValue::Integer(r.vendor_number),
                SqlValue::Text(r.vendor_name.clone()),
                SqlValue::Integer(r.brand),
                SqlValue::Text(r.description.clone()),
                SqlValue::Real(r.purchase_price),
                SqlValue::Real(r.actual_price),
                SqlValue::Real(r.volume),
                SqlValue::Real(r.total_purchase_quantity),
                SqlValue::Real(r.total_purchase_dollars),
                SqlValue::Real(r.total_sales_quantity),
                SqlValue::Real(r.total_sales_dollars),
                SqlValue::Real(r.total_sales_price),
                SqlValue::Real(r.total_excise_tax),
                SqlValue::Real(r.freight_cost),
                SqlValue::Real(r.gross_profit),
                SqlValue::Real(r.profit_margin),
                SqlValue::Real(r.stock_turnover),
                SqlValue::Real(r.sales_purchase_ratio),
            ]
        })
        .collect();

    TableData {
        name: table_name.to_string(),
        columns,
        rows: data,
    }
}
