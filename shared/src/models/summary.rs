//! Vendor sales summary model

use serde::{Deserialize, Serialize};

/// One cleaned output row of the vendor sales summary: the purchase grouping
/// key, the aggregated purchase/sales/freight totals, and the four derived
/// business ratios.
///
/// Field names serialize in the dataset's PascalCase column convention, so the
/// same struct backs CSV export and preview logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VendorSalesSummary {
    pub vendor_number: i64,
    pub vendor_name: String,
    pub brand: i64,
    pub description: String,
    pub purchase_price: f64,
    pub actual_price: f64,
    pub volume: f64,
    pub total_purchase_quantity: f64,
    pub total_purchase_dollars: f64,
    pub total_sales_quantity: f64,
    pub total_sales_dollars: f64,
    pub total_sales_price: f64,
    pub total_excise_tax: f64,
    pub freight_cost: f64,
    pub gross_profit: f64,
    pub profit_margin: f64,
    pub stock_turnover: f64,
    pub sales_purchase_ratio: f64,
}

impl VendorSalesSummary {
    /// Output column names, in persisted order.
    pub const COLUMNS: [&'static str; 18] = [
        "VendorNumber",
        "VendorName",
        "Brand",
        "Description",
        "PurchasePrice",
        "ActualPrice",
        "Volume",
        "TotalPurchaseQuantity",
        "TotalPurchaseDollars",
        "TotalSalesQuantity",
        "TotalSalesDollars",
        "TotalSalesPrice",
        "TotalExciseTax",
        "FreightCost",
        "GrossProfit",
        "ProfitMargin",
        "StockTurnover",
        "SalesPurchaseRatio",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VendorSalesSummary {
        VendorSalesSummary {
            vendor_number: 4466,
            vendor_name: "AMERICAN VINTAGE BEVERAGE".to_string(),
            brand: 1004,
            description: "Jim Beam w/2 Rocks Glasses".to_string(),
            purchase_price: 12.0,
            actual_price: 16.49,
            volume: 750.0,
            total_purchase_quantity: 10.0,
            total_purchase_dollars: 100.0,
            total_sales_quantity: 8.0,
            total_sales_dollars: 150.0,
            total_sales_price: 131.92,
            total_excise_tax: 1.16,
            freight_cost: 25.3,
            gross_profit: 50.0,
            profit_margin: 100.0 / 3.0,
            stock_turnover: 0.8,
            sales_purchase_ratio: 1.5,
        }
    }

    #[test]
    fn serializes_with_dataset_column_names() {
        let row = sample();
        let json = serde_json::to_value(&row).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), VendorSalesSummary::COLUMNS.len());
        for column in VendorSalesSummary::COLUMNS {
            assert!(object.contains_key(column), "missing column {}", column);
        }
        assert_eq!(object["VendorNumber"], 4466);
        assert_eq!(object["SalesPurchaseRatio"], 1.5);
    }

    #[test]
    fn round_trips_through_serde() {
        let row = sample();
        let json = serde_json::to_string(&row).unwrap();
        let back: VendorSalesSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }
}
