//! Table ingestion tests
//!
//! Tests for the write_table collaborator and the raw CSV loader:
//! - create-or-replace semantics
//! - column type inference and NULL handling
//! - identifier sanitizing and CSV export

use std::io::Write;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use shared::VendorSalesSummary;
use vendor_analytics_pipeline::services::ingest::{
    sanitize_identifier, Column, ColumnType, IngestService, SqlValue, TableData,
};
use vendor_analytics_pipeline::services::SummaryService;

// ============================================================================
// Test Fixtures
// ============================================================================

async fn memory_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap()
}

fn numbers_table(name: &str, values: &[i64]) -> TableData {
    TableData {
        name: name.to_string(),
        columns: vec![Column {
            name: "Value".to_string(),
            column_type: ColumnType::Integer,
        }],
        rows: values.iter().map(|v| vec![SqlValue::Integer(*v)]).collect(),
    }
}

fn write_file(dir: &std::path::Path, name: &str, contents: &str) {
    let mut file = std::fs::File::create(dir.join(name)).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
}

// ============================================================================
// write_table Tests
// ============================================================================

/// Writing the same table twice replaces it: the final row count is the
/// second write's, not the sum.
#[tokio::test]
async fn test_write_table_replaces_existing_table() {
    let pool = memory_pool().await;
    let service = IngestService::new(pool.clone());

    service
        .write_table(&numbers_table("counts", &[1, 2, 3]))
        .await
        .unwrap();
    let written = service
        .write_table(&numbers_table("counts", &[4, 5]))
        .await
        .unwrap();
    assert_eq!(written, 2);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM counts")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

/// NULL cells are stored as SQL NULL, not as empty text or zero.
#[tokio::test]
async fn test_write_table_preserves_nulls() {
    let pool = memory_pool().await;
    let service = IngestService::new(pool.clone());

    let table = TableData {
        name: "mixed".to_string(),
        columns: vec![
            Column {
                name: "Label".to_string(),
                column_type: ColumnType::Text,
            },
            Column {
                name: "Amount".to_string(),
                column_type: ColumnType::Real,
            },
        ],
        rows: vec![
            vec![SqlValue::Text("a".to_string()), SqlValue::Real(1.5)],
            vec![SqlValue::Text("b".to_string()), SqlValue::Null],
        ],
    };
    service.write_table(&table).await.unwrap();

    let nulls: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mixed WHERE Amount IS NULL")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(nulls, 1);
}

/// Ragged rows are rejected before anything is committed.
#[tokio::test]
async fn test_write_table_rejects_ragged_rows() {
    let pool = memory_pool().await;
    let service = IngestService::new(pool.clone());

    let table = TableData {
        name: "bad".to_string(),
        columns: vec![
            Column {
                name: "A".to_string(),
                column_type: ColumnType::Integer,
            },
            Column {
                name: "B".to_string(),
                column_type: ColumnType::Integer,
            },
        ],
        rows: vec![vec![SqlValue::Integer(1)]],
    };

    assert!(service.write_table(&table).await.is_err());
}

// ============================================================================
// Raw CSV Load Tests
// ============================================================================

/// Each CSV file becomes one table; non-CSV entries are ignored.
#[tokio::test]
async fn test_load_raw_data_one_table_per_csv() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "purchases.csv", "Brand,Dollars\n100,9.5\n101,3.0\n");
    write_file(dir.path(), "sales.csv", "Brand,SalesDollars\n100,12.0\n");
    write_file(dir.path(), "notes.txt", "not a table\n");

    let pool = memory_pool().await;
    let service = IngestService::new(pool.clone());
    let reports = service.load_raw_data(dir.path()).await.unwrap();

    let tables: Vec<(&str, u64)> = reports.iter().map(|r| (r.table.as_str(), r.rows)).collect();
    assert_eq!(tables, vec![("purchases", 2), ("sales", 1)]);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchases")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

/// Column types come from the data: integers, then floats, then text; empty
/// fields are NULL and stay out of the inference.
#[tokio::test]
async fn test_load_raw_data_infers_column_types() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "items.csv",
        "Id,Price,Name\n1,9.50,Gin\n2,,Rum\n3,4.25,Whisky\n",
    );

    let pool = memory_pool().await;
    let service = IngestService::new(pool.clone());
    service.load_raw_data(dir.path()).await.unwrap();

    let (id_type, price_type, name_type): (String, String, String) = sqlx::query_as(
        "SELECT typeof(Id), typeof(Price), typeof(Name) FROM items WHERE Id = 1",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(id_type, "integer");
    assert_eq!(price_type, "real");
    assert_eq!(name_type, "text");

    let nulls: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE Price IS NULL")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(nulls, 1);
}

/// Re-running the load replaces the tables instead of appending.
#[tokio::test]
async fn test_load_raw_data_is_rerunnable() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "stock.csv", "Brand\n100\n101\n");

    let pool = memory_pool().await;
    let service = IngestService::new(pool.clone());
    service.load_raw_data(dir.path()).await.unwrap();
    service.load_raw_data(dir.path()).await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

/// File stems that are not valid identifiers are folded into safe table names.
#[tokio::test]
async fn test_load_raw_data_sanitizes_table_names() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "2024 begin-inventory.csv", "Brand\n100\n");

    let pool = memory_pool().await;
    let service = IngestService::new(pool.clone());
    let reports = service.load_raw_data(dir.path()).await.unwrap();

    assert_eq!(reports[0].table, "_2024_begin_inventory");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM \"_2024_begin_inventory\"")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

/// A malformed CSV (ragged record) fails the load.
#[tokio::test]
async fn test_load_raw_data_rejects_malformed_csv() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "broken.csv", "A,B\n1,2\n3\n");

    let pool = memory_pool().await;
    let service = IngestService::new(pool);

    assert!(service.load_raw_data(dir.path()).await.is_err());
}

/// A missing directory fails the run.
#[tokio::test]
async fn test_load_raw_data_missing_directory_fails() {
    let pool = memory_pool().await;
    let service = IngestService::new(pool);

    let missing = std::path::Path::new("/nonexistent/raw-data");
    assert!(service.load_raw_data(missing).await.is_err());
}

// ============================================================================
// Identifier + Export Tests
// ============================================================================

#[test]
fn test_sanitize_identifier() {
    assert_eq!(sanitize_identifier("purchases").unwrap(), "purchases");
    assert_eq!(sanitize_identifier("end inventory").unwrap(), "end_inventory");
    assert_eq!(sanitize_identifier("2024sales").unwrap(), "_2024sales");
    assert_eq!(sanitize_identifier("a-b.c").unwrap(), "a_b_c");
    assert!(sanitize_identifier("").is_err());
}

#[test]
fn test_export_to_csv_uses_dataset_column_names() {
    let rows = vec![VendorSalesSummary {
        vendor_number: 1,
        vendor_name: "VENDOR V".to_string(),
        brand: 100,
        description: "B".to_string(),
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
    }];

    let csv_data = SummaryService::export_to_csv(&rows).unwrap();
    let mut lines = csv_data.lines();

    let header = lines.next().unwrap();
    assert!(header.starts_with("VendorNumber,VendorName,Brand"));
    assert!(header.ends_with("GrossProfit,ProfitMargin,StockTurnover,SalesPurchaseRatio"));
    assert_eq!(lines.count(), 1);
}
