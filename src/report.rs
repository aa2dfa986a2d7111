use anyhow::{Context, Result};
use polars::prelude::*;

use crate::metrics::{BudgetProgress, CategorySlice, MonthlyTotals};

// --- Newtypes for DataFrames ---

#[derive(Clone)]
pub struct SeriesFrame(pub LazyFrame);

#[derive(Clone)]
pub struct DistributionFrame(pub LazyFrame);

#[derive(Clone)]
pub struct BudgetFrame(pub LazyFrame);

// --- Conversions ---

pub fn monthly_series_to_polars(series: &[MonthlyTotals]) -> Result<SeriesFrame> {
    let months: Vec<&str> = series.iter().map(|m| m.month.as_str()).collect();
    let income: Vec<f64> = series.iter().map(|m| m.income).collect();
    let expenses: Vec<f64> = series.iter().map(|m| m.expenses).collect();

    let df = DataFrame::new(vec![
        Column::new("month".into(), &months),
        Column::new("income".into(), &income),
        Column::new("expenses".into(), &expenses),
    ])
    .context("building monthly series DataFrame")?;

    Ok(SeriesFrame(df.lazy()))
}

pub fn category_distribution_to_polars(slices: &[CategorySlice]) -> Result<DistributionFrame> {
    let names: Vec<&str> = slices.iter().map(|s| s.name.as_str()).collect();
    let values: Vec<f64> = slices.iter().map(|s| s.value).collect();
    let colors: Vec<&str> = slices.iter().map(|s| s.color.as_str()).collect();

    let df = DataFrame::new(vec![
        Column::new("category".into(), &names),
        Column::new("spent".into(), &values),
        Column::new("color".into(), &colors),
    ])
    .context("building category distribution DataFrame")?;

    Ok(DistributionFrame(df.lazy()))
}

pub fn budget_progress_to_polars(progress: &[BudgetProgress]) -> Result<BudgetFrame> {
    let names: Vec<&str> = progress.iter().map(|p| p.category_name.as_str()).collect();
    let budgets: Vec<f64> = progress.iter().map(|p| p.budget).collect();
    let spent: Vec<f64> = progress.iter().map(|p| p.spent).collect();
    let percentage: Vec<f64> = progress.iter().map(|p| p.percentage).collect();
    let status: Vec<&str> = progress.iter().map(|p| p.status.as_str()).collect();

    let df = DataFrame::new(vec![
        Column::new("category".into(), &names),
        Column::new("budget".into(), &budgets),
        Column::new("spent".into(), &spent),
        Column::new("percentage".into(), &percentage),
        Column::new("status".into(), &status),
    ])
    .context("building budget progress DataFrame")?;

    Ok(BudgetFrame(df.lazy()))
}

// --- Tables ---

/// Monthly income/expenses with a `net` column and a trailing `Total` row.
pub fn build_series_table(series: SeriesFrame) -> Result<LazyFrame> {
    let months = series.0.with_columns([(col("income") - col("expenses")).alias("net")]);

    let total = months.clone().select([
        lit("Total").alias("month"),
        col("income").sum().alias("income"),
        col("expenses").sum().alias("expenses"),
        col("net").sum().alias("net"),
    ]);

    let result = concat([months, total], UnionArgs::default())
        .context("concatenating monthly series with total")?;

    Ok(result)
}

/// Category spend, largest first, with each category's share of the total.
pub fn build_distribution_table(distribution: DistributionFrame) -> Result<LazyFrame> {
    let table = distribution
        .0
        .with_columns([(col("spent") / col("spent").sum() * lit(100.0)).alias("share")])
        .select([col("category"), col("spent"), col("share")])
        .sort(
            ["spent"],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        );

    Ok(table)
}

pub fn build_budget_table(budgets: BudgetFrame) -> Result<LazyFrame> {
    Ok(budgets.0.with_columns([(col("budget") - col("spent")).alias("remaining")]))
}

pub fn write_csv_string(df: &mut DataFrame) -> Result<String> {
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf).finish(df).context("writing CSV")?;
    String::from_utf8(buf).context("CSV not valid UTF-8")
}
