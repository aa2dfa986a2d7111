pub mod calendar_months;
pub mod config;
pub mod data_access;
pub mod document;
pub mod metrics;
pub mod models;
pub mod report;
pub mod store;
pub mod visual_report;
