pub mod json_report;

pub use json_report::JsonReportWriter;
