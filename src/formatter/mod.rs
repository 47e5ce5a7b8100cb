pub mod json;

pub use json::{JsonFormatter, PollReport, ReportSummary};
