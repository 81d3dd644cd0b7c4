pub mod backend;
pub mod config;
mod report_viewer;

pub use report_viewer::SystemReportViewer;
