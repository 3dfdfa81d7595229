pub mod audit_log;
pub mod change_report;
pub mod snapshot;
