//! MSR file infrastructure - discovery and CSV reading

mod discovery;
mod reader;

pub use discovery::{discover_files, report_month_from_name, MsrFile};
pub use reader::MsrReader;
