pub mod cells;
pub mod remote;
pub mod workbook;

pub use remote::RemoteAdapter;
pub use workbook::{Workbook, WorkbookAdapter};
