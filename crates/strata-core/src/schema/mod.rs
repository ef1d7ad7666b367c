mod model;
mod types;

pub use model::{ColumnDef, IndexDef, Snapshot, TableDef};
pub use types::SqlType;
