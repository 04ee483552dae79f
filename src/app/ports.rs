use crate::domain::RawTable;
use crate::error::Result;

/// Where a store table is loaded from
pub trait RecordSourcePort {
    /// Human-readable location, used in logs and the report
    fn describe(&self) -> String;

    fn load(&self) -> Result<RawTable>;
}

/// Where the deduplicated table is persisted
pub trait RecordSinkPort {
    fn describe(&self) -> String;

    fn write(&self, table: &RawTable) -> Result<()>;
}
