mod color;
mod palette;
mod record;

pub use color::{Color, ColorParseError, HEX_CODE_LEN};
pub use palette::Palette;
pub use record::{
    ClassifiedRecord, Reconciliation, ReconciliationResult, Record, RecordSet, RowFailure,
    RowFailureReason,
};
