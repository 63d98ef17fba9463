pub mod record;
pub mod snapshot;

pub use record::{CaseRecord, CaseTable};
pub use snapshot::DocumentSnapshot;
