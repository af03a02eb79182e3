//! Vitals Domain
//!
//! Samples and pages as returned by the backend, the threshold rule
//! behind the alert cards, and the local CSV export.

mod export;
mod threshold;
mod types;

pub use export::{export_csv, CSV_FILE_NAME, CSV_HEADER};
pub use threshold::{is_abnormal, vital_cards, CardState, Thresholds, VitalCard};
pub use types::{display_time, display_time_in, PatientId, VitalsPage, VitalsSample};
