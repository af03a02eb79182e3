//! CSV export of the loaded page
//!
//! Pure and synchronous; nothing goes over the network.

use super::VitalsSample;

pub const CSV_HEADER: [&str; 4] = ["Time", "Heart Rate", "Temperature", "SpO2"];

/// Default download name
pub const CSV_FILE_NAME: &str = "patient_vitals.csv";

/// Serialize samples as CSV, rows joined by `\n` with no trailing newline
pub fn export_csv(samples: &[VitalsSample]) -> Result<String, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for sample in samples {
        writer.write_record([
            sample.time(),
            sample.heart_rate.to_string(),
            sample.temperature.to_string(),
            sample.spo2.to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    let mut out = String::from_utf8_lossy(&bytes).into_owned();
    if out.ends_with('\n') {
        out.pop();
    }
    Ok(out)
}
