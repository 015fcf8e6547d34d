//! CSV loading for the cleaned survey export.

use std::io::Read;
use std::path::Path;

use crate::error::IngestError;
use crate::types::ResponseRecord;

/// Load all response rows from a CSV file.
pub fn load_responses<P: AsRef<Path>>(path: P) -> Result<Vec<ResponseRecord>, IngestError> {
    let file = std::fs::File::open(path.as_ref())?;
    let records = read_responses(file)?;
    tracing::info!(
        path = %path.as_ref().display(),
        rows = records.len(),
        "loaded survey responses"
    );
    Ok(records)
}

/// Deserialize response rows from any reader. Unknown columns are ignored;
/// known-but-absent columns take their defaults.
pub fn read_responses<R: Read>(reader: R) -> Result<Vec<ResponseRecord>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in csv_reader.deserialize::<ResponseRecord>() {
        records.push(row?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_full_rows() {
        let data = "id,suggestion,skip_experience,arrival_time,mode,frequency,skipped_class\n\
                    r1,build another deck near the quad,,8-10 AM,Drive alone,Daily,True\n\
                    r2,,waited 40 minutes and gave up,Before 8 AM,Carpool,Daily,False\n";
        let records = read_responses(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "r1");
        assert!(records[0].skipped_class);
        assert_eq!(records[1].skip_experience, "waited 40 minutes and gave up");
        assert!(!records[1].skipped_class);
    }

    #[test]
    fn tolerates_missing_optional_columns() {
        let data = "id,suggestion\nr1,more night parking by the library\n";
        let records = read_responses(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].arrival_time, "");
        assert!(!records[0].skipped_class);
    }

    #[test]
    fn ignores_unknown_columns() {
        let data = "id,suggestion,unrelated\nr1,expand the west commuter lot,junk\n";
        let records = read_responses(data.as_bytes()).unwrap();
        assert_eq!(records[0].suggestion, "expand the west commuter lot");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = load_responses("/definitely/not/here.csv");
        assert!(matches!(result, Err(IngestError::Io(_))));
    }
}
