// Primitives for reading CSV files.

use crate::analysis::{
    io_common::{RawCell, RawTable},
    *,
};

/// Reads a CSV file with a header row. Rows may have fewer cells than the header.
pub fn read_csv_table(path: &str) -> DrvResult<RawTable> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();

    let headers: Vec<String> = match records.next() {
        Some(line_r) => line_r
            .context(CsvLineParseSnafu { lineno: 1usize })?
            .iter()
            .map(|s| s.trim().to_string())
            .collect(),
        None => return EmptyInputSnafu { path }.fail(),
    };
    debug!("read_csv_table: headers: {:?}", headers);

    let mut rows: Vec<Vec<RawCell>> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let row: Vec<RawCell> = line.iter().map(RawCell::from_text).collect();
        debug!("read_csv_table: lineno: {:?} row: {:?}", lineno, row);
        rows.push(row);
    }
    Ok(RawTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_demo_drivers() {
        let path = format!("{}/demos/drivers.csv", env!("CARGO_MANIFEST_DIR"));
        let table = read_csv_table(&path).unwrap();
        assert_eq!(table.headers[0], "Driver");
        assert_eq!(table.headers[1], "Total km");
        assert!(table.rows.len() >= 6);
        assert_eq!(table.rows[0][0], RawCell::Text("D-1041".to_string()));
        assert_eq!(table.rows[0][1], RawCell::Number(48210.0));
    }

    #[test]
    fn missing_file() {
        assert!(read_csv_table("/nonexistent/drivers.csv").is_err());
    }
}
