// Primitives for reading Excel workbooks.

use calamine::DataType;

use crate::analysis::{
    io_common::{RawCell, RawTable},
    *,
};

/// Reads a worksheet whose first row holds the headers.
///
/// Without a worksheet name, the workbook must have a single worksheet.
pub fn read_xlsx_table(path: &str, worksheet_name: Option<&str>) -> DrvResult<RawTable> {
    let wrange = get_range(path, worksheet_name)?;

    let mut iter = wrange.rows();
    let headers: Vec<String> = iter
        .next()
        .context(EmptyInputSnafu { path })?
        .iter()
        .map(|c| read_cell(c).label().unwrap_or_default())
        .collect();
    debug!("read_xlsx_table: headers: {:?}", headers);

    let rows: Vec<Vec<RawCell>> = iter
        .map(|row| row.iter().map(read_cell).collect())
        .collect();
    debug!("read_xlsx_table: {} rows", rows.len());
    Ok(RawTable { headers, rows })
}

fn read_cell(cell: &DataType) -> RawCell {
    match cell {
        DataType::Empty => RawCell::Empty,
        DataType::Float(f) => RawCell::Number(*f),
        DataType::Int(i) => RawCell::Number(*i as f64),
        DataType::String(s) => RawCell::from_text(s),
        DataType::Bool(b) => RawCell::Number(if *b { 1.0 } else { 0.0 }),
        x => {
            debug!("read_cell: unsupported cell {:?}", x);
            RawCell::Text(format!("{:?}", x))
        }
    }
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> DrvResult<calamine::Range<DataType>> {
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        path, worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    if let Some(name) = worksheet_name {
        let wrange = workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { path, name })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => EmptyInputSnafu { path }.fail(),
            [(name, wrange)] => {
                debug!("get_range: using worksheet {:?}", name);
                Ok(wrange.clone())
            }
            l => {
                let names: Vec<String> = l.iter().map(|(n, _)| n.clone()).collect();
                whatever!(
                    "{} has several worksheets ({:?}): set worksheetName in the data source",
                    path,
                    names
                )
            }
        }
    }
}
