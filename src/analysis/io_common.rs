// Shared primitives of the readers: raw tables and the mapping of their columns to criteria.

use std::collections::HashMap;

use crate::analysis::*;

/// A cell as read from a data file.
#[derive(PartialEq, Debug, Clone)]
pub enum RawCell {
    Empty,
    Number(f64),
    Text(String),
}

impl RawCell {
    pub fn from_text(s: &str) -> RawCell {
        let t = s.trim();
        if t.is_empty() {
            RawCell::Empty
        } else if let Ok(x) = t.parse::<f64>() {
            RawCell::Number(x)
        } else {
            RawCell::Text(t.to_string())
        }
    }

    /// The numeric value of the cell. Text and empty cells read 0.
    pub fn value(&self) -> f64 {
        match self {
            RawCell::Number(x) if x.is_finite() => *x,
            _ => 0.0,
        }
    }

    pub fn label(&self) -> Option<String> {
        match self {
            RawCell::Empty => None,
            RawCell::Number(x) => Some(format!("{}", x)),
            RawCell::Text(s) => Some(s.clone()),
        }
    }
}

/// A header row and the rows below it.
#[derive(PartialEq, Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

/// The part of the decision matrix read from one data source.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct DriverTable {
    pub drivers: Vec<String>,
    pub matrix: Vec<Vec<f64>>,
    pub secondary_keys: HashMap<String, f64>,
}

impl DriverTable {
    pub fn append(&mut self, other: DriverTable) {
        for d in other.drivers.iter() {
            if self.drivers.contains(d) {
                warn!("Driver {:?} appears in several data sources", d);
            }
        }
        self.drivers.extend(other.drivers);
        self.matrix.extend(other.matrix);
        self.secondary_keys.extend(other.secondary_keys);
    }
}

/// Lower case, without whitespace, quotes or parentheses.
pub fn normalize_header(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '"' | '\'' | '(' | ')'))
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// The column of a named field, by exact then normalized header comparison.
pub fn find_named_column(name: &str, headers: &[String]) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name.trim())
        .or_else(|| {
            let n = normalize_header(name);
            headers.iter().position(|h| normalize_header(h) == n)
        })
}

/// The column holding a criterion.
///
/// The candidate labels are the name of the criterion, its aliases and its id. A header
/// that equals one of them wins, then a header equal once normalized, then a header that
/// contains one of them (ignoring case).
pub fn find_criterion_column(criterion: &RankingCriterion, headers: &[String]) -> Option<usize> {
    let mut labels: Vec<&str> = vec![criterion.name.as_str()];
    labels.extend(criterion.aliases.iter().map(|s| s.as_str()));
    labels.push(criterion.id.as_str());
    let labels: Vec<&str> = labels.into_iter().filter(|l| !l.trim().is_empty()).collect();

    if let Some(idx) = headers
        .iter()
        .position(|h| labels.iter().any(|l| h.trim() == l.trim()))
    {
        return Some(idx);
    }

    let normalized: Vec<String> = labels.iter().map(|l| normalize_header(l)).collect();
    if let Some(idx) = headers
        .iter()
        .position(|h| normalized.contains(&normalize_header(h)))
    {
        return Some(idx);
    }

    let lowered: Vec<String> = labels.iter().map(|l| l.trim().to_lowercase()).collect();
    headers.iter().position(|h| {
        let h = h.to_lowercase();
        lowered.iter().any(|l| h.contains(l.as_str()))
    })
}

/// The distance column: the configured one, or the first header mentioning kilometres.
pub fn find_distance_column(configured: Option<&str>, headers: &[String]) -> Option<usize> {
    match configured {
        Some(name) => find_named_column(name, headers),
        None => headers.iter().position(|h| {
            let h = h.to_lowercase();
            h.contains("kilometre") || h.contains("km")
        }),
    }
}

/// Maps the columns of a raw table onto the ranking criteria.
pub fn assemble_table(
    table: &RawTable,
    criteria: &[RankingCriterion],
    source: &DataSource,
) -> DrvResult<DriverTable> {
    let id_idx = match source.id_column.as_deref() {
        Some(name) => match find_named_column(name, &table.headers) {
            Some(idx) => idx,
            None => whatever!(
                "Cannot find the id column {:?} in {}: headers are {:?}",
                name,
                source.file_path,
                table.headers
            ),
        },
        None => 0,
    };

    let columns: Vec<Option<usize>> = criteria
        .iter()
        .map(|c| {
            let col = find_criterion_column(c, &table.headers);
            match col {
                Some(idx) => debug!(
                    "assemble_table: criterion {:?} -> column {:?}",
                    c.id, table.headers[idx]
                ),
                None => warn!(
                    "No column for criterion {:?} ({}) in {}, reading 0",
                    c.id, c.name, source.file_path
                ),
            }
            col
        })
        .collect();

    let distance_idx = find_distance_column(source.distance_column.as_deref(), &table.headers);
    debug!("assemble_table: distance column: {:?}", distance_idx);

    let mut res = DriverTable::default();
    for (idx, row) in table.rows.iter().enumerate() {
        if row.iter().all(|c| *c == RawCell::Empty) {
            continue;
        }
        let driver = match row.get(id_idx).and_then(|c| c.label()) {
            Some(d) => d,
            None => {
                warn!(
                    "Skipping row {} of {}: no driver id",
                    idx + 2,
                    source.file_path
                );
                continue;
            }
        };
        let values: Vec<f64> = columns
            .iter()
            .map(|col| {
                col.and_then(|c| row.get(c))
                    .map(|cell| cell.value())
                    .unwrap_or(0.0)
            })
            .collect();
        if let Some(d_idx) = distance_idx {
            let distance = row.get(d_idx).map(|c| c.value()).unwrap_or(0.0);
            res.secondary_keys.insert(driver.clone(), distance);
        }
        res.drivers.push(driver);
        res.matrix.push(values);
    }
    info!(
        "Read {} drivers from {}",
        res.drivers.len(),
        source.file_path
    );
    Ok(res)
}
