use log::{debug, info, warn};

use ahp_topsis::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use calamine::{open_workbook, Reader, Xlsx};
use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;
use uuid::Uuid;

pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_xlsx;

use crate::analysis::config_reader::*;
use crate::analysis::io_common::{assemble_table, DriverTable, RawTable};

#[derive(Debug, Snafu)]
pub enum DrvError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the output"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Error writing to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Invalid criteria catalog {path}"))]
    InvalidCatalog { source: CatalogError, path: String },
    #[snafu(display("Cannot rank the drivers"))]
    Ranking { source: RankingError },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of a CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error writing the CSV output"))]
    CsvWrite { source: csv::Error },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet named {name} in {path}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("{path} has no header row"))]
    EmptyInput { path: String },
    #[snafu(display("Cannot find the directory of {path}"))]
    MissingParentDir { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DrvResult<T> = Result<T, DrvError>;

pub fn read_json<T: DeserializeOwned>(path: &str) -> DrvResult<T> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_json: {} bytes from {:?}", contents.len(), path);
    serde_json::from_str(&contents).context(ParsingJsonSnafu { path })
}

pub fn read_catalog(path: &str) -> DrvResult<CriteriaTree> {
    let criteria: Vec<Criterion> = read_json(path)?;
    CriteriaTree::new(criteria).context(InvalidCatalogSnafu { path })
}

pub fn read_evaluations(paths: &[String]) -> DrvResult<Vec<Evaluation>> {
    let mut res: Vec<Evaluation> = Vec::new();
    for p in paths.iter() {
        let ev: Evaluation = read_json(p)?;
        info!("Read evaluation {} by {:?} from {}", ev.id, ev.user_name, p);
        res.push(ev);
    }
    Ok(res)
}

/// Writes to the given file, or to the standard output for None and "stdout".
pub fn write_output(out: Option<&str>, contents: &str) -> DrvResult<()> {
    match out {
        None | Some("stdout") => {
            println!("{}", contents.trim_end());
            Ok(())
        }
        Some(path) => {
            info!("Writing output to {}", path);
            fs::write(path, contents).context(WritingOutputSnafu { path })
        }
    }
}

fn to_pretty_json<T: Serialize>(x: &T) -> DrvResult<String> {
    serde_json::to_string_pretty(x).context(SerializingJsonSnafu {})
}

fn resolve(root: &Path, file: &str) -> String {
    root.join(file).display().to_string()
}

// The evaluations to average: all of them unless some ids are selected.
fn choose_evaluations<'a>(
    evaluations: &'a [Evaluation],
    selected: &[String],
) -> DrvResult<Vec<&'a Evaluation>> {
    let res: Vec<&Evaluation> = if selected.is_empty() {
        evaluations.iter().collect()
    } else {
        for id in selected.iter() {
            if !evaluations.iter().any(|e| e.id == *id) {
                warn!("Selected evaluation {:?} was not found", id);
            }
        }
        select_evaluations(evaluations, selected)
    };
    ensure_whatever!(!res.is_empty(), "No evaluation to average");
    Ok(res)
}

pub fn run_template(criteria_path: &str, out: Option<&str>) -> DrvResult<()> {
    let tree = read_catalog(criteria_path)?;
    let data = tree.initial_hierarchy_data();
    for node in tree.comparison_nodes() {
        let names: Vec<&str> = tree
            .children(&node.id)
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        info!("{}: compare {:?} (in this order)", node.id, names);
    }
    write_output(out, &to_pretty_json(&data)?)
}

pub fn run_evaluate(
    criteria_path: &str,
    comparisons_path: &str,
    user: &str,
    out: Option<&str>,
) -> DrvResult<()> {
    let tree = read_catalog(criteria_path)?;
    let data: HierarchyData = read_json(comparisons_path)?;
    for node_id in data.keys() {
        if tree.children(node_id).len() < 2 {
            warn!(
                "Ignoring the comparisons for {:?}: not a criterion with several children",
                node_id
            );
        }
    }

    let now = Utc::now();
    let existing: Option<Evaluation> = match out {
        Some(p) if p != "stdout" && Path::new(p).exists() => Some(read_json(p)?),
        _ => None,
    };
    let evaluation = match existing {
        Some(mut ev) if ev.user_name == user => {
            info!("Updating evaluation {} of {:?}", ev.id, user);
            ev.recompute(&tree, data, now);
            ev
        }
        Some(ev) => whatever!(
            "{} already holds the evaluation of {:?}, not {:?}",
            out.unwrap_or_default(),
            ev.user_name,
            user
        ),
        None => Evaluation::from_hierarchy(&Uuid::new_v4().to_string(), user, &tree, data, now),
    };

    for (node_id, c) in evaluation.consistency_results.iter() {
        info!(
            "{}: consistency ratio {:.4} ({})",
            node_id,
            c.consistency_ratio,
            if c.is_consistent {
                "consistent"
            } else {
                "inconsistent"
            }
        );
    }
    for (node_id, cr) in evaluation.inconsistent_nodes() {
        warn!(
            "The comparisons of {:?} are inconsistent (CR = {:.3} >= {}): consider revising them",
            node_id, cr, CONSISTENCY_THRESHOLD
        );
    }
    write_output(out, &to_pretty_json(&evaluation)?)
}

pub fn run_consensus(
    criteria_path: &str,
    evaluation_paths: &[String],
    selected: &[String],
) -> DrvResult<()> {
    let tree = read_catalog(criteria_path)?;
    let evaluations = read_evaluations(evaluation_paths)?;
    let chosen = choose_evaluations(&evaluations, selected)?;
    let consensus = average_weight_maps(chosen.iter().map(|e| &e.global_weights));
    let criteria = ranking_criteria(&tree, &consensus);
    let ids: Vec<&str> = chosen.iter().map(|e| e.id.as_str()).collect();
    let js = json!({
        "evaluations": ids,
        "consensusWeights": consensus,
        "rankingCriteria": criteria,
    });
    write_output(None, &to_pretty_json(&js)?)
}

/// The product of an analysis, before it is written.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub config: RunConfig,
    pub summary: JSValue,
    pub results: Vec<RankedAlternative>,
}

fn read_driver_source(
    root: &Path,
    source: &DataSource,
    criteria: &[RankingCriterion],
) -> DrvResult<DriverTable> {
    let path = resolve(root, &source.file_path);
    info!("Attempting to read driver data {:?}", path);
    let table: RawTable = match source.provider.as_str() {
        "csv" => io_csv::read_csv_table(&path)?,
        "xlsx" => io_xlsx::read_xlsx_table(&path, source.worksheet_name.as_deref())?,
        x => whatever!("Provider not implemented {:?}: expected csv or xlsx", x),
    };
    assemble_table(&table, criteria, source)
}

fn build_summary_js(
    config: &RunConfig,
    evaluations: &[&Evaluation],
    criteria: &[RankingCriterion],
    detailed: &TopsisDetailedResult,
) -> JSValue {
    let c = OutputConfig {
        analysis_name: config.output_settings.analysis_name.clone(),
        evaluations: evaluations.iter().map(|e| e.id.clone()).collect(),
        drivers: detailed.alternatives.len(),
        criteria: criteria.len(),
    };
    json!({
        "config": c,
        "criteria": criteria,
        "results": detailed.results,
        "details": detailed,
    })
}

/// Runs the whole pipeline described by a run configuration.
pub fn compute_analysis(config_path: &str) -> DrvResult<AnalysisOutcome> {
    let config = read_run_config(config_path)?;
    info!("config: {:?}", config);
    let root = Path::new(config_path)
        .parent()
        .context(MissingParentDirSnafu { path: config_path })?;

    let tree = read_catalog(&resolve(root, &config.criteria_file))?;
    let evaluation_paths: Vec<String> = config
        .evaluation_files
        .iter()
        .map(|f| resolve(root, f))
        .collect();
    let evaluations = read_evaluations(&evaluation_paths)?;
    let chosen = choose_evaluations(
        &evaluations,
        config.selected_evaluations.as_deref().unwrap_or_default(),
    )?;
    let consensus = average_weight_maps(chosen.iter().map(|e| &e.global_weights));
    let criteria = ranking_criteria(&tree, &consensus);
    ensure_whatever!(
        !criteria.is_empty(),
        "No leaf criterion has a positive consensus weight"
    );
    debug!("compute_analysis: ranking criteria: {:?}", criteria);

    let mut drivers = DriverTable::default();
    for source in config.driver_data_sources.iter() {
        drivers.append(read_driver_source(root, source, &criteria)?);
    }
    ensure_whatever!(!drivers.drivers.is_empty(), "No driver found in the data sources");

    let input = TopsisInput::from_criteria(drivers.drivers, &criteria, drivers.matrix);
    let mut detailed = rank_detailed(&input).context(RankingSnafu {})?;
    if !drivers.secondary_keys.is_empty() {
        detailed.results = add_secondary_keys(&detailed.results, &drivers.secondary_keys);
    }
    for r in detailed.results.iter() {
        debug!(
            "compute_analysis: {} {} {:.6} {:?}",
            r.rank, r.alternative, r.closeness_coefficient, r.secondary_key
        );
    }

    let summary = build_summary_js(&config, &chosen, &criteria, &detailed);
    Ok(AnalysisOutcome {
        config,
        summary,
        results: detailed.results,
    })
}

pub fn results_to_csv(results: &[RankedAlternative]) -> DrvResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["rank", "alternative", "closeness", "secondary_key"])
        .context(CsvWriteSnafu {})?;
    for r in results.iter() {
        wtr.write_record(&[
            r.rank.to_string(),
            r.alternative.clone(),
            format!("{:.6}", r.closeness_coefficient),
            r.secondary_key.map(|k| k.to_string()).unwrap_or_default(),
        ])
        .context(CsvWriteSnafu {})?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| e.into_error())
        .context(WritingOutputSnafu { path: "CSV buffer" })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn run_analysis(
    config_path: &str,
    out: Option<&str>,
    check_summary_path: Option<&str>,
) -> DrvResult<()> {
    let outcome = compute_analysis(config_path)?;
    let pretty_js_summary = to_pretty_json(&outcome.summary)?;

    let contents = match outcome.config.output_settings.output_format()? {
        OutputFormat::Json => pretty_js_summary.clone(),
        OutputFormat::Csv => results_to_csv(&outcome.results)?,
    };
    let configured_out: Option<String> = match outcome.config.output_settings.output_file.as_ref() {
        Some(f) => {
            let root = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu { path: config_path })?;
            Some(resolve(root, f))
        }
        None => None,
    };
    write_output(out.or(configured_out.as_deref()), &contents)?;

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        check_reference(summary_p, &pretty_js_summary)?;
    }
    Ok(())
}

/// Compares a pretty-printed summary with the summary stored in `summary_p`.
fn check_reference(summary_p: &str, pretty_js_summary: &str) -> DrvResult<()> {
    let summary_ref: JSValue = read_json(summary_p)?;
    let pretty_js_summary_ref = to_pretty_json(&summary_ref)?;
    if pretty_js_summary_ref != pretty_js_summary {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_summary, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    info!("The summary matches the reference {}", summary_p);
    Ok(())
}
