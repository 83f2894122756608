// The run configuration, as written by the user.

use crate::analysis::*;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "analysisName")]
    pub analysis_name: String,
    #[serde(rename = "outputFile")]
    pub output_file: Option<String>,
    /// "json" (default) or "csv"
    pub format: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    /// "csv" or "xlsx"
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "worksheetName")]
    pub worksheet_name: Option<String>,
    #[serde(rename = "idColumn")]
    pub id_column: Option<String>,
    #[serde(rename = "distanceColumn")]
    pub distance_column: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "criteriaFile")]
    pub criteria_file: String,
    #[serde(rename = "evaluationFiles")]
    pub evaluation_files: Vec<String>,
    #[serde(rename = "selectedEvaluations")]
    pub selected_evaluations: Option<Vec<String>>,
    #[serde(rename = "driverDataSources")]
    pub driver_data_sources: Vec<DataSource>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl OutputSettings {
    pub fn output_format(&self) -> DrvResult<OutputFormat> {
        match self.format.as_deref() {
            None | Some("json") => Ok(OutputFormat::Json),
            Some("csv") => Ok(OutputFormat::Csv),
            Some(x) => whatever!("Unknown output format {:?}: expected json or csv", x),
        }
    }
}

/// Written under "config" in the summary.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(rename = "analysisName")]
    pub analysis_name: String,
    pub evaluations: Vec<String>,
    pub drivers: usize,
    pub criteria: usize,
}

pub fn read_run_config(path: &str) -> DrvResult<RunConfig> {
    let config: RunConfig = read_json(path)?;
    ensure_whatever!(
        !config.driver_data_sources.is_empty(),
        "No driver data source in {}",
        path
    );
    ensure_whatever!(
        !config.evaluation_files.is_empty(),
        "No evaluation file in {}",
        path
    );
    Ok(config)
}
