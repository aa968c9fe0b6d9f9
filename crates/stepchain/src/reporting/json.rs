//! JSON writer for run reports.
//!
//! The writer serializes a [`RunReport`] into a predictable, machine-readable
//! shape. Status labels are lowercase so downstream tools can rely on
//! consistent casing.

use std::io::Write;

use serde::Serialize;

use super::{RunReport, ScenarioRecord, StepRecord};

#[derive(Serialize)]
struct JsonReport<'a> {
    chained_steps_used: bool,
    scenarios: Vec<JsonScenario<'a>>,
}

#[derive(Serialize)]
struct JsonScenario<'a> {
    feature_path: &'a str,
    scenario_name: &'a str,
    status: &'static str,
    line: u32,
    steps: Vec<JsonStep<'a>>,
}

#[derive(Serialize)]
struct JsonStep<'a> {
    keyword: &'static str,
    text: &'a str,
    line: u32,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin: Option<&'a str>,
}

impl<'a> From<&'a RunReport> for JsonReport<'a> {
    fn from(report: &'a RunReport) -> Self {
        Self {
            chained_steps_used: report.chained_steps_used(),
            scenarios: report.scenarios().iter().map(JsonScenario::from).collect(),
        }
    }
}

impl<'a> From<&'a ScenarioRecord> for JsonScenario<'a> {
    fn from(record: &'a ScenarioRecord) -> Self {
        Self {
            feature_path: record.feature_path(),
            scenario_name: record.scenario_name(),
            status: record.status().label(),
            line: record.line(),
            steps: record.steps().iter().map(JsonStep::from).collect(),
        }
    }
}

impl<'a> From<&'a StepRecord> for JsonStep<'a> {
    fn from(record: &'a StepRecord) -> Self {
        Self {
            keyword: record.keyword().as_str(),
            text: record.text(),
            line: record.line(),
            status: record.status().label(),
            message: record.message(),
            origin: record.origin(),
        }
    }
}

/// Serialize `report` into the supplied writer.
///
/// # Examples
/// ```rust
/// use stepchain::reporting::{json, RunReport, ScenarioRecord};
///
/// let mut report = RunReport::new();
/// report.record(ScenarioRecord::new("feature", "scenario", 1, &[]));
/// let mut buffer = Vec::new();
/// json::write(&mut buffer, &report).unwrap_or_else(|e| panic!("{e}"));
/// let output = String::from_utf8(buffer).unwrap_or_default();
/// assert!(output.contains("\"status\":\"passed\""));
/// ```
///
/// # Errors
/// Returns an error when serialization of the report fails.
pub fn write<W: Write>(writer: &mut W, report: &RunReport) -> serde_json::Result<()> {
    serde_json::to_writer(writer, &JsonReport::from(report))
}

/// Produce a JSON string representation of `report`.
///
/// # Examples
/// ```rust
/// use stepchain::reporting::{json, RunReport, ScenarioRecord};
///
/// let mut report = RunReport::new();
/// report.record(ScenarioRecord::new("feature", "scenario", 1, &[]));
/// let json = json::to_string(&report).unwrap_or_default();
/// assert!(json.contains("\"scenario_name\":\"scenario\""));
/// ```
///
/// # Errors
/// Returns an error when serializing the report fails.
pub fn to_string(report: &RunReport) -> serde_json::Result<String> {
    serde_json::to_string(&JsonReport::from(report))
}
