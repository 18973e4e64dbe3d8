//! CLI command implementations
//!
//! Each command reads a flow definition from disk, drives one use case,
//! and writes a JSON report — the same read-use case-report shape the
//! original `AnalyzeCommand` followed, just without the HTML/CSV/Markdown
//! branches that command supported.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::info;

use crate::application::use_cases::{Demand, LotSpec, OptimiserRequest, OptimiseWorkers, SimulateFlow, ValidateFlow};
use crate::application::use_cases::optimise_workers::IndicatifProgressSink;
use crate::domain::entities::Flow;
use crate::domain::value_objects::Minutes;
use crate::infrastructure::output::JsonReportWriter;
use crate::infrastructure::parsers::FlowDefinitionLoader;
use crate::presentation::dto::{OptimiserReport, SimulationReport, ValidationReport};

fn load_flow(input: &Path) -> Result<Flow> {
    let raw = fs::read_to_string(input).with_context(|| format!("reading flow definition {}", input.display()))?;
    FlowDefinitionLoader::load_str(&raw)
        .map_err(anyhow::Error::from)
        .with_context(|| format!("parsing flow definition {}", input.display()))
}

fn load_demand(units: Option<u32>, lots: Option<PathBuf>) -> Result<Demand> {
    match (units, lots) {
        (Some(n), None) => Ok(Demand::Units(n)),
        (None, Some(path)) => {
            let raw = fs::read_to_string(&path).with_context(|| format!("reading lot list {}", path.display()))?;
            let lots: Vec<LotSpec> =
                serde_json::from_str(&raw).with_context(|| format!("parsing lot list {}", path.display()))?;
            Ok(Demand::Lots(lots))
        }
        (Some(_), Some(_)) => anyhow::bail!("--units and --lots are mutually exclusive"),
        (None, None) => anyhow::bail!("one of --units or --lots is required"),
    }
}

fn parse_start(start: Option<String>) -> Result<NaiveDateTime> {
    match start {
        Some(raw) => NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M")
            .with_context(|| format!("parsing --start '{raw}' (expected \"YYYY-MM-DD HH:MM\")")),
        None => Ok(NaiveDate::from_ymd_opt(1970, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()),
    }
}

fn write_report<T: serde::Serialize>(report: &T, output: Option<PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            JsonReportWriter::write_to_file(&path, report)?;
            info!(path = %path.display(), "wrote report");
        }
        None => JsonReportWriter::write_to_stdout(report)?,
    }
    Ok(())
}

pub struct ValidateCommand;

impl ValidateCommand {
    pub fn execute(input: &Path) -> Result<()> {
        let flow = load_flow(input)?;
        let result = ValidateFlow::validate(&flow);
        let report = ValidationReport::for_flow(&flow, result.is_ok());
        write_report(&report, None)?;
        result.map_err(anyhow::Error::from)
    }
}

pub struct SimulateCommand;

impl SimulateCommand {
    pub fn execute(
        input: &Path,
        units: Option<u32>,
        lots: Option<PathBuf>,
        start: Option<String>,
        output: Option<PathBuf>,
    ) -> Result<()> {
        let flow = load_flow(input)?;
        let demand = load_demand(units, lots)?;
        let start_at = parse_start(start)?;

        info!(flow = %flow.name, "running simulation");
        let result = SimulateFlow::run(&flow, &demand, start_at)?;
        let report = SimulationReport::new(&flow.name, &result);
        write_report(&report, output)
    }
}

pub struct OptimiseCommand;

impl OptimiseCommand {
    #[allow(clippy::too_many_arguments)]
    pub fn execute(
        input: &Path,
        units: Option<u32>,
        lots: Option<PathBuf>,
        start: Option<String>,
        pools: Vec<String>,
        min_capacity: u32,
        max_capacity: u32,
        deadline_minutes: u32,
        output: Option<PathBuf>,
    ) -> Result<()> {
        let flow = load_flow(input)?;
        let demand = load_demand(units, lots)?;
        let start_at = parse_start(start)?;

        let request = OptimiserRequest {
            pools,
            min_capacity,
            max_capacity,
            deadline: Minutes(deadline_minutes),
        };

        info!(flow = %flow.name, "searching for minimum staffing");
        let mut progress = IndicatifProgressSink::new();
        let result = OptimiseWorkers::optimise(&flow, &demand, start_at, &request, &mut progress, &|| false)?;
        let report = OptimiserReport::new(&flow.name, &result);
        write_report(&report, output)
    }
}
