use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::models::StationWorkbookMapping;
use crate::processors::pacing::{CancellableWait, Pacing, WaitOutcome};
use crate::readers::ReportReader;
use crate::utils::progress::ProgressReporter;
use crate::workbook::WorkbookSession;
use crate::writers::{SheetWriter, WriteSummary};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Outcome of one pass over the discovered stations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub processed: Vec<String>,
    pub missing_reports: Vec<String>,
    pub failures: Vec<(String, String)>,
    pub skipped_waits: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.processed.len() + self.missing_reports.len() + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.missing_reports.is_empty() && self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        let mut out = format!(
            "Stations: {} total, {} updated, {} without report, {} failed",
            self.total(),
            self.processed.len(),
            self.missing_reports.len(),
            self.failures.len()
        );
        if !self.missing_reports.is_empty() {
            out.push_str(&format!("\nMissing reports: {}", self.missing_reports.join(", ")));
        }
        for (station, message) in &self.failures {
            out.push_str(&format!("\n  {}: {}", station, message));
        }
        out
    }
}

/// Drives the per-station cycle: paced wait, parse, write, with failures kept per station.
pub struct Scheduler {
    config: SyncConfig,
    reader: ReportReader,
    writer: SheetWriter,
    pacing: Pacing,
    wait: CancellableWait,
    rng: StdRng,
    month: NaiveDate,
}

impl Scheduler {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let (min, max) = config.wait_window();
        Ok(Self {
            config: config.clone(),
            reader: ReportReader::with_index_base(config.positional_index_base),
            writer: SheetWriter::from_config(config),
            pacing: Pacing::new(min, max),
            wait: CancellableWait::never(),
            rng: StdRng::from_os_rng(),
            month: config.target_month()?,
        })
    }

    pub fn with_wait(mut self, wait: CancellableWait) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn target_month(&self) -> NaiveDate {
        self.month
    }

    /// Process every mapping in order. Station-level failures are recorded and
    /// skipped; only a failure outside any one station aborts the run.
    pub fn run(
        &mut self,
        session: &mut WorkbookSession,
        mappings: &[StationWorkbookMapping],
        progress: Option<&ProgressReporter>,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for mapping in mappings {
            let span = tracing::info_span!("station", id = %mapping.station_id);
            let _guard = span.enter();

            if let Some(p) = progress {
                p.set_message(&format!("Station {}", mapping.station_id));
            }

            if !self.pacing.is_disabled() {
                let delay = self.pacing.sample(&mut self.rng);
                tracing::info!(seconds = delay.as_secs(), "waiting before station (press Enter to skip)");
                if self.wait.wait(delay) == WaitOutcome::Skipped {
                    tracing::debug!("wait skipped by operator");
                    summary.skipped_waits += 1;
                }
            }

            match self.process_station(session, mapping) {
                Ok(written) => {
                    tracing::info!(cells = written.cells_written, "station synchronized");
                    summary.processed.push(mapping.station_id.clone());
                }
                Err(SyncError::MissingReportFile { path }) => {
                    tracing::warn!(report = %path.display(), "report file missing, station skipped");
                    if let Some(p) = progress {
                        p.println(&format!("{}: no report at {}", mapping.station_id, path.display()));
                    }
                    summary.missing_reports.push(mapping.station_id.clone());
                }
                Err(e) if e.is_station_scoped() => {
                    tracing::error!(error = %e, "station failed");
                    if let Some(p) = progress {
                        p.println(&format!("{}: {}", mapping.station_id, e));
                    }
                    summary
                        .failures
                        .push((mapping.station_id.clone(), e.to_string()));
                }
                Err(e) => {
                    tracing::error!(error = %e, "run aborted");
                    return Err(e);
                }
            }

            if let Some(p) = progress {
                p.increment(1);
            }
        }

        Ok(summary)
    }

    fn process_station(
        &self,
        session: &mut WorkbookSession,
        mapping: &StationWorkbookMapping,
    ) -> Result<WriteSummary> {
        let format = self.config.report_format_for(&mapping.report_path)?;
        let records = self
            .reader
            .read(&mapping.report_path, &mapping.station_id, format)?;

        let mut handle = session.open(&mapping.workbook_path, self.config.open)?;
        let written = self.writer.write(&mut handle, &records, self.month);
        let released = handle.close(false);

        let written = written?;
        released?;
        Ok(written)
    }
}
