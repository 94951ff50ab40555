//! Orchestrator for one build generation
//!
//! Runs the stages in order over a single [`BuildState`]:
//! 1. Check the cancellation token; a fired token stops the pipeline before
//!    the next stage starts
//! 2. Run the stage and stamp its name on any error it returns
//! 3. Log warnings and continue; stop on `Fatal` or `Canceled`
//!
//! Stages that never ran are recorded as skipped so the report always lists
//! the full pipeline.

use log::{info, warn};

use super::{BuildState, Stage};
use crate::cancel::CancellationToken;
use crate::error::{StageError, StageErrorKind};
use crate::report::{StageRecord, StageStatus};

/// Outcome of running the stage list once
#[derive(Debug, Default)]
pub struct PipelineRun {
    /// One record per stage, in declaration order
    pub records: Vec<StageRecord>,
    /// Every `Warn` raised, in the order they occurred
    pub warnings: Vec<StageError>,
    /// The `Fatal` or `Canceled` error that halted the pipeline
    pub terminal: Option<StageError>,
}

impl PipelineRun {
    pub fn is_success(&self) -> bool {
        self.terminal.is_none()
    }
}

/// Execute `stages` sequentially against `state`.
pub fn run_stages(
    stages: &[Box<dyn Stage>],
    cancel: &CancellationToken,
    state: &mut BuildState,
) -> PipelineRun {
    let mut run = PipelineRun::default();

    for stage in stages {
        let name = stage.name();

        if run.terminal.is_some() {
            run.records.push(StageRecord::new(name, StageStatus::Skipped));
            continue;
        }

        if cancel.is_canceled() {
            info!("Build canceled before stage '{}'", name);
            run.records.push(StageRecord::new(name, StageStatus::Skipped));
            run.terminal = Some(StageError::canceled().in_stage(name));
            continue;
        }

        info!("Running stage '{}'", name);
        match stage.run(cancel, state) {
            Ok(()) => run.records.push(StageRecord::new(name, StageStatus::Completed)),
            Err(err) => {
                let err = err.in_stage(name);
                match err.kind {
                    StageErrorKind::Warn => {
                        warn!("{}", err);
                        run.records
                            .push(StageRecord::with_error(name, StageStatus::Warned, &err));
                        run.warnings.push(err);
                    }
                    StageErrorKind::Fatal => {
                        run.records
                            .push(StageRecord::with_error(name, StageStatus::Failed, &err));
                        run.terminal = Some(err);
                    }
                    StageErrorKind::Canceled => {
                        info!("Build canceled during stage '{}'", name);
                        run.records
                            .push(StageRecord::with_error(name, StageStatus::Canceled, &err));
                        run.terminal = Some(err);
                    }
                }
            }
        }
    }

    run
}
