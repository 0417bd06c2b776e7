//! Injectable diagnostics sink.
//!
//! Every component takes a `&dyn Diagnostics` instead of writing to a
//! process-wide warnings channel. [`LogDiagnostics`] forwards everything to the
//! `log` facade; [`RecordingDiagnostics`] keeps the events in memory so callers
//! (and tests) can inspect perturbation counts and stage timings afterwards.

use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

/// Pipeline stages that report timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Knn,
    StructuralGraph,
    LabelledGraph,
    UnlabelledGraph,
    Laplacian,
    InverseDegree,
    StructuralTerm,
    JointMatrix,
    Svd,
    InstanceProjection,
    Classifier,
    MatrixIo,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Knn => "knn",
            Stage::StructuralGraph => "structural_graph",
            Stage::LabelledGraph => "labelled_graph",
            Stage::UnlabelledGraph => "unlabelled_graph",
            Stage::Laplacian => "laplacian",
            Stage::InverseDegree => "inverse_degree",
            Stage::StructuralTerm => "structural_term",
            Stage::JointMatrix => "joint_matrix",
            Stage::Svd => "svd",
            Stage::InstanceProjection => "instance_projection",
            Stage::Classifier => "classifier",
            Stage::MatrixIo => "matrix_io",
        };
        f.write_str(name)
    }
}

pub trait Diagnostics: Send + Sync {
    /// A stage finished after `elapsed`.
    fn stage_finished(&self, stage: Stage, elapsed: Duration);

    /// `count` of `total` rows had a zero degree and were perturbed.
    fn perturbed_rows(&self, context: &str, count: usize, total: usize);

    /// Shape of a named matrix, reported once it is available.
    fn shape(&self, name: &str, rows: usize, cols: usize);

    /// Non-fatal numerical concern (e.g. asymmetry found by a debug check).
    fn warning(&self, message: &str);
}

/// Forwards diagnostics to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn stage_finished(&self, stage: Stage, elapsed: Duration) {
        info!("stage {} took: {:.4} sec", stage, elapsed.as_secs_f64());
    }

    fn perturbed_rows(&self, context: &str, count: usize, total: usize) {
        if count > 0 {
            warn!("{}: perturbations = {} of {} rows", context, count, total);
        } else {
            debug!("{}: no zero-degree rows among {}", context, total);
        }
    }

    fn shape(&self, name: &str, rows: usize, cols: usize) {
        info!("{} {} x {}", name, rows, cols);
    }

    fn warning(&self, message: &str) {
        warn!("{}", message);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticEvent {
    StageFinished { stage: Stage, elapsed: Duration },
    PerturbedRows { context: String, count: usize, total: usize },
    Shape { name: String, rows: usize, cols: usize },
    Warning(String),
}

/// In-memory sink. Also forwards to `log` so nothing is lost when a logger
/// is installed.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Sum of perturbed rows over all reports.
    pub fn total_perturbations(&self) -> usize {
        self.events()
            .iter()
            .map(|e| match e {
                DiagnosticEvent::PerturbedRows { count, .. } => *count,
                _ => 0,
            })
            .sum()
    }

    pub fn stage_timings(&self, stage: Stage) -> Vec<Duration> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                DiagnosticEvent::StageFinished { stage: s, elapsed } if *s == stage => {
                    Some(*elapsed)
                }
                _ => None,
            })
            .collect()
    }

    pub fn shape_of(&self, name: &str) -> Option<(usize, usize)> {
        self.events().iter().rev().find_map(|e| match e {
            DiagnosticEvent::Shape { name: n, rows, cols } if n == name => Some((*rows, *cols)),
            _ => None,
        })
    }

    fn push(&self, event: DiagnosticEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn stage_finished(&self, stage: Stage, elapsed: Duration) {
        LogDiagnostics.stage_finished(stage, elapsed);
        self.push(DiagnosticEvent::StageFinished { stage, elapsed });
    }

    fn perturbed_rows(&self, context: &str, count: usize, total: usize) {
        LogDiagnostics.perturbed_rows(context, count, total);
        self.push(DiagnosticEvent::PerturbedRows {
            context: context.to_string(),
            count,
            total,
        });
    }

    fn shape(&self, name: &str, rows: usize, cols: usize) {
        LogDiagnostics.shape(name, rows, cols);
        self.push(DiagnosticEvent::Shape { name: name.to_string(), rows, cols });
    }

    fn warning(&self, message: &str) {
        LogDiagnostics.warning(message);
        self.push(DiagnosticEvent::Warning(message.to_string()));
    }
}

/// Scoped timer: reports the elapsed time of `stage` when dropped.
pub struct StageTimer<'a> {
    diagnostics: &'a dyn Diagnostics,
    stage: Stage,
    start: Instant,
}

impl<'a> StageTimer<'a> {
    pub fn start(diagnostics: &'a dyn Diagnostics, stage: Stage) -> Self {
        debug!("stage {} started", stage);
        Self { diagnostics, stage, start: Instant::now() }
    }
}

impl Drop for StageTimer<'_> {
    fn drop(&mut self) {
        self.diagnostics.stage_finished(self.stage, self.start.elapsed());
    }
}
