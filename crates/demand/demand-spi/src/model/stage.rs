//! Pipeline stage state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of a pipeline run in the fixed stage sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum PipelineStage {
    #[default]
    Idle,
    Validated,
    LinearityDone,
    Decomposed,
    StationarityDone,
    ModelSelected,
    Forecasted,
}

impl PipelineStage {
    /// Stage that must be current before `self` can be entered.
    pub fn prerequisite(&self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Idle => None,
            PipelineStage::Validated => Some(PipelineStage::Idle),
            PipelineStage::LinearityDone => Some(PipelineStage::Validated),
            PipelineStage::Decomposed => Some(PipelineStage::LinearityDone),
            PipelineStage::StationarityDone => Some(PipelineStage::Decomposed),
            PipelineStage::ModelSelected => Some(PipelineStage::StationarityDone),
            PipelineStage::Forecasted => Some(PipelineStage::ModelSelected),
        }
    }

    /// Stage entered after `self` completes.
    pub fn next(&self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Idle => Some(PipelineStage::Validated),
            PipelineStage::Validated => Some(PipelineStage::LinearityDone),
            PipelineStage::LinearityDone => Some(PipelineStage::Decomposed),
            PipelineStage::Decomposed => Some(PipelineStage::StationarityDone),
            PipelineStage::StationarityDone => Some(PipelineStage::ModelSelected),
            PipelineStage::ModelSelected => Some(PipelineStage::Forecasted),
            PipelineStage::Forecasted => None,
        }
    }

    /// Whether `target` is the single allowed forward transition from `self`.
    pub fn can_advance_to(&self, target: PipelineStage) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Validated => "validated",
            PipelineStage::LinearityDone => "linearity-done",
            PipelineStage::Decomposed => "decomposed",
            PipelineStage::StationarityDone => "stationarity-done",
            PipelineStage::ModelSelected => "model-selected",
            PipelineStage::Forecasted => "forecasted",
        };
        f.write_str(name)
    }
}
