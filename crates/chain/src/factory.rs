//! Strategy selection.

use crate::base::{BaseQa, QaStrategy};
use crate::refine::RefineQa;
use crate::stuff::StuffQa;
use docqa_core::{AppError, AppResult};
use std::fmt;
use std::str::FromStr;

/// Available QA strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainType {
    /// One prompt holding as many passages as fit
    Stuff,
    /// One prompt per passage, refining a running answer
    Refine,
}

impl FromStr for ChainType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stuff" => Ok(Self::Stuff),
            "refine" => Ok(Self::Refine),
            other => Err(AppError::Config(format!(
                "Unknown chain type: '{}'. Available types: stuff, refine",
                other
            ))),
        }
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stuff => write!(f, "stuff"),
            Self::Refine => write!(f, "refine"),
        }
    }
}

/// Wrap `base` in the strategy named by `chain_type`.
pub fn build_strategy(chain_type: ChainType, base: BaseQa) -> AppResult<Box<dyn QaStrategy>> {
    tracing::debug!(chain_type = %chain_type, "Building QA strategy");

    match chain_type {
        ChainType::Stuff => Ok(Box::new(StuffQa::new(base)?)),
        ChainType::Refine => Ok(Box::new(RefineQa::new(base)?)),
    }
}
