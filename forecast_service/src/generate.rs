//! Batch generation pass over every category group

use crate::cache::ForecastCache;
use crate::error::Result;
use crate::source::{normalize_frame, CategoryGroup, HistorySource};
use forecast_core::{ForecastAssembler, ForecastModel, SeriesFrame};
use rand::Rng;
use std::path::PathBuf;
use tracing::{info, warn};

/// Outcome of regenerating one group's cache
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub group: CategoryGroup,
    /// Categories written to the cache
    pub categories: usize,
    pub path: PathBuf,
}

/// Forecast every category of one group and replace its cache file.
///
/// A source that fails or delivers nothing produces an empty cache file.
/// Only cache write failures are returned as errors.
pub fn generate_group<S, R, M>(
    source: &S,
    cache: &ForecastCache,
    assembler: &mut ForecastAssembler<R, M>,
    group: CategoryGroup,
    horizon: usize,
) -> Result<GroupSummary>
where
    S: HistorySource + ?Sized,
    R: Rng,
    M: ForecastModel,
{
    let frame = match source
        .fetch(group)
        .and_then(|rows| normalize_frame(group, &rows))
    {
        Ok(frame) => frame,
        Err(err) => {
            warn!(%group, error = %err, "history unavailable, writing empty cache");
            SeriesFrame::default()
        }
    };

    if frame.is_empty() {
        info!(%group, "no history to forecast");
    }

    let forecasts = assembler.assemble_frame(&frame, horizon);
    let path = cache.store(group, &forecasts)?;

    info!(%group, categories = forecasts.len(), path = %path.display(), "group forecasts saved");
    Ok(GroupSummary {
        group,
        categories: forecasts.len(),
        path,
    })
}

/// Regenerate all four groups in order
pub fn generate_all<S, R, M>(
    source: &S,
    cache: &ForecastCache,
    assembler: &mut ForecastAssembler<R, M>,
    horizon: usize,
) -> Result<Vec<GroupSummary>>
where
    S: HistorySource + ?Sized,
    R: Rng,
    M: ForecastModel,
{
    let mut summaries = Vec::with_capacity(CategoryGroup::ALL.len());
    for group in CategoryGroup::ALL {
        summaries.push(generate_group(source, cache, assembler, group, horizon)?);
    }

    info!(
        groups = summaries.len(),
        categories = summaries.iter().map(|s| s.categories).sum::<usize>(),
        "forecast generation complete"
    );
    Ok(summaries)
}
