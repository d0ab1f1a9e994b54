//! Trait for SARIMA order selection

use crate::error::Result;
use crate::model::{FittedModel, ObservationSeries, Order, SeasonalOrder, SelectionOutcome};

/// Searches the SARIMA order space and fits candidate models.
pub trait ModelSelector: Send + Sync {
    /// Search orders with the non-seasonal differencing fixed at
    /// `differencing_order`, returning the best model and the shortlist.
    fn select(
        &self,
        series: &ObservationSeries,
        differencing_order: usize,
    ) -> Result<SelectionOutcome>;

    /// Fit one user-specified order without searching.
    fn fit_order(
        &self,
        series: &ObservationSeries,
        order: Order,
        seasonal_order: SeasonalOrder,
    ) -> Result<FittedModel>;
}
