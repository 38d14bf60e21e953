//! Time-series rollup and attribution pipeline.
//!
//! Data flows strictly forward:
//!
//! records -> [`periods`] (windows) -> [`aggregator`] (long format)
//! -> [`fact_table`] (wide rows) -> [`deltas`], [`decomposition`],
//! [`contribution`] (enrich the rows) -> frozen [`FactTable`].

pub mod aggregator;
pub mod contribution;
pub mod decomposition;
pub mod deltas;
pub mod fact_table;
pub mod periods;
pub mod primitives;

pub use aggregator::{aggregate_periods, aggregate_window, PeriodAggregate};
pub use contribution::Contribution;
pub use decomposition::PriceVolumeDecomposition;
pub use deltas::{CausalFactor, Delta, PeriodChange};
pub use fact_table::{FactKey, FactRow, FactTable, FlatFactRow};
pub use periods::{Comparison, Horizon, Period, PeriodKind, PeriodWindows};
pub use primitives::safe_divide;
