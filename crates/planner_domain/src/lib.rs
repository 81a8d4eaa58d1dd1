pub mod calendar;
pub mod clock;
pub mod completion;
pub mod config;
pub mod countdown;
pub mod error;
pub mod heatmap;
pub mod records;
pub mod service;
pub mod store;

pub use crate::config::PlannerConfig;
pub use crate::error::{PlannerError, PlannerResult};
pub use crate::service::{DashboardService, DashboardServiceBuilder, DashboardSnapshot};
pub use crate::store::{MemoryStore, PlannerSeed, PlannerStore};
