//! Background jobs: daily aggregation and the periodic scheduler

pub mod daily_summary;
pub mod scheduler;

pub use daily_summary::{aggregate_day, update_daily_summaries};
pub use scheduler::{spawn_scheduler, SchedulerSettings};
