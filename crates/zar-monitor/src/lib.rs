//! Process-wide metrics.
//!
//! A single [`SystemMonitor`] lives for the life of the process: the edge
//! middleware feeds it request counters and response times, the periodic
//! sampler records memory and CPU every five minutes, and the admin
//! metrics endpoints read consistent snapshots.

pub mod monitor;
pub mod rolling;
pub mod sampler;

pub use monitor::{MonitorSnapshot, SystemMonitor};
pub use rolling::{RollingMetrics, RollingStats};
pub use sampler::spawn_sampler;
