//! The invalidation engine: downstream discovery, output removal and
//! completion statistics.

pub mod concurrent;
pub mod invalidate;
pub mod request;
pub mod stats;
pub mod traversal;

pub use concurrent::{invalidate_downstream_concurrent, ConcurrentOptions};
pub use invalidate::{invalidate, invalidate_downstream, InvalidationReport, Invalidator};
pub use request::{BoundaryFamilies, InvalidationRequest};
pub use stats::{compute_stats, FamilyStats, StatsTable};
pub use traversal::{enumerate_downstream, Downstream};
