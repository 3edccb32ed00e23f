//! Core data model for gpso: the [`Domain`], the GP [`Surrogate`], and the
//! ternary [`PartitionTree`] it refines leaves of. The optimization loop
//! itself lives in `gpso-engine`; this crate owns only the data these
//! components share and the invariants that keep them consistent.

pub mod domain;
pub mod exploration;
pub mod gp_config;
pub mod surrogate;
pub mod tree;

pub use domain::Domain;
pub use exploration::ExplorationSchedule;
pub use gp_config::GPConfig;
pub use surrogate::{SampleRecord, Surrogate};
pub use tree::{PartitionTree, box_center, ternary_split_geometry};

pub mod prelude {
    pub use super::domain::Domain;
    pub use super::exploration::ExplorationSchedule;
    pub use super::gp_config::GPConfig;
    pub use super::surrogate::{SampleRecord, Surrogate};
    pub use super::tree::{PartitionTree, box_center, ternary_split_geometry};
}
