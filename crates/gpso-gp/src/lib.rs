//! A small exact Gaussian-Process regression backend.
//!
//! This crate plays the role of the GP kernel/likelihood/inference library
//! that gpso's [`Surrogate`](../gpso_core/struct.Surrogate.html) treats as
//! an external, black-box dependency: it exposes `gp_predict`/`gp_train`
//! and the tagged mean/covariance/likelihood variants named in the design
//! notes, and nothing about the optimization engine itself.

pub mod hyper;
pub mod kernel;
pub mod predict;
pub mod train;

pub use hyper::{Hyperparameters, LIK_BND};
pub use kernel::{ConstMean, CovFn, GaussLik};
pub use predict::gp_predict;
pub use train::gp_train;
