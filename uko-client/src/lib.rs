//! uko-client library interface
//!
//! Scoring service client, form controller and result reveal used by the
//! `uko-predictor` binary; exposed for integration testing.

pub mod animator;
pub mod api;
pub mod catalog;
pub mod controller;
pub mod error;
pub mod share;

pub use crate::animator::{AnimationState, ResultAnimator, ShareOutcome};
pub use crate::api::{HttpBackend, PredictorBackend};
pub use crate::catalog::{TribeCatalog, TribeCatalogLoader};
pub use crate::controller::{SubmissionController, SubmissionStatus};
pub use crate::error::{CatalogError, ClipboardError, SubmissionError, SubmitError};
