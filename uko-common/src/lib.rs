//! # Uko Common Library
//!
//! Shared code for the Uko Single Predictor client including:
//! - Form, catalog and result models
//! - Field validation and date normalization
//! - Configuration loading and API base URL resolution

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

pub use error::{Error, Result};
pub use models::{
    FieldErrorMap, FormField, FormState, Gender, PredictionRequest, PredictionResult, TribeOption,
};
