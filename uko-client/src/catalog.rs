//! Tribe catalog
//!
//! Loaded once per form instance. While loading, the tribe selector is
//! disabled; a failed load leaves the list empty and records a message on a
//! channel separate from submission errors. There is no automatic retry.

use crate::api::PredictorBackend;
use crate::error::CatalogError;
use tracing::{info, warn};
use uko_common::TribeOption;

pub const LOADING_PLACEHOLDER: &str = "Loading tribes...";
pub const SELECT_PLACEHOLDER: &str = "Select your tribe";

/// Tribe selector state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TribeCatalog {
    pub loading: bool,
    pub options: Vec<TribeOption>,
    pub load_error: Option<String>,
}

impl Default for TribeCatalog {
    fn default() -> Self {
        Self {
            loading: true,
            options: Vec::new(),
            load_error: None,
        }
    }
}

impl TribeCatalog {
    pub fn placeholder(&self) -> &'static str {
        if self.loading {
            LOADING_PLACEHOLDER
        } else {
            SELECT_PLACEHOLDER
        }
    }

    /// Selector is usable only once loading finished
    pub fn selectable(&self) -> bool {
        !self.loading
    }

    /// Look up a selectable option by value (exact, then case-insensitive)
    pub fn find(&self, value: &str) -> Option<&TribeOption> {
        self.options
            .iter()
            .find(|o| o.value == value)
            .or_else(|| self.options.iter().find(|o| o.value.eq_ignore_ascii_case(value)))
    }

    /// Apply the outcome of a load; loading ends either way
    pub fn finish(&mut self, outcome: Result<Vec<TribeOption>, CatalogError>) {
        self.loading = false;
        match outcome {
            Ok(options) => {
                self.options = options;
                self.load_error = None;
            }
            Err(err) => {
                self.options.clear();
                self.load_error = Some(err.to_string());
            }
        }
    }
}

/// Fetches the catalog from the scoring service
pub struct TribeCatalogLoader;

impl TribeCatalogLoader {
    /// Issue one catalog request and map names to options
    pub async fn load(backend: &dyn PredictorBackend) -> Result<Vec<TribeOption>, CatalogError> {
        match backend.fetch_tribes().await {
            Ok(names) => {
                info!(count = names.len(), "Tribe catalog loaded");
                Ok(names.into_iter().map(TribeOption::from_name).collect())
            }
            Err(err) => {
                warn!(error = %err, detail = ?err.detail(), "Tribe catalog load failed");
                Err(CatalogError(err))
            }
        }
    }
}
