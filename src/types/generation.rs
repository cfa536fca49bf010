//! Generation settings.

use bon::Builder;
use serde::{Deserialize, Serialize};

/// Settings controlling a single completion request.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, Default, PartialEq)]
pub struct GenerationSettings {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}
