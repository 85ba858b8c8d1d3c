//! Backend catalog and health models

use serde::{Deserialize, Serialize};

/// One entry of the supported-services catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub subtopics: Vec<String>,
}

/// Backend health report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: Option<String>,
    /// Whether the backend has its language model configured.
    #[serde(default)]
    pub gemini_available: bool,
}
