//! Catalog contents and their file formats
//!
//! A catalog file holds every kind of reference data in one document.
//! TOML, YAML and JSON are accepted; the format is picked from the file
//! extension.

use crate::error::CatalogError;
use reqflow_model::{
    AccessLevel, ChecklistTemplate, Department, RequestTypeDefinition, System, User,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// All reference data, as stored in a catalog file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub departments: Vec<Department>,
    #[serde(default)]
    pub access_levels: Vec<AccessLevel>,
    #[serde(default)]
    pub systems: Vec<System>,
    #[serde(default)]
    pub checklist_templates: Vec<ChecklistTemplate>,
    #[serde(default)]
    pub request_types: Vec<RequestTypeDefinition>,
}

impl CatalogData {
    /// Parse from TOML
    ///
    /// # Errors
    /// Returns error if the text is not a valid catalog document
    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        toml::from_str(text).map_err(|e| CatalogError::Parse {
            format: "toml",
            message: e.to_string(),
        })
    }

    /// Parse from YAML
    ///
    /// # Errors
    /// Returns error if the text is not a valid catalog document
    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        serde_yaml::from_str(text).map_err(|e| CatalogError::Parse {
            format: "yaml",
            message: e.to_string(),
        })
    }

    /// Parse from JSON
    ///
    /// # Errors
    /// Returns error if the text is not a valid catalog document
    pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(text).map_err(|e| CatalogError::Parse {
            format: "json",
            message: e.to_string(),
        })
    }

    /// Read and parse a catalog file without validating it
    ///
    /// # Errors
    /// Returns error on I/O failure, unknown extension or parse failure
    pub fn read_file(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "toml" => Self::from_toml_str(&text),
            "yaml" | "yml" => Self::from_yaml_str(&text),
            "json" => Self::from_json_str(&text),
            other => Err(CatalogError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Serialize to pretty TOML
    ///
    /// # Errors
    /// Returns error if the data cannot be represented in TOML
    pub fn to_toml_string(&self) -> Result<String, CatalogError> {
        toml::to_string_pretty(self).map_err(|e| CatalogError::Parse {
            format: "toml",
            message: e.to_string(),
        })
    }
}
