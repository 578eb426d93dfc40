//! Contract with the external naming oracle: what a directory is asked, what
//! comes back, and how a bad answer is reported.

pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use openai::OpenAiOracle;

/// Which oracle contract a run uses. Fixes the principal-item policy too:
/// `DirectoryName` picks the largest file locally, `FileListing` lets the
/// oracle name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingMode {
    #[default]
    DirectoryName,
    FileListing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NamingRequest {
    #[serde(rename_all = "camelCase")]
    Directory { directory_name: String },
    Listing { items: Vec<ItemDescriptor> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDescriptor {
    pub file_name: String,
    pub file_size: u64,
}

/// A successful answer from the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingDecision {
    /// Canonical title, also the destination directory name.
    pub title: String,
    /// Present when the oracle picked the principal file itself.
    pub principal: Option<PrincipalRename>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalRename {
    pub current_name: String,
    /// New file name, extension included.
    pub new_name: String,
}

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("unparseable response: {0}")]
    Parse(String),

    #[error("response failed schema validation: {0}")]
    Schema(String),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("malformed field `{field}`: {reason}")]
    Malformed { field: &'static str, reason: String },
}

#[async_trait]
pub trait NamingOracle: Send + Sync {
    async fn name_directory(&self, request: &NamingRequest) -> Result<NamingDecision, OracleError>;
}

impl NamingDecision {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            principal: None,
        }
    }

    pub fn with_principal(
        title: impl Into<String>,
        current_name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            principal: Some(PrincipalRename {
                current_name: current_name.into(),
                new_name: new_name.into(),
            }),
        }
    }

    /// Reject anything that is not a single, plain path component. A decision
    /// that passes can be joined onto the output directory safely.
    pub fn validated(mut self) -> Result<Self, OracleError> {
        self.title = self.title.trim().to_string();
        check_component("newTitle", &self.title)?;

        if let Some(principal) = &self.principal {
            check_component("oldMainTitleName", &principal.current_name)?;
            check_component("newMainTitleName", &principal.new_name)?;
        }

        Ok(self)
    }
}

fn check_component(field: &'static str, value: &str) -> Result<(), OracleError> {
    if value.trim().is_empty() {
        return Err(OracleError::MissingField(field));
    }
    if value == "." || value == ".." {
        return Err(OracleError::Malformed {
            field,
            reason: format!("'{}' is not a usable name", value),
        });
    }
    if value.contains(['/', '\\', '\0']) {
        return Err(OracleError::Malformed {
            field,
            reason: format!("'{}' contains a path separator", value),
        });
    }
    Ok(())
}
