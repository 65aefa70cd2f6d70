//! Immutable per-state configuration loaded at startup.
//!
//! One descriptor exists per non-terminal dialog state. Descriptors are
//! loaded once, validated, and shared read-only across all sessions.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tokio::fs;

use super::machine::{CONFIRM_NO, CONFIRM_YES};
use super::validator::normalize;

// ============================================================================
// Errors
// ============================================================================

/// Startup-time failure while loading or validating a state descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to read state descriptor {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse state descriptor {origin}: {source}")]
    Parse {
        origin: String,
        source: serde_json::Error,
    },

    #[error("state descriptor '{name}' has an empty value table")]
    EmptyValueTable { name: String },

    #[error("state descriptor '{name}': value '{value}' has no interpretations")]
    EmptyInterpretations { name: String, value: String },

    #[error("confirm descriptor must resolve only to 'yes' or 'no', found '{value}'")]
    InvalidConfirmValue { value: String },
}

// ============================================================================
// Public Types
// ============================================================================

/// One accepted canonical value and the phrasings that map to it.
#[derive(Debug, Clone, Deserialize)]
pub struct ValueEntry {
    pub value: String,
    pub interpretations: Vec<String>,
}

/// Immutable configuration for one non-terminal dialog state.
#[derive(Debug, Clone, Deserialize)]
pub struct StateDescriptor {
    pub name: String,
    /// Question text; may contain positional `{}` placeholders.
    pub prompt: String,
    /// Re-prompt sent verbatim when user text matches no interpretation.
    pub hint: String,
    /// Ordered value table; scanned first to last during resolution.
    pub values: Vec<ValueEntry>,
    /// Human-readable labels for canonical values, substituted into the
    /// prompt template.
    #[serde(default)]
    pub vars: HashMap<String, String>,
}

/// The full descriptor set, one descriptor per question slot.
#[derive(Debug, Clone)]
pub struct StateSet {
    pub size: StateDescriptor,
    pub payment_type: StateDescriptor,
    pub confirm: StateDescriptor,
}

// ============================================================================
// Implementation
// ============================================================================

impl StateDescriptor {
    /// Parse a descriptor from JSON.
    ///
    /// Interpretations are normalized at load time so lookups match the
    /// projection applied to inbound text. `origin` names the source in
    /// error messages.
    pub fn from_json(origin: &str, raw: &str) -> Result<Self, DescriptorError> {
        let mut descriptor: StateDescriptor =
            serde_json::from_str(raw).map_err(|source| DescriptorError::Parse {
                origin: origin.to_string(),
                source,
            })?;

        if descriptor.values.is_empty() {
            return Err(DescriptorError::EmptyValueTable {
                name: descriptor.name,
            });
        }
        for entry in &mut descriptor.values {
            if entry.interpretations.is_empty() {
                return Err(DescriptorError::EmptyInterpretations {
                    name: descriptor.name,
                    value: entry.value.clone(),
                });
            }
            for interpretation in &mut entry.interpretations {
                *interpretation = normalize(interpretation);
            }
        }

        Ok(descriptor)
    }

    /// Render the prompt template, replacing each positional `{}` with the
    /// label for the next argument. Canonical values without a label in
    /// `vars` fall through unchanged.
    pub fn render_prompt(&self, args: &[&str]) -> String {
        let mut out = String::with_capacity(self.prompt.len());
        let mut rest = self.prompt.as_str();
        let mut args = args.iter();

        while let Some(pos) = rest.find("{}") {
            out.push_str(&rest[..pos]);
            match args.next() {
                Some(arg) => {
                    out.push_str(self.vars.get(*arg).map(String::as_str).unwrap_or(arg));
                }
                None => out.push_str("{}"),
            }
            rest = &rest[pos + 2..];
        }
        out.push_str(rest);
        out
    }
}

impl StateSet {
    /// Assemble a descriptor set, enforcing that the confirm table can only
    /// resolve to the canonical yes/no values the machine dispatches on.
    pub fn new(
        size: StateDescriptor,
        payment_type: StateDescriptor,
        confirm: StateDescriptor,
    ) -> Result<Self, DescriptorError> {
        for entry in &confirm.values {
            if entry.value != CONFIRM_YES && entry.value != CONFIRM_NO {
                return Err(DescriptorError::InvalidConfirmValue {
                    value: entry.value.clone(),
                });
            }
        }
        Ok(Self {
            size,
            payment_type,
            confirm,
        })
    }

    /// Load the descriptor set from `size.json`, `payment_type.json`, and
    /// `confirm.json` in `dir`.
    pub async fn load(dir: &Path) -> Result<Self, DescriptorError> {
        let size = Self::load_one(&dir.join("size.json")).await?;
        let payment_type = Self::load_one(&dir.join("payment_type.json")).await?;
        let confirm = Self::load_one(&dir.join("confirm.json")).await?;
        Self::new(size, payment_type, confirm)
    }

    async fn load_one(path: &Path) -> Result<StateDescriptor, DescriptorError> {
        let raw = fs::read_to_string(path)
            .await
            .map_err(|source| DescriptorError::Io {
                path: path.display().to_string(),
                source,
            })?;
        StateDescriptor::from_json(&path.display().to_string(), &raw)
    }
}

// ============================================================================
// Tests
// ============================================================================
