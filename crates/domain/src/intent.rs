use dishpatch_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parameters extracted from free text by the intent resolver.
pub type IntentParameters = Map<String, Value>;

/// Structured interpretation of one admin query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedIntent {
    capability: NonEmptyString,
    parameters: IntentParameters,
    confidence: Option<f32>,
}

impl ResolvedIntent {
    /// Creates an intent, rejecting a blank capability identifier.
    pub fn new(capability: impl Into<String>, parameters: IntentParameters) -> AppResult<Self> {
        Ok(Self {
            capability: NonEmptyString::new(capability.into().trim())?,
            parameters,
            confidence: None,
        })
    }

    /// Attaches the resolver's confidence score.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Returns the capability identifier chosen by the resolver.
    #[must_use]
    pub fn capability(&self) -> &str {
        self.capability.as_str()
    }

    /// Returns the extracted parameters.
    #[must_use]
    pub fn parameters(&self) -> &IntentParameters {
        &self.parameters
    }

    /// Returns the resolver's confidence score, if one was reported.
    #[must_use]
    pub fn confidence(&self) -> Option<f32> {
        self.confidence
    }
}
