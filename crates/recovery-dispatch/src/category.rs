use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of operation kinds the dispatcher knows how to recover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationCategory {
    /// Creating an identity or credential, such as a participant pseudonym.
    IdentityCreation,
    /// Recording a participant's consent decisions.
    ConsentCollection,
    /// Loading survey definitions or storing survey answers.
    SurveyIo,
    /// Extracting structured data from free text via an external model.
    DataExtraction,
    /// Generating content (images, avatars) via an external service.
    ContentGeneration,
    /// Processing one turn of a conversation with an external model.
    ConversationTurn,
    /// Generic database access.
    Database,
}

impl OperationCategory {
    pub const ALL: [OperationCategory; 7] = [
        OperationCategory::IdentityCreation,
        OperationCategory::ConsentCollection,
        OperationCategory::SurveyIo,
        OperationCategory::DataExtraction,
        OperationCategory::ContentGeneration,
        OperationCategory::ConversationTurn,
        OperationCategory::Database,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationCategory::IdentityCreation => "identity_creation",
            OperationCategory::ConsentCollection => "consent_collection",
            OperationCategory::SurveyIo => "survey_io",
            OperationCategory::DataExtraction => "data_extraction",
            OperationCategory::ContentGeneration => "content_generation",
            OperationCategory::ConversationTurn => "conversation_turn",
            OperationCategory::Database => "database",
        }
    }

    /// Categories whose failures are storage failures, handled by the shared
    /// database policy.
    pub fn is_storage_backed(&self) -> bool {
        matches!(
            self,
            OperationCategory::IdentityCreation
                | OperationCategory::ConsentCollection
                | OperationCategory::SurveyIo
                | OperationCategory::Database
        )
    }

    /// Breaker name used for dependency-backed categories when the context
    /// does not name one.
    pub fn default_dependency(&self) -> Option<&'static str> {
        match self {
            OperationCategory::DataExtraction => Some("data_extraction"),
            OperationCategory::ContentGeneration => Some("content_generation"),
            OperationCategory::ConversationTurn => Some("conversation"),
            _ => None,
        }
    }

    pub(crate) fn format_suggestions(&self) -> Vec<String> {
        let lines: &[&str] = match self {
            OperationCategory::IdentityCreation => &[
                "Check that the identifier uses only letters, digits, '-' or '_'",
                "Make sure all required fields are filled in",
            ],
            OperationCategory::ConsentCollection => &[
                "Review each consent item and confirm your choice",
                "All required consents must be answered before continuing",
            ],
            OperationCategory::SurveyIo => &[
                "Review the highlighted answers",
                "Complete all required questions before submitting",
            ],
            OperationCategory::DataExtraction => &[
                "Describe your preferences in a few complete sentences",
            ],
            OperationCategory::ContentGeneration => &[
                "Simplify the description and try again",
            ],
            OperationCategory::ConversationTurn => &[
                "Rephrase or shorten your message and send it again",
            ],
            OperationCategory::Database => &["Check the submitted values and try again"],
        };
        lines.iter().map(|line| line.to_string()).collect()
    }

    pub(crate) fn conflict_suggestion(&self) -> &'static str {
        match self {
            OperationCategory::IdentityCreation => "This identifier is already taken; choose a different one",
            OperationCategory::ConsentCollection => "Consent was already recorded; reload the page to see the current state",
            OperationCategory::SurveyIo => "These answers were already submitted; reload the survey to continue",
            _ => "Change the conflicting value and try again",
        }
    }

    /// What a fallback substitutes for this category.
    pub(crate) fn fallback_description(&self) -> &'static str {
        match self {
            OperationCategory::ContentGeneration => "using a default image instead of a generated one",
            OperationCategory::ConversationTurn => "using a standard response instead of a generated one",
            OperationCategory::DataExtraction => "using default profile data instead of extracted data",
            OperationCategory::SurveyIo => "using the default survey definition",
            OperationCategory::ConsentCollection => "using the default consent form",
            _ => "using default settings",
        }
    }
}

impl fmt::Display for OperationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
