//! The recognition server's reply schema and its mapping to a verdict.

use serde::Deserialize;

/// Status string the server assigns to vehicles on the allow list.
pub const AUTHORIZED_STATUS: &str = "Authorized";

/// Raw JSON body returned by the upload endpoint.
///
/// The server either reports an application error or a recognition
/// result; all fields are optional at the wire level.
#[derive(Debug, Deserialize)]
pub struct UploadReply {
    /// Application-level error, reported verbatim to the user
    #[serde(default)]
    pub error: Option<String>,
    /// Recognized vehicle identifier
    #[serde(default)]
    pub number: Option<String>,
    /// Authorization label for the recognized vehicle
    #[serde(default)]
    pub status: Option<String>,
}

/// Outcome of one capture attempt, as the user sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The server rejected the capture with an explicit error message
    Rejected { message: String },
    /// The server recognized a vehicle and assigned it a status
    Recognized { number: String, status: String },
}

impl Verdict {
    /// Whether the recognized vehicle is on the allow list.
    pub fn is_authorized(&self) -> bool {
        matches!(self, Verdict::Recognized { status, .. } if status == AUTHORIZED_STATUS)
    }
}

impl UploadReply {
    /// Map the wire reply to a verdict.
    ///
    /// A non-empty `error` wins over any other fields. Otherwise both
    /// `number` and `status` must be present; a reply with neither is
    /// malformed and yields `None`.
    pub fn into_verdict(self) -> Option<Verdict> {
        if let Some(message) = self.error.filter(|e| !e.is_empty()) {
            return Some(Verdict::Rejected { message });
        }
        match (self.number, self.status) {
            (Some(number), Some(status)) => Some(Verdict::Recognized { number, status }),
            _ => None,
        }
    }
}
