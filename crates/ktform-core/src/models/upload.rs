use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// The three kinds of binary artifact a submission can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Attachment,
    Document,
    Signature,
}

impl Display for ArtifactKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ArtifactKind::Attachment => write!(f, "attachment"),
            ArtifactKind::Document => write!(f, "document"),
            ArtifactKind::Signature => write!(f, "signature"),
        }
    }
}

/// Durable location of a persisted artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteReference {
    pub url: String,
    pub key: String,
}

/// Descriptive metadata that survives whether or not the artifact was persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactMetadata {
    pub kind: ArtifactKind,
    pub file_name: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

/// Outcome of persisting one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub metadata: ArtifactMetadata,
    pub reference: Option<RemoteReference>,
}

impl UploadResult {
    pub fn persisted(metadata: ArtifactMetadata, reference: RemoteReference) -> Self {
        Self {
            metadata,
            reference: Some(reference),
        }
    }

    pub fn unpersisted(metadata: ArtifactMetadata) -> Self {
        Self {
            metadata,
            reference: None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.reference.is_some()
    }
}

/// How binary artifacts travel to the webhook. Exactly one mode per submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Remote,
    Inline,
}

/// Upload outcomes for every artifact of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedArtifacts {
    pub attachments: Vec<UploadResult>,
    pub document: UploadResult,
    pub signature: Option<UploadResult>,
}

impl PersistedArtifacts {
    pub fn iter(&self) -> impl Iterator<Item = &UploadResult> {
        self.attachments
            .iter()
            .chain(std::iter::once(&self.document))
            .chain(self.signature.iter())
    }

    /// `Remote` only when every artifact has a remote reference.
    pub fn transport_mode(&self) -> TransportMode {
        if self.iter().all(UploadResult::is_persisted) {
            TransportMode::Remote
        } else {
            TransportMode::Inline
        }
    }

    pub fn failed_count(&self) -> usize {
        self.iter().filter(|r| !r.is_persisted()).count()
    }
}
