use super::CompleteRequestBuilder;
use crate::client::part::{CompletedParts, EntityTag};
use crate::client::{UploadData, UploadId};
use crate::error::{ErrorRepr, Result};
use crate::uri::ObjectUri;

use aws_sdk_s3::types::CompletedMultipartUpload;

/// Request object for completing a multipart upload.
///
/// The completed parts must already be sorted ascending by part number; the
/// store rejects an out-of-order manifest.
#[derive(Debug, Clone)]
pub struct CompleteRequest {
    pub(crate) id: UploadId,
    pub(crate) uri: ObjectUri,
    pub(crate) completed_parts: CompletedParts,
}

impl CompleteRequest {
    /// Create a new `CompleteRequest` from the minimum required.
    pub fn new(data: &UploadData, completed_parts: CompletedParts) -> Self {
        Self {
            id: data.get_id(),
            uri: data.get_uri(),
            completed_parts,
        }
    }

    /// Set the required properties on the SDK request builder for the
    /// operation.
    pub fn with_builder(&self, builder: CompleteRequestBuilder) -> CompleteRequestBuilder {
        let parts = CompletedMultipartUpload::from(&self.completed_parts);

        builder
            .upload_id(&*self.id)
            .bucket(&*self.uri.bucket)
            .key(&*self.uri.key)
            .multipart_upload(parts)
    }

    pub fn id(&self) -> &UploadId {
        &self.id
    }

    pub fn uri(&self) -> &ObjectUri {
        &self.uri
    }

    pub fn completed_parts(&self) -> &CompletedParts {
        &self.completed_parts
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.id.is_empty() || self.uri.is_empty() {
            return Err(ErrorRepr::Complete {
                id: self.id.clone(),
                uri: self.uri.clone(),
                source: "empty upload id and/or uri".into(),
            }
            .into());
        }
        Ok(())
    }
}

/// The value for a successfully completed multipart upload.
#[derive(Debug, Clone, Default)]
pub struct CompletedUpload {
    /// The URL of the assembled object, when the store reported one.
    pub location: Option<String>,
    /// Set only when the destination bucket is versioned.
    pub version_id: Option<String>,
    /// The entity tag of the assembled object.
    pub e_tag: Option<EntityTag>,
}
