use super::ListPartsRequestBuilder;
use crate::client::part::{EntityTag, PartNumber};
use crate::client::{UploadData, UploadId};
use crate::error::{ErrorRepr, Result};
use crate::uri::ObjectUri;

/// Request object for listing one page of the parts committed to an
/// existing multipart upload.
///
/// The client returns one page per call; the coordinator drives pagination
/// by feeding `next_part_number_marker` back in.
#[derive(Debug, Clone)]
pub struct ListPartsRequest {
    pub(crate) id: UploadId,
    pub(crate) uri: ObjectUri,
    pub(crate) part_number_marker: Option<String>,
}

impl ListPartsRequest {
    /// Create a new `ListPartsRequest` from the minimum required.
    pub fn new(data: &UploadData, part_number_marker: Option<String>) -> Self {
        Self {
            id: data.get_id(),
            uri: data.get_uri(),
            part_number_marker,
        }
    }

    /// Set the required properties on the SDK request builder for the
    /// operation.
    pub fn with_builder(&self, builder: ListPartsRequestBuilder) -> ListPartsRequestBuilder {
        builder
            .bucket(&*self.uri.bucket)
            .key(&*self.uri.key)
            .upload_id(&*self.id)
            .set_part_number_marker(self.part_number_marker.clone())
    }

    pub fn id(&self) -> &UploadId {
        &self.id
    }

    pub fn uri(&self) -> &ObjectUri {
        &self.uri
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.id.is_empty() || self.uri.is_empty() {
            return Err(ErrorRepr::ListParts {
                id: self.id.clone(),
                uri: self.uri.clone(),
                source: "empty upload id and/or uri".into(),
            }
            .into());
        }
        Ok(())
    }
}

/// One part as reported by the store.
///
/// The entity tag arrives wrapped in ASCII double quotes; see
/// [`EntityTag::unquoted`].
#[derive(Debug, Clone)]
pub struct ListedPart {
    pub part_number: PartNumber,
    pub e_tag: EntityTag,
}

/// One page of a ListParts enumeration.
#[derive(Debug, Clone, Default)]
pub struct PartsPage {
    pub parts: Vec<ListedPart>,
    pub next_part_number_marker: Option<String>,
    pub is_truncated: bool,
    /// The object URL observed when the page was fetched, when the client
    /// was able to capture one. On a resumed upload this is the only
    /// source for `UploadOutput.location` besides the complete response.
    pub location: Option<String>,
}
