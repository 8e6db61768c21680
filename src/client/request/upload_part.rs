use super::{SseCustomer, UploadPartRequestBuilder};
use crate::client::part::PartNumber;
use crate::client::{UploadData, UploadId};
use crate::error::{ErrorRepr, Result};
use crate::uri::ObjectUri;

use bytes::Bytes;

/// Request object for uploading a new part.
#[derive(Debug, Clone)]
pub struct UploadPartRequest {
    pub(crate) id: UploadId,
    pub(crate) uri: ObjectUri,
    pub(crate) body: Bytes,
    pub(crate) part_number: PartNumber,
    pub(crate) sse: SseCustomer,
}

impl UploadPartRequest {
    /// Create a new `UploadPartRequest` from the minimum required.
    pub fn new(data: &UploadData, body: Bytes, part_number: PartNumber, sse: SseCustomer) -> Self {
        Self {
            id: data.get_id(),
            uri: data.get_uri(),
            body,
            part_number,
            sse,
        }
    }

    /// Set the required properties on the SDK request builder for the
    /// operation.
    pub fn with_builder(&self, builder: UploadPartRequestBuilder) -> UploadPartRequestBuilder {
        builder
            .upload_id(&*self.id)
            .bucket(&*self.uri.bucket)
            .key(&*self.uri.key)
            .part_number(*self.part_number)
            .set_sse_customer_algorithm(self.sse.algorithm.clone())
            .set_sse_customer_key(self.sse.key.clone())
            .set_sse_customer_key_md5(self.sse.key_md5.clone())
            .body(self.body.clone().into())
    }

    pub fn id(&self) -> &UploadId {
        &self.id
    }

    pub fn uri(&self) -> &ObjectUri {
        &self.uri
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn part_number(&self) -> PartNumber {
        self.part_number
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.id.is_empty() || self.uri.is_empty() {
            return Err(ErrorRepr::UploadPart {
                id: self.id.clone(),
                uri: self.uri.clone(),
                part: self.part_number,
                source: "empty upload id and/or uri".into(),
            }
            .into());
        }
        Ok(())
    }
}
