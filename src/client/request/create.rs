use super::{CreateRequestBuilder, UploadParams};
use crate::error::{ErrorRepr, Result};
use crate::uri::ObjectUri;

/// Request object for starting a new multipart upload.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub(crate) uri: ObjectUri,
    pub(crate) params: UploadParams,
}

impl CreateRequest {
    /// Create a new `CreateRequest` from the minimum required.
    pub fn new(uri: ObjectUri, params: UploadParams) -> Self {
        Self { uri, params }
    }

    /// Set the required properties on the SDK request builder for the
    /// operation.
    pub fn with_builder(&self, builder: CreateRequestBuilder) -> CreateRequestBuilder {
        self.params
            .apply_to_create(builder)
            .bucket(&*self.uri.bucket)
            .key(&*self.uri.key)
    }

    pub fn uri(&self) -> &ObjectUri {
        &self.uri
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.uri.is_empty() {
            return Err(ErrorRepr::Create {
                uri: self.uri.clone(),
                source: "empty object uri".into(),
            }
            .into());
        }
        Ok(())
    }
}
