use super::{PutRequestBuilder, UploadParams};
use crate::client::part::EntityTag;
use crate::error::{ErrorRepr, Result};
use crate::uri::ObjectUri;

use bytes::Bytes;

/// Request object for uploading the whole object in one `PutObject` call.
///
/// Used when the entire input fits in a single part, possibly zero bytes.
#[derive(Debug, Clone)]
pub struct PutRequest {
    pub(crate) uri: ObjectUri,
    pub(crate) params: UploadParams,
    pub(crate) body: Bytes,
}

impl PutRequest {
    /// Create a new `PutRequest` from the minimum required.
    pub fn new(uri: ObjectUri, params: UploadParams, body: Bytes) -> Self {
        Self { uri, params, body }
    }

    /// Set the required properties on the SDK request builder for the
    /// operation.
    pub fn with_builder(&self, builder: PutRequestBuilder) -> PutRequestBuilder {
        self.params
            .apply_to_put(builder)
            .bucket(&*self.uri.bucket)
            .key(&*self.uri.key)
            .body(self.body.clone().into())
    }

    pub fn uri(&self) -> &ObjectUri {
        &self.uri
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.uri.is_empty() {
            return Err(ErrorRepr::Put {
                uri: self.uri.clone(),
                source: "empty object uri".into(),
            }
            .into());
        }
        Ok(())
    }
}

/// The value for a successful single-part upload.
#[derive(Debug, Clone, Default)]
pub struct PutOutput {
    /// The URL where the object was stored, as observed on the wire.
    pub location: Option<String>,
    /// Set only when the destination bucket is versioned.
    pub version_id: Option<String>,
    /// The entity tag of the stored object.
    pub e_tag: Option<EntityTag>,
}
