//! Value types for the requests the upload client can send.
//!
//! Each store operation gets a request type holding the minimum data the
//! operation needs, plus a `with_builder` method that transfers it onto the
//! corresponding SDK fluent builder.
pub use aws_sdk_s3::operation::abort_multipart_upload::builders::AbortMultipartUploadFluentBuilder as AbortRequestBuilder;
pub use aws_sdk_s3::operation::complete_multipart_upload::builders::CompleteMultipartUploadFluentBuilder as CompleteRequestBuilder;
pub use aws_sdk_s3::operation::create_multipart_upload::builders::CreateMultipartUploadFluentBuilder as CreateRequestBuilder;
pub use aws_sdk_s3::operation::list_parts::builders::ListPartsFluentBuilder as ListPartsRequestBuilder;
pub use aws_sdk_s3::operation::put_object::builders::PutObjectFluentBuilder as PutRequestBuilder;
pub use aws_sdk_s3::operation::upload_part::builders::UploadPartFluentBuilder as UploadPartRequestBuilder;

use aws_sdk_s3::types::{ObjectCannedAcl, ServerSideEncryption, StorageClass};
use std::collections::HashMap;

mod abort;
pub use abort::AbortRequest;

mod complete;
pub use complete::{CompleteRequest, CompletedUpload};

mod create;
pub use create::CreateRequest;

mod list_parts;
pub use list_parts::{ListPartsRequest, ListedPart, PartsPage};

mod put;
pub use put::{PutOutput, PutRequest};

mod upload_part;
pub use upload_part::UploadPartRequest;

/// Per-object metadata forwarded verbatim to the store.
///
/// Everything here is opaque to the uploader; it is copied onto the
/// `PutObject` request on the single-part path and onto the
/// `CreateMultipartUpload` request otherwise. The SSE-C fields are
/// additionally repeated on every `UploadPart` request, which the store
/// requires when the object is encrypted with a customer key.
#[derive(Debug, Clone, Default)]
pub struct UploadParams {
    pub acl: Option<String>,
    pub cache_control: Option<String>,
    pub content_disposition: Option<String>,
    pub content_encoding: Option<String>,
    pub content_type: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
    pub server_side_encryption: Option<String>,
    pub sse_customer_algorithm: Option<String>,
    pub sse_customer_key: Option<String>,
    pub sse_customer_key_md5: Option<String>,
    pub storage_class: Option<String>,
    pub tagging: Option<String>,
}

impl UploadParams {
    /// Set a `Content-Type` for the uploaded object.
    pub fn content_type<T: Into<String>>(mut self, value: T) -> Self {
        self.content_type = Some(value.into());
        self
    }

    /// Attach a user-defined metadata entry.
    pub fn metadata<K: Into<String>, V: Into<String>>(mut self, k: K, v: V) -> Self {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(k.into(), v.into());
        self
    }

    pub(crate) fn sse_customer(&self) -> SseCustomer {
        SseCustomer {
            algorithm: self.sse_customer_algorithm.clone(),
            key: self.sse_customer_key.clone(),
            key_md5: self.sse_customer_key_md5.clone(),
        }
    }

    pub(crate) fn apply_to_put(&self, builder: PutRequestBuilder) -> PutRequestBuilder {
        builder
            .set_acl(self.acl.as_deref().map(ObjectCannedAcl::from))
            .set_cache_control(self.cache_control.clone())
            .set_content_disposition(self.content_disposition.clone())
            .set_content_encoding(self.content_encoding.clone())
            .set_content_type(self.content_type.clone())
            .set_metadata(self.metadata.clone())
            .set_server_side_encryption(
                self.server_side_encryption
                    .as_deref()
                    .map(ServerSideEncryption::from),
            )
            .set_sse_customer_algorithm(self.sse_customer_algorithm.clone())
            .set_sse_customer_key(self.sse_customer_key.clone())
            .set_sse_customer_key_md5(self.sse_customer_key_md5.clone())
            .set_storage_class(self.storage_class.as_deref().map(StorageClass::from))
            .set_tagging(self.tagging.clone())
    }

    pub(crate) fn apply_to_create(&self, builder: CreateRequestBuilder) -> CreateRequestBuilder {
        builder
            .set_acl(self.acl.as_deref().map(ObjectCannedAcl::from))
            .set_cache_control(self.cache_control.clone())
            .set_content_disposition(self.content_disposition.clone())
            .set_content_encoding(self.content_encoding.clone())
            .set_content_type(self.content_type.clone())
            .set_metadata(self.metadata.clone())
            .set_server_side_encryption(
                self.server_side_encryption
                    .as_deref()
                    .map(ServerSideEncryption::from),
            )
            .set_sse_customer_algorithm(self.sse_customer_algorithm.clone())
            .set_sse_customer_key(self.sse_customer_key.clone())
            .set_sse_customer_key_md5(self.sse_customer_key_md5.clone())
            .set_storage_class(self.storage_class.as_deref().map(StorageClass::from))
            .set_tagging(self.tagging.clone())
    }
}

/// The SSE-C triple repeated on each part upload request.
#[derive(Debug, Clone, Default)]
pub struct SseCustomer {
    pub algorithm: Option<String>,
    pub key: Option<String>,
    pub key_md5: Option<String>,
}
