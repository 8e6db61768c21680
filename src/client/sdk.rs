use super::part::{CompletedPart, EntityTag, PartNumber};
use super::request::*;
use super::{LocationRecorder, SendRequest, UploadData, UploadId};
use crate::error::{ErrorRepr, Result};

use aws_config::SdkConfig;
use aws_sdk_s3 as s3;

/// Add additional properties to the request objects being sent.
///
/// This is the hook for per-request client options: anything the request
/// value types do not carry (checksum settings, requester-pays headers,
/// request payer, ...) can be set here on the SDK builder right before the
/// request is sent.
pub trait RequestCustomizer: Send + Sync {
    /// Set additional properties on [`PutRequestBuilder`] beyond what
    /// [`PutRequest`] provides.
    fn customize_put(&self, builder: PutRequestBuilder) -> PutRequestBuilder {
        builder
    }

    /// Set additional properties on [`CreateRequestBuilder`] beyond what
    /// [`CreateRequest`] provides.
    fn customize_create(&self, builder: CreateRequestBuilder) -> CreateRequestBuilder {
        builder
    }

    /// Set additional properties on [`UploadPartRequestBuilder`] beyond what
    /// [`UploadPartRequest`] provides.
    fn customize_upload_part(&self, builder: UploadPartRequestBuilder) -> UploadPartRequestBuilder {
        builder
    }

    /// Set additional properties on [`CompleteRequestBuilder`] beyond what
    /// [`CompleteRequest`] provides.
    fn customize_complete(&self, builder: CompleteRequestBuilder) -> CompleteRequestBuilder {
        builder
    }

    /// Set additional properties on [`AbortRequestBuilder`] beyond what
    /// [`AbortRequest`] provides.
    fn customize_abort(&self, builder: AbortRequestBuilder) -> AbortRequestBuilder {
        builder
    }

    /// Set additional properties on [`ListPartsRequestBuilder`] beyond what
    /// [`ListPartsRequest`] provides.
    fn customize_list_parts(&self, builder: ListPartsRequestBuilder) -> ListPartsRequestBuilder {
        builder
    }
}

/// Default implementation of [`RequestCustomizer`] that doesn't modify the
/// request object at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRequestCustomizer;
impl RequestCustomizer for NullRequestCustomizer {}

/// S3 [`Client`] type from the AWS SDK.
///
/// [`Client`]: aws_sdk_s3::Client
#[derive(Debug, Clone)]
pub struct SdkClient<B = NullRequestCustomizer>(s3::Client, B);

impl SdkClient {
    /// Create a new `SdkClient` from an existing SDK `Client`.
    ///
    /// [`Client`]: aws_sdk_s3::Client
    pub fn new(client: s3::Client) -> Self {
        SdkClient(client, NullRequestCustomizer)
    }

    /// Create a new `SdkClient` from an [`SdkConfig`].
    ///
    /// [`SdkConfig`]: aws_config::SdkConfig
    pub fn from_sdk_config(config: SdkConfig) -> Self {
        let client = s3::Client::new(&config);
        Self::new(client)
    }

    /// Set a request customizer for this S3 client.
    pub fn request_customizer<B: RequestCustomizer>(self, customizer: B) -> SdkClient<B> {
        SdkClient(self.0, customizer)
    }
}

impl<B: RequestCustomizer> SendRequest for SdkClient<B> {
    async fn send_put_object_request(&self, req: PutRequest) -> Result<PutOutput> {
        req.validate()?;
        let recorder = LocationRecorder::new();
        let builder = self.1.customize_put(req.with_builder(self.0.put_object()));

        let uri = req.uri();
        let out = builder
            .customize()
            .interceptor(recorder.clone())
            .send()
            .await
            .map_err(ErrorRepr::from_put_err(uri))?;

        Ok(PutOutput {
            location: recorder.take(),
            version_id: out.version_id().map(str::to_string),
            e_tag: out.e_tag().map(EntityTag::from),
        })
    }

    async fn send_create_upload_request(&self, req: CreateRequest) -> Result<UploadData> {
        req.validate()?;
        let recorder = LocationRecorder::new();
        let builder = self
            .1
            .customize_create(req.with_builder(self.0.create_multipart_upload()));

        let uri = req.uri();
        let out = builder
            .customize()
            .interceptor(recorder.clone())
            .send()
            .await
            .map_err(ErrorRepr::from_create_err(uri))?;

        let id = UploadId::from_response(out.upload_id(), "CreateMultipartUploadOutput")?;
        Ok(UploadData::new(id, uri.clone()).with_location(recorder.take()))
    }

    async fn send_part_upload_request(&self, req: UploadPartRequest) -> Result<CompletedPart> {
        req.validate()?;
        let builder = self
            .1
            .customize_upload_part(req.with_builder(self.0.upload_part()));

        let part = req.part_number();
        let out = builder
            .send()
            .await
            .map_err(ErrorRepr::from_upload_err(req.id(), req.uri(), part))?;

        let etag = EntityTag::from_response(out.e_tag(), "UploadPartOutput")?;
        Ok(CompletedPart::new(etag, part))
    }

    async fn send_complete_upload_request(&self, req: CompleteRequest) -> Result<CompletedUpload> {
        req.validate()?;
        let builder = self
            .1
            .customize_complete(req.with_builder(self.0.complete_multipart_upload()));

        let out = builder
            .send()
            .await
            .map_err(ErrorRepr::from_complete_err(req.id(), req.uri()))?;

        Ok(CompletedUpload {
            location: out.location().map(str::to_string),
            version_id: out.version_id().map(str::to_string),
            e_tag: out.e_tag().map(EntityTag::from),
        })
    }

    async fn send_abort_upload_request(&self, req: AbortRequest) -> Result<()> {
        req.validate()?;
        let builder = self
            .1
            .customize_abort(req.with_builder(self.0.abort_multipart_upload()));

        builder
            .send()
            .await
            .map_err(ErrorRepr::from_abort_err(req.id()))?;
        Ok(())
    }

    async fn send_list_parts_request(&self, req: ListPartsRequest) -> Result<PartsPage> {
        req.validate()?;
        let recorder = LocationRecorder::new();
        let builder = self
            .1
            .customize_list_parts(req.with_builder(self.0.list_parts()));

        let out = builder
            .customize()
            .interceptor(recorder.clone())
            .send()
            .await
            .map_err(ErrorRepr::from_list_err(req.id(), req.uri()))?;

        let mut parts = Vec::with_capacity(out.parts().len());
        for part in out.parts() {
            let part_number = part
                .part_number()
                .ok_or(ErrorRepr::Missing("ListPartsOutput", "part_number"))?;
            let e_tag = EntityTag::from_response(part.e_tag(), "ListPartsOutput")?;
            parts.push(ListedPart {
                part_number: PartNumber::new(part_number),
                e_tag,
            });
        }

        Ok(PartsPage {
            parts,
            next_part_number_marker: out.next_part_number_marker().map(str::to_string),
            is_truncated: out.is_truncated().unwrap_or(false),
            location: recorder.take(),
        })
    }
}
