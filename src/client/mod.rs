use self::part::CompletedPart;
use self::request::*;
use crate::error::{ErrorRepr, Result};
use crate::uri::ObjectUri;

use futures::future::BoxFuture;
use std::borrow::Cow;
use std::fmt::{self, Formatter};
use std::ops::Deref;
use std::sync::Arc;

pub mod part;
pub mod request;

mod location;
pub(crate) use location::LocationRecorder;

mod memory;
pub use memory::MemoryClient;

mod sdk;
pub use sdk::{NullRequestCustomizer, RequestCustomizer, SdkClient};

/// `SendRequest` represents the atomic operations in an upload.
///
/// An implementation is a client of the object store: the AWS SDK in
/// production ([`SdkClient`]), or an in-memory stand-in in tests
/// ([`MemoryClient`]). The returned futures must be `Send` because part
/// upload requests are issued from worker tasks.
pub trait SendRequest: Send + Sync {
    /// Send a request to store the whole object in one call.
    fn send_put_object_request(
        &self,
        req: PutRequest,
    ) -> impl Future<Output = Result<PutOutput>> + Send;

    /// Send a request to create a new multipart upload, returning an
    /// [`UploadData`] having the upload ID assignment.
    fn send_create_upload_request(
        &self,
        req: CreateRequest,
    ) -> impl Future<Output = Result<UploadData>> + Send;

    /// Send a request to upload a part to a multipart upload, returning the
    /// [`CompletedPart`] containing entity tag and part number, which are
    /// required in the subsequent complete upload request.
    fn send_part_upload_request(
        &self,
        req: UploadPartRequest,
    ) -> impl Future<Output = Result<CompletedPart>> + Send;

    /// Send a request to complete a multipart upload, returning a
    /// [`CompletedUpload`] with the entity tag and location of the assembled
    /// object.
    fn send_complete_upload_request(
        &self,
        req: CompleteRequest,
    ) -> impl Future<Output = Result<CompletedUpload>> + Send;

    /// Send a request to abort a multipart upload, returning an empty
    /// response if successful.
    fn send_abort_upload_request(
        &self,
        req: AbortRequest,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Send a request for one page of the parts committed to an existing
    /// multipart upload.
    fn send_list_parts_request(
        &self,
        req: ListPartsRequest,
    ) -> impl Future<Output = Result<PartsPage>> + Send;
}

impl<D, T> SendRequest for T
where
    D: SendRequest,
    T: Deref<Target = D> + Send + Sync,
{
    async fn send_put_object_request(&self, req: PutRequest) -> Result<PutOutput> {
        self.deref().send_put_object_request(req).await
    }

    async fn send_create_upload_request(&self, req: CreateRequest) -> Result<UploadData> {
        self.deref().send_create_upload_request(req).await
    }

    async fn send_part_upload_request(&self, req: UploadPartRequest) -> Result<CompletedPart> {
        self.deref().send_part_upload_request(req).await
    }

    async fn send_complete_upload_request(&self, req: CompleteRequest) -> Result<CompletedUpload> {
        self.deref().send_complete_upload_request(req).await
    }

    async fn send_abort_upload_request(&self, req: AbortRequest) -> Result<()> {
        self.deref().send_abort_upload_request(req).await
    }

    async fn send_list_parts_request(&self, req: ListPartsRequest) -> Result<PartsPage> {
        self.deref().send_list_parts_request(req).await
    }
}

/// A client of the upload API.
///
/// This can be built from any type that implements `SendRequest`, such as
/// the [`SdkClient`]. Cloning is cheap and all clones talk to the same
/// underlying client, so one value can be shared by every worker task of an
/// upload.
#[derive(Clone)]
pub struct UploadClient {
    pub(crate) inner: Arc<dyn BoxedSendRequest + Send + Sync>,
}

impl UploadClient {
    /// Create a new `UploadClient`.
    pub fn new<C>(client: C) -> Self
    where
        C: SendRequest + 'static,
    {
        let inner = SendRequestInner::new(client);
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl SendRequest for UploadClient {
    async fn send_put_object_request(&self, req: PutRequest) -> Result<PutOutput> {
        self.inner.send_put_object(req).await
    }

    async fn send_create_upload_request(&self, req: CreateRequest) -> Result<UploadData> {
        self.inner.send_create_upload(req).await
    }

    async fn send_part_upload_request(&self, req: UploadPartRequest) -> Result<CompletedPart> {
        self.inner.send_upload_part(req).await
    }

    async fn send_complete_upload_request(&self, req: CompleteRequest) -> Result<CompletedUpload> {
        self.inner.send_complete_upload(req).await
    }

    async fn send_abort_upload_request(&self, req: AbortRequest) -> Result<()> {
        self.inner.send_abort_upload(req).await
    }

    async fn send_list_parts_request(&self, req: ListPartsRequest) -> Result<PartsPage> {
        self.inner.send_list_parts(req).await
    }
}

impl fmt::Debug for UploadClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadClient")
            .field("inner", &"SendRequest")
            .finish()
    }
}

/// ID assigned by AWS for this upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct UploadId(Cow<'static, str>);

impl UploadId {
    pub(crate) fn new<T: Into<Cow<'static, str>>>(id: T) -> Self {
        Self(id.into())
    }

    pub(crate) fn from_response(value: Option<&str>, op: &'static str) -> Result<Self, ErrorRepr> {
        value
            .map(Self::from)
            .ok_or(ErrorRepr::Missing(op, "upload_id"))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for UploadId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for UploadId {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl From<String> for UploadId {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

/// Data identifying a multipart upload session.
///
/// The `UploadId` assigned by AWS and the `ObjectUri` that the upload was
/// created with are required properties of any of the upload client's
/// session operations. The location is the object URL observed when the
/// session was created, when the client was able to capture one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadData {
    /// The ID for the upload assigned by AWS.
    pub id: UploadId,
    /// The S3 URI of the object being uploaded.
    pub uri: ObjectUri,
    /// The URL of the object, as observed on the wire.
    pub location: Option<String>,
}

impl UploadData {
    /// Create a new value from an upload ID and object URI.
    pub fn new<T, U>(id: T, uri: U) -> Self
    where
        T: Into<UploadId>,
        U: Into<ObjectUri>,
    {
        Self {
            id: id.into(),
            uri: uri.into(),
            location: None,
        }
    }

    /// Attach the observed object URL.
    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    /// Get an owned upload ID.
    pub fn get_id(&self) -> UploadId {
        self.id.clone()
    }

    /// Get an owned object URI.
    pub fn get_uri(&self) -> ObjectUri {
        self.uri.clone()
    }
}

/// Object-safe `SendRequest`.
pub(crate) trait BoxedSendRequest {
    fn send_put_object(&self, req: PutRequest) -> BoxFuture<'_, Result<PutOutput>>;

    fn send_create_upload(&self, req: CreateRequest) -> BoxFuture<'_, Result<UploadData>>;

    fn send_upload_part(&self, req: UploadPartRequest) -> BoxFuture<'_, Result<CompletedPart>>;

    fn send_complete_upload(&self, req: CompleteRequest) -> BoxFuture<'_, Result<CompletedUpload>>;

    fn send_abort_upload(&self, req: AbortRequest) -> BoxFuture<'_, Result<()>>;

    fn send_list_parts(&self, req: ListPartsRequest) -> BoxFuture<'_, Result<PartsPage>>;
}

/// Implements `BoxedSendRequest` for any `T: SendRequest` so that we can
/// construct `UploadClient`.
struct SendRequestInner<T>(T);

impl<T: SendRequest> SendRequestInner<T> {
    pub(super) fn new(inner: T) -> Self {
        Self(inner)
    }
}

impl<T: SendRequest> BoxedSendRequest for SendRequestInner<T> {
    fn send_put_object(&self, req: PutRequest) -> BoxFuture<'_, Result<PutOutput>> {
        Box::pin(self.0.send_put_object_request(req))
    }

    fn send_create_upload(&self, req: CreateRequest) -> BoxFuture<'_, Result<UploadData>> {
        Box::pin(self.0.send_create_upload_request(req))
    }

    fn send_upload_part(&self, req: UploadPartRequest) -> BoxFuture<'_, Result<CompletedPart>> {
        Box::pin(self.0.send_part_upload_request(req))
    }

    fn send_complete_upload(&self, req: CompleteRequest) -> BoxFuture<'_, Result<CompletedUpload>> {
        Box::pin(self.0.send_complete_upload_request(req))
    }

    fn send_abort_upload(&self, req: AbortRequest) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.0.send_abort_upload_request(req))
    }

    fn send_list_parts(&self, req: ListPartsRequest) -> BoxFuture<'_, Result<PartsPage>> {
        Box::pin(self.0.send_list_parts_request(req))
    }
}
