//! The upload facade: configuration, the single-part path, and the entry
//! points [`Uploader::upload`] and [`Uploader::resume_upload`].
use crate::client::part::EntityTag;
use crate::client::request::{PutRequest, UploadParams};
use crate::client::{SendRequest, UploadClient, UploadId};
use crate::error::{Error, ErrorRepr, Result};
use crate::uri::ObjectUri;
use crate::{DEFAULT_UPLOAD_CONCURRENCY, DEFAULT_UPLOAD_PART_SIZE, MAX_UPLOAD_PARTS,
    MIN_UPLOAD_PART_SIZE};

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

mod multipart;
use multipart::MultiUploader;

mod pool;
use pool::PartPool;

mod reader;
pub use reader::{BufferProvider, RandomAccessBody, UploadBody};
use reader::{PartData, PartReader};

/// Configuration for an upload.
///
/// Zero values for `part_size`, `concurrency` and `max_upload_parts` mean
/// "use the default". The configuration on an [`Uploader`] applies to every
/// call; per-call overrides go through [`Uploader::upload_with`].
#[derive(Clone)]
pub struct UploadConfig {
    /// The buffer size in bytes to use when cutting the input into parts.
    /// The minimum allowed part size is 5 MiB.
    pub part_size: usize,
    /// The number of worker tasks to spin up per call to upload. The worker
    /// pool is not shared between calls.
    pub concurrency: usize,
    /// The max number of parts this upload may use. Known-length inputs get
    /// their part size raised so they fit; unknown-length inputs that
    /// produce more parts fail. Capped by the store's limit of 10000.
    pub max_upload_parts: i32,
    /// When true, a failed multipart upload is not aborted: the parts
    /// uploaded so far stay in the store for manual recovery. Note that
    /// stored parts of an incomplete upload count towards space usage and
    /// keep costing until cleaned up.
    pub leave_parts_on_error: bool,
    /// Cancels the upload: every store call and every buffer wait observes
    /// this token.
    pub cancel: CancellationToken,
    /// Customizes how windows of a random access body are materialized.
    pub buffer_provider: Option<Arc<dyn BufferProvider>>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_UPLOAD_PART_SIZE,
            concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            max_upload_parts: MAX_UPLOAD_PARTS,
            leave_parts_on_error: false,
            cancel: CancellationToken::new(),
            buffer_provider: None,
        }
    }
}

impl UploadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_part_size(mut self, n: usize) -> Self {
        self.part_size = n;
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n;
        self
    }

    pub fn with_max_upload_parts(mut self, n: i32) -> Self {
        self.max_upload_parts = n;
        self
    }

    pub fn with_leave_parts_on_error(mut self, leave: bool) -> Self {
        self.leave_parts_on_error = leave;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_buffer_provider<P: BufferProvider + 'static>(mut self, provider: P) -> Self {
        self.buffer_provider = Some(Arc::new(provider));
        self
    }
}

impl Debug for UploadConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadConfig")
            .field("part_size", &self.part_size)
            .field("concurrency", &self.concurrency)
            .field("max_upload_parts", &self.max_upload_parts)
            .field("leave_parts_on_error", &self.leave_parts_on_error)
            .field("buffer_provider", &self.buffer_provider.is_some())
            .finish()
    }
}

/// What to upload and where to put it.
#[derive(Debug)]
pub struct UploadInput {
    /// The destination of the object.
    pub uri: ObjectUri,
    /// The byte stream to upload.
    pub body: UploadBody,
    /// Per-object metadata forwarded verbatim to the store.
    pub params: UploadParams,
}

impl UploadInput {
    /// Create a new `UploadInput` from a destination and a body.
    pub fn new<U, B>(uri: U, body: B) -> Self
    where
        U: Into<ObjectUri>,
        B: Into<UploadBody>,
    {
        Self {
            uri: uri.into(),
            body: body.into(),
            params: UploadParams::default(),
        }
    }

    /// Attach per-object metadata.
    pub fn with_params(mut self, params: UploadParams) -> Self {
        self.params = params;
        self
    }
}

/// The response from an upload.
#[derive(Debug, Clone, Default)]
pub struct UploadOutput {
    /// The URL where the object was uploaded to.
    pub location: Option<String>,
    /// The version of the object that was uploaded. Only populated when the
    /// destination bucket is versioned.
    pub version_id: Option<String>,
    /// The entity tag of the stored object.
    pub e_tag: Option<EntityTag>,
    /// The ID of the multipart session, when one was used. Empty on the
    /// single-part path. On failure the same ID is available from
    /// [`Error::upload_id`].
    pub upload_id: Option<UploadId>,
}

/// Uploads objects to S3, intelligently cutting large inputs into parts and
/// sending them in parallel across worker tasks.
///
/// It is safe to share an `Uploader` and call [`upload`](Self::upload)
/// concurrently; each call gets its own buffer pool and worker pool.
#[derive(Debug, Clone)]
pub struct Uploader {
    client: UploadClient,
    config: UploadConfig,
}

impl Uploader {
    /// Create a new `Uploader` with the default configuration.
    pub fn new<C>(client: C) -> Self
    where
        C: SendRequest + 'static,
    {
        Self {
            client: UploadClient::new(client),
            config: UploadConfig::default(),
        }
    }

    /// Replace the configuration used by every call on this value.
    pub fn with_config(mut self, config: UploadConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Upload an object, deciding between one `PutObject` call and a
    /// multipart upload based on the first part's worth of data.
    pub async fn upload(&self, input: UploadInput) -> Result<UploadOutput> {
        self.upload_with(input, |_| {}).await
    }

    /// Like [`upload`](Self::upload), with per-call configuration overrides
    /// applied to a copy of this uploader's configuration.
    pub async fn upload_with<F>(&self, input: UploadInput, opts: F) -> Result<UploadOutput>
    where
        F: FnOnce(&mut UploadConfig),
    {
        let mut config = self.config.clone();
        opts(&mut config);
        UploadTask {
            client: self.client.clone(),
            config,
            input,
            existing_upload_id: None,
        }
        .run()
        .await
    }

    /// Resume an existing multipart upload.
    ///
    /// The parts already committed to the session have their MD5 checksums
    /// computed locally and compared with their stored entity tags; a
    /// mismatch fails the upload. This catches input or part size changes
    /// since the original attempt.
    pub async fn resume_upload<I>(&self, input: UploadInput, upload_id: I) -> Result<UploadOutput>
    where
        I: Into<UploadId>,
    {
        self.resume_upload_with(input, upload_id, |_| {}).await
    }

    /// Like [`resume_upload`](Self::resume_upload), with per-call
    /// configuration overrides.
    pub async fn resume_upload_with<I, F>(
        &self,
        input: UploadInput,
        upload_id: I,
        opts: F,
    ) -> Result<UploadOutput>
    where
        I: Into<UploadId>,
        F: FnOnce(&mut UploadConfig),
    {
        let mut config = self.config.clone();
        opts(&mut config);
        UploadTask {
            client: self.client.clone(),
            config,
            input,
            existing_upload_id: Some(upload_id.into()),
        }
        .run()
        .await
    }
}

/// One upload invocation: applies defaults, sizes the pool, and decides
/// between the single-part and multipart paths.
struct UploadTask {
    client: UploadClient,
    config: UploadConfig,
    input: UploadInput,
    existing_upload_id: Option<UploadId>,
}

impl UploadTask {
    async fn run(mut self) -> Result<UploadOutput> {
        self.init();
        if self.config.part_size < MIN_UPLOAD_PART_SIZE {
            return Err(ErrorRepr::PartSizeTooSmall(MIN_UPLOAD_PART_SIZE).into());
        }

        let pool = Arc::new(PartPool::new(
            self.config.part_size,
            self.config.cancel.clone(),
        ));
        pool.modify_capacity(self.config.concurrency as isize + 1);

        let result = self.drive(Arc::clone(&pool)).await;
        pool.close();
        result
    }

    /// Apply defaults for zero values and, when the total size is known,
    /// raise the part size so the part count stays within bounds.
    fn init(&mut self) {
        if self.config.concurrency == 0 {
            self.config.concurrency = DEFAULT_UPLOAD_CONCURRENCY;
        }
        if self.config.part_size == 0 {
            self.config.part_size = DEFAULT_UPLOAD_PART_SIZE;
        }
        if self.config.max_upload_parts == 0 {
            self.config.max_upload_parts = MAX_UPLOAD_PARTS;
        }
        if let Some(total) = self.input.body.total_size() {
            self.config.part_size = adjusted_part_size(
                total,
                self.config.part_size,
                self.config.max_upload_parts,
            );
        }
    }

    async fn drive(self, pool: Arc<PartPool>) -> Result<UploadOutput> {
        let UploadTask {
            client,
            config,
            input,
            existing_upload_id,
        } = self;
        let UploadInput { uri, body, params } = input;

        debug!(
            %uri,
            total_size = ?body.total_size(),
            part_size = config.part_size,
            "starting upload"
        );
        let mut reader = PartReader::new(body, config.part_size, pool);

        // One read decides whether we have more than one part.
        let first = match reader.next().await {
            Ok(part) => part,
            Err(e) => {
                return Err(ErrorRepr::ReadUploadData {
                    source: Box::new(e),
                }
                .into());
            }
        };
        if first.eof {
            return single_part(&client, uri, params, first, &config).await;
        }

        let mu = MultiUploader {
            client,
            uri,
            params,
            concurrency: config.concurrency,
            max_upload_parts: config.max_upload_parts,
            leave_parts_on_error: config.leave_parts_on_error,
            cancel: config.cancel.clone(),
            buffer_provider: config.buffer_provider.clone(),
            existing_upload_id,
            reader,
        };
        mu.upload(first).await
    }
}

/// Upload the entire input with one `PutObject` request. Errors are
/// returned verbatim; no multipart session exists to attach them to.
async fn single_part(
    client: &UploadClient,
    uri: ObjectUri,
    params: UploadParams,
    first: PartData,
    config: &UploadConfig,
) -> Result<UploadOutput> {
    let body = first
        .body
        .bytes(config.buffer_provider.as_deref())
        .await
        .map_err(Error::from_dyn)?;

    debug!(%uri, size = body.len(), "uploading in a single request");
    let req = PutRequest::new(uri, params, body);
    let out = with_cancel(&config.cancel, client.send_put_object_request(req)).await?;

    Ok(UploadOutput {
        location: out.location,
        version_id: out.version_id,
        e_tag: out.e_tag,
        upload_id: None,
    })
}

/// Raise the part size so a known-length input fits in `max_parts` parts.
/// The extra byte accounts for integer division truncation.
fn adjusted_part_size(total: u64, part_size: usize, max_parts: i32) -> usize {
    if total / part_size as u64 >= max_parts as u64 {
        (total / max_parts as u64 + 1) as usize
    } else {
        part_size
    }
}

/// Race `fut` against the upload's cancellation token.
pub(crate) async fn with_cancel<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ErrorRepr::Canceled.into()),
        res = fut => res,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_size_is_raised_to_fit_the_part_count_bound() {
        let fifty_gib: u64 = 50 * 1024 * 1024 * 1024;
        let adjusted = adjusted_part_size(fifty_gib, DEFAULT_UPLOAD_PART_SIZE, MAX_UPLOAD_PARTS);

        assert!(adjusted > DEFAULT_UPLOAD_PART_SIZE);
        assert!(fifty_gib.div_ceil(adjusted as u64) <= MAX_UPLOAD_PARTS as u64);
    }

    #[test]
    fn part_size_is_unchanged_when_the_input_fits() {
        let total: u64 = 100 * 1024 * 1024;
        assert_eq!(
            adjusted_part_size(total, DEFAULT_UPLOAD_PART_SIZE, MAX_UPLOAD_PARTS),
            DEFAULT_UPLOAD_PART_SIZE
        );
    }

    #[test]
    fn adjustment_accounts_for_division_truncation() {
        // An odd byte count over the limit must still fit.
        let total = (MAX_UPLOAD_PARTS as u64) * (MIN_UPLOAD_PART_SIZE as u64) + 1;
        let adjusted = adjusted_part_size(total, MIN_UPLOAD_PART_SIZE, MAX_UPLOAD_PARTS);
        assert!(total.div_ceil(adjusted as u64) <= MAX_UPLOAD_PARTS as u64);
    }
}
