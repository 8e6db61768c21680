use super::reader::{BufferProvider, ChunkBody, PartData, PartReader};
use super::{UploadOutput, with_cancel};
use crate::MAX_UPLOAD_PARTS;
use crate::client::part::{CompletedPart, CompletedParts, EntityTag, PartNumber};
use crate::client::request::{
    AbortRequest, CompleteRequest, CreateRequest, ListPartsRequest, SseCustomer, UploadParams,
    UploadPartRequest,
};
use crate::client::{SendRequest as _, UploadClient, UploadData, UploadId};
use crate::error::{Error, ErrorRepr, Result};
use crate::uri::ObjectUri;

use async_channel::Receiver;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Drives one multipart upload session: creates or adopts the session,
/// feeds chunks to the worker tasks, then completes or aborts.
pub(crate) struct MultiUploader {
    pub(crate) client: UploadClient,
    pub(crate) uri: ObjectUri,
    pub(crate) params: UploadParams,
    pub(crate) concurrency: usize,
    pub(crate) max_upload_parts: i32,
    pub(crate) leave_parts_on_error: bool,
    pub(crate) cancel: CancellationToken,
    pub(crate) buffer_provider: Option<Arc<dyn BufferProvider>>,
    pub(crate) existing_upload_id: Option<UploadId>,
    pub(crate) reader: PartReader,
}

/// One chunk of data on its way to a worker.
struct Chunk {
    body: ChunkBody,
    num: PartNumber,
}

/// State shared between the producer and the worker tasks.
///
/// `etag_by_part_number` is populated before any worker starts and is
/// read-only from then on. Everything mutable lives in `progress`, under
/// one mutex.
struct UploadState {
    client: UploadClient,
    data: UploadData,
    sse: SseCustomer,
    etag_by_part_number: HashMap<i32, EntityTag>,
    buffer_provider: Option<Arc<dyn BufferProvider>>,
    cancel: CancellationToken,
    progress: Mutex<Progress>,
}

#[derive(Default)]
struct Progress {
    parts: CompletedParts,
    err: Option<Error>,
}

impl UploadState {
    /// The first fatal error wins; later errors are discarded.
    fn set_err(&self, err: Error) {
        let mut progress = self.progress.lock().unwrap();
        if progress.err.is_none() {
            progress.err = Some(err);
        }
    }

    fn has_err(&self) -> bool {
        self.progress.lock().unwrap().err.is_some()
    }

    fn complete_part(&self, part: CompletedPart) {
        self.progress.lock().unwrap().parts.push(part);
    }
}

impl MultiUploader {
    /// Perform the multipart upload, starting from the first chunk that
    /// made the single-part/multipart decision.
    pub(crate) async fn upload(mut self, first: PartData) -> Result<UploadOutput> {
        let data = match self.existing_upload_id.take() {
            Some(id) => {
                let mut data = UploadData::new(id, self.uri.clone());
                let etags = self.adopt_parts(&mut data).await?;
                return self.run(data, etags, first).await;
            }
            None => {
                let req = CreateRequest::new(self.uri.clone(), self.params.clone());
                with_cancel(&self.cancel, self.client.send_create_upload_request(req)).await?
            }
        };
        debug!(id = %data.id, uri = %data.uri, "created multipart upload");

        self.run(data, HashMap::new(), first).await
    }

    /// Enumerate the parts already committed to an adopted session,
    /// recording their entity tags for local verification.
    ///
    /// An adopted session never sees a create response, so the object URL
    /// observed on these requests is also what populates the session's
    /// location.
    async fn adopt_parts(&self, data: &mut UploadData) -> Result<HashMap<i32, EntityTag>> {
        let mut etags = HashMap::new();
        let mut marker: Option<String> = None;
        'pages: loop {
            let req = ListPartsRequest::new(data, marker.take());
            let page =
                with_cancel(&self.cancel, self.client.send_list_parts_request(req)).await?;
            if page.location.is_some() {
                data.location = page.location.clone();
            }

            for part in page.parts {
                // The store's pagination has been observed to wrap around and
                // serve the same parts forever. A repeated part number means
                // the enumeration is complete.
                if etags.contains_key(&*part.part_number) {
                    break 'pages;
                }
                etags.insert(*part.part_number, part.e_tag.unquoted());
            }
            if !page.is_truncated {
                break;
            }
            marker = page.next_part_number_marker;
        }

        debug!(id = %data.id, parts = etags.len(), "adopted existing multipart upload");
        Ok(etags)
    }

    async fn run(
        mut self,
        data: UploadData,
        etag_by_part_number: HashMap<i32, EntityTag>,
        first: PartData,
    ) -> Result<UploadOutput> {
        let state = Arc::new(UploadState {
            client: self.client.clone(),
            data,
            sse: self.params.sse_customer(),
            etag_by_part_number,
            buffer_provider: self.buffer_provider.clone(),
            cancel: self.cancel.clone(),
            progress: Mutex::new(Progress::default()),
        });

        let (tx, rx) = async_channel::bounded::<Chunk>(self.concurrency);
        let workers: Vec<_> = (0..self.concurrency)
            .map(|_| tokio::spawn(run_worker(rx.clone(), Arc::clone(&state))))
            .collect();
        drop(rx);

        let mut num: i32 = 1;
        let mut eof = first.eof;
        let _ = tx
            .send(Chunk {
                body: first.body,
                num: PartNumber::new(num),
            })
            .await;

        // Read and queue the rest of the parts.
        while !eof {
            if state.has_err() {
                break;
            }
            if self.cancel.is_cancelled() {
                state.set_err(ErrorRepr::Canceled.into());
                break;
            }

            let part = match self.reader.next().await {
                Ok(part) => part,
                Err(e) => {
                    state.set_err(
                        ErrorRepr::ReadPartData {
                            source: Box::new(e),
                        }
                        .into(),
                    );
                    break;
                }
            };
            if part.len == 0 {
                // The input was already drained; no empty last part.
                break;
            }

            let next = num + 1;
            if next > self.max_upload_parts || next > MAX_UPLOAD_PARTS {
                let err = if next > self.max_upload_parts {
                    ErrorRepr::ConfiguredPartLimit(self.max_upload_parts)
                } else {
                    ErrorRepr::AbsolutePartLimit(MAX_UPLOAD_PARTS)
                };
                state.set_err(err.into());
                break;
            }
            num = next;
            eof = part.eof;

            if tx
                .send(Chunk {
                    body: part.body,
                    num: PartNumber::new(num),
                })
                .await
                .is_err()
            {
                break;
            }
        }

        // Close the queue, wait for the workers to drain it, then settle.
        drop(tx);
        for worker in workers {
            let _ = worker.await;
        }

        self.finish(state).await
    }

    /// Complete the session, or abort it when a fatal error was recorded.
    async fn finish(self, state: Arc<UploadState>) -> Result<UploadOutput> {
        let first_err = state.progress.lock().unwrap().err.take();

        let cause = match first_err {
            None => {
                let mut parts = {
                    let mut progress = state.progress.lock().unwrap();
                    std::mem::take(&mut progress.parts)
                };
                parts.sort_ascending();
                debug!(id = %state.data.id, parts = parts.count(), "completing multipart upload");

                let req = CompleteRequest::new(&state.data, parts);
                match with_cancel(
                    &state.cancel,
                    state.client.send_complete_upload_request(req),
                )
                .await
                {
                    Ok(done) => {
                        return Ok(UploadOutput {
                            location: done.location.or_else(|| state.data.location.clone()),
                            version_id: done.version_id,
                            e_tag: done.e_tag,
                            upload_id: Some(state.data.id.clone()),
                        });
                    }
                    Err(e) => e,
                }
            }
            Some(e) => e,
        };

        if !self.leave_parts_on_error {
            let req = AbortRequest::new(&state.data);
            if let Err(abort_err) =
                with_cancel(&state.cancel, state.client.send_abort_upload_request(req)).await
            {
                // The original cause is what the caller gets; the abort
                // failure is only worth a warning.
                warn!(id = %state.data.id, error = %abort_err, "failed to abort multipart upload");
            }
        }

        Err(Error::multi_upload(state.data.id.clone(), cause))
    }
}

/// Worker loop: pull chunks off the queue and upload or verify them.
///
/// A chunk's buffer is released when the chunk is dropped at the end of the
/// iteration, on every path, including the skip-on-error path.
async fn run_worker(rx: Receiver<Chunk>, state: Arc<UploadState>) {
    while let Ok(chunk) = rx.recv().await {
        if let Some(etag) = state.etag_by_part_number.get(&*chunk.num) {
            let etag = etag.clone();
            if let Err(e) = check_part(&state, &chunk, &etag).await {
                state.set_err(e);
            }
        } else if !state.has_err() {
            if let Err(e) = send_part(&state, &chunk).await {
                state.set_err(e);
            }
        }
    }
}

/// Verify a chunk against the entity tag its part already has remotely.
async fn check_part(state: &UploadState, chunk: &Chunk, etag: &EntityTag) -> Result<()> {
    let data = chunk
        .body
        .bytes(state.buffer_provider.as_deref())
        .await
        .map_err(Error::from_dyn)?;

    let sum = format!("{:x}", md5::compute(&data));
    if sum != **etag {
        return Err(ErrorRepr::ChecksumMismatch(*chunk.num).into());
    }

    trace!(part = %chunk.num, "verified part against stored entity tag");
    state.complete_part(CompletedPart::new(etag.clone(), chunk.num));
    Ok(())
}

/// Upload a chunk as a new part.
async fn send_part(state: &UploadState, chunk: &Chunk) -> Result<()> {
    let data = chunk
        .body
        .bytes(state.buffer_provider.as_deref())
        .await
        .map_err(Error::from_dyn)?;
    let size = data.len();

    let req = UploadPartRequest::new(&state.data, data, chunk.num, state.sse.clone());
    let completed =
        with_cancel(&state.cancel, state.client.send_part_upload_request(req)).await?;

    trace!(part = %chunk.num, size, "uploaded part");
    state.complete_part(completed);
    Ok(())
}
