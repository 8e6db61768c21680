use aws_upload_manager::client::part::{CompletedPart, EntityTag};
use aws_upload_manager::client::request::{
    AbortRequest, CompleteRequest, CompletedUpload, CreateRequest, ListPartsRequest, PartsPage,
    PutOutput, PutRequest, UploadPartRequest,
};
use aws_upload_manager::client::{SendRequest, UploadData};
use aws_upload_manager::error::{Error, Result};

use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A store client that records every call it sees, for asserting on the
/// exact requests an upload produced.
///
/// Part uploads can be made to fail by part number, and ListParts responses
/// are replayed from a preset page queue.
#[derive(Debug, Default)]
pub struct RecordingClient {
    pub calls: Mutex<Calls>,
    list_pages: Mutex<VecDeque<PartsPage>>,
    fail_part: Option<i32>,
    upload_id: String,
}

#[derive(Debug, Default)]
pub struct Calls {
    /// Bodies of PutObject requests.
    pub puts: Vec<Bytes>,
    /// Number of CreateMultipartUpload requests.
    pub creates: usize,
    /// `(part_number, body)` of every UploadPart request.
    pub parts: Vec<(i32, Bytes)>,
    /// The manifest of every CompleteMultipartUpload request.
    pub completes: Vec<Vec<(i32, String)>>,
    /// Number of AbortMultipartUpload requests.
    pub aborts: usize,
    /// Number of ListParts requests.
    pub list_requests: usize,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self {
            upload_id: "test-session".to_string(),
            ..Self::default()
        }
    }

    /// Fail the UploadPart request for this part number.
    pub fn with_fail_part(mut self, part_number: i32) -> Self {
        self.fail_part = Some(part_number);
        self
    }

    /// Serve these pages, in order, to ListParts requests.
    pub fn with_list_pages(self, pages: Vec<PartsPage>) -> Self {
        *self.list_pages.lock().unwrap() = pages.into();
        self
    }

    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    /// The recorded part bodies concatenated in part number order.
    pub fn assembled_parts(&self) -> Vec<u8> {
        let calls = self.calls.lock().unwrap();
        let mut parts = calls.parts.clone();
        parts.sort_by_key(|(num, _)| *num);
        parts
            .into_iter()
            .flat_map(|(_, body)| body.to_vec())
            .collect()
    }
}

fn location(req_uri: &aws_upload_manager::uri::ObjectUri) -> String {
    format!(
        "https://{}.s3.amazonaws.com/{}",
        &*req_uri.bucket, &*req_uri.key
    )
}

impl SendRequest for RecordingClient {
    async fn send_put_object_request(&self, req: PutRequest) -> Result<PutOutput> {
        let loc = location(req.uri());
        self.calls.lock().unwrap().puts.push(req.body().clone());

        Ok(PutOutput {
            location: Some(loc),
            version_id: None,
            e_tag: Some(EntityTag::from(super::md5_hex(req.body()))),
        })
    }

    async fn send_create_upload_request(&self, req: CreateRequest) -> Result<UploadData> {
        let loc = location(req.uri());
        self.calls.lock().unwrap().creates += 1;

        Ok(UploadData::new(self.upload_id.as_str(), req.uri().clone())
            .with_location(Some(loc)))
    }

    async fn send_part_upload_request(&self, req: UploadPartRequest) -> Result<CompletedPart> {
        let num = *req.part_number();
        if self.fail_part == Some(num) {
            return Err(Error::from_dyn(std::io::Error::other(format!(
                "injected failure for part {num}"
            ))));
        }

        self.calls
            .lock()
            .unwrap()
            .parts
            .push((num, req.body().clone()));

        Ok(CompletedPart::new(
            EntityTag::from(format!("etag-{num}")),
            req.part_number(),
        ))
    }

    async fn send_complete_upload_request(&self, req: CompleteRequest) -> Result<CompletedUpload> {
        let manifest = req
            .completed_parts()
            .iter()
            .map(|part| (*part.part_number, part.etag.to_string()))
            .collect();
        self.calls.lock().unwrap().completes.push(manifest);

        // The real complete response often omits the location; leaving it
        // out here exercises the recorded-location fallback.
        Ok(CompletedUpload {
            location: None,
            version_id: None,
            e_tag: Some(EntityTag::from("final-etag")),
        })
    }

    async fn send_abort_upload_request(&self, _req: AbortRequest) -> Result<()> {
        self.calls.lock().unwrap().aborts += 1;
        Ok(())
    }

    async fn send_list_parts_request(&self, req: ListPartsRequest) -> Result<PartsPage> {
        self.calls.lock().unwrap().list_requests += 1;
        let mut page = self.list_pages.lock().unwrap().pop_front().unwrap_or_default();
        // The URL observed on the wire, as the recorder would capture it.
        page.location = Some(location(req.uri()));
        Ok(page)
    }
}
