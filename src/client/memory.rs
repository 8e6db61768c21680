use super::part::{CompletedPart, EntityTag, PartNumber};
use super::request::*;
use super::{SendRequest, UploadData};
use crate::error::{ErrorRepr, Result};
use crate::uri::ObjectUri;

use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// For testing, a client that keeps objects and multipart sessions in
/// memory.
///
/// Parts are stored under their part number and assembled in manifest order
/// on complete, so a finished upload can be read back with
/// [`object`](MemoryClient::object) and compared byte for byte against the
/// input. Entity tags are the MD5 hex digest of the part body, which is
/// what the resume path expects to verify against.
#[derive(Debug, Default)]
pub struct MemoryClient {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    objects: HashMap<String, Bytes>,
    sessions: HashMap<String, Session>,
    created: u64,
}

#[derive(Debug)]
struct Session {
    uri: ObjectUri,
    parts: BTreeMap<i32, Bytes>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bytes stored for `uri`, once an upload to it has completed.
    pub fn object(&self, uri: &ObjectUri) -> Option<Bytes> {
        self.state.read().unwrap().objects.get(&uri.to_string()).cloned()
    }

    /// The number of multipart sessions still open.
    pub fn open_sessions(&self) -> usize {
        self.state.read().unwrap().sessions.len()
    }
}

fn part_etag(body: &[u8]) -> EntityTag {
    EntityTag::new(format!("{:x}", md5::compute(body)))
}

impl SendRequest for MemoryClient {
    async fn send_put_object_request(&self, req: PutRequest) -> Result<PutOutput> {
        req.validate()?;
        let etag = part_etag(&req.body);
        let mut state = self.state.write().unwrap();
        state.objects.insert(req.uri.to_string(), req.body.clone());

        Ok(PutOutput {
            location: Some(req.uri.to_string()),
            version_id: None,
            e_tag: Some(etag),
        })
    }

    async fn send_create_upload_request(&self, req: CreateRequest) -> Result<UploadData> {
        req.validate()?;
        let mut state = self.state.write().unwrap();
        state.created += 1;
        let id = format!("upload-{}", state.created);
        state.sessions.insert(
            id.clone(),
            Session {
                uri: req.uri.clone(),
                parts: BTreeMap::new(),
            },
        );

        Ok(UploadData::new(id, req.uri.clone()).with_location(Some(req.uri.to_string())))
    }

    async fn send_part_upload_request(&self, req: UploadPartRequest) -> Result<CompletedPart> {
        req.validate()?;
        let etag = part_etag(&req.body);
        let mut state = self.state.write().unwrap();
        let session = state.sessions.get_mut(&*req.id).ok_or_else(|| ErrorRepr::UploadPart {
            id: req.id.clone(),
            uri: req.uri.clone(),
            part: req.part_number,
            source: "no such upload".into(),
        })?;
        session.parts.insert(*req.part_number, req.body.clone());

        Ok(CompletedPart::new(etag, req.part_number))
    }

    async fn send_complete_upload_request(&self, req: CompleteRequest) -> Result<CompletedUpload> {
        req.validate()?;
        let mut state = self.state.write().unwrap();
        let session = state.sessions.remove(&*req.id).ok_or_else(|| ErrorRepr::Complete {
            id: req.id.clone(),
            uri: req.uri.clone(),
            source: "no such upload".into(),
        })?;

        let mut assembled = Vec::new();
        for part in req.completed_parts.iter() {
            let body = session.parts.get(&*part.part_number).ok_or_else(|| ErrorRepr::Complete {
                id: req.id.clone(),
                uri: req.uri.clone(),
                source: format!("{} was never uploaded", part.part_number).into(),
            })?;
            assembled.extend_from_slice(body);
        }

        let etag = EntityTag::new(format!(
            "{:x}-{}",
            md5::compute(&assembled),
            req.completed_parts.count()
        ));
        let location = session.uri.to_string();
        state.objects.insert(location.clone(), Bytes::from(assembled));

        Ok(CompletedUpload {
            location: Some(location),
            version_id: None,
            e_tag: Some(etag),
        })
    }

    async fn send_abort_upload_request(&self, req: AbortRequest) -> Result<()> {
        req.validate()?;
        self.state.write().unwrap().sessions.remove(&*req.id);
        Ok(())
    }

    async fn send_list_parts_request(&self, req: ListPartsRequest) -> Result<PartsPage> {
        req.validate()?;
        let state = self.state.read().unwrap();
        let session = state.sessions.get(&*req.id).ok_or_else(|| ErrorRepr::ListParts {
            id: req.id.clone(),
            uri: req.uri.clone(),
            source: "no such upload".into(),
        })?;

        let parts = session
            .parts
            .iter()
            .map(|(number, body)| ListedPart {
                part_number: PartNumber::new(*number),
                e_tag: EntityTag::new(format!("\"{}\"", part_etag(body))),
            })
            .collect();

        Ok(PartsPage {
            parts,
            next_part_number_marker: None,
            is_truncated: false,
            location: Some(session.uri.to_string()),
        })
    }
}
