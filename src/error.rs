//! Errors this crate can emit.
use crate::client::UploadId;
use crate::client::part::PartNumber;
use crate::uri::ObjectUri;

use std::fmt::{self, Display, Formatter};

/// A specialized `Result` type for this crate.
pub type Result<T, E = Error> = ::std::result::Result<T, E>;

/// The value returned in this crate when an error occurs.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct Error(pub(crate) ErrorRepr);

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self.0 {
            ErrorRepr::PartSizeTooSmall(_) | ErrorRepr::Missing(_, _) => ErrorKind::Config,
            ErrorRepr::ReadUploadData { .. } | ErrorRepr::ReadPartData { .. } => ErrorKind::Read,
            ErrorRepr::ConfiguredPartLimit(_) | ErrorRepr::AbsolutePartLimit(_) => ErrorKind::Limit,
            ErrorRepr::Put { .. }
            | ErrorRepr::Create { .. }
            | ErrorRepr::UploadPart { .. }
            | ErrorRepr::Complete { .. }
            | ErrorRepr::Abort { .. }
            | ErrorRepr::ListParts { .. } => ErrorKind::Store,
            ErrorRepr::ChecksumMismatch(_) => ErrorKind::Checksum,
            ErrorRepr::Canceled => ErrorKind::Canceled,
            ErrorRepr::MultiUpload { .. } => ErrorKind::MultiUpload,
            ErrorRepr::StdDyn(_) => ErrorKind::Unknown,
        }
    }

    /// The ID of the multipart upload session that failed, when this error
    /// came out of an active multipart upload.
    ///
    /// The parts uploaded before the failure are retained under this ID when
    /// the uploader is configured to leave parts on error, so this is the
    /// handle for manual recovery.
    pub fn upload_id(&self) -> Option<&UploadId> {
        match &self.0 {
            ErrorRepr::MultiUpload { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn from_dyn<E>(e: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let err = Box::new(e);
        Self(ErrorRepr::StdDyn(err))
    }

    pub(crate) fn multi_upload(id: UploadId, cause: Error) -> Self {
        Self(ErrorRepr::MultiUpload {
            id,
            source: Box::new(cause),
        })
    }
}

impl From<ErrorRepr> for Error {
    fn from(value: ErrorRepr) -> Self {
        Self(value)
    }
}

/// The category of the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    Config,
    Read,
    Limit,
    Store,
    Checksum,
    Canceled,
    MultiUpload,
    Unknown,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "config"),
            Self::Read => write!(f, "read"),
            Self::Limit => write!(f, "limit"),
            Self::Store => write!(f, "store"),
            Self::Checksum => write!(f, "checksum"),
            Self::Canceled => write!(f, "canceled"),
            Self::MultiUpload => write!(f, "multi upload"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Internal error type that we are free to change at will.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ErrorRepr {
    #[error("part size must be at least {0} bytes")]
    PartSizeTooSmall(usize),
    #[error("{0} missing required field: {1}")]
    Missing(&'static str, &'static str),
    #[error("read upload data failed: {source}")]
    ReadUploadData {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("read multipart upload data failed: {source}")]
    ReadPartData {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error(
        "exceeded total allowed configured MaxUploadParts ({0}). Adjust PartSize to fit in this limit"
    )]
    ConfiguredPartLimit(i32),
    #[error(
        "exceeded total allowed S3 limit MaxUploadParts ({0}). Adjust PartSize to fit in this limit"
    )]
    AbsolutePartLimit(i32),
    #[error("checksum did not match for chunk {0}, multipart upload out of sync with local file")]
    ChecksumMismatch(i32),
    #[error("upload canceled")]
    Canceled,
    #[error("uploading object to {uri} failed: {source}")]
    Put {
        uri: ObjectUri,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("creating multipart upload failed: {source}")]
    Create {
        uri: ObjectUri,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("uploading {part} to upload {id} failed: {source}")]
    UploadPart {
        id: UploadId,
        uri: ObjectUri,
        part: PartNumber,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("completing upload {id} failed: {source}")]
    Complete {
        id: UploadId,
        uri: ObjectUri,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("aborting upload {id} failed: {source}")]
    Abort {
        id: UploadId,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("listing parts of upload {id} failed: {source}")]
    ListParts {
        id: UploadId,
        uri: ObjectUri,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("upload multipart failed, upload id: {id}, cause: {source}")]
    MultiUpload { id: UploadId, source: Box<Error> },
    #[error(transparent)]
    StdDyn(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl ErrorRepr {
    pub(crate) fn from_put_err<E>(uri: &ObjectUri) -> impl FnOnce(E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let uri = uri.clone();
        move |e| Self::Put {
            uri,
            source: Box::new(e),
        }
    }

    pub(crate) fn from_create_err<E>(uri: &ObjectUri) -> impl FnOnce(E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let uri = uri.clone();
        move |e| Self::Create {
            uri,
            source: Box::new(e),
        }
    }

    pub(crate) fn from_upload_err<E>(
        id: &UploadId,
        uri: &ObjectUri,
        part: PartNumber,
    ) -> impl FnOnce(E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let id = id.clone();
        let uri = uri.clone();
        move |e| Self::UploadPart {
            id,
            uri,
            part,
            source: Box::new(e),
        }
    }

    pub(crate) fn from_complete_err<E>(id: &UploadId, uri: &ObjectUri) -> impl FnOnce(E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let id = id.clone();
        let uri = uri.clone();
        move |e| Self::Complete {
            id,
            uri,
            source: Box::new(e),
        }
    }

    pub(crate) fn from_abort_err<E>(id: &UploadId) -> impl FnOnce(E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let id = id.clone();
        move |e| Self::Abort {
            id,
            source: Box::new(e),
        }
    }

    pub(crate) fn from_list_err<E>(id: &UploadId, uri: &ObjectUri) -> impl FnOnce(E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let id = id.clone();
        let uri = uri.clone();
        move |e| Self::ListParts {
            id,
            uri,
            source: Box::new(e),
        }
    }
}
