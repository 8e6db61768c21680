use crate::error::{ErrorRepr, Result};

use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::ops::{Deref, DerefMut};

/// Number we assign to a part when uploading.
///
/// This, along with the entity tag found in the response, is required in the
/// request to complete a multipart upload because it identifies where the
/// part goes when assembling the full object.
///
/// Part numbers start at 1 and are assigned in the order the parts were cut
/// from the input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartNumber(i32);

impl Default for PartNumber {
    fn default() -> Self {
        Self(1)
    }
}

impl PartNumber {
    /// Create a new `PartNumber` from a plain integer.
    pub fn new(n: i32) -> Self {
        Self(n)
    }
}

impl Deref for PartNumber {
    type Target = i32;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for PartNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "part_{}", self.0)
    }
}

impl From<i32> for PartNumber {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// AWS entity tag.
///
/// This value is a hash of an object. It is assigned to an uploaded part and
/// returned in the response from a part upload request.
///
/// It is also assigned to a completed upload and found in a successful
/// complete upload response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityTag(Cow<'static, str>);

impl EntityTag {
    pub(crate) fn new<T: Into<Cow<'static, str>>>(etag: T) -> Self {
        Self(etag.into())
    }

    /// Strip the ASCII double quotes the ListParts response wraps entity
    /// tags in.
    ///
    /// Tags from ListParts arrive as `"\"68b3...\""` and must be unquoted
    /// before they can be compared with a locally computed MD5 hex digest.
    pub fn unquoted(&self) -> EntityTag {
        let inner = self
            .0
            .strip_prefix('"')
            .and_then(|tag| tag.strip_suffix('"'))
            .unwrap_or(&self.0);
        EntityTag::new(inner.to_string())
    }

    pub(crate) fn from_response(value: Option<&str>, op: &'static str) -> Result<Self, ErrorRepr> {
        value
            .map(Self::from)
            .ok_or(ErrorRepr::Missing(op, "e_tag"))
    }
}

impl Deref for EntityTag {
    type Target = str;

    fn deref(&self) -> &str {
        self.0.deref()
    }
}

impl AsRef<str> for EntityTag {
    fn as_ref(&self) -> &str {
        self.deref()
    }
}

impl Display for EntityTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for EntityTag {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl From<String> for EntityTag {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

/// The value for a successful part upload, or for a part verified against
/// the store on a resumed upload.
///
/// All `CompletedPart`s need to be retained in order to construct a valid
/// complete upload request.
#[derive(Debug, Clone)]
pub struct CompletedPart {
    /// The entity tag of the uploaded part.
    pub etag: EntityTag,
    /// The incrementing integer starting with 1 that identifies this part in
    /// the assembled object.
    pub part_number: PartNumber,
}

impl CompletedPart {
    /// Create a new value from entity tag and part number used in the upload.
    pub fn new(etag: EntityTag, part_number: PartNumber) -> Self {
        Self { etag, part_number }
    }
}

/// All completed part uploads for a multipart upload.
///
/// S3 requires the complete request to list parts in increasing part number
/// order, while parallel workers finish parts in arbitrary order, so this is
/// sorted with [`sort_ascending`](CompletedParts::sort_ascending) before the
/// manifest is submitted.
#[derive(Debug, Clone, Default)]
pub struct CompletedParts(Vec<CompletedPart>);

impl CompletedParts {
    /// Add a new [`CompletedPart`] to this collection.
    pub fn push(&mut self, part: CompletedPart) {
        self.0.push(part);
    }

    /// Returns the number of parts that have been successfully uploaded.
    pub fn count(&self) -> usize {
        self.0.len()
    }

    /// Sort the `CompletedPart`s in increasing order by part number.
    pub fn sort_ascending(&mut self) {
        self.0.sort_by_key(|part| part.part_number);
    }
}

impl Deref for CompletedParts {
    type Target = [CompletedPart];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for CompletedParts {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<&CompletedParts> for aws_sdk_s3::types::CompletedMultipartUpload {
    fn from(value: &CompletedParts) -> Self {
        let completed_parts = value.0.iter().fold(Vec::new(), |mut acc, v| {
            acc.push(
                aws_sdk_s3::types::CompletedPart::builder()
                    .e_tag(v.etag.to_string())
                    .part_number(*v.part_number)
                    .build(),
            );

            acc
        });

        aws_sdk_s3::types::CompletedMultipartUpload::builder()
            .set_parts(Some(completed_parts))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquoted_strips_one_pair_of_quotes() {
        let quoted = EntityTag::from("\"abc123\"");
        assert_eq!(&*quoted.unquoted(), "abc123");

        let bare = EntityTag::from("abc123");
        assert_eq!(&*bare.unquoted(), "abc123");
    }

    #[test]
    fn sort_ascending_orders_by_part_number() {
        let mut parts = CompletedParts::default();
        for n in [3, 1, 2] {
            parts.push(CompletedPart::new(
                EntityTag::from(format!("e{n}")),
                PartNumber::new(n),
            ));
        }
        parts.sort_ascending();

        let order: Vec<i32> = parts.iter().map(|p| *p.part_number).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }
}
