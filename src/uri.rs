//! Where an upload lands.
//!
//! Every upload targets exactly one object: a [`Bucket`] plus the [`Key`]
//! under it, carried together as an [`ObjectUri`]. The session operations
//! (create, upload part, complete, abort, list parts) all repeat this
//! address, so it is cloned freely into each request; both components are
//! cheap Cow-backed strings.
use std::borrow::Cow;
use std::fmt::{self, Formatter};
use std::ops::Deref;

/// The destination of an upload: one object in one bucket.
///
/// A multipart session is pinned to its destination by the create request,
/// and resuming a session must use the same `ObjectUri` the session was
/// created with or the store will not find its parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ObjectUri {
    /// The bucket receiving the object.
    pub bucket: Bucket,
    /// The object's full key under the bucket.
    pub key: Key,
}

impl ObjectUri {
    /// Create a new `ObjectUri` from bucket and object key.
    pub fn new(bucket: Bucket, key: Key) -> Self {
        Self { bucket, key }
    }

    /// An upload cannot be addressed with either component missing.
    pub(crate) fn is_empty(&self) -> bool {
        self.bucket.is_empty() || self.key.is_empty()
    }
}

impl fmt::Display for ObjectUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", &self.bucket, &self.key)
    }
}

impl<B: Into<Bucket>, K: Into<Key>> From<(B, K)> for ObjectUri {
    fn from((bucket, key): (B, K)) -> Self {
        ObjectUri::new(bucket.into(), key.into())
    }
}

/// The bucket receiving the object.
///
/// Holds the plain bucket name, e.g. "my-s3-bucket". Construction trims
/// trailing `'/'`s so the name splices cleanly into request paths and the
/// `s3://` rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bucket(Cow<'static, str>);

impl Bucket {
    /// Create a new `Bucket` from the plain bucket name.
    pub fn new<T: Into<Cow<'static, str>>>(bucket: T) -> Self {
        let raw: Cow<'static, str> = bucket.into();
        if raw.ends_with('/') {
            Self(raw.trim_end_matches('/').to_owned().into())
        } else {
            Self(raw)
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for Bucket {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for Bucket {
    fn from(value: &str) -> Self {
        Self::new(value.to_owned())
    }
}

impl From<String> for Bucket {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// The object's key under its bucket.
///
/// S3 keys carry no leading separator; construction strips leading `'/'`s
/// so "/logs/run.json" and "logs/run.json" address the same object instead
/// of silently creating a key with an empty first segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Key(Cow<'static, str>);

impl Key {
    /// Create a new object `Key`.
    pub fn new<T: Into<Cow<'static, str>>>(key: T) -> Self {
        let raw: Cow<'static, str> = key.into();
        if raw.starts_with('/') {
            Self(raw.trim_start_matches('/').to_owned().into())
        } else {
            Self(raw)
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for Key {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::new(value.to_owned())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_the_s3_scheme() {
        let uri = ObjectUri::from(("logs", "2024/01/run.json"));
        assert_eq!(uri.to_string(), "s3://logs/2024/01/run.json");
    }

    #[test]
    fn bucket_and_key_spellings_are_normalized() {
        assert_eq!(&*Bucket::from("my-bucket/"), "my-bucket");
        assert_eq!(&*Bucket::from("my-bucket"), "my-bucket");
        assert_eq!(&*Key::from("/logs/run.json"), "logs/run.json");
        assert_eq!(&*Key::from("logs/run.json"), "logs/run.json");
    }

    #[test]
    fn a_uri_missing_either_component_is_unaddressable() {
        assert!(ObjectUri::from(("", "key")).is_empty());
        assert!(ObjectUri::from(("bucket", "")).is_empty());
        assert!(!ObjectUri::from(("bucket", "key")).is_empty());
    }
}
