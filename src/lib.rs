//! # Description
//!
//! A high-level crate for concurrent uploads to AWS S3 using the official
//! AWS [SDK] for Rust.
//!
//! An [`Uploader`] takes a destination and a byte stream of known or
//! unknown length and delivers it as one stored object: small inputs go up
//! in a single `PutObject` request, larger ones are cut into parts and
//! uploaded in parallel through a multipart session. An interrupted
//! multipart upload can be resumed; parts already in the store are verified
//! against the local data by MD5 checksum instead of being re-uploaded.
//!
//! [SDK]: https://awslabs.github.io/aws-sdk-rust/
//! [`Uploader`]: crate::upload::Uploader
#![cfg_attr(docsrs, feature(doc_cfg))]
use self::client::SdkClient;
use self::upload::Uploader;

pub mod client;
pub mod error;
pub mod upload;
pub mod uri;

// https://docs.aws.amazon.com/AmazonS3/latest/userguide/qfacts.html

/// Maximum allowed number of parts in a multi-part upload on Amazon S3.
pub const MAX_UPLOAD_PARTS: i32 = 10000;

/// Minimum allowed part size when uploading a part to Amazon S3, in bytes.
pub const MIN_UPLOAD_PART_SIZE: usize = 1024 * 1024 * 5;

/// Default part size to buffer chunks of a payload into.
pub const DEFAULT_UPLOAD_PART_SIZE: usize = MIN_UPLOAD_PART_SIZE;

/// Default number of worker tasks to spin up per upload.
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 5;

/// Returns a default [`Uploader`] with an [`aws_sdk_s3::Client`] as the
/// client type.
///
/// This loads the AWS default configuration via:
///
/// ```rust,no_run
/// # async fn load() {
/// let config = aws_config::load_from_env().await;
/// let client = aws_sdk_s3::Client::new(&config);
/// # }
/// ```
///
/// Use [`SdkClient::from_sdk_config`] to provide a non-default
/// configuration.
pub async fn default_uploader() -> Uploader {
    let config = aws_config::load_from_env().await;
    let client = SdkClient::from_sdk_config(config);
    Uploader::new(client)
}
