mod helpers;
use self::helpers::{P, RecordingClient, TRACER, md5_hex, test_bytes};

use aws_upload_manager::client::MemoryClient;
use aws_upload_manager::client::part::{EntityTag, PartNumber};
use aws_upload_manager::client::request::{ListedPart, PartsPage};
use aws_upload_manager::upload::{UploadBody, UploadConfig, UploadInput, Uploader};
use aws_upload_manager::uri::ObjectUri;

use bytes::Bytes;
use std::io::Cursor;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn dest() -> ObjectUri {
    ObjectUri::from(("my-bucket", "path/to/object"))
}

fn quoted(etag: &str) -> EntityTag {
    EntityTag::from(format!("\"{etag}\""))
}

fn page(parts: Vec<(i32, EntityTag)>, truncated: bool) -> PartsPage {
    let next = truncated.then(|| parts.last().map(|(n, _)| n.to_string())).flatten();
    PartsPage {
        parts: parts
            .into_iter()
            .map(|(part_number, e_tag)| ListedPart {
                part_number: PartNumber::new(part_number),
                e_tag,
            })
            .collect(),
        next_part_number_marker: next,
        is_truncated: truncated,
        location: None,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn tiny_input_is_one_put_object() {
    let _ = &*TRACER;

    let client = Arc::new(RecordingClient::new());
    let uploader = Uploader::new(Arc::clone(&client));

    let data = test_bytes(10);
    let input = UploadInput::new(dest(), UploadBody::streaming(Cursor::new(data.clone())));
    let out = uploader.upload(input).await.unwrap();

    let calls = client.calls.lock().unwrap();
    assert_eq!(calls.puts.len(), 1);
    assert_eq!(&calls.puts[0][..], &data[..]);
    assert_eq!(calls.creates, 0);
    drop(calls);

    assert!(out.upload_id.is_none());
    assert_eq!(
        out.location.as_deref(),
        Some("https://my-bucket.s3.amazonaws.com/path/to/object")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_byte_stream_is_one_empty_put_object() {
    let _ = &*TRACER;

    let client = Arc::new(RecordingClient::new());
    let uploader = Uploader::new(Arc::clone(&client));

    let input = UploadInput::new(dest(), UploadBody::streaming(Cursor::new(Vec::new())));
    let out = uploader.upload(input).await.unwrap();

    let calls = client.calls.lock().unwrap();
    assert_eq!(calls.puts.len(), 1);
    assert!(calls.puts[0].is_empty());
    assert_eq!(calls.creates, 0);
    drop(calls);
    assert!(out.upload_id.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn known_length_of_exactly_one_part_is_one_put_object() {
    let _ = &*TRACER;

    let client = Arc::new(RecordingClient::new());
    let uploader = Uploader::new(Arc::clone(&client));

    let data = test_bytes(P);
    let input = UploadInput::new(dest(), Bytes::from(data));
    let out = uploader.upload(input).await.unwrap();

    let calls = client.calls.lock().unwrap();
    assert_eq!(calls.puts.len(), 1);
    assert_eq!(calls.creates, 0);
    drop(calls);
    assert!(out.upload_id.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn one_part_plus_one_byte_uploads_two_parts() {
    let _ = &*TRACER;

    let client = Arc::new(RecordingClient::new());
    let uploader = Uploader::new(Arc::clone(&client));

    let data = test_bytes(P + 1);
    let input = UploadInput::new(dest(), UploadBody::streaming(Cursor::new(data.clone())));
    let out = uploader
        .upload_with(input, |cfg| cfg.concurrency = 2)
        .await
        .unwrap();

    let calls = client.calls.lock().unwrap();
    assert_eq!(calls.creates, 1);
    assert_eq!(calls.puts.len(), 0);

    let mut sizes: Vec<(i32, usize)> = calls
        .parts
        .iter()
        .map(|(num, body)| (*num, body.len()))
        .collect();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![(1, P), (2, 1)]);

    assert_eq!(calls.completes.len(), 1);
    assert_eq!(
        calls.completes[0],
        vec![(1, "etag-1".to_string()), (2, "etag-2".to_string())]
    );
    drop(calls);

    // Concatenated in part number order, the parts are exactly the input.
    assert_eq!(client.assembled_parts(), data);
    assert_eq!(out.upload_id.as_deref(), Some("test-session"));
    // The complete response carries no location; the one recorded at
    // create time stands in.
    assert_eq!(
        out.location.as_deref(),
        Some("https://my-bucket.s3.amazonaws.com/path/to/object")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn resume_verifies_existing_parts_and_uploads_the_rest() {
    let _ = &*TRACER;

    let data = test_bytes(3 * P);
    let client = Arc::new(RecordingClient::new().with_list_pages(vec![page(
        vec![
            (1, quoted(&md5_hex(&data[..P]))),
            (2, quoted(&md5_hex(&data[P..2 * P]))),
        ],
        false,
    )]));
    let uploader = Uploader::new(Arc::clone(&client));

    let input = UploadInput::new(dest(), Bytes::from(data));
    let out = uploader.resume_upload(input, "U").await.unwrap();

    let calls = client.calls.lock().unwrap();
    assert_eq!(calls.creates, 0, "an adopted session is never re-created");
    let uploaded: Vec<i32> = calls.parts.iter().map(|(num, _)| *num).collect();
    assert_eq!(uploaded, vec![3], "only the missing part is uploaded");

    assert_eq!(calls.completes.len(), 1);
    let manifest = &calls.completes[0];
    assert_eq!(manifest.len(), 3);
    assert_eq!(manifest[0].0, 1);
    assert_eq!(manifest[1].0, 2);
    assert_eq!(manifest[2], (3, "etag-3".to_string()));
    // Verified parts keep their stored (unquoted) entity tags.
    assert!(!manifest[0].1.contains('"'));
    drop(calls);

    assert_eq!(out.upload_id.as_deref(), Some("U"));
    // An adopted session has no create response; its location comes from
    // the ListParts requests.
    assert_eq!(
        out.location.as_deref(),
        Some("https://my-bucket.s3.amazonaws.com/path/to/object")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn resume_of_a_fully_uploaded_session_uploads_nothing() {
    let _ = &*TRACER;

    let data = test_bytes(2 * P);
    let client = Arc::new(RecordingClient::new().with_list_pages(vec![page(
        vec![
            (1, quoted(&md5_hex(&data[..P]))),
            (2, quoted(&md5_hex(&data[P..]))),
        ],
        false,
    )]));
    let uploader = Uploader::new(Arc::clone(&client));

    let input = UploadInput::new(dest(), Bytes::from(data));
    uploader.resume_upload(input, "U").await.unwrap();

    let calls = client.calls.lock().unwrap();
    assert!(calls.parts.is_empty(), "no part should be re-uploaded");
    assert_eq!(calls.completes.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn resume_checksum_mismatch_fails_and_aborts() {
    let _ = &*TRACER;

    let data = test_bytes(3 * P);
    let client = Arc::new(RecordingClient::new().with_list_pages(vec![page(
        vec![
            (1, quoted(&md5_hex(b"something else entirely"))),
            (2, quoted(&md5_hex(&data[P..2 * P]))),
        ],
        false,
    )]));
    let uploader = Uploader::new(Arc::clone(&client));

    let input = UploadInput::new(dest(), Bytes::from(data));
    let err = uploader.resume_upload(input, "U").await.unwrap_err();

    assert!(
        err.to_string()
            .contains("checksum did not match for chunk 1"),
        "unexpected error: {err}"
    );
    assert_eq!(err.upload_id().map(|id| &**id), Some("U"));
    assert_eq!(client.calls.lock().unwrap().aborts, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn leave_parts_on_error_suppresses_the_abort() {
    let _ = &*TRACER;

    let client = Arc::new(RecordingClient::new().with_fail_part(2));
    let uploader = Uploader::new(Arc::clone(&client)).with_config(
        UploadConfig::new()
            .with_concurrency(2)
            .with_leave_parts_on_error(true),
    );

    let input = UploadInput::new(dest(), Bytes::from(test_bytes(4 * P)));
    let err = uploader.upload(input).await.unwrap_err();

    assert_eq!(err.upload_id().map(|id| &**id), Some(client.upload_id()));
    let calls = client.calls.lock().unwrap();
    assert_eq!(calls.aborts, 0, "abort must be suppressed");
    assert!(calls.completes.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn exceeding_the_configured_part_count_fails_and_aborts() {
    let _ = &*TRACER;

    let client = Arc::new(RecordingClient::new());
    let uploader = Uploader::new(Arc::clone(&client));

    // Unknown length, so the part size cannot be adjusted up front.
    let input = UploadInput::new(
        dest(),
        UploadBody::streaming(Cursor::new(test_bytes(4 * P))),
    );
    let err = uploader
        .upload_with(input, |cfg| cfg.max_upload_parts = 3)
        .await
        .unwrap_err();

    assert!(
        err.to_string()
            .contains("exceeded total allowed configured MaxUploadParts (3)"),
        "unexpected error: {err}"
    );
    assert_eq!(err.upload_id().map(|id| &**id), Some("test-session"));
    assert_eq!(client.calls.lock().unwrap().aborts, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn list_parts_pagination_stops_on_a_repeated_part_number() {
    let _ = &*TRACER;

    let data = test_bytes(2 * P);
    let parts = vec![
        (1, quoted(&md5_hex(&data[..P]))),
        (2, quoted(&md5_hex(&data[P..]))),
    ];
    // The second page repeats the first and claims more pages forever.
    let client = Arc::new(RecordingClient::new().with_list_pages(vec![
        page(parts.clone(), true),
        page(parts.clone(), true),
        page(parts, true),
    ]));
    let uploader = Uploader::new(Arc::clone(&client));

    let input = UploadInput::new(dest(), Bytes::from(data));
    uploader.resume_upload(input, "U").await.unwrap();

    let calls = client.calls.lock().unwrap();
    assert_eq!(calls.list_requests, 2, "pagination must stop on the repeat");
    assert!(calls.parts.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn cancellation_before_the_first_read_makes_no_store_calls() {
    let _ = &*TRACER;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let client = Arc::new(RecordingClient::new());
    let uploader = Uploader::new(Arc::clone(&client))
        .with_config(UploadConfig::new().with_cancel(cancel));

    let input = UploadInput::new(
        dest(),
        UploadBody::streaming(Cursor::new(test_bytes(2 * P))),
    );
    let err = uploader.upload(input).await.unwrap_err();

    assert!(err.to_string().contains("canceled"), "unexpected error: {err}");
    let calls = client.calls.lock().unwrap();
    assert_eq!(calls.puts.len(), 0);
    assert_eq!(calls.creates, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn multipart_round_trip_through_the_memory_client() {
    let _ = &*TRACER;

    let client = Arc::new(MemoryClient::new());
    let uploader = Uploader::new(Arc::clone(&client));

    let uri = dest();
    let data = test_bytes(2 * P + 123);
    let input = UploadInput::new(uri.clone(), UploadBody::streaming(Cursor::new(data.clone())));
    let out = uploader.upload(input).await.unwrap();

    assert!(out.upload_id.is_some());
    assert_eq!(client.open_sessions(), 0);

    let stored = client.object(&uri).expect("object should be assembled");
    assert_eq!(&stored[..], &data[..]);
}

#[tokio::test(flavor = "multi_thread")]
async fn configured_part_size_below_the_minimum_is_rejected() {
    let _ = &*TRACER;

    let client = Arc::new(RecordingClient::new());
    let uploader = Uploader::new(Arc::clone(&client));

    let input = UploadInput::new(dest(), Bytes::from(test_bytes(16)));
    let err = uploader
        .upload_with(input, |cfg| cfg.part_size = 1024)
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        format!("part size must be at least {} bytes", 5 * 1024 * 1024)
    );
    let calls = client.calls.lock().unwrap();
    assert_eq!(calls.puts.len() + calls.creates, 0, "no network activity");
}
