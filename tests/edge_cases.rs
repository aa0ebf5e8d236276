#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Edge cases of the message layer and transport adapters
//! Boundary values, odd client payloads, and connection plumbing

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tty_bridge::core::codec::{Base64Codec, Decoder, Encoding, NullCodec};
use tty_bridge::error::constants;
use tty_bridge::protocol::message::{decode_output, max_chunk_size, ServerMessage};
use tty_bridge::transport::{
    framed, framed_with_limit, BackConnection, FixedSize, PipeBackend, Resize,
};
use tty_bridge::{ProtocolError, TerminalSize};

// ============================================================================
// RESIZE PAYLOADS
// ============================================================================

#[test]
fn test_resize_fractions_truncate() {
    let size = TerminalSize::from_payload(br#"{"columns":80.9,"rows":24.2}"#).unwrap();
    assert_eq!(size, TerminalSize { columns: 80, rows: 24 });
}

#[test]
fn test_resize_out_of_range_values_saturate() {
    let size = TerminalSize::from_payload(br#"{"columns":-5,"rows":1e9}"#).unwrap();
    assert_eq!(size, TerminalSize { columns: 0, rows: u16::MAX });
}

#[test]
fn test_resize_extra_fields_ignored() {
    let size =
        TerminalSize::from_payload(br#"{"columns":100,"rows":30,"pixels":[1,2]}"#).unwrap();
    assert_eq!(size, TerminalSize { columns: 100, rows: 30 });
}

#[test]
fn test_resize_missing_field_defaults_to_zero() {
    let size = TerminalSize::from_payload(br#"{"columns":100}"#).unwrap();
    assert_eq!(size, TerminalSize { columns: 100, rows: 0 });

    let size = TerminalSize::from_payload(br#"{"rows":null}"#).unwrap();
    assert_eq!(size, TerminalSize::default());

    assert_eq!(TerminalSize::from_payload(b"{}").unwrap(), TerminalSize::default());
    assert_eq!(TerminalSize::from_payload(b"null").unwrap(), TerminalSize::default());
}

#[test]
fn test_resize_field_names_case_insensitive() {
    let size = TerminalSize::from_payload(br#"{"COLUMNS":132,"rOwS":43}"#).unwrap();
    assert_eq!(size, TerminalSize { columns: 132, rows: 43 });
}

#[test]
fn test_resize_non_object_rejected() {
    let payloads: [&[u8]; 4] = [b"[80,24]", b"80", b"\"80x24\"", b"true"];
    for payload in payloads {
        let err = TerminalSize::from_payload(payload).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedResize(_)), "{payload:?}");
    }
}

#[test]
fn test_resize_string_values_rejected() {
    let err = TerminalSize::from_payload(br#"{"columns":"100","rows":"30"}"#).unwrap_err();
    assert!(matches!(err, ProtocolError::MalformedResize(_)));
}

#[test]
fn test_resize_empty_payload_message() {
    match TerminalSize::from_payload(b"") {
        Err(ProtocolError::MalformedResize(msg)) => assert_eq!(msg, constants::ERR_RESIZE_EMPTY),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_constrain_with_nothing_fixed_is_identity() {
    let size = TerminalSize { columns: 10, rows: 5 };
    assert_eq!(size.constrain(TerminalSize::default()), size);
}

// ============================================================================
// CHUNK SIZING
// ============================================================================

#[test]
fn test_chunk_size_boundaries() {
    assert_eq!(max_chunk_size(0), 0);
    assert_eq!(max_chunk_size(4), 0);
    assert_eq!(max_chunk_size(5), 3);
    assert_eq!(max_chunk_size(1024), 765);
}

#[test]
fn test_empty_output_is_bare_tag() {
    let frame = ServerMessage::Output(b"").encode().unwrap();
    assert_eq!(&frame[..], b"1");
    assert!(decode_output(&frame[1..]).unwrap().is_empty());
}

#[test]
fn test_title_sent_verbatim() {
    let frame = ServerMessage::SetWindowTitle("zsh – ü".as_bytes())
        .encode()
        .unwrap();
    assert_eq!(&frame[1..], "zsh – ü".as_bytes());
}

// ============================================================================
// CODECS
// ============================================================================

#[test]
fn test_null_codec_rejects_small_output() {
    let mut dst = [0u8; 2];
    match NullCodec.decode(&mut dst, b"abc") {
        Err(ProtocolError::Decode(msg)) => assert_eq!(msg, constants::ERR_OUTPUT_TOO_SMALL),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_base64_rejects_garbage() {
    let mut dst = [0u8; 16];
    assert!(matches!(
        Base64Codec.decode(&mut dst, b"@@@@"),
        Err(ProtocolError::Decode(_))
    ));
}

#[test]
fn test_encoding_names() {
    assert_eq!(Encoding::from_name(b"base64"), Some(Encoding::Base64));
    assert_eq!(Encoding::from_name(b"null"), Some(Encoding::Null));
    // Names are case sensitive
    assert_eq!(Encoding::from_name(b"BASE64"), None);
    assert_eq!(Encoding::from_name(b""), None);

    assert_eq!("base64".parse::<Encoding>().unwrap(), Encoding::Base64);
    assert!("utf-8".parse::<Encoding>().is_err());
    assert_eq!(Encoding::Base64.decoder().name(), "base64");
}

// ============================================================================
// TRANSPORT ADAPTERS
// ============================================================================

#[tokio::test]
async fn test_pipe_backend_splits_one_stream() {
    let (near, mut far) = tokio::io::duplex(256);
    let (mut reader, mut writer) = PipeBackend::new(near).into_split();

    writer.write_all(b"to process").await.unwrap();
    let mut buf = [0u8; 10];
    far.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"to process");

    far.write_all(b"from it").await.unwrap();
    let mut buf = [0u8; 7];
    reader.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"from it");

    // Resizing a plain pipe is a no-op
    assert!(writer.resize(80, 24).is_ok());
}

#[tokio::test]
async fn test_fixed_size_writer_delegates() {
    let (near, mut far) = tokio::io::duplex(64);
    let mut writer = FixedSize(near);

    writer.write_all(b"abc").await.unwrap();
    writer.resize(1, 1).unwrap();

    let mut buf = [0u8; 3];
    far.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"abc");
}

#[tokio::test]
async fn test_framed_rejects_oversized_frames() {
    let (a, b) = tokio::io::duplex(4096);
    let mut sender = framed(a);
    let mut receiver = framed_with_limit(b, 16);

    sender.send(Bytes::from(vec![b'1'; 64])).await.unwrap();
    let result = receiver.next().await.expect("one item");
    assert!(result.is_err(), "oversized frame should be an error");
}

#[tokio::test]
async fn test_framed_limit_applies_to_sends() {
    let (a, _b) = tokio::io::duplex(4096);
    let mut sender = framed_with_limit(a, 16);

    assert!(sender.send(Bytes::from(vec![b'4'; 64])).await.is_err());
}

#[tokio::test]
async fn test_framed_default_limit_exceeds_buffer_size() {
    let (a, b) = tokio::io::duplex(64 * 1024);
    let mut sender = framed(a);
    let mut receiver = framed(b);

    let frame = Bytes::from(vec![b'1'; 32 * 1024]);
    sender.send(frame.clone()).await.unwrap();
    assert_eq!(&receiver.next().await.unwrap().unwrap()[..], &frame[..]);
}

#[tokio::test]
async fn test_framed_preserves_boundaries() {
    let (a, b) = tokio::io::duplex(4096);
    let mut sender = framed(a);
    let mut receiver = framed(b);

    let frames: [&[u8]; 3] = [b"2", b"1abc", b""];
    for frame in frames {
        sender.send(Bytes::copy_from_slice(frame)).await.unwrap();
    }
    assert_eq!(&receiver.next().await.unwrap().unwrap()[..], b"2");
    assert_eq!(&receiver.next().await.unwrap().unwrap()[..], b"1abc");
    assert!(receiver.next().await.unwrap().unwrap().is_empty());
}
