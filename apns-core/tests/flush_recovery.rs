// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end exercises of `Connection::flush` against a scripted in-memory
//! socket standing in for the APNS gateway, using a `Dialer` test double
//! that hands back a `Connection` whose socket is an in-memory script of
//! reads and writes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use apns_core::{
    Certificate, ClientConfig, ConnectError, Connection, Dialer, Environment, EnvelopeStatus,
    FlushError, Message, ProtocolError,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::mpsc;

const DUPLEX_BUF: usize = 64 * 1024;
/// command(1) + identifier(4) + expiration(4) + token_len(2) + token(32) +
/// payload_len(2) + payload("{}" = 2 bytes).
const TEST_FRAME_LEN: usize = 1 + 4 + 4 + 2 + 32 + 2 + 2;

fn test_certificate(fingerprint: &str) -> Certificate {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/test-identity.pem");
    Certificate::from_pem_file(fingerprint, Environment::Sandbox, path)
        .expect("test fixture identity must parse")
}

fn test_message() -> Message {
    Message::builder([0xffu8; 32], b"{}".to_vec()).build()
}

fn encode_error_frame(status: u8, identifier: u32) -> [u8; 6] {
    let mut bytes = [0u8; 6];
    bytes[0] = 8;
    bytes[1] = status;
    bytes[2..6].copy_from_slice(&identifier.to_be_bytes());
    bytes
}

/// Hands out a fresh duplex pair on every `connect()`, keeping the server
/// half reachable through `server_halves` so the test body can script APNS's
/// side of the conversation. A `Connection` reconnects after every recovered
/// error, so a single scripted session may span several
/// pairs.
struct ScriptedDialer {
    server_halves: mpsc::UnboundedSender<DuplexStream>,
}

impl Dialer for ScriptedDialer {
    fn connect<'a>(
        &'a self,
        _certificate: &'a Certificate,
        _timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<apns_core::BoxedSocket, ConnectError>> + Send + 'a>>
    {
        Box::pin(async move {
            let (client, server) = tokio::io::duplex(DUPLEX_BUF);
            let _ = self.server_halves.send(server);
            Ok(Box::new(client) as apns_core::BoxedSocket)
        })
    }
}

/// Reads exactly one notification frame and returns the identifier it
/// claims, without asserting anything about payload content.
async fn read_one_frame(server: &mut DuplexStream) -> u32 {
    let mut bytes = [0u8; TEST_FRAME_LEN];
    server
        .read_exact(&mut bytes)
        .await
        .expect("expected a full notification frame");
    assert_eq!(bytes[0], 1, "frame command byte must be the enhanced-notification command");
    u32::from_be_bytes(bytes[1..5].try_into().unwrap())
}

#[tokio::test(start_paused = true)]
async fn clean_send_reaches_no_errors_with_no_server_response() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let dialer = std::sync::Arc::new(ScriptedDialer { server_halves: tx });
    let mut connection = Connection::new(test_certificate("a"), ClientConfig::default(), dialer);

    let envelope = connection.queue(test_message());
    assert_eq!(connection.queue_length(), 1);

    let server_fut = async {
        let mut server = rx.recv().await.expect("connect must have happened");
        let identifier = read_one_frame(&mut server).await;
        assert_eq!(identifier, envelope.identifier());
    };

    let (flush_result, ()) = tokio::join!(connection.flush(), server_fut);
    flush_result.expect("flush with no error frame must succeed");

    assert_eq!(connection.queue_length(), 0);
    assert!(connection.is_connected(), "a clean flush never calls disconnect");
    assert_eq!(
        connection.envelope(envelope.identifier()).unwrap().status(),
        EnvelopeStatus::NoErrors
    );
}

#[tokio::test(start_paused = true)]
async fn mid_batch_rejection_resends_the_silently_dropped_tail() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let dialer = std::sync::Arc::new(ScriptedDialer { server_halves: tx });
    let mut connection = Connection::new(test_certificate("a"), ClientConfig::default(), dialer);

    let ids: Vec<u32> = (0..5)
        .map(|_| connection.queue(test_message()).identifier())
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);

    let server_fut = async {
        let mut first = rx.recv().await.expect("initial connect");
        for expected in 1..=5u32 {
            assert_eq!(read_one_frame(&mut first).await, expected);
        }
        // APNS reports the third envelope as the failing one only once the
        // whole batch has actually reached it, so envelopes 4 and 5 are
        // already sitting at NoErrors (silently dropped) when this lands.
        first
            .write_all(&encode_error_frame(8, 3))
            .await
            .expect("write error frame");
        drop(first);

        let mut second = rx.recv().await.expect("reconnect after recovery");
        for expected in 6..=7u32 {
            assert_eq!(read_one_frame(&mut second).await, expected);
        }
    };

    let (flush_result, ()) = tokio::join!(connection.flush(), server_fut);
    flush_result.expect("recovery flush must converge");

    assert_eq!(connection.envelope(1).unwrap().status(), EnvelopeStatus::NoErrors);
    assert_eq!(connection.envelope(2).unwrap().status(), EnvelopeStatus::NoErrors);
    assert_eq!(
        connection.envelope(3).unwrap().status(),
        EnvelopeStatus::ServerStatus(8)
    );

    for (rejected_tail_id, retry_id) in [(4u32, 6u32), (5, 7)] {
        let envelope = connection.envelope(rejected_tail_id).unwrap();
        assert_eq!(envelope.status(), EnvelopeStatus::EarlierError);
        assert_eq!(envelope.retry_identifier(), Some(retry_id));
        assert_eq!(connection.envelope(retry_id).unwrap().status(), EnvelopeStatus::NoErrors);
    }

    assert_eq!(connection.queue_length(), 0);
}

/// A socket wrapper that truncates exactly one write to simulate a
/// transport short-write, leaving every other read/write
/// untouched.
struct ShortWriteOnce<S> {
    inner: S,
    truncate_on_call: usize,
    calls_seen: usize,
}

impl<S: tokio::io::AsyncWrite + Unpin> tokio::io::AsyncWrite for ShortWriteOnce<S> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<std::io::Result<usize>> {
        self.calls_seen += 1;
        let truncated = self.calls_seen == self.truncate_on_call && buf.len() > 1;
        let inner = Pin::new(&mut self.inner);
        if truncated {
            inner.poll_write(cx, &buf[..buf.len() - 1])
        } else {
            inner.poll_write(cx, buf)
        }
    }

    fn poll_flush(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

impl<S: tokio::io::AsyncRead + Unpin> tokio::io::AsyncRead for ShortWriteOnce<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

struct ShortWriteDialer {
    /// Which write call (1-indexed, across the connection's lifetime) comes
    /// back short by one byte.
    truncate_on_call: usize,
    server_halves: Mutex<Option<mpsc::UnboundedSender<DuplexStream>>>,
}

impl Dialer for ShortWriteDialer {
    fn connect<'a>(
        &'a self,
        _certificate: &'a Certificate,
        _timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<apns_core::BoxedSocket, ConnectError>> + Send + 'a>>
    {
        Box::pin(async move {
            let (client, server) = tokio::io::duplex(DUPLEX_BUF);
            if let Some(tx) = self.server_halves.lock().unwrap().as_ref() {
                let _ = tx.send(server);
            }
            let wrapped = ShortWriteOnce {
                inner: client,
                truncate_on_call: self.truncate_on_call,
                calls_seen: 0,
            };
            Ok(Box::new(wrapped) as apns_core::BoxedSocket)
        })
    }
}

#[tokio::test(start_paused = true)]
async fn short_write_resends_under_a_new_identifier() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let dialer = std::sync::Arc::new(ShortWriteDialer {
        truncate_on_call: 2,
        server_halves: Mutex::new(Some(tx)),
    });
    let mut connection = Connection::new(test_certificate("a"), ClientConfig::default(), dialer);

    for _ in 0..3 {
        connection.queue(test_message());
    }

    // Drain exactly the bytes the (short-writing) socket will produce: four
    // frames, one of them one byte short. This case doesn't exercise a
    // server reply, so there is nothing to script beyond reading them away.
    let expected_bytes = TEST_FRAME_LEN * 4 - 1;
    let server_fut = async {
        let mut server = rx.recv().await.expect("connect");
        let mut sink = vec![0u8; expected_bytes];
        server.read_exact(&mut sink).await.expect("drain written frames");
    };

    let (flush_result, ()) = tokio::join!(connection.flush(), server_fut);
    flush_result.expect("a short write is recovered in-band, not a flush error");

    assert_eq!(connection.envelope(2).unwrap().status(), EnvelopeStatus::SendFailed);
    assert_eq!(connection.envelope(2).unwrap().retry_identifier(), Some(4));
    assert_eq!(connection.envelope(4).unwrap().status(), EnvelopeStatus::NoErrors);
    assert_eq!(connection.envelope(1).unwrap().status(), EnvelopeStatus::NoErrors);
    assert_eq!(connection.envelope(3).unwrap().status(), EnvelopeStatus::NoErrors);
}

#[tokio::test(start_paused = true)]
async fn corrupt_error_frame_is_fatal_and_mutates_nothing() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let dialer = std::sync::Arc::new(ScriptedDialer { server_halves: tx });
    let mut connection = Connection::new(test_certificate("a"), ClientConfig::default(), dialer);

    let envelope = connection.queue(test_message());

    let server_fut = async {
        let mut server = rx.recv().await.expect("connect");
        let _ = read_one_frame(&mut server).await;
        let mut corrupt = [0u8; 6];
        corrupt[0] = 7; // anything but the required command byte 8
        server.write_all(&corrupt).await.expect("write corrupt frame");
    };

    let (flush_result, ()) = tokio::join!(connection.flush(), server_fut);

    let err = flush_result.expect_err("a corrupt error frame must fail the flush");
    assert!(matches!(
        err,
        FlushError::Protocol(ProtocolError::UnexpectedCommand { found: 7 })
    ));
    assert!(!connection.is_connected(), "protocol corruption always disconnects");
    assert_eq!(
        connection.envelope(envelope.identifier()).unwrap().status(),
        EnvelopeStatus::NoErrors,
        "the write itself already succeeded; the corrupt frame must not retroactively change it"
    );
}
