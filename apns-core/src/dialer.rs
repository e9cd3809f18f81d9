// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The pluggable "how do we get a socket" capability a [`crate::Connection`]
//! calls into on `connect()`. Production code wires up [`TlsDialer`]; tests
//! substitute a dialer that hands back an in-memory duplex stream instead —
//! this is the injected `GatewayFactory` capability, specialized one level
//! further down so the TLS handshake itself can be swapped out without
//! making `Connection` generic.

use std::future::Future;
use std::net::ToSocketAddrs;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use rustls_pki_types::{PrivateKeyDer, ServerName};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::certificate::Certificate;
use crate::error::ConnectError;
use crate::socket::BoxedSocket;

/// Produces the socket a `Connection` writes frames to. A trait rather than
/// a bare function so it can carry shared, expensive-to-build state (e.g. a
/// `rustls::ClientConfig`'s root store) across repeated calls, since
/// `connect()` is invoked again on every recovery reconnect.
pub trait Dialer: Send + Sync {
    fn connect<'a>(
        &'a self,
        certificate: &'a Certificate,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<BoxedSocket, ConnectError>> + Send + 'a>>;
}

/// Dials the APNS gateway over TLS using the certificate's chain and key as
/// the client identity, verifying the server against the public web PKI
/// (APNS's gateway presents an ordinarily CA-signed certificate, not a
/// private root).
pub struct TlsDialer {
    root_store: Arc<rustls::RootCertStore>,
}

impl TlsDialer {
    pub fn new() -> Self {
        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        Self {
            root_store: Arc::new(root_store),
        }
    }

    fn client_config(&self, certificate: &Certificate) -> Result<rustls::ClientConfig, ConnectError> {
        let key: PrivateKeyDer<'static> = certificate.key();
        rustls::ClientConfig::builder()
            .with_root_certificates((*self.root_store).clone())
            .with_client_auth_cert(certificate.chain(), key)
            .map_err(ConnectError::Tls)
    }
}

impl Default for TlsDialer {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialer for TlsDialer {
    fn connect<'a>(
        &'a self,
        certificate: &'a Certificate,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<BoxedSocket, ConnectError>> + Send + 'a>> {
        Box::pin(async move {
            tokio::time::timeout(timeout, self.connect_inner(certificate))
                .await
                .map_err(|_| ConnectError::Timeout(timeout))?
        })
    }
}

impl TlsDialer {
    async fn connect_inner(&self, certificate: &Certificate) -> Result<BoxedSocket, ConnectError> {
        let config = self.client_config(certificate)?;
        let (host, port) = certificate.endpoint();

        let addr = (host, port)
            .to_socket_addrs()
            .map_err(ConnectError::Io)?
            .next()
            .ok_or_else(|| {
                ConnectError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("could not resolve {host}:{port}"),
                ))
            })?;

        let tcp_stream = TcpStream::connect(addr).await.map_err(ConnectError::Io)?;
        tcp_stream.set_nodelay(true).map_err(ConnectError::Io)?;

        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| {
                ConnectError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("{host} is not a valid DNS name"),
                ))
            })?;

        let connector = TlsConnector::from(Arc::new(config));
        match connector.connect(server_name, tcp_stream).await {
            Ok(stream) => Ok(Box::new(stream) as BoxedSocket),
            // rustls/tokio-rustls surface a rejected handshake (bad cert,
            // wrong passphrase upstream, etc.) as `InvalidData`; treat that
            // as the stand-in for a dedicated certificate-problem error.
            Err(err) if err.kind() == std::io::ErrorKind::InvalidData => {
                Err(ConnectError::CertificateRejected(err))
            }
            Err(err) => Err(ConnectError::Io(err)),
        }
    }
}
