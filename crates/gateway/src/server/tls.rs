//! Optional TLS termination using rustls.
//!
//! When `TLS_CERT_PATH` and `TLS_KEY_PATH` are both set the gateway accepts
//! HTTPS directly; otherwise a reverse proxy in front is expected to do it.
//! Private keys travel in request headers, so plain HTTP must never leave the
//! host.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use rustls::ServerConfig;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tower::Service;
use tracing::{debug, error, warn};

use crate::config::TlsPaths;

/// Build a [`rustls::ServerConfig`] from PEM-encoded certificate and private key bytes.
///
/// # Errors
///
/// Returns an error if the certificate or key cannot be parsed, or if rustls
/// rejects the configuration.
pub fn build_server_config(cert_pem: &[u8], key_pem: &[u8]) -> Result<Arc<ServerConfig>> {
    let certs = rustls_pemfile::certs(&mut std::io::BufReader::new(cert_pem))
        .collect::<Result<Vec<_>, _>>()
        .context("failed to parse TLS certificate chain")?;
    if certs.is_empty() {
        anyhow::bail!("no certificate found in PEM data");
    }

    let key = rustls_pemfile::private_key(&mut std::io::BufReader::new(key_pem))
        .context("failed to read TLS private key")?
        .context("no private key found in PEM data")?;

    let mut config = ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .context("failed to select TLS protocol versions")?
    .with_no_client_auth()
    .with_single_cert(certs, key)
    .context("failed to build rustls ServerConfig")?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(Arc::new(config))
}

/// Read the configured certificate and key files and build a server config.
///
/// # Errors
///
/// Returns an error if either file is unreadable or invalid.
pub fn load_server_config(paths: &TlsPaths) -> Result<Arc<ServerConfig>> {
    let cert = read(&paths.cert, "TLS certificate")?;
    let key = read(&paths.key, "TLS private key")?;
    build_server_config(&cert, &key)
}

fn read(path: &str, what: &str) -> Result<Vec<u8>> {
    std::fs::read(Path::new(path)).with_context(|| format!("failed to read {what} at {path}"))
}

/// Accept loop: complete a TLS handshake on each connection and serve `router` over it.
///
/// Runs until the process is killed.
pub async fn serve(listener: TcpListener, router: Router, config: Arc<ServerConfig>) -> Result<()> {
    let acceptor = TlsAcceptor::from(config);

    loop {
        let (tcp, peer_addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                error!(error = %e, "accept error");
                continue;
            }
        };
        let acceptor = acceptor.clone();
        let router = router.clone();

        tokio::spawn(async move {
            let stream = match acceptor.accept(tcp).await {
                Ok(s) => s,
                Err(e) => {
                    debug!(%peer_addr, error = %e, "TLS handshake failed");
                    return;
                }
            };

            let service = hyper::service::service_fn(move |req: hyper::Request<Incoming>| {
                router.clone().call(req)
            });

            if let Err(e) = auto::Builder::new(TokioExecutor::new())
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                warn!(%peer_addr, error = %e, "connection error");
            }
        });
    }
}
