//! TLS metadata capture — the `tls_of` adapter named in spec.md §9's
//! design note on TLS extraction.
//!
//! `reqwest`'s rustls backend does not expose the negotiated connection
//! to callers, so a short side TLS handshake to `host:443` is performed
//! to recover protocol version, cipher suite, and peer certificate
//! fields. This keeps the same "separate raw connection" shape as the
//! teacher's original `probe/tls.rs` (there built on `openssl`),
//! rebuilt on `rustls`/`tokio-rustls` to match the stack `reqwest`'s
//! `rustls-tls` feature already pulls in, and on `x509-parser` to read
//! certificate fields out of the DER peer certificate. Any failure to
//! extract yields `None` — this is not an error per spec.md §4.3.

use crate::probe::record::{PeerCertificate, TlsInfo};
use rustls_pki_types::ServerName;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use x509_parser::prelude::*;

/// Accepts any certificate the peer presents. This is a recon tool
/// aimed at arbitrary, often self-signed targets; the goal is to read
/// the certificate, not validate a trust chain.
#[derive(Debug)]
struct AcceptAnyServerCert;

impl rustls::client::danger::ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls_pki_types::CertificateDer<'_>,
        _intermediates: &[rustls_pki_types::CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls_pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls_pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls_pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        vec![
            rustls::SignatureScheme::RSA_PKCS1_SHA256,
            rustls::SignatureScheme::RSA_PKCS1_SHA384,
            rustls::SignatureScheme::RSA_PKCS1_SHA512,
            rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            rustls::SignatureScheme::ECDSA_NISTP384_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA256,
            rustls::SignatureScheme::RSA_PSS_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA512,
            rustls::SignatureScheme::ED25519,
        ]
    }
}

fn build_connector() -> TlsConnector {
    let mut config = rustls::ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert))
        .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    TlsConnector::from(Arc::new(config))
}

fn find_field(name: &x509_parser::x509::X509Name<'_>, oid_short: &str) -> Option<String> {
    name.iter().find_map(|attr| {
        let key = attr.attr_type().to_string();
        let matches = match oid_short {
            "O" => key.contains("2.5.4.10"),
            "CN" => key.contains("2.5.4.3"),
            _ => false,
        };
        if matches {
            attr.as_str().ok().map(|s| s.to_string())
        } else {
            None
        }
    })
}

/// Perform a standalone TLS handshake against `host:port` and extract
/// protocol version, cipher suite, and peer certificate fields. `port`
/// should be the same port the real request was made to (`Url`'s
/// `host_str()` strips it, so the caller resolves it separately via
/// `port_or_known_default()`), otherwise this dials the wrong endpoint.
/// Returns `None` on any failure (connect, handshake, or parse).
pub async fn tls_of(host: &str, port: u16) -> Option<TlsInfo> {
    let connector = build_connector();
    let addr = format!("{host}:{port}");
    let stream = TcpStream::connect(&addr).await.ok()?;
    let server_name = ServerName::try_from(host.to_string()).ok()?;
    let tls_stream = connector.connect(server_name, stream).await.ok()?;

    let (_, session) = tls_stream.get_ref();
    let protocol_version = session.protocol_version().map(|v| format!("{v:?}"))?;
    let cipher_suite = session
        .negotiated_cipher_suite()
        .map(|cs| format!("{:?}", cs.suite()))?;
    let der_chain = session.peer_certificates()?;
    let leaf = der_chain.first()?;

    let (_, cert) = X509Certificate::from_der(leaf.as_ref()).ok()?;

    let issuer_o = find_field(cert.issuer(), "O");
    let issuer_cn = find_field(cert.issuer(), "CN");
    let subject_cn = find_field(cert.subject(), "CN");

    let san_dns_names = cert
        .subject_alternative_name()
        .ok()
        .flatten()
        .map(|ext| {
            ext.value
                .general_names
                .iter()
                .filter_map(|gn| match gn {
                    GeneralName::DNSName(d) => Some(d.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let serial = cert.raw_serial_as_string();
    let signature_algorithm = cert.signature_algorithm.algorithm.to_id_string();

    Some(TlsInfo {
        version: protocol_version,
        cipher_suite,
        peer_certificate: PeerCertificate {
            issuer_o,
            issuer_cn,
            subject_cn,
            san_dns_names,
            serial,
            signature_algorithm,
        },
    })
}
