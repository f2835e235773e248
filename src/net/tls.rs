//! TLS configuration and certificate loading.

use std::io;
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsConfig;

/// Build the rustls config for the HTTPS listener.
///
/// Inline PEM is checked up front so a bad paste fails with a readable error
/// instead of a handshake failure later.
pub async fn load_tls_config(tls: &TlsConfig) -> io::Result<RustlsConfig> {
    if let (Some(cert), Some(key)) = (&tls.cert_pem, &tls.key_pem) {
        validate_pem(cert.as_bytes(), key.as_bytes())?;
        return RustlsConfig::from_pem(cert.clone().into_bytes(), key.clone().into_bytes()).await;
    }

    match (&tls.cert_path, &tls.key_path) {
        (Some(cert), Some(key)) => load_files(Path::new(cert), Path::new(key)).await,
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "tls needs cert_pem/key_pem or cert_path/key_path",
        )),
    }
}

async fn load_files(cert_path: &Path, key_path: &Path) -> io::Result<RustlsConfig> {
    if !cert_path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Certificate file not found: {:?}", cert_path),
        ));
    }
    if !key_path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Private key file not found: {:?}", key_path),
        ));
    }

    RustlsConfig::from_pem_file(cert_path, key_path).await
}

/// Check that `cert` holds at least one certificate and `key` a private key.
pub fn validate_pem(cert: &[u8], key: &[u8]) -> io::Result<()> {
    let certs = rustls_pemfile::certs(&mut &cert[..]).collect::<Result<Vec<_>, _>>()?;
    if certs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "no certificate found in cert_pem",
        ));
    }

    if rustls_pemfile::private_key(&mut &key[..])?.is_none() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "no private key found in key_pem",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_garbage_pem() {
        let err = validate_pem(b"not a certificate", b"not a key").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_missing_files() {
        let tls = TlsConfig {
            cert_path: Some("/nonexistent/cert.pem".to_string()),
            key_path: Some("/nonexistent/key.pem".to_string()),
            ..TlsConfig::default()
        };
        let err = load_tls_config(&tls).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_incomplete_config() {
        let tls = TlsConfig {
            cert_pem: Some("x".to_string()),
            ..TlsConfig::default()
        };
        let err = load_tls_config(&tls).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
