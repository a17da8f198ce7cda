use std::{path::Path, sync::Arc};

use ::tracing::{info, warn};
use anyhow::{anyhow, Result};
use axum_server::tls_rustls::RustlsConfig;
use rustls::ServerConfig;
use rustls_pki_types::{pem::SliceIter, CertificateDer, PrivateKeyDer};

use crate::config::TlsConfig;

/// Build the configuration of the HTTPS server.
///
/// The certificate and its key are read once, at startup time.
pub async fn create_tls_config(tls_config: &TlsConfig) -> Result<RustlsConfig> {
    let (cert, key) = load_server_cert_and_key(&tls_config.cert_file, &tls_config.key_file).await?;
    let server_config = build_tls_server_config(cert, key)?;

    info!(
        cert_file = %tls_config.cert_file.display(),
        key_file = %tls_config.key_file.display(),
        "Loaded TLS certificate"
    );

    Ok(RustlsConfig::from_config(Arc::new(server_config)))
}

fn build_tls_server_config(
    cert: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
) -> Result<ServerConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    Ok(ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(cert, key)?)
}

async fn load_server_cert_and_key(
    cert_file: &Path,
    key_file: &Path,
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
    let cert_contents = tokio::fs::read(cert_file)
        .await
        .map_err(|e| anyhow!("Cannot read certificate file {}: {e}", cert_file.display()))?;
    let key_contents = tokio::fs::read(key_file)
        .await
        .map_err(|e| anyhow!("Cannot read key file {}: {e}", key_file.display()))?;

    let cert_iterator: SliceIter<CertificateDer> = SliceIter::new(&cert_contents[..]);
    let certs: Vec<CertificateDer<'static>> = cert_iterator
        .filter_map(|it| {
            if let Err(ref e) = it {
                warn!("Cannot parse certificate: {e}");
            }
            it.ok()
        })
        .collect();

    // the leaf certificate can be followed by its chain
    if certs.is_empty() {
        return Err(anyhow!(
            "Expected at least one certificate in certificate file, found none"
        ));
    }

    let key_iterator: SliceIter<PrivateKeyDer> = SliceIter::new(&key_contents[..]);
    let mut keys: Vec<PrivateKeyDer<'static>> = key_iterator
        .filter_map(|it| {
            if let Err(ref e) = it {
                warn!("Cannot parse private key: {e}");
            }
            it.ok()
        })
        .collect();

    if keys.len() != 1 {
        return Err(anyhow!(
            "Expected exactly one key in key file, found {}",
            keys.len()
        ));
    }

    Ok((certs, keys.remove(0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{generate_simple_self_signed, CertifiedKey};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn self_signed() -> (NamedTempFile, NamedTempFile) {
        let CertifiedKey { cert, key_pair } =
            generate_simple_self_signed(vec!["annotation-webhook.default.svc".to_owned()])
                .unwrap();

        (write_temp(&cert.pem()), write_temp(&key_pair.serialize_pem()))
    }

    #[tokio::test]
    async fn load_valid_certificate() {
        let (cert_file, key_file) = self_signed();

        let tls_config = TlsConfig {
            cert_file: cert_file.path().to_path_buf(),
            key_file: key_file.path().to_path_buf(),
        };

        assert!(create_tls_config(&tls_config).await.is_ok());
    }

    #[tokio::test]
    async fn missing_certificate_file() {
        let (_, key_file) = self_signed();

        let tls_config = TlsConfig {
            cert_file: "/does/not/exist/tls.crt".into(),
            key_file: key_file.path().to_path_buf(),
        };

        let error = create_tls_config(&tls_config).await.unwrap_err();
        assert!(error.to_string().starts_with("Cannot read certificate file"));
    }

    #[tokio::test]
    async fn certificate_file_without_certificates() {
        let (_, key_file) = self_signed();
        let cert_file = write_temp("this is not a certificate");

        let error = load_server_cert_and_key(cert_file.path(), key_file.path())
            .await
            .unwrap_err();
        assert!(error.to_string().contains("found none"));
    }

    #[tokio::test]
    async fn key_file_with_two_keys() {
        let (cert_file, key_file) = self_signed();
        let (_, other_key_file) = self_signed();
        let keys = format!(
            "{}{}",
            std::fs::read_to_string(key_file.path()).unwrap(),
            std::fs::read_to_string(other_key_file.path()).unwrap()
        );
        let keys_file = write_temp(&keys);

        let error = load_server_cert_and_key(cert_file.path(), keys_file.path())
            .await
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "Expected exactly one key in key file, found 2"
        );
    }
}
