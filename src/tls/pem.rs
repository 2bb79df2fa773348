//! PEM loading for certificate chains and private keys.

use std::{io, path::Path};

use rustls::pki_types::{CertificateDer, PrivateKeyDer, pem::PemObject};

fn invalid(path: &Path, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("{}: {err}", path.display()),
    )
}

/// Read every certificate in the PEM file at `path`.
///
/// # Errors
///
/// Returns [`io::ErrorKind::InvalidData`] when the file cannot be parsed or
/// holds no certificate.
pub fn load_certificates(path: impl AsRef<Path>) -> io::Result<Vec<CertificateDer<'static>>> {
    let path = path.as_ref();
    let certs = CertificateDer::pem_file_iter(path)
        .map_err(|err| invalid(path, err))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| invalid(path, err))?;
    if certs.is_empty() {
        return Err(invalid(path, "no certificates found"));
    }
    Ok(certs)
}

/// Read the first private key in the PEM file at `path`.
///
/// # Errors
///
/// Returns [`io::ErrorKind::InvalidData`] when no key can be parsed.
pub fn load_private_key(path: impl AsRef<Path>) -> io::Result<PrivateKeyDer<'static>> {
    let path = path.as_ref();
    PrivateKeyDer::from_pem_file(path).map_err(|err| invalid(path, err))
}
