//! Peer identity extraction from verified certificates.

use rustls::pki_types::CertificateDer;

/// Extract the subject common name from a DER-encoded certificate.
pub fn common_name(cert: &CertificateDer<'_>) -> Option<String> {
    use x509_parser::prelude::*;

    let (_, parsed) = X509Certificate::from_der(cert.as_ref()).ok()?;
    let cn = parsed.subject().iter_common_name().next()?.as_str().ok()?;
    Some(cn.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};

    #[test]
    fn extracts_the_common_name() {
        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, "greeter-peer");
        params.distinguished_name = dn;

        let key_pair = KeyPair::generate().unwrap();
        let cert = params.self_signed(&key_pair).unwrap();
        let der = CertificateDer::from(cert.der().to_vec());

        assert_eq!(common_name(&der).as_deref(), Some("greeter-peer"));
    }

    #[test]
    fn invalid_der_yields_none() {
        let der = CertificateDer::from(b"not a certificate".to_vec());
        assert_eq!(common_name(&der), None);
    }
}
