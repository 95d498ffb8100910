mod util;

use openqe_tls::bundle::cert_in_bundle;
use openqe_tls::cert::Certificate;
use openqe_tls::cert::extensions::{FlagSet, KeyUsages, SubjectAltName, ToAndFromX509Extension};
use openqe_tls::cert::name::parse_subject;
use openqe_tls::error::TlsError;
use openqe_tls::files::{self, CaCache};
use openqe_tls::key::KeyPair;
use openqe_tls::options::{CaOptions, PkiOptions};
use openqe_tls::pem_utils::{cert_to_pem, key_to_pem, pem_to_cert, pem_to_key};
use openqe_tls::pki;
pub type Result<T> = std::result::Result<T, TlsError>;

/// A self-signed CA is its own issuer and re-parses with the CA flag set.
#[test]
fn self_signed_ca_reparses_as_ca() -> Result<()> {
    let ca = util::generate_ca_cert();
    let reparsed = Certificate::from_der(ca.cert.as_der())?;

    assert_eq!(reparsed.issuer(), reparsed.subject());
    assert_eq!(
        reparsed.inner.tbs_certificate.issuer,
        reparsed.inner.tbs_certificate.subject
    );
    assert!(reparsed.is_ca()?);
    reparsed.verify_signed_by(&ca.key.public_key())?;
    Ok(())
}

/// A leaf names the CA as issuer and verifies against the CA key only.
#[test]
fn signed_leaf_verifies_against_the_ca() -> Result<()> {
    let ca = util::generate_ca_cert();
    let leaf = util::generate_server_cert(&ca);

    assert_eq!(leaf.cert.issuer(), ca.cert.subject());
    assert!(!leaf.cert.is_ca()?);
    leaf.cert.verify_signed_by(&ca.cert.public_key()?)?;

    let stranger = KeyPair::generate_rsa(util::TEST_KEY_SIZE)?;
    assert!(leaf.cert.verify_signed_by(&stranger.public_key()).is_err());
    Ok(())
}

/// Keys survive PEM and can still sign a certificate the CA verifies.
#[test]
fn pem_round_trips() -> Result<()> {
    let ca = util::generate_ca_cert();

    let key = pem_to_key(key_to_pem(&ca.key)?)?;
    assert_eq!(key, ca.key);
    let cert = pem_to_cert(cert_to_pem(&ca.cert))?;
    assert_eq!(cert.as_der(), ca.cert.as_der());

    let leaf = pki::generate_signed(&key, &cert, &util::leaf_config("CN=again", "again.test"))?;
    leaf.cert.verify_signed_by(&ca.key.public_key())?;
    Ok(())
}

#[test]
fn slash_and_comma_subjects_agree() {
    let slash = parse_subject("/O=Org/OU=Unit/CN=name");
    let comma = parse_subject("CN=name,O=Org,OU=Unit");

    for dn in [&slash, &comma] {
        assert_eq!(dn.common_name(), Some("name"));
        assert_eq!(dn.organization(), ["Org"]);
        assert_eq!(dn.organizational_unit(), ["Unit"]);
    }
    assert_eq!(slash, comma);
}

#[test]
fn bundle_membership_is_by_der_identity() -> Result<()> {
    let ca = util::generate_ca_cert();
    let twin = util::generate_ca_cert();
    assert_eq!(twin.cert.subject(), ca.cert.subject());
    assert_ne!(twin.cert.serial_number(), ca.cert.serial_number());

    let bundle = [twin.cert.to_pem(), ca.cert.to_pem()].concat();
    assert!(cert_in_bundle(ca.cert.to_pem(), &bundle)?);
    assert!(!cert_in_bundle(ca.cert.to_pem(), twin.cert.to_pem())?);
    Ok(())
}

#[test]
fn bundles_without_certificates_hold_nothing() -> Result<()> {
    let ca = util::generate_ca_cert();
    assert!(!cert_in_bundle(ca.cert.to_pem(), "")?);
    assert!(!cert_in_bundle(ca.cert.to_pem(), key_to_pem(&ca.key)?)?);
    Ok(())
}

/// Root `/C=US/O=Test/CN=root` signs a leaf for `example.test`.
#[test]
fn root_signs_example_test() -> Result<()> {
    let ca = pki::generate_self_signed(&util::ca_config("/C=US/O=Test/CN=root", "root.test"))?;
    let leaf = pki::generate_signed(
        &ca.key,
        &ca.cert,
        &util::leaf_config("CN=example.test", "example.test"),
    )?;

    assert_eq!(leaf.cert.dns_names()?, ["example.test"]);
    assert_eq!(leaf.cert.issuer().common_name(), Some("root"));
    assert_eq!(leaf.cert.issuer().country(), ["US"]);
    assert_eq!(leaf.cert.issuer().organization(), ["Test"]);
    Ok(())
}

/// The default template keeps DigitalSignature alone, for CAs too.
#[test]
fn default_template_key_usage() -> Result<()> {
    let ca = util::generate_ca_cert();
    assert_eq!(ca.cert.key_usage()?, FlagSet::from(KeyUsages::DigitalSignature));

    let san = ca
        .cert
        .inner
        .tbs_certificate
        .extensions
        .iter()
        .flatten()
        .find(|ext| ext.extn_id == SubjectAltName::OID)
        .expect("SAN extension present");
    assert!(!san.critical);
    Ok(())
}

/// ca-gen followed by cert-gen through the file adapter.
#[test]
fn file_based_issuance() -> Result<()> {
    let dir = tempfile::tempdir().expect("temp dir");
    let ca_opts = CaOptions {
        subject: "/C=US/O=Test/CN=root".to_string(),
        dns_name: "root.test".to_string(),
        key_file: dir.path().join("ca.key"),
        cert_file: dir.path().join("ca.crt"),
    };
    let ca = files::generate_ca_to_files(&ca_opts)?;

    let pki_opts = PkiOptions {
        ca: ca_opts.clone(),
        subject: "CN=server".to_string(),
        dns_name: "example.test".to_string(),
        key_file: dir.path().join("tls.key"),
        cert_file: dir.path().join("tls.crt"),
    };
    let mut cache = CaCache::new();
    let leaf = files::generate_tls_key_cert_pair_to_files(&pki_opts, &mut cache)?;
    assert_eq!(cache.len(), 1);

    let on_disk = files::read_ca(&pki_opts.key_file, &pki_opts.cert_file)?;
    assert_eq!(on_disk, leaf);
    on_disk.cert.verify_signed_by(&ca.key.public_key())?;
    assert_eq!(on_disk.cert.dns_names()?, ["example.test"]);

    assert!(files::check_ca_cert_in_bundle(
        &ca_opts.cert_file,
        &ca_opts.cert_file
    )?);
    assert!(!files::check_ca_cert_in_bundle(
        &pki_opts.cert_file,
        &ca_opts.cert_file
    )?);
    Ok(())
}

#[test]
fn missing_ca_files_stop_leaf_issuance() {
    let dir = tempfile::tempdir().expect("temp dir");
    let opts = PkiOptions {
        ca: CaOptions {
            key_file: dir.path().join("absent.key"),
            cert_file: dir.path().join("absent.crt"),
            ..CaOptions::default()
        },
        key_file: dir.path().join("tls.key"),
        cert_file: dir.path().join("tls.crt"),
        ..PkiOptions::default()
    };

    let err = files::generate_tls_key_cert_pair_to_files(&opts, &mut CaCache::new()).unwrap_err();
    assert!(matches!(err, TlsError::MissingFile(_)));
    assert!(!opts.key_file.exists());
}
