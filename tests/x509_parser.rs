mod util;

use std::net::{IpAddr, Ipv4Addr};

use openqe_tls::cert::extensions::ExtendedKeyUsageOption;
use openqe_tls::cert::name::parse_subject;
use openqe_tls::cert::params::CertConfig;
use openqe_tls::pki;
use x509_parser::prelude::*;

// ring only verifies RSA signatures from 2048-bit keys upwards.
const VERIFIABLE_KEY_SIZE: usize = 2048;

fn verifiable_ca() -> openqe_tls::CertificateWithPrivateKey {
    let mut cfg = util::ca_config("/C=US/O=Test/CN=root", "ca.example.test");
    cfg.key_size = VERIFIABLE_KEY_SIZE;
    pki::generate_self_signed(&cfg).expect("CA generation should succeed")
}

fn common_name<'a>(name: &'a X509Name<'_>) -> Option<&'a str> {
    name.iter_common_name().next().and_then(|cn| cn.as_str().ok())
}

#[test]
fn ca_certificate_parses_independently() {
    let ca = verifiable_ca();
    let der = ::pem::parse(ca.cert.to_pem()).expect("PEM parsing should succeed");
    let (rest, cert) =
        X509Certificate::from_der(der.contents()).expect("X509 DER parsing should succeed");
    assert!(rest.is_empty());

    assert_eq!(cert.version(), X509Version::V3);
    assert_eq!(common_name(cert.subject()), Some("root"));
    assert_eq!(cert.subject().as_raw(), cert.issuer().as_raw());
    assert_eq!(
        cert.signature_algorithm.algorithm,
        x509_parser::oid_registry::OID_PKCS1_SHA256WITHRSA
    );

    let bc = cert
        .basic_constraints()
        .expect("valid basic constraints")
        .expect("basic constraints present");
    assert!(bc.critical);
    assert!(bc.value.ca);
    assert!(bc.value.path_len_constraint.is_none());

    let ku = cert
        .key_usage()
        .expect("valid key usage")
        .expect("key usage present");
    assert!(ku.critical);
    assert!(ku.value.digital_signature());
    assert!(!ku.value.key_cert_sign());

    assert!(cert.verify_signature(None).is_ok());
}

#[test]
fn leaf_certificate_parses_independently() {
    let ca = verifiable_ca();
    let cfg = CertConfig::builder()
        .key_size(util::TEST_KEY_SIZE)
        .subject(parse_subject("/C=US/O=Test/CN=server"))
        .dns_names(vec!["example.test".to_string(), "www.example.test".to_string()])
        .ip_addresses(vec![IpAddr::V4(Ipv4Addr::LOCALHOST)])
        .ext_key_usages(vec![ExtendedKeyUsageOption::ServerAuth])
        .validity(::time::Duration::days(30))
        .build();
    let leaf = pki::generate_signed(&ca.key, &ca.cert, &cfg).expect("leaf generation");

    let (_, ca_cert) = X509Certificate::from_der(ca.cert.as_der()).expect("CA parses");
    let (_, cert) = X509Certificate::from_der(leaf.cert.as_der()).expect("leaf parses");

    assert_eq!(common_name(cert.subject()), Some("server"));
    assert_eq!(common_name(cert.issuer()), Some("root"));
    assert_eq!(cert.issuer().as_raw(), ca_cert.subject().as_raw());

    let bc = cert
        .basic_constraints()
        .expect("valid basic constraints")
        .expect("basic constraints present");
    assert!(!bc.value.ca);

    let san = cert
        .subject_alternative_name()
        .expect("valid SAN")
        .expect("SAN present");
    assert!(!san.critical);
    let names: Vec<_> = san.value.general_names.iter().collect();
    assert_eq!(
        names,
        [
            &GeneralName::DNSName("example.test"),
            &GeneralName::DNSName("www.example.test"),
            &GeneralName::IPAddress(&[127, 0, 0, 1]),
        ]
    );

    let eku = cert
        .extended_key_usage()
        .expect("valid EKU")
        .expect("EKU present");
    assert!(eku.value.server_auth);
    assert!(!eku.value.client_auth);

    let validity = cert.validity();
    let lifetime = validity.not_after.timestamp() - validity.not_before.timestamp();
    assert!((lifetime - 30 * 24 * 60 * 60).abs() <= 1);
    assert!(validity.is_valid());

    let aki = cert
        .extensions()
        .iter()
        .find_map(|ext| match ext.parsed_extension() {
            ParsedExtension::AuthorityKeyIdentifier(aki) => Some(aki),
            _ => None,
        })
        .expect("AKI present");
    let ski = ca_cert
        .extensions()
        .iter()
        .find_map(|ext| match ext.parsed_extension() {
            ParsedExtension::SubjectKeyIdentifier(ski) => Some(ski),
            _ => None,
        })
        .expect("CA SKI present");
    assert_eq!(aki.key_identifier.as_ref().map(|id| id.0), Some(ski.0));

    assert!(cert.verify_signature(Some(ca_cert.public_key())).is_ok());
}

#[test]
fn serials_are_positive() {
    let ca = util::generate_ca_cert();
    let (_, cert) = X509Certificate::from_der(ca.cert.as_der()).expect("CA parses");
    let serial = cert.raw_serial();
    assert!(!serial.is_empty());
    assert_eq!(serial[0] & 0x80, 0);
    assert!(cert.serial.bits() > 0);
}
