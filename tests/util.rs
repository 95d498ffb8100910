#![allow(dead_code)]

use openqe_tls::cert::CertificateWithPrivateKey;
use openqe_tls::cert::name::parse_subject;
use openqe_tls::cert::params::CertConfig;
use openqe_tls::pki;

/// Key size used wherever the size itself is not under test.
pub const TEST_KEY_SIZE: usize = 1024;

pub fn ca_config(subject: &str, dns_name: &str) -> CertConfig {
    CertConfig::builder()
        .key_size(TEST_KEY_SIZE)
        .is_ca(true)
        .subject(parse_subject(subject))
        .dns_names(vec![dns_name.to_string()])
        .build()
}

pub fn leaf_config(subject: &str, dns_name: &str) -> CertConfig {
    CertConfig::builder()
        .key_size(TEST_KEY_SIZE)
        .subject(parse_subject(subject))
        .dns_names(vec![dns_name.to_string()])
        .build()
}

pub fn generate_ca_cert() -> CertificateWithPrivateKey {
    pki::generate_self_signed(&ca_config("/C=US/O=Test/CN=root", "ca.example.test"))
        .expect("CA generation should succeed")
}

pub fn generate_server_cert(ca: &CertificateWithPrivateKey) -> CertificateWithPrivateKey {
    pki::generate_signed(&ca.key, &ca.cert, &leaf_config("CN=server", "example.test"))
        .expect("leaf generation should succeed")
}
