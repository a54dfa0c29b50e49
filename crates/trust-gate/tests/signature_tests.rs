mod common;

use common::{release_identity, FakeEnvironment, RELEASE_CERT, ROGUE_CERT};
use trust_gate::{
    certificate_fingerprint, installed_signers, normalize_sha256_hex, verify_certificates,
    verify_signers, ExpectedIdentity, SignatureFailure, MULTI_SIGNER_SDK_LEVEL,
};

#[test]
fn normalize_sha256_hex_accepts_trimmed_lowercase_and_rejects_invalid() {
    let lower = "  abcdefabcdefabcdefabcdefabcdefabcdefabcdefabcdefabcdefabcdefabcd  ";
    let normalized = normalize_sha256_hex(lower).expect("normalize valid hex");
    assert_eq!(normalized.len(), 64);
    assert!(normalized.chars().all(|c| !c.is_ascii_lowercase()));

    assert!(normalize_sha256_hex("").is_none());
    assert!(normalize_sha256_hex("abc").is_none());
    assert!(normalize_sha256_hex(&"g".repeat(64)).is_none());
    assert!(ExpectedIdentity::parse("   ").is_none());
}

#[test]
fn matching_signer_is_verified_case_insensitively() {
    let lower = certificate_fingerprint(RELEASE_CERT).to_ascii_lowercase();
    let identity = ExpectedIdentity::parse(&lower).expect("lowercase identity");

    let verdict = verify_certificates(&[RELEASE_CERT.to_vec()], &identity);
    assert!(verdict.verified());
    assert_eq!(verdict.fingerprints, vec![certificate_fingerprint(RELEASE_CERT)]);
}

#[test]
fn empty_signer_set_is_not_verified() {
    let verdict = verify_certificates(&[], &release_identity());
    assert_eq!(verdict.failure, Some(SignatureFailure::NoSigners));
}

#[test]
fn one_rogue_signer_fails_the_whole_set() {
    let verdict = verify_certificates(
        &[RELEASE_CERT.to_vec(), ROGUE_CERT.to_vec()],
        &release_identity(),
    );
    assert!(!verdict.verified());
    assert!(matches!(
        verdict.failure,
        Some(SignatureFailure::Mismatch { index: 1, .. })
    ));
}

#[test]
fn multiple_matching_signers_are_verified() {
    let verdict = verify_certificates(
        &[RELEASE_CERT.to_vec(), RELEASE_CERT.to_vec()],
        &release_identity(),
    );
    assert!(verdict.verified());
    assert_eq!(verdict.fingerprints.len(), 2);
}

#[test]
fn legacy_and_modern_queries_verify_identically() {
    let mut modern = FakeEnvironment::clean();
    modern.sdk_level = MULTI_SIGNER_SDK_LEVEL;
    modern.legacy_signers = None;

    let mut legacy = FakeEnvironment::clean();
    legacy.sdk_level = MULTI_SIGNER_SDK_LEVEL - 1;
    legacy.modern_signers = None;

    let modern_verdict = verify_signers(&modern.snapshot(), &release_identity());
    let legacy_verdict = verify_signers(&legacy.snapshot(), &release_identity());
    assert!(modern_verdict.verified());
    assert_eq!(modern_verdict, legacy_verdict);

    assert_eq!(
        installed_signers(modern.snapshot().packages).expect("modern query"),
        installed_signers(legacy.snapshot().packages).expect("legacy query")
    );
}

#[test]
fn absent_signing_info_is_not_verified() {
    let mut env = FakeEnvironment::clean();
    env.modern_signers = Some(None);

    let verdict = verify_signers(&env.snapshot(), &release_identity());
    assert_eq!(verdict.failure, Some(SignatureFailure::NoSigners));
}

#[test]
fn package_query_error_is_not_verified() {
    let mut env = FakeEnvironment::clean();
    env.modern_signers = None;

    let verdict = verify_signers(&env.snapshot(), &release_identity());
    assert_eq!(
        verdict.failure.as_ref().map(SignatureFailure::code),
        Some("signer_query_failed")
    );
}

#[test]
fn identity_comparison_is_exact_not_prefix() {
    let fingerprint = certificate_fingerprint(RELEASE_CERT);
    let mut altered = fingerprint.clone();
    altered.replace_range(63..64, if fingerprint.ends_with('0') { "1" } else { "0" });
    let identity = ExpectedIdentity::parse(&altered).expect("valid hex");

    assert!(!verify_certificates(&[RELEASE_CERT.to_vec()], &identity).verified());
}
