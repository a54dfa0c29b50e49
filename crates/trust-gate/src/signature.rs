use std::fmt;

use sha2::{Digest, Sha256};

use crate::environment::{EnvironmentSnapshot, PackageQuery};
use crate::error::ProbeResult;

/// First API level exposing the multi-signer signing-info query.
pub const MULTI_SIGNER_SDK_LEVEL: u32 = 28;

const COMPILETIME_EXPECTED_SHA256: Option<&str> =
    option_env!("TRUST_GATE_EXPECTED_SIGNER_SHA256");
const RELEASE_SIGNER_SHA256: &str =
    "9F7D32D7D855928B88A9B0F6A2E6EE5A04DC401D87B23FC286CBA7C17860D634";

// A malformed build-time override fails the build instead of silently
// falling back to the release fingerprint.
const _: () = match COMPILETIME_EXPECTED_SHA256 {
    Some(raw) => assert!(
        is_sha256_hex(raw),
        "TRUST_GATE_EXPECTED_SIGNER_SHA256 must be 64 hex digits"
    ),
    None => {}
};
const _: () = assert!(is_sha256_hex(RELEASE_SIGNER_SHA256));

const fn is_sha256_hex(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    if bytes.len() != 64 {
        return false;
    }
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_hexdigit() {
            return false;
        }
        i += 1;
    }
    true
}

/// SHA-256 fingerprint of the release signing certificate. Only ever
/// sourced from the build, never from the binary under inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedIdentity {
    sha256_hex: String,
}

impl ExpectedIdentity {
    pub fn parse(raw: &str) -> Option<Self> {
        normalize_sha256_hex(raw).map(|sha256_hex| Self { sha256_hex })
    }

    /// Identity baked in at compile time: the build-time override when
    /// set, otherwise the release fingerprint. Both are validated by the
    /// compiler.
    pub fn embedded() -> Self {
        let raw = COMPILETIME_EXPECTED_SHA256.unwrap_or(RELEASE_SIGNER_SHA256);
        Self {
            sha256_hex: raw.to_ascii_uppercase(),
        }
    }

    pub fn as_hex(&self) -> &str {
        &self.sha256_hex
    }

    pub fn matches(&self, fingerprint_hex: &str) -> bool {
        self.sha256_hex.eq_ignore_ascii_case(fingerprint_hex)
    }
}

impl fmt::Display for ExpectedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sha256_hex)
    }
}

/// Trims and uppercases a 64-digit hex digest; rejects anything else.
pub fn normalize_sha256_hex(raw: &str) -> Option<String> {
    let normalized = raw.trim().to_ascii_uppercase();
    if normalized.len() != 64 {
        return None;
    }
    if !normalized.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    Some(normalized)
}

pub fn certificate_fingerprint(der: &[u8]) -> String {
    encode_hex_upper(&Sha256::digest(der))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureFailure {
    NoSigners,
    Mismatch { index: usize, observed_sha256: String },
    QueryFailed { detail: String },
}

impl SignatureFailure {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoSigners => "no_signers",
            Self::Mismatch { .. } => "signer_mismatch",
            Self::QueryFailed { .. } => "signer_query_failed",
        }
    }
}

impl fmt::Display for SignatureFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSigners => write!(f, "package reports no signer certificates"),
            Self::Mismatch {
                index,
                observed_sha256,
            } => write!(f, "signer #{} fingerprint {} not trusted", index, observed_sha256),
            Self::QueryFailed { detail } => write!(f, "signer query failed: {}", detail),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureVerdict {
    pub fingerprints: Vec<String>,
    pub failure: Option<SignatureFailure>,
}

impl SignatureVerdict {
    pub fn verified(&self) -> bool {
        self.failure.is_none()
    }

    fn failed(fingerprints: Vec<String>, failure: SignatureFailure) -> Self {
        Self {
            fingerprints,
            failure: Some(failure),
        }
    }
}

/// Normalized raw certificate bytes for the installed package, picking the
/// signing-info query by platform level.
pub fn installed_signers(packages: &dyn PackageQuery) -> ProbeResult<Option<Vec<Vec<u8>>>> {
    if packages.sdk_level() >= MULTI_SIGNER_SDK_LEVEL {
        packages.signing_certificates()
    } else {
        packages.legacy_signatures()
    }
}

/// Every signer must match `expected` exactly. Empty, absent or
/// unreadable signer data is never trusted.
pub fn verify_signers(
    env: &EnvironmentSnapshot<'_>,
    expected: &ExpectedIdentity,
) -> SignatureVerdict {
    let signers = match installed_signers(env.packages) {
        Ok(Some(signers)) => signers,
        Ok(None) => return SignatureVerdict::failed(Vec::new(), SignatureFailure::NoSigners),
        Err(err) => {
            return SignatureVerdict::failed(
                Vec::new(),
                SignatureFailure::QueryFailed {
                    detail: err.to_string(),
                },
            )
        }
    };
    verify_certificates(&signers, expected)
}

pub fn verify_certificates(signers: &[Vec<u8>], expected: &ExpectedIdentity) -> SignatureVerdict {
    if signers.is_empty() {
        return SignatureVerdict::failed(Vec::new(), SignatureFailure::NoSigners);
    }

    let mut fingerprints = Vec::with_capacity(signers.len());
    for (index, der) in signers.iter().enumerate() {
        let observed_sha256 = certificate_fingerprint(der);
        fingerprints.push(observed_sha256.clone());
        if !expected.matches(&observed_sha256) {
            return SignatureVerdict::failed(
                fingerprints,
                SignatureFailure::Mismatch {
                    index,
                    observed_sha256,
                },
            );
        }
    }

    SignatureVerdict {
        fingerprints,
        failure: None,
    }
}

fn encode_hex_upper(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
