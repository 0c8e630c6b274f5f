// src/cache/fingerprint.rs

use sha2::{Digest, Sha256};
use std::fmt;

const UNIT_SEP: u8 = 0x1f;
const RECORD_SEP: u8 = 0x1e;

/// SHA-256 digest over the canonical content of a producer's inputs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Start a digest; `domain` keeps keys of different producers apart.
    pub fn builder(domain: &str) -> FingerprintBuilder {
        let mut hasher = Sha256::new();
        hasher.update(domain.as_bytes());
        hasher.update([RECORD_SEP]);
        FingerprintBuilder { hasher }
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // short form is enough to tell keys apart in logs
        write!(f, "Fingerprint({})", &self.to_hex()[..12])
    }
}

pub struct FingerprintBuilder {
    hasher: Sha256,
}

impl FingerprintBuilder {
    /// Mix in one list of fields, e.g. a header or a data row.
    pub fn field_list<S: AsRef<str>>(&mut self, fields: &[S]) -> &mut Self {
        for f in fields {
            self.hasher.update(f.as_ref().as_bytes());
            self.hasher.update([UNIT_SEP]);
        }
        self.hasher.update([RECORD_SEP]);
        self
    }

    pub fn fingerprint(&mut self, other: &Fingerprint) -> &mut Self {
        self.hasher.update(other.0);
        self.hasher.update([RECORD_SEP]);
        self
    }

    pub fn number(&mut self, value: f64) -> &mut Self {
        self.hasher.update(value.to_bits().to_le_bytes());
        self.hasher.update([RECORD_SEP]);
        self
    }

    pub fn finish(&mut self) -> Fingerprint {
        Fingerprint(self.hasher.finalize_reset().into())
    }
}
