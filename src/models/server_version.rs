use std::fmt;

/// Server release as reported by the `version` RPC method.
///
/// Accepts the forms servers actually send: `surrealdb-2.1.4`, `2.1.4`,
/// `1.4.0-beta.1`. Missing components default to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl ServerVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version string, ignoring any product prefix and pre-release suffix.
    pub fn parse(raw: &str) -> Option<Self> {
        let start = raw.find(|c: char| c.is_ascii_digit())?;
        let core = raw[start..]
            .split(|c: char| c == '-' || c == '+')
            .next()
            .unwrap_or_default();

        let mut parts = core.split('.').map(|part| part.parse::<u64>());
        let major = parts.next()?.ok()?;
        let minor = match parts.next() {
            Some(part) => part.ok()?,
            None => 0,
        };
        let patch = match parts.next() {
            Some(part) => part.ok()?,
            None => 0,
        };

        Some(Self::new(major, minor, patch))
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
