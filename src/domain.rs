//! Domain name representation shared by the codec, cache, and scheduler.

use std::fmt::{self, Display};

use crate::error::{MdnsError, ParseError};

/// Maximum length of a single label, per RFC 1035 §3.1.
pub const MAX_LABEL_LEN: usize = 63;
/// Maximum cumulative expanded length of a name, per RFC 1035 §3.1.
pub const MAX_NAME_LEN: usize = 255;

/// A DNS domain name: an ordered sequence of labels, case-preserved.
///
/// Comparisons are case-sensitive here; the host-level layer normalises
/// case if it needs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DomainName {
    labels: Vec<Vec<u8>>,
}

impl DomainName {
    /// An empty name (the root).
    pub fn root() -> Self {
        DomainName { labels: vec![] }
    }

    /// Builds a name from a `.`-separated string such as `"foo.local"`.
    /// A trailing dot is tolerated and stripped.
    pub fn from_str(input: &str) -> Result<Self, MdnsError> {
        let trimmed = input.strip_suffix('.').unwrap_or(input);
        if trimmed.is_empty() {
            return Ok(DomainName::root());
        }
        let mut labels = Vec::new();
        for label in trimmed.split('.') {
            if label.is_empty() || label.len() > MAX_LABEL_LEN {
                return Err(MdnsError::InvalidArgument(format!(
                    "label {label:?} has invalid length"
                )));
            }
            labels.push(label.as_bytes().to_vec());
        }
        let name = DomainName { labels };
        if name.encoded_len() > MAX_NAME_LEN {
            return Err(MdnsError::InvalidArgument(format!(
                "name {input:?} exceeds {MAX_NAME_LEN} octets encoded"
            )));
        }
        Ok(name)
    }

    pub fn labels(&self) -> &[Vec<u8>] {
        &self.labels
    }

    pub(crate) fn push_label(&mut self, label: Vec<u8>) -> Result<(), ParseError> {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(ParseError::LabelTooLong);
        }
        self.labels.push(label);
        if self.encoded_len() > MAX_NAME_LEN {
            return Err(ParseError::NameTooLong);
        }
        Ok(())
    }

    /// Encoded length on the wire, including the terminating zero label,
    /// ignoring compression.
    pub fn encoded_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }

    /// Labels from least- to most-specific suffix, used for compression
    /// suffix matching: `["x", "y", "z"]` yields `y.z`, then `z`, etc.
    pub(crate) fn suffixes(&self) -> impl Iterator<Item = &[Vec<u8>]> {
        (0..self.labels.len()).map(move |i| &self.labels[i..])
    }
}

impl Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            return f.write_str(".");
        }
        for label in &self.labels {
            f.write_str(&String::from_utf8_lossy(label))?;
            f.write_str(".")?;
        }
        Ok(())
    }
}

impl TryFrom<&str> for DomainName {
    type Error = MdnsError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        DomainName::from_str(value)
    }
}
