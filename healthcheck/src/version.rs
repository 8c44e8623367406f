//! Dotted node version parsing for the minimum-version gate

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Numeric dotted version such as `0.8.1` or `v1.2`; missing parts compare as zero
#[derive(Debug, Clone, Eq)]
pub struct Version(Vec<u64>);

impl Version {
    fn part(&self, index: usize) -> u64 {
        self.0.get(index).copied().unwrap_or(0)
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches(['v', 'V']);
        if trimmed.is_empty() {
            return Err(format!("empty version '{}'", s));
        }

        let mut parts = Vec::new();
        for piece in trimmed.split('.') {
            // "1.2.3-beta" keeps 3, a piece without leading digits is invalid
            let digits: String = piece.chars().take_while(|c| c.is_ascii_digit()).collect();
            let value = digits
                .parse::<u64>()
                .map_err(|_| format!("invalid version component '{}' in '{}'", piece, s))?;
            parts.push(value);
        }
        Ok(Version(parts))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        (0..len)
            .map(|i| self.part(i).cmp(&other.part(i)))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u64::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

/// An unparsable reported version counts as outdated. A node that reports
/// no version at all is not gated.
pub fn is_outdated(reported: Option<&str>, minimum: &Version) -> bool {
    match reported.map(str::parse::<Version>) {
        Some(Ok(version)) => version < *minimum,
        Some(Err(_)) => true,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_compare() {
        assert!(v("0.8.1") > v("0.8.0"));
        assert!(v("v1.0") > v("0.99.99"));
        assert_eq!(v("0.8"), v("0.8.0"));
        assert!(v("1.2.3-beta") == v("1.2.3"));
        assert_eq!(v("v0.7.2").to_string(), "0.7.2");
    }

    #[test]
    fn test_invalid_versions() {
        assert!("".parse::<Version>().is_err());
        assert!("abc".parse::<Version>().is_err());
        assert!("1..2".parse::<Version>().is_err());
    }

    #[test]
    fn test_is_outdated() {
        let minimum = v("0.8.0");
        assert!(is_outdated(Some("0.7.9"), &minimum));
        assert!(!is_outdated(Some("0.8.0"), &minimum));
        assert!(!is_outdated(Some("v0.10.1"), &minimum));
        assert!(is_outdated(Some("garbage"), &minimum));
        assert!(is_outdated(Some(""), &minimum));
        assert!(!is_outdated(None, &minimum));
    }
}
