//! Syntax checks for the `format` keyword.
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;

// `None` only if the pattern fails to build, in which case no address passes.
static EMAIL: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*$")
        .ok()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    DateTime,
    Email,
    Hostname,
    Ipv4,
    Ipv6,
    Uri,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DateTime => "date-time",
            Self::Email => "email",
            Self::Hostname => "hostname",
            Self::Ipv4 => "ipv4",
            Self::Ipv6 => "ipv6",
            Self::Uri => "uri",
        }
    }

    pub fn check(&self, s: &str) -> Result<(), ValidationError> {
        let ok = match self {
            Self::DateTime => chrono::DateTime::parse_from_rfc3339(s).is_ok(),
            Self::Email => EMAIL.as_ref().is_some_and(|rx| rx.is_match(s)),
            Self::Hostname => is_domain_name(s),
            // `Ipv4Addr` already rejects anything but digits and dots.
            Self::Ipv4 => s.parse::<Ipv4Addr>().is_ok(),
            Self::Ipv6 => s.parse::<Ipv6Addr>().is_ok(),
            Self::Uri => url::Url::parse(s).is_ok(),
        };
        if ok {
            Ok(())
        } else {
            Err(ValidationError::Format(format!("invalid {}: '{s}'", self.as_str())))
        }
    }
}

impl FromStr for Format {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "datetime" | "date-time" => Ok(Self::DateTime),
            "email" => Ok(Self::Email),
            "hostname" => Ok(Self::Hostname),
            "ipv4" => Ok(Self::Ipv4),
            "ipv6" => Ok(Self::Ipv6),
            "uri" => Ok(Self::Uri),
            _ => Err(()),
        }
    }
}

/// RFC 1035 / RFC 3696 host name syntax: dot-separated labels of at most
/// 63 bytes, no leading or trailing dash, at least one letter overall.
fn is_domain_name(s: &str) -> bool {
    if s.is_empty() || s.len() > 255 {
        return false;
    }

    let mut last = b'.';
    let mut saw_letter = false;
    let mut label_len = 0;
    for &c in s.as_bytes() {
        match c {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                saw_letter = true;
                label_len += 1;
            }
            b'0'..=b'9' => label_len += 1,
            b'-' => {
                if last == b'.' {
                    return false;
                }
                label_len += 1;
            }
            b'.' => {
                if last == b'.' || last == b'-' {
                    return false;
                }
                if label_len > 63 || label_len == 0 {
                    return false;
                }
                label_len = 0;
            }
            _ => return false,
        }
        last = c;
    }
    if last == b'-' || label_len > 63 {
        return false;
    }
    saw_letter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_names() {
        assert_eq!("datetime".parse(), Ok(Format::DateTime));
        assert_eq!("date-time".parse(), Ok(Format::DateTime));
        assert_eq!("uri".parse(), Ok(Format::Uri));
        assert!("uuid".parse::<Format>().is_err());
    }

    #[test]
    fn datetime() {
        assert!(Format::DateTime.check("2024-02-29T12:30:00Z").is_ok());
        assert!(Format::DateTime.check("2024-02-29T12:30:00+02:00").is_ok());
        assert!(Format::DateTime.check("2024-02-29").is_err());
    }

    #[test]
    fn email() {
        assert!(EMAIL.is_some());
        assert!(Format::Email.check("jane.doe@example.com").is_ok());
        assert!(Format::Email.check("not an email").is_err());
        assert!(Format::Email.check("@example.com").is_err());
    }

    #[test]
    fn hostname() {
        assert!(Format::Hostname.check("example.com").is_ok());
        assert!(Format::Hostname.check("a-b.c_d.org").is_ok());
        assert!(Format::Hostname.check("-bad.com").is_err());
        assert!(Format::Hostname.check("bad-.com").is_err());
        assert!(Format::Hostname.check("a..b").is_err());
        assert!(Format::Hostname.check("1234").is_err());
        assert!(Format::Hostname.check(&"a".repeat(64)).is_err());
    }

    #[test]
    fn ip_addresses() {
        assert!(Format::Ipv4.check("192.168.0.1").is_ok());
        assert!(Format::Ipv4.check("256.1.1.1").is_err());
        assert!(Format::Ipv4.check("::1").is_err());
        assert!(Format::Ipv6.check("::1").is_ok());
        assert!(Format::Ipv6.check("fe80::1ff:fe23:4567:890a").is_ok());
        assert!(Format::Ipv6.check("192.168.0.1").is_err());
    }

    #[test]
    fn uri() {
        assert!(Format::Uri.check("https://example.com/a?b=c").is_ok());
        assert!(Format::Uri.check("mailto:jane@example.com").is_ok());
        assert!(Format::Uri.check("relative/path").is_err());
    }
}
