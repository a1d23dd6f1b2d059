use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Address in the address space of a running (stopped) target.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct RelocatedAddress(usize);

impl RelocatedAddress {
    pub fn offset(self, offset: isize) -> RelocatedAddress {
        if offset >= 0 {
            self.0.wrapping_add(offset as usize)
        } else {
            self.0.wrapping_sub(offset.unsigned_abs())
        }
        .into()
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    pub fn as_u64(self) -> u64 {
        u64::from(self)
    }

    pub fn as_usize(self) -> usize {
        usize::from(self)
    }
}

impl From<usize> for RelocatedAddress {
    fn from(addr: usize) -> Self {
        RelocatedAddress(addr)
    }
}

impl From<u64> for RelocatedAddress {
    fn from(addr: u64) -> Self {
        RelocatedAddress(addr as usize)
    }
}

impl From<RelocatedAddress> for usize {
    fn from(addr: RelocatedAddress) -> Self {
        addr.0
    }
}

impl From<RelocatedAddress> for u64 {
    fn from(addr: RelocatedAddress) -> Self {
        addr.0 as u64
    }
}

impl Display for RelocatedAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format!("{:#016X}", self.0))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid address `{0}`, expect hexadecimal number with `0x` prefix")]
pub struct AddressParseError(String);

impl FromStr for RelocatedAddress {
    type Err = AddressParseError;

    /// Parse address from strings like `0x7FFF0010` (prefix is required).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| AddressParseError(s.to_string()))?;
        usize::from_str_radix(digits, 16)
            .map(RelocatedAddress)
            .map_err(|_| AddressParseError(s.to_string()))
    }
}

impl Serialize for RelocatedAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:#X}", self.0))
    }
}

struct AddressVisitor;

impl<'de> Visitor<'de> for AddressVisitor {
    type Value = RelocatedAddress;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("an unsigned integer or a hexadecimal string like \"0x401000\"")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(RelocatedAddress::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        u64::try_from(v)
            .map(RelocatedAddress::from)
            .map_err(|_| E::custom(format!("negative address {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for RelocatedAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AddressVisitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_address_from_str() {
        struct TestCase {
            string: &'static str,
            result: Option<usize>,
        }
        let cases = [
            TestCase {
                string: "0x401000",
                result: Some(0x401000),
            },
            TestCase {
                string: " 0X7FFE0010 ",
                result: Some(0x7ffe0010),
            },
            TestCase {
                string: "401000",
                result: None,
            },
            TestCase {
                string: "0xZZ",
                result: None,
            },
        ];

        for tc in cases {
            let addr = tc.string.parse::<RelocatedAddress>().ok();
            assert_eq!(addr.map(usize::from), tc.result, "input: {}", tc.string);
        }
    }

    #[test]
    fn test_address_display() {
        assert_eq!(RelocatedAddress::from(0x200_usize).to_string(), "0x00000000000200");
    }
}
