//! Ethernet MAC address.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 48-bit Ethernet MAC address.
///
/// Ordering is byte-wise, most significant octet first, so a MAC can be
/// used directly as the trailing component of an ordered FDB key.
///
/// ```
/// use sonic_types::MacAddress;
///
/// let mac: MacAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
/// assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
/// assert!(MacAddress::ZERO < mac);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// All-zero address. Used by hardware flush requests to mean "every MAC in the domain".
    pub const ZERO: MacAddress = MacAddress([0; 6]);

    /// Broadcast address (ff:ff:ff:ff:ff:ff).
    pub const BROADCAST: MacAddress = MacAddress([0xff; 6]);

    pub const fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 6]
    }

    pub fn is_broadcast(&self) -> bool {
        self.0 == [0xff; 6]
    }

    /// Group bit (I/G) of the first octet.
    pub const fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// Returns true if this address can be learned on a bridge port.
    pub fn is_learnable(&self) -> bool {
        !self.is_zero() && !self.is_multicast()
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = ParseError;

    /// Accepts `aa:bb:cc:dd:ee:ff` and `aa-bb-cc-dd-ee-ff`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidMacAddress(s.to_string());
        let sep = if s.contains('-') { '-' } else { ':' };

        let mut bytes = [0u8; 6];
        let mut count = 0;
        for octet in s.split(sep) {
            if count == 6 || octet.is_empty() || octet.len() > 2 {
                return Err(invalid());
            }
            bytes[count] = u8::from_str_radix(octet, 16).map_err(|_| invalid())?;
            count += 1;
        }
        if count != 6 {
            return Err(invalid());
        }
        Ok(MacAddress(bytes))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> String {
        mac.to_string()
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_both_separators() {
        let a: MacAddress = "00:11:22:33:44:55".parse().unwrap();
        let b: MacAddress = "00-11-22-33-44-55".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_bytes(), &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("".parse::<MacAddress>().is_err());
        assert!("00:11:22:33:44".parse::<MacAddress>().is_err());
        assert!("00:11:22:33:44:55:66".parse::<MacAddress>().is_err());
        assert!("00:11:22:33:44:zz".parse::<MacAddress>().is_err());
        assert!("000:11:22:33:44:55".parse::<MacAddress>().is_err());
        assert!("00::22:33:44:55".parse::<MacAddress>().is_err());
    }

    #[test]
    fn test_ordering_is_bytewise() {
        let low = MacAddress::new([0x00, 0xff, 0xff, 0xff, 0xff, 0xff]);
        let high = MacAddress::new([0x01, 0x00, 0x00, 0x00, 0x00, 0x00]);
        assert!(low < high);
        assert!(MacAddress::ZERO < low);
        assert!(high < MacAddress::BROADCAST);
    }

    #[test]
    fn test_learnable() {
        let unicast: MacAddress = "aa:bb:cc:dd:ee:fe".parse().unwrap();
        let multicast: MacAddress = "01:00:5e:00:00:01".parse().unwrap();
        assert!(unicast.is_learnable());
        assert!(!multicast.is_learnable());
        assert!(!MacAddress::ZERO.is_learnable());
        assert!(!MacAddress::BROADCAST.is_learnable());
    }

    #[test]
    fn test_serde_as_string() {
        let mac = MacAddress::new([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        let s: String = mac.into();
        assert_eq!(s, "aa:bb:cc:dd:ee:ff");
        assert_eq!(MacAddress::try_from(s).unwrap(), mac);
    }
}
