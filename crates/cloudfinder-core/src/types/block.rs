use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::Provider;
use crate::error::{CoreError, Result};

/// Address family of a block, trie or address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// 32-bit IPv4
    V4,
    /// 128-bit IPv6
    V6,
}

impl AddressFamily {
    /// Number of address bits
    #[must_use]
    pub const fn width(self) -> u8 {
        match self {
            Self::V4 => 32,
            Self::V6 => 128,
        }
    }

    /// Family of an address
    #[must_use]
    pub const fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Self::V4,
            IpAddr::V6(_) => Self::V6,
        }
    }

    pub(crate) const fn tag(self) -> u8 {
        match self {
            Self::V4 => 4,
            Self::V6 => 6,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            4 => Some(Self::V4),
            6 => Some(Self::V6),
            _ => None,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4 => write!(f, "ipv4"),
            Self::V6 => write!(f, "ipv6"),
        }
    }
}

/// A network block attributed to a provider.
///
/// The network is always stored in canonical form (host bits zeroed), so
/// `1.2.3.4/24` and `1.2.3.0/24` build the same block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkBlock {
    network: IpNet,
    provider: Provider,
}

impl NetworkBlock {
    /// Create a block, zeroing the host bits of `network`
    #[must_use]
    pub fn new(network: IpNet, provider: Provider) -> Self {
        Self {
            network: network.trunc(),
            provider,
        }
    }

    /// Parse `addr/len` notation; a bare address becomes a host block.
    pub fn parse(s: &str, provider: Provider) -> Result<Self> {
        let s = s.trim();
        let network = match s.parse::<IpNet>() {
            Ok(net) => net,
            Err(_) => s
                .parse::<IpAddr>()
                .map(IpNet::from)
                .map_err(|_| CoreError::InvalidCidr(s.to_string()))?,
        };
        Ok(Self::new(network, provider))
    }

    /// The same network attributed to another provider
    #[must_use]
    pub const fn with_provider(self, provider: Provider) -> Self {
        Self {
            network: self.network,
            provider,
        }
    }

    /// Canonical network
    #[must_use]
    pub const fn network(&self) -> IpNet {
        self.network
    }

    /// Base address (host bits zeroed)
    #[must_use]
    pub fn base(&self) -> IpAddr {
        self.network.network()
    }

    /// Prefix length
    #[must_use]
    pub fn prefix_len(&self) -> u8 {
        self.network.prefix_len()
    }

    /// Address family
    #[must_use]
    pub const fn family(&self) -> AddressFamily {
        match self.network {
            IpNet::V4(_) => AddressFamily::V4,
            IpNet::V6(_) => AddressFamily::V6,
        }
    }

    /// Attributed provider
    #[must_use]
    pub const fn provider(&self) -> Provider {
        self.provider
    }

    /// Whether `addr` falls inside this block
    #[must_use]
    pub fn contains(&self, addr: &IpAddr) -> bool {
        self.network.contains(addr)
    }

    /// Whether this block lies in a private, shared or link-local range
    /// that can never belong to a public cloud.
    #[must_use]
    pub fn is_private(&self) -> bool {
        is_private_network(&self.network)
    }

    /// Stable dedup key: `family|base/len|provider`
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}|{}|{}", self.family(), self.network, self.provider)
    }
}

impl fmt::Display for NetworkBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.network, self.provider)
    }
}

/// Ranges filtered out of routing-table derived data: RFC 1918, shared
/// address space, link-local and IPv6 unique-local / link-local.
fn private_ranges() -> impl Iterator<Item = IpNet> {
    let v4 = [
        (Ipv4Addr::new(10, 0, 0, 0), 8),
        (Ipv4Addr::new(172, 16, 0, 0), 12),
        (Ipv4Addr::new(192, 168, 0, 0), 16),
        (Ipv4Addr::new(100, 64, 0, 0), 10),
        (Ipv4Addr::new(169, 254, 0, 0), 16),
    ]
    .into_iter()
    .filter_map(|(addr, len)| Ipv4Net::new(addr, len).ok().map(IpNet::V4));

    let v6 = [
        (Ipv6Addr::new(0xfc00, 0, 0, 0, 0, 0, 0, 0), 7),
        (Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 0), 10),
    ]
    .into_iter()
    .filter_map(|(addr, len)| Ipv6Net::new(addr, len).ok().map(IpNet::V6));

    v4.chain(v6)
}

/// Whether the base address of `network` lies in a private range
#[must_use]
pub fn is_private_network(network: &IpNet) -> bool {
    let base = network.network();
    private_ranges().any(|range| range.contains(&base))
}

/// Left-align an address in a 128-bit word so that bit `i` of the path is
/// `(bits >> (127 - i)) & 1` for both families.
pub(crate) fn address_bits(addr: IpAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => u128::from(u32::from(v4)) << 96,
        IpAddr::V6(v6) => u128::from(v6),
    }
}

/// Inverse of [`address_bits`]
pub(crate) fn address_from_bits(family: AddressFamily, bits: u128) -> IpAddr {
    match family {
        // Truncation keeps exactly the 32 left-aligned bits.
        #[allow(clippy::cast_possible_truncation)]
        AddressFamily::V4 => IpAddr::V4(Ipv4Addr::from((bits >> 96) as u32)),
        AddressFamily::V6 => IpAddr::V6(Ipv6Addr::from(bits)),
    }
}
