use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Cloud, CDN and hosting vendors an address can be attributed to.
///
/// The numeric ids are part of the persisted blob format: never renumber an
/// existing variant, only append new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Provider {
    /// No block matched
    #[default]
    Unknown = 0,
    /// Amazon Web Services
    Aws = 1,
    /// Alibaba Cloud
    Alibaba = 2,
    /// Microsoft Azure
    Azure = 3,
    /// Cloudflare
    Cloudflare = 4,
    /// DigitalOcean
    Digitalocean = 5,
    /// Fastly
    Fastly = 6,
    /// Google Cloud Platform
    Gcp = 7,
    /// IBM Cloud
    Ibm = 8,
    /// Linode
    Linode = 9,
    /// Oracle Cloud
    Oracle = 10,
    /// OVHcloud
    Ovh = 11,
    /// Scaleway
    Scaleway = 12,
    /// Tencent Cloud
    Tencent = 13,
    /// UCloud
    Ucloud = 14,
    /// Vercel
    Vercel = 15,
    /// Akamai
    Akamai = 16,
}

impl Provider {
    /// Every provider, `Unknown` included, in id order
    pub const ALL: [Self; 17] = [
        Self::Unknown,
        Self::Aws,
        Self::Alibaba,
        Self::Azure,
        Self::Cloudflare,
        Self::Digitalocean,
        Self::Fastly,
        Self::Gcp,
        Self::Ibm,
        Self::Linode,
        Self::Oracle,
        Self::Ovh,
        Self::Scaleway,
        Self::Tencent,
        Self::Ucloud,
        Self::Vercel,
        Self::Akamai,
    ];

    /// Providers a source can be registered for (everything but `Unknown`)
    pub fn attributable() -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(|p| p.is_known())
    }

    /// Stable numeric id used in persisted blobs
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Returns false for the `Unknown` sentinel
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Display name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Aws => "Aws",
            Self::Alibaba => "Alibaba",
            Self::Azure => "Azure",
            Self::Cloudflare => "Cloudflare",
            Self::Digitalocean => "Digitalocean",
            Self::Fastly => "Fastly",
            Self::Gcp => "Gcp",
            Self::Ibm => "Ibm",
            Self::Linode => "Linode",
            Self::Oracle => "Oracle",
            Self::Ovh => "Ovh",
            Self::Scaleway => "Scaleway",
            Self::Tencent => "Tencent",
            Self::Ucloud => "Ucloud",
            Self::Vercel => "Vercel",
            Self::Akamai => "Akamai",
        }
    }

    /// Lowercase key, used for per-provider range files
    #[must_use]
    pub fn slug(self) -> String {
        self.name().to_ascii_lowercase()
    }
}

impl TryFrom<u8> for Provider {
    type Error = CoreError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(id))
            .copied()
            .ok_or(CoreError::UnknownProviderId(id))
    }
}

impl From<Provider> for u8 {
    fn from(provider: Provider) -> Self {
        provider.id()
    }
}

impl FromStr for Provider {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownProviderName(s.to_string()))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
