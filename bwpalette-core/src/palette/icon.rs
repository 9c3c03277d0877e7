//! Item icons
//!
//! Login items with a web URI use the Bitwarden icon service; everything else
//! gets a glyph the host maps to its own icon set.

use serde::Serialize;
use url::{Host, Url};

use crate::models::{ItemType, VaultItem};

/// Base URL of the favicon service
pub const ICON_SERVICE_URL: &str = "https://icons.bitwarden.net";

/// Domains the icon service has no icon for
const UNAVAILABLE_ICON_DOMAINS: [&str; 2] = ["adobe.com", "account.adobe.com"];

/// Public suffixes with two labels
const TWO_PART_TLDS: [&str; 18] = [
    "co.uk", "co.jp", "co.kr", "co.nz", "co.za", "co.in", "com.au", "com.br", "com.cn", "com.hk",
    "com.mx", "com.sg", "com.tw", "org.uk", "net.au", "gov.uk", "ac.uk", "edu.au",
];

/// Built-in icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Glyph {
    /// Website
    Web,
    /// Payment card
    Card,
    /// Identity
    Identity,
    /// Secure note
    Note,
    /// Anything else
    Lock,
    /// Work in progress
    Loading,
    /// Nothing to show
    Empty,
    /// Search without results
    Search,
}

/// Where an icon comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IconRef {
    /// Remote image
    Url(String),
    /// Built-in glyph
    Glyph(Glyph),
}

/// Icon for a vault item
#[must_use]
pub fn item_icon(item: &VaultItem) -> IconRef {
    match item.item_type {
        ItemType::Login => {
            let domain = item
                .login
                .as_ref()
                .and_then(|l| l.primary_uri())
                .and_then(registrable_domain);
            match domain {
                Some(domain) if !UNAVAILABLE_ICON_DOMAINS.contains(&domain.as_str()) => {
                    IconRef::Url(format!("{ICON_SERVICE_URL}/{domain}/icon.png"))
                }
                _ => IconRef::Glyph(Glyph::Web),
            }
        }
        ItemType::Card => IconRef::Glyph(Glyph::Card),
        ItemType::Identity => IconRef::Glyph(Glyph::Identity),
        ItemType::SecureNote => IconRef::Glyph(Glyph::Note),
        ItemType::Other(_) => IconRef::Glyph(Glyph::Lock),
    }
}

/// Registrable domain of a login URI (`accounts.google.com` -> `google.com`).
///
/// Accepts `http(s)://` URIs and bare host names; app URIs (`android://`,
/// `iosapp://`, ...) and `localhost` yield `None`. IPv4 hosts are returned
/// unchanged.
#[must_use]
pub fn registrable_domain(uri: &str) -> Option<String> {
    let uri = uri.trim();
    let lowered = uri.to_ascii_lowercase();
    let parsed = if lowered.starts_with("http://") || lowered.starts_with("https://") {
        Url::parse(uri).ok()?
    } else if !uri.contains("://") && !lowered.starts_with("android") {
        Url::parse(&format!("http://{}", uri.split('/').next()?)).ok()?
    } else {
        return None;
    };

    match parsed.host()? {
        Host::Ipv4(ip) => Some(ip.to_string()),
        Host::Ipv6(_) => None,
        Host::Domain(host) => domain_of_host(host),
    }
}

fn domain_of_host(host: &str) -> Option<String> {
    let host = host.trim().to_ascii_lowercase();
    if host == "localhost" {
        return None;
    }
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() < 2 {
        return None;
    }
    let suffix = labels[labels.len() - 2..].join(".");
    let keep = if labels.len() >= 3 && TWO_PART_TLDS.contains(&suffix.as_str()) {
        3
    } else {
        2
    };
    Some(labels[labels.len() - keep..].join("."))
}
