//! Keyword lists and regex patterns shared by the rule modules

use lazy_static::lazy_static;
use regex::Regex;

/// Owner-name markers that suggest a spousal relationship.
///
/// Plain substring matching: a name like "Carl Married" triggers it too, so
/// callers treat the result as a hint, not a finding.
pub const SPOUSAL_MARKERS: &[&str] = &["husband", "wife", "married"];

/// Recognized vesting phrases (California practice)
pub const VESTING_PHRASES: &[&str] = &[
    "sole and separate property",
    "a single man",
    "a single woman",
    "an unmarried man",
    "an unmarried woman",
    "a married man",
    "a married woman",
    "a widow",
    "a widower",
    "husband and wife",
    "wife and husband",
    "spouses",
    "registered domestic partners",
    "community property",
    "community property with right of survivorship",
    "joint tenants",
    "tenants in common",
    "trustee",
    "trust",
    "corporation",
    "limited liability company",
    "llc",
    "partnership",
];

/// The 58 California counties
pub const CALIFORNIA_COUNTIES: &[&str] = &[
    "alameda",
    "alpine",
    "amador",
    "butte",
    "calaveras",
    "colusa",
    "contra costa",
    "del norte",
    "el dorado",
    "fresno",
    "glenn",
    "humboldt",
    "imperial",
    "inyo",
    "kern",
    "kings",
    "lake",
    "lassen",
    "los angeles",
    "madera",
    "marin",
    "mariposa",
    "mendocino",
    "merced",
    "modoc",
    "mono",
    "monterey",
    "napa",
    "nevada",
    "orange",
    "placer",
    "plumas",
    "riverside",
    "sacramento",
    "san benito",
    "san bernardino",
    "san diego",
    "san francisco",
    "san joaquin",
    "san luis obispo",
    "san mateo",
    "santa barbara",
    "santa clara",
    "santa cruz",
    "shasta",
    "sierra",
    "siskiyou",
    "solano",
    "sonoma",
    "stanislaus",
    "sutter",
    "tehama",
    "trinity",
    "tulare",
    "tuolumne",
    "ventura",
    "yolo",
    "yuba",
];

lazy_static! {
    /// `DDD-DDD-DDD` or 8 to 12 bare digits
    pub static ref APN_PATTERN: Regex =
        Regex::new(r"^(?:\d{3}-\d{3}-\d{3}|\d{8,12})$").unwrap();

    pub static ref PO_BOX_PATTERN: Regex =
        Regex::new(r"(?i)\b(?:p\.?\s*o\.?\s*box|post\s+office\s+box)\b").unwrap();

    /// Two-letter state code or "California" near the end of an address
    pub static ref STATE_MARKER_PATTERN: Regex = Regex::new(
        r"(?:,\s*|\s)(?:[A-Z]{2}|California)(?:\s+\d{5}(?:-\d{4})?)?\s*(?:,|$)"
    )
    .unwrap();
}

/// Substring test against [`SPOUSAL_MARKERS`], case-insensitive
pub fn indicates_spousal_relationship(name: &str) -> bool {
    let lower = name.to_lowercase();
    SPOUSAL_MARKERS.iter().any(|m| lower.contains(m))
}

pub fn is_valid_apn(apn: &str) -> bool {
    APN_PATTERN.is_match(apn.trim())
}

pub fn is_po_box(address: &str) -> bool {
    PO_BOX_PATTERN.is_match(address)
}

pub fn has_state_marker(address: &str) -> bool {
    STATE_MARKER_PATTERN.is_match(address.trim())
}

/// Match a county name against the allow-list, ignoring case and a trailing "County"
pub fn is_california_county(county: &str) -> bool {
    let lower = county.trim().to_lowercase();
    let name = lower.strip_suffix(" county").unwrap_or(&lower).trim();
    CALIFORNIA_COUNTIES.contains(&name)
}

pub fn is_recognized_vesting(vesting: &str) -> bool {
    let lower = vesting.to_lowercase();
    VESTING_PHRASES.iter().any(|p| lower.contains(p))
}
