/// A market the aggregator can search, with the identifier each provider
/// expects for it. `priority` orders the default fan-out (lower first).
#[derive(Debug, PartialEq, Eq)]
pub struct Region {
    pub code: &'static str,
    pub name: &'static str,
    pub adzuna_code: &'static str,
    pub jsearch_code: &'static str,
    pub jooble_location: &'static str,
    pub currency: &'static str,
    pub priority: u8,
}

/// Supported markets, sorted by priority.
pub static REGIONS: &[Region] = &[
    Region {
        code: "IN",
        name: "India",
        adzuna_code: "in",
        jsearch_code: "IN",
        jooble_location: "India",
        currency: "INR",
        priority: 1,
    },
    Region {
        code: "GB",
        name: "United Kingdom",
        adzuna_code: "gb",
        jsearch_code: "GB",
        jooble_location: "United Kingdom",
        currency: "GBP",
        priority: 2,
    },
    Region {
        code: "US",
        name: "United States",
        adzuna_code: "us",
        jsearch_code: "US",
        jooble_location: "United States",
        currency: "USD",
        priority: 3,
    },
    Region {
        code: "AE",
        name: "United Arab Emirates",
        adzuna_code: "ae",
        jsearch_code: "AE",
        jooble_location: "United Arab Emirates",
        currency: "AED",
        priority: 4,
    },
    Region {
        code: "CA",
        name: "Canada",
        adzuna_code: "ca",
        jsearch_code: "CA",
        jooble_location: "Canada",
        currency: "CAD",
        priority: 5,
    },
    Region {
        code: "AU",
        name: "Australia",
        adzuna_code: "au",
        jsearch_code: "AU",
        jooble_location: "Australia",
        currency: "AUD",
        priority: 6,
    },
];

/// Markets queried when the request gives no usable hint.
const DEFAULT_PRIORITY_CUTOFF: u8 = 4;

/// City and country keywords per market, matched as substrings of a
/// lowercased location. Checked in `REGIONS` order so the first market
/// mentioned wins for ambiguous strings.
static LOCATION_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "IN",
        &[
            "india", "mumbai", "delhi", "bangalore", "bengaluru", "hyderabad", "chennai",
            "kolkata", "pune", "ahmedabad", "gurgaon", "gurugram", "noida", "jaipur",
        ],
    ),
    (
        "GB",
        &[
            "united kingdom",
            "uk",
            "london",
            "manchester",
            "birmingham",
            "leeds",
            "glasgow",
            "edinburgh",
            "bristol",
        ],
    ),
    (
        "US",
        &[
            "united states",
            "usa",
            "new york",
            "san francisco",
            "los angeles",
            "chicago",
            "seattle",
            "austin",
            "boston",
            "denver",
        ],
    ),
    ("AE", &["united arab emirates", "uae", "dubai", "abu dhabi", "sharjah"]),
    ("CA", &["canada", "toronto", "vancouver", "montreal", "ottawa", "calgary"]),
    (
        "AU",
        &["australia", "sydney", "melbourne", "brisbane", "perth", "adelaide"],
    ),
];

pub fn find(code: &str) -> Option<&'static Region> {
    REGIONS.iter().find(|r| r.code.eq_ignore_ascii_case(code))
}

pub fn detect_from_location(location: &str) -> Option<&'static Region> {
    let normalized = location.to_lowercase();
    LOCATION_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| normalized.contains(k)))
        .and_then(|(code, _)| find(code))
}

/// Resolves the markets to fan out to: an explicit country wins, then
/// detection from the location text, then the default priority set.
/// Always returns at least one region.
pub fn resolve(location: Option<&str>, country: Option<&str>) -> Vec<&'static Region> {
    if let Some(code) = country
        && let Some(region) = find(code)
    {
        return vec![region];
    }
    if let Some(location) = location
        && let Some(region) = detect_from_location(location)
    {
        return vec![region];
    }
    REGIONS
        .iter()
        .filter(|r| r.priority <= DEFAULT_PRIORITY_CUTOFF)
        .collect()
}
