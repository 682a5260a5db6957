// Query parameters as plain data. Each request kind owns a small struct and
// `pairs()` turns it into key/value pairs; no HTTP involved, easy to test.

use url::Url;

pub trait QueryParams {
    fn pairs(&self) -> Vec<(&'static str, String)>;

    /// Writes the pairs into the url's query string. Leaves the url alone
    /// (no dangling `?`) when there is nothing to write.
    fn apply(&self, url: &mut Url) {
        let pairs = self.pairs();
        if pairs.is_empty() {
            return;
        }
        url.query_pairs_mut()
            .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())));
    }
}

/// For endpoints that take nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoParams;

impl QueryParams for NoParams {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketParams {
    pub market: Option<String>,
}

impl MarketParams {
    pub fn new(market: impl Into<String>) -> Self {
        Self { market: Some(market.into()) }
    }
}

impl QueryParams for MarketParams {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        self.market
            .iter()
            .filter(|m| !m.is_empty())
            .map(|m| ("market", m.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl PageParams {
    pub fn first(limit: u32) -> Self {
        Self { limit: Some(limit), offset: Some(0) }
    }
}

impl QueryParams for PageParams {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    Short,
    Medium,
    Long,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Short => "short_term",
            TimeRange::Medium => "medium_term",
            TimeRange::Long => "long_term",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TopItemsParams {
    pub time_range: Option<TimeRange>,
    pub page: PageParams,
}

impl QueryParams for TopItemsParams {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(range) = self.time_range {
            pairs.push(("time_range", range.as_str().to_string()));
        }
        pairs.extend(self.page.pairs());
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistItemsParams {
    pub market: MarketParams,
    pub page: PageParams,
}

impl QueryParams for PlaylistItemsParams {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.market.pairs();
        pairs.extend(self.page.pairs());
        pairs
    }
}

/// Player commands target a device; `None` lets the remote pick the active one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceParams {
    pub device_id: Option<String>,
}

impl DeviceParams {
    pub fn new(device_id: Option<String>) -> Self {
        Self { device_id }
    }
}

impl QueryParams for DeviceParams {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        self.device_id
            .iter()
            .filter(|id| !id.is_empty())
            .map(|id| ("device_id", id.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipDirection {
    Next,
    Previous,
}

impl SkipDirection {
    /// Path segment under `me/player/`
    pub fn endpoint(&self) -> &'static str {
        match self {
            SkipDirection::Next => "next",
            SkipDirection::Previous => "previous",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipParams {
    pub direction: SkipDirection,
    pub device: DeviceParams,
}

impl QueryParams for SkipParams {
    // direction lives in the path, not the query
    fn pairs(&self) -> Vec<(&'static str, String)> {
        self.device.pairs()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeParams {
    pub percent: u8,
    pub device: DeviceParams,
}

impl QueryParams for VolumeParams {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("volume_percent", self.percent.min(100).to_string())];
        pairs.extend(self.device.pairs());
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueParams {
    pub uri: String,
    pub device: DeviceParams,
}

impl QueryParams for QueueParams {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("uri", self.uri.clone())];
        pairs.extend(self.device.pairs());
        pairs
    }
}

/// Cursor paging for recently played. `after` wins if both are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecentlyPlayedParams {
    pub limit: Option<u32>,
    pub after: Option<i64>,
    pub before: Option<i64>,
}

impl QueryParams for RecentlyPlayedParams {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        match (self.after, self.before) {
            (Some(after), _) => pairs.push(("after", after.to_string())),
            (None, Some(before)) => pairs.push(("before", before.to_string())),
            (None, None) => {}
        }
        pairs
    }
}
