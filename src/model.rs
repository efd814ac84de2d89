//! Data contracts exchanged with the dashboard backend.
//!
//! JSON objects keyed by category name keep their key order: the backend
//! decides section order, and the client renders it as received.

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

// ============================================================================
// Video
// ============================================================================

/// A single video as reported by the backend. Never constructed from user input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub title: String,
    pub url: String,
    /// Channel display name.
    pub channel: String,
    #[serde(rename = "publishedAt")]
    pub published_at: DateTime<Utc>,
}

// ============================================================================
// Ordered map decoding
// ============================================================================

/// Visitor collecting a JSON object into `(key, value)` pairs in document order.
///
/// A repeated key replaces the earlier value in place.
struct OrderedEntries<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedEntries<V> {
    type Value = Vec<(String, V)>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object keyed by category name")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries: Vec<(String, V)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => entries.push((key, value)),
            }
        }
        Ok(entries)
    }
}

fn deserialize_ordered<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    deserializer.deserialize_map(OrderedEntries(PhantomData))
}

// ============================================================================
// Categorized Feed
// ============================================================================

/// One dashboard section: a category and its videos in backend order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub videos: Vec<Video>,
}

/// The full payload rendered per refresh. Replaced wholesale, never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizedFeed {
    categories: Vec<Category>,
}

impl CategorizedFeed {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Total number of videos across all categories.
    pub fn video_count(&self) -> usize {
        self.categories.iter().map(|c| c.videos.len()).sum()
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }
}

impl<'de> Deserialize<'de> for CategorizedFeed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = deserialize_ordered::<D, Vec<Video>>(deserializer)?;
        Ok(Self {
            categories: entries
                .into_iter()
                .map(|(name, videos)| Category { name, videos })
                .collect(),
        })
    }
}

impl Serialize for CategorizedFeed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for category in &self.categories {
            map.serialize_entry(&category.name, &category.videos)?;
        }
        map.end()
    }
}

// ============================================================================
// Channel Preferences
// ============================================================================

/// Channels assigned to one category, unique and in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryChannels {
    pub name: String,
    pub channels: Vec<String>,
}

/// Category → channel assignments backing the management view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelPreferences {
    categories: Vec<CategoryChannels>,
}

impl ChannelPreferences {
    /// Build from raw entries, collapsing duplicate channel names per category.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let categories = entries
            .into_iter()
            .map(|(name, raw)| {
                let mut channels: Vec<String> = Vec::with_capacity(raw.len());
                for channel in raw {
                    if !channels.contains(&channel) {
                        channels.push(channel);
                    }
                }
                CategoryChannels { name, channels }
            })
            .collect();
        Self { categories }
    }

    pub fn categories(&self) -> &[CategoryChannels] {
        &self.categories
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn channels(&self, category: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|c| c.name == category)
            .map(|c| c.channels.as_slice())
    }

    pub fn contains(&self, category: &str, channel: &str) -> bool {
        self.channels(category)
            .is_some_and(|channels| channels.iter().any(|c| c == channel))
    }
}

impl<'de> Deserialize<'de> for ChannelPreferences {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = deserialize_ordered::<D, Vec<String>>(deserializer)?;
        Ok(Self::from_entries(entries))
    }
}

impl Serialize for ChannelPreferences {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for category in &self.categories {
            map.serialize_entry(&category.name, &category.channels)?;
        }
        map.end()
    }
}

// ============================================================================
// Duration Setting
// ============================================================================

/// Server-side retention window. The client stores and forwards it verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationSetting {
    pub days: u32,
    pub months: u32,
}

impl DurationSetting {
    pub const DEFAULT_DAYS: u32 = 7;
    pub const DEFAULT_MONTHS: u32 = 0;

    /// Build from raw user input. Each field that is missing or not a
    /// non-negative integer falls back to its default.
    pub fn from_inputs(days: Option<&str>, months: Option<&str>) -> Self {
        fn parse_or(input: Option<&str>, fallback: u32) -> u32 {
            input
                .and_then(|s| s.trim().parse::<u32>().ok())
                .unwrap_or(fallback)
        }

        Self {
            days: parse_or(days, Self::DEFAULT_DAYS),
            months: parse_or(months, Self::DEFAULT_MONTHS),
        }
    }
}

impl Default for DurationSetting {
    fn default() -> Self {
        Self {
            days: Self::DEFAULT_DAYS,
            months: Self::DEFAULT_MONTHS,
        }
    }
}

impl fmt::Display for DurationSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} days, {} months", self.days, self.months)
    }
}

// ============================================================================
// Refresh Outcome
// ============================================================================

/// Response of a backend re-collection.
///
/// `Summary` is tried first; an object without an integer `count` is a feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RefreshOutcome {
    Summary { count: u64 },
    Feed(CategorizedFeed),
}

// ============================================================================
// Tests
// ============================================================================
