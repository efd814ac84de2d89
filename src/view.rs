//! Pure projections from backend data to what the screen shows.
//!
//! Nothing here touches the terminal. The widgets in `ui` draw these values
//! into the area they are given, and the `print` subcommand writes them as
//! plain text.

use crate::age::{classify_age, AgeBucket};
use crate::model::{CategorizedFeed, ChannelPreferences};
use crate::util::sanitize_line;
use chrono::{DateTime, Utc};
use std::fmt::{self, Write};

pub const NO_CONTENT: &str = "No content available";
pub const NO_VIDEOS: &str = "No videos available";
pub const NO_CATEGORIES: &str = "No categories yet";
pub const LOADING_VIDEOS: &str = "Loading videos...";

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardView {
    /// The feed had no categories at all.
    NoContent,
    Sections(Vec<SectionView>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionView {
    pub title: String,
    pub body: SectionBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    Cards(Vec<VideoCard>),
    NoVideos,
}

/// One rendered video. Text fields are already stripped of control sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCard {
    pub title: String,
    pub url: String,
    pub channel: String,
    pub age: AgeBucket,
}

/// Project a feed: one section per category in feed order, one card per video.
pub fn render(feed: &CategorizedFeed, now: DateTime<Utc>) -> DashboardView {
    if feed.is_empty() {
        return DashboardView::NoContent;
    }

    let sections = feed
        .categories()
        .iter()
        .map(|category| {
            let body = if category.videos.is_empty() {
                SectionBody::NoVideos
            } else {
                SectionBody::Cards(
                    category
                        .videos
                        .iter()
                        .map(|video| VideoCard {
                            title: sanitize_line(&video.title).into_owned(),
                            url: video.url.clone(),
                            channel: sanitize_line(&video.channel).into_owned(),
                            age: classify_age(now, video.published_at),
                        })
                        .collect(),
                )
            };
            SectionView {
                title: sanitize_line(&category.name).into_owned(),
                body,
            }
        })
        .collect();

    DashboardView::Sections(sections)
}

impl SectionView {
    pub fn cards(&self) -> &[VideoCard] {
        match &self.body {
            SectionBody::Cards(cards) => cards,
            SectionBody::NoVideos => &[],
        }
    }
}

impl DashboardView {
    pub fn sections(&self) -> &[SectionView] {
        match self {
            Self::NoContent => &[],
            Self::Sections(sections) => sections,
        }
    }

    /// Number of selectable cards across all sections.
    pub fn card_count(&self) -> usize {
        self.sections().iter().map(|s| s.cards().len()).sum()
    }

    /// Card at a flat index counted across sections.
    pub fn card(&self, index: usize) -> Option<&VideoCard> {
        self.sections().iter().flat_map(|s| s.cards()).nth(index)
    }

    /// Write the view as indented plain text.
    pub fn write_text<W: Write>(&self, out: &mut W) -> fmt::Result {
        match self {
            Self::NoContent => writeln!(out, "{}", NO_CONTENT),
            Self::Sections(sections) => {
                for (i, section) in sections.iter().enumerate() {
                    if i > 0 {
                        writeln!(out)?;
                    }
                    writeln!(out, "{}", section.title)?;
                    match &section.body {
                        SectionBody::NoVideos => writeln!(out, "  {}", NO_VIDEOS)?,
                        SectionBody::Cards(cards) => {
                            for card in cards {
                                writeln!(
                                    out,
                                    "  {:>4}  {}  [{}]",
                                    card.age.to_string(),
                                    card.title,
                                    card.channel
                                )?;
                                writeln!(out, "        {}", card.url)?;
                            }
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// Channel Manager
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerView {
    NoCategories,
    Categories(Vec<CategoryTags>),
}

/// A category with its channel tags, each channel shown once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTags {
    pub name: String,
    pub channels: Vec<String>,
}

/// One selectable line of the manager list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerRow {
    Category(usize),
    Channel { category: usize, channel: usize },
}

/// Names stay exactly as the backend sent them, since mutations address
/// categories and channels by these names. Sanitize at draw time.
pub fn manager_view(prefs: &ChannelPreferences) -> ManagerView {
    if prefs.is_empty() {
        return ManagerView::NoCategories;
    }

    ManagerView::Categories(
        prefs
            .categories()
            .iter()
            .map(|c| {
                let mut channels: Vec<String> = Vec::with_capacity(c.channels.len());
                for channel in &c.channels {
                    if !channels.contains(channel) {
                        channels.push(channel.clone());
                    }
                }
                CategoryTags {
                    name: c.name.clone(),
                    channels,
                }
            })
            .collect(),
    )
}

impl ManagerView {
    pub fn categories(&self) -> &[CategoryTags] {
        match self {
            Self::NoCategories => &[],
            Self::Categories(categories) => categories,
        }
    }

    /// Flattened rows: each category header followed by its channels.
    pub fn rows(&self) -> Vec<ManagerRow> {
        let mut rows = Vec::new();
        for (ci, category) in self.categories().iter().enumerate() {
            rows.push(ManagerRow::Category(ci));
            rows.extend((0..category.channels.len()).map(|chi| ManagerRow::Channel {
                category: ci,
                channel: chi,
            }));
        }
        rows
    }

    pub fn category_name(&self, row: ManagerRow) -> Option<&str> {
        let index = match row {
            ManagerRow::Category(ci) | ManagerRow::Channel { category: ci, .. } => ci,
        };
        self.categories().get(index).map(|c| c.name.as_str())
    }

    pub fn channel_name(&self, row: ManagerRow) -> Option<&str> {
        match row {
            ManagerRow::Channel { category, channel } => self
                .categories()
                .get(category)
                .and_then(|c| c.channels.get(channel))
                .map(String::as_str),
            ManagerRow::Category(_) => None,
        }
    }

    pub fn write_text<W: Write>(&self, out: &mut W) -> fmt::Result {
        match self {
            Self::NoCategories => writeln!(out, "{}", NO_CATEGORIES),
            Self::Categories(categories) => {
                for category in categories {
                    let name = sanitize_line(&category.name);
                    if category.channels.is_empty() {
                        writeln!(out, "{}: (no channels)", name)?;
                    } else {
                        let channels: Vec<_> =
                            category.channels.iter().map(|c| sanitize_line(c)).collect();
                        writeln!(out, "{}: {}", name, channels.join(", "))?;
                    }
                }
                Ok(())
            }
        }
    }
}
