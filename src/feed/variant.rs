//! Flat, aggregated and notification feeds share every operation and differ
//! only in the shape of the page returned when reading them.

use jiff::civil::DateTime;
use serde::Deserialize;
use serde_json::value::RawValue;

use super::options::ActivitiesOptions;
use crate::activity::{Activity, ActivityCodec, time};
use crate::error::{Error, Result};

pub trait FeedVariant: Send + Sync + 'static {
    type Page;

    /// Feed group type as the service names it.
    const NAME: &'static str;

    fn decode_page(codec: &ActivityCodec, body: &[u8]) -> Result<Self::Page>;
}

#[derive(Debug, Clone, Copy)]
pub struct Flat;
#[derive(Debug, Clone, Copy)]
pub struct Aggregated;
#[derive(Debug, Clone, Copy)]
pub struct Notification;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatPage {
    pub results: Vec<Activity>,
    pub next: String,
    pub duration: String,
}

/// Activities the service grouped under one aggregation key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityGroup {
    pub id: String,
    pub verb: String,
    pub group: String,
    pub activity_count: u64,
    pub actor_count: u64,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedPage {
    pub results: Vec<ActivityGroup>,
    pub next: String,
    pub duration: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationGroup {
    pub group: ActivityGroup,
    pub is_read: bool,
    pub is_seen: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationPage {
    pub results: Vec<NotificationGroup>,
    pub next: String,
    pub duration: String,
    pub unread: u64,
    pub unseen: u64,
}

macro_rules! impl_next_options {
    ($page:ident) => {
        impl $page {
            /// Options to fetch the following page, if there is one.
            pub fn next_options(&self) -> Option<ActivitiesOptions> {
                ActivitiesOptions::from_next(&self.next)
            }
        }
    };
}

impl_next_options!(FlatPage);
impl_next_options!(AggregatedPage);
impl_next_options!(NotificationPage);

#[derive(Deserialize)]
#[serde(default)]
struct RawPage<T> {
    results: Vec<T>,
    next: Option<String>,
    duration: Option<String>,
    unread: u64,
    unseen: u64,
}

impl<T> Default for RawPage<T> {
    fn default() -> Self {
        RawPage {
            results: vec![],
            next: None,
            duration: None,
            unread: 0,
            unseen: 0,
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawGroup {
    id: Option<String>,
    verb: Option<String>,
    group: Option<String>,
    activity_count: u64,
    actor_count: u64,
    created_at: Option<String>,
    updated_at: Option<String>,
    activities: Vec<Box<RawValue>>,
    is_read: bool,
    is_seen: bool,
}

impl RawGroup {
    fn decode(self, codec: &ActivityCodec) -> Result<ActivityGroup> {
        Ok(ActivityGroup {
            id: self.id.unwrap_or_default(),
            verb: self.verb.unwrap_or_default(),
            group: self.group.unwrap_or_default(),
            activity_count: self.activity_count,
            actor_count: self.actor_count,
            created_at: self.created_at.as_deref().and_then(time::parse),
            updated_at: self.updated_at.as_deref().and_then(time::parse),
            activities: decode_activities(codec, &self.activities)?,
        })
    }
}

pub(crate) fn decode_activities(
    codec: &ActivityCodec,
    activities: &[Box<RawValue>],
) -> Result<Vec<Activity>> {
    activities.iter().map(|raw| codec.decode_raw(raw)).collect()
}

fn raw_page<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<RawPage<T>> {
    serde_json::from_slice(body).map_err(Error::MalformedPayload)
}

impl FeedVariant for Flat {
    type Page = FlatPage;
    const NAME: &'static str = "flat";

    fn decode_page(codec: &ActivityCodec, body: &[u8]) -> Result<FlatPage> {
        let page = raw_page::<Box<RawValue>>(body)?;
        Ok(FlatPage {
            results: decode_activities(codec, &page.results)?,
            next: page.next.unwrap_or_default(),
            duration: page.duration.unwrap_or_default(),
        })
    }
}

impl FeedVariant for Aggregated {
    type Page = AggregatedPage;
    const NAME: &'static str = "aggregated";

    fn decode_page(codec: &ActivityCodec, body: &[u8]) -> Result<AggregatedPage> {
        let page = raw_page::<RawGroup>(body)?;
        Ok(AggregatedPage {
            results: page
                .results
                .into_iter()
                .map(|group| group.decode(codec))
                .collect::<Result<_>>()?,
            next: page.next.unwrap_or_default(),
            duration: page.duration.unwrap_or_default(),
        })
    }
}

impl FeedVariant for Notification {
    type Page = NotificationPage;
    const NAME: &'static str = "notification";

    fn decode_page(codec: &ActivityCodec, body: &[u8]) -> Result<NotificationPage> {
        let page = raw_page::<RawGroup>(body)?;
        let mut results = Vec::with_capacity(page.results.len());
        for raw in page.results {
            let (is_read, is_seen) = (raw.is_read, raw.is_seen);
            results.push(NotificationGroup {
                group: raw.decode(codec)?,
                is_read,
                is_seen,
            });
        }
        Ok(NotificationPage {
            results,
            next: page.next.unwrap_or_default(),
            duration: page.duration.unwrap_or_default(),
            unread: page.unread,
            unseen: page.unseen,
        })
    }
}
