//! Activities and their wire format.

mod codec;
mod foreign_id;
pub mod time;

use std::collections::BTreeMap;

use jiff::civil::DateTime;
use serde_json::Value;
use serde_json::value::RawValue;

use crate::feed::FeedReference;

pub use codec::{ActivityCodec, ToPolicy};
pub use foreign_id::{check_foreign_id, is_valid_foreign_id};

/// Keys with a dedicated field on [`Activity`]. Any other top-level key is
/// metadata.
pub const RESERVED_KEYS: [&str; 10] = [
    "id",
    "actor",
    "verb",
    "object",
    "target",
    "origin",
    "time",
    "foreign_id",
    "data",
    "to",
];

/// One entry of a feed: `actor` performed `verb` on `object`.
#[derive(Debug, Clone, Default)]
pub struct Activity {
    /// Assigned by the service; empty for activities not yet posted.
    pub id: String,
    pub actor: String,
    pub verb: String,
    pub object: String,
    pub target: String,
    pub origin: String,
    /// Caller supplied UUID for idempotent creation and deletion.
    pub foreign_id: String,
    /// Naive UTC wall-clock time. Encoded as the current UTC time when `None`.
    pub time: Option<DateTime>,
    /// Opaque JSON, passed through byte for byte.
    pub data: Option<Box<RawValue>>,
    pub metadata: BTreeMap<String, Value>,
    /// Feeds the activity is copied to on creation.
    pub to: Vec<FeedReference>,
}

impl Activity {
    pub fn new(
        actor: impl Into<String>,
        verb: impl Into<String>,
        object: impl Into<String>,
    ) -> Activity {
        Activity {
            actor: actor.into(),
            verb: verb.into(),
            object: object.into(),
            ..Default::default()
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Activity {
        self.target = target.into();
        self
    }
    pub fn with_foreign_id(mut self, foreign_id: impl Into<String>) -> Activity {
        self.foreign_id = foreign_id.into();
        self
    }
    pub fn with_time(mut self, time: DateTime) -> Activity {
        self.time = Some(time);
        self
    }
    pub fn with_data(mut self, data: Box<RawValue>) -> Activity {
        self.data = Some(data);
        self
    }
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Activity {
        self.metadata.insert(key.into(), value.into());
        self
    }
    pub fn with_to(mut self, feed: FeedReference) -> Activity {
        self.to.push(feed);
        self
    }
}

// `RawValue` has no `PartialEq`; data compares by its exact bytes.
impl PartialEq for Activity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.actor == other.actor
            && self.verb == other.verb
            && self.object == other.object
            && self.target == other.target
            && self.origin == other.origin
            && self.foreign_id == other.foreign_id
            && self.time == other.time
            && self.data.as_ref().map(|d| d.get()) == other.data.as_ref().map(|d| d.get())
            && self.metadata == other.metadata
            && self.to == other.to
    }
}

pub(crate) fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.iter().any(|reserved| reserved.eq_ignore_ascii_case(key))
}
