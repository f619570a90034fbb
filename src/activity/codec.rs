//! Mapping between [`Activity`] and the service's JSON object.
//!
//! The wire object mixes the fixed activity fields with arbitrary metadata at
//! the same level, so encoding builds a loose key/value payload and decoding
//! classifies every key as either a reserved field or metadata.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::value::{RawValue, to_raw_value};
use tracing::trace;

use super::{Activity, foreign_id, is_reserved, time};
use crate::error::{Error, Result};
use crate::feed::FeedReference;

/// What to do with `to` entries that are neither `slug:id` nor
/// `slug:id token`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToPolicy {
    /// Drop the entry and keep decoding.
    #[default]
    Lenient,
    /// Fail the whole decode with [`Error::MalformedToEntry`].
    Strict,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityCodec {
    to_policy: ToPolicy,
}

type Payload = BTreeMap<String, Box<RawValue>>;

/// The two shapes the service uses for `to`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ToField {
    Flat(Vec<String>),
    Nested(Vec<Vec<String>>),
}

impl ActivityCodec {
    pub fn new() -> ActivityCodec {
        ActivityCodec::default()
    }

    pub fn with_to_policy(to_policy: ToPolicy) -> ActivityCodec {
        ActivityCodec { to_policy }
    }

    pub fn to_policy(&self) -> ToPolicy {
        self.to_policy
    }

    pub fn encode(&self, activity: &Activity) -> Result<Vec<u8>> {
        let payload = self.payload(activity)?;
        serde_json::to_vec(&payload).map_err(Error::Encode)
    }

    /// Encode into a raw JSON value, for embedding in a larger request body.
    pub fn encode_raw(&self, activity: &Activity) -> Result<Box<RawValue>> {
        let payload = self.payload(activity)?;
        to_raw_value(&payload).map_err(Error::Encode)
    }

    fn payload(&self, activity: &Activity) -> Result<Payload> {
        let mut payload = Payload::new();

        for (key, value) in &activity.metadata {
            if is_reserved(key) {
                continue;
            }
            payload.insert(key.clone(), raw(value)?);
        }

        payload.insert("actor".into(), raw(&activity.actor)?);
        payload.insert("verb".into(), raw(&activity.verb)?);
        payload.insert("object".into(), raw(&activity.object)?);
        payload.insert("origin".into(), raw(&activity.origin)?);
        if !activity.id.is_empty() {
            payload.insert("id".into(), raw(&activity.id)?);
        }
        if !activity.target.is_empty() {
            payload.insert("target".into(), raw(&activity.target)?);
        }
        if let Some(data) = &activity.data {
            payload.insert("data".into(), data.clone());
        }
        if !activity.foreign_id.is_empty() {
            if !foreign_id::is_valid_foreign_id(&activity.foreign_id) {
                return Err(Error::InvalidForeignId(activity.foreign_id.clone()));
            }
            payload.insert("foreign_id".into(), raw(&activity.foreign_id)?);
        }

        let time = activity.time.unwrap_or_else(time::now);
        payload.insert("time".into(), raw(&time::format(time))?);

        let to: Vec<String> = activity.to.iter().map(FeedReference::to_target).collect();
        if !to.is_empty() {
            payload.insert("to".into(), raw(&to)?);
        }

        Ok(payload)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Activity> {
        let payload: Payload = serde_json::from_slice(bytes).map_err(Error::MalformedPayload)?;
        self.decode_payload(payload)
    }

    /// Decode an activity already split out of a larger response body.
    pub fn decode_raw(&self, raw: &RawValue) -> Result<Activity> {
        self.decode(raw.get().as_bytes())
    }

    fn decode_payload(&self, payload: Payload) -> Result<Activity> {
        let mut activity = Activity::default();

        for (key, value) in payload {
            match key.to_ascii_lowercase().as_str() {
                "id" => decode_string(&key, &value, &mut activity.id),
                "actor" => decode_string(&key, &value, &mut activity.actor),
                "verb" => decode_string(&key, &value, &mut activity.verb),
                "object" => decode_string(&key, &value, &mut activity.object),
                "target" => decode_string(&key, &value, &mut activity.target),
                "origin" => decode_string(&key, &value, &mut activity.origin),
                "foreign_id" => decode_string(&key, &value, &mut activity.foreign_id),
                "time" => {
                    activity.time = serde_json::from_str::<String>(value.get())
                        .ok()
                        .and_then(|time| time::parse(&time));
                }
                "data" => activity.data = Some(value),
                "to" => activity.to = self.decode_to(&value)?,
                _ => {
                    let value: Value = parse(&value)?;
                    activity.metadata.insert(key, value);
                }
            }
        }

        Ok(activity)
    }

    fn decode_to(&self, value: &RawValue) -> Result<Vec<FeedReference>> {
        let Some(field) = serde_json::from_str::<Option<Value>>(value.get())
            .map_err(Error::MalformedPayload)?
        else {
            return Ok(vec![]);
        };
        let entries = match serde_json::from_value::<ToField>(field) {
            Ok(ToField::Flat(entries)) => entries,
            Ok(ToField::Nested(groups)) => {
                let mut entries = Vec::with_capacity(groups.len());
                for group in groups {
                    match group.as_slice() {
                        [feed] => entries.push(feed.clone()),
                        [feed, token] => entries.push(format!("{feed} {token}")),
                        _ => self.reject_to_entry(&format!("{group:?}"))?,
                    }
                }
                entries
            }
            Err(_) => {
                self.reject_to_entry(value.get())?;
                return Ok(vec![]);
            }
        };

        let mut to = Vec::with_capacity(entries.len());
        for entry in entries {
            match FeedReference::from_target(&entry) {
                Some(feed) => to.push(feed),
                None => self.reject_to_entry(&entry)?,
            }
        }
        Ok(to)
    }

    fn reject_to_entry(&self, entry: &str) -> Result<()> {
        match self.to_policy {
            ToPolicy::Lenient => {
                trace!(target: "stream", entry, "skipping malformed to entry");
                Ok(())
            }
            ToPolicy::Strict => Err(Error::MalformedToEntry(entry.to_string())),
        }
    }
}

fn raw<T: serde::Serialize + ?Sized>(value: &T) -> Result<Box<RawValue>> {
    to_raw_value(value).map_err(Error::Encode)
}

fn parse<T: DeserializeOwned>(value: &RawValue) -> Result<T> {
    serde_json::from_str(value.get()).map_err(Error::MalformedPayload)
}

/// Anything but a string leaves the field untouched.
fn decode_string(key: &str, value: &RawValue, field: &mut String) {
    match serde_json::from_str::<Option<String>>(value.get()) {
        Ok(Some(s)) => *field = s,
        Ok(None) => {}
        Err(_) => {
            trace!(target: "stream", key, value = value.get(), "ignoring non-string field");
        }
    }
}
