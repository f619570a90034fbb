//! Feed handles and the operations shared by every feed variant.

mod options;
mod reference;
mod variant;

use std::marker::PhantomData;

use jiff::civil::DateTime;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::activity::{self, Activity, time};
use crate::client::Client;
use crate::error::{Error, Result};
use crate::http::{ApiRequest, HttpTransport, Transport};

pub use options::{ActivitiesOptions, FollowOptions, Mark, ReadOptions};
pub use reference::FeedReference;
pub use variant::{
    ActivityGroup, Aggregated, AggregatedPage, FeedVariant, Flat, FlatPage, Notification,
    NotificationGroup, NotificationPage,
};

/// A signed handle on one feed, bound to the client that created it.
pub struct Feed<V, T = HttpTransport> {
    client: Client<T>,
    reference: FeedReference,
    _variant: PhantomData<V>,
}

impl<V, T> Clone for Feed<V, T> {
    fn clone(&self) -> Self {
        Feed {
            client: self.client.clone(),
            reference: self.reference.clone(),
            _variant: PhantomData,
        }
    }
}

/// One edge of the follow graph: `feed_id` follows `target_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowRelation {
    pub feed_id: String,
    pub target_id: String,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

#[derive(Serialize)]
struct AddActivitiesRequest<'a> {
    activities: &'a [Box<RawValue>],
}

#[derive(Deserialize)]
struct AddActivitiesResponse {
    #[serde(default)]
    activities: Vec<Box<RawValue>>,
}

#[derive(Serialize)]
struct FollowRequest<'a> {
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    activity_copy_limit: Option<u32>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawFollowRelation {
    feed_id: Option<String>,
    target_id: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct FollowResponse {
    results: Vec<RawFollowRelation>,
}

impl<V: FeedVariant, T: Transport> Feed<V, T> {
    pub(crate) fn new(client: Client<T>, reference: FeedReference) -> Feed<V, T> {
        Feed {
            client,
            reference,
            _variant: PhantomData,
        }
    }

    pub fn reference(&self) -> &FeedReference {
        &self.reference
    }

    /// `slug:user_id`
    pub fn feed_id(&self) -> String {
        self.reference.feed_id()
    }

    /// Token authorizing reads and writes on this feed, e.g. for handing to a
    /// browser client.
    pub fn token(&self) -> &str {
        self.reference.token().unwrap_or_default()
    }

    fn path(&self) -> String {
        format!(
            "feed/{}/{}/",
            self.reference.slug(),
            self.reference.user_id()
        )
    }

    async fn send(&self, request: ApiRequest) -> Result<Vec<u8>> {
        let request = request.authorization(self.reference.authorization());
        self.client.transport().send(request).await
    }

    /// Post one activity. Adding always creates: any `id` on the input is
    /// dropped so the service assigns a fresh one.
    pub async fn add_activity(&self, activity: &Activity) -> Result<Activity> {
        let mut activity = activity.clone();
        activity.id.clear();
        let body = self.client.codec().encode(&activity)?;
        let response = self
            .send(ApiRequest::new(Method::POST, self.path()).body(body))
            .await?;
        self.client.codec().decode(&response)
    }

    /// Post several activities in one request, ids dropped as in
    /// [`Feed::add_activity`].
    pub async fn add_activities(&self, activities: &[Activity]) -> Result<Vec<Activity>> {
        let codec = self.client.codec();
        let mut encoded = Vec::with_capacity(activities.len());
        for activity in activities {
            let mut activity = activity.clone();
            activity.id.clear();
            encoded.push(codec.encode_raw(&activity)?);
        }
        let body = serde_json::to_vec(&AddActivitiesRequest {
            activities: &encoded,
        })
        .map_err(Error::Encode)?;
        let response = self
            .send(ApiRequest::new(Method::POST, self.path()).body(body))
            .await?;
        let response: AddActivitiesResponse =
            serde_json::from_slice(&response).map_err(Error::MalformedPayload)?;
        variant::decode_activities(codec, &response.activities)
    }

    pub async fn remove_activity(&self, activity_id: &str) -> Result<()> {
        let path = format!("{}{activity_id}/", self.path());
        self.send(ApiRequest::new(Method::DELETE, path)).await?;
        Ok(())
    }

    pub async fn remove_activity_by_foreign_id(&self, foreign_id: &str) -> Result<()> {
        activity::check_foreign_id(foreign_id)?;
        let path = format!("{}{foreign_id}/", self.path());
        self.send(ApiRequest::new(Method::DELETE, path).query("foreign_id", "1"))
            .await?;
        Ok(())
    }

    pub async fn activities(&self, options: &ActivitiesOptions) -> Result<V::Page> {
        self.read(options.to_query()).await
    }

    async fn read(&self, query: Vec<(String, String)>) -> Result<V::Page> {
        let mut request = ApiRequest::new(Method::GET, self.path());
        request.query = query;
        let response = self.send(request).await?;
        V::decode_page(self.client.codec(), &response)
    }

    /// Start following `target`, copying up to `copy_limit` of its existing
    /// activities into this feed.
    pub async fn follow(&self, target: &FeedReference, copy_limit: Option<u32>) -> Result<()> {
        let target = target.clone().signed(self.client.signer());
        let body = serde_json::to_vec(&FollowRequest {
            target: target.feed_id(),
            target_token: target.token(),
            activity_copy_limit: copy_limit,
        })
        .map_err(Error::Encode)?;
        let path = format!("{}following/", self.path());
        self.send(ApiRequest::new(Method::POST, path).body(body)).await?;
        Ok(())
    }

    /// Stop following `target`. With `keep_history` the activities already
    /// copied from it stay in this feed.
    pub async fn unfollow(&self, target: &FeedReference, keep_history: bool) -> Result<()> {
        let path = format!("{}following/{}/", self.path(), target.feed_id());
        let mut request = ApiRequest::new(Method::DELETE, path);
        if keep_history {
            request = request.query("keep_history", "1");
        }
        self.send(request).await?;
        Ok(())
    }

    /// Feeds following this one.
    pub async fn followers(&self, options: &FollowOptions) -> Result<Vec<FollowRelation>> {
        let path = format!("{}followers/", self.path());
        self.follow_relations(path, options.to_query(false)).await
    }

    /// Feeds this one follows.
    pub async fn following(&self, options: &FollowOptions) -> Result<Vec<FollowRelation>> {
        let path = format!("{}follows/", self.path());
        self.follow_relations(path, options.to_query(true)).await
    }

    async fn follow_relations(
        &self,
        path: String,
        query: Vec<(String, String)>,
    ) -> Result<Vec<FollowRelation>> {
        let mut request = ApiRequest::new(Method::GET, path);
        request.query = query;
        let response = self.send(request).await?;
        let response: FollowResponse =
            serde_json::from_slice(&response).map_err(Error::MalformedPayload)?;
        Ok(response
            .results
            .into_iter()
            .map(|raw| FollowRelation {
                feed_id: raw.feed_id.unwrap_or_default(),
                target_id: raw.target_id.unwrap_or_default(),
                created_at: raw.created_at.as_deref().and_then(time::parse),
                updated_at: raw.updated_at.as_deref().and_then(time::parse),
            })
            .collect())
    }
}

impl<T: Transport> Feed<Notification, T> {
    /// Read the feed and mark groups as read and/or seen in the same call.
    pub async fn activities_marking(
        &self,
        options: &ActivitiesOptions,
        read: &ReadOptions,
    ) -> Result<NotificationPage> {
        let mut query = options.to_query();
        query.extend(read.to_query());
        self.read(query).await
    }
}
