//! Client for GetStream style activity feeds.
//!
//! ```no_run
//! # async fn run() -> stream_feeds::Result<()> {
//! use stream_feeds::{Activity, ActivitiesOptions, Client, ClientConfig};
//!
//! let client = Client::new(ClientConfig::new("api_key", "api_secret"))?;
//! let feed = client.flat_feed("user", "eric")?;
//! feed.add_activity(&Activity::new("user:eric", "post", "item:1")).await?;
//! let page = feed.activities(&ActivitiesOptions::default().limit(10)).await?;
//! # Ok(())
//! # }
//! ```

pub mod activity;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod http;

pub use activity::{Activity, ActivityCodec, ToPolicy};
pub use auth::{HmacSigner, Signer};
pub use client::Client;
pub use config::ClientConfig;
pub use error::{Error, Result, ServiceError};
pub use feed::{
    ActivitiesOptions, Aggregated, Feed, FeedReference, FeedVariant, Flat, FollowOptions,
    Notification, ReadOptions,
};
pub use http::{ApiRequest, HttpTransport, Transport};
