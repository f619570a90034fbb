use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing::debug;

use crate::activity::{ActivityCodec, ToPolicy};
use crate::auth::HmacSigner;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::feed::{Aggregated, Feed, FeedReference, FeedVariant, Flat, Notification};
use crate::http::{HttpTransport, Transport};

/// Entry point: owns the configuration, the feed signer, the activity codec
/// and the transport. Cheap to clone.
pub struct Client<T = HttpTransport> {
    inner: Arc<ClientInner<T>>,
}

struct ClientInner<T> {
    config: ClientConfig,
    signer: HmacSigner,
    codec: ActivityCodec,
    transport: T,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Client {
            inner: self.inner.clone(),
        }
    }
}

impl Client<HttpTransport> {
    pub fn new(config: ClientConfig) -> Result<Client<HttpTransport>> {
        let transport = HttpTransport::new(&config)?;
        Client::with_transport(config, transport)
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Client<T>> {
        config.validate()?;
        let signer = HmacSigner::new(config.api_secret.expose_secret());
        let to_policy = if config.strict_to_entries {
            ToPolicy::Strict
        } else {
            ToPolicy::Lenient
        };
        debug!(target: "stream", api_key = %config.api_key, base_url = %config.base_url(), ?to_policy, "client created");
        Ok(Client {
            inner: Arc::new(ClientInner {
                config,
                signer,
                codec: ActivityCodec::with_to_policy(to_policy),
                transport,
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }
    pub fn signer(&self) -> &HmacSigner {
        &self.inner.signer
    }
    pub fn codec(&self) -> &ActivityCodec {
        &self.inner.codec
    }
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// A signed handle on `slug:user_id`. Fails with
    /// [`crate::Error::InvalidFeedId`] for parts the service would not route.
    pub fn feed<V: FeedVariant>(&self, slug: &str, user_id: &str) -> Result<Feed<V, T>> {
        let reference = FeedReference::parse(slug, user_id)?.signed(&self.inner.signer);
        Ok(Feed::new(self.clone(), reference))
    }

    pub fn flat_feed(&self, slug: &str, user_id: &str) -> Result<Feed<Flat, T>> {
        self.feed(slug, user_id)
    }
    pub fn aggregated_feed(&self, slug: &str, user_id: &str) -> Result<Feed<Aggregated, T>> {
        self.feed(slug, user_id)
    }
    pub fn notification_feed(&self, slug: &str, user_id: &str) -> Result<Feed<Notification, T>> {
        self.feed(slug, user_id)
    }
}
