use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;

use crate::auth::Signer;
use crate::error::{Error, Result};

static FEED_PART_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w-]+$").expect("feed part pattern should compile"));

/// Identifies one feed: a feed group slug plus a user id, optionally carrying
/// the token that authorizes requests against it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedReference {
    slug: String,
    user_id: String,
    token: Option<String>,
}

impl FeedReference {
    pub fn new(slug: impl Into<String>, user_id: impl Into<String>) -> FeedReference {
        FeedReference {
            slug: slug.into(),
            user_id: user_id.into(),
            token: None,
        }
    }

    /// Like [`FeedReference::new`], but rejects slugs and user ids the service
    /// would not route.
    pub fn parse(slug: &str, user_id: &str) -> Result<FeedReference> {
        let reference = FeedReference::new(slug, user_id);
        if !FEED_PART_RE.is_match(slug) || !FEED_PART_RE.is_match(user_id) {
            return Err(Error::InvalidFeedId(reference.feed_id()));
        }
        Ok(reference)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> FeedReference {
        self.token = Some(token.into());
        self
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// `slug:user_id`
    pub fn feed_id(&self) -> String {
        format!("{}:{}", self.slug, self.user_id)
    }

    /// `sluguser_id`, the message signed to produce the feed token.
    pub fn signing_message(&self) -> String {
        format!("{}{}", self.slug, self.user_id)
    }

    /// Sets the token once; a reference that already carries one keeps it.
    pub fn sign(&mut self, signer: &impl Signer) -> &str {
        let message = self.signing_message();
        self.token.get_or_insert_with(|| signer.sign(&message))
    }

    pub fn signed(mut self, signer: &impl Signer) -> FeedReference {
        self.sign(signer);
        self
    }

    /// Value of the `Authorization` header for requests scoped to this feed.
    pub fn authorization(&self) -> Option<String> {
        self.token
            .as_ref()
            .map(|token| format!("{} {token}", self.signing_message()))
    }

    /// `slug:user_id` or `slug:user_id token`, the form used in `to` lists.
    pub(crate) fn to_target(&self) -> String {
        match &self.token {
            Some(token) => format!("{}:{} {token}", self.slug, self.user_id),
            None => self.feed_id(),
        }
    }

    /// Inverse of [`FeedReference::to_target`]. Returns `None` for entries of
    /// neither shape.
    pub(crate) fn from_target(entry: &str) -> Option<FeedReference> {
        let (feed, token) = match entry.split_once(' ') {
            Some((feed, token)) => (feed, Some(token)),
            None => (entry, None),
        };
        let (slug, user_id) = feed.split_once(':')?;
        if slug.is_empty() || user_id.is_empty() || user_id.contains(':') {
            return None;
        }
        let reference = FeedReference::new(slug, user_id);
        match token {
            Some(token) if token.is_empty() || token.contains(char::is_whitespace) => None,
            Some(token) => Some(reference.with_token(token)),
            None => Some(reference),
        }
    }
}

impl Display for FeedReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.slug, self.user_id)
    }
}
