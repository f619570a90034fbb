use reqwest::Url;

use super::FeedReference;

/// Pagination and filtering for reading a feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivitiesOptions {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub id_gte: Option<String>,
    pub id_gt: Option<String>,
    pub id_lte: Option<String>,
    pub id_lt: Option<String>,
    /// Name of a ranking method configured on the feed group.
    pub ranking: Option<String>,
}

impl ActivitiesOptions {
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }
    pub fn id_lt(mut self, id: impl Into<String>) -> Self {
        self.id_lt = Some(id.into());
        self
    }
    pub fn id_gt(mut self, id: impl Into<String>) -> Self {
        self.id_gt = Some(id.into());
        self
    }
    pub fn ranking(mut self, ranking: impl Into<String>) -> Self {
        self.ranking = Some(ranking.into());
        self
    }

    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![];
        if let Some(limit) = self.limit {
            query.push(("limit".into(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            query.push(("offset".into(), offset.to_string()));
        }
        for (key, value) in [
            ("id_gte", &self.id_gte),
            ("id_gt", &self.id_gt),
            ("id_lte", &self.id_lte),
            ("id_lt", &self.id_lt),
            ("ranking", &self.ranking),
        ] {
            if let Some(value) = value {
                query.push((key.into(), value.clone()));
            }
        }
        query
    }

    /// Options for the page a `next` link points at. The link is a path with
    /// a query string, e.g. `/api/v1.0/feed/user/1/?id_lt=abc&limit=25`.
    pub fn from_next(next: &str) -> Option<ActivitiesOptions> {
        if next.is_empty() {
            return None;
        }
        let url = Url::parse("http://localhost/").ok()?.join(next).ok()?;
        let mut options = ActivitiesOptions::default();
        for (key, value) in url.query_pairs() {
            let value = value.into_owned();
            match key.as_ref() {
                "limit" => options.limit = value.parse().ok(),
                "offset" => options.offset = value.parse().ok(),
                "id_gte" => options.id_gte = Some(value),
                "id_gt" => options.id_gt = Some(value),
                "id_lte" => options.id_lte = Some(value),
                "id_lt" => options.id_lt = Some(value),
                "ranking" => options.ranking = Some(value),
                _ => {}
            }
        }
        Some(options)
    }
}

/// Which notification groups to mark while reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    All,
    Groups(Vec<String>),
}

impl Mark {
    fn to_param(&self) -> String {
        match self {
            Mark::All => "true".into(),
            Mark::Groups(ids) => ids.join(","),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub mark_read: Option<Mark>,
    pub mark_seen: Option<Mark>,
}

impl ReadOptions {
    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![];
        if let Some(mark) = &self.mark_read {
            query.push(("mark_read".into(), mark.to_param()));
        }
        if let Some(mark) = &self.mark_seen {
            query.push(("mark_seen".into(), mark.to_param()));
        }
        query
    }
}

/// Pagination and filtering for follower / following lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowOptions {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    /// Only return relations with these feeds. Ignored for followers.
    pub filter: Vec<FeedReference>,
}

impl FollowOptions {
    pub(crate) fn to_query(&self, with_filter: bool) -> Vec<(String, String)> {
        let mut query = vec![];
        if let Some(limit) = self.limit {
            query.push(("limit".into(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            query.push(("offset".into(), offset.to_string()));
        }
        if with_filter && !self.filter.is_empty() {
            let feeds: Vec<String> = self.filter.iter().map(FeedReference::feed_id).collect();
            query.push(("filter".into(), feeds.join(",")));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::{ActivitiesOptions, FollowOptions, Mark, ReadOptions};
    use crate::feed::FeedReference;

    fn pairs(query: &[(String, String)]) -> Vec<(&str, &str)> {
        query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    #[test]
    fn activities_query() {
        assert!(ActivitiesOptions::default().to_query().is_empty());

        let options = ActivitiesOptions::default()
            .limit(25)
            .offset(5)
            .id_lt("abc")
            .ranking("popularity");
        assert_eq!(
            pairs(&options.to_query()),
            vec![
                ("limit", "25"),
                ("offset", "5"),
                ("id_lt", "abc"),
                ("ranking", "popularity"),
            ]
        );
    }

    #[test]
    fn options_from_next_link() {
        let options = ActivitiesOptions::from_next(
            "/api/v1.0/feed/user/1/?api_key=key&id_lt=e561de8f-00f1-11e4-b400-0cc47a024be0&limit=25",
        )
        .unwrap();
        assert_eq!(
            options,
            ActivitiesOptions::default()
                .limit(25)
                .id_lt("e561de8f-00f1-11e4-b400-0cc47a024be0")
        );
        assert_eq!(ActivitiesOptions::from_next(""), None);
    }

    #[test]
    fn read_query() {
        let read = ReadOptions {
            mark_read: Some(Mark::All),
            mark_seen: Some(Mark::Groups(vec!["a".into(), "b".into()])),
        };
        assert_eq!(
            pairs(&read.to_query()),
            vec![("mark_read", "true"), ("mark_seen", "a,b")]
        );
    }

    #[test]
    fn follow_query() {
        let options = FollowOptions {
            limit: Some(10),
            offset: None,
            filter: vec![FeedReference::new("flat", "1"), FeedReference::new("user", "2")],
        };
        assert_eq!(
            pairs(&options.to_query(true)),
            vec![("limit", "10"), ("filter", "flat:1,user:2")]
        );
        assert_eq!(pairs(&options.to_query(false)), vec![("limit", "10")]);
    }
}
