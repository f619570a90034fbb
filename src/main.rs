use anyhow::{Context, Result, bail};
use serde_json::value::RawValue;
use stream_feeds::activity::time;
use stream_feeds::feed::{ActivityGroup, FollowRelation};
use stream_feeds::{
    ActivitiesOptions, Activity, Aggregated, Client, ClientConfig, FeedReference, FeedVariant,
    Flat, FollowOptions, Notification,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        /// Read and write GetStream style feeds.
        cmd stream-feeds {
            /// TOML file with api_key, api_secret and friends.
            optional -c, --config path: PathBuf

            /// Post one activity to a feed.
            cmd add {
                /// Feed as slug:user_id.
                required feed: String
                required actor: String
                required verb: String
                required object: String
                optional --target target: String
                optional --foreign-id foreign_id: String
                /// Use a random UUID as the foreign id.
                optional --auto-foreign-id
                /// Raw JSON attached as `data`.
                optional --data data: String
                /// Extra feed (slug:user_id) to copy the activity to.
                repeated --to to: String
            }
            /// Read a page of a feed.
            cmd list {
                required feed: String
                /// flat (default), aggregated or notification.
                optional --kind kind: String
                optional --limit limit: u32
                optional --offset offset: u32
                optional --id-lt id_lt: String
            }
            /// Remove an activity by id, or by foreign id.
            cmd remove {
                required feed: String
                required id: String
                optional --foreign-id
            }
            cmd follow {
                required feed: String
                required target: String
                optional --copy-limit copy_limit: u32
            }
            cmd unfollow {
                required feed: String
                required target: String
                optional --keep-history
            }
            cmd followers {
                required feed: String
                optional --limit limit: u32
            }
            cmd following {
                required feed: String
                optional --limit limit: u32
            }
        }
    }
}

fn parse_feed(input: &str) -> Result<(&str, &str)> {
    input
        .split_once(':')
        .with_context(|| format!("feed {input:?} should look like slug:user_id"))
}

fn print_activity(activity: &Activity) {
    let when = activity.time.map(time::format).unwrap_or_default();
    println!(
        "{} {when} {} {} {}",
        activity.id, activity.actor, activity.verb, activity.object
    );
    if !activity.metadata.is_empty() {
        println!("    {}", serde_json::Value::from_iter(activity.metadata.clone()));
    }
}

fn print_group(group: &ActivityGroup) {
    println!(
        "[{}] {} activities={} actors={}",
        group.group, group.verb, group.activity_count, group.actor_count
    );
    for activity in &group.activities {
        print!("  ");
        print_activity(activity);
    }
}

fn print_relations(relations: &[FollowRelation]) {
    for relation in relations {
        println!("{} -> {}", relation.feed_id, relation.target_id);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let flags = flags::StreamFeeds::from_env_or_exit();
    let config_path = flags.config.unwrap_or_else(|| "stream.toml".into());
    let config = ClientConfig::from_file(&config_path)
        .with_context(|| format!("unable to load {}", config_path.display()))?;
    let client = Client::new(config)?;

    match flags.subcommand {
        flags::StreamFeedsCmd::Add(cmd) => {
            let (slug, user_id) = parse_feed(&cmd.feed)?;
            let feed = client.flat_feed(slug, user_id)?;
            let mut activity = Activity::new(cmd.actor, cmd.verb, cmd.object);
            if let Some(target) = cmd.target {
                activity = activity.with_target(target);
            }
            if let Some(foreign_id) = cmd.foreign_id {
                activity = activity.with_foreign_id(foreign_id);
            } else if cmd.auto_foreign_id {
                activity = activity.with_foreign_id(uuid::Uuid::new_v4().to_string());
            }
            if let Some(data) = cmd.data {
                let data = RawValue::from_string(data).context("--data should be valid JSON")?;
                activity = activity.with_data(data);
            }
            for to in &cmd.to {
                let (slug, user_id) = parse_feed(to)?;
                let target = FeedReference::parse(slug, user_id)?.signed(client.signer());
                activity = activity.with_to(target);
            }
            let created = feed.add_activity(&activity).await?;
            info!(id = %created.id, "activity created");
            print_activity(&created);
        }
        flags::StreamFeedsCmd::List(cmd) => {
            let (slug, user_id) = parse_feed(&cmd.feed)?;
            let options = ActivitiesOptions {
                limit: cmd.limit,
                offset: cmd.offset,
                id_lt: cmd.id_lt,
                ..Default::default()
            };
            match cmd.kind.as_deref().unwrap_or(Flat::NAME) {
                Flat::NAME => {
                    let page = client.flat_feed(slug, user_id)?.activities(&options).await?;
                    page.results.iter().for_each(print_activity);
                }
                Aggregated::NAME => {
                    let page = client
                        .aggregated_feed(slug, user_id)?
                        .activities(&options)
                        .await?;
                    page.results.iter().for_each(print_group);
                }
                Notification::NAME => {
                    let page = client
                        .notification_feed(slug, user_id)?
                        .activities(&options)
                        .await?;
                    println!("unread={} unseen={}", page.unread, page.unseen);
                    page.results.iter().for_each(|n| print_group(&n.group));
                }
                other => bail!("unknown feed kind {other:?}"),
            }
        }
        flags::StreamFeedsCmd::Remove(cmd) => {
            let (slug, user_id) = parse_feed(&cmd.feed)?;
            let feed = client.flat_feed(slug, user_id)?;
            if cmd.foreign_id {
                feed.remove_activity_by_foreign_id(&cmd.id).await?;
            } else {
                feed.remove_activity(&cmd.id).await?;
            }
            info!(id = %cmd.id, "activity removed");
        }
        flags::StreamFeedsCmd::Follow(cmd) => {
            let (slug, user_id) = parse_feed(&cmd.feed)?;
            let (target_slug, target_id) = parse_feed(&cmd.target)?;
            let target = FeedReference::parse(target_slug, target_id)?;
            client
                .flat_feed(slug, user_id)?
                .follow(&target, cmd.copy_limit)
                .await?;
            info!(feed = %cmd.feed, target = %cmd.target, "followed");
        }
        flags::StreamFeedsCmd::Unfollow(cmd) => {
            let (slug, user_id) = parse_feed(&cmd.feed)?;
            let (target_slug, target_id) = parse_feed(&cmd.target)?;
            let target = FeedReference::parse(target_slug, target_id)?;
            client
                .flat_feed(slug, user_id)?
                .unfollow(&target, cmd.keep_history)
                .await?;
            info!(feed = %cmd.feed, target = %cmd.target, "unfollowed");
        }
        flags::StreamFeedsCmd::Followers(cmd) => {
            let (slug, user_id) = parse_feed(&cmd.feed)?;
            let options = FollowOptions {
                limit: cmd.limit,
                ..Default::default()
            };
            let relations = client.flat_feed(slug, user_id)?.followers(&options).await?;
            print_relations(&relations);
        }
        flags::StreamFeedsCmd::Following(cmd) => {
            let (slug, user_id) = parse_feed(&cmd.feed)?;
            let options = FollowOptions {
                limit: cmd.limit,
                ..Default::default()
            };
            let relations = client.flat_feed(slug, user_id)?.following(&options).await?;
            print_relations(&relations);
        }
    }

    Ok(())
}
