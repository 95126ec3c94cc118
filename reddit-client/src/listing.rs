use crate::api::RedditApiClient;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;
use topposts_core::{CoreError, PostRecord, TimeFilter};
use tracing::debug;

/// A source of ranked subreddit posts.
///
/// The returned stream is lazy, yields at most `limit` records, ends early
/// when the listing runs out, and cannot be restarted. An error item ends
/// the stream.
pub trait ListingSource {
    fn top_posts<'a>(
        &'a self,
        subreddit: &'a str,
        time_filter: TimeFilter,
        limit: u32,
    ) -> BoxStream<'a, Result<PostRecord, CoreError>>;
}

struct Pager {
    remaining: u32,
    after: Option<String>,
    buffered: VecDeque<PostRecord>,
    exhausted: bool,
}

impl ListingSource for RedditApiClient {
    fn top_posts<'a>(
        &'a self,
        subreddit: &'a str,
        time_filter: TimeFilter,
        limit: u32,
    ) -> BoxStream<'a, Result<PostRecord, CoreError>> {
        let pager = Pager {
            remaining: limit,
            after: None,
            buffered: VecDeque::new(),
            exhausted: false,
        };

        stream::try_unfold(pager, move |pager| {
            next_post(self, subreddit, time_filter, pager)
        })
        .boxed()
    }
}

async fn next_post(
    client: &RedditApiClient,
    subreddit: &str,
    time_filter: TimeFilter,
    mut pager: Pager,
) -> Result<Option<(PostRecord, Pager)>, CoreError> {
    loop {
        if pager.remaining == 0 {
            return Ok(None);
        }

        if let Some(post) = pager.buffered.pop_front() {
            pager.remaining -= 1;
            return Ok(Some((post, pager)));
        }

        if pager.exhausted {
            return Ok(None);
        }

        let token = client.access_token().await?;
        let page_size = pager.remaining.min(client.page_size);
        debug!(
            "Fetching page of {} from r/{} (after: {:?})",
            page_size, subreddit, pager.after
        );

        let listing = client
            .get_top_page(
                token.access_token.secret(),
                subreddit,
                time_filter,
                page_size,
                pager.after.as_deref(),
            )
            .await?;

        let children = listing.data.children;
        pager.exhausted = children.is_empty() || listing.data.after.is_none();
        pager.after = listing.data.after;
        pager
            .buffered
            .extend(children.into_iter().map(|child| child.data));
    }
}
