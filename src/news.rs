//! fetch → transform → render, run once

use crate::config::Limits;
use crate::container::NewsContainer;
use crate::error::ContainerError;
use crate::feed_funcs::FeedClient;
use crate::render_funcs::NewsView;
use crate::text_funcs::transform_items;

/// Fetch the feed and reduce every outcome to a `NewsView`.
/// Feed errors end here; they are logged, never returned.
pub async fn load_news<F>(client: &F, limits: Limits) -> NewsView
where
    F: FeedClient + ?Sized,
{
    match client.fetch().await {
        Ok(response) => {
            let items = transform_items(&response.items, limits);
            tracing::info!(
                status = %response.status,
                shown = items.len(),
                received = response.items.len(),
                "News loaded"
            );
            NewsView::Items(items)
        }
        Err(err) if err.is_unavailable() => {
            tracing::warn!(error = %err, "Feed reported no usable status");
            NewsView::Unavailable
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to load news");
            NewsView::LoadFailed
        }
    }
}

/// Load the news and mount the result into `container` exactly once.
pub async fn fetch_and_render<F, C>(
    client: &F,
    container: &mut C,
    limits: Limits,
) -> Result<NewsView, ContainerError>
where
    F: FeedClient + ?Sized,
    C: NewsContainer + ?Sized,
{
    let view = load_news(client, limits).await;
    container.mount(&view)?;
    Ok(view)
}
