use crate::models::{HydratedItem, ListKind, MediaType, TrackingItem};
use crate::tmdb::TmdbClient;
use futures::future::join_all;
use tracing::{debug, info, instrument};

/// Upper bound on metadata lookups per list request.
pub const MAX_HYDRATED: usize = 35;

/// Resolves each tracking item to its TMDB record, concurrently.
///
/// Only the first [`MAX_HYDRATED`] items are considered. An item is dropped
/// when it has no resolvable id or its detail lookup fails; the survivors
/// keep their input order.
#[instrument(skip(tmdb, items), fields(count = items.len()))]
pub async fn hydrate(tmdb: &TmdbClient, items: &[TrackingItem], kind: ListKind) -> Vec<HydratedItem> {
    let lookups = items
        .iter()
        .take(MAX_HYDRATED)
        .map(|item| hydrate_one(tmdb, item, kind));

    let hydrated: Vec<HydratedItem> = join_all(lookups).await.into_iter().flatten().collect();

    info!(
        "Hydrated {} of {} {:?} items",
        hydrated.len(),
        items.len().min(MAX_HYDRATED),
        kind
    );
    hydrated
}

async fn hydrate_one(tmdb: &TmdbClient, item: &TrackingItem, kind: ListKind) -> Option<HydratedItem> {
    let Some((media_type, id)) = item.metadata_target() else {
        debug!("Dropping item without a TMDB id");
        return None;
    };

    let record = match tmdb.details(media_type, id).await {
        Ok(record) => record,
        Err(e) => {
            debug!("Dropping {} {}: {}", media_type, id, e);
            return None;
        }
    };

    let episode_image = match (media_type, &item.episode) {
        (MediaType::Tv, Some(episode)) => tmdb
            .episode_still(id, episode.season, episode.number)
            .await
            .unwrap_or_else(|e| {
                debug!("No still for {} S{}E{}: {}", id, episode.season, episode.number, e);
                None
            }),
        _ => None,
    };

    Some(HydratedItem::build(item, media_type, kind, record, episode_image))
}
