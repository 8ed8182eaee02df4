//! Effective visibility of a resource, aggregated from the memos that reference it.
//!
//! Recomputed on every check: memo visibility can change between requests.

use memos_core::models::Visibility;
use memos_core::AppError;
use memos_db::MemoResourceRepository;
use std::sync::Arc;

/// Public beats Protected beats Private; no references means Private.
pub fn aggregate_visibility<I>(visibilities: I) -> Visibility
where
    I: IntoIterator<Item = Visibility>,
{
    let mut effective = Visibility::Private;
    for visibility in visibilities {
        if visibility == Visibility::Public {
            return Visibility::Public;
        }
        effective = effective.max(visibility);
    }
    effective
}

#[derive(Clone)]
pub struct VisibilityResolver {
    memo_resources: Arc<dyn MemoResourceRepository>,
}

impl VisibilityResolver {
    pub fn new(memo_resources: Arc<dyn MemoResourceRepository>) -> Self {
        Self { memo_resources }
    }

    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, resource_id: i32) -> Result<Visibility, AppError> {
        let links = self.memo_resources.list_memo_resources(resource_id).await?;
        if links.is_empty() {
            return Ok(Visibility::Private);
        }

        let memo_ids: Vec<i32> = links.iter().map(|link| link.memo_id).collect();
        let visibilities = self.memo_resources.get_memo_visibilities(&memo_ids).await?;

        Ok(aggregate_visibility(visibilities))
    }
}
