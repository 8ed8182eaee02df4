//! Business logic behind the HTTP handlers.

pub mod external_fetch;
pub mod resource_lifecycle;
pub mod visibility;

pub use external_fetch::{ExternalFetcher, FetchedFile};
pub use resource_lifecycle::{
    ResourceContent, ResourceRepositories, ResourceService, ServedResource,
};
pub use visibility::{aggregate_visibility, VisibilityResolver};
