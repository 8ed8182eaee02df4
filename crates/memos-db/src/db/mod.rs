//! PostgreSQL repositories
//!
//! One repository per table family, each implementing the matching trait from
//! `crate::repository`.

pub mod activity;
pub mod memo_resource;
pub mod resource;
pub mod system_setting;

pub use activity::PgActivityRepository;
pub use memo_resource::PgMemoResourceRepository;
pub use resource::PgResourceRepository;
pub use system_setting::PgSystemSettingRepository;
