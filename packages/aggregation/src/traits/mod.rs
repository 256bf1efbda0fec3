//! Core trait abstractions.
//!
//! All collaborators are injected through these traits: storage
//! (`UserStore`, `PostingStore`), outbound delivery (`DeliveryChannel`) and
//! scraping (`VacancySource`). No module holds a global instance.

pub mod delivery;
pub mod source;
pub mod store;

pub use delivery::DeliveryChannel;
pub use source::VacancySource;
pub use store::{PostingStore, UserStore};
