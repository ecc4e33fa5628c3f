pub mod archive;
pub mod document;
pub mod importer;
pub mod listing;
pub mod mapping;
pub mod materializer;
pub mod source;

pub use crate::domain::model::{Entity, Offer, RealtyObject, Site};
pub use crate::domain::ports::EntityStore;
pub use crate::utils::error::Result;
