mod entity;
mod entity_store;
mod error;
mod reference_validator;

pub use entity::Entity;
pub use entity_store::EntityStore;
pub use error::StoreError;
pub use reference_validator::find_dangling_reference;
