pub mod extractor;
pub mod repair;

pub use extractor::{extract, NameKind};
pub use repair::{decode_objects, repair};
