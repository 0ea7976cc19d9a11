//! Request extractors that fail with `InvalidModel`.

mod validated_json;

pub use validated_json::{FilterQuery, IdPath, ValidatedJson};
