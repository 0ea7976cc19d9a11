//! Validation message templates.

pub fn not_found(entity: &str, id: impl std::fmt::Display) -> String {
    format!("{} with Id: {} is not found.", entity, id)
}

pub fn already_exists(field: &str, value: &str) -> String {
    format!("{} {} already exists.", field, value)
}

pub fn not_empty(field: &str) -> String {
    format!("{} can not be empty.", field)
}
