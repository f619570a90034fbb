use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static FOREIGN_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]{8}-[a-z0-9]{4}-[1-5][a-z0-9]{3}-[a-z0-9]{4}-[a-z0-9]{12}$")
        .expect("foreign id pattern should compile")
});

/// Whether `id` has the lowercase UUID (version 1 to 5) shape the service
/// accepts as a foreign id.
pub fn is_valid_foreign_id(id: &str) -> bool {
    FOREIGN_ID_RE.is_match(id)
}

/// Gate used by delete-by-foreign-id, where an empty id is its own error.
pub fn check_foreign_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::MissingForeignId);
    }
    if !is_valid_foreign_id(id) {
        return Err(Error::InvalidForeignId(id.to_string()));
    }
    Ok(())
}
