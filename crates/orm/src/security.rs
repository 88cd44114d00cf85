//! Identifier safety for generated SQL
//!
//! Values are always bound as parameters. Table and column names cannot be,
//! so they are validated when a model is introspected and quoted whenever a
//! dialect writes them into a statement.

use crate::error::ModelError;

/// Characters allowed in SQL identifiers (alphanumeric, underscore, dollar)
const ALLOWED_IDENTIFIER_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_$";

/// PostgreSQL truncates identifiers longer than this
const MAX_IDENTIFIER_LEN: usize = 63;

/// Quote an identifier with `quote`, doubling any embedded quote characters.
///
/// ```
/// use rowbound_orm::security::escape_identifier;
///
/// assert_eq!(escape_identifier("user_table", '"'), "\"user_table\"");
/// assert_eq!(escape_identifier("table\"name", '"'), "\"table\"\"name\"");
/// ```
pub fn escape_identifier(identifier: &str, quote: char) -> String {
    let doubled: String = [quote, quote].iter().collect();
    let escaped = identifier.replace(quote, &doubled);
    format!("{quote}{escaped}{quote}")
}

/// Check that a table or column name is usable without surprises
pub fn validate_identifier(identifier: &str) -> Result<(), ModelError> {
    let Some(first) = identifier.chars().next() else {
        return Err(ModelError::Configuration("Identifier cannot be empty".to_string()));
    };

    if identifier.len() > MAX_IDENTIFIER_LEN {
        return Err(ModelError::Configuration(format!(
            "Identifier '{}' is too long (max {} characters)",
            identifier, MAX_IDENTIFIER_LEN
        )));
    }

    if let Some(c) = identifier.chars().find(|c| !ALLOWED_IDENTIFIER_CHARS.contains(*c)) {
        return Err(ModelError::Configuration(format!(
            "Identifier '{}' contains invalid character '{}'",
            identifier, c
        )));
    }

    if first.is_ascii_digit() || first == '$' {
        return Err(ModelError::Configuration(format!(
            "Identifier '{}' must start with a letter or underscore",
            identifier
        )));
    }

    Ok(())
}
