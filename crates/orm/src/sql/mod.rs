//! SQL identifier quoting for the MySQL dialect

/// Escape SQL identifier for safe use in queries
///
/// ```
/// use dbwk_orm::sql::escape_identifier;
///
/// assert_eq!(escape_identifier("articles"), "`articles`");
/// assert_eq!(escape_identifier("odd`name"), "`odd``name`");
/// ```
pub fn escape_identifier(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}
