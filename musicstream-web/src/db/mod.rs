//! Query functions over the musicstream schema
//!
//! Tables are created by `musicstream_common::db::init_database`; this module
//! only reads and writes rows. Every function takes the pool (or a
//! transaction) explicitly and returns `sqlx::Result`.

pub mod episodes;
pub mod notifications;
pub mod podcasts;
pub mod profiles;
pub mod sessions;
pub mod songs;
pub mod users;

/// `%query%` for `LIKE ? ESCAPE '\'`, with `%`, `_` and `\` taken literally
pub fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Timestamp text in the same shape SQLite's `CURRENT_TIMESTAMP` produces
pub fn sql_timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("rock"), "%rock%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern("c:\\x"), "%c:\\\\x%");
        assert_eq!(contains_pattern(""), "%%");
    }

    #[test]
    fn test_sql_timestamp_format() {
        let at = chrono::Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(sql_timestamp(at), "2024-03-09 07:05:01");
    }
}
