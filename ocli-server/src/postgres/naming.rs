//! Identifier validation, quoting and size formatting.

const MAX_IDENTIFIER_LEN: usize = 63;
const RESERVED_NAMES: [&str; 3] = ["template0", "template1", "postgres"];
const SIZE_UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

/// Whether `name` is acceptable as the target of a create/copy/rename/drop.
///
/// 1 to 63 ASCII characters, a letter or underscore first, letters, digits
/// or underscores after that, and none of the built-in databases (compared
/// case-insensitively).
pub fn is_valid_db_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_IDENTIFIER_LEN {
        return false;
    }

    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return false;
    }

    !RESERVED_NAMES
        .iter()
        .any(|reserved| name.eq_ignore_ascii_case(reserved))
}

/// Quote `name` as a SQL identifier, doubling embedded quotes. Anything after
/// a NUL byte is dropped, since the server would truncate there anyway.
pub fn quote_identifier(name: &str) -> String {
    let name = name.split('\0').next().unwrap_or_default();
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Human-readable size with a 1024 base and two decimals: `0 B`, `1.50 KB`.
pub fn format_bytes(bytes: i64) -> String {
    const UNIT: i64 = 1024;
    if bytes < UNIT {
        return format!("{} B", bytes);
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT && exp < SIZE_UNITS.len() - 1 {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    format!("{:.2} {}", bytes as f64 / div as f64, SIZE_UNITS[exp])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        let longest = "x".repeat(63);
        for name in ["a", "_", "odoo_17", "Prod2024", "_staging", longest.as_str()] {
            assert!(is_valid_db_name(name), "{} should be valid", name);
        }
    }

    #[test]
    fn test_invalid_names() {
        let too_long = "x".repeat(64);
        for name in [
            "",
            "1db",
            "my-db",
            "my db",
            "db;drop",
            "café",
            "\"quoted\"",
            too_long.as_str(),
        ] {
            assert!(!is_valid_db_name(name), "{:?} should be invalid", name);
        }
    }

    #[test]
    fn test_reserved_names_any_case() {
        for name in ["postgres", "POSTGRES", "template0", "Template1"] {
            assert!(!is_valid_db_name(name), "{} is reserved", name);
        }
        assert!(is_valid_db_name("postgres_copy"));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("prod"), "\"prod\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_identifier("cut\0here"), "\"cut\"");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(10 * 1024 * 1024), "10.00 MB");
        assert_eq!(format_bytes(1_073_741_824), "1.00 GB");
        assert_eq!(format_bytes(1 << 50), "1.00 PB");
    }
}
