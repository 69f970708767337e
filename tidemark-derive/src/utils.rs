//! Utility functions for code generation

/// Convert a field name to the SCREAMING_SNAKE_CASE used for field key constants
pub fn constant_case(s: &str) -> String {
    let mut result = String::new();
    let mut prev_lower = false;
    for c in s.trim_start_matches("r#").chars() {
        if c.is_uppercase() && prev_lower {
            result.push('_');
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        result.extend(c.to_uppercase());
    }
    result
}

/// Split a column list written as `"a, b"` or `"a b"`
pub fn split_columns(s: &str) -> Vec<String> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_case() {
        assert_eq!(constant_case("user_id"), "USER_ID");
        assert_eq!(constant_case("name"), "NAME");
        assert_eq!(constant_case("mixedCase"), "MIXED_CASE");
        assert_eq!(constant_case("r#type"), "TYPE");
    }

    #[test]
    fn test_split_columns() {
        assert_eq!(split_columns("a, b"), vec!["a", "b"]);
        assert_eq!(split_columns(" a  b,c "), vec!["a", "b", "c"]);
        assert!(split_columns("").is_empty());
    }
}
