pub const CONFIG_NODE_NAME: &str = "!CONFIG";

pub const CONFIG_VERSION_NAME: &str = "version";

pub const CONFIG_LOCALE_NAME: &str = "locale";

pub const DEFAULT_VERSION: &str = "1.0";

pub const DEFAULT_LOCALE: &str = "UTF-8";

/// Name of the synthetic attribute every array node carries.
pub const ARRAY_SIZE_NAME: &str = "size";

pub const ARRAY_SUFFIX: &str = "[]";

pub const DEFAULT_CACHE_SIZE: usize = 8192;

pub const MIN_CACHE_SIZE: usize = 128;

/// Longest byte sequence any supported charset needs for one character.
pub const CHAR_MARGIN: usize = 6;

pub const REPLACEMENT_CHAR: char = '\u{FFFD}';

#[inline]
pub fn is_array_name(name: &str) -> bool {
    name.len() > ARRAY_SUFFIX.len() && name.ends_with(ARRAY_SUFFIX)
}

#[inline]
pub fn is_config_attr_name(name: &str) -> bool {
    name == CONFIG_VERSION_NAME || name == CONFIG_LOCALE_NAME
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_is_array_name() {
        assert!(is_array_name("items[]"));
        assert!(is_array_name("a[]"));
        assert!(!is_array_name("[]"));
        assert!(!is_array_name("items"));
        assert!(!is_array_name("items["));
    }

    #[rstest::rstest]
    fn test_is_config_attr_name() {
        assert!(is_config_attr_name("version"));
        assert!(is_config_attr_name("locale"));
        assert!(!is_config_attr_name("Version"));
        assert!(!is_config_attr_name("charset"));
    }

    #[rstest::rstest]
    fn test_margin_fits_below_min_cache() {
        assert!(CHAR_MARGIN < MIN_CACHE_SIZE);
        assert!(MIN_CACHE_SIZE <= DEFAULT_CACHE_SIZE);
    }
}
