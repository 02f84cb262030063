//! Platform glue
//!
//! Browser-only pieces (device signal detection, the animation frame
//! scheduler, visibility and DOM events) live in `web`. Parsing of the host
//! page's configuration attributes is shared so it can be tested natively.

#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::sim::FieldConfig;

/// Largest balloon count accepted from the page
pub const MAX_BALLOON_COUNT: usize = 64;

/// Split a comma-separated pool (`"P, B,,T"` -> `["P", "B", "T"]`)
pub fn parse_pool(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Build a field config from the host page's attributes.
///
/// `lookup` returns the raw attribute value for a key (`count`, `labels`,
/// `colors`, `seed`). Missing or malformed values keep the defaults.
pub fn field_config_from_attrs(
    lookup: impl Fn(&str) -> Option<String>,
    width: f32,
    height: f32,
    fallback_seed: u64,
) -> FieldConfig {
    let mut config = FieldConfig {
        width,
        height,
        seed: fallback_seed,
        ..Default::default()
    };

    if let Some(raw) = lookup("count") {
        match raw.trim().parse::<usize>() {
            Ok(n) if n > MAX_BALLOON_COUNT => {
                log::warn!("Balloon count {} too large, using {}", n, MAX_BALLOON_COUNT);
                config.balloon_count = MAX_BALLOON_COUNT;
            }
            Ok(n) => config.balloon_count = n,
            Err(_) => log::warn!("Ignoring balloon count '{}'", raw),
        }
    }
    if let Some(raw) = lookup("labels") {
        config.labels = parse_pool(&raw);
    }
    if let Some(raw) = lookup("colors") {
        config.colors = parse_pool(&raw);
    }
    if let Some(seed) = lookup("seed").and_then(|s| s.trim().parse().ok()) {
        config.seed = seed;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_pool() {
        assert_eq!(parse_pool("P, B,,T "), ["P", "B", "T"]);
        assert!(parse_pool(" , ").is_empty());
    }

    #[test]
    fn test_config_from_attrs() {
        let attrs: HashMap<&str, &str> = [
            ("count", "4"),
            ("labels", "P,B"),
            ("colors", "#f00, #0f0"),
            ("seed", "42"),
        ]
        .into_iter()
        .collect();
        let config = field_config_from_attrs(|k| attrs.get(k).map(|v| v.to_string()), 320.0, 480.0, 1);
        assert_eq!(config.balloon_count, 4);
        assert_eq!(config.labels, ["P", "B"]);
        assert_eq!(config.colors, ["#f00", "#0f0"]);
        assert_eq!(config.seed, 42);
        assert_eq!((config.width, config.height), (320.0, 480.0));
    }

    #[test]
    fn test_bad_attrs_keep_defaults() {
        let config = field_config_from_attrs(
            |k| match k {
                "count" => Some("lots".into()),
                "seed" => Some("-".into()),
                _ => None,
            },
            100.0,
            100.0,
            7,
        );
        assert_eq!(config.balloon_count, FieldConfig::default().balloon_count);
        assert_eq!(config.seed, 7);

        let config = field_config_from_attrs(|_| Some("1000".into()), 1.0, 1.0, 0);
        assert_eq!(config.balloon_count, MAX_BALLOON_COUNT);
    }
}
