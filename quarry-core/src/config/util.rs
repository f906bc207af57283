use anyhow::{Context, Result};
use serde::Deserialize;
use serde_yaml::{Deserializer, Value};

/// Parses the supplied string as a config value
pub fn parse_config<'a>(conf_str: impl Into<&'a str>) -> Result<Value> {
    Value::deserialize(Deserializer::from_str(conf_str.into()))
        .context("Failed to parse configuration yaml")
}

/// Returns true if the optional config string is absent or only whitespace
pub fn is_blank(val: &Option<String>) -> bool {
    val.as_deref().map(|s| s.trim().is_empty()).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use serde_yaml::Mapping;

    use super::*;

    #[test]
    fn test_parse_config() {
        let parsed = parse_config("account_name: ab12345").unwrap();

        assert_eq!(
            parsed,
            Value::Mapping({
                let mut map = Mapping::new();
                map.insert(
                    Value::String("account_name".to_string()),
                    Value::String("ab12345".to_string()),
                );
                map
            })
        );
    }

    #[test]
    fn test_parse_config_invalid() {
        assert!(parse_config("@@@").is_err());
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(&None));
        assert!(is_blank(&Some("".into())));
        assert!(is_blank(&Some("  \t".into())));
        assert!(!is_blank(&Some("WH1".into())));
    }
}
