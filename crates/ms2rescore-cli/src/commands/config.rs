use crate::cli::{OutputFormat, ShowConfigArgs};
use crate::error::{CliError, Result};
use ms2rescore::engine::config::Configuration;
use serde_json::Value;

pub async fn run(configuration: Configuration, args: ShowConfigArgs) -> Result<()> {
    let rendered = render(&configuration, args.format)?;
    println!("{}", rendered.trim_end());
    Ok(())
}

pub fn render(configuration: &Configuration, format: OutputFormat) -> Result<String> {
    let value = serde_json::to_value(configuration)
        .map_err(|e| CliError::Other(anyhow::anyhow!("Cannot serialize configuration: {}", e)))?;
    let value = strip_nulls(value);

    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&value).map_err(|e| {
            CliError::Other(anyhow::anyhow!("Cannot render configuration as JSON: {}", e))
        }),
        OutputFormat::Toml => toml::to_string_pretty(&value).map_err(|e| {
            CliError::Other(anyhow::anyhow!("Cannot render configuration as TOML: {}", e))
        }),
    }
}

/// TOML has no null; unset values are left out of either format.
fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ms2rescore::engine::cascade::ConfigCascade;
    use serde_json::json;

    fn default_configuration() -> Configuration {
        ConfigCascade::new().unwrap().parse().unwrap()
    }

    #[test]
    fn nulls_are_removed_recursively() {
        let stripped = strip_nulls(json!({"a": null, "b": {"c": null, "d": 1}, "e": [{"f": null}]}));
        assert_eq!(stripped, json!({"b": {"d": 1}, "e": [{}]}));
    }

    #[test]
    fn defaults_render_as_toml() {
        let rendered = render(&default_configuration(), OutputFormat::Toml).unwrap();
        assert!(rendered.contains("[ms2rescore]"));
        assert!(rendered.contains("psm_file_type = \"infer\""));
        assert!(!rendered.contains("psm_file ="));

        let reparsed: toml::Value = toml::from_str(&rendered).unwrap();
        assert_eq!(
            reparsed["ms2rescore"]["feature_generators"]["ms2pip"]["model"].as_str(),
            Some("HCD")
        );
    }

    #[test]
    fn defaults_render_as_json() {
        let rendered = render(&default_configuration(), OutputFormat::Json).unwrap();
        let reparsed: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(reparsed["ms2rescore"]["processes"], -1);
        assert!(reparsed["ms2rescore"].get("spectrum_path").is_none());
    }
}
