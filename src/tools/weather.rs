use async_trait::async_trait;
use playground_core::{ToolError, ToolFunction};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WeatherParams {
    /// Name of the city to look up
    pub city: String,
}

/// Mock weather lookup. Always reports the same conditions.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeatherTool;

#[async_trait]
impl ToolFunction for WeatherTool {
    type Params = WeatherParams;
    type Response = String;

    fn name() -> &'static str {
        "get_weather"
    }

    fn description() -> &'static str {
        "Get the current weather for a city"
    }

    async fn execute(&self, params: WeatherParams) -> Result<String, ToolError> {
        let city = params.city.trim();
        if city.is_empty() {
            return Err(ToolError::Execution("city must not be empty".to_string()));
        }
        Ok(format!("The weather in {} is sunny, 5°C.", city))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playground_core::Tool;
    use serde_json::json;

    #[tokio::test]
    async fn test_weather_report() {
        let output = WeatherTool
            .execute(WeatherParams {
                city: "Lisbon".into(),
            })
            .await
            .unwrap();
        assert_eq!(output, "The weather in Lisbon is sunny, 5°C.");
    }

    #[tokio::test]
    async fn test_call_with_raw_arguments() {
        let output = WeatherTool.call(&json!({"city": "Porto"})).await.unwrap();
        assert_eq!(output, "The weather in Porto is sunny, 5°C.");

        let output = WeatherTool
            .call(&json!("{\"city\": \"Braga\"}"))
            .await
            .unwrap();
        assert_eq!(output, "The weather in Braga is sunny, 5°C.");

        assert!(WeatherTool.call(&json!({"town": "Faro"})).await.is_err());
        assert!(WeatherTool.call(&json!({"city": "  "})).await.is_err());
    }

    #[test]
    fn test_schema_requires_city() {
        let schema = WeatherTool::get_schema();
        assert_eq!(schema.function.name, "get_weather");
        let parameters = schema.function.parameters.unwrap();
        assert_eq!(parameters["required"], json!(["city"]));
        assert_eq!(parameters["properties"]["city"]["type"], "string");
    }
}
