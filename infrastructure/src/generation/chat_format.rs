//! Chat-completions wire format.
//!
//! Converts tool definitions to JSON Schema function tools, the conversation
//! history to chat messages, and a completion body back to a
//! [`GenerationResponse`].
//!
//! | `param_type` | JSON Schema |
//! |--------------|-------------|
//! | `string`, `number`, `integer`, `boolean`, `object` | same |
//! | `array` | array of strings |
//! | anything else | `string` |

use interconsult_application::{GatewayError, GenerationRequest};
use interconsult_domain::{
    ContentBlock, GenerationResponse, Message, Role, StopReason, ToolDefinition,
};
use serde_json::{Map, Value, json};
use std::collections::HashMap;

pub fn tool_to_schema(tool: &ToolDefinition) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in &tool.parameters {
        let mut prop = Map::new();
        match param.param_type.as_str() {
            "array" => {
                prop.insert("type".to_string(), json!("array"));
                prop.insert("items".to_string(), json!({"type": "string"}));
            }
            t @ ("string" | "number" | "integer" | "boolean" | "object") => {
                prop.insert("type".to_string(), json!(t));
            }
            _ => {
                prop.insert("type".to_string(), json!("string"));
            }
        }
        prop.insert("description".to_string(), json!(param.description));
        if !param.allowed_values.is_empty() {
            prop.insert("enum".to_string(), json!(param.allowed_values));
        }
        properties.insert(param.name.clone(), Value::Object(prop));

        if param.required {
            required.push(json!(param.name));
        }
    }

    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required,
            }
        }
    })
}

fn message_to_json(message: &Message) -> Value {
    match message.role {
        Role::User => json!({"role": "user", "content": message.content}),
        Role::Assistant => {
            let content = if message.content.is_empty() {
                Value::Null
            } else {
                json!(message.content)
            };
            let mut value = json!({"role": "assistant", "content": content});
            if !message.tool_calls.is_empty() {
                let calls: Vec<Value> = message
                    .tool_calls
                    .iter()
                    .enumerate()
                    .map(|(i, call)| {
                        let id = call
                            .native_id
                            .clone()
                            .unwrap_or_else(|| format!("call_{}", i + 1));
                        let arguments =
                            Value::Object(call.arguments.clone().into_iter().collect()).to_string();
                        json!({
                            "id": id,
                            "type": "function",
                            "function": {"name": call.tool_name, "arguments": arguments},
                        })
                    })
                    .collect();
                value["tool_calls"] = json!(calls);
            }
            value
        }
        Role::Tool => {
            let id = message
                .tool_call_id
                .clone()
                .or_else(|| message.tool_name.clone())
                .unwrap_or_default();
            json!({"role": "tool", "tool_call_id": id, "content": message.content})
        }
    }
}

/// Request body for a chat-completions call
pub fn request_body(request: &GenerationRequest, max_tokens: u32, temperature: Option<f32>) -> Value {
    let mut messages = vec![json!({"role": "system", "content": request.system_prompt})];
    messages.extend(request.history.iter().map(message_to_json));

    let mut body = json!({
        "model": request.model.as_str(),
        "messages": messages,
        "max_tokens": max_tokens,
    });
    if let Some(temperature) = temperature {
        body["temperature"] = json!(temperature);
    }
    if !request.tools.is_empty() {
        body["tools"] = json!(request.tools.iter().map(tool_to_schema).collect::<Vec<_>>());
        body["tool_choice"] = json!("auto");
    }
    body
}

fn stop_reason(finish_reason: &str) -> StopReason {
    match finish_reason {
        "stop" => StopReason::EndTurn,
        "tool_calls" | "function_call" => StopReason::ToolUse,
        "length" => StopReason::MaxTokens,
        other => StopReason::Other(other.to_string()),
    }
}

/// Parse a chat-completions response body
///
/// Tool arguments arrive as a JSON string; anything that does not decode to
/// an object is malformed output.
pub fn parse_response(body: &Value) -> Result<GenerationResponse, GatewayError> {
    let choice = body["choices"]
        .get(0)
        .ok_or_else(|| GatewayError::MalformedOutput("response has no choices".to_string()))?;
    let message = &choice["message"];

    let mut content = Vec::new();
    if let Some(text) = message["content"].as_str()
        && !text.is_empty()
    {
        content.push(ContentBlock::Text(text.to_string()));
    }

    if let Some(calls) = message["tool_calls"].as_array() {
        for (i, call) in calls.iter().enumerate() {
            let name = call["function"]["name"].as_str().ok_or_else(|| {
                GatewayError::MalformedOutput(format!("tool call {} has no function name", i + 1))
            })?;
            let raw = call["function"]["arguments"].as_str().unwrap_or("{}");
            let raw = if raw.trim().is_empty() { "{}" } else { raw };
            let input: HashMap<String, Value> = serde_json::from_str(raw).map_err(|e| {
                GatewayError::MalformedOutput(format!("arguments of '{}' are not a JSON object: {}", name, e))
            })?;
            content.push(ContentBlock::ToolUse {
                id: call["id"]
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("call_{}", i + 1)),
                name: name.to_string(),
                input,
            });
        }
    }

    Ok(GenerationResponse {
        content,
        stop_reason: choice["finish_reason"].as_str().map(stop_reason),
        model: body["model"].as_str().map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use interconsult_domain::research::terminal;
    use interconsult_domain::{Model, ToolCall};

    #[test]
    fn test_submission_schema() {
        let schema = tool_to_schema(&terminal::submit_counter_referral());
        let params = &schema["function"]["parameters"];

        assert_eq!(schema["type"], "function");
        assert_eq!(schema["function"]["name"], "submit_counter_referral");
        assert_eq!(params["properties"]["evidence_used"]["type"], "array");
        assert_eq!(params["properties"]["evidence_used"]["items"]["type"], "string");
        assert_eq!(params["properties"]["diagnostic_criteria_met"]["type"], "object");
        assert_eq!(params["properties"]["evidence_level"]["enum"], json!(["A", "B", "C", "D"]));
        assert_eq!(params["required"], json!(["clinical_assessment", "recommendations"]));
    }

    #[test]
    fn test_request_body_history() {
        let call = ToolCall::new("calculate_bmi")
            .with_native_id("call_a")
            .with_arg("weight_kg", 80);
        let request = GenerationRequest::new(Model::Gpt4oMini, "You are a nutrition specialist")
            .with_tools(vec![terminal::submit_counter_referral()])
            .with_history(vec![
                Message::user("Consultation note"),
                Message::assistant("", vec![call.clone()]),
                Message::tool(&call, "{\"bmi\": 26.1}"),
            ]);

        let body = request_body(&request, 1024, Some(0.2));
        let messages = body["messages"].as_array().unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[2]["content"], Value::Null);
        assert_eq!(messages[2]["tool_calls"][0]["id"], "call_a");
        assert_eq!(messages[2]["tool_calls"][0]["function"]["arguments"], "{\"weight_kg\":80}");
        assert_eq!(messages[3]["tool_call_id"], "call_a");
        assert_eq!(body["tools"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_request_body_without_tools() {
        let request = GenerationRequest::new(Model::Gpt4oMini, "system");
        let body = request_body(&request, 512, None);
        assert!(body.get("tools").is_none());
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_parse_tool_call_response() {
        let body = json!({
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{
                "finish_reason": "tool_calls",
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "calculate_chads2vasc", "arguments": "{\"age\": 78, \"sex\": \"female\"}"}
                    }]
                }
            }]
        });

        let response = parse_response(&body).unwrap();
        let calls = response.tool_calls();
        assert_eq!(response.stop_reason, Some(StopReason::ToolUse));
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].get_i64("age"), Some(78));
        assert_eq!(calls[0].native_id.as_deref(), Some("call_1"));
        assert!(response.text_content().is_empty());
    }

    #[test]
    fn test_parse_text_response() {
        let body = json!({"choices": [{"finish_reason": "stop", "message": {"content": "Direct answer"}}]});
        let response = parse_response(&body).unwrap();
        assert_eq!(response.text_content(), "Direct answer");
        assert!(!response.has_tool_calls());
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(parse_response(&json!({"choices": []})), Err(GatewayError::MalformedOutput(_))));

        let bad_args = json!({"choices": [{"message": {"tool_calls": [
            {"id": "c", "function": {"name": "rag_query", "arguments": "{not json"}}
        ]}}]});
        assert!(matches!(parse_response(&bad_args), Err(GatewayError::MalformedOutput(_))));
    }
}
