//! Protocol-level integration tests for weather-mcp.
//!
//! Drives the ProtocolHandler with decoded JSON-RPC messages, the same way
//! both transports do, against a seeded simulated provider.

use std::sync::Arc;

use serde_json::{json, Value};

use weather::SimulatedProvider;
use weather_mcp::dispatch::{Dispatcher, DispatcherConfig};
use weather_mcp::handlers::build_registry;
use weather_mcp::protocol::ProtocolHandler;
use weather_mcp::types::*;

// ─────────────────────── helpers ───────────────────────

fn handler_with(config: DispatcherConfig) -> ProtocolHandler {
    let provider = Arc::new(SimulatedProvider::seeded(7));
    let registry = build_registry(provider).unwrap();
    let dispatcher = Dispatcher::with_config(Arc::new(registry), config);
    ProtocolHandler::new(Arc::new(dispatcher))
}

fn handler() -> ProtocolHandler {
    handler_with(DispatcherConfig::default())
}

fn mcp_request(id: i64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
}

fn init_request() -> Value {
    mcp_request(
        0,
        "initialize",
        json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": { "name": "test-client", "version": "1.0" }
        }),
    )
}

fn tool_call(id: i64, name: &str, arguments: Value) -> Value {
    mcp_request(id, "tools/call", json!({ "name": name, "arguments": arguments }))
}

async fn send(handler: &ProtocolHandler, msg: Value) -> Option<Value> {
    let parsed: JsonRpcMessage = serde_json::from_value(msg).unwrap();
    handler.handle_message(parsed).await.map(|r| r.to_value())
}

async fn send_unwrap(handler: &ProtocolHandler, msg: Value) -> Value {
    send(handler, msg).await.expect("expected response")
}

/// Parse the first text block of a tools/call result.
fn tool_text(resp: &Value) -> Value {
    let text = resp["result"]["content"][0]["text"]
        .as_str()
        .expect("text content");
    serde_json::from_str(text).unwrap()
}

fn assert_error(resp: &Value, code: i64, kind: &str) {
    assert!(resp.get("result").is_none(), "unexpected success: {resp}");
    assert_eq!(resp["error"]["code"], code, "wrong code: {resp}");
    assert_eq!(resp["error"]["data"]["kind"], kind, "wrong kind: {resp}");
}

// ─────────────────────── handshake ───────────────────────

#[tokio::test]
async fn initialize_advertises_registered_kinds() {
    let h = handler();
    let resp = send_unwrap(&h, init_request()).await;

    assert_eq!(resp["id"], 0);
    let result = &resp["result"];
    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert_eq!(result["serverInfo"]["name"], "weather-mcp");
    assert!(result["capabilities"]["tools"].is_object());
    assert!(result["capabilities"]["resources"].is_object());
    assert!(result["capabilities"]["prompts"].is_object());
}

#[tokio::test]
async fn initialized_notification_has_no_reply() {
    let h = handler();
    send_unwrap(&h, init_request()).await;
    assert!(!h.is_initialized().await);

    let note = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });
    assert!(send(&h, note).await.is_none());
    assert!(h.is_initialized().await);
}

#[tokio::test]
async fn ping_answers_empty_object() {
    let h = handler();
    let resp = send_unwrap(&h, mcp_request(3, "ping", Value::Null)).await;
    assert_eq!(resp["result"], json!({}));
}

#[tokio::test]
async fn unknown_method_is_method_not_found() {
    let h = handler();
    let resp = send_unwrap(&h, mcp_request(4, "weather/teleport", json!({}))).await;
    assert_error(&resp, -32601, "MethodNotFound");
    assert_eq!(resp["id"], 4);
}

#[tokio::test]
async fn wrong_jsonrpc_version_is_invalid_request() {
    let h = handler();
    let msg = json!({ "jsonrpc": "1.0", "id": 5, "method": "ping" });
    let resp = send_unwrap(&h, msg).await;
    assert_error(&resp, -32600, "InvalidRequest");
}

#[tokio::test]
async fn shutdown_sets_the_flag() {
    let h = handler();
    assert!(!h.shutdown_requested());
    let resp = send_unwrap(&h, mcp_request(6, "shutdown", Value::Null)).await;
    assert_eq!(resp["result"], json!({}));
    assert!(h.shutdown_requested());
}

// ─────────────────────── listings ───────────────────────

#[tokio::test]
async fn tools_list_describes_both_tools() {
    let h = handler();
    let resp = send_unwrap(&h, mcp_request(1, "tools/list", json!({}))).await;
    let tools = resp["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
    assert_eq!(names, ["get_weather", "get_forecast"]);

    let forecast = &tools[1]["inputSchema"];
    assert_eq!(forecast["type"], "object");
    assert_eq!(forecast["required"], json!(["city"]));
    assert_eq!(forecast["properties"]["days"]["default"], 3);
    assert_eq!(forecast["properties"]["days"]["type"], "integer");
    assert_eq!(forecast["properties"]["days"]["minimum"], 1);
    assert_eq!(forecast["properties"]["days"]["maximum"], 16);
}

#[tokio::test]
async fn templated_resource_is_listed_as_template() {
    let h = handler();
    let concrete = send_unwrap(&h, mcp_request(1, "resources/list", json!({}))).await;
    assert_eq!(concrete["result"]["resources"], json!([]));

    let templates = send_unwrap(&h, mcp_request(2, "resources/templates/list", json!({}))).await;
    let list = templates["result"]["resourceTemplates"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["uriTemplate"], "weather://{city}");
    assert_eq!(list[0]["name"], "City Weather");
}

#[tokio::test]
async fn prompts_list_names_city_argument() {
    let h = handler();
    let resp = send_unwrap(&h, mcp_request(1, "prompts/list", json!({}))).await;
    let prompts = resp["result"]["prompts"].as_array().unwrap();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0]["name"], "analyze_weather");
    assert_eq!(prompts[0]["arguments"][0]["name"], "city");
    assert_eq!(prompts[0]["arguments"][0]["required"], true);
}

// ─────────────────────── tools ───────────────────────

#[tokio::test]
async fn get_weather_reports_in_range_values() {
    let h = handler();
    let resp = send_unwrap(&h, tool_call(10, "get_weather", json!({ "city": "Tokyo" }))).await;
    assert_eq!(resp["id"], 10);

    let reading = tool_text(&resp);
    assert_eq!(reading, resp["result"]["structuredContent"]);
    assert_eq!(reading["city"], "Tokyo");

    let temperature = reading["temperature"].as_f64().unwrap();
    let humidity = reading["humidity"].as_f64().unwrap();
    let wind = reading["wind_speed"].as_f64().unwrap();
    assert!((10.0..=35.0).contains(&temperature));
    assert!((30.0..=90.0).contains(&humidity));
    assert!((5.0..=25.0).contains(&wind));

    let condition = reading["condition"].as_str().unwrap();
    assert!(["Sunny", "Cloudy", "Rainy", "Partly Cloudy", "Stormy"].contains(&condition));
}

#[tokio::test]
async fn get_forecast_returns_requested_days_in_order() {
    let h = handler();
    let resp = send_unwrap(
        &h,
        tool_call(11, "get_forecast", json!({ "city": "Oslo", "days": 5 })),
    )
    .await;

    let days = tool_text(&resp);
    let days = days.as_array().unwrap();
    assert_eq!(days.len(), 5);
    for (i, day) in days.iter().enumerate() {
        assert_eq!(day["day"], i as u64 + 1);
        assert_eq!(day["city"], "Oslo");
        assert_ne!(day["condition"], "Stormy");
    }
}

#[tokio::test]
async fn get_forecast_defaults_to_three_days() {
    let h = handler();
    let resp = send_unwrap(&h, tool_call(12, "get_forecast", json!({ "city": "Lima" }))).await;
    assert_eq!(tool_text(&resp).as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn non_positive_days_are_invalid_arguments() {
    let h = handler();
    for days in [0, -1] {
        let resp = send_unwrap(
            &h,
            tool_call(13, "get_forecast", json!({ "city": "Lima", "days": days })),
        )
        .await;
        assert_error(&resp, -32602, "InvalidArguments");
    }
}

#[tokio::test]
async fn oversized_days_are_invalid_arguments() {
    let h = handler();
    for days in [json!(17), json!(4_000_000_000u64)] {
        let resp = send_unwrap(
            &h,
            tool_call(13, "get_forecast", json!({ "city": "Lima", "days": days })),
        )
        .await;
        assert_error(&resp, -32602, "InvalidArguments");
    }

    let resp = send_unwrap(
        &h,
        tool_call(13, "get_forecast", json!({ "city": "Lima", "days": 16 })),
    )
    .await;
    assert_eq!(tool_text(&resp).as_array().unwrap().len(), 16);
}

#[tokio::test]
async fn city_argument_is_echoed_untrimmed() {
    let h = handler();
    let resp = send_unwrap(&h, tool_call(19, "get_weather", json!({ "city": "  Tokyo " }))).await;
    assert_eq!(tool_text(&resp)["city"], "  Tokyo ");
}

#[tokio::test]
async fn missing_city_is_invalid_arguments() {
    let h = handler();
    let resp = send_unwrap(&h, tool_call(14, "get_weather", json!({}))).await;
    assert_error(&resp, -32602, "InvalidArguments");
    assert!(resp["error"]["message"].as_str().unwrap().contains("city"));
}

#[tokio::test]
async fn wrongly_typed_argument_is_invalid_arguments() {
    let h = handler();
    let resp = send_unwrap(&h, tool_call(15, "get_weather", json!({ "city": 42 }))).await;
    assert_error(&resp, -32602, "InvalidArguments");
}

#[tokio::test]
async fn unknown_argument_depends_on_strictness() {
    let args = json!({ "city": "Rome", "units": "metric" });

    let strict = handler();
    let resp = send_unwrap(&strict, tool_call(16, "get_weather", args.clone())).await;
    assert_error(&resp, -32602, "InvalidArguments");

    let lenient = handler_with(DispatcherConfig {
        strict_arguments: false,
    });
    let resp = send_unwrap(&lenient, tool_call(16, "get_weather", args)).await;
    assert_eq!(tool_text(&resp)["city"], "Rome");
}

#[tokio::test]
async fn unknown_tool_is_capability_not_found() {
    let h = handler();
    let resp = send_unwrap(&h, tool_call(17, "get_traffic", json!({ "city": "Rome" }))).await;
    assert_error(&resp, -32601, "CapabilityNotFound");
}

#[tokio::test]
async fn tool_call_without_params_is_invalid_arguments() {
    let h = handler();
    let resp = send_unwrap(&h, mcp_request(18, "tools/call", Value::Null)).await;
    assert_error(&resp, -32602, "InvalidArguments");
}

// ─────────────────────── resources & prompts ───────────────────────

#[tokio::test]
async fn city_resource_renders_summary() {
    let h = handler();
    let resp = send_unwrap(
        &h,
        mcp_request(20, "resources/read", json!({ "uri": "weather://Paris" })),
    )
    .await;

    let contents = resp["result"]["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 1);
    assert_eq!(contents[0]["uri"], "weather://Paris");
    assert_eq!(contents[0]["mimeType"], "text/plain");
    let text = contents[0]["text"].as_str().unwrap();
    assert!(text.starts_with("Current weather in Paris: "), "{text}");
    assert!(text.contains("°C, Humidity: "));
    assert!(text.ends_with(" km/h"));
}

#[tokio::test]
async fn city_resource_decodes_percent_escapes() {
    let h = handler();
    let resp = send_unwrap(
        &h,
        mcp_request(21, "resources/read", json!({ "uri": "weather://New%20York" })),
    )
    .await;
    let text = resp["result"]["contents"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("Current weather in New York: "), "{text}");
}

#[tokio::test]
async fn unmatched_uri_is_capability_not_found() {
    let h = handler();
    for uri in ["forecast://Paris", "weather://", "weather://a/b"] {
        let resp = send_unwrap(&h, mcp_request(22, "resources/read", json!({ "uri": uri }))).await;
        assert_error(&resp, -32601, "CapabilityNotFound");
    }
}

#[tokio::test]
async fn analyze_prompt_is_a_single_user_message() {
    let h = handler();
    let resp = send_unwrap(
        &h,
        mcp_request(
            30,
            "prompts/get",
            json!({ "name": "analyze_weather", "arguments": { "city": "Cairo" } }),
        ),
    )
    .await;

    let messages = resp["result"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(
        messages[0]["content"]["text"],
        "Analyze the current weather conditions in Cairo and provide recommendations for outdoor activities."
    );
}

#[tokio::test]
async fn prompt_without_city_is_invalid_arguments() {
    let h = handler();
    let resp = send_unwrap(
        &h,
        mcp_request(31, "prompts/get", json!({ "name": "analyze_weather" })),
    )
    .await;
    assert_error(&resp, -32602, "InvalidArguments");
}

#[tokio::test]
async fn string_ids_are_echoed() {
    let h = handler();
    let msg = json!({
        "jsonrpc": "2.0",
        "id": "abc-1",
        "method": "tools/call",
        "params": { "name": "get_weather", "arguments": { "city": "Tokyo" } }
    });
    let resp = send_unwrap(&h, msg).await;
    assert_eq!(resp["id"], "abc-1");
}
