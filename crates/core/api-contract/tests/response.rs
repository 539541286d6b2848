use api_contract::{ApiResponse, TelemetryQueryResponse, TelemetryRecordDto};
use serde_json::json;

#[test]
fn range_query_is_wrapped_in_envelope() {
    let response = ApiResponse::success(TelemetryQueryResponse {
        entity_key: "sensor:s-1".to_string(),
        data: vec![TelemetryRecordDto {
            entity_key: "sensor:s-1".to_string(),
            scope: "sensor".to_string(),
            value: 12.0,
            unit: "тонны".to_string(),
            timestamp: "2025-03-01T12:00:00+00:00".to_string(),
            quality: 1,
            tags: vec![],
        }],
    });
    let value = serde_json::to_value(&response).expect("serialize");
    assert_eq!(value["success"], true);
    assert!(value["error"].is_null());
    assert_eq!(value["data"]["entityKey"], "sensor:s-1");
    assert_eq!(value["data"]["data"][0]["unit"], "тонны");
}

#[test]
fn error_envelope_has_no_data() {
    let response =
        ApiResponse::<()>::error("TELEMETRY.QUERY_FAILED", "failed to retrieve telemetry data");
    let value = serde_json::to_value(&response).expect("serialize");
    assert_eq!(
        value,
        json!({
            "success": false,
            "data": null,
            "error": {
                "code": "TELEMETRY.QUERY_FAILED",
                "message": "failed to retrieve telemetry data"
            }
        })
    );
}
