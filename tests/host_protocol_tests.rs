// SPDX-License-Identifier: GPL-3.0-only

//! Wire format of the stdio host protocol

use capture_widget::config::WidgetConfig;
use capture_widget::errors::HostError;
use capture_widget::host::stdio::{parse_event, spawn_event_reader};
use capture_widget::host::{Host, HostEvent, HostValue, StdioHost};
use serde_json::{Value, json};

fn output_lines(host: StdioHost<Vec<u8>>) -> Vec<Value> {
    String::from_utf8(host.into_inner())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_outbound_messages() {
    let mut host = StdioHost::new(Vec::new());
    host.ready().unwrap();
    host.set_frame_height(400).unwrap();
    host.set_value(HostValue::Capture {
        data: "data:image/jpeg;base64,AAAA".to_string(),
        timestamp: 1_700_000_000_000,
    })
    .unwrap();
    host.set_value(HostValue::error("Camera is busy")).unwrap();

    assert_eq!(
        output_lines(host),
        vec![
            json!({"type": "ready"}),
            json!({"type": "set_frame_height", "height": 400}),
            json!({"type": "set_value", "value": {
                "type": "capture",
                "data": "data:image/jpeg;base64,AAAA",
                "timestamp": 1_700_000_000_000i64
            }}),
            json!({"type": "set_value", "value": {
                "type": "error",
                "message": "Camera is busy"
            }}),
        ]
    );
}

#[test]
fn test_parse_render_event() {
    let event = parse_event(r#"{"type":"render","active":true,"interval_seconds":3}"#).unwrap();
    assert_eq!(
        event,
        Some(HostEvent::Render(WidgetConfig::new(true, Some(3))))
    );
}

#[test]
fn test_parse_render_with_missing_interval() {
    let event = parse_event(r#"{"type":"render","active":true}"#).unwrap();
    assert_eq!(event, Some(HostEvent::Render(WidgetConfig::new(true, None))));
}

#[test]
fn test_parse_unload_and_blank() {
    assert_eq!(
        parse_event(r#"{"type":"unload"}"#).unwrap(),
        Some(HostEvent::Unload)
    );
    assert_eq!(parse_event("   ").unwrap(), None);
}

#[test]
fn test_parse_rejects_unknown_type() {
    assert!(matches!(
        parse_event(r#"{"type":"resize"}"#),
        Err(HostError::Protocol(_))
    ));
}

#[tokio::test]
async fn test_reader_unloads_at_end_of_input() {
    let input: &'static [u8] = b"{\"type\":\"render\",\"active\":false}\ngarbage\n";
    let mut events = spawn_event_reader(input);

    assert_eq!(
        events.recv().await,
        Some(HostEvent::Render(WidgetConfig::new(false, None)))
    );
    assert_eq!(events.recv().await, Some(HostEvent::Unload));
    assert_eq!(events.recv().await, None);
}
