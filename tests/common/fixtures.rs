//! Comment and page fixtures

use serde_json::{Value, json};

/// Seconds since the epoch for 2021-06-01T18:00:00Z
pub const T0: i64 = 1_622_570_400;

/// RFC 3339 timestamp `secs` seconds after the epoch
pub fn timestamp(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0)
        .unwrap()
        .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// A comment node shaped like the API's
pub fn comment_node(id: &str, text: &str, offset: f64, created_secs: i64) -> Value {
    json!({
        "id": id,
        "commenter": { "id": "42", "login": "bob", "displayName": "Bob" },
        "contentOffsetSeconds": offset,
        "createdAt": timestamp(created_secs),
        "message": {
            "fragments": [{ "emote": null, "text": text }],
            "userBadges": [{ "id": "x", "setID": "subscriber", "version": "6" }],
            "userColor": "#1E90FF"
        }
    })
}

/// A response page; every edge carries `cursor`, the last one decides the next page
pub fn page_response(nodes: &[Value], cursor: Option<&str>) -> Value {
    let edges: Vec<Value> = nodes
        .iter()
        .map(|node| json!({ "cursor": cursor, "node": node }))
        .collect();
    json!([{
        "data": {
            "video": {
                "id": "1",
                "creator": { "id": "9", "channel": { "id": "9" } },
                "comments": {
                    "edges": edges,
                    "pageInfo": { "hasNextPage": cursor.is_some(), "hasPreviousPage": false }
                }
            }
        },
        "extensions": { "durationMilliseconds": 12, "operationName": "VideoCommentsByOffsetOrCursor" }
    }])
}

/// Response for an unknown video
pub fn video_not_found_response() -> Value {
    json!([{ "data": { "video": null } }])
}
