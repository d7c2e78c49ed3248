#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn packet(key: &str, value: &str) -> Vec<u8> {
    let body = format!("{} {}\n", key, value);
    let mut out = format!("{:04x}", body.len() + 4).into_bytes();
    out.extend_from_slice(body.as_bytes());
    out
}

/// v1 macaroon with a `login.ubuntu.com` third-party caveat
pub fn root_macaroon(caveat_id: &str) -> String {
    let mut raw = Vec::new();
    raw.extend(packet("location", "myapps.developer.ubuntu.com"));
    raw.extend(packet("identifier", "root-id"));
    raw.extend(packet("cid", caveat_id));
    raw.extend(packet("vid", "verification"));
    raw.extend(packet("cl", "login.ubuntu.com"));
    raw.extend(packet("signature", "signature"));
    URL_SAFE.encode(raw)
}

/// Serve the ACL and discharge endpoints of a successful login
pub async fn mount_login(server: &MockServer, root: &str, discharge: &str) {
    Mock::given(method("POST"))
        .and(path("/dev/api/acl/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"macaroon": root})))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v2/tokens/discharge"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"discharge_macaroon": discharge})),
        )
        .mount(server)
        .await;
}

pub fn snap_info(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "snap-id": format!("{}-id", name),
        "channel-map": [{
            "channel": {
                "architecture": "amd64",
                "name": "stable",
                "risk": "stable",
                "track": "latest",
                "released-at": "2026-10-01T12:00:00.000000+00:00"
            },
            "revision": 42,
            "version": "2.0",
            "type": "app",
            "download": {"url": "https://api.snapcraft.io/download/x_42.snap", "size": 4096}
        }],
        "snap": {"summary": "A brand snap", "publisher": {"id": "p1", "username": "brand"}}
    })
}
