#![allow(clippy::unwrap_used)]
// Relay routes served on a loopback listener, driven over real HTTP.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use aircon_api::{
    FanSetting, GatewayError, GatewayFactory, GatewaySettings, ModeRequest, RelayClient,
    TransportConfig, VendorGateway,
};
use aircon_core::{CommandRelay, RelayConfig};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;

// ── Helpers ─────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Failure {
    Auth,
    Api,
    NotFound,
    Other,
}

struct Vendor {
    builds: AtomicUsize,
    failure: Mutex<Option<Failure>>,
    commands: Mutex<Vec<(i64, ModeRequest)>>,
}

impl Vendor {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            builds: AtomicUsize::new(0),
            failure: Mutex::new(None),
            commands: Mutex::new(Vec::new()),
        })
    }

    fn failing(failure: Failure) -> Arc<Self> {
        let vendor = Self::new();
        *vendor.failure.lock().unwrap() = Some(failure);
        vendor
    }

    fn answer(&self, value: Value) -> Result<Value, GatewayError> {
        match *self.failure.lock().unwrap() {
            None => Ok(value),
            Some(Failure::Auth) => Err(GatewayError::authentication("token rejected")),
            Some(Failure::Api) => Err(GatewayError::api(Some(503), "Service Unavailable")),
            Some(Failure::NotFound) => Err(GatewayError::other("Device 9 not found")),
            Some(Failure::Other) => Err(GatewayError::other("socket hang up")),
        }
    }
}

struct FakeGateway(Arc<Vendor>);

impl VendorGateway for FakeGateway {
    async fn login(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn list_homes(&self) -> Result<Value, GatewayError> {
        self.0.answer(json!([{ "HomeID": 12, "Name": "Casa" }]))
    }

    async fn list_devices(&self, home_id: i64) -> Result<Value, GatewayError> {
        assert_eq!(home_id, 12);
        self.0.answer(json!({
            "1": { "deviceId": 1, "deviceName": "Living", "modeId": 0, "targetTemperature": 22 }
        }))
    }

    async fn get_device_status(&self, _home_id: i64, device_id: i64) -> Result<Value, GatewayError> {
        if device_id == 404 {
            return self.0.answer(Value::Null);
        }
        self.0.answer(json!({
            "deviceId": device_id, "deviceName": "Living", "modeId": 1,
            "targetTemperature": 22, "temperature": 24.3
        }))
    }

    async fn set_mode(&self, device_id: i64, request: &ModeRequest) -> Result<Value, GatewayError> {
        self.0
            .commands
            .lock()
            .unwrap()
            .push((device_id, request.clone()));
        self.0.answer(json!({ "accepted": true }))
    }
}

struct FakeFactory(Arc<Vendor>);

impl GatewayFactory for FakeFactory {
    type Gateway = FakeGateway;

    fn build(&self, _settings: GatewaySettings) -> Result<FakeGateway, GatewayError> {
        self.0.builds.fetch_add(1, Ordering::SeqCst);
        Ok(FakeGateway(self.0.clone()))
    }
}

async fn spawn_with(vendor: &Arc<Vendor>, config: RelayConfig) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let relay = Arc::new(CommandRelay::from_config(FakeFactory(vendor.clone()), config));
    tokio::spawn(aircon_relay::serve(listener, relay));
    Url::parse(&format!("http://{addr}")).unwrap()
}

async fn spawn(vendor: &Arc<Vendor>) -> Url {
    spawn_with(vendor, RelayConfig::new("jane@example.com", "secret")).await
}

async fn get(base: &Url, path: &str) -> (u16, Value) {
    let resp = reqwest::get(base.join(path).unwrap()).await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

async fn post(base: &Url, path: &str, body: &Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(base.join(path).unwrap())
        .json(body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

// ── Routes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn ping_answers_pong() {
    let base = spawn(&Vendor::new()).await;
    assert_eq!(get(&base, "/api/ping").await, (200, json!({ "message": "pong" })));
}

#[tokio::test]
async fn relay_client_round_trip() {
    let vendor = Vendor::new();
    let base = spawn(&vendor).await;
    let client = RelayClient::new(base, &TransportConfig::default()).unwrap();

    let homes = client.list_homes().await.unwrap();
    assert_eq!(homes.len(), 1);
    assert_eq!(homes[0].id, 12);

    let devices = client.list_devices(12).await.unwrap();
    assert_eq!(devices[0].device_name, "Living");

    let device = client.get_device_status(12, 1).await.unwrap().unwrap();
    assert_eq!(device.mode_id, Some(1));
    assert_eq!(device.temperature, Some(24.3));

    let request = ModeRequest {
        mode: "cool".into(),
        target_temperature: 22.0,
        fan: Some(FanSetting::Mid),
        flags: None,
    };
    let result = client.set_device_mode(1, &request).await.unwrap();
    assert_eq!(result["accepted"], json!(true));
    assert_eq!(vendor.commands.lock().unwrap()[0], (1, request));
}

#[tokio::test]
async fn devices_are_keyed_by_id() {
    let base = spawn(&Vendor::new()).await;
    let (status, body) = get(&base, "/api/bgh/homes/12/devices").await;
    assert_eq!(status, 200);
    assert_eq!(body["devices"]["1"]["deviceName"], "Living");
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let base = spawn(&Vendor::new()).await;
    let (status, body) = get(&base, "/api/bgh/nowhere").await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], "NOT_FOUND");
}

// ── Boundary validation ─────────────────────────────────────────────

#[tokio::test]
async fn invalid_ids_never_reach_the_vendor() {
    let vendor = Vendor::new();
    let base = spawn(&vendor).await;

    for path in [
        "/api/bgh/homes/abc/devices",
        "/api/bgh/homes/1.5/devices",
        "/api/bgh/homes/12/devices/NaN",
    ] {
        let (status, body) = get(&base, path).await;
        assert_eq!(status, 400, "{path}");
        assert_eq!(body["code"], "INVALID_PARAMETER", "{path}");
    }

    let (status, body) = post(
        &base,
        "/api/bgh/devices/x/mode",
        &json!({ "mode": "cool", "targetTemperature": 22 }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "INVALID_PARAMETER");
    assert_eq!(vendor.builds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_bodies_are_rejected() {
    let vendor = Vendor::new();
    let base = spawn(&vendor).await;

    for body in [
        json!({ "targetTemperature": 22 }),
        json!({ "mode": "", "targetTemperature": 22 }),
        json!({ "mode": "cool", "targetTemperature": "hot" }),
        json!({ "mode": "cool", "targetTemperature": 22, "fan": "turbo" }),
        json!({ "mode": "cool", "targetTemperature": 22, "flags": "x" }),
    ] {
        let (status, answer) = post(&base, "/api/bgh/devices/1/mode", &body).await;
        assert_eq!(status, 400, "{body}");
        assert_eq!(answer["code"], "INVALID_BODY", "{body}");
    }

    let resp = reqwest::Client::new()
        .post(base.join("/api/bgh/devices/1/mode").unwrap())
        .body("mode=cool")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    assert!(vendor.commands.lock().unwrap().is_empty());
}

// ── Relay failures ──────────────────────────────────────────────────

#[tokio::test]
async fn relay_failures_map_to_status_classes() {
    let cases = [
        (Failure::Auth, 401, "AUTHENTICATION_ERROR"),
        (Failure::Api, 502, "UPSTREAM_ERROR"),
        (Failure::NotFound, 404, "NOT_FOUND"),
        (Failure::Other, 500, "UNEXPECTED_ERROR"),
    ];
    for (failure, expected_status, expected_code) in cases {
        let base = spawn(&Vendor::failing(failure)).await;
        let (status, body) = get(&base, "/api/bgh/homes/12/devices/9").await;
        assert_eq!(status, expected_status);
        assert_eq!(body["code"], expected_code);
        assert!(body["message"].is_string());
    }
}

#[tokio::test]
async fn absent_device_is_404() {
    let base = spawn(&Vendor::new()).await;
    let (status, body) = get(&base, "/api/bgh/homes/12/devices/404").await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn missing_credentials_are_a_configuration_error() {
    let vendor = Vendor::new();
    let base = spawn_with(&vendor, RelayConfig::default()).await;

    let (status, body) = get(&base, "/api/bgh/homes").await;

    assert_eq!(status, 500);
    assert_eq!(body["code"], "CONFIGURATION_ERROR");
    assert_eq!(vendor.builds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn relay_client_surfaces_error_messages() {
    let base = spawn(&Vendor::failing(Failure::Auth)).await;
    let client = RelayClient::new(base, &TransportConfig::default()).unwrap();

    let err = client.list_homes().await.unwrap_err();

    assert!(err.is_auth_failure());
    assert_eq!(
        err.to_string(),
        "Vendor authentication failed while listing homes."
    );
}
