use wisharify::Error;
use wisharify::config::{Config, QrConfig};
use wisharify::credentials::WifiCredentials;
use wisharify::qr::{self, WifiPayload};

#[test]
fn payload_from_credentials_matches_wifi_convention() {
    let creds = WifiCredentials {
        ssid: "HomeNet".into(),
        password: "hunter22".into(),
    };
    let payload = WifiPayload::from(&creds);
    assert_eq!(payload.ssid(), "HomeNet");
    assert_eq!(payload.to_string(), "WIFI:T:WPA;S:HomeNet;P:hunter22;;");
}

#[test]
fn default_render_is_square_at_configured_size() {
    let payload = WifiPayload::new("HomeNet", "hunter22");
    let image = qr::render(&payload, &Config::default().qr).expect("render");

    assert_eq!(image.dimensions(), (450, 450));
    // Quiet zone around the code stays white.
    assert_eq!(image.get_pixel(0, 0).0[0], 255);
    assert_eq!(image.get_pixel(449, 449).0[0], 255);
    assert!(image.pixels().any(|p| p.0[0] == 0));
    // Nearest-neighbour scaling keeps the image strictly black and white.
    assert!(image.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
}

#[test]
fn oversized_payload_is_rejected() {
    let payload = WifiPayload::new("HomeNet", "x".repeat(4000));
    let err = qr::render(&payload, &QrConfig::default()).expect_err("too long for a QR code");
    assert!(matches!(err, Error::Qr(_)));
}

#[test]
fn png_is_written_and_readable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("wifi.png");
    let payload = WifiPayload::new("HomeNet", "hunter22");
    let style = QrConfig {
        box_size: 4,
        border: 2,
        image_size: 200,
    };

    let image = qr::render(&payload, &style).expect("render");
    qr::save_png(&image, &path).expect("save png");

    let reloaded = image::open(&path).expect("reopen png").to_luma8();
    assert_eq!(reloaded.dimensions(), (200, 200));
    assert_eq!(reloaded.as_raw(), image.as_raw());
}
