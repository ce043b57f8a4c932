use std::cell::RefCell;
use std::time::Duration;

use wisharify::command::CommandRunner;
use wisharify::config::Config;
use wisharify::credentials::{self, PasswordSource};
use wisharify::secrets::{CredentialStore, MemoryStore};
use wisharify::{Error, Result};

/// Answers nmcli invocations from canned output and records every call.
#[derive(Default)]
struct ScriptedRunner {
    wifi: Option<String>,
    connections: Option<String>,
    psk: Option<String>,
    calls: RefCell<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    fn new() -> Self {
        Self::default()
    }

    fn wifi(mut self, output: &str) -> Self {
        self.wifi = Some(output.to_string());
        self
    }

    fn connections(mut self, output: &str) -> Self {
        self.connections = Some(output.to_string());
        self
    }

    fn psk(mut self, output: &str) -> Self {
        self.psk = Some(output.to_string());
        self
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }
}

fn failure(command: String) -> Error {
    Error::Timeout {
        command,
        timeout: Duration::from_secs(1),
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        let mut argv = vec![program.to_string()];
        argv.extend(args.iter().map(|arg| arg.to_string()));
        self.calls.borrow_mut().push(argv.clone());
        let rendered = argv.join(" ");

        let canned = if args.contains(&"-s") {
            &self.psk
        } else if args.contains(&"wifi") {
            &self.wifi
        } else {
            &self.connections
        };
        canned.clone().ok_or_else(|| failure(rendered))
    }
}

const WIFI_LIST: &str = "no:Neighbour\nyes:HomeNet\nno:Cafe\n";
const CONNECTIONS: &str = "yes:802-3-ethernet:0e0e0e0e-0000-0000-0000-00000000000e\n\
                           no:802-11-wireless:00000000-0000-0000-0000-000000000001\n\
                           yes:802-11-wireless:7a8b9c0d-1111-2222-3333-444455556666\n";

#[tokio::test]
async fn cached_password_skips_network_manager_secrets() {
    let runner = ScriptedRunner::new().wifi(WIFI_LIST);
    let store = MemoryStore::new().with_entry("nmcli-wifi", "HomeNet", "cached-pass");
    let config = Config::default();

    let (creds, source) = credentials::resolve_with_source(&runner, &store, &config)
        .await
        .expect("cached credentials");

    assert_eq!(creds.ssid, "HomeNet");
    assert_eq!(creds.password, "cached-pass");
    assert_eq!(source, PasswordSource::Keyring);
    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0],
        vec!["nmcli", "-t", "-f", "active,ssid", "dev", "wifi"]
    );
}

#[tokio::test]
async fn keyring_miss_reads_psk_and_caches_it() {
    let runner = ScriptedRunner::new()
        .wifi(WIFI_LIST)
        .connections(CONNECTIONS)
        .psk("correct horse");
    let store = MemoryStore::new();
    let config = Config::default();

    let (creds, source) = credentials::resolve_with_source(&runner, &store, &config)
        .await
        .expect("credentials from nmcli");

    assert_eq!(creds.password, "correct horse");
    assert_eq!(source, PasswordSource::NetworkManager);
    assert_eq!(
        store.get("nmcli-wifi", "HomeNet").await.unwrap().as_deref(),
        Some("correct horse")
    );

    let calls = runner.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls[1],
        vec!["nmcli", "-t", "-f", "active,type,uuid", "connection", "show"]
    );
    let psk_call = &calls[2];
    assert!(psk_call.ends_with(&[
        "nmcli".to_string(),
        "-s".to_string(),
        "-g".to_string(),
        "802-11-wireless-security.psk".to_string(),
        "connection".to_string(),
        "show".to_string(),
        "7a8b9c0d-1111-2222-3333-444455556666".to_string(),
    ]));
}

#[tokio::test]
async fn empty_cached_password_falls_through_to_network_manager() {
    let runner = ScriptedRunner::new()
        .wifi(WIFI_LIST)
        .connections(CONNECTIONS)
        .psk("correct horse");
    let store = MemoryStore::new().with_entry("nmcli-wifi", "HomeNet", "");

    let (creds, source) = credentials::resolve_with_source(&runner, &store, &Config::default())
        .await
        .expect("credentials from nmcli");

    assert_eq!(creds.password, "correct horse");
    assert_eq!(source, PasswordSource::NetworkManager);
    assert_eq!(runner.calls().len(), 3);
}

#[tokio::test]
async fn custom_keyring_service_is_used_for_lookup_and_cache() {
    let runner = ScriptedRunner::new()
        .wifi(WIFI_LIST)
        .connections(CONNECTIONS)
        .psk("s3cret-pass");
    let store = MemoryStore::new().with_entry("nmcli-wifi", "HomeNet", "stale");
    let config: Config = serde_yaml::from_str("keyring-service: office\n").unwrap();

    let creds = credentials::resolve(&runner, &store, &config).await.unwrap();

    assert_eq!(creds.password, "s3cret-pass");
    assert_eq!(
        store.get("office", "HomeNet").await.unwrap().as_deref(),
        Some("s3cret-pass")
    );
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn no_active_network_is_not_connected() {
    let runner = ScriptedRunner::new().wifi("no:Neighbour\nno:Cafe\n");
    let store = MemoryStore::new();

    let err = credentials::resolve(&runner, &store, &Config::default())
        .await
        .expect_err("nothing is active");

    assert!(matches!(err, Error::NotConnected));
    assert_eq!(runner.calls().len(), 1);
}

#[tokio::test]
async fn failing_wifi_listing_is_not_connected() {
    let runner = ScriptedRunner::new();
    let store = MemoryStore::new();

    let err = credentials::resolve(&runner, &store, &Config::default())
        .await
        .expect_err("nmcli failed");

    assert!(matches!(err, Error::NotConnected));
}

#[tokio::test]
async fn missing_active_profile_means_no_password() {
    let runner = ScriptedRunner::new()
        .wifi(WIFI_LIST)
        .connections("no:802-11-wireless:00000000-0000-0000-0000-000000000001\n");
    let store = MemoryStore::new();

    let err = credentials::resolve(&runner, &store, &Config::default())
        .await
        .expect_err("no active profile");

    assert!(matches!(err, Error::PasswordNotFound(ref ssid) if ssid == "HomeNet"));
    assert_eq!(runner.calls().len(), 2);
    assert!(store.is_empty());
}

#[tokio::test]
async fn active_wired_profile_is_not_used_for_the_psk_read() {
    let runner = ScriptedRunner::new()
        .wifi(WIFI_LIST)
        .connections("yes:802-3-ethernet:0e0e0e0e-0000-0000-0000-00000000000e\n")
        .psk("wired has no psk");
    let store = MemoryStore::new();

    let err = credentials::resolve(&runner, &store, &Config::default())
        .await
        .expect_err("only a wired profile is active");

    assert!(matches!(err, Error::PasswordNotFound(_)));
    assert_eq!(runner.calls().len(), 2);
    assert!(store.is_empty());
}

#[tokio::test]
async fn escaped_psk_is_unescaped_before_caching() {
    let runner = ScriptedRunner::new()
        .wifi(WIFI_LIST)
        .connections(CONNECTIONS)
        .psk(r"pa\:ss\\word");
    let store = MemoryStore::new();

    let creds = credentials::resolve(&runner, &store, &Config::default())
        .await
        .expect("credentials from nmcli");

    assert_eq!(creds.password, r"pa:ss\word");
    assert_eq!(
        store.get("nmcli-wifi", "HomeNet").await.unwrap().as_deref(),
        Some(r"pa:ss\word")
    );
}

#[tokio::test]
async fn refused_elevation_means_no_password_and_nothing_cached() {
    let runner = ScriptedRunner::new()
        .wifi(WIFI_LIST)
        .connections(CONNECTIONS);
    let store = MemoryStore::new();

    let err = credentials::resolve(&runner, &store, &Config::default())
        .await
        .expect_err("psk read failed");

    assert!(matches!(err, Error::PasswordNotFound(_)));
    assert_eq!(runner.calls().len(), 3);
    assert!(store.is_empty());
}

#[tokio::test]
async fn empty_psk_means_no_password() {
    let runner = ScriptedRunner::new()
        .wifi(WIFI_LIST)
        .connections(CONNECTIONS)
        .psk("");
    let store = MemoryStore::new();

    let err = credentials::resolve(&runner, &store, &Config::default())
        .await
        .expect_err("open network has no psk");

    assert!(matches!(err, Error::PasswordNotFound(_)));
    assert!(store.is_empty());
}

struct LockedKeyring;

impl CredentialStore for LockedKeyring {
    async fn get(&self, _service: &str, _account: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _service: &str, _account: &str, _secret: &str) -> Result<()> {
        Err(keyring::Error::NoStorageAccess("collection is locked".into()).into())
    }

    async fn delete(&self, _service: &str, _account: &str) -> Result<bool> {
        Ok(false)
    }
}

#[tokio::test]
async fn keyring_write_failure_propagates() {
    let runner = ScriptedRunner::new()
        .wifi(WIFI_LIST)
        .connections(CONNECTIONS)
        .psk("correct horse");

    let err = credentials::resolve(&runner, &LockedKeyring, &Config::default())
        .await
        .expect_err("cache write failed");

    assert!(matches!(err, Error::Keyring(_)));
}

#[tokio::test]
async fn forget_removes_cached_entry() {
    let store = MemoryStore::new().with_entry("nmcli-wifi", "HomeNet", "pw");
    let config = Config::default();

    assert!(credentials::forget(&store, &config, "HomeNet").await.unwrap());
    assert!(!credentials::forget(&store, &config, "HomeNet").await.unwrap());
}
