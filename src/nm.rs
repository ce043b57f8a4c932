//! NetworkManager queries through `nmcli` in terse mode.

use tracing::{debug, info, warn};

use crate::command::CommandRunner;
use crate::config::Config;
use crate::error::Result;

const WIRELESS_TYPE: &str = "802-11-wireless";

/// Splits one `nmcli -t` line into fields.
///
/// Terse output separates fields with `:` and escapes literal `:` and `\`
/// inside values with a backslash.
pub fn parse_terse_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => current.push('\\'),
            },
            ':' => fields.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    fields.push(current);
    fields
}

/// Undoes terse-mode escaping of a single value without splitting it.
///
/// `nmcli -g` prints one field per line but still escapes `:` and `\`.
pub fn unescape_terse(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push(chars.next().unwrap_or('\\')),
            other => out.push(other),
        }
    }
    out
}

/// Returns the second field of the first row whose first field is `yes`.
fn first_active_value(output: &str) -> Option<String> {
    output
        .lines()
        .map(parse_terse_fields)
        .filter(|fields| fields.first().map(String::as_str) == Some("yes"))
        .filter_map(|fields| fields.into_iter().nth(1))
        .find(|value| !value.is_empty())
}

/// Picks the connected SSID out of `nmcli -t -f active,ssid dev wifi` output.
pub fn active_ssid_from(output: &str) -> Option<String> {
    first_active_value(output)
}

/// Picks the active Wi-Fi profile UUID out of
/// `nmcli -t -f active,type,uuid connection show` output.
///
/// The UUID is the last field. When a type column is present, only
/// `802-11-wireless` rows count, so an active wired or VPN profile listed first
/// is not mistaken for the Wi-Fi one.
pub fn active_uuid_from(output: &str) -> Option<String> {
    output
        .lines()
        .map(parse_terse_fields)
        .filter(|fields| fields.len() >= 2 && fields[0] == "yes")
        .filter(|fields| fields.len() == 2 || fields[1] == WIRELESS_TYPE)
        .filter_map(|fields| fields.into_iter().last())
        .find(|uuid| !uuid.is_empty())
}

/// SSID of the network the machine is connected to, if any.
///
/// A failing `nmcli` is reported as "not connected" after logging the cause.
pub async fn current_ssid<R: CommandRunner>(runner: &R, config: &Config) -> Option<String> {
    let args = ["-t", "-f", config.nmcli.wifi_fields.as_str(), "dev", "wifi"];
    match runner.run(&config.nmcli.program, &args).await {
        Ok(output) => {
            let ssid = active_ssid_from(&output);
            match &ssid {
                Some(ssid) => info!(%ssid, "connected SSID"),
                None => debug!("no active Wi-Fi network in nmcli output"),
            }
            ssid
        }
        Err(err) => {
            warn!(error = %err, "failed to list Wi-Fi networks");
            None
        }
    }
}

/// UUID of the active connection profile.
pub async fn active_connection_uuid<R: CommandRunner>(
    runner: &R,
    config: &Config,
) -> Result<Option<String>> {
    let args = [
        "-t",
        "-f",
        config.nmcli.connection_fields.as_str(),
        "connection",
        "show",
    ];
    let output = runner.run(&config.nmcli.program, &args).await?;
    let uuid = active_uuid_from(&output);
    debug!(uuid = ?uuid, "active connection profile");
    Ok(uuid)
}

/// Reads the stored pre-shared key of a connection profile.
///
/// NetworkManager only reveals secrets to privileged callers, so the command is
/// prefixed with the configured elevation helper unless we already run as root.
pub async fn read_psk<R: CommandRunner>(
    runner: &R,
    config: &Config,
    uuid: &str,
) -> Result<Option<String>> {
    let (program, args) = psk_command(config, uuid, running_as_root());
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = runner.run(&program, &args).await?;
    let psk = unescape_terse(output.trim());
    if psk.is_empty() {
        Ok(None)
    } else {
        Ok(Some(psk))
    }
}

fn psk_command(config: &Config, uuid: &str, as_root: bool) -> (String, Vec<String>) {
    let mut argv: Vec<String> = Vec::new();
    if !as_root {
        argv.extend(config.elevate_command.iter().cloned());
    }
    argv.push(config.nmcli.program.clone());
    argv.extend(
        [
            "-s",
            "-g",
            config.nmcli.password_field.as_str(),
            "connection",
            "show",
            uuid,
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    let program = argv.remove(0);
    (program, argv)
}

fn running_as_root() -> bool {
    users::get_current_uid() == 0
}
