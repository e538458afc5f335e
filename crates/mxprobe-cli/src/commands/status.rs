use std::path::Path;

use anyhow::Result;
use mxprobe_core::{ConnectionRole, SessionTracker};
use owo_colors::OwoColorize;

use super::hex_utils::format_hex_address;
use super::open_probe;

pub fn run(config: &Path, json: bool) -> Result<()> {
    let probe = open_probe(config)?;
    let decoders = probe.decoders();

    let mut tracker = SessionTracker::for_current_exe();
    tracker.on_race_session(&decoders);
    tracker.refresh(&decoders);

    if json {
        println!("{}", serde_json::to_string_pretty(&tracker)?);
        return Ok(());
    }

    let descriptor = tracker.descriptor();
    let role = match descriptor.role {
        ConnectionRole::Offline => descriptor.role.to_string().dimmed().to_string(),
        ConnectionRole::Host => descriptor.role.to_string().cyan().bold().to_string(),
        ConnectionRole::Client => descriptor.role.to_string().green().bold().to_string(),
    };
    println!("Connection: {}", role);
    if !descriptor.role.is_online() {
        return Ok(());
    }

    println!("Server:     {}", descriptor.server_name);
    println!(
        "Password:   {}",
        if descriptor.has_password() { "yes" } else { "no" }
    );
    println!("Location:   {}", descriptor.location_label());
    println!("Clients:    {}", tracker.clients_label());
    if let Some(endpoint) = &descriptor.endpoint {
        println!("Endpoint:   {}", endpoint);
        println!("Ping:       {}", tracker.ping_label());
    }
    if let Some(address) = descriptor.entry_address {
        println!("Entry:      {}", format_hex_address(address));
    }
    if let Some(tearoffs) = decoders.remaining_tearoffs(descriptor.role) {
        println!("Tear-offs:  {}", tearoffs);
    }
    if let Some(command) = tracker.connect_command() {
        println!();
        println!("{}", command);
    }
    Ok(())
}
