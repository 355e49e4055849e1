//! Live channel discovery from an Enigma2 receiver
//!
//! Discovery looks up the configured bouquet in the receiver's top-level
//! service list, then lists the channels of that bouquet and adds one stream
//! per channel to the stream map. The two requests are strictly sequential
//! because the second needs the bouquet reference found by the first.

pub mod client;
pub mod parser;

pub use client::{HttpServiceDirectoryClient, ServiceDirectoryClient};
pub use parser::{ServiceDirectoryEntry, parse_service_list};

use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::config::defaults::DEFAULT_BOUQUET;
use crate::config::{ReceiverSettings, StreamMap};
use crate::errors::FetchResult;
use crate::utils::normalize_channel_name;

/// Top-level service list of the receiver's web interface
pub fn services_url(host: &str) -> String {
    format!("http://{host}/web/getservices")
}

/// Service list scoped to one bouquet
pub fn bouquet_services_url(host: &str, reference: &str) -> String {
    let escaped: String = form_urlencoded::byte_serialize(reference.as_bytes()).collect();
    format!("http://{host}/web/getservices?sRef={escaped}")
}

/// Playable URL of a channel on the receiver's streaming port
pub fn stream_url(host: &str, port: &str, reference: &str) -> String {
    format!("http://{host}:{port}/{reference}")
}

/// First entry whose name equals `bouquet` exactly
pub fn find_bouquet<'a>(
    entries: &'a [ServiceDirectoryEntry],
    bouquet: &str,
) -> Option<&'a ServiceDirectoryEntry> {
    entries.iter().find(|entry| entry.name == bouquet)
}

/// Merge the channels of the configured bouquet into `streams`.
///
/// Does nothing when the receiver has no host or port. A bouquet that is not
/// listed, or is listed without a reference, leaves `streams` untouched and
/// skips the channel request.
/// Discovered keys overwrite existing entries. Returns the number of
/// channels written.
pub async fn discover<C>(
    client: &C,
    receiver: &mut ReceiverSettings,
    streams: &mut StreamMap,
) -> FetchResult<usize>
where
    C: ServiceDirectoryClient + ?Sized,
{
    if !receiver.is_configured() {
        debug!("Enigma2 receiver not configured, skipping discovery");
        return Ok(0);
    }

    if receiver.bouquet.is_empty() {
        receiver.bouquet = DEFAULT_BOUQUET.to_string();
    }

    let body = client.fetch(&services_url(&receiver.host)).await?;
    let bouquets = parse_service_list(&body);
    receiver.reference = find_bouquet(&bouquets, &receiver.bouquet)
        .map(|b| b.reference.clone())
        .filter(|reference| !reference.is_empty());

    let Some(reference) = receiver.reference.as_deref() else {
        warn!(
            "Bouquet '{}' not found on Enigma2 receiver {} ({} bouquets listed)",
            receiver.bouquet,
            receiver.host,
            bouquets.len()
        );
        return Ok(0);
    };
    debug!("Bouquet '{}' has reference {}", receiver.bouquet, reference);

    let body = client
        .fetch(&bouquet_services_url(&receiver.host, reference))
        .await?;
    let channels = parse_service_list(&body);

    for channel in &channels {
        let key = normalize_channel_name(&channel.name);
        let url = stream_url(&receiver.host, &receiver.port, &channel.reference);
        if let Some(previous) = streams.insert(key.clone(), url) {
            debug!("Discovered channel '{}' replaces stream {}", key, previous);
        }
    }

    info!(
        "Discovered {} channels in bouquet '{}' on {}",
        channels.len(),
        receiver.bouquet,
        receiver.host
    );
    Ok(channels.len())
}
