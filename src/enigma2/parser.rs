//! Enigma2 service list decoding
//!
//! `/web/getservices` answers with
//!
//! ```xml
//! <e2servicelist>
//!   <e2service>
//!     <e2servicereference>1:7:1:0:0:0:0:0:0:0:</e2servicereference>
//!     <e2servicename>Favourites (TV)</e2servicename>
//!   </e2service>
//! </e2servicelist>
//! ```
//!
//! Decoding is lenient: a body that is not a valid service list, including
//! one whose root element is not `<e2servicelist>`, yields no
//! entries instead of an error, so a reachable receiver with a broken or
//! empty answer simply contributes no channels.

use quick_xml::Reader;
use quick_xml::de::from_str;
use quick_xml::events::Event;
use serde::Deserialize;
use tracing::warn;

const ROOT_ELEMENT: &str = "e2servicelist";

/// One bouquet or channel as listed by the receiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDirectoryEntry {
    pub name: String,
    pub reference: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename = "e2servicelist")]
struct ServiceList {
    #[serde(rename = "e2service", default)]
    services: Vec<Service>,
}

#[derive(Debug, Deserialize)]
struct Service {
    #[serde(rename = "e2servicename", default)]
    name: String,
    #[serde(rename = "e2servicereference", default)]
    reference: String,
}

/// Decode a service list body into entries in document order
pub fn parse_service_list(body: &[u8]) -> Vec<ServiceDirectoryEntry> {
    let content = match std::str::from_utf8(body) {
        Ok(content) => content,
        Err(e) => {
            warn!("Ignoring service list with invalid UTF-8: {}", e);
            return Vec::new();
        }
    };

    match root_element(content) {
        Some(root) if root == ROOT_ELEMENT => {}
        Some(root) => {
            warn!("Ignoring service list with root element <{}>", root);
            return Vec::new();
        }
        None => {
            warn!("Ignoring service list without a root element");
            return Vec::new();
        }
    }

    match from_str::<ServiceList>(content) {
        Ok(list) => list
            .services
            .into_iter()
            .map(|service| ServiceDirectoryEntry {
                name: service.name,
                reference: service.reference,
            })
            .collect(),
        Err(e) => {
            warn!("Ignoring malformed service list: {}", e);
            Vec::new()
        }
    }
}

/// Name of the first element in the document, skipping the prolog
fn root_element(content: &str) -> Option<String> {
    let mut reader = Reader::from_str(content);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return std::str::from_utf8(e.name().as_ref())
                    .ok()
                    .map(str::to_string);
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}
