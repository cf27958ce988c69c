//! Declared-port extraction from the server's XML configuration.
//!
//! Ports are declared as the `port` attribute on `<input>` and `<connector>`
//! elements. Everything else in the document is ignored.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, warn};

use crate::domain::PortSet;
use crate::error::{Error, Result};

/// Element names whose `port` attribute declares a host port.
const PORT_ELEMENTS: &[&[u8]] = &[b"input", b"connector"];

const PORT_ATTRIBUTE: &[u8] = b"port";

/// Extract every declared port from a configuration document.
///
/// Never fails. A document that is not well-formed XML yields an empty set;
/// the parse error is only logged. Attribute values that are not a valid
/// port number are skipped.
pub fn extract_declared_ports(document: &str) -> PortSet {
    match try_extract_ports(document) {
        Ok(ports) => ports,
        Err(e) => {
            debug!("Treating configuration as declaring no ports: {}", e);
            PortSet::new()
        }
    }
}

/// Extract declared ports, reporting XML syntax errors.
///
/// A document that ends with elements still open is an error.
pub fn try_extract_ports(document: &str) -> Result<PortSet> {
    let mut reader = Reader::from_str(document);
    let mut ports = PortSet::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                depth += 1;
                if let Some(port) = declared_port(&element)? {
                    ports.insert(port);
                }
            }
            Ok(Event::Empty(element)) => {
                if let Some(port) = declared_port(&element)? {
                    ports.insert(port);
                }
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) if depth > 0 => {
                return Err(Error::ParseError(format!(
                    "unexpected end of document with {} unclosed element(s)",
                    depth
                )))
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(Error::ParseError(format!(
                    "{} at byte {}",
                    e,
                    reader.buffer_position()
                )))
            }
        }
    }

    Ok(ports)
}

/// The port declared on a single element, if it is a port-bearing element.
///
/// Every attribute is read so that duplicated attributes are reported.
fn declared_port(element: &BytesStart<'_>) -> Result<Option<u16>> {
    let name = element.local_name();
    if !PORT_ELEMENTS.contains(&name.as_ref()) {
        return Ok(None);
    }

    let mut port = None;
    for attr in element.attributes() {
        let attr = attr.map_err(|e| Error::ParseError(e.to_string()))?;
        if attr.key.local_name().as_ref() != PORT_ATTRIBUTE {
            continue;
        }

        let value = attr
            .unescape_value()
            .map_err(|e| Error::ParseError(e.to_string()))?;

        port = parse_port(&value);
        if port.is_none() {
            warn!(
                "Skipping <{}> with invalid port value '{}'",
                String::from_utf8_lossy(name.as_ref()),
                value
            );
        }
    }

    Ok(port)
}

/// Parse a port attribute value: base-10, surrounding whitespace allowed, 1-65535.
fn parse_port(value: &str) -> Option<u16> {
    value.trim().parse::<u16>().ok().filter(|p| *p != 0)
}
