//! # Configuration Frames
//!
//! Encodes application configurations as TLV frames.
//!
//! ```text
//! Application => {
//!     version   => u8,
//!     identity  => { name => str, key => str | bytes[16] },
//!     type_name => str,
//!     handlers  => [ {
//!         identity, type_name, handler_type => u8, disabled => bool,
//!         V1: produced => [ { name, role } ], consumed => [ { name, role } ],
//!         V2: messages => [ { name, role, usage => u8 } ],
//!     } ],
//! }
//! ```
//!
//! ## Invariants
//! - Decoding never panics on malformed input.
//! - Unknown map fields are ignored.
//! - A frame without a `version` field is read as [`Version::V1`].
//! - Decoded applications are re-validated, so a frame describing two
//!   handlers with the same key is rejected exactly as building it would be.

use configkit::ApplicationConfig;
use configkit::Entity;
use configkit::EntityMessageNames;
use configkit::HandlerConfig;
use configkit::HandlerType;
use configkit::Identity;
use configkit::MessageName;
use configkit::MessageRole;
use tracing::debug;
use uuid::Uuid;

use crate::codec::Decoder;
use crate::codec::Encoder;
use crate::codec::Tag;
use crate::error::Error;
use crate::error::Result;

/// The encoding version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Version {
    /// Keys as strings, explicit produced and consumed lists.
    V1,
    /// Keys as 16 UUID bytes, one message list with usage flags.
    #[default]
    V2,
}

impl Version {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
        }
    }

    pub fn from_u8(v: u8) -> Result<Self> {
        match v {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            _ => Err(Error::UnsupportedVersion(v)),
        }
    }
}

const CONSUMED: u8 = 0b01;
const PRODUCED: u8 = 0b10;

/// Encodes a single application.
pub fn encode_application(app: &ApplicationConfig, version: Version) -> Result<Vec<u8>> {
    let mut enc = Encoder::new();
    write_application(&mut enc, app, version)?;
    enc.into_bytes()
}

/// Decodes a single application, in either version.
pub fn decode_application(bytes: &[u8]) -> Result<ApplicationConfig> {
    let mut dec = Decoder::new(bytes);
    let app = read_application(&mut dec)?;
    if dec.remaining() != 0 {
        return Err(Error::Malformed(format!("{} trailing bytes after the application", dec.remaining())));
    }
    Ok(app)
}

/// Encodes a list of applications, as returned by a discovery server.
pub fn encode_applications<'a>(
    apps: impl IntoIterator<Item = &'a ApplicationConfig>,
    version: Version,
) -> Result<Vec<u8>> {
    let mut enc = Encoder::new();
    enc.list_begin()?;
    for app in apps {
        write_application(&mut enc, app, version)?;
    }
    enc.list_end()?;
    enc.into_bytes()
}

/// Decodes a list of applications.
pub fn decode_applications(bytes: &[u8]) -> Result<Vec<ApplicationConfig>> {
    let mut dec = Decoder::new(bytes);
    let mut list = dec.list()?;
    let mut apps = Vec::new();
    while let Some(mut item) = list.next()? {
        apps.push(read_application(&mut item)?);
    }
    debug!(count = apps.len(), "decoded application list");
    Ok(apps)
}

fn write_application(enc: &mut Encoder, app: &ApplicationConfig, version: Version) -> Result<()> {
    enc.variant_begin("Application")?;
    enc.map_begin()?;

    enc.field_u8("version", version.as_u8())?;
    write_identity(enc, app.identity(), version)?;
    enc.field_str("type_name", app.type_name())?;

    // Sorted so that equal applications encode identically.
    let mut handlers: Vec<&HandlerConfig> = app.handlers().iter().collect();
    handlers.sort_by(|a, b| a.identity.cmp(&b.identity));

    enc.variant_begin("handlers")?;
    enc.list_begin()?;
    for h in handlers {
        write_handler(enc, h, version)?;
    }
    enc.list_end()?;
    enc.variant_end()?;

    enc.map_end()?;
    enc.variant_end()
}

fn write_identity(enc: &mut Encoder, identity: &Identity, version: Version) -> Result<()> {
    enc.variant_begin("identity")?;
    enc.map_begin()?;
    enc.field_str("name", identity.name())?;
    match version {
        Version::V1 => enc.field_str("key", identity.key())?,
        Version::V2 => {
            let key = identity
                .key_uuid()
                .ok_or_else(|| Error::Malformed(format!("identity key {:?} is not a UUID", identity.key())))?;
            enc.variant_begin("key")?;
            enc.bytes(key.as_bytes())?;
            enc.variant_end()?;
        }
    }
    enc.map_end()?;
    enc.variant_end()
}

fn write_handler(enc: &mut Encoder, h: &HandlerConfig, version: Version) -> Result<()> {
    enc.map_begin()?;
    write_identity(enc, &h.identity, version)?;
    enc.field_str("type_name", &h.type_name)?;
    enc.field_u8("handler_type", handler_type_to_u8(h.handler_type))?;
    enc.field_bool("disabled", h.disabled)?;

    match version {
        Version::V1 => {
            write_v1_messages(enc, "produced", h.messages.produced().sorted())?;
            write_v1_messages(enc, "consumed", h.messages.consumed().sorted())?;
        }
        Version::V2 => {
            enc.variant_begin("messages")?;
            enc.list_begin()?;
            for (name, role) in h.messages.roles().sorted() {
                let mut usage = 0;
                if h.messages.is_consumed(name) {
                    usage |= CONSUMED;
                }
                if h.messages.is_produced(name) {
                    usage |= PRODUCED;
                }
                enc.map_begin()?;
                enc.field_str("name", name.as_str())?;
                enc.field_u8("role", role_to_u8(role))?;
                enc.field_u8("usage", usage)?;
                enc.map_end()?;
            }
            enc.list_end()?;
            enc.variant_end()?;
        }
    }

    enc.map_end()
}

fn write_v1_messages(enc: &mut Encoder, field: &str, messages: Vec<(&MessageName, MessageRole)>) -> Result<()> {
    enc.variant_begin(field)?;
    enc.list_begin()?;
    for (name, role) in messages {
        enc.map_begin()?;
        enc.field_str("name", name.as_str())?;
        enc.field_u8("role", role_to_u8(role))?;
        enc.map_end()?;
    }
    enc.list_end()?;
    enc.variant_end()
}

fn read_application(dec: &mut Decoder<'_>) -> Result<ApplicationConfig> {
    let (frame, mut payload) = dec.variant()?;
    if frame != "Application" {
        return Err(Error::Malformed(format!("unexpected frame {frame:?}")));
    }

    let mut version = Version::V1;
    let mut identity = None;
    let mut type_name = None;
    let mut handlers = None;

    let mut map = payload.map()?;
    while let Some((key, mut val)) = map.next()? {
        match key {
            "version" => version = Version::from_u8(val.u8()?)?,
            "identity" => identity = Some(val),
            "type_name" => type_name = Some(val.str()?),
            "handlers" => handlers = Some(val),
            _ => {}
        }
    }

    let type_name = type_name.ok_or(Error::MissingField("type_name"))?;
    let identity = read_identity(identity.ok_or(Error::MissingField("identity"))?, type_name)?;

    let mut configs = Vec::new();
    let mut list = handlers.ok_or(Error::MissingField("handlers"))?.list()?;
    while let Some(item) = list.next()? {
        configs.push(read_handler(item, version)?);
    }

    Ok(ApplicationConfig::new(identity, type_name, configs)?)
}

/// Reads an identity whose key may be either a string or UUID bytes.
fn read_identity(mut dec: Decoder<'_>, owner: &str) -> Result<Identity> {
    let mut name = None;
    let mut key = None;

    let mut map = dec.map()?;
    while let Some((field, mut val)) = map.next()? {
        match field {
            "name" => name = Some(val.str()?.to_string()),
            "key" => {
                key = Some(match val.peek_tag()? {
                    Tag::Bytes => {
                        let bytes = val.bytes()?;
                        let uuid = Uuid::from_slice(bytes).map_err(|_| {
                            Error::Malformed(format!("identity key has {} bytes, expected 16", bytes.len()))
                        })?;
                        uuid.hyphenated().to_string()
                    }
                    _ => val.str()?.to_string(),
                })
            }
            _ => {}
        }
    }

    let name = name.ok_or(Error::MissingField("name"))?;
    let key = key.ok_or(Error::MissingField("key"))?;
    Identity::new(name, key)
        .map_err(|source| configkit::Error::InvalidIdentity { entity: Some(owner.to_string()), source }.into())
}

fn read_handler(mut dec: Decoder<'_>, version: Version) -> Result<HandlerConfig> {
    let mut identity = None;
    let mut type_name = None;
    let mut handler_type = None;
    let mut disabled = false;
    let mut produced = None;
    let mut consumed = None;
    let mut messages = None;

    let mut map = dec.map()?;
    while let Some((key, mut val)) = map.next()? {
        match key {
            "identity" => identity = Some(val),
            "type_name" => type_name = Some(val.str()?),
            "handler_type" => handler_type = Some(handler_type_from_u8(val.u8()?)?),
            "disabled" => disabled = val.bool()?,
            "produced" => produced = Some(val),
            "consumed" => consumed = Some(val),
            "messages" => messages = Some(val),
            _ => {}
        }
    }

    let type_name = type_name.ok_or(Error::MissingField("type_name"))?;
    let identity = read_identity(identity.ok_or(Error::MissingField("identity"))?, type_name)?;
    let handler_type = handler_type.ok_or(Error::MissingField("handler_type"))?;

    let mut ledger = EntityMessageNames::new();
    match version {
        Version::V1 => {
            read_v1_messages(produced.ok_or(Error::MissingField("produced"))?, type_name, PRODUCED, &mut ledger)?;
            read_v1_messages(consumed.ok_or(Error::MissingField("consumed"))?, type_name, CONSUMED, &mut ledger)?;
        }
        Version::V2 => {
            let mut list = messages.ok_or(Error::MissingField("messages"))?.list()?;
            while let Some(item) = list.next()? {
                let (name, role, usage) = read_message(item, true)?;
                record(&mut ledger, type_name, name, role, usage)?;
            }
        }
    }

    Ok(HandlerConfig { identity, type_name: type_name.to_string(), handler_type, messages: ledger, disabled })
}

fn read_v1_messages(mut dec: Decoder<'_>, owner: &str, usage: u8, ledger: &mut EntityMessageNames) -> Result<()> {
    let mut list = dec.list()?;
    while let Some(item) = list.next()? {
        let (name, role, _) = read_message(item, false)?;
        record(ledger, owner, name, role, usage)?;
    }
    Ok(())
}

fn read_message(mut dec: Decoder<'_>, with_usage: bool) -> Result<(MessageName, MessageRole, u8)> {
    let mut name = None;
    let mut role = None;
    let mut usage = None;

    let mut map = dec.map()?;
    while let Some((key, mut val)) = map.next()? {
        match key {
            "name" => name = Some(MessageName::from(val.str()?)),
            "role" => role = Some(role_from_u8(val.u8()?)?),
            "usage" => usage = Some(val.u8()?),
            _ => {}
        }
    }

    let name = name.ok_or(Error::MissingField("name"))?;
    let role = role.ok_or(Error::MissingField("role"))?;
    let usage = match (with_usage, usage) {
        (false, _) => 0,
        (true, Some(u)) if u != 0 && u & !(CONSUMED | PRODUCED) == 0 => u,
        (true, Some(u)) => return Err(Error::UnknownValue { kind: "usage", value: u }),
        (true, None) => return Err(Error::MissingField("usage")),
    };
    Ok((name, role, usage))
}

fn record(ledger: &mut EntityMessageNames, owner: &str, name: MessageName, role: MessageRole, usage: u8) -> Result<()> {
    let duplicate = |_| Error::Malformed(format!("{owner} lists {name} more than once or under two roles"));
    if usage & PRODUCED != 0 {
        ledger.produce(name.clone(), role).map_err(duplicate)?;
    }
    if usage & CONSUMED != 0 {
        ledger.consume(name.clone(), role).map_err(duplicate)?;
    }
    Ok(())
}

fn role_to_u8(role: MessageRole) -> u8 {
    match role {
        MessageRole::Command => 0,
        MessageRole::Event => 1,
        MessageRole::Timeout => 2,
    }
}

fn role_from_u8(v: u8) -> Result<MessageRole> {
    match v {
        0 => Ok(MessageRole::Command),
        1 => Ok(MessageRole::Event),
        2 => Ok(MessageRole::Timeout),
        _ => Err(Error::UnknownValue { kind: "role", value: v }),
    }
}

fn handler_type_to_u8(t: HandlerType) -> u8 {
    match t {
        HandlerType::Aggregate => 0,
        HandlerType::Process => 1,
        HandlerType::Integration => 2,
        HandlerType::Projection => 3,
    }
}

fn handler_type_from_u8(v: u8) -> Result<HandlerType> {
    match v {
        0 => Ok(HandlerType::Aggregate),
        1 => Ok(HandlerType::Process),
        2 => Ok(HandlerType::Integration),
        3 => Ok(HandlerType::Projection),
        _ => Err(Error::UnknownValue { kind: "handler type", value: v }),
    }
}
