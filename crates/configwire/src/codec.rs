//! # TLV Codec
//!
//! The byte-level layer under the configuration frames.
//!
//! - **Scalars**: `[Tag: 1b][Data: N]`
//! - **Blobs**: `[Tag: 1b][Len: 4b][Data: Len]`
//! - **Containers**: `[Tag: 1b][Len: 4b][Body: Len]`
//!
//! All integers are little-endian. A map holds only variants, and a variant
//! holds a name followed by exactly one payload item. Every container is
//! length-prefixed so a decoder can skip fields it does not know.

use crate::error::Error;
use crate::error::Result;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    BoolTrue = 0x01,
    BoolFalse = 0x02,
    U8 = 0x03,
    String = 0x10,
    Bytes = 0x11,
    List = 0x20,
    Map = 0x21,
    Variant = 0x33,
}

impl Tag {
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Tag::BoolTrue),
            0x02 => Some(Tag::BoolFalse),
            0x03 => Some(Tag::U8),
            0x10 => Some(Tag::String),
            0x11 => Some(Tag::Bytes),
            0x20 => Some(Tag::List),
            0x21 => Some(Tag::Map),
            0x33 => Some(Tag::Variant),
            _ => None,
        }
    }
}

/// The kind of container an [`Encoder`] is currently writing into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Root,
    List,
    Map,
    Variant,
}

struct Frame {
    start: usize,
    scope: Scope,
    count: usize,
}

/// Writes TLV items, tracking open containers so that lengths can be
/// back-patched and structural rules enforced as items are written.
pub struct Encoder {
    buf: Vec<u8>,
    /// Bottom is always `Scope::Root`.
    stack: Vec<Frame>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self { buf: Vec::with_capacity(256), stack: vec![Frame { start: 0, scope: Scope::Root, count: 0 }] }
    }

    /// Returns the encoded bytes.
    ///
    /// # Errors
    /// Returns `Error::ScopeStillOpen` if a container was not closed.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        if self.stack.len() > 1 {
            return Err(Error::ScopeStillOpen);
        }
        Ok(self.buf)
    }

    fn frame(&mut self) -> Result<&mut Frame> {
        self.stack.last_mut().ok_or(Error::ScopeUnderflow)
    }

    fn write_tag(&mut self, tag: Tag) -> Result<()> {
        let frame = self.frame()?;
        match frame.scope {
            Scope::Root | Scope::List => {}
            Scope::Map if tag != Tag::Variant => return Err(Error::InvalidMapEntry),
            Scope::Map => {}
            Scope::Variant if frame.count >= 1 => return Err(Error::VariantArity),
            Scope::Variant => {}
        }
        self.buf.push(tag as u8);
        Ok(())
    }

    fn written(&mut self) -> Result<()> {
        self.frame()?.count += 1;
        Ok(())
    }

    fn write_len(&mut self, len: usize) -> Result<()> {
        let len = u32::try_from(len).map_err(|_| Error::BlobTooLarge(len))?;
        self.buf.extend_from_slice(&len.to_le_bytes());
        Ok(())
    }

    fn begin(&mut self, tag: Tag, scope: Scope) -> Result<()> {
        self.write_tag(tag)?;
        // Length placeholder, patched in `end`.
        self.buf.extend_from_slice(&[0; 4]);
        self.stack.push(Frame { start: self.buf.len(), scope, count: 0 });
        Ok(())
    }

    fn end(&mut self, expected: Scope) -> Result<()> {
        if self.stack.len() <= 1 {
            return Err(Error::ScopeUnderflow);
        }

        let frame = self.frame()?;
        if frame.scope != expected {
            return Err(Error::ScopeMismatch { expected, actual: frame.scope });
        }
        if frame.scope == Scope::Variant && frame.count == 0 {
            return Err(Error::VariantArity);
        }

        let Some(frame) = self.stack.pop() else {
            return Err(Error::ScopeUnderflow);
        };
        let body_len = self.buf.len() - frame.start;
        let len = u32::try_from(body_len).map_err(|_| Error::BlobTooLarge(body_len))?;
        self.buf[frame.start - 4..frame.start].copy_from_slice(&len.to_le_bytes());

        self.written()
    }

    pub fn bool(&mut self, v: bool) -> Result<()> {
        self.write_tag(if v { Tag::BoolTrue } else { Tag::BoolFalse })?;
        self.written()
    }

    pub fn u8(&mut self, v: u8) -> Result<()> {
        self.write_tag(Tag::U8)?;
        self.buf.push(v);
        self.written()
    }

    pub fn str(&mut self, v: &str) -> Result<()> {
        self.write_tag(Tag::String)?;
        self.write_len(v.len())?;
        self.buf.extend_from_slice(v.as_bytes());
        self.written()
    }

    pub fn bytes(&mut self, v: &[u8]) -> Result<()> {
        self.write_tag(Tag::Bytes)?;
        self.write_len(v.len())?;
        self.buf.extend_from_slice(v);
        self.written()
    }

    pub fn list_begin(&mut self) -> Result<()> {
        self.begin(Tag::List, Scope::List)
    }

    pub fn list_end(&mut self) -> Result<()> {
        self.end(Scope::List)
    }

    /// Begins a map. Only `variant_begin()` may be written directly into it.
    pub fn map_begin(&mut self) -> Result<()> {
        self.begin(Tag::Map, Scope::Map)
    }

    pub fn map_end(&mut self) -> Result<()> {
        self.end(Scope::Map)
    }

    /// Begins a named variant. Exactly one payload item must follow.
    pub fn variant_begin(&mut self, name: &str) -> Result<()> {
        self.begin(Tag::Variant, Scope::Variant)?;
        self.str(name)?;
        // The name is not the payload.
        self.frame()?.count = 0;
        Ok(())
    }

    pub fn variant_end(&mut self) -> Result<()> {
        self.end(Scope::Variant)
    }

    /// Writes `name => str` into the current map.
    pub fn field_str(&mut self, name: &str, v: &str) -> Result<()> {
        self.variant_begin(name)?;
        self.str(v)?;
        self.variant_end()
    }

    /// Writes `name => u8` into the current map.
    pub fn field_u8(&mut self, name: &str, v: u8) -> Result<()> {
        self.variant_begin(name)?;
        self.u8(v)?;
        self.variant_end()
    }

    /// Writes `name => bool` into the current map.
    pub fn field_bool(&mut self, name: &str, v: bool) -> Result<()> {
        self.variant_begin(name)?;
        self.bool(v)?;
        self.variant_end()
    }
}

/// A zero-copy, bounds-checked cursor over encoded bytes.
///
/// Container reads return a new decoder restricted to the container's body.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn peek_tag(&self) -> Result<Tag> {
        let b = *self.buf.first().ok_or(Error::UnexpectedEnd)?;
        Tag::from_u8(b).ok_or(Error::InvalidTag(b))
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.buf.len() {
            return Err(Error::UnexpectedEnd);
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn read_len(&mut self) -> Result<usize> {
        let bytes: [u8; 4] = self.read_bytes(4)?.try_into().map_err(|_| Error::UnexpectedEnd)?;
        Ok(u32::from_le_bytes(bytes) as usize)
    }

    fn expect(&mut self, expected: Tag) -> Result<()> {
        let tag = self.peek_tag()?;
        if tag != expected {
            return Err(Error::InvalidTag(tag as u8));
        }
        self.read_bytes(1)?;
        Ok(())
    }

    /// Skips the next item and everything nested in it.
    pub fn skip(&mut self) -> Result<()> {
        let tag = self.peek_tag()?;
        self.read_bytes(1)?;
        match tag {
            Tag::BoolTrue | Tag::BoolFalse => {}
            Tag::U8 => {
                self.read_bytes(1)?;
            }
            Tag::String | Tag::Bytes | Tag::List | Tag::Map | Tag::Variant => {
                let len = self.read_len()?;
                self.read_bytes(len)?;
            }
        }
        Ok(())
    }

    pub fn bool(&mut self) -> Result<bool> {
        match self.peek_tag()? {
            Tag::BoolTrue => {
                self.read_bytes(1)?;
                Ok(true)
            }
            Tag::BoolFalse => {
                self.read_bytes(1)?;
                Ok(false)
            }
            tag => Err(Error::InvalidTag(tag as u8)),
        }
    }

    pub fn u8(&mut self) -> Result<u8> {
        self.expect(Tag::U8)?;
        Ok(self.read_bytes(1)?[0])
    }

    pub fn str(&mut self) -> Result<&'a str> {
        self.expect(Tag::String)?;
        let len = self.read_len()?;
        std::str::from_utf8(self.read_bytes(len)?).map_err(|_| Error::InvalidUtf8)
    }

    pub fn bytes(&mut self) -> Result<&'a [u8]> {
        self.expect(Tag::Bytes)?;
        let len = self.read_len()?;
        self.read_bytes(len)
    }

    fn enter(&mut self, tag: Tag) -> Result<Decoder<'a>> {
        self.expect(tag)?;
        let len = self.read_len()?;
        Ok(Decoder::new(self.read_bytes(len)?))
    }

    pub fn list(&mut self) -> Result<ListIter<'a>> {
        Ok(ListIter { dec: self.enter(Tag::List)? })
    }

    pub fn map(&mut self) -> Result<MapIter<'a>> {
        Ok(MapIter { dec: self.enter(Tag::Map)? })
    }

    /// Returns the variant's name and a decoder over its payload.
    pub fn variant(&mut self) -> Result<(&'a str, Decoder<'a>)> {
        let mut inner = self.enter(Tag::Variant)?;
        let name = inner.str()?;
        Ok((name, inner))
    }
}

/// Items of a list, each as its own decoder.
#[derive(Debug)]
pub struct ListIter<'a> {
    dec: Decoder<'a>,
}

impl<'a> ListIter<'a> {
    /// Returns a decoder for the next item, `None` at the end of the list, or
    /// an error if the next item is truncated.
    pub fn next(&mut self) -> Result<Option<Decoder<'a>>> {
        if self.dec.remaining() == 0 {
            return Ok(None);
        }
        let mut lookahead = self.dec.clone();
        lookahead.skip()?;
        let len = self.dec.remaining() - lookahead.remaining();
        Ok(Some(Decoder::new(self.dec.read_bytes(len)?)))
    }
}

/// Named entries of a map.
#[derive(Debug)]
pub struct MapIter<'a> {
    dec: Decoder<'a>,
}

impl<'a> MapIter<'a> {
    /// Returns the next entry's name and payload decoder, or `None`.
    pub fn next(&mut self) -> Result<Option<(&'a str, Decoder<'a>)>> {
        if self.dec.remaining() == 0 {
            return Ok(None);
        }
        let tag = self.dec.peek_tag()?;
        if tag != Tag::Variant {
            return Err(Error::InvalidTag(tag as u8));
        }
        self.dec.variant().map(Some)
    }
}
