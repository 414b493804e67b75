use plume_crypto::DomainHasher;
use plume_types::{AuthorId, StorageKey, UnixTimestamp};
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Maximum topic length, in characters.
pub const TOPIC_MAX_CHARS: usize = 50;
/// Maximum content length, in characters.
pub const CONTENT_MAX_CHARS: usize = 280;

const DISCRIMINATOR_LEN: usize = 8;
const LEN_PREFIX: usize = 4;
const MAX_UTF8_WIDTH: usize = 4;

/// A single immutable post.
///
/// Byte layout (little-endian, fixed for the lifetime of the format):
///
/// ```text
/// [8  discriminator][32 author][8 created_at i64]
/// [4  topic len u32][topic utf-8][4 content len u32][content utf-8]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub author: AuthorId,
    pub created_at: UnixTimestamp,
    pub topic: String,
    pub content: String,
}

impl PostRecord {
    /// Largest possible encoding of a record that respects the field limits.
    pub const MAX_ENCODED_LEN: usize = DISCRIMINATOR_LEN
        + 32
        + 8
        + LEN_PREFIX
        + TOPIC_MAX_CHARS * MAX_UTF8_WIDTH
        + LEN_PREFIX
        + CONTENT_MAX_CHARS * MAX_UTF8_WIDTH;

    /// Type tag written at the start of every encoded post record.
    pub fn discriminator() -> [u8; DISCRIMINATOR_LEN] {
        DomainHasher::ACCOUNT.discriminator("PostRecord")
    }

    /// Encode into the stable byte layout.
    ///
    /// Field limits are not checked here; the ledger program rejects
    /// oversized fields before a record is ever built.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            DISCRIMINATOR_LEN + 32 + 8 + 2 * LEN_PREFIX + self.topic.len() + self.content.len(),
        );
        buf.extend_from_slice(&Self::discriminator());
        buf.extend_from_slice(self.author.as_bytes());
        buf.extend_from_slice(&self.created_at.as_secs().to_le_bytes());
        put_str(&mut buf, &self.topic);
        put_str(&mut buf, &self.content);
        buf
    }

    /// Decode from the stable byte layout, enforcing the field limits.
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut reader = Reader { data, offset: 0 };

        if reader.take(DISCRIMINATOR_LEN)? != Self::discriminator() {
            return Err(CodecError::Discriminator);
        }
        let author = AuthorId::from_bytes(reader.array::<32>()?);
        let created_at = UnixTimestamp::from_secs(i64::from_le_bytes(reader.array::<8>()?));
        let topic = reader.string("topic", TOPIC_MAX_CHARS)?;
        let content = reader.string("content", CONTENT_MAX_CHARS)?;

        let trailing = data.len() - reader.offset;
        if trailing != 0 {
            return Err(CodecError::TrailingBytes(trailing));
        }

        Ok(Self {
            author,
            created_at,
            topic,
            content,
        })
    }
}

/// A decoded record together with the key it lives under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPost {
    pub key: StorageKey,
    #[serde(flatten)]
    pub record: PostRecord,
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    // Field limits keep every string far below u32::MAX bytes.
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .offset
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or(CodecError::Truncated {
                offset: self.offset,
                needed: n,
            })?;
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn string(&mut self, field: &'static str, max_chars: usize) -> Result<String, CodecError> {
        let len = u32::from_le_bytes(self.array::<{ LEN_PREFIX }>()?) as usize;
        let bytes = self.take(len)?;
        let s = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8 { field })?;
        let chars = s.chars().count();
        if chars > max_chars {
            return Err(CodecError::FieldTooLong {
                field,
                chars,
                max: max_chars,
            });
        }
        Ok(s.to_owned())
    }
}
