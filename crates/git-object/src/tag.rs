use bstr::{BStr, BString, ByteSlice};
use git_hash::ObjectId;
use git_utils::date::Signature;

use crate::{ObjectError, ObjectType};

/// A git annotated tag object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// OID of the tagged object.
    pub target: ObjectId,
    /// Type of the tagged object, when the tag declares it.
    pub target_type: Option<ObjectType>,
    /// Tag name.
    pub tag_name: Option<BString>,
    /// Tagger identity and timestamp (absent on some old tags).
    pub tagger: Option<Signature>,
    /// Tag message.
    pub message: BString,
}

impl Tag {
    /// Parse tag content from raw bytes (no object header).
    ///
    /// Only the `object` header is mandatory; it is all that dereferencing
    /// a tag needs.
    pub fn parse(content: &[u8]) -> Result<Self, ObjectError> {
        let mut target = None;
        let mut target_type = None;
        let mut tag_name = None;
        let mut tagger = None;

        let mut pos = 0;
        while pos < content.len() && content[pos] != b'\n' {
            let line_end = content[pos..]
                .find_byte(b'\n')
                .map(|p| p + pos)
                .unwrap_or(content.len());
            let line = &content[pos..line_end];

            if let Some((key, value)) = line.split_once_str(" ") {
                match key {
                    b"object" => target = Some(ObjectId::from_hex(value)?),
                    b"type" => target_type = Some(ObjectType::from_bytes(value)?),
                    b"tag" => tag_name = Some(BString::from(value)),
                    b"tagger" => {
                        let sig = Signature::parse(BStr::new(value)).map_err(|e| {
                            ObjectError::InvalidSignature {
                                field: "tagger",
                                reason: e.to_string(),
                            }
                        })?;
                        tagger = Some(sig);
                    }
                    _ => {}
                }
            }
            pos = line_end + 1;
        }

        let message = content.get(pos + 1..).unwrap_or_default();
        let target = target.ok_or(ObjectError::MissingTagField { field: "object" })?;

        Ok(Self {
            target,
            target_type,
            tag_name,
            tagger,
            message: BString::from(message),
        })
    }

    /// The tagged object's id, read from the `object` header alone.
    ///
    /// Other headers are not looked at, so a malformed `tagger` or `type`
    /// line does not stop a tag from being dereferenced.
    pub fn parse_target(content: &[u8]) -> Result<ObjectId, ObjectError> {
        content
            .lines()
            .take_while(|line| !line.is_empty())
            .find_map(|line| line.strip_prefix(b"object "))
            .ok_or(ObjectError::MissingTagField { field: "object" })
            .and_then(|hex| ObjectId::from_hex(hex).map_err(ObjectError::from))
    }
}
