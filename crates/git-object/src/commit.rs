use std::ops::Range;

use bstr::{BStr, ByteSlice};
use git_hash::ObjectId;
use git_utils::date::Signature;
use once_cell::sync::OnceCell;

use crate::ObjectError;

/// A parsed commit body.
///
/// `tree` and `parents` are decoded up front since every traversal needs
/// them. The author and committer lines are only located; they are parsed
/// on first access and the result is kept, so a malformed signature is
/// reported by [`author`](Commit::author) / [`committer`](Commit::committer)
/// rather than by [`parse`](Commit::parse).
#[derive(Debug, Clone)]
pub struct Commit {
    tree: ObjectId,
    parents: Vec<ObjectId>,
    raw: Vec<u8>,
    author_line: Option<Range<usize>>,
    committer_line: Option<Range<usize>>,
    message_start: usize,
    author: OnceCell<Signature>,
    committer: OnceCell<Signature>,
}

impl Commit {
    /// Parse commit content from raw bytes (no object header).
    pub fn parse(content: impl Into<Vec<u8>>) -> Result<Self, ObjectError> {
        let raw = content.into();
        let mut tree = None;
        let mut parents = Vec::new();
        let mut author_line = None;
        let mut committer_line = None;

        let mut pos = 0;
        let message_start = loop {
            if pos >= raw.len() {
                break raw.len();
            }
            // A blank line separates headers from message.
            if raw[pos] == b'\n' {
                break pos + 1;
            }

            let line_end = raw[pos..]
                .find_byte(b'\n')
                .map(|p| p + pos)
                .unwrap_or(raw.len());
            let line = &raw[pos..line_end];

            // Continuation lines of multi-line headers (gpgsig, mergetag)
            // start with a space and have no key.
            if let Some((key, value)) = line.split_once_str(" ") {
                let value_start = pos + key.len() + 1;
                match key {
                    b"tree" if tree.is_none() => tree = Some(ObjectId::from_hex(value)?),
                    b"parent" => parents.push(ObjectId::from_hex(value)?),
                    b"author" if author_line.is_none() => {
                        author_line = Some(value_start..line_end)
                    }
                    b"committer" if committer_line.is_none() => {
                        committer_line = Some(value_start..line_end)
                    }
                    _ => {}
                }
            }

            pos = line_end + 1;
        };

        let tree = tree.ok_or(ObjectError::MissingCommitField { field: "tree" })?;

        Ok(Self {
            tree,
            parents,
            raw,
            author_line,
            committer_line,
            message_start,
            author: OnceCell::new(),
            committer: OnceCell::new(),
        })
    }

    /// OID of the root tree.
    pub fn tree(&self) -> &ObjectId {
        &self.tree
    }

    /// Parent OIDs in the order they appear in the body (empty for a root commit).
    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    /// The first (mainline) parent.
    pub fn first_parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    /// Check if this is a merge commit (more than one parent).
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// Author identity and timestamp, parsed on first call.
    pub fn author(&self) -> Result<&Signature, ObjectError> {
        self.author
            .get_or_try_init(|| self.parse_signature("author", self.author_line.clone()))
    }

    /// Committer identity and timestamp, parsed on first call.
    pub fn committer(&self) -> Result<&Signature, ObjectError> {
        self.committer
            .get_or_try_init(|| self.parse_signature("committer", self.committer_line.clone()))
    }

    /// Everything after the first blank line, trimmed of surrounding whitespace.
    pub fn message(&self) -> &BStr {
        self.raw[self.message_start..].trim().as_bstr()
    }

    /// The undecoded commit body.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    fn parse_signature(
        &self,
        field: &'static str,
        line: Option<Range<usize>>,
    ) -> Result<Signature, ObjectError> {
        let line = line.ok_or(ObjectError::MissingCommitField { field })?;
        Signature::parse(self.raw[line].as_bstr()).map_err(|e| ObjectError::InvalidSignature {
            field,
            reason: e.to_string(),
        })
    }
}

impl PartialEq for Commit {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Commit {}
