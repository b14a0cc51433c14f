use std::sync::Arc;

use git_hash::ObjectId;
use git_object::RawObject;
use git_pack::PackError;
use tracing::trace;

use crate::{ObjectDatabase, OdbError};

/// Look `oid` up in the packs, then in the loose store.
///
/// `depth` is the delta-chain depth already spent by an enclosing
/// resolution when this lookup is for a REF_DELTA base.
pub(crate) fn find_object(
    odb: &ObjectDatabase,
    oid: &ObjectId,
    depth: usize,
) -> Result<Option<Arc<RawObject>>, OdbError> {
    let resolve_base = |base: &ObjectId, depth: usize| -> Result<Arc<RawObject>, PackError> {
        match find_object(odb, base, depth) {
            Ok(Some(obj)) => Ok(obj),
            Ok(None) => Err(PackError::MissingBase(*base)),
            Err(OdbError::Pack(e)) => Err(e),
            Err(e) => Err(PackError::Base {
                oid: *base,
                kind: e.kind(),
                source: Box::new(e),
            }),
        }
    };

    if let Some(obj) = odb.packs.resolve_at_depth(oid, depth, &resolve_base)? {
        return Ok(Some(obj));
    }

    trace!(%oid, "not in any pack index, trying loose store");
    Ok(odb.loose.read(oid)?.map(Arc::new))
}
