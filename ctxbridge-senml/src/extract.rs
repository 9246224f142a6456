//! Typed value extraction from measurement packs
//!
//! Extraction is scoped by vocabulary URN: a resource id only has meaning
//! among the readings that follow a base-type marker naming that URN, up to
//! the next marker. Without the marker nothing is found, even if a reading
//! happens to carry the requested name. A pack may carry several markers, one
//! per object it reports.
//!
//! Some sensors report a primary and an auxiliary instance of the same
//! quantity under one resource id. The first occurrence in pack order is the
//! authoritative one; later occurrences are ignored by [`get`].

use crate::{BASE_TYPE_MARKER, Pack, Record};

/// Types that can be read out of a single reading's value slot
pub trait Extract: Sized {
    fn extract(record: &Record) -> Option<Self>;
}

impl Extract for f64 {
    fn extract(record: &Record) -> Option<Self> {
        record.v
    }
}

impl Extract for bool {
    fn extract(record: &Record) -> Option<Self> {
        record.vb
    }
}

impl Extract for String {
    fn extract(record: &Record) -> Option<Self> {
        record.vs.clone()
    }
}

/// Return the value of the first reading named `resource_id`
///
/// Returns `None` when the pack does not declare `urn`, when no reading
/// carries `resource_id`, or when the first such reading stores a value of a
/// different type than requested.
pub fn get<T: Extract>(pack: &Pack, urn: &str, resource_id: &str) -> Option<T> {
    scoped(pack, urn)
        .find(|r| r.name() == Some(resource_id))
        .and_then(T::extract)
}

/// Iterate over every reading named `resource_id` that holds a `T`, in pack order
///
/// Yields nothing when the pack does not declare `urn`.
pub fn get_all<'a, T: Extract + 'a>(
    pack: &'a Pack,
    urn: &'a str,
    resource_id: &'a str,
) -> impl Iterator<Item = (&'a Record, T)> + 'a {
    scoped(pack, urn)
        .filter(move |r| r.name() == Some(resource_id))
        .filter_map(|r| T::extract(r).map(|value| (r, value)))
}

/// Readings belonging to markers that name `urn`, in pack order
fn scoped<'a>(pack: &'a Pack, urn: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
    pack.iter()
        .scan(false, move |inside, record| {
            if record.name() == Some(BASE_TYPE_MARKER) {
                *inside = record.vs.as_deref() == Some(urn);
                return Some(None);
            }
            Some(inside.then_some(record))
        })
        .flatten()
}
