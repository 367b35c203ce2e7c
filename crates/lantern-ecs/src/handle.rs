//! Monotonic handles for records that live inside a component (status
//! effects, sensor commands, views).
//!
//! Handles are never reused within one allocator, so a revoked handle can
//! never alias a newer record.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A typed, never-reused handle. `Tag` only distinguishes handle families.
pub struct Handle<Tag> {
    raw: u64,
    _tag: PhantomData<fn() -> Tag>,
}

impl<Tag> Handle<Tag> {
    pub fn from_raw(raw: u64) -> Self {
        Self {
            raw,
            _tag: PhantomData,
        }
    }

    pub fn to_raw(self) -> u64 {
        self.raw
    }
}

// Manual impls: derives would put bounds on `Tag`.
impl<Tag> Clone for Handle<Tag> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Tag> Copy for Handle<Tag> {}

impl<Tag> PartialEq for Handle<Tag> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<Tag> Eq for Handle<Tag> {}

impl<Tag> std::hash::Hash for Handle<Tag> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<Tag> fmt::Debug for Handle<Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = std::any::type_name::<Tag>();
        let short = full.rsplit("::").next().unwrap_or(full);
        write!(f, "Handle<{short}>({})", self.raw)
    }
}

impl<Tag> Serialize for Handle<Tag> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.raw)
    }
}

impl<'de, Tag> Deserialize<'de> for Handle<Tag> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(Self::from_raw)
    }
}

/// Issues handles of one family in increasing order.
pub struct HandleAllocator<Tag> {
    next: u64,
    _tag: PhantomData<fn() -> Tag>,
}

impl<Tag> HandleAllocator<Tag> {
    pub fn new() -> Self {
        Self {
            next: 0,
            _tag: PhantomData,
        }
    }

    pub fn next(&mut self) -> Handle<Tag> {
        let handle = Handle::from_raw(self.next);
        self.next += 1;
        handle
    }
}

impl<Tag> Default for HandleAllocator<Tag> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tag> fmt::Debug for HandleAllocator<Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleAllocator")
            .field("next", &self.next)
            .finish()
    }
}
