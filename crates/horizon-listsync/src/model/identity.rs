//! Identity tokens for managed items.
//!
//! Every time an item is attached to a list it receives a fresh [`ItemId`].
//! The token is stamped on its native row under [`ID_PROPERTY`], so a late
//! callback (image load, metadata fetch) can capture the token, do its work
//! off the UI thread, and check the token again before applying the result.
//! Tokens are never reused by the allocator that issued them.

use std::fmt;
use std::str::FromStr;

/// Reserved row property holding the identity token.
pub const ID_PROPERTY: &str = "__ID__";

/// Row property holding the row's display position, written on refresh.
pub const INDEX_PROPERTY: &str = "index";

/// A strictly increasing identity token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

impl ItemId {
    /// Get the raw u64 value of this token.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(ItemId)
    }
}

/// Issues identity tokens for one list.
#[derive(Debug, Default)]
pub struct IdentityAllocator {
    last: u64,
}

impl IdentityAllocator {
    /// Create an allocator; the first token issued is `1`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next token.
    pub fn next_id(&mut self) -> ItemId {
        self.last += 1;
        ItemId(self.last)
    }

    /// The most recently issued token, if any.
    pub fn last_issued(&self) -> Option<ItemId> {
        (self.last > 0).then_some(ItemId(self.last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_strictly_increase() {
        let mut ids = IdentityAllocator::new();
        assert_eq!(ids.last_issued(), None);

        let a = ids.next_id();
        let b = ids.next_id();
        let c = ids.next_id();
        assert!(a < b && b < c);
        assert_eq!(a.as_u64(), 1);
        assert_eq!(ids.last_issued(), Some(c));
    }

    #[test]
    fn test_token_string_round_trip() {
        let mut ids = IdentityAllocator::new();
        let id = ids.next_id();
        assert_eq!(id.to_string(), "1");
        assert_eq!("1".parse::<ItemId>().unwrap(), id);
        assert!("".parse::<ItemId>().is_err());
    }
}
