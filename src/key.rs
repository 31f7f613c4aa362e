//! Key trait for units of computation.

use std::fmt::Debug;
use std::hash::Hash;

/// Identifier of one unit of incremental computation.
///
/// A key is an immutable value: two keys are equal iff they have the same
/// kind and the same payload. The kind is a closed discriminant (usually a
/// fieldless enum) used to look up the [`Function`](crate::Function) that
/// computes keys of that kind.
///
/// # Example
///
/// ```
/// use restart_flow::Key;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Kind {
///     Source,
///     Parsed,
/// }
///
/// #[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// enum MyKey {
///     Source(String),
///     Parsed(String),
/// }
///
/// impl Key for MyKey {
///     type Kind = Kind;
///
///     fn kind(&self) -> Kind {
///         match self {
///             MyKey::Source(_) => Kind::Source,
///             MyKey::Parsed(_) => Kind::Parsed,
///         }
///     }
/// }
///
/// assert_eq!(MyKey::Parsed("a".into()).kind(), Kind::Parsed);
/// ```
pub trait Key: Clone + Eq + Hash + Debug + 'static {
    /// Discriminant selecting the function registered for this key.
    type Kind: Copy + Eq + Hash + Debug + 'static;

    /// Get the kind of this key.
    fn kind(&self) -> Self::Kind;
}

/// Render a key for errors and trace output.
pub(crate) fn debug_repr<K: Debug>(key: &K) -> String {
    format!("{:?}", key)
}


#[cfg(test)]
mod tests {
    use super::test_keys::{Kind, TestKey};
    use super::*;

    #[test]
    fn test_equal_payload_different_kind() {
        assert_ne!(TestKey::Leaf("a"), TestKey::Sum("a"));
        assert_eq!(TestKey::Leaf("a"), TestKey::Leaf("a"));
        assert_eq!(TestKey::Sum("a").kind(), Kind::Sum);
    }

    #[test]
    fn test_debug_repr() {
        assert_eq!(debug_repr(&TestKey::Leaf("x")), "Leaf(\"x\")");
    }
}
