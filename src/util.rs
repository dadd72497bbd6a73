use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

/// Arena reference whose identity for equality, ordering, and hashing is the address it points
/// to rather than the data behind it.
///
/// Two types in the graph can share a name (eg. before and after a bad merge), but they are never
/// the same allocation.
pub struct RefId<'a, T: ?Sized>(pub &'a T);

impl<'a, T: ?Sized> Clone for RefId<'a, T> {
    fn clone(&self) -> Self {
        RefId(self.0)
    }
}

impl<'a, T: ?Sized> Copy for RefId<'a, T> {}

impl<'a, T: ?Sized> Hash for RefId<'a, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.0 as *const T as *const u8, state)
    }
}

impl<'a, 'b, T: ?Sized> PartialEq<RefId<'b, T>> for RefId<'a, T> {
    fn eq(&self, other: &RefId<'b, T>) -> bool {
        std::ptr::eq(self.0 as *const T as *const u8, other.0 as *const T as *const u8)
    }
}

impl<'a, T: ?Sized> Eq for RefId<'a, T> {}

impl<'a, T: ?Sized> PartialOrd for RefId<'a, T> {
    fn partial_cmp(&self, other: &RefId<'a, T>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'a, T: ?Sized> Ord for RefId<'a, T> {
    fn cmp(&self, other: &RefId<'a, T>) -> Ordering {
        (self.0 as *const T as *const u8).cmp(&(other.0 as *const T as *const u8))
    }
}

impl<'a, T: ?Sized> Deref for RefId<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.0
    }
}

impl<'a, T: ?Sized + fmt::Debug> fmt::Debug for RefId<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod test {
    use super::RefId;
    use std::collections::HashSet;

    #[test]
    fn identity_is_by_address() {
        let first = String::from("same");
        let second = String::from("same");

        assert_ne!(RefId(&first), RefId(&second));
        assert_eq!(RefId(&first), RefId(&first));

        let set: HashSet<RefId<String>> = vec![RefId(&first), RefId(&second), RefId(&first)]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }
}
