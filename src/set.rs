use std::collections::HashSet;
use std::collections::hash_set;
use std::fmt;
use std::hash::Hash;

/// Unordered collection of unique elements.
///
/// Algebra operations (`union`, `intersection`, ...) build a new set and
/// leave both operands untouched. Iteration order is unspecified.
#[derive(Debug, Clone)]
pub struct Set<T: Eq + Hash> {
    items: HashSet<T>,
}

impl<T: Eq + Hash> Set<T> {
    pub fn new() -> Self {
        Self {
            items: HashSet::new(),
        }
    }

    pub fn add(&mut self, t: T) {
        self.items.insert(t);
    }

    pub fn remove(&mut self, t: &T) {
        self.items.remove(t);
    }

    pub fn contains(&self, t: &T) -> bool {
        self.items.contains(t)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> hash_set::Iter<'_, T> {
        self.items.iter()
    }

    /// True iff every element of `self` is in `other`. Vacuously true when
    /// `self` is empty.
    pub fn is_subset(&self, other: &Set<T>) -> bool {
        self.items.iter().all(|t| other.contains(t))
    }

    pub fn is_superset(&self, other: &Set<T>) -> bool {
        other.is_subset(self)
    }

    pub fn is_disjoint(&self, other: &Set<T>) -> bool {
        !self.items.iter().any(|t| other.contains(t))
    }

    pub fn equal(&self, other: &Set<T>) -> bool {
        self.is_subset(other) && other.is_subset(self)
    }
}

impl<T: Eq + Hash + Clone> Set<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }

    pub fn union(&self, other: &Set<T>) -> Set<T> {
        self.iter().chain(other.iter()).cloned().collect()
    }

    pub fn intersection(&self, other: &Set<T>) -> Set<T> {
        self.iter().filter(|t| other.contains(t)).cloned().collect()
    }

    pub fn difference(&self, other: &Set<T>) -> Set<T> {
        self.iter().filter(|t| !other.contains(t)).cloned().collect()
    }

    pub fn symmetric_difference(&self, other: &Set<T>) -> Set<T> {
        let mut out = self.difference(other);
        out.extend(other.iter().filter(|t| !self.contains(t)).cloned());
        out
    }
}

impl<T: Eq + Hash> Default for Set<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash> PartialEq for Set<T> {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

impl<T: Eq + Hash> Eq for Set<T> {}

impl<T: Eq + Hash> FromIterator<T> for Set<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T: Eq + Hash> Extend<T> for Set<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<T: Eq + Hash> From<Vec<T>> for Set<T> {
    fn from(ts: Vec<T>) -> Self {
        ts.into_iter().collect()
    }
}

impl<T: Eq + Hash, const N: usize> From<[T; N]> for Set<T> {
    fn from(ts: [T; N]) -> Self {
        ts.into_iter().collect()
    }
}

impl<T: Eq + Hash> IntoIterator for Set<T> {
    type Item = T;
    type IntoIter = hash_set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T: Eq + Hash> IntoIterator for &'a Set<T> {
    type Item = &'a T;
    type IntoIter = hash_set::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Eq + Hash + fmt::Display> fmt::Display for Set<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, t) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", t)?;
        }
        write!(f, "}}")
    }
}
