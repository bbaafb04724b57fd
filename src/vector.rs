use std::fmt;
use std::ops::Range;
use std::slice;
use log::{debug, trace};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use crate::error::Result;

// --- Backing ---

enum Backing<'a, T> {
    Owned(Vec<T>),
    /// Window over a buffer owned by someone else: skips `start` elements
    /// at the front and `tail` at the back, so enclosing views stay valid
    /// while a nested one resizes. Growth and shrinkage go straight through
    /// to that buffer.
    View {
        buf: &'a mut Vec<T>,
        start: usize,
        tail: usize,
    },
}

fn window(len: usize, start: usize, tail: usize) -> Range<usize> {
    start..len - tail
}

// --- Vector ---

/// Ordered, resizable sequence that either owns its elements or is a view
/// over a caller's `Vec`.
///
/// Index operations never panic: an out-of-range index makes them return
/// `false` or `None` and leaves the vector untouched.
///
/// A vector built with [`Vector::from_ref`] or returned by [`Vector::slice`]
/// writes through to the underlying buffer, so the owner sees every change
/// once the borrow ends.
pub struct Vector<'a, T> {
    vs: Option<Backing<'a, T>>,
}

impl<'a, T> Vector<'a, T> {
    /// Empty vector with no backing buffer; one is allocated on first growth.
    pub fn new() -> Self {
        Vector { vs: None }
    }

    /// Wraps `buf` by reference.
    pub fn from_ref(buf: &'a mut Vec<T>) -> Self {
        Vector {
            vs: Some(Backing::View { buf, start: 0, tail: 0 }),
        }
    }

    fn as_slice(&self) -> &[T] {
        match &self.vs {
            None => &[],
            Some(Backing::Owned(v)) => v,
            Some(Backing::View { buf, start, tail }) => &buf[window(buf.len(), *start, *tail)],
        }
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        match &mut self.vs {
            None => &mut [],
            Some(Backing::Owned(v)) => v,
            Some(Backing::View { buf, start, tail }) => {
                let w = window(buf.len(), *start, *tail);
                &mut buf[w]
            }
        }
    }

    // Caller guarantees i <= len.
    fn insert_at(&mut self, i: usize, t: T) {
        match self.vs.get_or_insert_with(|| Backing::Owned(Vec::new())) {
            Backing::Owned(v) => v.insert(i, t),
            Backing::View { buf, start, .. } => buf.insert(*start + i, t),
        }
    }

    // Caller guarantees i < len.
    fn remove_at(&mut self, i: usize) -> Option<T> {
        match &mut self.vs {
            None => None,
            Some(Backing::Owned(v)) => Some(v.remove(i)),
            Some(Backing::View { buf, start, .. }) => Some(buf.remove(*start + i)),
        }
    }

    fn truncate(&mut self, n: usize) {
        match &mut self.vs {
            None => {}
            Some(Backing::Owned(v)) => v.truncate(n),
            Some(Backing::View { buf, start, tail }) => {
                let w = window(buf.len(), *start, *tail);
                if w.start + n < w.end {
                    buf.drain(w.start + n..w.end);
                }
            }
        }
    }

    fn in_range(&self, i: usize) -> bool {
        let len = self.len();
        if i < len {
            true
        } else {
            trace!("vector: index {} out of range (len {})", i, len);
            false
        }
    }

    pub fn push(&mut self, t: T) {
        let n = self.len();
        self.insert_at(n, t);
    }

    pub fn pop(&mut self) -> Option<T> {
        match self.len() {
            0 => None,
            n => self.remove_at(n - 1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    pub fn at(&self, i: usize) -> Option<&T> {
        if !self.in_range(i) {
            return None;
        }
        self.as_slice().get(i)
    }

    /// Overwrites the element at `i`. Returns `false` without touching the
    /// vector if `i` is out of range.
    pub fn set(&mut self, i: usize, t: T) -> bool {
        if !self.in_range(i) {
            return false;
        }
        self.as_mut_slice()[i] = t;
        true
    }

    /// Inserts `t` at `i`, shifting the rest right. `i` must name an existing
    /// element: `insert(len, t)` is rejected, use `push` to append.
    pub fn insert(&mut self, i: usize, t: T) -> bool {
        if !self.in_range(i) {
            return false;
        }
        self.insert_at(i, t);
        true
    }

    pub fn delete(&mut self, i: usize) -> bool {
        if !self.in_range(i) {
            return false;
        }
        self.remove_at(i).is_some()
    }

    /// Removes the first element equal to `t`.
    pub fn remove(&mut self, t: &T) -> bool
    where
        T: PartialEq,
    {
        match self.as_slice().iter().position(|item| item == t) {
            Some(i) => self.delete(i),
            None => false,
        }
    }

    pub fn swap(&mut self, i: usize, j: usize) -> bool {
        if !self.in_range(i) || !self.in_range(j) {
            return false;
        }
        self.as_mut_slice().swap(i, j);
        true
    }

    /// View over `[i, j)` sharing this vector's buffer.
    ///
    /// Both `i` and `j` must be valid element indices, so `j == len` is
    /// rejected and a view can never reach the last element. `i > j` is
    /// rejected as well.
    pub fn slice(&mut self, i: usize, j: usize) -> Option<Vector<'_, T>> {
        if !self.in_range(i) || !self.in_range(j) || i > j {
            return None;
        }
        let vs = match &mut self.vs {
            None => return None,
            Some(Backing::Owned(v)) => {
                let tail = v.len() - j;
                Backing::View { buf: v, start: i, tail }
            }
            Some(Backing::View { buf, start, .. }) => {
                let tail = buf.len() - (*start + j);
                Backing::View {
                    buf: &mut **buf,
                    start: *start + i,
                    tail,
                }
            }
        };
        Some(Vector { vs: Some(vs) })
    }

    pub fn reverse(&mut self) {
        self.as_mut_slice().reverse();
    }

    pub fn foreach<F: FnMut(&T)>(&self, mut f: F) {
        for item in self.as_slice() {
            f(item);
        }
    }

    pub fn foreach_index<F: FnMut(usize, &T)>(&self, mut f: F) {
        for (i, item) in self.as_slice().iter().enumerate() {
            f(i, item);
        }
    }

    pub fn filter<F: Fn(&T) -> bool>(&self, f: F) -> Vector<'static, T>
    where
        T: Clone,
    {
        self.iter().filter(|t| f(t)).cloned().collect()
    }

    pub fn map<F: FnMut(&T) -> T>(&self, f: F) -> Vector<'static, T> {
        self.iter().map(f).collect()
    }

    /// Left fold seeded with `T::default()`, not with the first element.
    pub fn reduce<F: FnMut(T, &T) -> T>(&self, f: F) -> T
    where
        T: Default,
    {
        self.iter().fold(T::default(), f)
    }

    pub fn reduce_index<F: FnMut(usize, T, &T) -> T>(&self, mut f: F) -> T
    where
        T: Default,
    {
        self.iter()
            .enumerate()
            .fold(T::default(), |acc, (i, t)| f(i, acc, t))
    }

    pub fn find<F: Fn(&T) -> bool>(&self, f: F) -> Option<&T> {
        self.iter().find(|t| f(t))
    }

    pub fn find_index<F: Fn(&T) -> bool>(&self, f: F) -> Option<usize> {
        self.iter().position(|t| f(t))
    }

    pub fn find_last<F: Fn(&T) -> bool>(&self, f: F) -> Option<&T> {
        self.iter().rev().find(|t| f(t))
    }

    pub fn find_last_index<F: Fn(&T) -> bool>(&self, f: F) -> Option<usize> {
        self.iter().rposition(|t| f(t))
    }

    /// The live elements. Writes through the returned slice land in the
    /// vector (and in the caller's buffer for a view).
    pub fn prototype(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }

    pub fn collect(&self) -> &[T] {
        self.as_slice()
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Detaches into an owned `Vec`, copying when this is a view.
    pub fn into_vec(self) -> Vec<T>
    where
        T: Clone,
    {
        match self.vs {
            None => Vec::new(),
            Some(Backing::Owned(v)) => v,
            Some(Backing::View { buf, start, tail }) => buf[window(buf.len(), start, tail)].to_vec(),
        }
    }

    pub fn marshal_json(&self) -> Result<String>
    where
        T: Serialize,
    {
        Ok(serde_json::to_string(self)?)
    }

    /// Replaces the contents with the decoded JSON array. The new elements
    /// live in a fresh owned buffer, so any link to a borrowed buffer is
    /// dropped. On error the vector is left as it was.
    pub fn unmarshal_json(&mut self, bytes: &[u8]) -> Result<()>
    where
        T: DeserializeOwned,
    {
        let items: Vec<T> = serde_json::from_slice(bytes)?;
        if matches!(self.vs, Some(Backing::View { .. })) {
            debug!("vector: unmarshal detaches view ({} -> {} elements)", self.len(), items.len());
        }
        self.vs = Some(Backing::Owned(items));
        Ok(())
    }
}

impl<T> Default for Vector<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for Vector<'_, T> {
    fn from(v: Vec<T>) -> Self {
        Vector {
            vs: Some(Backing::Owned(v)),
        }
    }
}

impl<T> FromIterator<T> for Vector<'_, T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Vector::from(iter.into_iter().collect::<Vec<T>>())
    }
}

impl<'v, T> IntoIterator for &'v Vector<'_, T> {
    type Item = &'v T;
    type IntoIter = slice::Iter<'v, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for Vector<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: fmt::Debug> fmt::Debug for Vector<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for Vector<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, t) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", t)?;
        }
        write!(f, "]")
    }
}

// --- JSON ---

impl<T: Serialize> Serialize for Vector<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.as_slice().serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Vector<'_, T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Vector::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn v123() -> Vector<'static, i32> {
        Vector::from(vec![1, 2, 3])
    }

    #[test]
    fn push_initializes_nil_backing() {
        let mut v = Vector::new();
        assert!(v.is_empty());
        assert_eq!(v.len(), 0);
        v.push(5);
        assert_eq!(v.collect(), &[5]);
    }

    #[test]
    fn push_pop_round_trip() {
        let mut v = v123();
        v.push(4);
        assert_eq!(v.len(), 4);
        assert_eq!(v.pop(), Some(4));
        assert_eq!(v.len(), 3);
        assert_eq!(v.collect(), &[1, 2, 3]);
    }

    #[test]
    fn pop_empty() {
        let mut v: Vector<i32> = Vector::new();
        assert_eq!(v.pop(), None);
        let mut v: Vector<i32> = Vector::from(vec![]);
        assert_eq!(v.pop(), None);
    }

    #[test]
    fn clear() {
        let mut v = v123();
        v.clear();
        assert!(v.is_empty());
        v.push(8);
        assert_eq!(v.collect(), &[8]);
    }

    #[test]
    fn at_and_set() {
        let mut v = v123();
        assert_eq!(v.at(0), Some(&1));
        assert_eq!(v.at(2), Some(&3));
        assert_eq!(v.at(3), None);
        assert_eq!(v.at(usize::MAX), None);
        assert_eq!(Vector::<i32>::new().at(0), None);

        assert!(v.set(1, 20));
        assert!(!v.set(3, 99));
        assert_eq!(v.collect(), &[1, 20, 3]);
    }

    #[test]
    fn insert_shifts_right() {
        let mut v = v123();
        assert!(v.insert(0, 0));
        assert_eq!(v.collect(), &[0, 1, 2, 3]);
        assert!(v.insert(3, 9));
        assert_eq!(v.collect(), &[0, 1, 2, 9, 3]);
    }

    #[test]
    fn insert_rejects_len() {
        let mut v = v123();
        assert!(!v.insert(3, 4));
        assert!(!v.insert(10, 4));
        assert_eq!(v.collect(), &[1, 2, 3]);

        let mut empty: Vector<i32> = Vector::new();
        assert!(!empty.insert(0, 1));
        assert!(empty.is_empty());
    }

    #[test]
    fn delete() {
        let mut v = Vector::from(vec![1, 2, 3, 4, 5]);
        assert!(v.delete(2));
        assert_eq!(v.len(), 4);
        assert_eq!(&v.collect()[..2], &[1, 2]);
        assert_eq!(v.collect(), &[1, 2, 4, 5]);
        assert!(!v.delete(4));
        assert_eq!(v.len(), 4);
    }

    #[test]
    fn remove_first_match() {
        let mut v = v123();
        assert!(v.remove(&2));
        assert_eq!(v.collect(), &[1, 3]);
        assert_eq!(v.len(), 2);
        assert!(!v.remove(&2));

        let mut d = Vector::from(vec!["a", "b", "a"]);
        assert!(d.remove(&"a"));
        assert_eq!(d.collect(), &["b", "a"]);
    }

    #[test]
    fn swap() {
        let mut v = v123();
        assert!(v.swap(0, 2));
        assert_eq!(v.collect(), &[3, 2, 1]);
        assert!(!v.swap(0, 3));
        assert_eq!(v.collect(), &[3, 2, 1]);
    }

    #[test]
    fn slice_bounds_are_strict() {
        let mut v = v123();
        {
            let s = v.slice(0, 2).expect("0..2 is accepted");
            assert_eq!(s.collect(), &[1, 2]);
        }
        assert!(v.slice(0, 3).is_none());
        assert!(v.slice(3, 3).is_none());
        assert!(v.slice(2, 1).is_none());
        let s = v.slice(1, 1).expect("empty view");
        assert!(s.is_empty());
    }

    #[test]
    fn slice_is_a_view() {
        let mut v = Vector::from(vec![1, 2, 3, 4]);
        {
            let mut s = v.slice(1, 3).unwrap();
            assert!(s.set(0, 20));
            s.push(9);
            assert_eq!(s.collect(), &[20, 3, 9]);
        }
        assert_eq!(v.collect(), &[1, 20, 3, 9, 4]);
        {
            let mut s = v.slice(0, 4).unwrap();
            assert_eq!(s.pop(), Some(9));
            assert!(s.delete(0));
            s.reverse();
            assert_eq!(s.collect(), &[3, 20]);
        }
        assert_eq!(v.collect(), &[3, 20, 4]);
    }

    #[test]
    fn nested_slice() {
        let mut v = Vector::from(vec![0, 1, 2, 3, 4, 5]);
        {
            let mut s = v.slice(1, 5).unwrap();
            let mut ss = s.slice(1, 3).unwrap();
            assert_eq!(ss.collect(), &[2, 3]);
            ss.clear();
        }
        assert_eq!(v.collect(), &[0, 1, 4, 5]);
    }

    #[test]
    fn outer_view_tracks_nested_resize() {
        let mut v = Vector::from(vec![0, 1, 2, 3, 4, 5]);
        let mut s = v.slice(1, 5).unwrap();
        {
            let mut ss = s.slice(0, 2).unwrap();
            assert!(ss.delete(0));
            ss.push(7);
            ss.push(8);
        }
        assert_eq!(s.collect(), &[2, 7, 8, 3, 4]);
        assert_eq!(s.len(), 5);
        s.clear();
        assert!(s.is_empty());
        drop(s);
        assert_eq!(v.collect(), &[0, 5]);
    }

    #[test]
    fn from_ref_aliases_caller_buffer() {
        let mut buf = vec![1, 2, 3];
        {
            let mut v = Vector::from_ref(&mut buf);
            v.push(4);
            assert!(v.set(0, 10));
            v.prototype()[1] = 20;
        }
        assert_eq!(buf, vec![10, 20, 3, 4]);

        {
            let mut v = Vector::from_ref(&mut buf);
            v.clear();
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn reverse() {
        let mut v = Vector::from(vec![1, 2, 3, 4]);
        v.reverse();
        assert_eq!(v.collect(), &[4, 3, 2, 1]);
        let mut odd = v123();
        odd.reverse();
        assert_eq!(odd.collect(), &[3, 2, 1]);
        let mut empty: Vector<i32> = Vector::new();
        empty.reverse();
        assert!(empty.is_empty());
    }

    #[test]
    fn foreach_in_order() {
        let v = v123();
        let mut seen = Vec::new();
        v.foreach(|t| seen.push(*t));
        assert_eq!(seen, vec![1, 2, 3]);

        let mut pairs = Vec::new();
        v.foreach_index(|i, t| pairs.push((i, *t)));
        assert_eq!(pairs, vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn filter_and_map() {
        let v = Vector::from(vec![1, 2, 3, 4]);
        assert_eq!(v.filter(|t| t % 2 == 0).collect(), &[2, 4]);
        assert!(v.filter(|_| false).is_empty());
        assert_eq!(v123().map(|t| t + 1).collect(), &[2, 3, 4]);
        assert_eq!(v.collect(), &[1, 2, 3, 4]);
    }

    #[test]
    fn reduce_starts_from_default() {
        assert_eq!(v123().reduce(|acc, t| acc + t), 6);
        assert_eq!(v123().reduce(|acc, t| acc * t), 0);
        assert_eq!(Vector::<i32>::new().reduce(|acc, t| acc + t), 0);

        let words = Vector::from(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(words.reduce(|acc, t| acc + t), "ab");

        assert_eq!(v123().reduce_index(|i, acc, t| acc + i as i32 * t), 8);
    }

    #[test]
    fn find_variants() {
        let v = Vector::from(vec![1, 4, 2, 6, 3]);
        assert_eq!(v.find(|t| *t > 3), Some(&4));
        assert_eq!(v.find_index(|t| *t > 3), Some(1));
        assert_eq!(v.find_last(|t| *t > 3), Some(&6));
        assert_eq!(v.find_last_index(|t| *t > 3), Some(3));
        assert_eq!(v.find(|t| *t > 10), None);
        assert_eq!(v.find_index(|t| *t > 10), None);
        assert_eq!(v.find_last(|t| *t > 10), None);
        assert_eq!(v.find_last_index(|t| *t > 10), None);
    }

    #[test]
    fn prototype_is_live() {
        let mut v = v123();
        v.prototype()[0] = 7;
        assert_eq!(v.at(0), Some(&7));
    }

    #[test]
    fn into_vec_copies_views() {
        let mut buf = vec![1, 2, 3];
        let copied = Vector::from_ref(&mut buf).into_vec();
        assert_eq!(copied, vec![1, 2, 3]);
        assert_eq!(v123().into_vec(), vec![1, 2, 3]);
        assert!(Vector::<u8>::new().into_vec().is_empty());
    }

    #[test]
    fn json_round_trip() {
        let v = v123();
        assert_eq!(v.marshal_json().unwrap(), "[1,2,3]");
        assert_eq!(Vector::<i32>::new().marshal_json().unwrap(), "[]");

        let mut w: Vector<i32> = Vector::new();
        w.unmarshal_json(b"[4, 5]").unwrap();
        assert_eq!(w.collect(), &[4, 5]);

        let parsed: Vector<String> = serde_json::from_str(r#"["x","y"]"#).unwrap();
        assert_eq!(parsed.collect(), &["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn unmarshal_breaks_aliasing() {
        let mut buf = vec![1, 2];
        {
            let mut v = Vector::from_ref(&mut buf);
            v.unmarshal_json(b"[7,8,9]").unwrap();
            v.push(10);
            assert_eq!(v.collect(), &[7, 8, 9, 10]);
        }
        assert_eq!(buf, vec![1, 2]);
    }

    #[test]
    fn unmarshal_errors_propagate() {
        let mut v = v123();
        let err = v.unmarshal_json(b"[1, \"two\"]").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert!(v.unmarshal_json(b"not json").is_err());
        assert_eq!(v.collect(), &[1, 2, 3]);
    }

    #[test]
    fn display_and_debug() {
        assert_eq!(v123().to_string(), "[1, 2, 3]");
        assert_eq!(format!("{:?}", v123()), "[1, 2, 3]");
        assert_eq!(Vector::<i32>::new().to_string(), "[]");
    }
}
