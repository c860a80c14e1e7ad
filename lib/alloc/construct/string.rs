use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt::{self, Debug, Display, Formatter, Write};
use core::hash::{Hash, Hasher};
use core::ops::{Deref, DerefMut};
use core::str;
use allocator_api2::alloc::{AllocError, Allocator, Global};
use allocator_api2::vec::Vec;
use crate::construct::{AllocLast, AllocatorAware, ByAllocLast};

/// A resizeable UTF-8 string, residing in memory from allocator `A`.
pub struct AllocString<A: Allocator = Global> {
    /// UTF-8 bytes of the string.
    bytes: Vec<u8, A>,
}

impl AllocString<Global> {
    #[inline]
    pub fn new() -> AllocString<Global> {
        AllocString::new_in(Global)
    }
}

impl<A: Allocator> AllocString<A> {
    #[inline]
    pub fn new_in(alloc: A) -> AllocString<A> {
        AllocString { bytes: Vec::new_in(alloc) }
    }

    #[inline]
    pub fn with_capacity_in(cap: usize, alloc: A) -> AllocString<A> {
        AllocString { bytes: Vec::with_capacity_in(cap, alloc) }
    }

    /// Returns a copy of `string` allocated by `alloc`; returns an error if
    /// the allocator is exhausted.
    pub fn try_from_str_in(string: &str, alloc: A) -> Result<AllocString<A>, AllocError> {
        let mut bytes = Vec::new_in(alloc);
        bytes.try_reserve_exact(string.len()).map_err(|_| AllocError)?;
        bytes.extend_from_slice(string.as_bytes());
        Ok(AllocString { bytes })
    }

    /// Returns a copy of `string` allocated by `alloc`.
    ///
    /// # Panics
    ///
    /// Panics if the allocator is exhausted.
    pub fn from_str_in(string: &str, alloc: A) -> AllocString<A> {
        match AllocString::try_from_str_in(string, alloc) {
            Ok(copy) => copy,
            Err(error) => panic!("{}", error),
        }
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        self.bytes.allocator()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn cap(&self) -> usize {
        self.bytes.capacity()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        unsafe { str::from_utf8_unchecked(&self.bytes) }
    }

    #[inline]
    pub fn as_mut_str(&mut self) -> &mut str {
        unsafe { str::from_utf8_unchecked_mut(&mut self.bytes) }
    }

    pub fn try_reserve(&mut self, ext: usize) -> Result<(), AllocError> {
        self.bytes.try_reserve(ext).map_err(|_| AllocError)
    }

    #[inline]
    pub fn reserve(&mut self, ext: usize) {
        self.bytes.reserve(ext);
    }

    pub fn push(&mut self, c: char) {
        match c.len_utf8() {
            1 => self.bytes.push(c as u8),
            _ => self.bytes.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes()),
        }
    }

    #[inline]
    pub fn push_str(&mut self, string: &str) {
        self.bytes.extend_from_slice(string.as_bytes());
    }

    pub fn try_push_str(&mut self, string: &str) -> Result<(), AllocError> {
        self.try_reserve(string.len())?;
        self.bytes.extend_from_slice(string.as_bytes());
        Ok(())
    }

    pub fn pop(&mut self) -> Option<char> {
        let c = self.as_str().chars().next_back()?;
        let new_len = self.len() - c.len_utf8();
        self.bytes.truncate(new_len);
        Some(c)
    }

    /// Shortens this string to `new_len` bytes; has no effect if `new_len`
    /// is greater than the current length.
    ///
    /// # Panics
    ///
    /// Panics if `new_len` does not lie on a char boundary.
    pub fn truncate(&mut self, new_len: usize) {
        if new_len <= self.len() {
            assert!(self.as_str().is_char_boundary(new_len));
            self.bytes.truncate(new_len);
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

impl<A: Allocator> Deref for AllocString<A> {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl<A: Allocator> DerefMut for AllocString<A> {
    #[inline]
    fn deref_mut(&mut self) -> &mut str {
        self.as_mut_str()
    }
}

impl<A: Allocator> AsRef<str> for AllocString<A> {
    #[inline]
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl<A: Allocator> AsRef<[u8]> for AllocString<A> {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<A: Allocator> Borrow<str> for AllocString<A> {
    #[inline]
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl<A: Allocator + Clone> Clone for AllocString<A> {
    #[inline]
    fn clone(&self) -> AllocString<A> {
        AllocString { bytes: self.bytes.clone() }
    }
}

impl<A: Allocator, B: Allocator> PartialEq<AllocString<B>> for AllocString<A> {
    #[inline]
    fn eq(&self, other: &AllocString<B>) -> bool {
        self.as_str() == other.as_str()
    }
}

impl<A: Allocator> Eq for AllocString<A> {}

impl<A: Allocator> PartialEq<str> for AllocString<A> {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl<'b, A: Allocator> PartialEq<&'b str> for AllocString<A> {
    #[inline]
    fn eq(&self, other: &&'b str) -> bool {
        self.as_str() == *other
    }
}

impl<A: Allocator> PartialOrd for AllocString<A> {
    #[inline]
    fn partial_cmp(&self, other: &AllocString<A>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A: Allocator> Ord for AllocString<A> {
    #[inline]
    fn cmp(&self, other: &AllocString<A>) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl<A: Allocator> Hash for AllocString<A> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl<A: Allocator> Display for AllocString<A> {
    #[inline]
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(self.as_str(), f)
    }
}

impl<A: Allocator> Debug for AllocString<A> {
    #[inline]
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Debug::fmt(self.as_str(), f)
    }
}

impl<A: Allocator> Write for AllocString<A> {
    #[inline]
    fn write_str(&mut self, string: &str) -> fmt::Result {
        self.try_push_str(string).map_err(|_| fmt::Error)
    }

    #[inline]
    fn write_char(&mut self, c: char) -> fmt::Result {
        self.push(c);
        Ok(())
    }
}

impl<A: Allocator> AllocLast<A, ()> for AllocString<A> {
    #[inline]
    fn new_alloc_last(_args: (), alloc: A) -> AllocString<A> {
        AllocString::new_in(alloc)
    }
}

impl<'s, A: Allocator> AllocLast<A, &'s str> for AllocString<A> {
    #[inline]
    fn new_alloc_last(string: &'s str, alloc: A) -> AllocString<A> {
        AllocString::from_str_in(string, alloc)
    }
}

impl<A: Allocator> AllocLast<A, usize> for AllocString<A> {
    #[inline]
    fn new_alloc_last(cap: usize, alloc: A) -> AllocString<A> {
        AllocString::with_capacity_in(cap, alloc)
    }
}

impl<A: Allocator> AllocatorAware<()> for AllocString<A> {
    type Strategy = ByAllocLast;
}

impl<'s, A: Allocator> AllocatorAware<&'s str> for AllocString<A> {
    type Strategy = ByAllocLast;
}

impl<A: Allocator> AllocatorAware<usize> for AllocString<A> {
    type Strategy = ByAllocLast;
}
