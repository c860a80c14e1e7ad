use allocator_api2::alloc::{AllocError, Allocator};
use allocator_api2::boxed::Box;
use allocator_api2::vec::Vec;
use crate::construct::AllocString;

/// Clone into a specific allocator.
///
/// Containers re-home recursively: every nested allocation of the clone
/// comes from `alloc`, whichever allocator the original used.
pub trait CloneIn<A, T = Self>: Sized {
    /// Returns a clone of `self` allocated by `alloc`; returns an error if
    /// the allocator is exhausted.
    fn try_clone_in(&self, alloc: A) -> Result<T, AllocError>;

    /// Returns a clone of `self` allocated by `alloc`.
    ///
    /// # Panics
    ///
    /// Panics if the allocator is exhausted.
    #[inline]
    fn clone_in(&self, alloc: A) -> T {
        match self.try_clone_in(alloc) {
            Ok(clone) => clone,
            Err(error) => panic!("{}", error),
        }
    }
}

macro_rules! clone_value_in {
    ($type:ty) => (
        impl<A> CloneIn<A, $type> for $type {
            #[inline]
            fn try_clone_in(&self, _alloc: A) -> Result<$type, AllocError> {
                Ok(*self)
            }

            #[inline]
            fn clone_in(&self, _alloc: A) -> $type {
                *self
            }
        }
    );
}

clone_value_in!(());
clone_value_in!(u8);
clone_value_in!(u16);
clone_value_in!(u32);
clone_value_in!(u64);
clone_value_in!(usize);
clone_value_in!(i8);
clone_value_in!(i16);
clone_value_in!(i32);
clone_value_in!(i64);
clone_value_in!(isize);
clone_value_in!(f32);
clone_value_in!(f64);
clone_value_in!(char);
clone_value_in!(bool);

impl<A, T, U: CloneIn<A, T>> CloneIn<A, Option<T>> for Option<U> {
    #[inline]
    fn try_clone_in(&self, alloc: A) -> Result<Option<T>, AllocError> {
        Ok(match self {
            Some(value) => Some(value.try_clone_in(alloc)?),
            None => None,
        })
    }
}

impl<A, T0, T1, U0, U1> CloneIn<A, (T0, T1)> for (U0, U1)
    where A: Clone,
          U0: CloneIn<A, T0>,
          U1: CloneIn<A, T1>,
{
    fn try_clone_in(&self, alloc: A) -> Result<(T0, T1), AllocError> {
        let v0 = self.0.try_clone_in(alloc.clone())?;
        let v1 = self.1.try_clone_in(alloc)?;
        Ok((v0, v1))
    }
}

impl<A, T0, T1, T2, U0, U1, U2> CloneIn<A, (T0, T1, T2)> for (U0, U1, U2)
    where A: Clone,
          U0: CloneIn<A, T0>,
          U1: CloneIn<A, T1>,
          U2: CloneIn<A, T2>,
{
    fn try_clone_in(&self, alloc: A) -> Result<(T0, T1, T2), AllocError> {
        let v0 = self.0.try_clone_in(alloc.clone())?;
        let v1 = self.1.try_clone_in(alloc.clone())?;
        let v2 = self.2.try_clone_in(alloc)?;
        Ok((v0, v1, v2))
    }
}

impl<A, T0, T1, T2, T3, U0, U1, U2, U3> CloneIn<A, (T0, T1, T2, T3)> for (U0, U1, U2, U3)
    where A: Clone,
          U0: CloneIn<A, T0>,
          U1: CloneIn<A, T1>,
          U2: CloneIn<A, T2>,
          U3: CloneIn<A, T3>,
{
    fn try_clone_in(&self, alloc: A) -> Result<(T0, T1, T2, T3), AllocError> {
        let v0 = self.0.try_clone_in(alloc.clone())?;
        let v1 = self.1.try_clone_in(alloc.clone())?;
        let v2 = self.2.try_clone_in(alloc.clone())?;
        let v3 = self.3.try_clone_in(alloc)?;
        Ok((v0, v1, v2, v3))
    }
}

impl<A, B, T, U> CloneIn<B, Vec<T, B>> for Vec<U, A>
    where A: Allocator,
          B: Allocator + Clone,
          U: CloneIn<B, T>,
{
    fn try_clone_in(&self, alloc: B) -> Result<Vec<T, B>, AllocError> {
        let mut clone = Vec::new_in(alloc.clone());
        clone.try_reserve_exact(self.len()).map_err(|_| AllocError)?;
        for item in self.iter() {
            clone.push(item.try_clone_in(alloc.clone())?);
        }
        Ok(clone)
    }
}

impl<A, B, T, U> CloneIn<B, Box<T, B>> for Box<U, A>
    where A: Allocator,
          B: Allocator + Clone,
          U: CloneIn<B, T>,
{
    fn try_clone_in(&self, alloc: B) -> Result<Box<T, B>, AllocError> {
        let value = (**self).try_clone_in(alloc.clone())?;
        Box::try_new_in(value, alloc)
    }
}

impl<A, B> CloneIn<B, AllocString<B>> for AllocString<A>
    where A: Allocator,
          B: Allocator,
{
    #[inline]
    fn try_clone_in(&self, alloc: B) -> Result<AllocString<B>, AllocError> {
        AllocString::try_from_str_in(self.as_str(), alloc)
    }
}
