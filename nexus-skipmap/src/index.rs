//! Sentinel-based node handles.
//!
//! Forward links are stored as plain integers with a reserved "null" value
//! instead of `Option<Idx>`, which keeps every forward array a dense slice of
//! integers. The sentinel doubles as the end position of an iteration and,
//! in predecessor arrays, as "the header".

/// A copyable arena handle with a sentinel "none" value.
///
/// # Example
///
/// ```
/// use nexus_skipmap::Index;
///
/// let idx: u32 = 5;
/// assert!(idx.is_some());
/// assert!(u32::NONE.is_none());
/// assert_eq!(u32::NONE.into_option(), None);
/// assert_eq!(idx.into_option(), Some(5));
/// ```
pub trait Index: Copy + Eq + core::fmt::Debug {
    /// Sentinel value representing "no node".
    const NONE: Self;

    /// Returns `true` if this is the sentinel value.
    #[inline]
    fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// Returns `true` if this is not the sentinel value.
    #[inline]
    fn is_some(self) -> bool {
        !self.is_none()
    }

    /// Converts the sentinel to `None` and everything else to `Some`.
    #[inline]
    fn into_option(self) -> Option<Self> {
        if self.is_none() { None } else { Some(self) }
    }

    /// Widens the handle to a slot number.
    fn as_usize(self) -> usize;

    /// Narrows a slot number to a handle.
    fn from_usize(val: usize) -> Self;
}

macro_rules! impl_index_for_unsigned {
    ($($ty:ty),*) => {
        $(
            impl Index for $ty {
                const NONE: Self = <$ty>::MAX;

                #[inline]
                fn as_usize(self) -> usize {
                    self as usize
                }

                #[inline]
                fn from_usize(val: usize) -> Self {
                    debug_assert!(val < <$ty>::MAX as usize, "slot {val} collides with NONE");
                    val as Self
                }
            }
        )*
    };
}

impl_index_for_unsigned!(u8, u16, u32, u64, usize);

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_index_sentinel {
        ($($ty:ty => $name:ident),*) => {
            $(
                #[test]
                fn $name() {
                    assert!(<$ty>::NONE.is_none());
                    assert!((0 as $ty).is_some());
                    assert_eq!(<$ty>::NONE.into_option(), None);
                    assert_eq!((3 as $ty).into_option(), Some(3));
                    assert_eq!(<$ty>::from_usize(7).as_usize(), 7);
                }
            )*
        };
    }

    test_index_sentinel!(
        u8 => u8_sentinel,
        u16 => u16_sentinel,
        u32 => u32_sentinel,
        u64 => u64_sentinel,
        usize => usize_sentinel
    );
}
