// SPDX-License-Identifier: MIT

/// Implements big-endian read/write helpers for primitive types on BlockIO.
///
/// Generates `read_<ty>_be_at` / `write_<ty>_be_at` for every listed type.
#[macro_export]
macro_rules! blockio_impl_primitive_be {
    ($($ty:ty),+ $(,)?) => {
        $(
            paste::paste! {
                #[inline(always)]
                fn [<write_ $ty _be_at>](&mut self, offset: u64, value: $ty) -> BlockIOResult {
                    let buf = value.to_be_bytes();
                    self.write_at(offset, &buf)
                }

                #[inline(always)]
                fn [<read_ $ty _be_at>](&mut self, offset: u64) -> BlockIOResult<$ty> {
                    let mut buf = [0u8; core::mem::size_of::<$ty>()];
                    self.read_at(offset, &mut buf)?;
                    Ok(<$ty>::from_be_bytes(buf))
                }
            }
        )+
    };
}
