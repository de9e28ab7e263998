//! Zeroizing wrappers for the buffers that ever hold a master password,
//! a master key, or a site seed.
//!
//! `Secret<T>` derefs straight to its inner value, but the actual
//! overwrite on drop is done by the `zeroize` crate, whose volatile
//! writes survive dead-store elimination (a plain `*b = 0` loop does
//! not, once the compiler can prove the buffer is never read again).

use std::ops::{Deref, DerefMut};

use zeroize::Zeroize;

/// A buffer that is zeroized when it goes out of scope, on every exit
/// path including an unwinding panic.
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    pub fn new(inner: T) -> Self {
        Secret(inner)
    }
}

impl<T: Zeroize + Default> Secret<T> {
    /// Move the inner value out, leaving a zeroized default behind for
    /// `Drop` to clear (a no-op clear, since it's already the default).
    pub fn into_inner(mut self) -> T {
        std::mem::take(&mut self.0)
    }
}

impl<T: Zeroize> Deref for Secret<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Zeroize> DerefMut for Secret<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// The 64-byte master key produced by MKD and consumed by SSD.
#[derive(Zeroize)]
pub struct MasterKey([u8; 64]);

impl Drop for MasterKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl MasterKey {
    pub fn zeroed() -> Self {
        MasterKey([0; 64])
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl AsMut<[u8]> for MasterKey {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

/// The 32-byte site seed produced by SSD and consumed by TC.
#[derive(Zeroize)]
pub struct SiteSeed([u8; 32]);

impl Drop for SiteSeed {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl SiteSeed {
    pub fn zeroed() -> Self {
        SiteSeed([0; 32])
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl AsMut<[u8]> for SiteSeed {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}
