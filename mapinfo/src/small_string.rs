use std::fmt;
use std::ops::Deref;

/// A fixed-capacity string of at most `N` bytes stored inline.
///
/// Longer input is truncated at the last character boundary that fits.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SmallString<const N: usize> {
    len: usize,
    bytes: [u8; N],
}

impl<const N: usize> SmallString<N> {
    pub fn new(text: &str) -> Self {
        let mut len = text.len().min(N);
        while !text.is_char_boundary(len) {
            len -= 1;
        }

        let mut bytes = [0; N];
        bytes[..len].copy_from_slice(&text.as_bytes()[..len]);
        SmallString { len, bytes }
    }

    pub const fn capacity() -> usize {
        N
    }

    pub fn as_str(&self) -> &str {
        // Always valid UTF-8: `new` only cuts on character boundaries.
        std::str::from_utf8(&self.bytes[..self.len]).unwrap_or_default()
    }
}

impl<const N: usize> Default for SmallString<N> {
    fn default() -> Self {
        SmallString {
            len: 0,
            bytes: [0; N],
        }
    }
}

impl<const N: usize> Deref for SmallString<N> {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl<const N: usize> From<&str> for SmallString<N> {
    fn from(text: &str) -> Self {
        SmallString::new(text)
    }
}

impl<const N: usize> PartialEq<str> for SmallString<N> {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl<const N: usize> PartialEq<&str> for SmallString<N> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl<const N: usize> fmt::Display for SmallString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<const N: usize> fmt::Debug for SmallString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}
