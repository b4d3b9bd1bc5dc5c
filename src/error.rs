use core::fmt;

/// The kind of failure behind an [`Error`].
///
/// All internal assertion failures (state-machine violations that cannot
/// arise from valid external input) are not represented here: those are
/// bugs and panic instead. This enum only covers recoverable, user-driven
/// failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// `select(i)` was called with `i >= len()`.
    OutOfRange,
    /// `remove(x)` was called with `x` absent from the set.
    NotPresent,
    /// `pop()` was called on an empty set.
    Empty,
    /// A mutation was attempted on an immutable (frozen) bitmap.
    ReadOnly,
    /// Allocation failed while growing a buffer or serializing.
    OutOfMemory,
    /// A byte region failed validation when attaching a frozen view to it.
    MalformedImage,
}

impl ErrorKind {
    fn as_str(self) -> &'static str {
        match self {
            ErrorKind::OutOfRange => "index out of range",
            ErrorKind::NotPresent => "value not present in the set",
            ErrorKind::Empty => "operation not valid on an empty set",
            ErrorKind::ReadOnly => "attempted to mutate a read-only bitmap",
            ErrorKind::OutOfMemory => "allocation failed",
            ErrorKind::MalformedImage => "malformed frozen bitmap image",
        }
    }
}

/// The error type returned by fallible operations on this crate's bitmaps.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Error {
    kind: ErrorKind,
    detail: Option<&'static str>,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Error { kind, detail: None }
    }

    pub(crate) fn with_detail(kind: ErrorKind, detail: &'static str) -> Self {
        Error { kind, detail: Some(detail) }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail {
            Some(detail) => write!(f, "{}: {}", self.kind.as_str(), detail),
            None => write!(f, "{}", self.kind.as_str()),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Error returned by [`crate::RoaringBitmap::append`] and
/// [`crate::RoaringBitmap::from_sorted_iter`] when the input iterator is not
/// sorted in strictly increasing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NonSortedIntegers {
    valid_until: u64,
}

impl NonSortedIntegers {
    pub(crate) fn new(valid_until: u64) -> Self {
        NonSortedIntegers { valid_until }
    }

    /// Returns the number of elements that were successfully appended
    /// before the out-of-order element was encountered.
    pub fn valid_until(&self) -> u64 {
        self.valid_until
    }
}

impl fmt::Display for NonSortedIntegers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "roaring bitmap cannot be created from unsorted values: \
             valid up to {}",
            self.valid_until
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for NonSortedIntegers {}
