/// Failure to build a header view over a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    /// The frame ends before the structure being viewed does.
    #[error("truncated buffer: {needed} bytes needed, {available} available")]
    TruncatedBuffer { needed: usize, available: usize },
}

/// Borrow `N` bytes of `buf` starting at `offset`.
///
/// The only place header views touch the raw frame. Offsets come from packet
/// contents, so the end position uses checked arithmetic.
#[inline]
pub(crate) fn view<const N: usize>(buf: &[u8], offset: usize) -> Result<&[u8; N], ViewError> {
    let truncated = |needed| ViewError::TruncatedBuffer { needed, available: buf.len() };
    let end = offset.checked_add(N).ok_or(truncated(usize::MAX))?;
    let window = buf.get(offset..end).ok_or(truncated(end))?;
    <&[u8; N]>::try_from(window).map_err(|_| truncated(end))
}
