use memchr::memmem;

#[derive(Clone, Debug)]
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    #[inline]
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    #[inline]
    pub(crate) fn tail(&self) -> &'a [u8] {
        self.data.get(self.offset..).unwrap_or_default()
    }

    #[inline]
    pub(crate) fn peek_byte(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    #[inline]
    pub(crate) fn forward(&mut self) {
        self.offset += 1;
    }

    #[inline]
    pub(crate) fn forward_while(&mut self, f: impl Fn(u8) -> bool) {
        while let Some(b) = self.peek_byte() {
            if f(b) {
                self.forward();
            } else {
                break;
            }
        }
    }

    #[inline]
    pub(crate) fn forward_tag(&mut self, tag: &[u8]) -> Option<()> {
        self.peek_tag(tag)?;
        self.offset += tag.len();
        Some(())
    }

    #[inline]
    pub(crate) fn peek_tag(&self, tag: &[u8]) -> Option<()> {
        self.tail().starts_with(tag).then_some(())
    }

    /// Move to the next occurrence of `needle` and return everything before it.
    ///
    /// The needle itself is not consumed.
    pub(crate) fn read_until(&mut self, needle: &[u8]) -> Option<&'a [u8]> {
        let tail = self.tail();
        let pos = memmem::find(tail, needle)?;
        self.offset += pos;

        Some(&tail[..pos])
    }

    /// Read a single line, accepting both `\r\n` and a bare `\n` as terminator.
    ///
    /// The terminator is consumed but not returned.
    pub(crate) fn read_line(&mut self) -> Option<&'a [u8]> {
        let line = self.read_until(b"\n")?;
        self.forward();

        Some(line.strip_suffix(b"\r").unwrap_or(line))
    }

    /// Consume a line break (`\r\n` or `\n`).
    #[inline]
    pub(crate) fn eol(&mut self) -> Option<()> {
        self.forward_tag(b"\r\n").or_else(|| self.forward_tag(b"\n"))
    }
}

#[inline(always)]
pub(crate) fn is_padding(b: u8) -> bool {
    matches!(b, b' ' | b'\t')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines() {
        let mut r = Reader::new(b"first\r\nsecond\nthird");
        assert_eq!(r.read_line(), Some(&b"first"[..]));
        assert_eq!(r.read_line(), Some(&b"second"[..]));
        assert_eq!(r.read_line(), None);
        assert_eq!(r.tail(), b"third");
    }

    #[test]
    fn read_until_keeps_needle() {
        let mut r = Reader::new(b"abc--xyz");
        assert_eq!(r.read_until(b"--"), Some(&b"abc"[..]));
        assert!(r.forward_tag(b"--").is_some());
        assert_eq!(r.tail(), b"xyz");
        assert_eq!(r.read_until(b"--"), None);
        assert_eq!(r.tail(), b"xyz");
    }
}
