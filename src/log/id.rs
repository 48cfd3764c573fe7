use std::fmt;

/// Hierarchical id of a log entry, e.g. `2.1.3`.
///
/// Each segment is the 1-based position of the entry among its siblings, so the
/// chain encodes both depth and order. It is also the entry's address inside a
/// [`MessageLog`](super::MessageLog).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdChain(Vec<u32>);

impl IdChain {
    pub fn root(ordinal: u32) -> Self {
        Self(vec![ordinal])
    }

    pub fn from_segments(segments: Vec<u32>) -> Option<Self> {
        if segments.is_empty() || segments.contains(&0) {
            return None;
        }
        Some(Self(segments))
    }

    /// Parses the dotted form. Empty or zero segments are rejected.
    pub fn parse(text: &str) -> Option<Self> {
        let segments = text
            .split('.')
            .map(|segment| segment.trim().parse::<u32>().ok())
            .collect::<Option<Vec<_>>>()?;
        Self::from_segments(segments)
    }

    pub fn child(&self, ordinal: u32) -> Self {
        let mut segments = self.0.clone();
        segments.push(ordinal);
        Self(segments)
    }

    pub fn parent(&self) -> Option<Self> {
        (self.0.len() > 1).then(|| Self(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn segments(&self) -> &[u32] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The position among siblings.
    pub fn ordinal(&self) -> u32 {
        self.0.last().copied().unwrap_or_default()
    }

    /// The segments below `ancestor`, or `None` if this id is not inside it.
    pub fn relative_to(&self, ancestor: &IdChain) -> Option<&[u32]> {
        self.0.strip_prefix(ancestor.0.as_slice())
    }
}

impl fmt::Display for IdChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
            first = false;
        }
        Ok(())
    }
}
