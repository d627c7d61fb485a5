use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{self, Write};

// -----------------------------------------------------------------------------
// Segment

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Type(Cow<'static, str>),
    Field(Cow<'static, str>),
    Index(usize),
}

// -----------------------------------------------------------------------------
// Trace

/// The position of a driver inside the value graph.
///
/// Property paths (`items[2].name`) are always available. With the `debug`
/// feature in debug builds the trace also remembers where the last failing
/// traversal stopped, see the drivers' `error_path`.
#[derive(Default, Clone)]
pub(crate) struct Trace {
    segments: Vec<Segment>,
    #[cfg(all(debug_assertions, feature = "debug"))]
    failure: Option<String>,
}

impl Trace {
    /// Returns `true` outside of any traversal.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.segments.is_empty()
    }

    /// Starts a top-level traversal.
    #[inline]
    pub fn reset(&mut self) {
        self.segments.clear();
        #[cfg(all(debug_assertions, feature = "debug"))]
        {
            self.failure = None;
        }
    }

    #[inline]
    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    #[inline]
    pub fn pop(&mut self) {
        self.segments.pop();
    }

    /// Renders the fields and indices of the current position.
    pub fn property_path(&self) -> String {
        let mut path = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Type(_) => {}
                Segment::Field(name) => {
                    if !path.is_empty() {
                        path.push('.');
                    }
                    path.push_str(name);
                }
                Segment::Index(index) => {
                    let _ = write!(path, "[{index}]");
                }
            }
        }
        path
    }

    /// Remembers the current position as the failure point, once per traversal.
    #[inline]
    pub fn fail(&mut self) {
        #[cfg(all(debug_assertions, feature = "debug"))]
        if self.failure.is_none() {
            let rendered = alloc::format!("{self}");
            log::debug!("traversal failed at {rendered}");
            self.failure = Some(rendered);
        }
    }

    #[inline]
    pub fn failure(&self) -> Option<&str> {
        #[cfg(all(debug_assertions, feature = "debug"))]
        {
            self.failure.as_deref()
        }
        #[cfg(not(all(debug_assertions, feature = "debug")))]
        {
            None
        }
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                f.write_str(" -> ")?;
            }
            match segment {
                Segment::Type(name) => write!(f, "`{name}`")?,
                Segment::Field(name) => f.write_str(name)?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use alloc::borrow::Cow;
    use alloc::string::ToString;

    use super::{Segment, Trace};

    #[test]
    fn renders_paths() {
        let mut trace = Trace::default();
        assert!(trace.is_idle());

        trace.push(Segment::Type(Cow::Borrowed("Scene")));
        trace.push(Segment::Field(Cow::Borrowed("items")));
        trace.push(Segment::Type(Cow::Borrowed("Vec<Item>")));
        trace.push(Segment::Index(2));
        trace.push(Segment::Field(Cow::Borrowed("name")));

        assert_eq!(trace.property_path(), "items[2].name");
        assert_eq!(
            trace.to_string(),
            "`Scene` -> items -> `Vec<Item>` -> [2] -> name"
        );

        trace.pop();
        assert_eq!(trace.property_path(), "items[2]");
        trace.reset();
        assert!(trace.is_idle());
        assert_eq!(trace.failure(), None);
    }
}
