//! The labelled byte ranges and annotations produced by a dissection

use std::fmt;
use std::ops::Range;

use crate::cursor::ByteOrder;
use crate::error::Malformed;

/// One labelled byte range, possibly with nested ranges.
///
/// Ranges are absolute within the buffer handed to the entry point. Children are not required to
/// lie within their parent: an entry whose value is stored elsewhere has a value child that
/// points to that place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub label: String,
    pub range: Range<usize>,
    pub children: Vec<Item>,
}

impl Item {
    pub fn new(label: impl Into<String>, range: Range<usize>) -> Self {
        Item {
            label: label.into(),
            range,
            children: Vec::new(),
        }
    }

    pub fn push(&mut self, child: Item) {
        self.children.push(child);
    }

    /// Builder style [`Item::push`].
    pub fn with_child(mut self, child: Item) -> Self {
        self.children.push(child);
        self
    }

    /// Depth-first iteration over this item and all of its descendants.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// The first direct child whose label starts with `prefix`.
    pub fn child(&self, prefix: &str) -> Option<&Item> {
        self.children.iter().find(|c| c.label.starts_with(prefix))
    }
}

/// Depth-first, pre-order iterator over items.
pub struct Iter<'a> {
    stack: Vec<&'a Item>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Item;

    fn next(&mut self) -> Option<&'a Item> {
        let item = self.stack.pop()?;
        self.stack.extend(item.children.iter().rev());
        Some(item)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// The data is suspicious but the rest of the structure could still be walked.
    Warning,
    /// The structure ended early.
    Error,
}

/// An advisory annotation attached to the byte range that was found invalid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finding {
    pub kind: Malformed,
    pub range: Range<usize>,
    pub severity: Severity,
}

impl Finding {
    pub fn new(kind: Malformed, range: Range<usize>) -> Self {
        let severity = if kind.is_truncation() {
            Severity::Error
        } else {
            Severity::Warning
        };

        Finding {
            kind,
            range,
            severity,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(
            f,
            "[{level}] {}..{}: {}",
            self.range.start, self.range.end, self.kind
        )
    }
}

/// The outcome of dissecting one buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dissection {
    pub items: Vec<Item>,
    pub findings: Vec<Finding>,
    /// The byte order of the last TIFF header that could be read.
    pub byte_order: Option<ByteOrder>,
}

impl Dissection {
    pub fn new() -> Self {
        Dissection::default()
    }

    /// True when no finding was raised.
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub(crate) fn report(&mut self, kind: Malformed, range: Range<usize>) {
        tracing::debug!(%kind, ?range, "malformed exif data");
        self.findings.push(Finding::new(kind, range));
    }

    /// Depth-first iteration over every item.
    pub fn iter(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items.iter().flat_map(Item::iter)
    }

    /// The first item, in depth-first order, whose label starts with `prefix`.
    pub fn find(&self, prefix: &str) -> Option<&Item> {
        self.iter().find(|item| item.label.starts_with(prefix))
    }

    /// All items whose label starts with `prefix`.
    pub fn find_all<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Item> + 'a {
        self.iter().filter(move |item| item.label.starts_with(prefix))
    }
}

impl fmt::Display for Dissection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_item(f: &mut fmt::Formatter<'_>, item: &Item, depth: usize) -> fmt::Result {
            writeln!(
                f,
                "{:indent$}{} [{}..{}]",
                "",
                item.label,
                item.range.start,
                item.range.end,
                indent = depth * 2
            )?;
            for child in &item.children {
                write_item(f, child, depth + 1)?;
            }
            Ok(())
        }

        for item in &self.items {
            write_item(f, item, 0)?;
        }
        for finding in &self.findings {
            writeln!(f, "{finding}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_first_order() {
        let tree = Item::new("a", 0..4)
            .with_child(Item::new("b", 0..2).with_child(Item::new("c", 0..1)))
            .with_child(Item::new("d", 2..4));

        let labels: Vec<&str> = tree.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["a", "b", "c", "d"]);
        assert_eq!(tree.child("d").map(|i| i.range.clone()), Some(2..4));
    }

    #[test]
    fn severity_follows_kind() {
        let mut dissection = Dissection::new();
        assert!(dissection.is_clean());

        dissection.report(Malformed::InvalidValueOffset(99), 8..12);
        dissection.report(
            Malformed::Truncated {
                offset: 2,
                len: 2,
                available: 3,
            },
            2..3,
        );

        assert_eq!(dissection.findings[0].severity, Severity::Warning);
        assert_eq!(dissection.findings[1].severity, Severity::Error);
        assert_eq!(
            dissection.findings[0].to_string(),
            "[warning] 8..12: Invalid value offset 99"
        );
    }
}
