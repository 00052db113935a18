//! Walking chains of image file directories

use std::collections::HashSet;
use std::ops::Range;

use super::entry::{read_element, read_run, Entry, Placement, ENTRY_LEN};
use super::Limits;
use crate::cursor::ByteCursor;
use crate::error::{Malformed, WalkResult};
use crate::tags::{Type, Vocabulary};
use crate::tree::{Dissection, Item};

/// Renders the directories of one TIFF structure.
///
/// Directories of a chain are visited in a loop, following next-IFD pointers for as long as they
/// point forward. Sub-IFD pointers found in a [`Vocabulary::Tiff`] directory start a new chain
/// with the vocabulary of the pointer, which is walked by a recursive call. Sub-chains never
/// point further, so the recursion is at most one level deep.
pub(crate) struct IfdWalker<'a, 'd> {
    cursor: ByteCursor<'a>,
    limits: &'d Limits,
    out: &'d mut Dissection,
    visited: Option<HashSet<u64>>,
}

impl<'a, 'd> IfdWalker<'a, 'd> {
    /// `cursor` starts at the TIFF header and carries the byte order declared by it.
    pub(crate) fn new(
        cursor: ByteCursor<'a>,
        limits: &'d Limits,
        out: &'d mut Dissection,
        revisit_guard: bool,
    ) -> Self {
        IfdWalker {
            cursor,
            limits,
            out,
            visited: revisit_guard.then(HashSet::new),
        }
    }

    /// Walk the chain at `start`, numbering its directories from `#0`.
    ///
    /// Each directory is appended to `level`, directly followed by the sub-chains it points to.
    pub(crate) fn walk_chain(
        &mut self,
        level: &mut Vec<Item>,
        start: u64,
        vocabulary: Vocabulary,
    ) {
        let mut offset = start;
        let mut index = 0u32;

        loop {
            let mut ifd = Item::new(
                format!("{} #{index}", vocabulary.directory_label()),
                self.cursor.absolute(offset, 2),
            );
            let mut sub_chains = Vec::new();

            let step = self.walk_directory(&mut ifd, &mut sub_chains, offset, vocabulary);

            level.push(ifd);
            level.append(&mut sub_chains);

            match step {
                Ok(Some(next)) => {
                    offset = next;
                    index += 1;
                }
                Ok(None) => break,
                Err(kind) => {
                    let range = match kind {
                        Malformed::InvalidNextIfdOffset { field, .. } => self.range(field, 4),
                        _ => self.range(offset, 2),
                    };
                    self.fail(kind, range);
                    break;
                }
            }
        }
    }

    /// Render one directory, returning the offset of the next one in the chain.
    fn walk_directory(
        &mut self,
        ifd: &mut Item,
        sub_chains: &mut Vec<Item>,
        offset: u64,
        vocabulary: Vocabulary,
    ) -> WalkResult<Option<u64>> {
        if let Some(visited) = &mut self.visited {
            if !visited.insert(offset) {
                return Err(Malformed::RevisitedIfd(offset));
            }
        }

        let num_fields = self.cursor.read_u16(offset)?;
        let num_fields = u64::from(num_fields);
        ifd.range = self.range(offset, 2 + num_fields * ENTRY_LEN + 4);
        ifd.push(Item::new(
            format!("Number of fields: {num_fields}"),
            self.range(offset, 2),
        ));
        tracing::debug!(offset, num_fields, ?vocabulary, "walking directory");

        for i in 0..num_fields {
            let entry = Entry::read(&self.cursor, offset + 2 + i * ENTRY_LEN)?;
            let item = self.entry(&entry, vocabulary, sub_chains);
            ifd.push(item);
        }

        let field = offset + 2 + num_fields * ENTRY_LEN;
        let next = self.cursor.read_u32(field)?;
        ifd.push(Item::new(
            format!("Next IFD offset: {next}"),
            self.range(field, 4),
        ));

        match u64::from(next) {
            0 => Ok(None),
            // Only forward pointers are followed, which is what makes the chain terminate.
            n if n <= field => Err(Malformed::InvalidNextIfdOffset { offset: next, field }),
            n => Ok(Some(n)),
        }
    }

    /// Render one entry, expanding a sub-IFD it points to into `sub_chains`.
    fn entry(
        &mut self,
        entry: &Entry,
        vocabulary: Vocabulary,
        sub_chains: &mut Vec<Item>,
    ) -> Item {
        let name = match vocabulary.tag_name(entry.tag) {
            Some(name) => name.to_string(),
            None => format!("Unknown tag (0x{:04x})", entry.tag),
        };
        tracing::trace!(?entry, %name, "entry");

        let mut item = Item::new(name, self.range(entry.offset, ENTRY_LEN));
        item.push(Item::new(
            format!(
                "Tag: {} (0x{:04x})",
                vocabulary.tag_name(entry.tag).unwrap_or("Unknown"),
                entry.tag
            ),
            self.range(entry.offset, 2),
        ));

        let ty = entry.field_type();
        let type_name = ty.and_then(|t| t.name()).unwrap_or("Unknown");
        item.push(Item::new(
            format!("Type: {type_name} ({})", entry.type_code),
            self.range(entry.offset + 2, 2),
        ));
        item.push(Item::new(
            format!("Count: {}", entry.count),
            self.range(entry.offset + 4, 4),
        ));

        let slot = self.range(entry.slot_offset(), 4);
        if let Placement::External(at) = entry.placement(self.cursor.byte_order()) {
            item.push(Item::new(format!("Value offset: {at}"), slot.clone()));
        }

        match (entry.value_start(&self.cursor), ty) {
            (Ok(start), Some(ty)) => {
                if let Err(kind) = self.values(&mut item, entry, ty, start) {
                    self.fail(kind, slot.clone());
                }
            }
            // Without an element size there is nothing to decode at the offset.
            (Ok(_), None) => {
                item.push(Item::new("Value: not decoded, unknown type", slot.clone()));
            }
            (Err(kind), _) => self.fail(kind, slot.clone()),
        }

        if let Some(sub) = vocabulary.sub_ifd(entry.tag) {
            if ty == Some(Type::LONG) && entry.count == 1 {
                let target = entry.slot_u32(self.cursor.byte_order());
                if (target as usize) < self.cursor.len() {
                    self.walk_chain(sub_chains, target.into(), sub);
                } else {
                    self.fail(
                        Malformed::InvalidSubIfdOffset {
                            tag: entry.tag,
                            offset: target,
                        },
                        slot,
                    );
                }
            }
        }

        item
    }

    /// Render the values of an entry starting at `start`.
    fn values(&self, item: &mut Item, entry: &Entry, ty: Type, start: u64) -> WalkResult<()> {
        let limit = self.limits.rendered_values;

        if ty.is_byte_run() {
            let value = read_run(&self.cursor, ty, start, entry.count, limit)?;
            item.push(Item::new(
                format!("Value: {value}"),
                self.range(start, entry.count.into()),
            ));
            return Ok(());
        }

        let size = u64::from(ty.byte_len());
        let count = u64::from(entry.count);
        let shown = count.min(limit as u64);

        for i in 0..shown {
            let at = start + i * size;
            let value = read_element(&self.cursor, ty, at)?;
            item.push(Item::new(format!("Value: {value}"), self.range(at, size)));
        }

        if shown < count {
            let at = start + shown * size;
            item.push(Item::new(
                format!("[{} more values]", count - shown),
                self.range(at, (count - shown) * size),
            ));
        }

        Ok(())
    }

    fn range(&self, offset: u64, len: u64) -> Range<usize> {
        self.cursor.absolute(offset, len)
    }

    /// Record a finding. Truncations are attached to the bytes that were missing.
    fn fail(&mut self, kind: Malformed, range: Range<usize>) {
        let range = match kind {
            Malformed::Truncated { offset, len, .. } => {
                let missing = self.range(offset, len);
                if missing.is_empty() {
                    range
                } else {
                    missing
                }
            }
            _ => range,
        };
        self.out.report(kind, range);
    }
}
