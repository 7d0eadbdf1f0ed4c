//! Ordered text insertions and the splice that applies them.

/// Which neighbour an insertion belongs to when several land on one offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Attach {
    /// Closes something that ends at the offset (`)` after a `with` operand).
    Left,
    /// Opens something that starts at the offset (`wrapWith(` before it).
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    pub pos: usize,
    pub attach: Attach,
    pub text: String,
    /// Walk order, used to nest insertions sharing an offset and side.
    seq: usize,
}

/// Insertions collected during one walk.
#[derive(Debug, Default)]
pub struct InsertionList {
    items: Vec<Insertion>,
}

impl InsertionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pos: usize, attach: Attach, text: impl Into<String>) {
        let seq = self.items.len();
        self.items.push(Insertion {
            pos,
            attach,
            text: text.into(),
            seq,
        });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sort into splice order.
    ///
    /// At a shared offset, left-attached text comes first. Left-attached
    /// text closes constructs, and the walk visits outer constructs first,
    /// so later (inner) closers go first. Right-attached text opens
    /// constructs and keeps walk order so outer openers come first.
    pub fn into_sorted(mut self) -> Vec<Insertion> {
        self.items.sort_by(|a, b| {
            a.pos
                .cmp(&b.pos)
                .then(a.attach.cmp(&b.attach))
                .then_with(|| match a.attach {
                    Attach::Left => b.seq.cmp(&a.seq),
                    Attach::Right => a.seq.cmp(&b.seq),
                })
        });
        self.items
    }
}

/// Splice sorted insertions into `source` without touching anything else.
pub fn splice(source: &str, insertions: &[Insertion]) -> String {
    let extra: usize = insertions.iter().map(|i| i.text.len()).sum();
    let mut out = String::with_capacity(source.len() + extra);
    let mut last = 0;

    for insertion in insertions {
        debug_assert!(insertion.pos >= last, "insertions must be sorted");
        let pos = insertion.pos.clamp(last, source.len());
        out.push_str(&source[last..pos]);
        out.push_str(&insertion.text);
        last = pos;
    }
    out.push_str(&source[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_left_before_right_at_same_offset() {
        let mut list = InsertionList::new();
        list.push(3, Attach::Right, "open(");
        list.push(3, Attach::Left, ")");
        let out = splice("abcdef", &list.into_sorted());
        assert_eq!(out, "abc)open(def");
    }

    #[test]
    fn test_nested_openers_keep_walk_order_and_closers_reverse() {
        // Outer construct visited first, inner second; both span [1, 4).
        let mut list = InsertionList::new();
        list.push(1, Attach::Right, "A(");
        list.push(4, Attach::Left, ")A");
        list.push(1, Attach::Right, "B(");
        list.push(4, Attach::Left, ")B");
        let out = splice("xyzwv", &list.into_sorted());
        assert_eq!(out, "xA(B(yzw)B)Av");
    }

    #[test]
    fn test_no_insertions_returns_source() {
        assert_eq!(splice("let a = 1;", &[]), "let a = 1;");
    }
}
