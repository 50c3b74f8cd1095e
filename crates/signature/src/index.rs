use crate::block::BlockSig;

/// Number of distinct tags: the low 16 bits of a weak sum.
const TAG_COUNT: usize = 1 << 16;

/// Inclusive range into the sorted target permutation; `l > r` means empty.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct TagRange {
    l: u32,
    r: u32,
}

impl TagRange {
    const EMPTY: Self = Self { l: 1, r: 0 };
}

/// Bucketed lookup structure over a signature's blocks.
///
/// `targets` is a permutation of block indices sorted by
/// `(tag, weak, index)`; `ranges` maps each of the 65536 tag values to its
/// contiguous span in `targets`. A tag that never occurs resolves to an
/// empty span without touching `targets`, so failed lookups cost one array
/// read.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct TagIndex {
    targets: Vec<u32>,
    ranges: Vec<TagRange>,
}

/// Tag of a weak sum: its low 16 bits.
#[inline]
pub(crate) const fn tag_of(weak: u32) -> usize {
    (weak & 0xffff) as usize
}

impl TagIndex {
    pub(crate) fn build(blocks: &[BlockSig]) -> Self {
        let mut targets: Vec<u32> = (0..blocks.len() as u32).collect();
        targets.sort_unstable_by_key(|&i| {
            let block = &blocks[i as usize];
            (tag_of(block.weak()), block.weak(), i)
        });

        let mut ranges = vec![TagRange::EMPTY; TAG_COUNT];
        let mut start = 0usize;
        while start < targets.len() {
            let tag = tag_of(blocks[targets[start] as usize].weak());
            let mut end = start + 1;
            while end < targets.len() && tag_of(blocks[targets[end] as usize].weak()) == tag {
                end += 1;
            }
            ranges[tag] = TagRange {
                l: start as u32,
                r: (end - 1) as u32,
            };
            start = end;
        }

        Self { targets, ranges }
    }

    /// Block indices whose weak sum carries `weak`'s tag, sorted by weak sum
    /// then block index. Empty when the tag never occurs.
    pub(crate) fn candidates(&self, weak: u32) -> &[u32] {
        let range = self.ranges[tag_of(weak)];
        if range.l > range.r {
            return &[];
        }
        &self.targets[range.l as usize..=range.r as usize]
    }

    pub(crate) fn len(&self) -> usize {
        self.targets.len()
    }
}
