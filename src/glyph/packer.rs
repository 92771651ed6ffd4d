//! Rectangle allocation inside one atlas page.
//!
//! Guillotine packing with best-short-side-fit: the free rectangle leaving
//! the smallest short-side remainder is chosen, then split along the shorter
//! leftover axis. Slots are never freed; the batcher repacks whole atlases
//! into fresh packers during defragmentation instead.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FreeRect {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

#[derive(Debug, Clone)]
pub struct RectPacker {
    width: u32,
    height: u32,
    free: Vec<FreeRect>,
}

impl RectPacker {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            free: vec![FreeRect {
                x: 0,
                y: 0,
                w: width,
                h: height,
            }],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reserve a `w × h` region. Returns its top-left corner, or `None` when
    /// no free rectangle is large enough. Zero-sized requests never fit.
    pub fn pack(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if w == 0 || h == 0 {
            return None;
        }

        let (idx, _) = self
            .free
            .iter()
            .enumerate()
            .filter(|(_, r)| r.w >= w && r.h >= h)
            .map(|(i, r)| {
                let (lw, lh) = (r.w - w, r.h - h);
                (i, (lw.min(lh), lw.max(lh)))
            })
            .min_by_key(|&(_, fit)| fit)?;

        let r = self.free.swap_remove(idx);
        let (lw, lh) = (r.w - w, r.h - h);

        // The child on the shorter leftover axis stays narrow; the other
        // spans the full parent edge.
        let (right, below) = if lw < lh {
            (
                FreeRect { x: r.x + w, y: r.y, w: lw, h },
                FreeRect { x: r.x, y: r.y + h, w: r.w, h: lh },
            )
        } else {
            (
                FreeRect { x: r.x + w, y: r.y, w: lw, h: r.h },
                FreeRect { x: r.x, y: r.y + h, w, h: lh },
            )
        };
        self.free
            .extend([right, below].into_iter().filter(|c| c.w > 0 && c.h > 0));

        Some((r.x, r.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_glyph_lands_top_left() {
        let mut p = RectPacker::new(256, 256);
        assert_eq!(p.pack(8, 12), Some((0, 0)));
    }

    #[test]
    fn packed_regions_never_overlap() {
        let mut p = RectPacker::new(128, 128);
        let mut placed = Vec::new();
        for i in 0..80u32 {
            let (w, h) = (4 + i % 9, 6 + i % 5);
            if let Some((x, y)) = p.pack(w, h) {
                assert!(x + w <= 128 && y + h <= 128);
                placed.push((x, y, w, h));
            }
        }
        for (i, a) in placed.iter().enumerate() {
            for b in &placed[i + 1..] {
                let overlap_x = a.0 < b.0 + b.2 && b.0 < a.0 + a.2;
                let overlap_y = a.1 < b.1 + b.3 && b.1 < a.1 + a.3;
                assert!(!(overlap_x && overlap_y), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn full_page_refuses_further_requests() {
        let mut p = RectPacker::new(32, 32);
        let mut count = 0;
        while p.pack(16, 16).is_some() {
            count += 1;
            assert!(count <= 4);
        }
        assert_eq!(count, 4);
        assert_eq!(p.pack(1, 1), None);
    }

    #[test]
    fn oversize_and_empty_requests_fail() {
        let mut p = RectPacker::new(32, 32);
        assert_eq!(p.pack(33, 1), None);
        assert_eq!(p.pack(0, 4), None);
        assert_eq!(p.pack(32, 32), Some((0, 0)));
    }
}
