//! Pending batch state tracking.

use super::device::{RenderTarget, TextureId};

/// What kind of quads the open batch holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Blit,
    BlitTransparent,
    ColourFill,
    Glyph,
    Present,
}

/// Everything that must stay constant across one draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchKey {
    pub mode: RenderMode,
    pub source: Option<TextureId>,
    pub target: RenderTarget,
    /// RGBA tint for fills and glyphs; zero for blits.
    pub tint: [u8; 4],
}

/// Remembers the open batch. `None` is the blank state: the next draw of any
/// kind must rebind everything.
#[derive(Debug, Default)]
pub struct StateTracker {
    current: Option<BatchKey>,
}

impl StateTracker {
    /// True when drawing under `key` requires a flush and rebind.
    pub fn needs_switch(&self, key: &BatchKey) -> bool {
        self.current.as_ref() != Some(key)
    }

    pub fn set(&mut self, key: BatchKey) {
        self.current = Some(key);
    }

    pub fn reset(&mut self) {
        self.current = None;
    }

    /// True when `texture` is the source or destination of the open batch,
    /// i.e. buffered vertices may still reference it.
    pub fn references(&self, texture: TextureId) -> bool {
        self.current.is_some_and(|k| {
            k.source == Some(texture) || k.target == RenderTarget::Texture(texture)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blit(src: u32, dst: u32) -> BatchKey {
        BatchKey {
            mode: RenderMode::Blit,
            source: Some(TextureId(src)),
            target: RenderTarget::Texture(TextureId(dst)),
            tint: [0; 4],
        }
    }

    #[test]
    fn blank_state_always_switches() {
        let t = StateTracker::default();
        assert!(t.needs_switch(&blit(1, 2)));
    }

    #[test]
    fn identical_key_does_not_switch() {
        let mut t = StateTracker::default();
        t.set(blit(1, 2));
        assert!(!t.needs_switch(&blit(1, 2)));
        assert!(t.needs_switch(&blit(1, 3)));
    }

    #[test]
    fn tint_change_switches() {
        let mut t = StateTracker::default();
        let mut key = blit(1, 2);
        key.mode = RenderMode::ColourFill;
        key.tint = [255, 0, 0, 255];
        t.set(key);
        key.tint = [255, 0, 0, 128];
        assert!(t.needs_switch(&key));
    }

    #[test]
    fn references_source_and_target() {
        let mut t = StateTracker::default();
        assert!(!t.references(TextureId(1)));
        t.set(blit(1, 2));
        assert!(t.references(TextureId(1)));
        assert!(t.references(TextureId(2)));
        assert!(!t.references(TextureId(3)));
        t.reset();
        assert!(!t.references(TextureId(1)));
    }
}
