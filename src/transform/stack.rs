use glam::Mat4;

/// A LIFO stack of transforms, shared by the scratch (`transformbegin`/
/// `transformend`) and joint (`jointtransformbegin`/`jointtransformend`)
/// directive pairs. Unbounded depth, per spec.
#[derive(Debug, Default, Clone)]
pub struct TransformStack {
    frames: Vec<Mat4>,
}

impl TransformStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, current: Mat4) {
        self.frames.push(current);
    }

    pub fn pop(&mut self) -> Option<Mat4> {
        self.frames.pop()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Unmatched `*end`: reset to identity rather than underflow.
    pub fn reset(&mut self) {
        self.frames.clear();
    }
}
