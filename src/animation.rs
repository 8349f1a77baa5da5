use crate::components::{Frame, FrameId, FrameSet};

pub const DEFAULT_ANIMATION_SPEED: f32 = 10.0;

/// Time-accumulated frame index over a shared frame sequence.
#[derive(Clone, Debug)]
pub struct Animator {
    frames: FrameSet,
    frame_index: f32,
    /// Frames per second. Zero freezes the animation.
    pub speed: f32,
    /// Every frame mirrored horizontally (toggled by patrol reversals).
    pub mirrored: bool,
}

impl Animator {
    pub fn new(frames: FrameSet) -> Result<Self, String> {
        if frames.is_empty() {
            return Err("animated entity needs at least one frame".to_string());
        }
        Ok(Self {
            frames,
            frame_index: 0.0,
            speed: DEFAULT_ANIMATION_SPEED,
            mirrored: false,
        })
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn frame_index(&self) -> f32 {
        self.frame_index
    }

    pub fn set_frame_index(&mut self, index: f32) {
        self.frame_index = index;
    }

    /// Advances by `speed * dt` and returns the frame to show.
    pub fn advance(&mut self, dt: f32) -> Frame {
        self.frame_index += self.speed * dt;
        self.current()
    }

    pub fn current(&self) -> Frame {
        Frame::plain(self.frame_at(self.frame_index)).flipped(self.mirrored)
    }

    fn frame_at(&self, index: f32) -> FrameId {
        let len = self.frames.len();
        let slot = (index.max(0.0) as usize) % len;
        self.frames[slot]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::frame_set;

    #[test]
    fn empty_frame_set_is_rejected() {
        assert!(Animator::new(frame_set(Vec::new())).is_err());
    }

    #[test]
    fn index_accumulates_and_wraps() {
        let mut anim = Animator::new(frame_set([10, 11, 12])).expect("frames");
        assert_eq!(anim.current().id, FrameId(10));
        assert_eq!(anim.advance(0.15).id, FrameId(11));
        assert_eq!(anim.advance(0.1).id, FrameId(12));
        assert_eq!(anim.advance(0.1).id, FrameId(10));
        assert!((anim.frame_index() - 3.5).abs() < 1e-4);
    }

    #[test]
    fn zero_speed_freezes() {
        let mut anim = Animator::new(frame_set([1, 2])).expect("frames").with_speed(0.0);
        assert_eq!(anim.advance(5.0).id, FrameId(1));
    }

    #[test]
    fn mirrored_frames_are_flipped() {
        let mut anim = Animator::new(frame_set([1])).expect("frames");
        anim.mirrored = true;
        assert!(anim.current().flip_x);
    }
}
