// Animation timelines and playback state

use super::skeleton::Skeleton;

#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe<const N: usize> {
    pub time: f32,
    pub values: [f32; N],
    /// Hold `values` until the next key instead of interpolating.
    pub stepped: bool,
}

/// Sample a keyframe track at `time`. `None` before the first key.
pub fn sample<const N: usize>(frames: &[Keyframe<N>], time: f32) -> Option<[f32; N]> {
    let first = frames.first()?;
    if time < first.time {
        return None;
    }
    // index of the first key strictly after `time`
    let next = frames.partition_point(|k| k.time <= time);
    if next >= frames.len() {
        return frames.last().map(|k| k.values);
    }
    let prev = &frames[next - 1];
    let after = &frames[next];
    if prev.stepped || after.time <= prev.time {
        return Some(prev.values);
    }
    let t = (time - prev.time) / (after.time - prev.time);
    let mut out = prev.values;
    for (value, target) in out.iter_mut().zip(after.values) {
        *value += (target - *value) * t;
    }
    Some(out)
}

#[derive(Debug, Clone)]
pub enum Timeline {
    Rotate { bone: usize, frames: Vec<Keyframe<1>> },
    Translate { bone: usize, frames: Vec<Keyframe<2>> },
    Scale { bone: usize, frames: Vec<Keyframe<2>> },
    Shear { bone: usize, frames: Vec<Keyframe<2>> },
    Attachment { slot: usize, frames: Vec<(f32, Option<String>)> },
}

impl Timeline {
    pub fn last_time(&self) -> f32 {
        match self {
            Timeline::Rotate { frames, .. } => frames.last().map_or(0.0, |k| k.time),
            Timeline::Translate { frames, .. }
            | Timeline::Scale { frames, .. }
            | Timeline::Shear { frames, .. } => frames.last().map_or(0.0, |k| k.time),
            Timeline::Attachment { frames, .. } => frames.last().map_or(0.0, |k| k.0),
        }
    }

    /// Pose the skeleton at `time`. Values are absolute over the setup pose.
    pub fn apply(&self, skeleton: &mut Skeleton, time: f32) {
        match self {
            Timeline::Rotate { bone, frames } => {
                let setup = skeleton.data().bones[*bone].rotation;
                let value = sample(frames, time).map_or(0.0, |[r]| r);
                skeleton.bones[*bone].rotation = setup + value;
            }
            Timeline::Translate { bone, frames } => {
                let setup = &skeleton.data().bones[*bone];
                let (sx, sy) = (setup.x, setup.y);
                let [x, y] = sample(frames, time).unwrap_or([0.0, 0.0]);
                let b = &mut skeleton.bones[*bone];
                b.x = sx + x;
                b.y = sy + y;
            }
            Timeline::Scale { bone, frames } => {
                let setup = &skeleton.data().bones[*bone];
                let (sx, sy) = (setup.scale_x, setup.scale_y);
                let [x, y] = sample(frames, time).unwrap_or([1.0, 1.0]);
                let b = &mut skeleton.bones[*bone];
                b.scale_x = sx * x;
                b.scale_y = sy * y;
            }
            Timeline::Shear { bone, frames } => {
                let setup = &skeleton.data().bones[*bone];
                let (sx, sy) = (setup.shear_x, setup.shear_y);
                let [x, y] = sample(frames, time).unwrap_or([0.0, 0.0]);
                let b = &mut skeleton.bones[*bone];
                b.shear_x = sx + x;
                b.shear_y = sy + y;
            }
            Timeline::Attachment { slot, frames } => {
                let next = frames.partition_point(|(t, _)| *t <= time);
                let name = match next {
                    0 => skeleton.data().slots[*slot].attachment.clone(),
                    n => frames[n - 1].1.clone(),
                };
                skeleton.set_attachment(*slot, name);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Animation {
    pub name: String,
    pub duration: f32,
    pub timelines: Vec<Timeline>,
}

impl Animation {
    pub fn apply(&self, skeleton: &mut Skeleton, time: f32, looping: bool) {
        let time = if looping && self.duration > 0.0 {
            time % self.duration
        } else {
            time.min(self.duration)
        };
        for timeline in &self.timelines {
            timeline.apply(skeleton, time);
        }
    }
}

/// Playback of at most one animation on a single track.
#[derive(Debug, Clone)]
pub struct AnimationState {
    current: Option<usize>,
    time: f32,
    looping: bool,
    /// 0 freezes playback.
    pub time_scale: f32,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            current: None,
            time: 0.0,
            looping: false,
            time_scale: 1.0,
        }
    }
}

impl AnimationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart playback of `animation` from time zero.
    pub fn set_animation(&mut self, animation: usize, looping: bool) {
        self.current = Some(animation);
        self.time = 0.0;
        self.looping = looping;
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn update(&mut self, delta: f32) {
        if self.current.is_some() {
            self.time += delta * self.time_scale;
        }
    }

    /// Reset to the setup pose and apply the current animation on top.
    pub fn apply(&self, skeleton: &mut Skeleton) {
        skeleton.set_bones_to_setup_pose();
        let Some(index) = self.current else {
            return;
        };
        let data = skeleton.shared_data();
        if let Some(animation) = data.animations.get(index) {
            animation.apply(skeleton, self.time, self.looping);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key<const N: usize>(time: f32, values: [f32; N], stepped: bool) -> Keyframe<N> {
        Keyframe {
            time,
            values,
            stepped,
        }
    }

    #[test]
    fn samples_linearly_between_keys() {
        let frames = [key(0.0, [0.0, 10.0], false), key(1.0, [10.0, 20.0], false)];
        assert_eq!(sample(&frames, 0.5), Some([5.0, 15.0]));
        assert_eq!(sample(&frames, 2.0), Some([10.0, 20.0]));
    }

    #[test]
    fn stepped_key_holds_value() {
        let frames = [key(0.0, [1.0], true), key(1.0, [9.0], false)];
        assert_eq!(sample(&frames, 0.99), Some([1.0]));
        assert_eq!(sample(&frames, 1.0), Some([9.0]));
    }

    #[test]
    fn nothing_before_first_key() {
        let frames = [key(0.5, [1.0], false)];
        assert_eq!(sample(&frames, 0.25), None);
        assert_eq!(sample::<1>(&[], 0.25), None);
    }

    #[test]
    fn time_scale_controls_advance() {
        let mut state = AnimationState::new();
        state.update(1.0);
        assert_eq!(state.time(), 0.0, "no animation, no clock");

        state.set_animation(0, true);
        state.time_scale = 2.0;
        state.update(0.25);
        assert_eq!(state.time(), 0.5);

        state.time_scale = 0.0;
        state.update(10.0);
        assert_eq!(state.time(), 0.5);
    }
}
