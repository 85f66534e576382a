/// Handle returned by [`Ticker::register`]; pass it back to deregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickHandle(u64);

pub type TickHook<S> = fn(&mut S, f32);

/// Per-frame hooks over some state `S`, run in registration order.
pub struct Ticker<S> {
    hooks: Vec<(TickHandle, TickHook<S>)>,
    next: u64,
}

impl<S> Default for Ticker<S> {
    fn default() -> Self {
        Self {
            hooks: Vec::new(),
            next: 0,
        }
    }
}

impl<S> Ticker<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: TickHook<S>) -> TickHandle {
        let handle = TickHandle(self.next);
        self.next += 1;
        self.hooks.push((handle, hook));
        handle
    }

    /// `false` if the handle was already gone.
    pub fn deregister(&mut self, handle: TickHandle) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|(h, _)| *h != handle);
        self.hooks.len() != before
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn run(&self, state: &mut S, delta: f32) {
        for (_, hook) in &self.hooks {
            hook(state, delta);
        }
    }
}
