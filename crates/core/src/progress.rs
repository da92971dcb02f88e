/// Receives `(current, total)` updates from long-running passes.
pub trait ProgressSink {
    fn progress(&mut self, current: usize, total: usize);

    fn finish(&mut self) {}
}

/// Sink that drops every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn progress(&mut self, _current: usize, _total: usize) {}
}

impl<F> ProgressSink for F
where
    F: FnMut(usize, usize),
{
    fn progress(&mut self, current: usize, total: usize) {
        self(current, total)
    }
}
