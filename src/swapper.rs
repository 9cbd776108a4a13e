use std::mem;

/// Swapper is a wrapper for two things of the same type. It's meant to be
/// useful in situations where you need to iterate over one collection and
/// write the results to a second, then treat the second as the current one.
/// `a` is always the current value; `b` is scratch space.
#[derive(Clone)]
pub struct Swapper<T> {
    a: T,
    b: T,
}

impl<T> Swapper<T> {
    pub fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    pub fn swap(&mut self) {
        mem::swap(&mut self.a, &mut self.b)
    }

    pub fn a(&self) -> &T {
        &self.a
    }

    pub fn mut_a(&mut self) -> &mut T {
        &mut self.a
    }

    pub fn read_a_write_b(&mut self) -> (&T, &mut T) {
        (&self.a, &mut self.b)
    }
}
