/// Progress reporting for the scrape. Front ends implement this to surface status.
pub trait Progress {
    /// Called once before the first country, with the number of countries.
    fn begin(&mut self, _total: usize) {}

    /// Called after each country, successful or not. `done` counts from 1.
    fn item_done(&mut self, _done: usize, _total: usize) {}

    /// A per-country problem worth showing to the user.
    fn warn(&mut self, _msg: &str) {}

    fn finish(&mut self) {}
}

/// A no-op progress sink.
#[cfg(test)]
pub struct NullProgress;
#[cfg(test)]
impl Progress for NullProgress {}

pub fn fraction(done: usize, total: usize) -> f32 {
    if total == 0 {
        1.0
    } else {
        done as f32 / total as f32
    }
}
