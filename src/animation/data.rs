use std::time::Duration;

/// Metadata of one named animation carried by a renderable.
///
/// Playback lives outside this crate; renderables only expose the list so
/// callers can look animations up by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationData {
    pub name: String,
    pub duration: Duration,
}

impl AnimationData {
    #[must_use]
    pub fn new(name: &str, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            duration,
        }
    }

    #[must_use]
    pub fn duration_ms(&self) -> u128 {
        self.duration.as_millis()
    }
}
