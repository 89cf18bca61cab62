use thiserror::Error;

/// One bounding box produced by a detection provider.
///
/// Coordinates are pixels in the source frame's coordinate space.
/// The constructor normalizes corner order so `x1 <= x2` and
/// `y1 <= y2`; zero-area boxes are allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    /// Confidence in [0, 1].
    pub score: f32,
    /// Index into the configured [`ClassList`].
    pub class_id: usize,
}

impl Detection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, score: f32, class_id: usize) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
            score,
            class_id,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClassListError {
    #[error("class list {0:?} contains an empty name")]
    EmptyName(String),
}

/// Ordered class names, fixed at configuration time.
///
/// A detection's `class_id` indexes into this list; lookups are
/// checked so an out-of-range id never panics.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassList {
    names: Vec<String>,
}

impl ClassList {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Parse a comma-separated list, e.g. `"bache,persona,auto"`.
    /// Surrounding whitespace per name is trimmed.
    pub fn parse(input: &str) -> Result<Self, ClassListError> {
        let names: Vec<String> = input.split(',').map(|s| s.trim().to_string()).collect();
        if names.iter().any(|n| n.is_empty()) {
            return Err(ClassListError::EmptyName(input.to_string()));
        }
        Ok(Self::new(names))
    }

    pub fn get(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for ClassList {
    /// The demo's road-scene classes.
    fn default() -> Self {
        Self::new(
            ["bache", "persona", "auto", "semaforo"]
                .map(String::from)
                .to_vec(),
        )
    }
}
