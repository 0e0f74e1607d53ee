/// Read-only `Key -> Point` lookup used to compute true distances.
pub trait DataStorage<P>: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, key: usize) -> Option<&P>;
}

/// Storage over a caller-owned slice. Keys are positions in the slice.
///
/// Nothing is copied; the borrow keeps the point set alive for as long as the
/// table that uses it.
#[derive(Debug, Clone, Copy)]
pub struct ArrayDataStorage<'a, P> {
    points: &'a [P],
}

impl<'a, P> ArrayDataStorage<'a, P> {
    pub fn new(points: &'a [P]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &'a [P] {
        self.points
    }
}

impl<P: Sync> DataStorage<P> for ArrayDataStorage<'_, P> {
    fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    fn get(&self, key: usize) -> Option<&P> {
        self.points.get(key)
    }
}
