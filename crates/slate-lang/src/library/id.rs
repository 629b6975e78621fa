/// Library identifier. Doubles as the scan priority: higher ids are
/// offered tokens first.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LibraryId(u16);

impl LibraryId {
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_raw_id() {
        assert!(LibraryId::new(88) > LibraryId::new(6));
    }
}
