pub const ALPHABET_LEN: usize = 26;

/// One of the 26 lowercase Latin letters, stored as its offset from `'a'`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Letter(u8);

impl Letter {
    /// Folds ASCII case. Anything outside `a..=z` has no slot in the tree.
    pub fn from_char(ch: char) -> Option<Self> {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_lowercase() {
            Some(Self(lower as u8 - b'a'))
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn to_char(self) -> char {
        (b'a' + self.0) as char
    }

    pub fn all() -> impl Iterator<Item = Letter> {
        (0..ALPHABET_LEN as u8).map(Letter)
    }
}
