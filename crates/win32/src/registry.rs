//! Arena of live tray icons, indexed by small tokens.
//!
//! The window procedure only receives a window handle. Each tray window
//! stores its token in `GWLP_USERDATA`; the dispatcher reads it back and
//! resolves the icon here. Token 0 is never issued, so a window whose user
//! data is still zero resolves to nothing.

use std::num::NonZeroUsize;

/// Handle to an entry in a [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(NonZeroUsize);

impl Token {
    /// Value stored in the window's user data.
    pub fn to_raw(self) -> usize {
        self.0.get()
    }

    /// Reads a token back from window user data; 0 means "unregistered".
    pub fn from_raw(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(Self)
    }
}

/// Slot arena with free-list reuse.
#[derive(Debug)]
pub struct Registry<T> {
    slots: Vec<Option<T>>,
    free: Vec<usize>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: T) -> Token {
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(value);
                slot
            }
            None => {
                self.slots.push(Some(value));
                self.slots.len() - 1
            }
        };
        Token(NonZeroUsize::MIN.saturating_add(slot))
    }

    pub fn get(&self, token: Token) -> Option<&T> {
        self.slots.get(token.0.get() - 1)?.as_ref()
    }

    pub fn remove(&mut self, token: Token) -> Option<T> {
        let slot = token.0.get() - 1;
        let value = self.slots.get_mut(slot)?.take()?;
        self.free.push(slot);
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_never_zero() {
        let mut registry = Registry::new();
        let token = registry.insert("a");
        assert_ne!(token.to_raw(), 0);
        assert_eq!(Token::from_raw(token.to_raw()), Some(token));
        assert_eq!(Token::from_raw(0), None);
    }

    #[test]
    fn insert_get_remove() {
        let mut registry = Registry::new();
        let a = registry.insert("a");
        let b = registry.insert("b");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(a), Some(&"a"));
        assert_eq!(registry.get(b), Some(&"b"));

        assert_eq!(registry.remove(a), Some("a"));
        assert_eq!(registry.get(a), None);
        assert_eq!(registry.remove(a), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut registry = Registry::new();
        let a = registry.insert(1);
        registry.remove(a);
        let b = registry.insert(2);
        assert_eq!(a, b);
        assert_eq!(registry.get(b), Some(&2));
    }

    #[test]
    fn unknown_token_misses() {
        let registry: Registry<u8> = Registry::new();
        let token = Token::from_raw(42).unwrap();
        assert!(registry.get(token).is_none());
        assert!(registry.is_empty());
    }
}
