//! Pin registry and per-pin slot arena
//!
//! A backend's pins come from a static board table. [`PinRegistry`] checks
//! the table once and hands out [`PinId`] handles; [`PinSlots`] stores the
//! per-pin mutable state next to it, addressed only through those handles.

use heapless::Vec;
use ionode_hal::PhysicalPin;

/// Highest bit index a pin may use in 32-bit port registers
pub const MAX_BIT_INDEX: u8 = 31;

/// Handle to a registered pin
///
/// Only a [`PinRegistry`] creates these, so a `PinId` always refers to an
/// existing entry of the registry it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinId(u8);

impl PinId {
    /// Position in the board table
    pub const fn position(self) -> usize {
        self.0 as usize
    }
}

/// Board table validation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// Two entries share a bit index
    DuplicateIndex(u8),
    /// Bit index does not fit the port registers
    IndexOutOfRange(u8),
    /// More than one special-register pin
    MultipleSpecial,
    /// Table is larger than the backend's slot capacity
    TooManyPins,
}

/// Validated, immutable table of physical pins
#[derive(Debug, Clone, Copy)]
pub struct PinRegistry {
    pins: &'static [PhysicalPin],
}

impl PinRegistry {
    /// Validate a board table
    ///
    /// `capacity` is the number of slots the owning backend can hold.
    pub fn new(pins: &'static [PhysicalPin], capacity: usize) -> Result<Self, RegistryError> {
        if pins.len() > capacity || pins.len() > usize::from(u8::MAX) {
            return Err(RegistryError::TooManyPins);
        }

        let mut seen = 0u32;
        let mut special = false;
        for pin in pins {
            if pin.index > MAX_BIT_INDEX {
                return Err(RegistryError::IndexOutOfRange(pin.index));
            }
            if seen & pin.mask() != 0 {
                return Err(RegistryError::DuplicateIndex(pin.index));
            }
            seen |= pin.mask();
            if pin.special {
                if special {
                    return Err(RegistryError::MultipleSpecial);
                }
                special = true;
            }
        }

        Ok(Self { pins })
    }

    /// Number of registered pins
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    /// Registry has no pins
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Descriptor of a registered pin
    pub fn get(&self, id: PinId) -> &'static PhysicalPin {
        let pins: &'static [PhysicalPin] = self.pins;
        &pins[id.position()]
    }

    /// Resolve an operator-visible pin number (the bit index)
    pub fn lookup(&self, index: u8) -> Option<PinId> {
        self.pins
            .iter()
            .position(|pin| pin.index == index)
            .map(|position| PinId(position as u8))
    }

    /// All pin handles in table order
    pub fn ids(&self) -> impl Iterator<Item = PinId> {
        (0..self.pins.len() as u8).map(PinId)
    }

    /// All pins with their handles in table order
    pub fn iter(&self) -> impl Iterator<Item = (PinId, &'static PhysicalPin)> {
        let pins: &'static [PhysicalPin] = self.pins;
        pins.iter()
            .enumerate()
            .map(|(position, pin)| (PinId(position as u8), pin))
    }
}

/// Fixed-capacity per-pin storage parallel to a registry
pub struct PinSlots<T, const N: usize> {
    slots: Vec<T, N>,
}

impl<T, const N: usize> PinSlots<T, N> {
    /// Create one slot per registered pin
    ///
    /// The registry was validated against a capacity; callers pass `N`
    /// there, so every pin gets a slot.
    pub fn new(registry: &PinRegistry, mut init: impl FnMut(&PhysicalPin) -> T) -> Self {
        let mut slots = Vec::new();
        for (_, pin) in registry.iter() {
            if slots.push(init(pin)).is_err() {
                break;
            }
        }
        Self { slots }
    }

    pub fn get(&self, id: PinId) -> &T {
        &self.slots[id.position()]
    }

    pub fn get_mut(&mut self, id: PinId) -> &mut T {
        &mut self.slots[id.position()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ionode_hal::MuxSelect;

    static BOARD: [PhysicalPin; 3] = [
        PhysicalPin::new("gpio0", 0, MuxSelect::new(0x34, 0)),
        PhysicalPin::new("gpio4", 4, MuxSelect::new(0x3c, 0)),
        PhysicalPin::special("gpio16", 16),
    ];

    static DUPLICATE: [PhysicalPin; 2] = [
        PhysicalPin::new("a", 2, MuxSelect::new(0, 0)),
        PhysicalPin::new("b", 2, MuxSelect::new(0, 0)),
    ];

    static TWO_SPECIAL: [PhysicalPin; 2] = [
        PhysicalPin::special("a", 16),
        PhysicalPin::special("b", 17),
    ];

    static WIDE: [PhysicalPin; 1] = [PhysicalPin::new("x", 32, MuxSelect::new(0, 0))];

    #[test]
    fn test_lookup_by_bit_index() {
        let registry = PinRegistry::new(&BOARD, 8).unwrap();
        let id = registry.lookup(4).unwrap();
        assert_eq!(registry.get(id).name, "gpio4");
        assert!(registry.lookup(5).is_none());
    }

    #[test]
    fn test_rejects_bad_tables() {
        assert_eq!(
            PinRegistry::new(&DUPLICATE, 8).unwrap_err(),
            RegistryError::DuplicateIndex(2)
        );
        assert_eq!(
            PinRegistry::new(&TWO_SPECIAL, 8).unwrap_err(),
            RegistryError::MultipleSpecial
        );
        assert_eq!(
            PinRegistry::new(&WIDE, 8).unwrap_err(),
            RegistryError::IndexOutOfRange(32)
        );
        assert_eq!(
            PinRegistry::new(&BOARD, 2).unwrap_err(),
            RegistryError::TooManyPins
        );
    }

    #[test]
    fn test_slots_follow_registry() {
        let registry = PinRegistry::new(&BOARD, 4).unwrap();
        let mut slots: PinSlots<u8, 4> = PinSlots::new(&registry, |pin| pin.index);
        let id = registry.lookup(16).unwrap();
        assert_eq!(*slots.get(id), 16);
        *slots.get_mut(id) = 1;
        assert_eq!(*slots.get(id), 1);
    }
}
