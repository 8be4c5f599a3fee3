//! Upgradeable player attributes and the per-round energy pool.

use crate::bounded::BoundedInt;
use crate::command::AttributeKind;
use crate::fixed::Fixed;
use serde::{Deserialize, Serialize};

/// One upgradeable attribute. Level starts at 1; the effect value grows
/// linearly with level, the upgrade cost geometrically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub kind: AttributeKind,
    pub level: u32,
    pub max_level: u32,
    pub base_cost: Fixed,
    pub cost_multiplier: Fixed,
    pub value_per_level: Fixed,
}

impl Attribute {
    pub fn new(
        kind: AttributeKind,
        max_level: u32,
        base_cost: Fixed,
        cost_multiplier: Fixed,
        value_per_level: Fixed,
    ) -> Self {
        Self {
            kind,
            level: 1,
            max_level,
            base_cost,
            cost_multiplier,
            value_per_level,
        }
    }

    /// Current effect value: `(level − 1) × value_per_level`.
    pub fn value(&self) -> Fixed {
        self.value_per_level * (self.level - 1) as i64
    }

    /// Cost of the next level: `base × multiplier^(level − 1)`.
    /// `None` once the attribute is at max level.
    pub fn next_upgrade_cost(&self) -> Option<Fixed> {
        if self.level >= self.max_level {
            return None;
        }
        Some(self.base_cost * self.cost_multiplier.powi(self.level - 1))
    }

    /// Raise the level by one. The caller is responsible for having
    /// checked and debited the cost.
    pub fn raise_level(&mut self) {
        debug_assert!(self.level < self.max_level);
        self.level += 1;
    }
}

/// The full attribute table, one entry per [`AttributeKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSet {
    attributes: Vec<Attribute>,
}

impl AttributeSet {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { attributes }
    }

    pub fn get(&self, kind: AttributeKind) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.kind == kind)
    }

    pub fn get_mut(&mut self, kind: AttributeKind) -> Option<&mut Attribute> {
        self.attributes.iter_mut().find(|a| a.kind == kind)
    }

    /// Effect value of an attribute, 0 for kinds not in the table.
    pub fn value(&self, kind: AttributeKind) -> Fixed {
        self.get(kind).map(Attribute::value).unwrap_or(Fixed::ZERO)
    }

    /// Market influence multiplier fed into price ticks:
    /// `1 + charisma_value / 100`.
    pub fn influence_multiplier(&self) -> Fixed {
        Fixed::ONE + self.value(AttributeKind::Charisma) / Fixed::from_int(100)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }
}

/// Per-round energy pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyState {
    pub current: BoundedInt,
    /// Energy carried over from the previous round via Patience.
    pub saved: i32,
}

impl EnergyState {
    pub fn new(initial: i32, max: i32) -> Self {
        Self {
            current: BoundedInt::new(initial, 0, max),
            saved: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn social() -> Attribute {
        Attribute::new(
            AttributeKind::Social,
            10,
            Fixed::from_int(100),
            Fixed::from_f64(1.5),
            Fixed::ONE,
        )
    }

    #[test]
    fn test_value_grows_with_level() {
        let mut a = social();
        assert_eq!(a.value(), Fixed::ZERO);

        a.raise_level();
        assert_eq!(a.value(), Fixed::from_int(1));

        a.raise_level();
        assert_eq!(a.value(), Fixed::from_int(2));
    }

    #[test]
    fn test_upgrade_cost_geometric() {
        let mut a = social();
        // Level 1 → 2 costs the base price
        assert_eq!(a.next_upgrade_cost(), Some(Fixed::from_int(100)));

        a.raise_level();
        assert_eq!(a.next_upgrade_cost(), Some(Fixed::from_int(150)));

        // Level 3: 100 × 1.5² = 225
        a.raise_level();
        assert_eq!(a.next_upgrade_cost(), Some(Fixed::from_int(225)));
    }

    #[test]
    fn test_no_cost_at_max_level() {
        let mut a = social();
        while a.level < a.max_level {
            a.raise_level();
        }
        assert_eq!(a.next_upgrade_cost(), None);
    }

    #[test]
    fn test_influence_multiplier() {
        let mut set = AttributeSet::new(vec![Attribute::new(
            AttributeKind::Charisma,
            10,
            Fixed::from_int(200),
            Fixed::from_f64(1.5),
            Fixed::from_int(10),
        )]);
        assert_eq!(set.influence_multiplier(), Fixed::ONE);

        set.get_mut(AttributeKind::Charisma).unwrap().raise_level();
        // +10% per level
        assert_eq!(set.influence_multiplier(), Fixed::from_f64(1.1));
    }

    #[test]
    fn test_missing_kind_value_is_zero() {
        let set = AttributeSet::new(vec![]);
        assert_eq!(set.value(AttributeKind::Wisdom), Fixed::ZERO);
        assert_eq!(set.influence_multiplier(), Fixed::ONE);
    }
}
