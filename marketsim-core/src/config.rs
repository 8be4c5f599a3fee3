//! Simulation configuration. All tunables are plain data with serde
//! defaults so a partial JSON config overrides only what it names.

use crate::attributes::{Attribute, AttributeSet, EnergyState};
use crate::command::AttributeKind;
use crate::fixed::Fixed;
use crate::modifiers::ModifierStack;
use crate::state::{GameState, InstrumentId, InstrumentState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub seed: u64,
    /// Wall-clock length of one round, consumed by the tick timer.
    pub round_interval_ms: u64,
    /// The event selector fires every this many rounds.
    pub event_interval_rounds: u64,
    pub starting_money: Fixed,
    pub market: MarketConfig,
    pub instruments: Vec<InstrumentConfig>,
    pub modifier: ModifierConfig,
    pub selector: SelectorConfig,
    pub attributes: AttributeConfig,
    pub energy: EnergyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Largest random per-round delta before volatility and influence.
    pub max_delta: Fixed,
    pub min_price: Fixed,
    pub max_price: Fixed,
    pub history_cap: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub name: String,
    pub symbol: String,
    pub base_price: Fixed,
    pub volatility: Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierConfig {
    pub per_stack: Fixed,
    pub max_stacks: u32,
    /// Refresh flag used by event-card payloads when they grant stacks.
    pub refresh: bool,
}

/// Weighting mode for the event selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightMode {
    Linear,
    Exponential,
    Stepped,
    Curve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Probability that any event fires at all on a selector round.
    pub gate: f64,
    /// Deviation magnitude treated as the far end of the scale.
    pub max_deviation: f64,
    pub mode: WeightMode,
    /// Instrument whose deviation drives the category weights.
    pub reference_instrument: u16,
    pub bullish: CategoryWeightConfig,
    pub bearish: CategoryWeightConfig,
    pub neutral: CategoryWeightConfig,
}

/// Per-category probability tunables, covering all four weight modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryWeightConfig {
    pub exponential_base: f64,
    pub min_probability: f64,
    pub max_probability: f64,
    /// (deviation threshold, probability) pairs, ascending thresholds.
    pub steps: Vec<(f64, f64)>,
    /// (normalized price, probability) keyframes, ascending x.
    pub curve: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeConfig {
    pub max_level: u32,
    pub cost_multiplier: Fixed,
    pub social_base_cost: Fixed,
    pub patience_base_cost: Fixed,
    pub wisdom_base_cost: Fixed,
    pub charisma_base_cost: Fixed,
    /// Market influence gained per Charisma level, in percent points.
    pub charisma_value_per_level: Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    /// Energy restored at the start of every round, before Wisdom.
    pub base_restore: i32,
    pub max: i32,
    /// Cards dealt at the start of every round, before Social.
    pub base_draw: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            round_interval_ms: 5000,
            event_interval_rounds: 2,
            starting_money: Fixed::from_int(1000),
            market: MarketConfig::default(),
            instruments: default_instruments(),
            modifier: ModifierConfig::default(),
            selector: SelectorConfig::default(),
            attributes: AttributeConfig::default(),
            energy: EnergyConfig::default(),
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            max_delta: Fixed::from_int(5),
            min_price: Fixed::from_int(1),
            max_price: Fixed::from_int(1000),
            history_cap: 40,
        }
    }
}

fn default_instruments() -> Vec<InstrumentConfig> {
    vec![
        InstrumentConfig {
            name: "Oil".into(),
            symbol: "OIL".into(),
            base_price: Fixed::from_int(100),
            volatility: Fixed::from_f64(1.2),
        },
        InstrumentConfig {
            name: "Steel".into(),
            symbol: "STL".into(),
            base_price: Fixed::from_int(100),
            volatility: Fixed::from_f64(0.8),
        },
        InstrumentConfig {
            name: "Cotton".into(),
            symbol: "CTN".into(),
            base_price: Fixed::from_int(100),
            volatility: Fixed::ONE,
        },
    ]
}

impl Default for ModifierConfig {
    fn default() -> Self {
        Self {
            per_stack: Fixed::from_int(2),
            max_stacks: 10,
            refresh: true,
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            gate: 0.7,
            max_deviation: 0.8,
            mode: WeightMode::Exponential,
            reference_instrument: 0,
            bullish: CategoryWeightConfig {
                curve: vec![(0.0, 0.9), (0.5, 0.3), (1.0, 0.05)],
                ..CategoryWeightConfig::default()
            },
            bearish: CategoryWeightConfig {
                curve: vec![(0.0, 0.05), (0.5, 0.3), (1.0, 0.9)],
                ..CategoryWeightConfig::default()
            },
            neutral: CategoryWeightConfig {
                exponential_base: 0.5,
                min_probability: 0.2,
                max_probability: 0.5,
                ..CategoryWeightConfig::default()
            },
        }
    }
}

impl Default for CategoryWeightConfig {
    fn default() -> Self {
        Self {
            exponential_base: 1.5,
            min_probability: 0.05,
            max_probability: 0.9,
            steps: vec![(0.1, 0.4), (0.2, 0.6), (0.4, 0.8), (0.8, 0.95)],
            curve: Vec::new(),
        }
    }
}

impl Default for AttributeConfig {
    fn default() -> Self {
        Self {
            max_level: 10,
            cost_multiplier: Fixed::from_f64(1.5),
            social_base_cost: Fixed::from_int(100),
            patience_base_cost: Fixed::from_int(150),
            wisdom_base_cost: Fixed::from_int(120),
            charisma_base_cost: Fixed::from_int(200),
            charisma_value_per_level: Fixed::from_int(10),
        }
    }
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            base_restore: 3,
            max: 10,
            base_draw: 5,
        }
    }
}

/// The stepped lookup and curve evaluation both assume ascending x values.
fn sort_by_threshold(category: &str, table: &str, pairs: &mut [(f64, f64)]) {
    if pairs.windows(2).any(|w| w[0].0 > w[1].0) {
        log::warn!("{category} {table} thresholds out of order, sorting");
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    }
}

impl SimConfig {
    /// Clamp out-of-range tunables back to usable values, logging each fix.
    /// Never rejects a config outright.
    pub fn validated(mut self) -> Self {
        if self.instruments.is_empty() {
            log::warn!("config has no instruments, restoring defaults");
            self.instruments = default_instruments();
        }
        if self.market.history_cap == 0 {
            log::warn!("history_cap 0 is unusable, using 1");
            self.market.history_cap = 1;
        }
        if self.market.min_price > self.market.max_price {
            log::warn!(
                "min_price {} above max_price {}, swapping",
                self.market.min_price,
                self.market.max_price
            );
            std::mem::swap(&mut self.market.min_price, &mut self.market.max_price);
        }
        if self.modifier.max_stacks == 0 {
            log::warn!("max_stacks 0 disables the modifier entirely, using 1");
            self.modifier.max_stacks = 1;
        }
        if !(0.0..=1.0).contains(&self.selector.gate) {
            log::warn!("gate {} outside [0, 1], clamping", self.selector.gate);
            self.selector.gate = self.selector.gate.clamp(0.0, 1.0);
        }
        if self.selector.max_deviation <= 0.0 {
            log::warn!(
                "max_deviation {} must be positive, using 0.8",
                self.selector.max_deviation
            );
            self.selector.max_deviation = 0.8;
        }
        if self.selector.reference_instrument as usize >= self.instruments.len() {
            log::warn!(
                "reference instrument {} out of range, using 0",
                self.selector.reference_instrument
            );
            self.selector.reference_instrument = 0;
        }
        if self.event_interval_rounds == 0 {
            log::warn!("event_interval_rounds 0 would fire every check, using 1");
            self.event_interval_rounds = 1;
        }
        if self.attributes.max_level == 0 {
            log::warn!("attribute max_level 0 is unusable, using 1");
            self.attributes.max_level = 1;
        }
        for (name, weights) in [
            ("bullish", &mut self.selector.bullish),
            ("bearish", &mut self.selector.bearish),
            ("neutral", &mut self.selector.neutral),
        ] {
            sort_by_threshold(name, "steps", &mut weights.steps);
            sort_by_threshold(name, "curve", &mut weights.curve);
        }
        self
    }

    /// Build the table of attributes at level 1.
    pub fn attribute_set(&self) -> AttributeSet {
        let a = &self.attributes;
        let entry = |kind, base_cost, value_per_level| {
            Attribute::new(kind, a.max_level, base_cost, a.cost_multiplier, value_per_level)
        };
        AttributeSet::new(vec![
            entry(AttributeKind::Social, a.social_base_cost, Fixed::ONE),
            entry(AttributeKind::Patience, a.patience_base_cost, Fixed::ONE),
            entry(AttributeKind::Wisdom, a.wisdom_base_cost, Fixed::ONE),
            entry(
                AttributeKind::Charisma,
                a.charisma_base_cost,
                a.charisma_value_per_level,
            ),
        ])
    }

    /// Fresh game state at round zero.
    pub fn initial_state(&self) -> GameState {
        let instruments = self
            .instruments
            .iter()
            .enumerate()
            .map(|(i, cfg)| {
                InstrumentState::new(
                    InstrumentId(i as u16),
                    cfg.name.clone(),
                    cfg.symbol.clone(),
                    cfg.base_price,
                    self.market.min_price,
                    self.market.max_price,
                    cfg.volatility,
                    self.market.history_cap,
                )
            })
            .collect();

        GameState {
            money: self.starting_money,
            instruments,
            modifier: ModifierStack::new(self.modifier.per_stack, self.modifier.max_stacks),
            predictions: Vec::new(),
            attributes: self.attribute_set(),
            energy: EnergyState::new(self.energy.base_restore, self.energy.max),
            round: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_usable() {
        let config = SimConfig::default().validated();
        assert_eq!(config.instruments.len(), 3);
        assert_eq!(config.instruments[0].volatility, Fixed::from_f64(1.2));
        assert_eq!(config.selector.gate, 0.7);
    }

    #[test]
    fn test_validated_fixes_bad_values() {
        let mut config = SimConfig::default();
        config.instruments.clear();
        config.market.history_cap = 0;
        config.selector.gate = 1.7;
        config.selector.max_deviation = -1.0;
        config.event_interval_rounds = 0;

        let config = config.validated();
        assert!(!config.instruments.is_empty());
        assert_eq!(config.market.history_cap, 1);
        assert_eq!(config.selector.gate, 1.0);
        assert_eq!(config.selector.max_deviation, 0.8);
        assert_eq!(config.event_interval_rounds, 1);
    }

    #[test]
    fn test_validated_sorts_unordered_weight_tables() {
        let mut config = SimConfig::default();
        config.selector.bullish.steps = vec![(0.4, 0.8), (0.1, 0.4), (0.2, 0.6)];
        config.selector.bearish.curve = vec![(1.0, 0.9), (0.0, 0.05), (0.5, 0.3)];

        let config = config.validated();
        assert_eq!(
            config.selector.bullish.steps,
            vec![(0.1, 0.4), (0.2, 0.6), (0.4, 0.8)]
        );
        assert_eq!(
            config.selector.bearish.curve,
            vec![(0.0, 0.05), (0.5, 0.3), (1.0, 0.9)]
        );
    }

    #[test]
    fn test_partial_json_overrides() {
        let config: SimConfig = serde_json::from_str(r#"{"seed": 7}"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.instruments.len(), 3);
    }

    #[test]
    fn test_initial_state() {
        let config = SimConfig::default();
        let state = config.initial_state();

        assert_eq!(state.money, Fixed::from_int(1000));
        assert_eq!(state.round, 0);
        assert_eq!(state.instruments.len(), 3);
        assert_eq!(state.instruments[1].symbol, "STL");
        assert_eq!(state.instruments[0].price.get(), Fixed::from_int(100));
        assert_eq!(state.energy.current.get(), 3);
        assert!(!state.modifier.is_active());
    }
}
