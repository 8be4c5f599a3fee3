//! Probabilistic event selector.
//!
//! Every selector round first rolls against a gate probability; if that
//! passes, a category is picked with weights driven by how far the reference
//! price has drifted from its opening value, then a card is drawn from that
//! category's pre-shuffled pile. Piles never repeat a card until exhausted.
//!
//! Weights are transient f64 probabilities; they are computed, consumed and
//! discarded inside one selection and never stored in game state.

use crate::command::Command;
use crate::config::{CategoryWeightConfig, SelectorConfig, SimConfig, WeightMode};
use crate::fixed::Fixed;
use crate::state::InstrumentId;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Bullish,
    Bearish,
    Neutral,
}

/// A market event card: a title and the commands its effect performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCard {
    pub title: String,
    pub effects: Vec<Command>,
}

/// Outcome of one selector attempt. `card` is `None` when the gate roll
/// failed or the chosen pile has no cards even after a refill.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub category: EventCategory,
    pub card: Option<EventCard>,
}

/// One category's deck plus its non-repeating draw order.
#[derive(Debug, Clone)]
struct CardPile {
    cards: Vec<EventCard>,
    /// Pre-shuffled indices into `cards`; draws pop from the back.
    order: Vec<usize>,
}

impl CardPile {
    fn new(cards: Vec<EventCard>) -> Self {
        Self {
            cards,
            order: Vec::new(),
        }
    }

    fn refill(&mut self, rng: &mut StdRng) {
        self.order = (0..self.cards.len()).collect();
        self.order.shuffle(rng);
    }

    fn draw(&mut self, rng: &mut StdRng) -> Option<EventCard> {
        if self.order.is_empty() {
            self.refill(rng);
        }
        let idx = self.order.pop()?;
        self.cards.get(idx).cloned()
    }
}

pub struct EventSelector {
    bullish: CardPile,
    bearish: CardPile,
    neutral: CardPile,
}

impl EventSelector {
    pub fn new(
        bullish: Vec<EventCard>,
        bearish: Vec<EventCard>,
        neutral: Vec<EventCard>,
    ) -> Self {
        Self {
            bullish: CardPile::new(bullish),
            bearish: CardPile::new(bearish),
            neutral: CardPile::new(neutral),
        }
    }

    /// Run one full selector attempt against the current price deviation.
    pub fn select(
        &mut self,
        deviation: f64,
        config: &SelectorConfig,
        rng: &mut StdRng,
    ) -> Selection {
        if rng.gen::<f64>() > config.gate {
            return Selection {
                category: EventCategory::Neutral,
                card: None,
            };
        }

        let [bull, bear, neutral] = category_weights(deviation, config);
        let total = bull + bear + neutral;
        let roll = rng.gen::<f64>() * total;

        let category = if roll < bull {
            EventCategory::Bullish
        } else if roll < bull + bear {
            EventCategory::Bearish
        } else {
            EventCategory::Neutral
        };

        Selection {
            category,
            card: self.pile_mut(category).draw(rng),
        }
    }

    /// Draw directly from a named category, skipping the gate and weights.
    pub fn trigger(&mut self, category: EventCategory, rng: &mut StdRng) -> Option<EventCard> {
        self.pile_mut(category).draw(rng)
    }

    /// Forget all draw progress; every pile reshuffles on its next draw.
    pub fn reset_piles(&mut self) {
        self.bullish.order.clear();
        self.bearish.order.clear();
        self.neutral.order.clear();
    }

    fn pile_mut(&mut self, category: EventCategory) -> &mut CardPile {
        match category {
            EventCategory::Bullish => &mut self.bullish,
            EventCategory::Bearish => &mut self.bearish,
            EventCategory::Neutral => &mut self.neutral,
        }
    }
}

/// Weights for [bullish, bearish, neutral] at the given deviation.
pub fn category_weights(deviation: f64, config: &SelectorConfig) -> [f64; 3] {
    [
        category_weight(deviation, EventCategory::Bullish, config, &config.bullish),
        category_weight(deviation, EventCategory::Bearish, config, &config.bearish),
        category_weight(deviation, EventCategory::Neutral, config, &config.neutral),
    ]
}

fn category_weight(
    deviation: f64,
    category: EventCategory,
    config: &SelectorConfig,
    weights: &CategoryWeightConfig,
) -> f64 {
    let effective = effective_deviation(deviation, category, config.max_deviation);

    match config.mode {
        WeightMode::Linear => {
            let t = (effective / config.max_deviation).clamp(0.0, 1.0);
            lerp(weights.min_probability, weights.max_probability, t)
        }
        WeightMode::Exponential => {
            let normalized = effective / config.max_deviation;
            let t = 1.0 - (-weights.exponential_base * normalized).exp();
            lerp(weights.min_probability, weights.max_probability, t)
        }
        WeightMode::Stepped => {
            let mut probability = weights.min_probability;
            for &(threshold, step_probability) in &weights.steps {
                if effective >= threshold {
                    probability = step_probability;
                } else {
                    break;
                }
            }
            probability
        }
        WeightMode::Curve => {
            if weights.curve.is_empty() {
                return weights.min_probability;
            }
            let x = (0.5 + deviation / (config.max_deviation * 2.0)).clamp(0.0, 1.0);
            curve_eval(&weights.curve, x)
        }
    }
}

/// How strongly the deviation argues for a category. Bullish events favor
/// prices below the opening level, bearish above it, neutral near it.
fn effective_deviation(deviation: f64, category: EventCategory, max_deviation: f64) -> f64 {
    match category {
        EventCategory::Bullish => {
            if deviation < 0.0 {
                deviation.abs()
            } else {
                0.0
            }
        }
        EventCategory::Bearish => {
            if deviation > 0.0 {
                deviation.abs()
            } else {
                0.0
            }
        }
        EventCategory::Neutral => max_deviation - deviation.abs(),
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Piecewise-linear evaluation over (x, y) keyframes with ascending x.
fn curve_eval(points: &[(f64, f64)], x: f64) -> f64 {
    let first = points[0];
    if x <= first.0 {
        return first.1;
    }
    for window in points.windows(2) {
        let (x0, y0) = window[0];
        let (x1, y1) = window[1];
        if x <= x1 {
            if x1 == x0 {
                return y1;
            }
            return lerp(y0, y1, (x - x0) / (x1 - x0));
        }
    }
    points[points.len() - 1].1
}

/// The built-in decks: a handful of cards per category whose effects run
/// through the dispatcher like any player command.
pub fn default_decks(
    config: &SimConfig,
) -> (Vec<EventCard>, Vec<EventCard>, Vec<EventCard>) {
    let surge = |title: &str, instrument: u16, delta: f64| EventCard {
        title: title.to_string(),
        effects: vec![Command::ChangePrice {
            instrument: InstrumentId(instrument),
            delta: Fixed::from_f64(delta),
        }],
    };

    let bullish = vec![
        surge("Supply shortage", 0, 12.0),
        surge("Export boom", 1, 9.0),
        surge("Harvest failure abroad", 2, 10.0),
        EventCard {
            title: "Bull run".to_string(),
            effects: vec![
                Command::ChangePrice {
                    instrument: InstrumentId(0),
                    delta: Fixed::from_int(6),
                },
                Command::ChangePrice {
                    instrument: InstrumentId(1),
                    delta: Fixed::from_int(6),
                },
            ],
        },
    ];

    let bearish = vec![
        surge("Demand collapse", 0, -12.0),
        surge("Cheap imports flood in", 1, -9.0),
        surge("Record harvest", 2, -10.0),
        EventCard {
            title: "Market panic".to_string(),
            effects: vec![
                Command::ChangePrice {
                    instrument: InstrumentId(0),
                    delta: Fixed::from_int(-6),
                },
                Command::ChangePrice {
                    instrument: InstrumentId(2),
                    delta: Fixed::from_int(-6),
                },
            ],
        },
    ];

    let neutral = vec![
        EventCard {
            title: "Margin offer".to_string(),
            effects: vec![Command::AddModifier {
                stacks: 1,
                multiplier: config.modifier.per_stack,
                duration_rounds: 3,
                refresh: config.modifier.refresh,
            }],
        },
        EventCard {
            title: "Quiet week".to_string(),
            effects: vec![Command::RestoreEnergy { amount: 1 }],
        },
        EventCard {
            title: "Sector rotation".to_string(),
            effects: vec![
                Command::ChangePrice {
                    instrument: InstrumentId(1),
                    delta: Fixed::from_int(4),
                },
                Command::ChangePrice {
                    instrument: InstrumentId(2),
                    delta: Fixed::from_int(-4),
                },
            ],
        },
    ];

    (bullish, bearish, neutral)
}
