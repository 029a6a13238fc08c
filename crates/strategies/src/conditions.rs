// In crates/strategies/src/conditions.rs

use core_types::Side;
use serde::Serialize;

/// One named predicate and whether it held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub name: &'static str,
    pub passed: bool,
}

/// The ordered sub-conditions behind one side of a signal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConditionSet(Vec<Condition>);

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &'static str, passed: bool) -> &mut Self {
        self.0.push(Condition { name, passed });
        self
    }

    /// True only when there is at least one condition and every one passed.
    pub fn all_passed(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(|c| c.passed)
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.0.iter().find(|c| c.name == name).map(|c| c.passed)
    }

    pub fn passed(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().filter(|c| c.passed).map(|c| c.name)
    }

    pub fn failed(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().filter(|c| !c.passed).map(|c| c.name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.0.iter()
    }
}

/// The outcome of evaluating one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub buy: bool,
    pub sell: bool,
    pub buy_conditions: ConditionSet,
    pub sell_conditions: ConditionSet,
}

impl Evaluation {
    pub fn from_conditions(buy_conditions: ConditionSet, sell_conditions: ConditionSet) -> Self {
        Self {
            buy: buy_conditions.all_passed(),
            sell: sell_conditions.all_passed(),
            buy_conditions,
            sell_conditions,
        }
    }

    /// The side that fired, if exactly one did.
    pub fn fired(&self) -> Option<Side> {
        match (self.buy, self.sell) {
            (true, false) => Some(Side::Buy),
            (false, true) => Some(Side::Sell),
            (true, true) => {
                tracing::warn!("Both BUY and SELL predicates passed; ignoring contradictory signal.");
                None
            }
            (false, false) => None,
        }
    }

    /// Names of the satisfied conditions for `side`.
    pub fn reasons(&self, side: Side) -> Vec<String> {
        let set = match side {
            Side::Buy => &self.buy_conditions,
            Side::Sell => &self.sell_conditions,
        };
        set.passed().map(str::to_string).collect()
    }
}

/// `a > b`, false when either side is missing.
pub(crate) fn above(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a > b)
}

/// `a < b`, false when either side is missing.
pub(crate) fn below(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a < b)
}
