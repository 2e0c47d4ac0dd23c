//! AI behaviours that pick turn actions and replacements through the same
//! command surface a human player uses.

use crate::battle::commands::{ActionChoice, TurnAction};
use crate::battle::engine::Battle;
use crate::battle::state::{CombatantRef, FieldPosition, SideId};
use crate::battle::stats;
use crate::battle::switching::ReplacementChoice;
use crate::pokemon::Combatant;
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use schema::{MoveCategory, MoveEffect, PokemonType, Target};
use std::collections::BTreeSet;

/// A trait for any system that can decide on battle actions.
pub trait Behavior {
    /// Picks the action for the combatant at `position`, if it has any legal one.
    fn decide_action(&mut self, battle: &Battle, position: FieldPosition) -> Option<TurnAction>;

    /// Picks a benched party member to fill `position`, skipping `taken` ones.
    fn choose_replacement(
        &mut self,
        battle: &Battle,
        position: FieldPosition,
        taken: &BTreeSet<usize>,
    ) -> Option<usize>;

    /// One action for every active combatant on `side`.
    fn plan_turn(&mut self, battle: &Battle, side: SideId) -> Vec<ActionChoice> {
        let mut choices = Vec::new();
        let mut incoming = BTreeSet::new();
        for (position, _) in battle.state().active_on_side(side) {
            let Some(action) = self.decide_action(battle, position) else {
                continue;
            };
            // Two allies may not call in the same party member.
            if let TurnAction::Switch { party_index } = action {
                if !incoming.insert(party_index) {
                    continue;
                }
            }
            choices.push(ActionChoice::new(position, action));
        }
        choices
    }

    fn plan_replacements(
        &mut self,
        battle: &Battle,
        positions: &[FieldPosition],
    ) -> Vec<ReplacementChoice> {
        let mut taken: [BTreeSet<usize>; 2] = Default::default();
        let mut choices = Vec::new();
        for &position in positions {
            let taken = &mut taken[position.side.index()];
            if let Some(party_index) = self.choose_replacement(battle, position, taken) {
                taken.insert(party_index);
                choices.push(ReplacementChoice {
                    position,
                    party_index,
                });
            }
        }
        choices
    }
}

/// Scores every legal action and takes the best one.
pub struct ScoringAi {
    rng: StdRng,
}

impl ScoringAi {
    /// The AI's own jitter source, separate from the battle RNG.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn jitter(&mut self) -> f32 {
        1.0 + (self.rng.random::<f32>() * 0.1 - 0.05) // +/- 5%
    }

    fn score_action(&mut self, battle: &Battle, position: FieldPosition, action: &TurnAction) -> f32 {
        let state = battle.state();
        let Some(user) = state.active_occupant(position) else {
            return f32::MIN;
        };
        match *action {
            TurnAction::UseMove { move_index, target } => {
                let target = target
                    .and_then(|pos| state.active_occupant(pos))
                    .or_else(|| {
                        state
                            .active_on_side(position.side.opponent())
                            .first()
                            .map(|&(_, c)| c)
                    });
                self.score_move(battle, user, move_index, target) * self.jitter()
            }
            TurnAction::Switch { .. } => 1.0 + self.rng.random::<f32>() * 0.1,
            TurnAction::Capture { target, .. } => {
                // Worth a throw once the target is worn down.
                match state.active_occupant(target).and_then(|c| state.combatant(c).ok()) {
                    Some(wild) => {
                        let missing = 1.0 - hp_fraction(wild);
                        80.0 * missing * missing
                    }
                    None => f32::MIN,
                }
            }
            TurnAction::Flee => 0.5,
            TurnAction::UseItem { .. } => 0.0,
        }
    }

    fn score_move(
        &self,
        battle: &Battle,
        user: CombatantRef,
        move_index: usize,
        target: Option<CombatantRef>,
    ) -> f32 {
        let state = battle.state();
        let Ok(attacker) = state.combatant(user) else {
            return 0.0;
        };
        let Some(slot) = attacker.move_slot(move_index) else {
            return 0.0;
        };
        let Ok(data) = battle.dex().move_data(slot.move_) else {
            return 0.0;
        };
        let defender = target.and_then(|t| state.combatant(t).ok());

        // Core damage score.
        let mut damage_score = 0.0;
        if data.is_damaging() {
            let Some(defender) = defender else {
                return 0.0;
            };
            let effectiveness = PokemonType::effectiveness_against(data.move_type, &defender.types);
            if effectiveness < 0.1 {
                return -1.0;
            }
            let stab = if attacker.has_type(data.move_type) { 1.5 } else { 1.0 };
            let power = match data.power {
                Some(power) => f32::from(power),
                // Fixed-damage moves: score by the damage they will do.
                None => 40.0,
            };
            let attack = stats::effective_attack(attacker, data.category);
            let normalized = f32::from(attack) / (f32::from(attacker.level) * 2.0).max(1.0);
            let hits = match data.hit_count() {
                Some(schema::HitCount::Fixed(count)) => f32::from(count),
                Some(schema::HitCount::Random) => 3.0,
                None => 1.0,
            };
            damage_score = power * effectiveness * stab * normalized * hits;
        }

        // Utility from secondary effects.
        let mut utility_score = 0.0;
        for effect in &data.effects {
            match *effect {
                MoveEffect::StatChange {
                    target: Target::User,
                    stat,
                    stages,
                    chance,
                } if stages > 0 => {
                    let current = attacker.stat_stage(stat);
                    if current < 6 {
                        let potential = 1.0 - f32::from(current) / 6.0;
                        utility_score += 20.0 * f32::from(stages) * potential * percent(chance);
                    }
                }
                MoveEffect::StatChange {
                    target: Target::Target,
                    stat,
                    stages,
                    chance,
                } if stages < 0 => {
                    if defender.is_some_and(|d| d.stat_stage(stat) > -6) {
                        utility_score += 15.0 * f32::from(stages.unsigned_abs()) * percent(chance);
                    }
                }
                MoveEffect::Status { chance, .. } => {
                    if defender.is_some_and(|d| d.status.is_none()) {
                        utility_score += 45.0 * percent(chance);
                    }
                }
                MoveEffect::Sacrificial => utility_score -= 60.0 * hp_fraction(attacker),
                MoveEffect::Spikes | MoveEffect::SetWeather(_) | MoveEffect::Tailwind { .. } => {
                    utility_score += 10.0;
                }
                MoveEffect::DelayedAttack { .. } => utility_score += 25.0,
                MoveEffect::DelayedHeal { .. } => {
                    utility_score += 40.0 * (1.0 - hp_fraction(attacker));
                }
                _ => {}
            }
        }

        if data.category == MoveCategory::Status && utility_score < 1.0 {
            return -1.0;
        }
        let mut final_score = damage_score + utility_score;
        if data.category != MoveCategory::Status {
            let accuracy = data.accuracy.unwrap_or(101); // Sure-hit moves get a slight edge.
            final_score *= f32::from(accuracy) / 100.0;
        }
        final_score
    }
}

fn percent(chance: u8) -> f32 {
    f32::from(chance) / 100.0
}

fn hp_fraction(combatant: &Combatant) -> f32 {
    f32::from(combatant.current_hp()) / f32::from(combatant.max_hp().max(1))
}

impl Behavior for ScoringAi {
    fn decide_action(&mut self, battle: &Battle, position: FieldPosition) -> Option<TurnAction> {
        let actions = battle.valid_actions(position);
        let scored: Vec<(TurnAction, f32)> = actions
            .into_iter()
            .map(|action| {
                let score = self.score_action(battle, position, &action);
                (action, score)
            })
            .collect();
        scored
            .into_iter()
            .max_by_key(|(_, score)| OrderedFloat(*score))
            .map(|(action, _)| action)
    }

    /// Sends in the healthiest benched member.
    fn choose_replacement(
        &mut self,
        battle: &Battle,
        position: FieldPosition,
        taken: &BTreeSet<usize>,
    ) -> Option<usize> {
        let side = battle.state().side(position.side);
        side.bench()
            .into_iter()
            .filter(|index| !taken.contains(index))
            .max_by_key(|&index| OrderedFloat(hp_fraction(&side.roster[index])))
    }
}
