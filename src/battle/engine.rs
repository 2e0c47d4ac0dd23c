use crate::battle::actions;
use crate::battle::capture::{self, Acquisition};
use crate::battle::commands::{self, ActionChoice, TurnAction};
use crate::battle::end_of_turn;
use crate::battle::move_effects;
use crate::battle::phases::{Phase, PhaseOutcome};
use crate::battle::rng::{RngState, TurnRng};
use crate::battle::scheduler::{PhaseQueue, QueuedPhase, Suspension};
use crate::battle::state::{
    BattleEvent, BattleOutcome, BattleState, BattleStatus, CombatantRef, EventBus, FieldPosition,
    Side, SideId,
};
use crate::battle::switching::{self, ReplacementChoice};
use crate::battle::triggers::{self, EntryContext, TriggerEvent, TriggerGuard, TriggerPayload};
use crate::battle::turn_order;
use crate::config::BattleConfig;
use crate::dex::Dex;
use crate::errors::{BattleError, BattleResult, CommandRejection, ConfigError};
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Where `run()` stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Call [`Battle::submit_turn`] with one action per active combatant.
    AwaitingCommands,
    /// Call [`Battle::submit_replacements`] for these slots.
    AwaitingReplacements(Vec<FieldPosition>),
    /// Present the latest events, then call [`Battle::acknowledge`].
    AwaitingAck,
    Ended(BattleOutcome),
}

/// The explicit battle context every phase handler reads and writes through.
///
/// Owns the persisted [`BattleState`] plus everything that only lives while the
/// battle runs: the phase queue, the RNG, the trigger guard and the event log.
pub struct Battle {
    pub(crate) state: BattleState,
    pub(crate) dex: Arc<Dex>,
    pub(crate) config: BattleConfig,
    pub(crate) rng: TurnRng,
    pub(crate) queue: PhaseQueue,
    pub(crate) triggers: TriggerGuard,
    pub(crate) events: EventBus,
    /// Validated commands waiting for the parked TurnInit to pick them up.
    pub(crate) pending_commands: Option<Vec<ActionChoice>>,
    pub(crate) pending_replacements: Option<Vec<ReplacementChoice>>,
    /// This turn's tie-break order over field positions.
    pub(crate) tiebreak: Vec<FieldPosition>,
    pub(crate) acquisitions: Vec<Acquisition>,
}

impl Battle {
    /// Sets up a battle and sends out each side's opening line-up.
    ///
    /// The RNG is seeded from the config, or from entropy when no seed is set.
    /// Fails if the config does not validate.
    pub fn new(
        config: BattleConfig,
        dex: Arc<Dex>,
        player: Side,
        enemy: Side,
    ) -> Result<Self, ConfigError> {
        let rng = match config.seed {
            Some(seed) => TurnRng::seeded(seed),
            None => TurnRng::from_entropy(),
        };
        Self::with_rng(config, dex, player, enemy, rng)
    }

    /// Like [`Battle::new`] with a caller-supplied generator (scripted, in tests).
    pub fn with_rng(
        config: BattleConfig,
        dex: Arc<Dex>,
        player: Side,
        enemy: Side,
        rng: TurnRng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let id = format!("battle-{:016x}", rng.state().initial_seed);
        let state = BattleState::new(id, config.format, config.kind, player, enemy);
        let mut battle = Self::from_parts(state, dex, config, rng);

        for side in SideId::BOTH {
            let slots = battle.state.side(side).field.len();
            let lineup: Vec<usize> = battle.state.side(side).bench().into_iter().take(slots).collect();
            for (slot, party_index) in lineup.into_iter().enumerate() {
                battle.place(FieldPosition::new(side, slot), party_index);
            }
        }
        info!(
            battle_id = %battle.state.battle_id,
            format = ?battle.state.format,
            kind = ?battle.state.kind,
            "battle started"
        );
        battle.queue.push(Phase::BattleStart);
        battle.queue.push(Phase::TurnInit);
        Ok(battle)
    }

    pub(crate) fn from_parts(
        state: BattleState,
        dex: Arc<Dex>,
        config: BattleConfig,
        rng: TurnRng,
    ) -> Self {
        Self {
            state,
            dex,
            config,
            rng,
            queue: PhaseQueue::new(),
            triggers: TriggerGuard::default(),
            events: EventBus::new(),
            pending_commands: None,
            pending_replacements: None,
            tiebreak: Vec::new(),
            acquisitions: Vec::new(),
        }
    }

    /// Rebuilds a running battle from persisted state. The phase queue is not
    /// persisted: outstanding replacements and a fresh turn init are queued.
    pub(crate) fn resume(
        state: BattleState,
        dex: Arc<Dex>,
        config: BattleConfig,
        rng: RngState,
    ) -> Self {
        let mut battle = Self::from_parts(state, dex, config, TurnRng::restore(rng));
        if !battle.state.is_over() {
            if !switching::vacancies(&battle.state).is_empty() {
                battle.queue.push(Phase::Replacement);
            }
            battle.queue.push(Phase::TurnInit);
        }
        info!(battle_id = %battle.state.battle_id, turn = battle.state.turn, "battle resumed");
        battle
    }

    fn place(&mut self, position: FieldPosition, party_index: usize) {
        let side = self.state.side_mut(position.side);
        side.field[position.slot] = Some(party_index);
        side.roster[party_index].field_slot = Some(position.slot);
        self.emit(BattleEvent::SwitchedIn {
            position,
            combatant: CombatantRef::new(position.side, party_index),
        });
    }

    // --- CONTEXT ---

    pub(crate) fn emit(&mut self, event: BattleEvent) {
        trace!(?event, "event");
        self.events.push(event);
    }

    /// Ends the battle and drops every queued phase.
    pub(crate) fn finish(&mut self, outcome: BattleOutcome) {
        if self.state.is_over() {
            return;
        }
        info!(?outcome, turn = self.state.turn, "battle ended");
        self.state.status = BattleStatus::Ended(outcome);
        self.queue.clear();
        self.emit(BattleEvent::BattleEnded { outcome });
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn dex(&self) -> &Dex {
        &self.dex
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn rng_state(&self) -> RngState {
        self.rng.state()
    }

    pub fn queue(&self) -> &PhaseQueue {
        &self.queue
    }

    pub fn events(&self) -> &[BattleEvent] {
        self.events.events()
    }

    /// Hands over every event produced since the last call.
    pub fn take_events(&mut self) -> Vec<BattleEvent> {
        self.events.drain()
    }

    /// Captured combatants the roster layer has not collected yet.
    pub fn take_acquisitions(&mut self) -> Vec<Acquisition> {
        std::mem::take(&mut self.acquisitions)
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        match self.state.status {
            BattleStatus::Ended(outcome) => Some(outcome),
            BattleStatus::InProgress => None,
        }
    }

    pub fn valid_actions(&self, position: FieldPosition) -> Vec<TurnAction> {
        commands::valid_actions(self, position)
    }

    // --- EXTERNAL SIGNALS ---

    /// Accepts one action per active combatant. A rejected selection changes nothing.
    pub fn submit_turn(&mut self, choices: Vec<ActionChoice>) -> Result<(), CommandRejection> {
        if self.queue.suspension() != Some(Suspension::Commands) {
            return Err(CommandRejection::NotAwaitingCommands);
        }
        commands::validate_turn(self, &choices)?;
        self.queue
            .resume(Suspension::Commands)
            .map_err(|_| CommandRejection::NotAwaitingCommands)?;
        debug!(turn = self.state.turn, commands = choices.len(), "turn commands accepted");
        self.pending_commands = Some(choices);
        Ok(())
    }

    pub fn submit_replacements(
        &mut self,
        choices: Vec<ReplacementChoice>,
    ) -> Result<(), CommandRejection> {
        if self.queue.suspension() != Some(Suspension::Replacements) {
            return Err(CommandRejection::NotAwaitingReplacements);
        }
        commands::validate_replacements(&self.state, &choices)?;
        self.queue
            .resume(Suspension::Replacements)
            .map_err(|_| CommandRejection::NotAwaitingReplacements)?;
        self.pending_replacements = Some(choices);
        Ok(())
    }

    /// Completes the phase parked for presentation.
    pub fn acknowledge(&mut self) -> Result<(), CommandRejection> {
        if self.queue.suspension() != Some(Suspension::Ack) {
            return Err(CommandRejection::NotAwaitingAck);
        }
        let resumed = self.queue.resume(Suspension::Ack).and_then(|_| self.queue.finish());
        match resumed {
            Ok(entry) => {
                trace!(id = entry.id, phase = entry.phase.name(), "acknowledged");
                self.settle();
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "acknowledge failed");
                Err(CommandRejection::NotAwaitingAck)
            }
        }
    }

    // --- SCHEDULER LOOP ---

    fn parked_status(&self) -> Option<RunStatus> {
        match self.queue.suspension()? {
            Suspension::Ack => Some(RunStatus::AwaitingAck),
            Suspension::Commands => Some(RunStatus::AwaitingCommands),
            Suspension::Replacements => Some(RunStatus::AwaitingReplacements(
                switching::vacancies(&self.state),
            )),
        }
    }

    /// Runs phases until the battle needs something from outside or ends.
    ///
    /// Phase failures are logged and the phase is skipped. Only a scheduler
    /// invariant violation is returned as an error.
    pub fn run(&mut self) -> BattleResult<RunStatus> {
        loop {
            if let Some(outcome) = self.outcome() {
                return Ok(RunStatus::Ended(outcome));
            }
            if let Some(status) = self.parked_status() {
                return Ok(status);
            }

            // A resumed phase is still in flight and runs again.
            let entry = match self.queue.current() {
                Some(entry) => entry.clone(),
                None => match self.queue.begin_next()? {
                    Some(entry) => entry,
                    None => {
                        warn!(turn = self.state.turn, "phase queue ran dry; starting a new turn");
                        self.queue.push(Phase::TurnInit);
                        continue;
                    }
                },
            };
            self.step(entry)?;
        }
    }

    fn step(&mut self, entry: QueuedPhase) -> BattleResult<()> {
        let name = entry.phase.name();
        debug!(id = entry.id, phase = name, turn = self.state.turn, "phase start");

        match self.dispatch(&entry.phase) {
            Ok(PhaseOutcome::Done) => {
                if self.config.await_acknowledgements
                    && entry.phase.is_presentational()
                    && !self.state.is_over()
                {
                    self.queue.park(Suspension::Ack)?;
                    return Ok(());
                }
                self.queue.finish()?;
                trace!(id = entry.id, phase = name, "phase done");
            }
            Ok(PhaseOutcome::AwaitAck) => self.queue.park(Suspension::Ack)?,
            Ok(PhaseOutcome::AwaitCommands) => self.queue.park(Suspension::Commands)?,
            Ok(PhaseOutcome::AwaitReplacements) => self.queue.park(Suspension::Replacements)?,
            Err(err) if err.is_fatal() => {
                error!(id = entry.id, phase = name, error = %err, "scheduler invariant violated");
                return Err(err);
            }
            Err(err) => {
                warn!(id = entry.id, phase = name, error = %err, "phase failed; skipped");
                self.queue.abandon()?;
            }
        }
        self.settle();
        Ok(())
    }

    /// Ends the battle once a side is out of combatants and no faint is still
    /// waiting to be reported.
    fn settle(&mut self) {
        if self.state.is_over() {
            return;
        }
        let faint_pending = self
            .queue
            .pending()
            .any(|phase| matches!(phase, Phase::Faint(_)));
        if faint_pending {
            return;
        }
        if let Some(outcome) = self.state.evaluate_outcome() {
            self.finish(outcome);
        }
    }

    /// The handler table: one arm per phase variant.
    fn dispatch(&mut self, phase: &Phase) -> BattleResult<PhaseOutcome> {
        match phase {
            Phase::BattleStart => execute_battle_start(self),
            Phase::TurnInit => execute_turn_init(self),
            Phase::Replacement => switching::execute_replacement(self),
            Phase::Summon(summon) => switching::execute_summon(self, summon),
            Phase::Switch(switch) => switching::execute_switch(self, switch),
            Phase::UseItem(item) => actions::execute_use_item(self, item),
            Phase::AttemptCapture(attempt) => capture::execute_capture(self, attempt),
            Phase::AttemptFlee(flee) => actions::execute_flee(self, flee),
            Phase::Move(move_phase) => move_effects::execute_move(self, move_phase),
            Phase::MoveEffect(effect) => move_effects::execute_move_effect(self, effect),
            Phase::MoveEnd(end) => move_effects::execute_move_end(self, end),
            Phase::StatChange(change) => move_effects::execute_stat_change(self, change),
            Phase::Faint(faint) => switching::execute_faint(self, faint),
            Phase::TurnBoundary => end_of_turn::execute_turn_boundary(self),
            Phase::FirePositionalTag(tag) => end_of_turn::execute_fire_tag(self, tag),
            Phase::WeatherTick => end_of_turn::execute_weather_tick(self),
            Phase::StatusTick => end_of_turn::execute_status_tick(self),
            Phase::TurnEnd => end_of_turn::execute_turn_end(self),
        }
    }
}

fn execute_battle_start(battle: &mut Battle) -> BattleResult<PhaseOutcome> {
    for (position, combatant) in turn_order::speed_order(battle) {
        if !battle.state.is_active(combatant) {
            continue;
        }
        triggers::publish(
            battle,
            TriggerEvent::Entry,
            &TriggerPayload::Entry(EntryContext {
                combatant,
                position,
            }),
        );
    }
    Ok(PhaseOutcome::Done)
}

/// Parks for commands, then orders them and queues one phase per action
/// followed by the turn boundary.
fn execute_turn_init(battle: &mut Battle) -> BattleResult<PhaseOutcome> {
    let Some(choices) = battle.pending_commands.take() else {
        info!(turn = battle.state.turn, "turn started");
        battle.emit(BattleEvent::TurnStarted {
            turn: battle.state.turn,
        });
        return Ok(PhaseOutcome::AwaitCommands);
    };

    // Drawn once the commands are known so a restored snapshot draws the same.
    turn_order::roll_tiebreaks(battle);
    let ordered = turn_order::resolve(battle, choices)?;
    for choice in &ordered {
        match commands::to_phase(&battle.state, choice) {
            Some(phase) => {
                battle.queue.unshift(phase);
            }
            None => {
                return Err(BattleError::InvalidTarget(choice.position));
            }
        }
    }
    battle.queue.unshift(Phase::TurnBoundary);
    Ok(PhaseOutcome::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::conditions;
    use crate::battle::phases::SummonPhase;
    use crate::battle::state::DamageSource;
    use crate::battle::tests::common::*;
    use pretty_assertions::assert_eq;
    use schema::{Move, Species};

    #[test]
    fn test_failed_phase_still_reports_the_faint_it_caused() {
        let mut battle = TestBattleBuilder::new()
            .player(TestCombatantBuilder::new(Species::Rattata, 50).with_moves(vec![Move::Tackle]))
            .enemy(TestCombatantBuilder::new(Species::Pidgey, 50).with_moves(vec![Move::Tackle]))
            .enemy(TestCombatantBuilder::new(Species::Magikarp, 20).with_moves(vec![Move::Splash]))
            .build();
        start(&mut battle);
        battle
            .submit_turn(vec![use_move(PLAYER_0, 0), use_move(ENEMY_0, 0)])
            .unwrap();
        let turn_init = battle.queue.current().cloned().unwrap();
        battle.step(turn_init).unwrap();

        // The first action deals lethal damage, then its phase fails.
        let entry = battle.queue.begin_next().unwrap().unwrap();
        conditions::deal_damage(&mut battle, enemy(0), u16::MAX, DamageSource::Spikes, None)
            .unwrap();
        let failing = QueuedPhase {
            id: entry.id,
            phase: Phase::Summon(SummonPhase {
                position: FieldPosition::new(SideId::Enemy, 3),
                party_index: 1,
            }),
        };
        battle.step(failing).unwrap();
        assert!(battle
            .queue
            .pending()
            .any(|phase| matches!(phase, Phase::Faint(f) if f.combatant == enemy(0))));

        let status = battle.run().unwrap();
        assert_eq!(status, RunStatus::AwaitingReplacements(vec![ENEMY_0]));
        let events = battle.take_events();
        assert!(events.iter().any(|e| matches!(
            e,
            BattleEvent::Fainted { combatant, .. } if *combatant == enemy(0)
        )));
        assert!(events
            .iter()
            .any(|e| matches!(e, BattleEvent::TurnEnded { turn: 1 })));
        assert_eq!(battle.state().occupant(ENEMY_0), None);
        assert!(!events
            .iter()
            .any(|e| matches!(e, BattleEvent::MoveUsed { user, .. } if *user == enemy(0))));
    }
}
