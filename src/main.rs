use clap::Parser;
use pokemon_battle_core::battle::ai::{Behavior, ScoringAi};
use pokemon_battle_core::battle::engine::{Battle, RunStatus};
use pokemon_battle_core::battle::state::{CombatantRef, Controller, Side, SideId};
use pokemon_battle_core::config::BattleConfig;
use pokemon_battle_core::dex::Dex;
use pokemon_battle_core::pokemon::Combatant;
use pokemon_battle_core::{BattleFormat, BattleKind, HeldItem, Move, Species};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Runs an AI-versus-AI battle on the built-in dex and prints what happens.
#[derive(Debug, Parser)]
#[command(name = "battle-sim", version)]
struct Args {
    /// RNG seed; the same seed replays the same battle.
    #[arg(long)]
    seed: Option<u64>,

    /// Two combatants per side.
    #[arg(long)]
    doubles: bool,

    /// Fight a wild line-up instead of a trainer.
    #[arg(long)]
    wild: bool,

    /// RON battle config; flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop after this many turns.
    #[arg(long, default_value_t = 200)]
    max_turns: u32,
}

type Member = (Species, u8, &'static [Move], Option<HeldItem>);

const PLAYER_TEAM: &[Member] = &[
    (Species::Staraptor, 50, &[Move::DoubleEdge, Move::QuickAttack, Move::UTurn, Move::Tailwind], None),
    (Species::Gengar, 50, &[Move::Psychic, Move::Hypnosis, Move::FutureSight, Move::Toxic], Some(HeldItem::Leftovers)),
    (Species::Azumarill, 50, &[Move::Surf, Move::IceBeam, Move::DoubleEdge, Move::RainDance], Some(HeldItem::ChoiceBand)),
    (Species::Kangaskhan, 50, &[Move::DoubleKick, Move::Earthquake, Move::Bite, Move::Wish], Some(HeldItem::SitrusBerry)),
];

const TRAINER_TEAM: &[Member] = &[
    (Species::Gyarados, 50, &[Move::Surf, Move::Bite, Move::ThunderWave, Move::Earthquake], None),
    (Species::Torkoal, 50, &[Move::Flamethrower, Move::Spikes, Move::Earthquake, Move::SunnyDay], Some(HeldItem::Leftovers)),
    (Species::Bisharp, 50, &[Move::Counter, Move::SwordsDance, Move::FurySwipes, Move::SeismicToss], Some(HeldItem::MultiLens)),
    (Species::Ninjask, 50, &[Move::FurySwipes, Move::SwordsDance, Move::GigaDrain, Move::UTurn], None),
];

const WILD_TEAM: &[Member] = &[
    (Species::Pikachu, 18, &[Move::ThunderShock, Move::QuickAttack, Move::Growl, Move::Teleport], None),
    (Species::Pidgey, 16, &[Move::Tackle, Move::QuickAttack], None),
];

fn build_roster(dex: &Dex, members: &[Member]) -> Result<Vec<Combatant>, Box<dyn Error>> {
    let mut roster = Vec::with_capacity(members.len());
    for (index, &(species, level, moves, item)) in members.iter().enumerate() {
        let data = dex.species(species)?;
        let move_data = moves
            .iter()
            .map(|&id| dex.move_data(id))
            .collect::<Result<Vec<_>, _>>()?;
        let mut combatant = Combatant::new(data, level, &move_data);
        if let Some(item) = item {
            // Owner and sequence are fixed up when the side is built.
            combatant.attach_item(item, CombatantRef::new(SideId::Player, index), 0);
        }
        roster.push(combatant);
    }
    Ok(roster)
}

fn print_events(battle: &mut Battle) {
    for event in battle.take_events() {
        if let Some(text) = event.format(battle.state()) {
            println!("  {}", text);
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => BattleConfig::load(path)?,
        None => BattleConfig::default().with_kind(BattleKind::Trainer),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if args.doubles {
        config = config.with_format(BattleFormat::Doubles);
    }
    if args.wild {
        config = config.with_kind(BattleKind::Wild);
    }
    // The acknowledgement handshake is for interactive front ends.
    config.await_acknowledgements = false;

    let dex = Arc::new(Dex::builtin()?);
    let player = Side::new(
        SideId::Player,
        "Player",
        Controller::Player,
        build_roster(&dex, PLAYER_TEAM)?,
    );
    let enemy = match config.kind {
        BattleKind::Wild => Side::new(SideId::Enemy, "Wild", Controller::Wild, build_roster(&dex, WILD_TEAM)?),
        BattleKind::Trainer => Side::new(
            SideId::Enemy,
            "Rival",
            Controller::Trainer,
            build_roster(&dex, TRAINER_TEAM)?,
        ),
    };

    let ai_seed = config.seed.unwrap_or_default();
    let mut battle = Battle::new(config, dex, player, enemy)?;
    let mut player_ai = ScoringAi::new(ai_seed);
    let mut enemy_ai = ScoringAi::new(ai_seed.wrapping_add(1));

    loop {
        let status = battle.run()?;
        print_events(&mut battle);
        match status {
            RunStatus::AwaitingCommands => {
                if battle.state().turn > args.max_turns {
                    warn!(turn = battle.state().turn, "turn limit reached");
                    break;
                }
                let mut choices = player_ai.plan_turn(&battle, SideId::Player);
                choices.extend(enemy_ai.plan_turn(&battle, SideId::Enemy));
                if let Err(rejection) = battle.submit_turn(choices) {
                    // Someone has nothing legal left to do.
                    warn!(%rejection, "turn rejected; stopping");
                    break;
                }
            }
            RunStatus::AwaitingReplacements(positions) => {
                let (ours, theirs): (Vec<_>, Vec<_>) = positions
                    .into_iter()
                    .partition(|pos| pos.side == SideId::Player);
                let mut choices = player_ai.plan_replacements(&battle, &ours);
                choices.extend(enemy_ai.plan_replacements(&battle, &theirs));
                battle.submit_replacements(choices)?;
            }
            RunStatus::AwaitingAck => battle.acknowledge()?,
            RunStatus::Ended(outcome) => {
                info!(?outcome, turns = battle.state().turn, "done");
                break;
            }
        }
    }

    for acquisition in battle.take_acquisitions() {
        println!(
            "{} joins the party{}.",
            acquisition.combatant.name,
            if acquisition.roster_full { " (sent to storage)" } else { "" }
        );
    }
    Ok(())
}
