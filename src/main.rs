//! Dragon Dice companion engine - Main Binary
//!
//! Thin CLI over the rules engine: catalog validation and a scripted
//! demonstration turn. The real decision layer is the companion
//! application; this binary is for development and data work.

use clap::{Parser, Subcommand};
use dragon_dice_rs::{
    core::{ArmyLocation, TerrainTypeId, UnitTypeId},
    game::{GameState, PhaseSignal, TurnSequencer, VerbosityLevel},
    loader::{AsyncReferenceData, ReferenceData},
    zones::Zone,
    Result,
};
use std::path::PathBuf;

/// Verbosity level for engine output (names or numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

#[derive(Parser)]
#[command(name = "ddice")]
#[command(about = "Dragon Dice companion rules engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate the reference-data catalogs
    Validate {
        /// Directory containing units.json, terrains.json, dragons.json,
        /// and spells.json
        #[arg(value_name = "DATA_DIR")]
        data_dir: PathBuf,
    },

    /// Walk a decision-free demonstration turn and print the events
    Demo {
        /// Verbosity level
        #[arg(long, short = 'v', default_value = "normal")]
        verbosity: VerbosityArg,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { data_dir } => validate(data_dir).await?,
        Commands::Demo { verbosity } => demo(verbosity.0)?,
    }
    Ok(())
}

async fn validate(data_dir: PathBuf) -> Result<()> {
    let db = AsyncReferenceData::new(data_dir);
    let elapsed = db.eager_load().await?;
    let data = db.snapshot().await;

    println!(
        "Loaded {} unit types, {} terrains, {} dragons, {} spells in {:.1?}",
        data.unit_count(),
        data.terrain_count(),
        data.dragon_count(),
        data.spell_count(),
        elapsed
    );
    Ok(())
}

const DEMO_UNITS: &str = r#"[
    {
        "type_id": "dwarves_footman",
        "name": "Footman",
        "species": "Dwarves",
        "health": 1,
        "faces": ["ID", "Melee", "Melee", "Save", "Maneuver", "Missile"],
        "elements": ["Earth", "Fire"]
    },
    {
        "type_id": "dwarves_sergeant",
        "name": "Sergeant",
        "species": "Dwarves",
        "health": 2,
        "faces": ["ID", "Melee:2", "Melee", "Save", "Save", "Maneuver"],
        "elements": ["Earth", "Fire"]
    }
]"#;

const DEMO_TERRAINS: &str = r#"[
    {
        "type_id": "highland_city",
        "name": "Highland City",
        "elements": ["Fire", "Earth"],
        "face_icons": ["Maneuver", "Magic", "Melee", "Missile", "Magic", "Melee", "Missile"],
        "eighth_face": "City"
    }
]"#;

fn demo(verbosity: VerbosityLevel) -> Result<()> {
    let mut refdata = ReferenceData::empty();
    refdata.load_units(DEMO_UNITS)?;
    refdata.load_terrains(DEMO_TERRAINS)?;

    let mut game = GameState::new(&["Alice", "Bob"]);
    game.logger.set_verbosity(verbosity);
    let alice = game.players[0].id;
    let bob = game.players[1].id;

    let terrain = refdata.create_terrain(&mut game, &TerrainTypeId::new("highland_city"), 3)?;
    let home = game.zones.create_army("Home Army", alice, ArmyLocation::Terrain(terrain));
    let horde = game.zones.create_army("Horde", bob, ArmyLocation::Terrain(terrain));
    let footman = UnitTypeId::new("dwarves_footman");
    let sergeant = UnitTypeId::new("dwarves_sergeant");
    for i in 0..3 {
        refdata.create_unit(&mut game, &footman, alice, format!("Footman #{}", i + 1), Zone::Army(home))?;
        refdata.create_unit(&mut game, &sergeant, bob, format!("Sergeant #{}", i + 1), Zone::Army(horde))?;
    }

    let mut seq = TurnSequencer::new(&mut game, &refdata);
    for signal in [
        PhaseSignal::PhaseComplete,
        PhaseSignal::PhaseComplete,
        PhaseSignal::PhaseComplete,
        PhaseSignal::SkipManeuver,
        PhaseSignal::SkipAction,
        PhaseSignal::SkipManeuver,
        PhaseSignal::SkipAction,
        PhaseSignal::Reinforce(Vec::new()),
        PhaseSignal::Retreat(Vec::new()),
    ] {
        seq.submit(signal)?;
    }

    println!("--- events ---");
    for event in game.events.drain() {
        println!("{event:?}");
    }
    println!("turn is now: player {} (turn {})", game.turn.active_player, game.turn.turn_number);
    Ok(())
}
