use anyhow::Context;
use cellsweeper_core as game;
use clap::{Parser, ValueEnum};
use std::io::BufRead;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

mod input;
mod render;

#[derive(Copy, Clone, Debug, PartialEq, ValueEnum)]
enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    fn board_config(self) -> game::BoardConfig {
        match self {
            Self::Beginner => game::BoardConfig::BEGINNER,
            Self::Intermediate => game::BoardConfig::INTERMEDIATE,
            Self::Advanced => game::BoardConfig::ADVANCED,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Minesweeper where every cell is its own actor", long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Preset board size and mine count
    #[arg(short, long, value_enum, default_value_t = Difficulty::Intermediate)]
    difficulty: Difficulty,

    /// Override the preset row count
    #[arg(long)]
    rows: Option<game::Coord>,

    /// Override the preset column count
    #[arg(long)]
    cols: Option<game::Coord>,

    /// Override the preset mine count
    #[arg(long)]
    mines: Option<game::CellCount>,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// Clock tick interval in milliseconds
    #[arg(long, default_value_t = 200)]
    tick_ms: u64,

    /// How snapshots are printed
    #[arg(short, long, value_enum, default_value_t = render::Format::Text)]
    format: render::Format,
}

impl Args {
    fn board_config(&self) -> game::Result<game::BoardConfig> {
        let preset = self.difficulty.board_config();
        game::BoardConfig::new(
            (
                self.rows.unwrap_or(preset.rows()),
                self.cols.unwrap_or(preset.cols()),
            ),
            self.mines.unwrap_or(preset.mines),
        )
    }
}

fn init_logging(verbose: &clap_verbosity_flag::Verbosity) {
    let level = verbose.log_level_filter().to_string().to_lowercase();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    // logs go to stderr so they never interleave with the board on stdout
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.verbose);

    let config = args.board_config().context("invalid board configuration")?;
    let seed = args.seed.unwrap_or_else(clock_seed);
    log::debug!("seed: {}", seed);

    let options = game::GameOptions {
        tick_interval: Some(Duration::from_millis(args.tick_ms.max(1))),
    };
    let session = game::Game::launch(config, game::RandomLayoutGenerator::new(seed), options)
        .context("could not start the board")?;

    let presenter = render::Presenter::spawn(
        session.publisher(),
        args.format,
        render::POLL_INTERVAL,
    )?;

    println!("{}", input::HELP);
    for line in std::io::stdin().lock().lines() {
        let line = line.context("could not read input")?;
        match input::parse(&line, session.config()) {
            Ok(input::Command::Press { coords, side }) => session.press_tile(coords, side),
            Ok(input::Command::Restart) => session.press_face(),
            Ok(input::Command::Quit) => break,
            Ok(input::Command::Help) => println!("{}", input::HELP),
            Ok(input::Command::Nothing) => {}
            Err(err) => eprintln!("{}", err),
        }
    }

    session.shutdown();
    presenter.stop();
    Ok(())
}
