use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use galaxy_gen::{controls, Color, GalaxyParameters};
use std::io;
use std::path::PathBuf;

/// Procedural spiral galaxy point cloud
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
  /// Number of points
  #[arg(long, default_value_t = 100_000)]
  count: u32,
  /// Point size
  #[arg(long, default_value_t = 0.01)]
  size: f32,
  /// Radius of the outermost points
  #[arg(short, long, default_value_t = 5.0)]
  radius: f32,
  /// Number of spiral arms
  #[arg(short, long, default_value_t = 3)]
  branches: u32,
  /// Twist in radians per unit of radius
  #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
  spin: f32,
  /// Maximum jitter on each axis
  #[arg(long, default_value_t = 0.2)]
  randomness: f32,
  /// Jitter exponent, higher keeps points tighter to the arms
  #[arg(long, default_value_t = 3.0)]
  randomness_power: f32,
  /// Colour at the core, as hex
  #[arg(long, default_value = "#ff6030")]
  inside_color: Color,
  /// Colour at the rim, as hex
  #[arg(long, default_value = "#1b3984")]
  outside_color: Color,
  /// Seed for reproducible galaxies
  #[arg(long)]
  seed: Option<u64>,
  /// Run in headless mode (no window)
  #[arg(long, default_value_t = false)]
  headless: bool,
  /// Write the generated points to this PLY file (headless only)
  #[arg(short, long, requires = "headless")]
  output: Option<PathBuf>,
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Generate shell completion scripts
  Completions {
    /// The shell to generate the script for
    #[arg(value_enum)]
    shell: Shell,
  },
}

impl Args {
  fn parameters(&self) -> GalaxyParameters {
    let mut params = GalaxyParameters {
      count: self.count,
      size: self.size,
      radius: self.radius,
      branches: self.branches,
      spin: self.spin,
      randomness: self.randomness,
      randomness_power: self.randomness_power,
      inside_color: self.inside_color,
      outside_color: self.outside_color,
    };
    for control in controls::clamp_parameters(&mut params) {
      log::warn!(
        "{} out of range, using {}",
        control.label(),
        control.display_value(&params)
      );
    }
    params
  }
}

fn main() -> Result<()> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
  let args = Args::parse();

  if let Some(Commands::Completions { shell }) = args.command {
    let mut cmd = Args::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    return Ok(());
  }

  let params = args.parameters();
  log::info!("{params:?}");
  if args.headless {
    galaxy_gen::state::run_headless(params, args.seed, args.output.as_deref())
  } else {
    galaxy_gen::state::run(params, args.seed)
  }
}
