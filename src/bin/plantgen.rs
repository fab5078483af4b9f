//! Command-line front end: print derivations and grow preset plants.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use symbios_flora::presets;
use symbios_flora::seed::instance_rng;
use symbios_flora::{FloraError, GrowthConfig, PlantGenerator};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "plantgen")]
#[command(about = "Grow L-System plants and inspect their derivations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Algae,
    FractalPlant,
    LeafyTree,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the word after each derivation step
    Derive {
        #[arg(short, long, value_enum, default_value = "algae")]
        preset: Preset,

        /// Number of derivation steps
        #[arg(short = 'n', long, default_value = "5")]
        steps: usize,

        #[arg(short, long, default_value = "0")]
        seed: u64,
    },

    /// Grow plant instances and report their geometry
    Grow {
        #[arg(short, long, value_enum, default_value = "leafy-tree")]
        preset: Preset,

        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Number of instances, each on its own random stream
        #[arg(short, long, default_value = "1")]
        instances: u64,

        /// RON file overriding the preset's growth settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the generated meshes as JSON
        #[arg(short, long)]
        json: Option<PathBuf>,
    },
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = fmt::layer().with_target(true).with_level(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}

fn generator_for(preset: Preset, growth: Option<GrowthConfig>) -> Option<PlantGenerator> {
    match preset {
        Preset::Algae => None,
        Preset::FractalPlant => Some(presets::fractal_plant_generator(
            growth.unwrap_or_else(presets::fractal_plant_growth),
        )),
        Preset::LeafyTree => Some(presets::leafy_tree_generator(
            growth.unwrap_or_else(presets::leafy_tree_growth),
        )),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Derive {
            preset,
            steps,
            seed,
        } => {
            let mut lsystem = match preset {
                Preset::Algae => presets::algae(),
                Preset::FractalPlant => presets::fractal_plant(),
                Preset::LeafyTree => presets::leafy_tree(),
            };
            let mut rng = instance_rng(seed, 0);
            println!("0: {}", lsystem.render());
            for step in 1..=steps {
                println!("{step}: {}", lsystem.perform_derivation_step(&mut rng)?);
            }
        }
        Commands::Grow {
            preset,
            seed,
            instances,
            config,
            json,
        } => {
            let growth = match config {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)?;
                    tracing::info!(path = %path.display(), "loading growth config");
                    Some(GrowthConfig::from_ron_str(&text)?)
                }
                None => None,
            };
            let Some(generator) = generator_for(preset, growth) else {
                tracing::error!("preset has no turtle interpretation; use `derive`");
                return Ok(());
            };

            let mut plants = Vec::new();
            for instance in 0..instances {
                let mut rng = instance_rng(seed, instance);
                match generator.generate(&mut rng) {
                    Ok(plant) => {
                        let fp = plant.footprint(generator.config().interpreter.default_step);
                        println!(
                            "instance {instance}: {} generations, {} symbols, {} tube triangles, {} sub-meshes, height {:.2}, base radius {:.2}, canopy radius {:.2}",
                            plant.generations,
                            plant.symbol_count,
                            plant.tube.triangle_count(),
                            plant.sub_meshes.len(),
                            fp.height,
                            fp.base_radius,
                            fp.canopy_radius,
                        );
                        plants.push(plant);
                    }
                    Err(err) => report(instance, &err),
                }
            }

            if let Some(path) = json {
                std::fs::write(&path, serde_json::to_string(&plants)?)?;
                tracing::info!(path = %path.display(), plants = plants.len(), "meshes written");
            }
        }
    }

    Ok(())
}

/// A failed instance is skipped; the rest of the batch still grows.
fn report(instance: u64, err: &FloraError) {
    tracing::warn!(instance, error = %err, "instance skipped");
}
