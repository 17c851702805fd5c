use clap::{Parser, Subcommand, ValueEnum};
use log::error;
use msaprep::errors::PipelineResult;
use msaprep::pipeline;
use msaprep::{ColabfoldSearch, MsaPipeline, SearchConfig, TaxonomyMode};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "msaprep")]
#[command(about = "Prepare taxonomy-annotated MSA inputs for structure prediction")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the sequence databases and build the enriched descriptor
    Run {
        /// Input descriptor JSON path ("-" reads from stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for raw and per-chain alignment output
        #[arg(short, long)]
        msa_dir: PathBuf,

        /// Directory for the enriched descriptor
        #[arg(short, long)]
        json_dir: PathBuf,

        /// Search tool configuration file (YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Whether to attach NCBI taxonomy identifiers to UniRef hits
        #[arg(short, long, default_value = "auto")]
        taxonomy: TaxonomyChoice,
    },
    /// Re-run annotation over existing search results without searching
    Annotate {
        /// Input descriptor JSON path ("-" reads from stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Directory holding existing search results
        #[arg(short, long)]
        msa_dir: PathBuf,

        /// Directory for the enriched descriptor
        #[arg(short, long)]
        json_dir: PathBuf,

        /// Whether to attach NCBI taxonomy identifiers to UniRef hits
        #[arg(short, long, default_value = "auto")]
        taxonomy: TaxonomyChoice,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum TaxonomyChoice {
    /// Attach for multimers, skip for monomers
    Auto,
    /// Always attach
    On,
    /// Never attach
    Off,
}

impl From<TaxonomyChoice> for TaxonomyMode {
    fn from(choice: TaxonomyChoice) -> Self {
        match choice {
            TaxonomyChoice::Auto => TaxonomyMode::Auto,
            TaxonomyChoice::On => TaxonomyMode::On,
            TaxonomyChoice::Off => TaxonomyMode::Off,
        }
    }
}

fn run(cli: Cli) -> PipelineResult<()> {
    match cli.command {
        Commands::Run { input, msa_dir, json_dir, config, taxonomy } => {
            let config = SearchConfig::from_yaml_path(&config)?;
            let pipeline = MsaPipeline::new(ColabfoldSearch::new(config), taxonomy.into());
            let out_path = pipeline.run(&input, &msa_dir, &json_dir)?;
            println!("Wrote enriched descriptor: {}", out_path.display());
        }
        Commands::Annotate { input, msa_dir, json_dir, taxonomy } => {
            let out_path = pipeline::annotate(&input, &msa_dir, &json_dir, taxonomy.into())?;
            println!("Wrote enriched descriptor: {}", out_path.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
