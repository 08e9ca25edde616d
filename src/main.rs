use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use rentnotice::{FontProvider, NoiseMode, NoticeConfig, NoticeRenderer, NoticeRequest, Organization};

#[derive(Parser)]
#[command(name = "rentnotice", version, about = "Render rent reminder notices as print-ready PNGs")]
struct Cli {
    /// Letterhead to print
    #[arg(long, value_enum, global = true, default_value_t = Profile::Brandon)]
    profile: Profile,

    /// Fix reference codes and paper texture
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[arg(long, value_enum, global = true, default_value_t = Noise::CoinFlip)]
    noise: Noise,

    /// Always draw the placeholder instead of the logo
    #[arg(long, global = true)]
    no_logo: bool,

    /// Directory the logo is cached in
    #[arg(long, global = true)]
    logo_dir: Option<PathBuf>,

    /// Try these TrueType fonts, in order, before the defaults
    #[arg(long, global = true)]
    font: Vec<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Render one notice to a PNG file
    Render {
        #[arg(long, default_value = "Resident")]
        name: String,
        #[arg(long, default_value = "")]
        unit: String,
        #[arg(long, default_value = "")]
        amount: String,
        /// Defaults to the profile's usual due date
        #[arg(long)]
        due_date: Option<String>,
        #[arg(short, long, default_value = rentnotice::notice::STANDALONE_FILE_NAME)]
        output: PathBuf,
    },
    /// Serve the notice form over HTTP
    #[cfg(feature = "server")]
    Serve {
        #[arg(long, default_value = "0.0.0.0:5000")]
        addr: String,
        /// Worker threads; one per CPU by default
        #[arg(long)]
        workers: Option<usize>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Profile {
    Brandon,
    Ywca,
}

#[derive(Clone, Copy, ValueEnum)]
enum Noise {
    Never,
    Always,
    CoinFlip,
}

impl From<Noise> for NoiseMode {
    fn from(n: Noise) -> Self {
        match n {
            Noise::Never => NoiseMode::Never,
            Noise::Always => NoiseMode::Always,
            Noise::CoinFlip => NoiseMode::CoinFlip,
        }
    }
}

fn build_config(cli: &Cli) -> NoticeConfig {
    let mut config = NoticeConfig {
        organization: match cli.profile {
            Profile::Brandon => Organization::brandon(),
            Profile::Ywca => Organization::ywca(),
        },
        noise: cli.noise.into(),
        seed: cli.seed,
        ..Default::default()
    };
    config.logo.enabled = !cli.no_logo;
    if let Some(dir) = &cli.logo_dir {
        config.logo.directory = dir.clone();
    }
    if !cli.font.is_empty() {
        let mut candidates = cli.font.clone();
        candidates.extend(config.fonts.candidates().iter().cloned());
        config.fonts = FontProvider::new(candidates);
    }
    config
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let renderer = NoticeRenderer::new(build_config(&cli));

    match cli.command {
        None => {
            let request = NoticeRequest::for_organization(&renderer.config().organization);
            let notice = renderer.render(&request);
            notice
                .save(rentnotice::notice::STANDALONE_FILE_NAME)
                .context("failed to save notice")?;
            log::info!("Rent reminder notice saved as {}", rentnotice::notice::STANDALONE_FILE_NAME);
        }
        Some(Command::Render {
            name,
            unit,
            amount,
            due_date,
            output,
        }) => {
            let org = &renderer.config().organization;
            let request = NoticeRequest::new(name)
                .with_unit(unit)
                .with_amount(amount)
                .with_due_date(due_date.unwrap_or_else(|| org.default_due_date.clone()));
            let notice = renderer.render(&request);
            notice
                .save(&output)
                .with_context(|| format!("failed to save notice to {}", output.display()))?;
            log::info!("Rent reminder notice saved as {}", output.display());
        }
        #[cfg(feature = "server")]
        Some(Command::Serve { addr, workers }) => {
            let workers = workers.unwrap_or_else(num_cpus::get);
            let server = rentnotice::server::NoticeServer::bind(&addr, std::sync::Arc::new(renderer))
                .with_context(|| format!("failed to start server on {}", addr))?;
            server.run(workers)?;
        }
    }
    Ok(())
}
