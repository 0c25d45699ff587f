use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use seasonal_core::season::{hair_palette, recommended_hair_colors};
use seasonal_core::{
    AnalysisOutcome, EditGateway, GenerationMode, PipelineConfig, PrecomputedLandmarks, Rgb, Season, SessionState,
};
use seasonal_gateway::{GeminiClient, ProxyClient};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "seasonal", about = "Personal color diagnosis and hair color simulation")]
struct Cli {
    /// Pipeline config file (TOML)
    #[arg(short, long, global = true, env = "SEASONAL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Portrait and its precomputed face-mesh landmarks.
#[derive(clap::Args)]
struct PortraitArgs {
    /// Portrait image (PNG or JPEG)
    #[arg(short, long)]
    image: PathBuf,
    /// Face-mesh landmarks as JSON (one face or an array of faces)
    #[arg(short, long)]
    landmarks: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    /// Mask + compositor only
    Local,
    /// Through a seasonald proxy
    Proxy,
    /// Directly against the Gemini API
    Gemini,
}

#[derive(Subcommand)]
enum Commands {
    /// Diagnose the personal color season of a portrait
    Diagnose {
        #[command(flatten)]
        portrait: PortraitArgs,
    },
    /// Render the recommended hair colors for the diagnosed season
    Simulate {
        #[command(flatten)]
        portrait: PortraitArgs,
        /// Directory for the rendered images
        #[arg(short, long, default_value = "seasonal-out")]
        out_dir: PathBuf,
        #[arg(long, value_enum, default_value = "local")]
        backend: Backend,
        /// Proxy base URL (proxy backend)
        #[arg(long, env = "SEASONAL_PROXY_URL", default_value = "http://127.0.0.1:8787")]
        proxy_url: String,
        /// Access password (proxy backend; empty renders locally)
        #[arg(long, env = "SEASONAL_ACCESS_PASSWORD", default_value = "", hide_env_values = true)]
        password: String,
        /// API key (gemini backend)
        #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        /// Remote call timeout in seconds
        #[arg(long, default_value_t = 90)]
        timeout_secs: u64,
        /// Recolor with this #RRGGBB color instead of the season's recommendations
        #[arg(long)]
        color: Option<String>,
    },
    /// Write the estimated hair mask as a grayscale PNG
    Mask {
        #[command(flatten)]
        portrait: PortraitArgs,
        #[arg(short, long, default_value = "mask.png")]
        out: PathBuf,
        /// Write white RGBA with the mask as alpha instead of grayscale
        #[arg(long)]
        rgba: bool,
    },
    /// Show a season's palette and hair recommendations
    Palette {
        /// spring, summer, autumn or winter (all seasons if omitted)
        season: Option<Season>,
    },
    /// Check an access password against a proxy
    Verify {
        #[arg(long, env = "SEASONAL_PROXY_URL", default_value = "http://127.0.0.1:8787")]
        proxy_url: String,
        #[arg(long, env = "SEASONAL_ACCESS_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Diagnose { portrait } => {
            let session = analyze(&portrait, config)?;
            let diagnosis = session.diagnosis().context("no diagnosis")?;
            let report = serde_json::json!({
                "season": diagnosis.season,
                "name": diagnosis.info.name,
                "scores": diagnosis.scores,
                "analysis": diagnosis.analysis,
                "sample": session.sample(),
                "info": diagnosis.info,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Simulate { portrait, out_dir, backend, proxy_url, password, api_key, timeout_secs, color } => {
            let mut session = analyze(&portrait, config)?;
            std::fs::create_dir_all(&out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

            if let Some(hex) = color {
                let color = Rgb::from_hex(&hex)?;
                session.recolor(color)?;
            } else {
                let timeout = Duration::from_secs(timeout_secs);
                let gateway = remote_gateway(backend, proxy_url, &password, api_key, timeout)?;
                let mode = match &gateway {
                    None => GenerationMode::Local,
                    Some(g) => GenerationMode::Remote { gateway: g.as_ref(), credential: &password },
                };
                session.generate_batch(mode)?;
            }

            let mut written = Vec::new();
            for (i, result) in session.history().iter().enumerate() {
                let path = out_dir.join(format!("{:02}-{}.png", i + 1, slug(&result.color_label)));
                result
                    .image
                    .to_rgba()?
                    .save(&path)
                    .with_context(|| format!("writing {}", path.display()))?;
                written.push(serde_json::json!({
                    "id": result.id,
                    "name": result.color_name,
                    "label": result.color_label,
                    "hex": result.hex,
                    "provenance": result.provenance,
                    "error": result.error,
                    "createdAt": result.created_at,
                    "path": path,
                }));
            }
            println!("{}", serde_json::to_string_pretty(&written)?);
        }
        Commands::Mask { portrait, out, rgba } => {
            let session = analyze(&portrait, config)?;
            let mask = session.hair_mask()?;
            let saved = if rgba { mask.to_rgba_image().save(&out) } else { mask.to_luma_image().save(&out) };
            saved.with_context(|| format!("writing {}", out.display()))?;
            let (w, h) = mask.dimensions();
            println!(
                "{}",
                serde_json::json!({
                    "path": out,
                    "width": w,
                    "height": h,
                    "coveredPixels": mask.coverage(),
                })
            );
        }
        Commands::Palette { season } => {
            let seasons = match season {
                Some(s) => vec![s],
                None => Season::ALL.to_vec(),
            };
            let palettes: Vec<_> = seasons
                .into_iter()
                .map(|s| {
                    serde_json::json!({
                        "season": s,
                        "info": s.info(),
                        "hairPalette": hair_palette(s),
                        "recommendedHairColors": recommended_hair_colors(s),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&palettes)?);
        }
        Commands::Verify { proxy_url, password } => {
            let response = ProxyClient::new(proxy_url).verify_password(&password)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

/// Remote backend for a batch, or `None` to render locally. The proxy
/// refuses an empty password, so without one the batch stays local.
fn remote_gateway(
    backend: Backend,
    proxy_url: String,
    password: &str,
    api_key: Option<String>,
    timeout: Duration,
) -> Result<Option<Box<dyn EditGateway>>> {
    match backend {
        Backend::Local => Ok(None),
        Backend::Proxy if password.is_empty() => {
            tracing::warn!("no access password given; rendering locally");
            Ok(None)
        }
        Backend::Proxy => Ok(Some(Box::new(ProxyClient::new(proxy_url).with_timeout(timeout)))),
        Backend::Gemini => {
            let key = api_key.context("gemini backend needs --api-key or GOOGLE_API_KEY")?;
            Ok(Some(Box::new(GeminiClient::new(key).with_timeout(timeout))))
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            let config = PipelineConfig::from_toml_file(path)?;
            tracing::info!(path = %path.display(), strategy = ?config.mask.strategy, "config loaded");
            Ok(config)
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn analyze(args: &PortraitArgs, config: PipelineConfig) -> Result<SessionState> {
    let image = image::open(&args.image)
        .with_context(|| format!("opening {}", args.image.display()))?
        .to_rgba8();
    let mut detector = PrecomputedLandmarks::load(&args.landmarks)?;

    let mut session = SessionState::new(config);
    match session.analyze(image, &mut detector)? {
        AnalysisOutcome::Diagnosed(_) => Ok(session),
        AnalysisOutcome::FaceNotFound => bail!("no face found in {}", args.landmarks.display()),
    }
}

/// File-name-safe form of a color label.
fn slug(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}
