use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use emotion_probe::analyzer::Analyzer;
use emotion_probe::audio::{load_wav, write_wav, SignalStats, ToneProfile, TARGET_SAMPLE_RATE};
use emotion_probe::config::Config;
use emotion_probe::emotion::{
    builtin_scenarios, compare_correction, AnalysisResult, BiasCorrection, DecisionMode,
    DominanceTrace, EmotionScores, ScoreSummary,
};
use emotion_probe::model::consistency::DEFAULT_ATOL;
use emotion_probe::model::{
    check_consistency, download_file, ensure_model, inspect_head, probe_signal, probe_url,
    ModelError, OnnxEmotionModel,
};

/// Decision rule and diagnostics for a three-class speech emotion model
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (default: ~/.emotion-probe/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// How to treat the bias correction for one invocation
#[derive(clap::Args, Debug)]
struct CorrectionArgs {
    /// Subtract the bias correction before deciding
    #[arg(long, conflicts_with = "raw")]
    correct: bool,

    /// Decide on raw scores even if the config enables correction
    #[arg(long)]
    raw: bool,
}

impl CorrectionArgs {
    fn resolve(&self, config: &Config) -> Option<BiasCorrection> {
        if self.correct {
            Some(config.correction)
        } else if self.raw {
            None
        } else {
            config.active_correction()
        }
    }
}

#[derive(clap::Args, Debug)]
struct ScoreArgs {
    #[arg(long, allow_negative_numbers = true)]
    ang: f32,

    #[arg(long, allow_negative_numbers = true)]
    hap: f32,

    #[arg(long, allow_negative_numbers = true)]
    sad: f32,
}

impl ScoreArgs {
    fn scores(&self) -> EmotionScores {
        EmotionScores::new(self.ang, self.hap, self.sad)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decide a label for three raw scores and show how it was reached
    Decide {
        #[command(flatten)]
        scores: ScoreArgs,

        /// Decision mode: "dominance" or "argmax"
        #[arg(long)]
        mode: Option<DecisionMode>,

        #[command(flatten)]
        correction: CorrectionArgs,
    },

    /// Compare raw and corrected decisions in both modes
    Compare {
        #[arg(long, allow_negative_numbers = true, requires_all = ["hap", "sad"])]
        ang: Option<f32>,

        #[arg(long, allow_negative_numbers = true, requires_all = ["ang", "sad"])]
        hap: Option<f32>,

        #[arg(long, allow_negative_numbers = true, requires_all = ["ang", "hap"])]
        sad: Option<f32>,
    },

    /// Run WAV files through the model and label them
    Analyze {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Path to the exported emotion model (.onnx)
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Decision mode: "dominance" or "argmax"
        #[arg(long)]
        mode: Option<DecisionMode>,

        #[command(flatten)]
        correction: CorrectionArgs,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a synthetic test tone
    Synth {
        /// happy, sad, angry, neutral, noise or sine
        #[arg(short, long)]
        profile: ToneProfile,

        #[arg(short, long)]
        out: PathBuf,

        #[arg(long, default_value = "3.0")]
        seconds: f32,

        #[arg(long, default_value = "16000")]
        sample_rate: u32,

        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Print signal statistics for a WAV file
    Stats {
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Summarise the classification head of a safetensors export
    InspectHead {
        file: PathBuf,

        #[arg(long)]
        weight_key: Option<String>,

        #[arg(long)]
        bias_key: Option<String>,

        /// Number of tensor names to list
        #[arg(long, default_value = "10")]
        keys: usize,

        #[arg(long)]
        json: bool,
    },

    /// Check that two loads of the model give identical outputs
    CheckLoad {
        model: PathBuf,

        /// Second export to compare against (default: load `model` again)
        #[arg(long)]
        other: Option<PathBuf>,

        #[arg(long, default_value = "0")]
        seed: u64,

        #[arg(long, default_value_t = DEFAULT_ATOL)]
        atol: f32,
    },

    /// HEAD a URL and report status and headers
    Probe { url: String },

    /// Download a URL to a file and time the transfer
    Fetch {
        url: String,

        #[arg(short, long)]
        out: PathBuf,
    },

    /// Show the active configuration
    Config {
        /// Write the configuration to disk
        #[arg(long)]
        save: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => Config::default_config_path()?,
    };
    let config = Config::load(&config_path)?;
    debug!("Config loaded from {:?}", config_path);

    match args.command {
        Command::Decide {
            scores,
            mode,
            correction,
        } => run_decide(
            scores.scores(),
            mode.unwrap_or(config.decision_mode),
            correction.resolve(&config),
        ),
        Command::Compare { ang, hap, sad } => {
            let given = match (ang, hap, sad) {
                (Some(a), Some(h), Some(s)) => Some(EmotionScores::new(a, h, s)),
                _ => None,
            };
            run_compare(given, &config.correction);
            Ok(())
        }
        Command::Analyze {
            files,
            model,
            mode,
            correction,
            json,
        } => run_analyze(
            &config,
            &files,
            model,
            mode.unwrap_or(config.decision_mode),
            correction.resolve(&config),
            json,
        ),
        Command::Synth {
            profile,
            out,
            seconds,
            sample_rate,
            seed,
        } => {
            let samples = profile.generate(seconds, sample_rate, seed);
            write_wav(&out, &samples, sample_rate)?;
            println!("Wrote {} ({:.1}s, {} Hz) to {:?}", profile.as_str(), seconds, sample_rate, out);
            Ok(())
        }
        Command::Stats { file, json } => run_stats(&file, json),
        Command::InspectHead {
            file,
            weight_key,
            bias_key,
            keys,
            json,
        } => run_inspect_head(
            &file,
            weight_key.as_deref().unwrap_or(&config.head_weight_key),
            bias_key.as_deref().unwrap_or(&config.head_bias_key),
            keys,
            json,
        ),
        Command::CheckLoad {
            model,
            other,
            seed,
            atol,
        } => run_check_load(&config, model, other, seed, atol),
        Command::Probe { url } => {
            let probe = probe_url(&url)?;
            println!("URL:            {}", probe.url);
            println!("Status:         {}", probe.status);
            println!(
                "Content-Type:   {}",
                probe.content_type.as_deref().unwrap_or("-")
            );
            match probe.content_length {
                Some(len) => println!("Content-Length: {} bytes", len),
                None => println!("Content-Length: -"),
            }
            if !probe.is_success() {
                warn!("URL is not accessible (HTTP {})", probe.status);
            }
            Ok(())
        }
        Command::Fetch { url, out } => {
            let report = download_file(&url, &out)?;
            println!(
                "Downloaded {} bytes to {:?} in {:.2?} ({:.2} MB/s)",
                report.bytes,
                report.path,
                report.elapsed,
                report.throughput_mb_per_sec()
            );
            if let Some(ct) = &report.content_type {
                println!("Content-Type: {}", ct);
            }
            Ok(())
        }
        Command::Config { save } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if save {
                config.save(&config_path)?;
                info!("Config saved to {:?}", config_path);
            }
            Ok(())
        }
    }
}

fn run_decide(raw: EmotionScores, mode: DecisionMode, correction: Option<BiasCorrection>) -> Result<()> {
    let result = AnalysisResult::new("<scores>", raw, correction, mode);
    let decided_on = result.decision_scores();

    println!("Raw:       ang {:.4}  hap {:.4}  sad {:.4}", raw.ang, raw.hap, raw.sad);
    if let Some(c) = &correction {
        println!("Corrected: ang {:.4}  hap {:.4}  sad {:.4}", decided_on.ang, decided_on.hap, decided_on.sad);
        debug!("Correction: ang {} hap {} sad {}", c.ang, c.hap, c.sad);
    }
    if !decided_on.is_finite() {
        warn!("Scores contain non-finite values; the label is still total but may be meaningless");
    }

    print_trace(&decided_on);
    print_ranking(&decided_on);

    println!("Mode:      {}", mode);
    println!("Label:     {}", result.label);
    if !result.agrees_with_argmax() {
        println!("Note:      arg-max would give {}", result.argmax_label());
    }
    Ok(())
}

fn print_trace(scores: &EmotionScores) {
    let trace = DominanceTrace::of(scores);
    println!(
        "Dominance: ang>=sad {}  sad>=hap {}  hap>=ang {}  -> {}",
        trace.ang_ge_sad,
        trace.sad_ge_hap,
        trace.hap_ge_ang,
        trace.label()
    );
}

fn print_ranking(scores: &EmotionScores) {
    let ranked = scores.ranked();
    let line: Vec<String> = ranked
        .iter()
        .map(|(class, score)| format!("{} {:.4}", class, score))
        .collect();
    println!("Ranking:   {}", line.join(" > "));
    println!(
        "Margins:   1st-2nd {:.4}  1st-3rd {:.4}",
        scores.margin(ranked[0].0, ranked[1].0),
        scores.margin(ranked[0].0, ranked[2].0)
    );
}

fn run_compare(given: Option<EmotionScores>, correction: &BiasCorrection) {
    println!(
        "Correction: ang -{:.4}  hap -{:.4}  sad -{:.4}  (largest/smallest {:.2}x)",
        correction.ang,
        correction.hap,
        correction.sad,
        correction.spread_ratio()
    );

    let cases: Vec<(String, EmotionScores)> = match given {
        Some(scores) => vec![("given".to_string(), scores)],
        None => builtin_scenarios()
            .into_iter()
            .map(|s| (s.name.to_string(), s.scores))
            .collect(),
    };

    for (name, raw) in cases {
        println!();
        println!("{}: ang {:.2}  hap {:.2}  sad {:.2}", name, raw.ang, raw.hap, raw.sad);
        for mode in [DecisionMode::Dominance, DecisionMode::ArgMax] {
            let cmp = compare_correction(&raw, correction, mode);
            println!(
                "  {:<9} raw {:<5} corrected {:<5}{}",
                mode.as_str(),
                cmp.raw_label,
                cmp.corrected_label,
                if cmp.changed() { "  (changed)" } else { "" }
            );
        }
    }
}

fn resolve_model(config: &Config, model: Option<PathBuf>) -> Result<PathBuf> {
    let path = match model {
        Some(path) => path,
        None => config.get_model_path()?,
    };

    if path.exists() {
        return Ok(path);
    }

    match &config.model_url {
        Some(url) => Ok(ensure_model(url, &path)?),
        None => bail!(
            "Model file not found: {:?}. Pass --model or set model_url in the config.",
            path
        ),
    }
}

fn run_analyze(
    config: &Config,
    files: &[PathBuf],
    model: Option<PathBuf>,
    mode: DecisionMode,
    correction: Option<BiasCorrection>,
    json: bool,
) -> Result<()> {
    // Without the backend there is nothing to run; don't download a model first
    if !OnnxEmotionModel::is_available() {
        return Err(ModelError::FeatureNotEnabled).context("Cannot analyze files");
    }

    let model_path = resolve_model(config, model)?;
    info!("Model: {:?}", model_path);

    let model = OnnxEmotionModel::new(config.onnx_config(model_path))
        .context("Failed to load emotion model")?;
    let mut analyzer = Analyzer::new(model, mode).with_correction(correction);

    info!(
        "Mode: {}, correction: {}",
        analyzer.mode(),
        if analyzer.correction().is_some() { "on" } else { "off" }
    );

    let outcome = analyzer.analyze_batch(files.iter().map(PathBuf::as_path));
    let results = &outcome.results;

    if json {
        let failures: Vec<serde_json::Value> = outcome
            .failures
            .iter()
            .map(|(path, e)| serde_json::json!({ "file": path, "error": e.to_string() }))
            .collect();
        let report = serde_json::json!({ "results": results, "failures": failures });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_results(results);
        for (path, e) in &outcome.failures {
            eprintln!("Failed: {:?}: {}", path, e);
        }
    }

    if !outcome.is_complete() {
        bail!("{} of {} files failed", outcome.failures.len(), files.len());
    }
    Ok(())
}

fn print_results(results: &[AnalysisResult]) {
    for result in results {
        let s = result.decision_scores();
        println!();
        println!("{}", result.file);
        println!(
            "  raw        ang {:.4}  hap {:.4}  sad {:.4}",
            result.raw.ang, result.raw.hap, result.raw.sad
        );
        if result.correction.is_some() {
            println!("  corrected  ang {:.4}  hap {:.4}  sad {:.4}", s.ang, s.hap, s.sad);
        }
        let ranked = s.ranked();
        println!(
            "  label {} (top {} by {:.4}){}",
            result.label,
            ranked[0].0,
            s.margin(ranked[0].0, ranked[1].0),
            if result.agrees_with_argmax() { "" } else { "  [differs from arg-max]" }
        );
    }

    if let Some(summary) = ScoreSummary::from_results(results) {
        println!();
        println!(
            "{} files, mean ang {:.4}  hap {:.4}  sad {:.4}, leading {}",
            summary.count,
            summary.mean.ang,
            summary.mean.hap,
            summary.mean.sad,
            summary.leading.display_name()
        );
    }
}

fn run_stats(file: &Path, json: bool) -> Result<()> {
    let audio = load_wav(file)?;
    let stats = SignalStats::compute(&audio.samples, audio.sample_rate());

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{:?}", file);
    println!(
        "  source     {} Hz, {} channel(s)",
        audio.source_sample_rate, audio.source_channels
    );
    println!("  duration   {:.2}s at {} Hz", stats.duration_secs, TARGET_SAMPLE_RATE);
    println!("  mean |x|   {:.6}", stats.mean_abs);
    println!("  peak       {:.6}", stats.peak);
    println!("  rms        {:.6}", stats.rms);
    match stats.mean_pitch_hz {
        Some(hz) => println!("  pitch      {:.1} Hz ({:.0}% voiced)", hz, stats.voiced_ratio * 100.0),
        None => println!("  pitch      -"),
    }
    Ok(())
}

fn run_inspect_head(file: &Path, weight_key: &str, bias_key: &str, keys: usize, json: bool) -> Result<()> {
    let report = inspect_head(file, weight_key, bias_key)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{:?} ({:.2} MB, {} tensors)", report.path, report.file_size_mb(), report.tensors.len());
    for t in report.tensors.iter().take(keys) {
        println!("  {:<48} {:<5} {:?}", t.name, t.dtype, t.shape);
    }
    if report.tensors.len() > keys {
        println!("  ... {} more", report.tensors.len() - keys);
    }

    println!();
    println!("{} {:?}", weight_key, report.weight_shape);
    println!(
        "  overall  mean {:.6}  std {:.6}  min {:.6}  max {:.6}",
        report.overall.mean, report.overall.std, report.overall.min, report.overall.max
    );
    for c in &report.classes {
        println!(
            "  {:<9} mean {:.6}  std {:.6}  norm {:.4}",
            c.class.display_name(),
            c.stats.mean,
            c.stats.std,
            c.norm
        );
    }

    println!();
    println!(
        "{}  ang {:.6}  hap {:.6}  sad {:.6}",
        bias_key, report.bias.ang, report.bias.hap, report.bias.sad
    );
    println!("  bias favours {}", report.bias_leader.display_name());
    Ok(())
}

fn run_check_load(config: &Config, model: PathBuf, other: Option<PathBuf>, seed: u64, atol: f32) -> Result<()> {
    let other = other.unwrap_or_else(|| model.clone());
    info!("Comparing {:?} against {:?}", model, other);

    let mut first = OnnxEmotionModel::new(config.onnx_config(model)).context("Failed to load first model")?;
    let mut second = OnnxEmotionModel::new(config.onnx_config(other)).context("Failed to load second model")?;

    let input = probe_signal(seed);
    let cmp = check_consistency(&mut first, &mut second, &input, atol)?;

    println!("first   ang {:.8}  hap {:.8}  sad {:.8}", cmp.a.ang, cmp.a.hap, cmp.a.sad);
    println!("second  ang {:.8}  hap {:.8}  sad {:.8}", cmp.b.ang, cmp.b.hap, cmp.b.sad);
    println!("max abs diff {:.10} (atol {})", cmp.max_abs_diff, cmp.atol);

    if !cmp.all_close() {
        bail!("Outputs differ beyond tolerance");
    }
    println!("Outputs match");
    Ok(())
}
