mod cli;

use mediaconv::{
    config,
    conversion::{Converter, Pass},
    read_request,
};
use mediaconv_av::{check_tools, FfmpegEngine};
use mediaconv_codecs::Registry;
use mediaconv_common::StreamKind;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediaconv=trace,mediaconv_av=trace,mediaconv_codecs=debug,mediaconv_common=debug"
                .to_string()
        } else {
            "mediaconv=info,mediaconv_av=info,mediaconv_codecs=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compile {
            request,
            pass,
            json,
        } => compile(&request, pass, json),
        Commands::Convert {
            input,
            output,
            request,
            two_pass,
            timeout,
        } => convert(
            &input,
            &output,
            &request,
            two_pass,
            timeout,
            cli.config.as_deref(),
        ),
        Commands::Segment {
            input,
            workdir,
            playlist,
            output_dir,
        } => segment(&input, &workdir, &playlist, &output_dir, cli.config.as_deref()),
        Commands::Probe {
            file,
            json,
            no_posters_as_video,
        } => probe_file(&file, json, !no_posters_as_video, cli.config.as_deref()),
        Commands::Thumbnail {
            file,
            time,
            output,
            size,
            quality,
        } => {
            let converter = converter(cli.config.as_deref(), None)?;
            converter.thumbnail(&file, time, &output, size, quality)?;
            println!("Thumbnail written to {}", output.display());
            Ok(())
        }
        Commands::Codecs => list_codecs(),
        Commands::CheckTools => check_tools_cmd(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("mediaconv {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Build a converter from the loaded config, optionally overriding the timeout.
fn converter(config_path: Option<&Path>, timeout: Option<u64>) -> Result<Converter> {
    let config = config::load_config_or_default(config_path)?;
    let engine = FfmpegEngine::discover(
        config.tools.ffmpeg_path.as_deref(),
        config.tools.ffprobe_path.as_deref(),
    )?;

    let mut settings = config.conversion.settings();
    if let Some(secs) = timeout {
        settings.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }

    Ok(Converter::new(Arc::new(engine)).with_settings(settings))
}

fn compile(request: &str, pass: Option<u8>, json: bool) -> Result<()> {
    let request = read_request(request)?;
    let pass = match pass {
        Some(1) => Some(Pass::First),
        Some(_) => Some(Pass::Second),
        None => None,
    };

    let flags = mediaconv::conversion::compile_request(&Registry::builtin(), &request, pass)?;
    if json {
        println!("{}", serde_json::to_string(&flags)?);
    } else {
        println!("{}", flags.join(" "));
    }
    Ok(())
}

fn convert(
    input: &Path,
    output: &Path,
    request: &str,
    two_pass: bool,
    timeout: Option<u64>,
    config_path: Option<&Path>,
) -> Result<()> {
    let request = read_request(request)?;
    let converter = converter(config_path, timeout)?;

    tracing::info!("Converting {:?} to {:?}", input, output);
    for progress in converter.convert(input, output, &request, two_pass)? {
        let progress = progress?;
        eprint!("\rProgress: {:5.1}%", progress * 100.0);
        std::io::stderr().flush().ok();
    }
    eprintln!();

    println!("Output: {}", output.display());
    Ok(())
}

fn segment(
    input: &Path,
    workdir: &Path,
    playlist: &str,
    output_dir: &str,
    config_path: Option<&Path>,
) -> Result<()> {
    let converter = converter(config_path, None)?;

    for percent in converter.segment(input, workdir, playlist, output_dir)? {
        let percent = percent?;
        eprint!("\rProgress: {:3}%", percent);
        std::io::stderr().flush().ok();
    }
    eprintln!();

    println!("Playlist: {}", workdir.join(playlist).display());
    Ok(())
}

fn probe_file(file: &Path, json: bool, posters_as_video: bool, config_path: Option<&Path>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let converter = converter(config_path, None)?;
    let info = converter
        .probe_with_posters(file, posters_as_video)
        .with_context(|| format!("Can't get information about {:?}", file))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    println!("Container: {}", info.format.format_name);
    if let Some(duration) = info.duration() {
        let secs = duration as u64;
        println!(
            "Duration: {:02}:{:02}:{:02}",
            secs / 3600,
            (secs / 60) % 60,
            secs % 60
        );
    }
    if let Some(bitrate) = info.format.bitrate {
        println!("Bitrate: {} kb/s", bitrate / 1000);
    }

    println!("\nStreams: {}", info.streams.len());
    for stream in &info.streams {
        print!("  [{}] {} {}", stream.index, stream.kind, stream.codec);
        if let (Some(width), Some(height)) = (stream.width, stream.height) {
            print!(" {}x{}", width, height);
        }
        if let Some(fps) = stream.fps {
            print!(" {:.3} fps", fps);
        }
        if let Some(channels) = stream.channels {
            print!(" {}ch", channels);
        }
        if let Some(rate) = stream.sample_rate {
            print!(" {} Hz", rate);
        }
        if let Some(lang) = stream.metadata.get("language") {
            print!(" ({})", lang);
        }
        println!();
    }

    if !info.posters.is_empty() {
        println!("\nPosters: {}", info.posters.len());
        for poster in &info.posters {
            println!("  [{}] {}", poster.index, poster.codec);
        }
    }

    Ok(())
}

fn list_codecs() -> Result<()> {
    let registry = Registry::builtin();

    for kind in StreamKind::ALL {
        println!("{} codecs:", kind);
        for codec in registry.codecs(kind) {
            if codec.engine_name.is_empty() || codec.engine_name == codec.name() {
                println!("  {}", codec.name());
            } else {
                println!("  {:<12} {}", codec.name(), codec.engine_name);
            }
        }
        println!();
    }

    println!("Formats:");
    for format in registry.formats() {
        println!("  {:<12} {}", format.public_name, format.engine_name);
    }

    Ok(())
}

fn check_tools_cmd(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Checking external tools...\n");

    let tools = check_tools(
        config.tools.ffmpeg_path.as_deref(),
        config.tools.ffprobe_path.as_deref(),
    );
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg to enable conversions.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    let show = |path: &Option<std::path::PathBuf>| {
        path.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(PATH)".to_string())
    };
    println!("  ffmpeg: {}", show(&config.tools.ffmpeg_path));
    println!("  ffprobe: {}", show(&config.tools.ffprobe_path));
    match config.conversion.timeout() {
        Some(timeout) => println!("  Timeout: {}s", timeout.as_secs()),
        None => println!("  Timeout: disabled"),
    }
    println!("  Min duration: {}s", config.conversion.min_duration_secs);
    println!("  Posters as video: {}", config.conversion.posters_as_video);

    Ok(())
}
