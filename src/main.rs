use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use viewer_export::catalog::Catalog;
use viewer_export::config::{self, ExportConfig};
use viewer_export::export::{self, ExportRequest};
use viewer_export::imaging::{
    ImageBackend, Pow2Snap, ResampleFilter, RustBackend, SaveAsSize, SaveFormat, SizeMode,
};
use viewer_export::output;
use viewer_export::overwrite::{OverwriteSummary, files_needing_overwrite, needs_confirmation};

/// Where exported files go and in which format.
#[derive(clap::Args, Clone)]
struct DestArgs {
    /// Output format: tga, png, bmp, jpg or gif
    #[arg(long)]
    format: Option<SaveFormat>,

    /// Folder for exported files, relative to --dir ("" saves next to the sources)
    #[arg(long)]
    sub_folder: Option<String>,
}

impl DestArgs {
    fn apply(&self, config: &mut ExportConfig) {
        if let Some(format) = self.format {
            config.save.file_type = format;
        }
        if let Some(sub_folder) = &self.sub_folder {
            config.save.sub_folder = sub_folder.clone();
        }
    }
}

/// Encoder and confirmation flags shared by the save commands.
#[derive(clap::Args, Clone)]
struct SaveArgs {
    #[command(flatten)]
    dest: DestArgs,

    /// Resample filter: nearest-neighbour, box, bilinear, bicubic, quadratic, hamming
    #[arg(long)]
    filter: Option<ResampleFilter>,

    /// JPEG quality, 0-100
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
    quality: Option<u32>,

    /// Run-length encode TGA output
    #[arg(long)]
    rle: bool,

    /// Overwrite existing files without asking
    #[arg(long, short = 'y')]
    yes: bool,
}

impl SaveArgs {
    fn apply(&self, config: &mut ExportConfig) {
        self.dest.apply(config);
        if let Some(filter) = self.filter {
            config.resize.filter = filter;
        }
        if let Some(quality) = self.quality {
            config.save.jpeg_quality = quality;
        }
        if self.rle {
            config.save.targa_rle = true;
        }
        if self.yes {
            config.save.confirm_file_overwrites = false;
        }
    }
}

/// Batch sizing flags.
#[derive(clap::Args, Clone)]
struct SizeArgs {
    /// percent, set-width-and-height, set-width-retain-aspect or set-height-retain-aspect
    #[arg(long)]
    size_mode: Option<SizeMode>,

    /// Percent of the original size (percent mode)
    #[arg(long)]
    percent: Option<f32>,

    /// Output width in pixels (width modes)
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels (height modes)
    #[arg(long)]
    height: Option<u32>,
}

impl SizeArgs {
    fn apply(&self, config: &mut ExportConfig) {
        if let Some(mode) = self.size_mode {
            config.resize.size_mode = mode;
        }
        if let Some(percent) = self.percent {
            config.resize.percent = percent;
        }
        if let Some(width) = self.width {
            config.resize.width = width;
        }
        if let Some(height) = self.height {
            config.resize.height = height;
        }
    }
}

#[derive(Parser)]
#[command(name = "viewer-export")]
#[command(about = "Resample and export the images in a folder")]
#[command(long_about = "\
Resample and export the images in a folder

Every supported image directly inside --dir (jpg, png, bmp, tga, gif) is part
of the catalog. Exports go to a sub-folder (\"Saved\" by default) or next to
the sources. Files written into the viewed folder join the catalog.

Size modes (save-all):
  percent                   Scale both sides. 100 means no resampling.
  set-width-and-height      Exact size, aspect ratio not preserved.
  set-width-retain-aspect   Fixed width, height follows each image.
  set-height-retain-aspect  Fixed height, width follows each image.

Outputs are never smaller than 4x4 pixels.

Settings are read from config.toml in --dir; flags override it.
Run 'viewer-export gen-config' to generate a documented config.toml.

Set RUST_LOG=info to log every file as it is written.")]
#[command(version)]
struct Cli {
    /// Folder whose images are exported
    #[arg(long, default_value = ".", global = true)]
    dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export every image in the folder
    SaveAll {
        #[command(flatten)]
        save: SaveArgs,

        #[command(flatten)]
        size: SizeArgs,

        /// Also write a JSON report of every file to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Export one image at an exact size
    SaveAs {
        /// Source image, relative to --dir
        file: PathBuf,

        /// Output base name (defaults to the source's)
        #[arg(long)]
        name: Option<String>,

        /// Output width; with the aspect lock the height follows
        #[arg(long)]
        width: Option<u32>,

        /// Output height; with the aspect lock the width follows (wins over --width)
        #[arg(long)]
        height: Option<u32>,

        /// Set width and height independently
        #[arg(long)]
        unlock_aspect: bool,

        /// Snap to the next lower or higher power of two
        #[arg(long, value_name = "lower|higher")]
        snap_pow2: Option<Pow2Snap>,

        #[command(flatten)]
        save: SaveArgs,
    },
    /// List files a save-all would overwrite
    Check(DestArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Check(dest) => {
            let mut cfg = config::load_config(&cli.dir)?;
            dest.apply(&mut cfg);
            let catalog = open_catalog(&cli.dir, &cfg)?;
            let request = ExportRequest::from_config(&cfg, &cli.dir);
            let existing = files_needing_overwrite(
                catalog.images().iter().map(|img| img.path()),
                &request.dest_dir,
                request.format,
            );
            output::print_check_output(&existing, &request.dest_dir, &cli.dir);
        }
        Command::SaveAll { save, size, report } => {
            let mut cfg = config::load_config(&cli.dir)?;
            save.apply(&mut cfg);
            size.apply(&mut cfg);
            cfg.validate()?;
            let mut catalog = open_catalog(&cli.dir, &cfg)?;
            let request = ExportRequest::from_config(&cfg, &cli.dir);

            export::prepare_dest_dir(&request.dest_dir)?;
            let existing = files_needing_overwrite(
                catalog.images().iter().map(|img| img.path()),
                &request.dest_dir,
                request.format,
            );
            if needs_confirmation(cfg.save.confirm_file_overwrites, &existing) {
                if let Some(summary) = OverwriteSummary::new(&existing) {
                    for line in output::format_overwrite_prompt(&summary) {
                        println!("{}", line);
                    }
                }
                if !confirm()? {
                    println!("Cancelled");
                    return Ok(());
                }
            }

            let backend = RustBackend::new();
            let batch = export::save_all_images(&backend, &mut catalog, &request)?;
            output::print_batch_report(&batch, &cli.dir);
            if let Some(path) = report {
                std::fs::write(&path, serde_json::to_string_pretty(&batch)?)?;
            }
            if batch.is_total_failure() {
                return Err("no images were saved".into());
            }
        }
        Command::SaveAs {
            file,
            name,
            width,
            height,
            unlock_aspect,
            snap_pow2,
            save,
        } => {
            let mut cfg = config::load_config(&cli.dir)?;
            save.apply(&mut cfg);
            cfg.validate()?;
            let mut catalog = open_catalog(&cli.dir, &cfg)?;
            let request = ExportRequest::from_config(&cfg, &cli.dir);

            let source = cli.dir.join(&file);
            let index = catalog.find_image(&source).ok_or_else(|| {
                format!("{} is not an image in {}", file.display(), cli.dir.display())
            })?;

            let backend = RustBackend::new();
            let mut size = SaveAsSize::new(backend.identify(&source)?);
            if unlock_aspect {
                size.set_lock_aspect(false);
            }
            if let Some(w) = width {
                size.set_width(w);
            }
            if let Some(h) = height {
                size.set_height(h);
            }
            if let Some(direction) = snap_pow2 {
                size.snap_width(direction);
                if !size.lock_aspect() {
                    size.snap_height(direction);
                }
            }

            let out_file = output_file(&request, &source, name.as_deref());
            if cfg.save.confirm_file_overwrites && export::destination_exists(&out_file) {
                for line in output::format_overwrite_file_prompt(&out_file) {
                    println!("{}", line);
                }
                if !confirm()? {
                    println!("Cancelled");
                    return Ok(());
                }
            }

            let single = export::save_as(
                &backend,
                &mut catalog,
                index,
                &out_file,
                size.dimensions(),
                request.filter,
                &request.encode_params(),
            )?;
            output::print_single_save(&source, &single);
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

fn open_catalog(dir: &Path, cfg: &ExportConfig) -> Result<Catalog, Box<dyn std::error::Error>> {
    Ok(Catalog::populate(
        dir,
        cfg.catalog.sort_key,
        cfg.catalog.sort_ascending,
    )?)
}

fn output_file(request: &ExportRequest, source: &Path, name: Option<&str>) -> PathBuf {
    match name {
        Some(name) => export::output_path(&request.dest_dir, Path::new(name), request.format),
        None => request.output_path(source),
    }
}

/// Ask on stdin; anything but y/yes declines.
fn confirm() -> Result<bool, std::io::Error> {
    print!("Overwrite? [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
