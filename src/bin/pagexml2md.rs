//! Convert PAGE XML layout exports to mARkdown
//!
//! Usage:
//!   pagexml2md export_doc12_pagexml.zip -o 0845Maqrizi.Khitat.Shamela0001-ara1
//!   pagexml2md pages/ --include Main,Title --first-page 3
//!   pagexml2md vol1.zip vol2.zip -o 0845Maqrizi.Khitat.Shamela0001-ara1
//!
//! Several inputs are converted as consecutive volumes of one work and merged.

use clap::Parser;
use pagexml_oxide::config::{ConversionConfig, RegionSelection};
use pagexml_oxide::converters::header::load_transcription_meta;
use pagexml_oxide::pipeline::{merged_volume_name, BatchConverter, ConvertedDocument, VolumeGroups};
use pagexml_oxide::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    name = "pagexml2md",
    version,
    about = "Reconstruct PAGE XML OCR layout files into an OpenITI mARkdown document"
)]
struct Cli {
    /// Folders of layout files or zip archives; several inputs are volumes of one work
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (stdout when omitted)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// JSON configuration file; command line options override it
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Region types to keep (comma or semicolon separated)
    #[arg(short = 'i', long = "include", conflicts_with_all = ["exclude", "all_regions"])]
    include: Option<String>,

    /// Region types to drop (comma or semicolon separated)
    #[arg(short = 'x', long = "exclude", conflicts_with = "all_regions")]
    exclude: Option<String>,

    /// Keep every region, including lines outside any region
    #[arg(long = "all-regions")]
    all_regions: bool,

    /// Minimum overlap (pixels) between segments of one line
    #[arg(long = "min-overlap")]
    min_overlap: Option<f32>,

    /// Separator between segments of one line
    #[arg(long = "separator")]
    separator: Option<String>,

    /// Do not prefix pages with their image file name
    #[arg(long = "no-image-names")]
    no_image_names: bool,

    /// Keep lines that are not inside a region
    #[arg(long = "keep-orphan-lines")]
    keep_orphan_lines: bool,

    /// Real page number of the first file
    #[arg(long = "first-page", allow_hyphen_values = true)]
    first_page: Option<i64>,

    /// Number added to every page number
    #[arg(long = "page-offset", allow_hyphen_values = true)]
    page_offset: Option<i64>,

    /// Swap left and right pages whose numbering is inverted
    #[arg(long = "reorder-pages")]
    reorder_pages: bool,

    /// Label of the main text region type
    #[arg(long = "main-region")]
    main_region: Option<String>,

    /// Volume number of the (first) input
    #[arg(long = "volume")]
    volume: Option<u32>,

    /// Extra header field, as key=value (repeatable)
    #[arg(long = "meta", value_parser = parse_meta)]
    meta: Vec<(String, String)>,

    /// JSON file with transcription layer metadata
    #[arg(long = "meta-json")]
    meta_json: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long = "debug")]
    debug: bool,
}

fn parse_meta(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

impl Cli {
    fn build_config(&self) -> Result<ConversionConfig> {
        let mut config = match &self.config {
            Some(path) => ConversionConfig::from_json_file(path)?,
            None => ConversionConfig::default(),
        };

        if self.all_regions {
            config.regions = RegionSelection::All;
        } else if let Some(list) = &self.include {
            config.regions = RegionSelection::include_from_list(list);
        } else if let Some(list) = &self.exclude {
            config.regions = RegionSelection::Exclude(
                list.split([',', ';'])
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }

        if let Some(pixels) = self.min_overlap {
            config.min_line_overlap = pixels;
        }
        if let Some(separator) = &self.separator {
            config.segment_separator = separator.clone();
        }
        if self.no_image_names {
            config.include_image_name = false;
        }
        if self.keep_orphan_lines {
            config.discard_orphan_lines = false;
        }
        if let Some(first_page) = self.first_page {
            config.first_page = Some(first_page);
        }
        if let Some(offset) = self.page_offset {
            config.page_offset = offset;
        }
        if self.reorder_pages {
            config.reorder_pages = true;
        }
        if let Some(label) = &self.main_region {
            config.main_text_region = label.clone();
        }
        if let Some(volume) = self.volume {
            config.volume = volume;
        }
        if let Some(path) = &self.meta_json {
            config.transcription_meta.extend(load_transcription_meta(path)?);
        }
        for (key, value) in &self.meta {
            config.transcription_meta.insert(key.clone(), value.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

fn convert_input(config: ConversionConfig, input: &Path) -> Result<ConvertedDocument> {
    let converter = BatchConverter::new(config)?;
    let is_zip = input
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false);
    if is_zip {
        converter.convert_zip(input)
    } else {
        converter.convert_folder(input)
    }
}

fn print_report(input: &Path, converted: &ConvertedDocument) {
    let report = &converted.report;
    eprintln!(
        "{}: {} page(s) converted, {} skipped",
        input.display(),
        report.pages_converted,
        report.skipped.len()
    );
    for (path, reason) in &report.skipped {
        eprintln!("  ✗ {}: {}", path.display(), reason);
    }
    for warning in &report.warnings {
        eprintln!("  ! {}", warning);
    }
}

fn write_output(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, text)?;
            eprintln!("Output: {}", path.display());
        },
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        },
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.build_config()?;
    let start_time = Instant::now();

    if cli.inputs.len() == 1 {
        let converted = convert_input(config, &cli.inputs[0])?;
        print_report(&cli.inputs[0], &converted);
        write_output(cli.output.as_deref(), &converted.document.render())?;
    } else {
        let output = cli.output.clone().unwrap_or_else(|| PathBuf::from("merged"));
        let book = output.display().to_string();
        let mut groups = VolumeGroups::new();
        for (index, input) in cli.inputs.iter().enumerate() {
            let volume = config.volume + index as u32;
            let converted = convert_input(config.clone().with_volume(volume), input)?;
            print_report(input, &converted);
            groups.register(book.as_str(), volume, converted.document.render());
        }
        for (_, text) in groups.finish()? {
            write_output(Some(&merged_volume_name(&output)), &text)?;
        }
    }

    log::info!("Done in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
