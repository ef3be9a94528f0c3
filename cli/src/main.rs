//! pagesmith CLI - document conversion and PDF assembly tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pagesmith::assemble::ImagePageSize;
use pagesmith::{
    CompressOptions, Error, ExtractOptions, ImageDocumentOptions, JsonFormat, MergeInput,
    MergeOptions, OperationOutput, PageNumberStyle, PageSelection, Pagesmith, Permissions,
    ProtectionRequest, RenderOptions, SheetMode, SplitMode, SplitOptions, StampPosition,
    TargetKind,
};

#[derive(Parser)]
#[command(name = "pagesmith")]
#[command(version)]
#[command(about = "Convert documents and merge, split, compress and protect PDFs", long_about = None)]
struct Cli {
    /// Print the operation summary (or error) as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a PDF or text file to another format
    Convert {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Target format
        #[arg(short, long, value_enum)]
        to: Target,

        /// Output file (defaults to the input name with the target extension)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Carry font size, family, weight and color into the output
        #[arg(long)]
        styles: bool,

        /// Put every page on one spreadsheet sheet
        #[arg(long)]
        single_sheet: bool,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Do not detect tables
        #[arg(long)]
        no_tables: bool,

        /// Compact JSON output
        #[arg(long)]
        compact: bool,
    },

    /// Merge PDFs in the given order
    Merge {
        /// Input PDF files
        #[arg(value_name = "FILES", required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Output file
        #[arg(short, long, value_name = "FILE", default_value = "merged.pdf")]
        output: PathBuf,

        /// Insert a title page
        #[arg(long)]
        title_page: bool,

        /// Document title
        #[arg(long)]
        title: Option<String>,

        /// Do not write one bookmark per input
        #[arg(long)]
        no_bookmarks: bool,

        /// Stamp page numbers at this position
        #[arg(long, value_enum)]
        page_numbers: Option<Position>,

        /// Page number label; {n} is the number, {total} the count
        #[arg(long, default_value = "{n}")]
        number_format: String,
    },

    /// Split a PDF into several files
    Split {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output: PathBuf,

        #[command(flatten)]
        mode: SplitArgs,

        /// Naming template with {filename}, {index}, {start}, {end}
        #[arg(long, default_value = pagesmith::assemble::DEFAULT_NAME_TEMPLATE)]
        template: String,

        /// Do not copy title/author/subject/creator into the parts
        #[arg(long)]
        no_metadata: bool,
    },

    /// Re-write a PDF with unused objects removed and streams compressed
    Compress {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Remove document metadata
        #[arg(long)]
        strip_metadata: bool,

        /// Request a linearized layout
        #[arg(long)]
        linearize: bool,
    },

    /// Rotate pages by a multiple of 90 degrees
    Rotate {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Clockwise rotation in degrees
        #[arg(short, long, allow_hyphen_values = true)]
        degrees: i32,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Page range (all pages if omitted)
        #[arg(long)]
        pages: Option<String>,
    },

    /// Password-protect a PDF
    Encrypt {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// User password
        #[arg(short, long, env = "PAGESMITH_PASSWORD", hide_env_values = true)]
        password: String,

        /// Cipher and key length
        #[arg(long, value_enum, default_value = "aes128")]
        level: Level,

        #[command(flatten)]
        restrictions: Restrictions,
    },

    /// Remove password protection from a PDF
    Decrypt {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Password
        #[arg(short, long, env = "PAGESMITH_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Build a PDF with one page per image
    Images {
        /// Input images (JPEG, PNG)
        #[arg(value_name = "FILES", required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Output file
        #[arg(short, long, value_name = "FILE", default_value = "images.pdf")]
        output: PathBuf,

        /// Page size
        #[arg(long, value_enum, default_value = "a4")]
        page_size: PaperSize,

        /// Margin in millimetres
        #[arg(long, default_value = "15")]
        margin: f32,

        /// Document title
        #[arg(long)]
        title: Option<String>,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct SplitArgs {
    /// Parts of N pages each
    #[arg(long, value_name = "N")]
    every: Option<usize>,

    /// Page ranges, one part per range (e.g., "1-3,5,7-9")
    #[arg(long, value_name = "RANGES", num_args = 1..)]
    ranges: Option<Vec<String>>,

    /// One part per top-level bookmark
    #[arg(long)]
    bookmarks: bool,

    /// Parts of roughly this many bytes
    #[arg(long, value_name = "BYTES")]
    max_size: Option<usize>,
}

impl SplitArgs {
    fn mode(&self) -> SplitMode {
        if let Some(pages_per_chunk) = self.every {
            SplitMode::Pages { pages_per_chunk }
        } else if let Some(ranges) = &self.ranges {
            SplitMode::Ranges {
                ranges: ranges.clone(),
            }
        } else if let Some(max_bytes) = self.max_size {
            SplitMode::Size { max_bytes }
        } else {
            SplitMode::Bookmarks
        }
    }
}

#[derive(Args)]
struct Restrictions {
    /// Forbid printing
    #[arg(long)]
    no_print: bool,

    /// Allow only low-resolution printing
    #[arg(long, conflicts_with = "no_print")]
    low_res_print: bool,

    /// Forbid copying text and images
    #[arg(long)]
    no_copy: bool,

    /// Forbid modifying the document
    #[arg(long)]
    no_modify: bool,

    /// Forbid adding annotations
    #[arg(long)]
    no_annotate: bool,

    /// Forbid filling in forms
    #[arg(long)]
    no_forms: bool,

    /// Forbid content extraction for accessibility
    #[arg(long)]
    no_extract: bool,

    /// Forbid inserting, rotating or deleting pages
    #[arg(long)]
    no_assemble: bool,
}

impl From<&Restrictions> for Permissions {
    fn from(r: &Restrictions) -> Self {
        Permissions {
            printing: !r.no_print,
            high_res_printing: !r.no_print && !r.low_res_print,
            copying: !r.no_copy,
            modifying: !r.no_modify,
            annotating: !r.no_annotate,
            filling_forms: !r.no_forms,
            content_extraction: !r.no_extract,
            document_assembly: !r.no_assemble,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Target {
    Docx,
    Xlsx,
    Pptx,
    Rtf,
    Txt,
    Json,
}

impl From<Target> for TargetKind {
    fn from(target: Target) -> Self {
        match target {
            Target::Docx => TargetKind::Docx,
            Target::Xlsx => TargetKind::Xlsx,
            Target::Pptx => TargetKind::Pptx,
            Target::Rtf => TargetKind::Rtf,
            Target::Txt => TargetKind::Txt,
            Target::Json => TargetKind::Json,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Position {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl From<Position> for StampPosition {
    fn from(position: Position) -> Self {
        match position {
            Position::TopLeft => StampPosition::TopLeft,
            Position::TopCenter => StampPosition::TopCenter,
            Position::TopRight => StampPosition::TopRight,
            Position::BottomLeft => StampPosition::BottomLeft,
            Position::BottomCenter => StampPosition::BottomCenter,
            Position::BottomRight => StampPosition::BottomRight,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Level {
    Rc4_40,
    Rc4_128,
    Aes128,
    Aes256,
}

impl From<Level> for pagesmith::EncryptionLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Rc4_40 => pagesmith::EncryptionLevel::Rc4_40,
            Level::Rc4_128 => pagesmith::EncryptionLevel::Rc4_128,
            Level::Aes128 => pagesmith::EncryptionLevel::Aes128,
            Level::Aes256 => pagesmith::EncryptionLevel::Aes256,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PaperSize {
    A4,
    Letter,
    Fit,
}

impl From<PaperSize> for ImagePageSize {
    fn from(size: PaperSize) -> Self {
        match size {
            PaperSize::A4 => ImagePageSize::A4,
            PaperSize::Letter => ImagePageSize::Letter,
            PaperSize::Fit => ImagePageSize::FitImage,
        }
    }
}

type CliResult = Result<Vec<OperationOutput>, Error>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let json = cli.json;

    let result = match cli.command {
        Commands::Convert {
            input,
            to,
            output,
            styles,
            single_sheet,
            pages,
            no_tables,
            compact,
        } => {
            let mut extract = ExtractOptions::default();
            if no_tables {
                extract = extract.without_tables();
            }
            let mut render = RenderOptions::new()
                .with_styles(styles)
                .with_json_format(if compact {
                    JsonFormat::Compact
                } else {
                    JsonFormat::Pretty
                });
            if single_sheet {
                render = render.with_sheet_mode(SheetMode::Single);
            }
            pages
                .as_deref()
                .map(PageSelection::parse)
                .transpose()
                .and_then(|selection| {
                    if let Some(selection) = selection {
                        render = render.with_pages(selection);
                    }
                    cmd_convert(&input, to.into(), output.as_deref(), extract, &render)
                })
        }
        Commands::Merge {
            inputs,
            output,
            title_page,
            title,
            no_bookmarks,
            page_numbers,
            number_format,
        } => {
            let mut options = MergeOptions::default()
                .with_title_page(title_page)
                .with_bookmarks(!no_bookmarks);
            if let Some(title) = title {
                options = options.with_title(title);
            }
            if let Some(position) = page_numbers {
                options = options.with_page_numbers(
                    PageNumberStyle::at(position.into()).with_format(number_format),
                );
            }
            cmd_merge(&inputs, &output, &options)
        }
        Commands::Split {
            input,
            output,
            mode,
            template,
            no_metadata,
        } => {
            let options = SplitOptions::default()
                .with_mode(mode.mode())
                .with_name_template(template)
                .with_filename(&input.to_string_lossy())
                .with_preserve_metadata(!no_metadata);
            cmd_split(&input, &output, &options)
        }
        Commands::Compress {
            input,
            output,
            strip_metadata,
            linearize,
        } => {
            let options = CompressOptions::default()
                .with_strip_metadata(strip_metadata)
                .with_linearize(linearize);
            run_single(&input, &output, |ops, data, name| ops.compress(data, &options, name))
        }
        Commands::Rotate {
            input,
            degrees,
            output,
            pages,
        } => run_single(&input, &output, |ops, data, name| {
            ops.rotate(data, degrees, pages.as_deref(), name)
        }),
        Commands::Encrypt {
            input,
            output,
            password,
            level,
            restrictions,
        } => {
            let request = ProtectionRequest::new(password)
                .with_level(level.into())
                .with_permissions(Permissions::from(&restrictions));
            run_single(&input, &output, |ops, data, name| ops.encrypt(data, &request, name))
        }
        Commands::Decrypt {
            input,
            output,
            password,
        } => run_single(&input, &output, |ops, data, name| ops.decrypt(data, &password, name)),
        Commands::Images {
            inputs,
            output,
            page_size,
            margin,
            title,
        } => {
            let mut options = ImageDocumentOptions::default()
                .with_page_size(page_size.into())
                .with_margin_mm(margin);
            if let Some(title) = title {
                options = options.with_title(title);
            }
            cmd_images(&inputs, &output, &options)
        }
        Commands::Info { input } => cmd_info(&input, json).map(|_| Vec::new()),
        Commands::Version => {
            cmd_version();
            Ok(Vec::new())
        }
    };

    match result {
        Ok(outputs) => {
            if json {
                for output in &outputs {
                    match serde_json::to_string(output) {
                        Ok(line) => println!("{}", line),
                        Err(e) => eprintln!("{}: {}", "Error".red().bold(), e),
                    }
                }
            } else {
                for output in &outputs {
                    print_output(output);
                }
            }
        }
        Err(e) => {
            if json {
                let report = serde_json::to_string(&e.report()).unwrap_or_else(|_| e.to_string());
                eprintln!("{}", report);
            } else {
                eprintln!("{} [{}]: {}", "Error".red().bold(), e.kind(), e.message());
            }
            std::process::exit(1);
        }
    }
}

fn print_output(output: &OperationOutput) {
    println!("{} {} ({} bytes)", "Saved".green(), output.filename, output.size);
    if let Some(pages) = output.page_count {
        println!("  {} {}", "Pages:".bold(), pages);
    }
    if let Some(ratio) = output.compression_ratio {
        println!("  {} {:.1}%", "Saved space:".bold(), ratio * 100.0);
    }
    if let Some(bookmarks) = &output.bookmarks {
        println!("  {} {}", "Bookmarks:".bold(), bookmarks.len());
    }
    if let Some(level) = output.encryption_level {
        println!("  {} {}", "Encryption:".bold(), level);
    }
    if let Some(permissions) = &output.permissions {
        let granted = if permissions.is_empty() {
            "none".to_string()
        } else {
            permissions.join(", ")
        };
        println!("  {} {}", "Allowed:".bold(), granted);
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>, Error> {
    fs::read(path).map_err(|e| Error::Storage(format!("cannot read {}: {}", path.display(), e)))
}

fn write_output(path: &Path, data: &[u8]) -> Result<(), Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, data).map_err(|e| Error::Storage(format!("cannot write {}: {}", path.display(), e)))
}

/// Read one file, run an operation, write its output.
fn run_single<F>(input: &Path, output: &Path, op: F) -> CliResult
where
    F: FnOnce(&Pagesmith, &[u8], &str) -> pagesmith::Result<pagesmith::Produced>,
{
    let data = read_input(input)?;
    log::debug!("{} -> {}", input.display(), output.display());
    let name = output.display().to_string();
    let produced = op(&Pagesmith::new(), &data, &name)?;
    write_output(output, &produced.data)?;
    Ok(vec![produced.output])
}

fn cmd_convert(
    input: &Path,
    target: TargetKind,
    output: Option<&Path>,
    extract: ExtractOptions,
    render: &RenderOptions,
) -> CliResult {
    let data = read_input(input)?;
    let ops = Pagesmith::new().with_extract_options(extract);
    let mut produced = ops.convert(&data, &input.to_string_lossy(), target, render)?;

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension(target.extension()));
    write_output(&path, &produced.data)?;
    produced.output.filename = path.display().to_string();
    Ok(vec![produced.output])
}

fn cmd_merge(inputs: &[PathBuf], output: &Path, options: &MergeOptions) -> CliResult {
    let documents = inputs
        .iter()
        .map(|path| Ok(MergeInput::named(read_input(path)?, path.to_string_lossy())))
        .collect::<Result<Vec<_>, Error>>()?;

    let produced = Pagesmith::new().merge(&documents, options, &output.display().to_string())?;
    write_output(output, &produced.data)?;
    Ok(vec![produced.output])
}

fn cmd_split(input: &Path, output_dir: &Path, options: &SplitOptions) -> CliResult {
    let data = read_input(input)?;
    let parts = Pagesmith::new().split(&data, options)?;
    log::debug!("split {} into {} parts", input.display(), parts.len());

    let pb = ProgressBar::new(parts.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut outputs = Vec::with_capacity(parts.len());
    for part in parts {
        let path = output_dir.join(&part.output.filename);
        pb.set_message(part.output.filename.clone());
        write_output(&path, &part.data)?;
        let mut output = part.output;
        output.filename = path.display().to_string();
        outputs.push(output);
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(outputs)
}

fn cmd_images(inputs: &[PathBuf], output: &Path, options: &ImageDocumentOptions) -> CliResult {
    let images = inputs
        .iter()
        .map(|path| read_input(path))
        .collect::<Result<Vec<_>, Error>>()?;
    let produced = Pagesmith::new().images_to_pdf(&images, options, &output.display().to_string())?;
    write_output(output, &produced.data)?;
    Ok(vec![produced.output])
}

fn cmd_info(input: &Path, json: bool) -> Result<(), Error> {
    let info = pagesmith::inspect(&read_input(input)?)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), info.metadata.pdf_version);
    println!("{}: {}", "Pages".bold(), info.page_count);
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if info.encrypted { "Yes" } else { "No" }
    );
    if let Some((width, height)) = info.first_page_size {
        println!("{}: {:.0} x {:.0} pt", "Page size".bold(), width, height);
    }

    let metadata = &info.metadata;
    let fields = [
        ("Title", &metadata.title),
        ("Author", &metadata.author),
        ("Subject", &metadata.subject),
        ("Creator", &metadata.creator),
        ("Producer", &metadata.producer),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("{}: {}", label.bold(), value);
        }
    }
    if let Some(ref created) = metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = metadata.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }
    println!("{}: {}", "Bookmarks".bold(), info.outline_entries);

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pagesmith".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Document conversion and PDF assembly tool");
    println!();
    println!("Repository: {}", "https://github.com/pagesmith-rs/pagesmith".dimmed());
    println!("License: MIT");
}
