use clap::Parser;
use resvg::usvg;
use seqtrace::diagram::{DiagramOptions, layout, parse_request_data, render_svg};
use seqtrace::theme::Palette;
use std::path::{Path, PathBuf};
use tiny_skia::{Pixmap, Transform};

/// Sequence-diagram renderer for timestamped communication logs
#[derive(Parser, Debug)]
#[command(name = "seqtrace")]
#[command(version)]
#[command(about = "Render request traces as sequence diagrams (SVG, PNG or PDF)", long_about = None)]
struct Args {
    /// Input trace log in JSON (use "-" for stdin)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file path (extension determines format: .svg, .png or .pdf)
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,

    /// Include error annotations in the timeline
    #[arg(long)]
    show_errors: bool,

    /// Include trace annotations in the timeline
    #[arg(long)]
    show_traces: bool,

    /// Render timestamps as millisecond offsets from the request start
    #[arg(long)]
    timestamp_offsets: bool,

    /// Color palette: a built-in name (light, dark) or a TOML file path
    #[arg(short, long, value_name = "PALETTE")]
    palette: Option<String>,

    /// Raster scale multiplier for PNG output (e.g. 2.0 for sharper output)
    #[arg(long, default_value_t = 1.0)]
    png_scale: f32,
}

fn main() -> Result<(), String> {
    let args = Args::parse();

    let palette = match args.palette.as_deref() {
        Some(value) => {
            let path = Path::new(value);
            if path.exists() && path.is_file() {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read palette file: {}", e))?;
                Palette::from_toml(&content)?
            } else {
                Palette::from_builtin(value)?
            }
        }
        None => Palette::default(),
    };

    let source = if args.input.to_str() == Some("-") {
        let mut buffer = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        buffer
    } else {
        std::fs::read_to_string(&args.input)
            .map_err(|e| format!("Failed to read input file: {}", e))?
    };

    let data = parse_request_data(&source)?;
    let options = DiagramOptions {
        show_errors: args.show_errors,
        show_traces: args.show_traces,
        timestamp_offsets: args.timestamp_offsets,
    };

    let diagram = layout(&data, &options).map_err(|e| e.to_string())?;
    let Some(diagram) = diagram else {
        eprintln!("Nothing to render: the trace log has no communications");
        return Ok(());
    };
    let svg = render_svg(&diagram, &palette);

    let output_ext = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .ok_or("Output file has no extension")?
        .to_ascii_lowercase();

    match output_ext.as_str() {
        "svg" => {
            std::fs::write(&args.output, &svg)
                .map_err(|e| format!("Failed to write SVG: {}", e))?;
            eprintln!("SVG saved to: {}", args.output.display());
        }
        "png" => {
            let png_data = svg_to_png(&svg, args.png_scale)?;
            std::fs::write(&args.output, png_data)
                .map_err(|e| format!("Failed to write PNG: {}", e))?;
            eprintln!("PNG saved to: {}", args.output.display());
        }
        "pdf" => {
            let pdf_data = svg_to_pdf(&svg)?;
            std::fs::write(&args.output, pdf_data)
                .map_err(|e| format!("Failed to write PDF: {}", e))?;
            eprintln!("PDF saved to: {}", args.output.display());
        }
        _ => {
            return Err(format!(
                "Unsupported output format: .{} (use .svg, .png or .pdf)",
                output_ext
            ));
        }
    }

    Ok(())
}

fn svg_to_png(svg: &str, scale: f32) -> Result<Vec<u8>, String> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(format!("Invalid --png-scale value: {}", scale));
    }

    let mut opts = usvg::Options::default();
    {
        let fontdb = opts.fontdb_mut();
        fontdb.load_system_fonts();
        configure_font_fallbacks(fontdb);
    }

    let tree =
        usvg::Tree::from_str(svg, &opts).map_err(|e| format!("Failed to parse SVG: {}", e))?;

    let svg_width = (tree.size().width() * scale).ceil() as u32;
    let svg_height = (tree.size().height() * scale).ceil() as u32;

    let mut pixmap = Pixmap::new(svg_width, svg_height).ok_or("Failed to create pixmap")?;
    let transform = Transform::from_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| format!("Failed to encode PNG: {}", e))
}

fn svg_to_pdf(svg: &str) -> Result<Vec<u8>, String> {
    use svg2pdf::usvg::fontdb;

    let mut fontdb = fontdb::Database::new();
    fontdb.load_system_fonts();
    configure_font_fallbacks_svg2pdf(&mut fontdb);

    let opts = svg2pdf::usvg::Options {
        fontdb: std::sync::Arc::new(fontdb),
        ..Default::default()
    };

    let tree = svg2pdf::usvg::Tree::from_str(svg, &opts)
        .map_err(|e| format!("Failed to parse SVG: {}", e))?;

    // Keep text as paths for broader viewer/font compatibility.
    let options = svg2pdf::ConversionOptions {
        embed_text: false,
        ..Default::default()
    };
    let page_options = svg2pdf::PageOptions::default();

    svg2pdf::to_pdf(&tree, options, page_options)
        .map_err(|e| format!("Failed to convert SVG to PDF: {}", e))
}

// All diagram text is monospace; make sure the rasterizer resolves the
// generic family to something installed.
fn configure_font_fallbacks(fontdb: &mut usvg::fontdb::Database) {
    let mut mono_family: Option<String> = None;
    let mut first_family: Option<String> = None;

    for face in fontdb.faces() {
        for (family, _) in &face.families {
            if first_family.is_none() {
                first_family = Some(family.clone());
            }
            let lower = family.to_ascii_lowercase();
            if mono_family.is_none() && (lower.contains("mono") || lower.contains("code")) {
                mono_family = Some(family.clone());
            }
        }
    }

    if let Some(family) = mono_family.as_deref().or(first_family.as_deref()) {
        fontdb.set_monospace_family(family);
    }
}

fn configure_font_fallbacks_svg2pdf(fontdb: &mut svg2pdf::usvg::fontdb::Database) {
    let mut mono_family: Option<String> = None;
    let mut first_family: Option<String> = None;

    for face in fontdb.faces() {
        for (family, _) in &face.families {
            if first_family.is_none() {
                first_family = Some(family.clone());
            }
            let lower = family.to_ascii_lowercase();
            if mono_family.is_none() && (lower.contains("mono") || lower.contains("code")) {
                mono_family = Some(family.clone());
            }
        }
    }

    if let Some(family) = mono_family.as_deref().or(first_family.as_deref()) {
        fontdb.set_monospace_family(family);
    }
}
