use crate::theme::Palette;

use super::layout::{
    AnnotationKind, Arrow, ArrowLabel, Banner, CrossMark, Diagram, EndpointHeader, Loopback, Row,
    RowBody, TimestampLabel, BOX_PADDING, FONT_SIZE, FONT_SIZE_LABEL, SVG_PADDING,
};

/// Render a laid-out diagram as a standalone SVG document. All geometry is
/// read verbatim from the drawable tree; this stage only maps variants to
/// markup and semantic roles to palette colors.
pub fn render_svg(diagram: &Diagram, palette: &Palette) -> String {
    let mut svg = String::new();

    svg.push_str(&format!(
        r#"<svg width="{:.2}" height="{:.2}" xmlns="http://www.w3.org/2000/svg">"#,
        diagram.width, diagram.height
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<rect width="{:.2}" height="{:.2}" fill="{}"/>"#,
        diagram.width, diagram.height, palette.background
    ));
    svg.push('\n');

    svg.push_str(&format!(
        r#"<g transform="translate({:.2},{:.2})">"#,
        SVG_PADDING, SVG_PADDING
    ));
    svg.push('\n');

    // timestamp column, then headers, then rows: document order keeps the
    // divider lines behind row content
    svg.push_str(&format!(
        r#"<g transform="translate(0,{:.2})">"#,
        diagram.margin_y
    ));
    for label in &diagram.timestamps {
        svg.push_str(&render_timestamp(label, palette));
    }
    svg.push_str("</g>\n");

    svg.push_str(&format!(
        r#"<g transform="translate({:.2},0)">"#,
        diagram.margin_x
    ));
    for header in &diagram.headers {
        svg.push_str(&render_header(header, palette));
    }
    svg.push_str("</g>\n");

    svg.push_str(&format!(
        r#"<g transform="translate({:.2},{:.2})">"#,
        diagram.margin_x, diagram.margin_y
    ));
    for row in &diagram.rows {
        svg.push_str(&render_row(row, palette));
    }
    svg.push_str("</g>\n");

    svg.push_str("</g>\n");
    svg.push_str(&arrowhead_defs(palette));
    svg.push_str("</svg>\n");

    svg
}

fn arrowhead_defs(palette: &Palette) -> String {
    let marker = |id: &str, fill: &str| {
        format!(
            r#"<marker id="{}" viewBox="0 -5 10 10" refX="10" refY="0" markerWidth="10" markerHeight="10" orient="auto"><path d="M0,-5L10,0L0,5" fill="{}"/></marker>"#,
            id, fill
        )
    };
    format!(
        "<defs>{}{}</defs>\n",
        marker("end-default", &palette.stroke),
        marker("end-failure", &palette.failure)
    )
}

fn render_timestamp(label: &TimestampLabel, palette: &Palette) -> String {
    format!(
        r#"<text x="{:.2}" y="{:.2}" dy="{:.2}" font-size="{:.1}" font-family="monospace" fill="{}">{}</text>"#,
        label.x,
        label.y,
        FONT_SIZE_LABEL,
        FONT_SIZE_LABEL,
        palette.timestamp,
        escape_text(&label.text)
    )
}

fn render_header(header: &EndpointHeader, palette: &Palette) -> String {
    let mut out = format!(r#"<g transform="translate({:.2},0)">"#, header.x);
    out.push_str(&format!(
        r#"<rect fill="{}" height="{:.2}" width="{:.2}"/>"#,
        palette.header_fill, header.box_height, header.box_width
    ));
    out.push_str(&format!(
        r#"<text x="{:.2}" dy="{:.2}" font-size="{:.1}" font-family="monospace" fill="{}" textLength="{:.2}">{}</text>"#,
        BOX_PADDING,
        FONT_SIZE,
        FONT_SIZE,
        palette.stroke,
        header.text_width,
        escape_text(&header.name)
    ));
    out.push_str(&format!(
        r#"<line x1="{:.2}" x2="{:.2}" y1="{:.2}" y2="{:.2}" stroke="{}" stroke-width="1"/>"#,
        header.divider_x,
        header.divider_x,
        header.box_height,
        header.divider_bottom,
        palette.header_fill
    ));
    out.push_str("</g>\n");
    out
}

fn render_row(row: &Row, palette: &Palette) -> String {
    let mut out = format!(r#"<g transform="translate(0,{:.2})">"#, row.y);
    match &row.body {
        RowBody::Arrow(arrow) => out.push_str(&render_arrow(arrow, palette)),
        RowBody::Loopback(loopback) => out.push_str(&render_loopback(loopback, palette)),
        RowBody::Banner(banner) => out.push_str(&render_banner(banner, palette)),
    }
    out.push_str("</g>\n");
    out
}

fn stroke_color<'a>(failed: bool, palette: &'a Palette) -> (&'a str, &'static str) {
    if failed {
        (&palette.failure, "end-failure")
    } else {
        (&palette.stroke, "end-default")
    }
}

fn dash_attr(dashed: bool) -> &'static str {
    if dashed {
        r#" stroke-dasharray="5 5""#
    } else {
        ""
    }
}

fn render_arrow(arrow: &Arrow, palette: &Palette) -> String {
    let (color, marker) = stroke_color(arrow.failed, palette);
    let mut out = render_arrow_label(&arrow.label, color, palette);
    out.push_str(&format!(
        r#"<line x1="{:.2}" x2="{:.2}" y1="{:.2}" y2="{:.2}" stroke="{}" stroke-width="1"{} marker-end="url(#{})"/>"#,
        arrow.source_x,
        arrow.dest_x,
        arrow.y,
        arrow.y,
        color,
        dash_attr(arrow.dashed),
        marker
    ));
    if let Some(cross) = &arrow.timeout {
        out.push_str(&render_cross(cross, color));
    }
    out
}

fn render_loopback(loopback: &Loopback, palette: &Palette) -> String {
    let (color, marker) = stroke_color(loopback.failed, palette);
    let mut out = render_arrow_label(&loopback.label, color, palette);
    out.push_str(&format!(
        r#"<path d="M {x:.2},{y:.2} C {cx:.2},{c1y:.2} {cx:.2},{c2y:.2} {x:.2},{ey:.2}" fill="transparent" stroke="{color}" stroke-width="1"{dash} marker-end="url(#{marker})"/>"#,
        x = loopback.x,
        y = loopback.y,
        cx = loopback.x + loopback.curve_width,
        c1y = loopback.y - loopback.curve_rise,
        c2y = loopback.y + loopback.curve_rise * 2.0,
        ey = loopback.y + loopback.curve_rise,
        color = color,
        dash = dash_attr(loopback.dashed),
        marker = marker
    ));
    if let Some(cross) = &loopback.timeout {
        out.push_str(&render_cross(cross, color));
    }
    out
}

fn render_arrow_label(label: &ArrowLabel, color: &str, palette: &Palette) -> String {
    let badge = &label.badge;
    let mut out = format!(
        r#"<text x="{:.2}" dy="{:.2}" font-size="{:.1}" font-family="monospace" fill="{}" textLength="{:.2}">{}</text>"#,
        label.x,
        FONT_SIZE_LABEL,
        FONT_SIZE_LABEL,
        color,
        label.text_width,
        escape_text(&label.text)
    );
    out.push_str(&format!(
        r#"<rect x="{:.2}" height="{:.2}" width="{:.2}" rx="{:.2}" fill="{}"/>"#,
        badge.x, badge.height, badge.width, BOX_PADDING, palette.badge_fill
    ));
    out.push_str(&format!(
        r#"<text x="{:.2}" dy="{:.2}" font-size="{:.1}" font-family="monospace" fill="{}" textLength="{:.2}">{}</text>"#,
        badge.text_x,
        FONT_SIZE_LABEL,
        FONT_SIZE_LABEL,
        palette.stroke,
        badge.text_width,
        escape_text(&badge.text)
    ));
    out
}

fn render_cross(cross: &CrossMark, color: &str) -> String {
    let left = cross.x - cross.half_extent;
    let right = cross.x + cross.half_extent;
    let top = cross.y - cross.half_extent;
    let bottom = cross.y + cross.half_extent;
    format!(
        r#"<line x1="{l:.2}" x2="{r:.2}" y1="{t:.2}" y2="{b:.2}" stroke="{c}"/><line x1="{l:.2}" x2="{r:.2}" y1="{b:.2}" y2="{t:.2}" stroke="{c}"/>"#,
        l = left,
        r = right,
        t = top,
        b = bottom,
        c = color
    )
}

fn render_banner(banner: &Banner, palette: &Palette) -> String {
    let fill = match banner.kind {
        AnnotationKind::Error => &palette.error_fill,
        AnnotationKind::Trace => &palette.trace_fill,
    };
    let mut out = format!(
        r#"<rect fill="{}" opacity="0.75" y="{:.2}" height="{:.2}" width="{:.2}"/>"#,
        fill, BOX_PADDING, banner.rect_height, banner.rect_width
    );
    for (i, line) in banner.lines.iter().enumerate() {
        out.push_str(&format!(
            r#"<text y="{:.2}" x="{:.2}" dy="{:.2}" font-size="{:.1}" font-family="monospace" fill="{}" textLength="{:.2}">{}</text>"#,
            i as f32 * FONT_SIZE_LABEL,
            BOX_PADDING,
            FONT_SIZE_LABEL + BOX_PADDING,
            FONT_SIZE_LABEL,
            palette.stroke,
            line.width,
            escape_text(&line.text)
        ));
    }
    out
}

/// Escape text content for SVG. Control chars that XML 1.0 forbids are
/// dropped outright so a hostile log line cannot produce an unparseable
/// document.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c if c.is_control() && !matches!(c, '\t' | '\n' | '\r') => {}
            c => escaped.push(c),
        }
    }
    escaped
}
