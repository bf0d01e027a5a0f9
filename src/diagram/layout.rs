use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::model::{Annotation, Communication, DiagramOptions, Endpoint, RequestData};
use crate::text::{format_timestamp, text_width, truncate, wrap};

/// Endpoint header font size.
pub const FONT_SIZE: f32 = 16.0;
/// Font size for labels, badges, banners and the timestamp column.
pub const FONT_SIZE_LABEL: f32 = 11.0;
/// Vertical rhythm unit; arrows sit one unit below their row origin and a
/// communication row is two units tall.
pub const ARROW_SPACING: f32 = 20.0;
pub const BOX_PADDING: f32 = 5.0;
pub const BOX_MARGIN: f32 = 10.0;
/// Symmetric outer padding around the whole canvas.
pub const SVG_PADDING: f32 = 10.0;
/// Arrow labels and banner lines are cut at this many chars.
pub const MAX_LABEL_CHARS: usize = 48;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("communication {index} references unknown endpoint '{name}'")]
    UnknownEndpoint { name: String, index: i64 },
}

/// Total render order for communications: timestamp, then caller-assigned
/// index, then requests before responses. The sort is stable, so coincident
/// request/response pairs nest as req(1), req(2), resp(2), resp(1).
pub fn order_communications(communications: &[Communication]) -> Vec<&Communication> {
    let mut ordered: Vec<&Communication> = communications.iter().collect();
    ordered.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.index.cmp(&b.index))
            .then_with(|| a.is_response.cmp(&b.is_response))
    });
    ordered
}

/// The positioned-element tree for one diagram, plus the final canvas size.
/// Row bodies use coordinates local to their row origin; the presenter
/// applies the group translations recorded here (`margin_x`, `margin_y`,
/// [`SVG_PADDING`]) without recomputing any of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    pub width: f32,
    pub height: f32,
    /// Width of the timestamp column, gutter included. Event rows and
    /// endpoint headers are shifted right by this much.
    pub margin_x: f32,
    /// Header lane height above the first event row.
    pub margin_y: f32,
    pub headers: Vec<EndpointHeader>,
    pub timestamps: Vec<TimestampLabel>,
    pub rows: Vec<Row>,
}

/// Column header box plus the vertical divider line under it. `x` is the
/// column offset within the header group; the divider runs at the column
/// center every arrow endpoint refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointHeader {
    pub name: String,
    pub x: f32,
    pub text_width: f32,
    pub box_width: f32,
    pub box_height: f32,
    pub divider_x: f32,
    pub divider_bottom: f32,
}

/// Right-aligned monospace timestamp, one per row, positioned within the
/// timestamp column group.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampLabel {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One placed row of the timeline. `y` is the offset within the event-row
/// group; `width`/`height` are the footprint used for canvas sizing.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub timestamp: DateTime<Utc>,
    pub body: RowBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowBody {
    Arrow(Arrow),
    Loopback(Loopback),
    Banner(Banner),
}

/// Straight horizontal connector between two column centers.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrow {
    pub source_x: f32,
    pub dest_x: f32,
    pub y: f32,
    pub dashed: bool,
    pub failed: bool,
    pub label: ArrowLabel,
    pub timeout: Option<CrossMark>,
}

/// Self-call connector: a cubic curve leaving and re-entering the same
/// column. Control points bulge `curve_width` to the right and `curve_rise`
/// above/below the baseline, so a zero horizontal span never divides
/// anything.
#[derive(Debug, Clone, PartialEq)]
pub struct Loopback {
    pub x: f32,
    pub y: f32,
    pub curve_width: f32,
    pub curve_rise: f32,
    pub dashed: bool,
    pub failed: bool,
    pub label: ArrowLabel,
    pub timeout: Option<CrossMark>,
}

/// Truncated label text followed by the index badge.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowLabel {
    pub text: String,
    pub x: f32,
    pub text_width: f32,
    pub badge: IndexBadge,
}

/// Pill-shaped badge showing the communication index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexBadge {
    pub text: String,
    pub x: f32,
    pub text_x: f32,
    pub width: f32,
    pub height: f32,
    pub text_width: f32,
}

/// Timeout marker centered on the arrow midpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossMark {
    pub x: f32,
    pub y: f32,
    pub half_extent: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Error,
    Trace,
}

/// Multi-line annotation banner. The rectangle is sized by the widest
/// wrapped line.
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub kind: AnnotationKind,
    pub rect_width: f32,
    pub rect_height: f32,
    pub lines: Vec<BannerLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BannerLine {
    pub text: String,
    pub width: f32,
}

/// Endpoint column geometry, fixed before any row is sized.
struct Columns {
    offsets: Vec<f32>,
    centers: HashMap<String, f32>,
    width: f32,
}

fn place_endpoints(endpoints: &[Endpoint]) -> Columns {
    let mut offsets = Vec::with_capacity(endpoints.len());
    let mut centers = HashMap::with_capacity(endpoints.len());
    let mut width = 0.0_f32;

    for endpoint in endpoints {
        let name_width = text_width(&endpoint.name, FONT_SIZE);
        offsets.push(width);
        centers.insert(endpoint.name.clone(), width + name_width / 2.0);
        width += name_width + BOX_PADDING * 2.0 + BOX_MARGIN * 2.0;
    }

    Columns {
        offsets,
        centers,
        width,
    }
}

/// A sized but not yet positioned row, carrying its timestamp for the
/// cross-stream merge.
struct SizedRow {
    timestamp: DateTime<Utc>,
    width: f32,
    height: f32,
    body: SizedBody,
}

enum SizedBody {
    Comm {
        source_x: f32,
        dest_x: f32,
        loopback: bool,
        dashed: bool,
        failed: bool,
        timeout: bool,
        label: String,
        label_width: f32,
        index_text: String,
        index_width: f32,
    },
    Banner {
        kind: AnnotationKind,
        lines: Vec<BannerLine>,
        rect_width: f32,
    },
}

fn size_communication(comm: &Communication, columns: &Columns) -> Result<SizedRow, LayoutError> {
    let center = |name: &str| {
        columns
            .centers
            .get(name)
            .copied()
            .ok_or_else(|| LayoutError::UnknownEndpoint {
                name: name.to_string(),
                index: comm.index,
            })
    };
    let source_x = center(&comm.source)?;
    let dest_x = center(&comm.dest)?;

    let label = truncate(&comm.label, MAX_LABEL_CHARS);
    let label_width = text_width(&label, FONT_SIZE_LABEL);
    let index_text = comm.index.to_string();
    let index_width = text_width(&index_text, FONT_SIZE_LABEL);

    Ok(SizedRow {
        timestamp: comm.timestamp,
        width: label_width + index_width,
        height: ARROW_SPACING * 2.0,
        body: SizedBody::Comm {
            source_x,
            dest_x,
            loopback: comm.source == comm.dest,
            dashed: comm.is_response,
            failed: comm.is_failure,
            timeout: comm.is_timeout,
            label,
            label_width,
            index_text,
            index_width,
        },
    })
}

fn size_annotation(annotation: &Annotation, kind: AnnotationKind) -> SizedRow {
    let lines: Vec<BannerLine> = wrap(&annotation.message, MAX_LABEL_CHARS)
        .into_iter()
        .map(|text| {
            let width = text_width(&text, FONT_SIZE_LABEL);
            BannerLine { text, width }
        })
        .collect();

    let widest = lines.iter().map(|l| l.width).fold(0.0_f32, f32::max);
    let rect_width = widest + BOX_PADDING * 2.0;
    let rect_height = lines.len() as f32 * FONT_SIZE_LABEL + BOX_PADDING * 2.0;

    SizedRow {
        timestamp: annotation.timestamp,
        width: rect_width,
        height: rect_height,
        body: SizedBody::Banner {
            kind,
            lines,
            rect_width,
        },
    }
}

/// Turn a sized row into a placed one. `content_width` is already final, so
/// the label clamp can never be tested against a stale bound.
fn place_row(row: SizedRow, y: f32, content_width: f32) -> Row {
    let SizedRow {
        timestamp,
        width,
        height,
        body,
    } = row;

    let body = match body {
        SizedBody::Comm {
            source_x,
            dest_x,
            loopback,
            dashed,
            failed,
            timeout,
            label,
            label_width,
            index_text,
            index_width,
        } => {
            let mut label_x = (dest_x + source_x - width) / 2.0;
            if loopback {
                label_x += ARROW_SPACING * 2.0;
            }
            // keep the label on the canvas
            label_x = label_x.clamp(0.0, (content_width - width).max(0.0));

            let cross = timeout.then(|| CrossMark {
                x: (dest_x + source_x) / 2.0,
                y: ARROW_SPACING,
                half_extent: FONT_SIZE_LABEL / 2.0,
            });
            let label = ArrowLabel {
                x: label_x,
                text_width: label_width,
                badge: IndexBadge {
                    x: label_x + label_width + BOX_PADDING,
                    text_x: label_x + label_width + BOX_PADDING * 2.0,
                    width: index_width + BOX_PADDING * 2.0,
                    height: FONT_SIZE_LABEL + BOX_PADDING * 2.0,
                    text_width: index_width,
                    text: index_text,
                },
                text: label,
            };

            if loopback {
                RowBody::Loopback(Loopback {
                    x: source_x,
                    y: ARROW_SPACING,
                    curve_width: ARROW_SPACING * 4.0,
                    curve_rise: ARROW_SPACING / 2.0,
                    dashed,
                    failed,
                    label,
                    timeout: cross,
                })
            } else {
                RowBody::Arrow(Arrow {
                    source_x,
                    dest_x,
                    y: ARROW_SPACING,
                    dashed,
                    failed,
                    label,
                    timeout: cross,
                })
            }
        }
        SizedBody::Banner {
            kind,
            lines,
            rect_width,
        } => RowBody::Banner(Banner {
            kind,
            rect_width,
            rect_height: lines.len() as f32 * FONT_SIZE_LABEL + BOX_PADDING * 2.0,
            lines,
        }),
    };

    Row {
        y,
        width,
        height,
        timestamp,
        body,
    }
}

/// Lay out the full diagram in one non-iterative pass sequence: endpoint
/// columns, ordered and sized communications, optional annotation banners,
/// a stable merge by timestamp, timestamp-column sizing, row placement, and
/// finally the canvas extent. An empty communications set is a valid
/// nothing-to-render input and yields `Ok(None)`.
pub fn layout(
    data: &RequestData,
    options: &DiagramOptions,
) -> Result<Option<Diagram>, LayoutError> {
    if data.communications.is_empty() {
        return Ok(None);
    }

    let columns = place_endpoints(&data.endpoints);

    let mut sized: Vec<SizedRow> = Vec::new();
    for comm in order_communications(&data.communications) {
        sized.push(size_communication(comm, &columns)?);
    }
    if options.show_errors {
        for error in &data.errors {
            sized.push(size_annotation(error, AnnotationKind::Error));
        }
    }
    if options.show_traces {
        for trace in &data.traces {
            sized.push(size_annotation(trace, AnnotationKind::Trace));
        }
    }

    // Merge both streams into one timeline. Stable, so rows sized earlier
    // stay first on equal timestamps.
    sized.sort_by_key(|row| row.timestamp);

    // Content width is final before any label is placed; the clamp in
    // place_row always tests against the true bound.
    let content_width = sized
        .iter()
        .map(|row| row.width)
        .fold(columns.width, f32::max);

    let labels: Vec<(String, f32)> = sized
        .iter()
        .map(|row| {
            let text = format_timestamp(row.timestamp, data.start_time, options.timestamp_offsets);
            let width = text_width(&text, FONT_SIZE_LABEL);
            (text, width)
        })
        .collect();
    let raw_margin_x = labels.iter().map(|(_, w)| *w).fold(0.0_f32, f32::max);
    let margin_x = raw_margin_x + BOX_PADDING * 4.0;
    let margin_y = ARROW_SPACING * 2.0;

    let mut timestamps = Vec::with_capacity(sized.len());
    let mut rows = Vec::with_capacity(sized.len());
    let mut content_height = 0.0_f32;
    for (row, (text, width)) in sized.into_iter().zip(labels) {
        timestamps.push(TimestampLabel {
            x: raw_margin_x - width,
            y: content_height + BOX_PADDING,
            width,
            height: FONT_SIZE_LABEL,
            text,
        });

        let advance = row.height.max(FONT_SIZE_LABEL) + BOX_PADDING;
        rows.push(place_row(row, content_height, content_width));
        content_height += advance;
    }

    let divider_bottom = content_height + margin_y;
    let headers = data
        .endpoints
        .iter()
        .zip(&columns.offsets)
        .map(|(endpoint, &x)| {
            let text_width = text_width(&endpoint.name, FONT_SIZE);
            EndpointHeader {
                name: endpoint.name.clone(),
                x,
                text_width,
                box_width: text_width + BOX_PADDING * 2.0,
                box_height: FONT_SIZE + BOX_PADDING * 2.0,
                divider_x: text_width / 2.0,
                divider_bottom,
            }
        })
        .collect();

    Ok(Some(Diagram {
        width: margin_x + content_width + SVG_PADDING * 2.0,
        height: margin_y + content_height + SVG_PADDING * 2.0,
        margin_x,
        margin_y,
        headers,
        timestamps,
        rows,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 11, 10, 10, 10, 10).unwrap()
    }

    fn at_ms(ms: i64) -> DateTime<Utc> {
        start() + Duration::milliseconds(ms)
    }

    fn comm(
        index: i64,
        ms: i64,
        source: &str,
        dest: &str,
        label: &str,
        is_response: bool,
    ) -> Communication {
        Communication {
            index,
            timestamp: at_ms(ms),
            source: source.to_string(),
            dest: dest.to_string(),
            label: label.to_string(),
            is_response,
            is_failure: false,
            is_timeout: false,
        }
    }

    fn request_data(endpoints: &[&str], communications: Vec<Communication>) -> RequestData {
        RequestData {
            start_time: start(),
            endpoints: endpoints
                .iter()
                .map(|name| Endpoint {
                    name: name.to_string(),
                })
                .collect(),
            communications,
            errors: Vec::new(),
            traces: Vec::new(),
        }
    }

    #[test]
    fn ordering_preserves_length_and_sorts_by_timestamp() {
        let comms = vec![
            comm(2, 300, "A", "B", "c", false),
            comm(0, 100, "A", "B", "a", false),
            comm(1, 200, "A", "B", "b", false),
        ];
        let ordered = order_communications(&comms);
        assert_eq!(ordered.len(), comms.len());
        for pair in ordered.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
        assert_eq!(ordered[0].label, "a");
        assert_eq!(ordered[2].label, "c");
    }

    #[test]
    fn ordering_breaks_ties_by_index_then_request_before_response() {
        // all at the same instant: expect req(1), req(2), resp(2), resp(1)
        let comms = vec![
            comm(1, 0, "A", "B", "resp1", true),
            comm(2, 0, "B", "C", "req2", false),
            comm(2, 0, "C", "B", "resp2", true),
            comm(1, 0, "A", "B", "req1", false),
        ];
        let ordered = order_communications(&comms);
        let labels: Vec<&str> = ordered.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["req1", "resp1", "req2", "resp2"]);
    }

    #[test]
    fn ordering_is_stable_for_equal_keys() {
        let comms = vec![
            comm(0, 0, "A", "B", "first", false),
            comm(0, 0, "A", "C", "second", false),
        ];
        let ordered = order_communications(&comms);
        assert_eq!(ordered[0].label, "first");
        assert_eq!(ordered[1].label, "second");
    }

    #[test]
    fn empty_communications_render_nothing() {
        let data = request_data(&["A", "B"], Vec::new());
        let result = layout(&data, &DiagramOptions::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn unknown_endpoint_fails_fast() {
        let data = request_data(&["A"], vec![comm(7, 0, "A", "ghost", "x", false)]);
        let err = layout(&data, &DiagramOptions::default()).unwrap_err();
        assert_eq!(
            err,
            LayoutError::UnknownEndpoint {
                name: "ghost".to_string(),
                index: 7,
            }
        );
    }

    #[test]
    fn layout_is_deterministic() {
        let mut data = request_data(
            &["A", "B", "C"],
            vec![
                comm(0, 0, "A", "B", "hello", false),
                comm(1, 250, "B", "C", "hi", false),
                comm(0, 1000, "B", "A", "hello", true),
            ],
        );
        data.errors.push(Annotation {
            timestamp: at_ms(500),
            message: "request validation failed on field 'user'".to_string(),
        });
        let options = DiagramOptions {
            show_errors: true,
            show_traces: false,
            timestamp_offsets: true,
        };

        let first = layout(&data, &options).unwrap().unwrap();
        let second = layout(&data, &options).unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn end_to_end_scenario_orders_rows_and_columns() {
        let data = request_data(
            &["A", "B", "C"],
            vec![
                comm(0, 0, "A", "B", "hello", false),
                comm(0, 1000, "B", "A", "hello", true),
                comm(1, 250, "B", "C", "hi", false),
            ],
        );
        let diagram = layout(&data, &DiagramOptions::default())
            .unwrap()
            .unwrap();

        assert_eq!(diagram.rows.len(), 3);
        assert_eq!(diagram.rows[0].timestamp, at_ms(0));
        assert_eq!(diagram.rows[1].timestamp, at_ms(250));
        assert_eq!(diagram.rows[2].timestamp, at_ms(1000));

        // three columns, centers strictly increasing left to right
        assert_eq!(diagram.headers.len(), 3);
        let centers: Vec<f32> = diagram
            .headers
            .iter()
            .map(|h| h.x + h.divider_x)
            .collect();
        assert!(centers[0] < centers[1] && centers[1] < centers[2]);

        // the response arrow is the only dashed row
        let dashed: Vec<bool> = diagram
            .rows
            .iter()
            .map(|row| match &row.body {
                RowBody::Arrow(arrow) => arrow.dashed,
                _ => false,
            })
            .collect();
        assert_eq!(dashed, vec![false, false, true]);
    }

    #[test]
    fn canvas_height_grows_with_each_added_row() {
        let mut comms = Vec::new();
        let mut last_height = 0.0_f32;
        for i in 0..4 {
            comms.push(comm(i, i * 100, "A", "B", "msg", false));
            let data = request_data(&["A", "B"], comms.clone());
            let diagram = layout(&data, &DiagramOptions::default())
                .unwrap()
                .unwrap();
            assert!(diagram.height > last_height);
            last_height = diagram.height;
        }
    }

    #[test]
    fn canvas_fits_margins_and_rows_of_varying_height() {
        let mut data = request_data(
            &["A", "B"],
            vec![
                comm(0, 0, "A", "B", "ping", false),
                comm(0, 400, "B", "A", "pong", true),
            ],
        );
        // five wrapped lines: well past the single-line arrow rows
        data.errors.push(Annotation {
            timestamp: at_ms(200),
            message: "word ".repeat(60),
        });
        let options = DiagramOptions {
            show_errors: true,
            ..DiagramOptions::default()
        };
        let diagram = layout(&data, &options).unwrap().unwrap();

        let banner = diagram
            .rows
            .iter()
            .find_map(|row| match &row.body {
                RowBody::Banner(banner) => Some(banner),
                _ => None,
            })
            .expect("banner row");
        assert!(banner.lines.len() >= 5);
        assert!(banner.rect_width > 0.0);
        let widest = banner.lines.iter().map(|l| l.width).fold(0.0, f32::max);
        assert_eq!(banner.rect_width, widest + BOX_PADDING * 2.0);

        // width covers the margin plus the widest row
        let widest_row = diagram.rows.iter().map(|r| r.width).fold(0.0, f32::max);
        assert!(diagram.width >= diagram.margin_x + widest_row);

        // height covers the top margin plus every row
        let row_sum: f32 = diagram
            .rows
            .iter()
            .map(|r| r.height.max(FONT_SIZE_LABEL) + BOX_PADDING)
            .sum();
        assert!(diagram.height >= diagram.margin_y + row_sum);

        // rows are not uniform and each starts where the previous ended
        let heights: Vec<f32> = diagram.rows.iter().map(|r| r.height).collect();
        assert!(heights.iter().any(|&h| h != heights[0]));
        for pair in diagram.rows.windows(2) {
            let expected = pair[0].y + pair[0].height.max(FONT_SIZE_LABEL) + BOX_PADDING;
            assert_eq!(pair[1].y, expected);
        }
    }

    #[test]
    fn loopback_produces_a_curve_with_finite_geometry() {
        let data = request_data(&["A", "C"], vec![comm(4, 0, "C", "C", "self", false)]);
        let diagram = layout(&data, &DiagramOptions::default())
            .unwrap()
            .unwrap();

        let RowBody::Loopback(loopback) = &diagram.rows[0].body else {
            panic!("expected a loopback row");
        };
        assert!(loopback.curve_width > 0.0);
        assert!(loopback.curve_rise > 0.0);
        assert!(loopback.x.is_finite() && loopback.label.x.is_finite());
        // label sits right of the column center
        assert!(loopback.label.x > loopback.x - loopback.label.text_width);
        let plain_center = (loopback.x * 2.0 - diagram.rows[0].width) / 2.0;
        assert!(loopback.label.x >= plain_center);
    }

    #[test]
    fn timeout_adds_a_cross_mark_at_the_midpoint() {
        let mut with_timeout = comm(0, 0, "A", "B", "slow", false);
        with_timeout.is_timeout = true;
        let data = request_data(&["A", "B"], vec![with_timeout]);
        let diagram = layout(&data, &DiagramOptions::default())
            .unwrap()
            .unwrap();

        let RowBody::Arrow(arrow) = &diagram.rows[0].body else {
            panic!("expected an arrow row");
        };
        let cross = arrow.timeout.as_ref().expect("cross mark");
        assert_eq!(cross.x, (arrow.source_x + arrow.dest_x) / 2.0);
        assert_eq!(cross.half_extent, FONT_SIZE_LABEL / 2.0);

        let data = request_data(&["A", "B"], vec![comm(0, 0, "A", "B", "fast", false)]);
        let diagram = layout(&data, &DiagramOptions::default())
            .unwrap()
            .unwrap();
        let RowBody::Arrow(arrow) = &diagram.rows[0].body else {
            panic!("expected an arrow row");
        };
        assert!(arrow.timeout.is_none());
    }

    #[test]
    fn labels_are_clamped_onto_the_canvas() {
        // a long label on a short column span pushes the centered position
        // negative; the clamp must pull it back to zero or more
        let data = request_data(
            &["A", "B"],
            vec![comm(
                0,
                0,
                "A",
                "B",
                "an exceedingly verbose label that dwarfs its columns",
                false,
            )],
        );
        let diagram = layout(&data, &DiagramOptions::default())
            .unwrap()
            .unwrap();

        let content_width = diagram.width - diagram.margin_x - SVG_PADDING * 2.0;
        let RowBody::Arrow(arrow) = &diagram.rows[0].body else {
            panic!("expected an arrow row");
        };
        assert!(arrow.label.x >= 0.0);
        assert!(arrow.label.x + diagram.rows[0].width <= content_width + 1e-3);
    }

    #[test]
    fn annotations_interleave_by_timestamp() {
        let mut data = request_data(
            &["A", "B"],
            vec![
                comm(0, 0, "A", "B", "req", false),
                comm(0, 1000, "B", "A", "resp", true),
            ],
        );
        data.errors.push(Annotation {
            timestamp: at_ms(500),
            message: "midway failure".to_string(),
        });
        data.traces.push(Annotation {
            timestamp: at_ms(1500),
            message: "late trace".to_string(),
        });
        let options = DiagramOptions {
            show_errors: true,
            show_traces: true,
            timestamp_offsets: false,
        };
        let diagram = layout(&data, &options).unwrap().unwrap();

        let kinds: Vec<&str> = diagram
            .rows
            .iter()
            .map(|row| match &row.body {
                RowBody::Arrow(_) => "arrow",
                RowBody::Loopback(_) => "loopback",
                RowBody::Banner(banner) => match banner.kind {
                    AnnotationKind::Error => "error",
                    AnnotationKind::Trace => "trace",
                },
            })
            .collect();
        assert_eq!(kinds, vec!["arrow", "error", "arrow", "trace"]);
    }

    #[test]
    fn hidden_annotations_are_left_out() {
        let mut data = request_data(&["A", "B"], vec![comm(0, 0, "A", "B", "req", false)]);
        data.errors.push(Annotation {
            timestamp: at_ms(100),
            message: "ignored".to_string(),
        });
        let diagram = layout(&data, &DiagramOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(diagram.rows.len(), 1);
    }

    #[test]
    fn timestamp_column_is_wide_enough_for_every_label() {
        let data = request_data(
            &["A", "B"],
            vec![
                comm(0, 0, "A", "B", "a", false),
                comm(0, 1_234_567, "B", "A", "b", true),
            ],
        );
        let options = DiagramOptions {
            timestamp_offsets: true,
            ..DiagramOptions::default()
        };
        let diagram = layout(&data, &options).unwrap().unwrap();

        assert_eq!(diagram.timestamps.len(), diagram.rows.len());
        let widest = diagram
            .timestamps
            .iter()
            .map(|t| t.width)
            .fold(0.0, f32::max);
        assert_eq!(diagram.margin_x, widest + BOX_PADDING * 4.0);
        // right-aligned: every label ends at the same column
        for label in &diagram.timestamps {
            assert_eq!(label.x + label.width, widest);
        }
        assert_eq!(diagram.timestamps[1].text, "1,234,567ms");
    }

    #[test]
    fn dividers_span_the_full_diagram_height() {
        let data = request_data(&["A", "B"], vec![comm(0, 0, "A", "B", "x", false)]);
        let diagram = layout(&data, &DiagramOptions::default())
            .unwrap()
            .unwrap();
        let content_height = diagram.height - diagram.margin_y - SVG_PADDING * 2.0;
        for header in &diagram.headers {
            assert_eq!(header.divider_bottom, content_height + diagram.margin_y);
        }
    }
}
