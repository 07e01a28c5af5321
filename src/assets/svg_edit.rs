//! Source markup editing: canvas normalization, recoloring, SMIL removal,
//! and the background wrap for vector output.
//!
//! Every editor here is a pure string rewrite over the markup event stream,
//! and every one degrades the same way: markup that does not parse comes
//! back unchanged (with a warning) instead of failing the request. Outputs
//! that reach the rasterizer get their namespace and viewBox normalized
//! first, so hand-typed inline markup renders the same as a file on disk.

use kurbo::Rect;
use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::assets::color;
use crate::model::BackgroundStyle;
use crate::render::backdrop::GradientDirection;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Gradient paint injected by a gradient recolor.
const ICON_GRADIENT_ID: &str = "iconGradient";
/// Gradient paint referenced by the background plate.
const BACKDROP_GRADIENT_ID: &str = "bgGradient";

/// Elements that carry paint and take part in recoloring.
const VISUAL_TAGS: [&[u8]; 9] = [
    b"path",
    b"circle",
    b"rect",
    b"polygon",
    b"ellipse",
    b"polyline",
    b"line",
    b"text",
    b"g",
];

/// SMIL animation elements; their subtrees are never recolored and they are
/// removed outright before frame sampling.
const ANIMATION_TAGS: [&[u8]; 4] = [b"animate", b"animateTransform", b"animateMotion", b"set"];

/// Fraction of the wrapped canvas the icon occupies.
const ICON_FIT: f64 = 0.7;

/// Set the root width/height to `size`, deriving a viewBox from the
/// declared dimensions first when one is missing, and declaring the SVG
/// namespace when the root carries none.
pub fn normalize_canvas(svg: &str, size: u32) -> String {
    match try_normalize_canvas(svg, size) {
        Some(out) => out,
        None => {
            tracing::warn!("markup does not parse, leaving canvas untouched");
            svg.to_string()
        }
    }
}

fn try_normalize_canvas(svg: &str, size: u32) -> Option<String> {
    let events = collect_events(svg)?;
    let mut out = Vec::with_capacity(events.len());
    let mut depth = 0usize;
    let mut seen_root = false;

    for ev in events {
        match ev {
            Event::Start(e) => {
                if depth == 0 && !seen_root {
                    seen_root = true;
                    out.push(Event::Start(resized_root(&e, size)?));
                } else {
                    out.push(Event::Start(e));
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if depth == 0 && !seen_root {
                    seen_root = true;
                    out.push(Event::Empty(resized_root(&e, size)?));
                } else {
                    out.push(Event::Empty(e));
                }
            }
            Event::End(e) => {
                depth = depth.checked_sub(1)?;
                out.push(Event::End(e));
            }
            ev => out.push(ev),
        }
    }

    if !seen_root {
        return None;
    }
    write_events(out)
}

/// Rebuild the root element with normalized dimensions. Attributes other
/// than viewBox/width/height pass through in order.
fn resized_root(root: &BytesStart<'_>, size: u32) -> Option<BytesStart<'static>> {
    let mut kept: Vec<(String, String)> = Vec::new();
    let mut view_box = None;
    let mut width = String::from("24");
    let mut height = String::from("24");
    let mut has_ns = false;

    for attr in root.attributes() {
        let attr = attr.ok()?;
        let key = String::from_utf8(attr.key.as_ref().to_vec()).ok()?;
        let value = attr.unescape_value().ok()?.into_owned();
        match key.as_str() {
            "viewBox" => view_box = Some(value),
            "width" => width = value,
            "height" => height = value,
            _ => {
                if key == "xmlns" {
                    has_ns = true;
                }
                kept.push((key, value));
            }
        }
    }

    let view_box =
        view_box.unwrap_or_else(|| format!("0 0 {} {}", numeric(&width), numeric(&height)));
    let size = size.to_string();

    let name = String::from_utf8(root.name().as_ref().to_vec()).ok()?;
    let mut el = BytesStart::new(name);
    if !has_ns {
        el.push_attribute(("xmlns", SVG_NS));
    }
    for (key, value) in &kept {
        el.push_attribute((key.as_str(), value.as_str()));
    }
    el.push_attribute(("viewBox", view_box.as_str()));
    el.push_attribute(("width", size.as_str()));
    el.push_attribute(("height", size.as_str()));
    Some(el)
}

/// Numeric part of a dimension, so `"24px"` contributes `24` to a derived
/// viewBox. Dimensions with no digits at all fall back to 24.
fn numeric(value: &str) -> String {
    let digits: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if digits.is_empty() { "24".to_string() } else { digits }
}

/// Recolor fills and strokes to a single paint.
///
/// A `(start,end)` pair recolors to an injected linear gradient instead of
/// a flat color. The rewrite follows the markup conventions of icon sets:
///
/// - explicit `none`, `transparent`, and `currentColor` fills stay, so
///   knockout holes survive the recolor;
/// - leaf shapes without a fill attribute get one (the implicit black
///   default), while bare `<g>` containers are left to inherit;
/// - strokes are recolored only where one is already set;
/// - SMIL elements and their subtrees pass through untouched, and `<style>`
///   blocks that set fills are dropped so they cannot override the rewrite.
pub fn recolor(svg: &str, color: &str, direction: GradientDirection) -> String {
    match try_recolor(svg, color, direction) {
        Some(out) => out,
        None => {
            tracing::warn!("markup does not parse, leaving colors untouched");
            svg.to_string()
        }
    }
}

fn try_recolor(svg: &str, color: &str, direction: GradientDirection) -> Option<String> {
    let (paint, gradient) = match color::gradient_components(color) {
        Some((start, end)) => (
            format!("url(#{ICON_GRADIENT_ID})"),
            Some((start.to_string(), end.to_string())),
        ),
        None => (color.trim().to_string(), None),
    };
    if paint.is_empty() {
        return Some(svg.to_string());
    }

    let events = collect_events(svg)?;
    let mut out = Vec::with_capacity(events.len() + 8);
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut i = 0;

    while i < events.len() {
        match &events[i] {
            Event::Start(e) => {
                if depth == 0 && !seen_root {
                    seen_root = true;
                    depth += 1;
                    out.push(events[i].clone());
                    if let Some((start, end)) = &gradient {
                        out.extend(gradient_def_events(ICON_GRADIENT_ID, start, end, direction));
                    }
                    i += 1;
                    continue;
                }
                let name = local_name(e);
                if name == b"style" {
                    let end = matching_end(&events, i)?;
                    if !span_mentions_fill(&events[i..=end]) {
                        out.extend(events[i..=end].iter().cloned());
                    }
                    i = end + 1;
                    continue;
                }
                if is_animation_tag(&name) {
                    let end = matching_end(&events, i)?;
                    out.extend(events[i..=end].iter().cloned());
                    i = end + 1;
                    continue;
                }
                if is_visual_tag(&name) {
                    out.push(Event::Start(recolored(e, &name, &paint)?));
                } else {
                    out.push(events[i].clone());
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if depth == 0 {
                    // Self-closing root: nothing to recolor.
                    if seen_root {
                        return None;
                    }
                    seen_root = true;
                    out.push(events[i].clone());
                    i += 1;
                    continue;
                }
                let name = local_name(e);
                if is_visual_tag(&name) {
                    out.push(Event::Empty(recolored(e, &name, &paint)?));
                } else {
                    out.push(events[i].clone());
                }
            }
            Event::End(e) => {
                depth = depth.checked_sub(1)?;
                out.push(Event::End(e.clone()));
            }
            ev => out.push(ev.clone()),
        }
        i += 1;
    }

    if !seen_root {
        return None;
    }
    write_events(out)
}

fn recolored(e: &BytesStart<'_>, name: &[u8], paint: &str) -> Option<BytesStart<'static>> {
    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut has_fill = false;

    for attr in e.attributes() {
        let attr = attr.ok()?;
        let key = String::from_utf8(attr.key.as_ref().to_vec()).ok()?;
        let mut value = attr.unescape_value().ok()?.into_owned();
        match key.as_str() {
            "fill" => {
                has_fill = true;
                if !keeps_paint(&value) {
                    value = paint.to_string();
                }
            }
            // `stroke="none"` stays none; `currentColor` strokes recolor,
            // matching the fill-centric conventions of icon sets.
            "stroke" => {
                let lower = value.to_ascii_lowercase();
                if lower != "none" && lower != "transparent" {
                    value = paint.to_string();
                }
            }
            _ => {}
        }
        attrs.push((key, value));
    }

    if !has_fill && name != b"g" {
        attrs.push(("fill".to_string(), paint.to_string()));
    }

    let tag = String::from_utf8(e.name().as_ref().to_vec()).ok()?;
    let mut el = BytesStart::new(tag);
    for (key, value) in &attrs {
        el.push_attribute((key.as_str(), value.as_str()));
    }
    Some(el)
}

/// Fill values the recolor must not clobber.
fn keeps_paint(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "none" | "transparent" | "currentcolor"
    )
}

/// Remove SMIL animation elements so frame sampling sees the static pose
/// instead of a double-animated sprite.
pub fn strip_animation(svg: &str) -> String {
    match try_strip_animation(svg) {
        Some(out) => out,
        None => {
            tracing::warn!("markup does not parse, leaving animation elements in place");
            svg.to_string()
        }
    }
}

fn try_strip_animation(svg: &str) -> Option<String> {
    let events = collect_events(svg)?;
    let mut out = Vec::with_capacity(events.len());
    let mut i = 0;

    while i < events.len() {
        match &events[i] {
            Event::Start(e) if is_animation_tag(&local_name(e)) => {
                i = matching_end(&events, i)? + 1;
            }
            Event::Empty(e) if is_animation_tag(&local_name(e)) => i += 1,
            ev => {
                out.push(ev.clone());
                i += 1;
            }
        }
    }
    write_events(out)
}

/// Wrap icon markup in a new document with a background plate behind it.
///
/// The plate rect is inset by half the outline stroke so the outline never
/// clips at the canvas edge, and its corner radius shrinks by the same
/// amount to keep the outer silhouette at the requested radius. The icon
/// lands centered, scaled to 70% of the canvas.
pub fn wrap_with_background(svg: &str, size: u32, style: &BackgroundStyle) -> String {
    let (bounds, inner) = view_bounds_and_inner(svg);

    let mut gradient_def = String::new();
    let fill = match style.fill_color() {
        None => "none".to_string(),
        Some(raw) => match color::gradient_components(raw) {
            Some((start, end)) => {
                gradient_def =
                    linear_gradient_def(BACKDROP_GRADIENT_ID, start, end, style.direction);
                format!("url(#{BACKDROP_GRADIENT_ID})")
            }
            None => raw.to_string(),
        },
    };

    let outline = style.outline();
    let outline_width = outline.map_or(0.0, |(_, width)| width);
    let half_stroke = outline_width * 0.5;
    let rect_size = f64::from(size) - outline_width;
    let rect_radius = (style.corner_radius - half_stroke).max(0.0);
    let outline_attrs = outline.map_or_else(String::new, |(color, width)| {
        format!(r#" stroke="{}" stroke-width="{width}""#, escape(color))
    });

    let scale = f64::from(size) / bounds.width().max(bounds.height()) * ICON_FIT;
    let center = bounds.center();
    let half = f64::from(size) / 2.0;

    format!(
        r#"<svg xmlns="{SVG_NS}" width="{size}" height="{size}" viewBox="0 0 {size} {size}">{gradient_def}<rect x="{half_stroke}" y="{half_stroke}" width="{rect_size}" height="{rect_size}" rx="{rect_radius}" ry="{rect_radius}" fill="{}"{outline_attrs}/><g transform="translate({half},{half}) scale({scale}) translate({},{})">{inner}</g></svg>"#,
        escape(&fill),
        -center.x,
        -center.y,
    )
}

/// View bounds of the root plus its serialized children. Markup that does
/// not parse keeps default icon bounds and is embedded verbatim rather
/// than dropped.
fn view_bounds_and_inner(svg: &str) -> (Rect, String) {
    match try_view_bounds_and_inner(svg) {
        Some(parts) => parts,
        None => {
            tracing::warn!("markup does not parse, embedding it verbatim");
            (Rect::new(0.0, 0.0, 24.0, 24.0), svg.to_string())
        }
    }
}

fn try_view_bounds_and_inner(svg: &str) -> Option<(Rect, String)> {
    let events = collect_events(svg)?;

    let mut root = None;
    for (i, ev) in events.iter().enumerate() {
        match ev {
            Event::Start(e) => {
                root = Some((e.clone(), i, matching_end(&events, i)?));
                break;
            }
            Event::Empty(e) => {
                root = Some((e.clone(), i, i));
                break;
            }
            Event::End(_) => return None,
            _ => {}
        }
    }
    let (root, start, end) = root?;

    let bounds = root_view_bounds(&root);
    let inner = if start == end {
        String::new()
    } else {
        write_events(events[start + 1..end].to_vec())?
    };
    Some((bounds, inner))
}

/// The root viewBox, defaulting to `0 0 24 24` when missing or malformed.
fn root_view_bounds(root: &BytesStart<'_>) -> Rect {
    let fallback = Rect::new(0.0, 0.0, 24.0, 24.0);
    let Some(raw) = attr_value(root, b"viewBox") else {
        return fallback;
    };
    let nums: Vec<f64> = raw.split_whitespace().filter_map(|n| n.parse().ok()).collect();
    if nums.len() != 4 || raw.split_whitespace().count() != 4 {
        return fallback;
    }
    let (x, y, w, h) = (nums[0], nums[1], nums[2], nums[3]);
    if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
        return fallback;
    }
    Rect::new(x, y, x + w, y + h)
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}

fn linear_gradient_def(id: &str, start: &str, end: &str, direction: GradientDirection) -> String {
    write_events(gradient_def_events(id, start, end, direction)).unwrap_or_default()
}

/// `<defs>` holding a two-stop linear gradient along the direction axis.
fn gradient_def_events(
    id: &str,
    start: &str,
    end: &str,
    direction: GradientDirection,
) -> Vec<Event<'static>> {
    let (x2, y2) = match direction {
        GradientDirection::Horizontal => ("100%", "0%"),
        GradientDirection::Vertical => ("0%", "100%"),
        GradientDirection::Diagonal => ("100%", "100%"),
    };

    let mut lg = BytesStart::new("linearGradient");
    lg.push_attribute(("id", id));
    lg.push_attribute(("x1", "0%"));
    lg.push_attribute(("y1", "0%"));
    lg.push_attribute(("x2", x2));
    lg.push_attribute(("y2", y2));

    let mut first = BytesStart::new("stop");
    first.push_attribute(("offset", "0%"));
    first.push_attribute(("stop-color", start));
    first.push_attribute(("stop-opacity", "1"));

    let mut last = BytesStart::new("stop");
    last.push_attribute(("offset", "100%"));
    last.push_attribute(("stop-color", end));
    last.push_attribute(("stop-opacity", "1"));

    vec![
        Event::Start(BytesStart::new("defs")),
        Event::Start(lg),
        Event::Empty(first),
        Event::Empty(last),
        Event::End(BytesEnd::new("linearGradient")),
        Event::End(BytesEnd::new("defs")),
    ]
}

fn is_visual_tag(name: &[u8]) -> bool {
    VISUAL_TAGS.contains(&name)
}

fn is_animation_tag(name: &[u8]) -> bool {
    ANIMATION_TAGS.contains(&name)
}

/// True when any text or CDATA in the span sets a fill.
fn span_mentions_fill(events: &[Event<'static>]) -> bool {
    events.iter().any(|ev| match ev {
        Event::Text(t) => contains_bytes(t.as_ref(), b"fill"),
        Event::CData(t) => contains_bytes(t.as_ref(), b"fill"),
        _ => false,
    })
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn local_name(e: &BytesStart<'_>) -> Vec<u8> {
    e.name().local_name().as_ref().to_vec()
}

/// Index of the `End` closing the `Start` at `start`.
fn matching_end(events: &[Event<'static>], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ev) in events.iter().enumerate().skip(start) {
        match ev {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn collect_events(svg: &str) -> Option<Vec<Event<'static>>> {
    let mut reader = Reader::from_str(svg);
    let mut events = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(ev) => events.push(ev.into_owned()),
            Err(_) => return None,
        }
    }
    Some(events)
}

fn write_events(events: Vec<Event<'static>>) -> Option<String> {
    let mut writer = Writer::new(std::io::Cursor::new(Vec::new()));
    for ev in events {
        writer.write_event(ev).ok()?;
    }
    String::from_utf8(writer.into_inner().into_inner()).ok()
}
