//! SVG-native animation embedding.
//!
//! Inserts a SMIL `<animateTransform>` for an [`AnimationSpec`] into icon
//! markup so the same timing model previews natively in a browser. The
//! rewrite works on the markup event stream:
//!
//! 1. Scan the document shape (root element, direct children, view bounds).
//! 2. Pick the animation target: the first `<g>` child, or a synthesized
//!    group wrapping every non-`defs` child (animations must target a
//!    container, never bare leaf shapes).
//! 3. Splice the transform in: directly for spin, inside a nested
//!    animation group with an explicit center pivot for pulse and flip.
//!
//! Any malformed input short-circuits to returning the input unchanged;
//! this path never errors.

use kurbo::Point;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::animation::preset::{AnimationPreset, AnimationSpec};
use crate::animation::track::{self, Keyframe, TransformTrack};

/// Apply an animation token (e.g. `"spin:2s"`) to icon markup.
///
/// Unknown presets and malformed markup return the input byte-identical.
pub fn animate_markup(svg: &str, animation: &str) -> String {
    match AnimationSpec::parse(animation) {
        Some(spec) => embed_animation(svg, &spec),
        None => svg.to_string(),
    }
}

/// Embed the SMIL transform for a resolved spec. Malformed markup returns
/// the input unchanged.
pub fn embed_animation(svg: &str, spec: &AnimationSpec) -> String {
    match try_embed(svg, spec) {
        Some(out) => out,
        None => {
            tracing::debug!("markup not animatable, returning input unchanged");
            svg.to_string()
        }
    }
}

fn try_embed(svg: &str, spec: &AnimationSpec) -> Option<String> {
    let events = collect_events(svg)?;
    let shape = scan(&events)?;

    let Event::Start(root) = &events[shape.root_start] else {
        return None;
    };
    let center = root_center(root)?;

    let anim = animate_transform_event(spec, center);
    // Pulse and flip animate a nested sub-layer so a pre-existing layout
    // transform on the target group is never clobbered.
    let inner = if spec.preset() == AnimationPreset::Spin {
        None
    } else {
        Some(animation_group(center))
    };

    let rebuilt = if let Some(group) = shape.children.iter().find(|c| c.name == b"g") {
        rebuild_into_group(&events, group, inner, anim)?
    } else {
        let visuals: Vec<(usize, usize)> = shape
            .children
            .iter()
            .filter(|c| c.name != b"defs")
            .map(|c| (c.start, c.end))
            .collect();
        if visuals.is_empty() {
            return None;
        }
        rebuild_with_wrap(&events, &shape, &visuals, inner, anim)
    };

    write_events(rebuilt)
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

/// Direct child element of the document root: inclusive event span plus
/// its local tag name.
struct ChildSpan {
    start: usize,
    end: usize,
    name: Vec<u8>,
}

struct DocShape {
    root_start: usize,
    root_end: usize,
    children: Vec<ChildSpan>,
}

/// Locate the root element and its direct children, rejecting anything
/// structurally unsound (unbalanced tags, multiple roots, stray text).
/// `None` also covers documents with nothing to animate.
fn scan(events: &[Event<'static>]) -> Option<DocShape> {
    let mut root_start = None;
    let mut root_end = None;
    let mut children = Vec::new();
    let mut open_child: Option<(usize, Vec<u8>)> = None;
    let mut depth = 0usize;

    for (i, ev) in events.iter().enumerate() {
        match ev {
            Event::Start(e) => {
                if depth == 0 {
                    if root_start.is_some() {
                        return None;
                    }
                    root_start = Some(i);
                } else if depth == 1 && open_child.is_none() {
                    open_child = Some((i, local_name(e)));
                }
                depth += 1;
            }
            Event::End(_) => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
                if depth == 0 {
                    root_end = Some(i);
                } else if depth == 1
                    && let Some((start, name)) = open_child.take()
                {
                    children.push(ChildSpan {
                        start,
                        end: i,
                        name,
                    });
                }
            }
            Event::Empty(e) => {
                if depth == 0 {
                    if root_start.is_some() {
                        return None;
                    }
                    // Self-closing root: no children, nothing to animate.
                    return None;
                } else if depth == 1 {
                    children.push(ChildSpan {
                        start: i,
                        end: i,
                        name: local_name(e),
                    });
                }
            }
            Event::Text(t) => {
                if depth == 0 && !t.as_ref().iter().all(u8::is_ascii_whitespace) {
                    return None;
                }
            }
            _ => {}
        }
    }

    if depth != 0 || children.is_empty() {
        return None;
    }
    Some(DocShape {
        root_start: root_start?,
        root_end: root_end?,
        children,
    })
}

fn local_name(e: &BytesStart<'_>) -> Vec<u8> {
    e.name().local_name().as_ref().to_vec()
}

/// Pivot for rotation and scale: viewBox center when present, else half of
/// the declared width/height (default 24), else the origin.
fn root_center(root: &BytesStart<'_>) -> Option<Point> {
    let mut view_box = None;
    let mut width = String::from("24");
    let mut height = String::from("24");

    for attr in root.attributes() {
        let attr = attr.ok()?;
        let value = attr.unescape_value().ok()?;
        match attr.key.as_ref() {
            b"viewBox" => view_box = Some(value.into_owned()),
            b"width" => width = value.into_owned(),
            b"height" => height = value.into_owned(),
            _ => {}
        }
    }

    if let Some(vb) = view_box
        && !vb.trim().is_empty()
    {
        let nums: Vec<f64> = vb
            .split_whitespace()
            .filter_map(|n| n.parse().ok())
            .collect();
        if nums.len() == 4 && vb.split_whitespace().count() == 4 {
            return Some(Point::new(nums[0] + nums[2] / 2.0, nums[1] + nums[3] / 2.0));
        }
        return Some(Point::ORIGIN);
    }

    match (width.trim().parse::<f64>(), height.trim().parse::<f64>()) {
        (Ok(w), Ok(h)) => Some(Point::new(w / 2.0, h / 2.0)),
        _ => Some(Point::ORIGIN),
    }
}

/// The nested `<g>` that hosts scale animations, pivoting about the icon
/// center instead of the viewport's top-left default.
fn animation_group(center: Point) -> BytesStart<'static> {
    let mut g = BytesStart::new("g");
    g.push_attribute(("transform-box", "view-box"));
    g.push_attribute((
        "transform-origin",
        format!("{}px {}px", center.x, center.y).as_str(),
    ));
    g
}

fn animate_transform_event(spec: &AnimationSpec, center: Point) -> Event<'static> {
    let mut el = BytesStart::new("animateTransform");
    el.push_attribute(("attributeName", "transform"));
    el.push_attribute(("attributeType", "XML"));

    match track::synthesize(spec.preset()) {
        TransformTrack::Rotate(rotation) => {
            let keys = rotation.keys();
            let first = keys[0].value;
            let last = keys[keys.len() - 1].value;
            el.push_attribute(("type", "rotate"));
            el.push_attribute((
                "from",
                format!("{first} {} {}", center.x, center.y).as_str(),
            ));
            el.push_attribute(("to", format!("{last} {} {}", center.x, center.y).as_str()));
            el.push_attribute(("dur", spec.duration_token()));
            el.push_attribute(("repeatCount", "indefinite"));
            el.push_attribute(("calcMode", "linear"));
        }
        TransformTrack::Scale(scale) => {
            let keys = scale.keys();
            el.push_attribute(("type", "scale"));
            el.push_attribute(("values", scale_values(keys).as_str()));
            el.push_attribute(("keyTimes", key_times(keys, spec.preset().is_flip()).as_str()));
            let dur = if spec.preset().is_flip() {
                format!("{:.3}s", spec.total_cycle_secs())
            } else {
                spec.duration_token().to_string()
            };
            el.push_attribute(("dur", dur.as_str()));
            el.push_attribute(("repeatCount", "indefinite"));
            el.push_attribute(("calcMode", "spline"));
            if let Some(splines) = key_splines(keys) {
                el.push_attribute(("keySplines", splines.as_str()));
            }
        }
    }

    Event::Empty(el)
}

fn scale_values(keys: &[Keyframe<kurbo::Vec2>]) -> String {
    keys.iter()
        .map(|k| format!("{} {}", k.value.x, k.value.y))
        .collect::<Vec<_>>()
        .join(";")
}

fn key_times(keys: &[Keyframe<kurbo::Vec2>], precise: bool) -> String {
    keys.iter()
        .map(|k| {
            if precise {
                format!("{:.6}", k.t)
            } else {
                k.t.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// One spline per segment; `None` when any segment is not spline-eased.
fn key_splines(keys: &[Keyframe<kurbo::Vec2>]) -> Option<String> {
    let segments = keys.len().saturating_sub(1);
    let splines: Vec<String> = keys[..segments]
        .iter()
        .filter_map(|k| k.ease.key_spline())
        .collect();
    (splines.len() == segments).then(|| splines.join(";"))
}

/// Splice the animation into an existing `<g>` child.
fn rebuild_into_group(
    events: &[Event<'static>],
    group: &ChildSpan,
    inner: Option<BytesStart<'static>>,
    anim: Event<'static>,
) -> Option<Vec<Event<'static>>> {
    let mut out = Vec::with_capacity(events.len() + 4);

    if group.start == group.end {
        // Self-closing <g/>: reopen it so it can host content.
        let Event::Empty(g) = &events[group.start] else {
            return None;
        };
        let close = String::from_utf8(g.name().as_ref().to_vec()).ok()?;
        out.extend(events[..group.start].iter().cloned());
        out.push(Event::Start(g.clone()));
        push_animation(&mut out, inner, anim);
        out.push(Event::End(BytesEnd::new(close)));
        out.extend(events[group.start + 1..].iter().cloned());
    } else {
        out.extend(events[..=group.start].iter().cloned());
        if let Some(ig) = &inner {
            out.push(Event::Start(ig.clone()));
        }
        out.extend(events[group.start + 1..group.end].iter().cloned());
        match inner {
            Some(_) => {
                out.push(anim);
                out.push(Event::End(BytesEnd::new("g")));
            }
            None => out.push(anim),
        }
        out.extend(events[group.end..].iter().cloned());
    }

    Some(out)
}

/// No group to target: move every non-`defs` child into a synthesized
/// `<g>` appended at the end of the root, keeping `defs` (and loose
/// comments/whitespace) in place.
fn rebuild_with_wrap(
    events: &[Event<'static>],
    shape: &DocShape,
    visuals: &[(usize, usize)],
    inner: Option<BytesStart<'static>>,
    anim: Event<'static>,
) -> Vec<Event<'static>> {
    let mut out = Vec::with_capacity(events.len() + 4);
    out.extend(events[..=shape.root_start].iter().cloned());

    let mut vi = 0;
    let mut i = shape.root_start + 1;
    while i < shape.root_end {
        if vi < visuals.len() && i == visuals[vi].0 {
            i = visuals[vi].1 + 1;
            vi += 1;
            continue;
        }
        out.push(events[i].clone());
        i += 1;
    }

    out.push(Event::Start(BytesStart::new("g")));
    let has_inner = inner.is_some();
    if let Some(ig) = inner {
        out.push(Event::Start(ig));
    }
    for &(s, e) in visuals {
        out.extend(events[s..=e].iter().cloned());
    }
    out.push(anim);
    if has_inner {
        out.push(Event::End(BytesEnd::new("g")));
    }
    out.push(Event::End(BytesEnd::new("g")));
    out.extend(events[shape.root_end..].iter().cloned());
    out
}

fn push_animation(
    out: &mut Vec<Event<'static>>,
    inner: Option<BytesStart<'static>>,
    anim: Event<'static>,
) {
    match inner {
        Some(ig) => {
            out.push(Event::Start(ig));
            out.push(anim);
            out.push(Event::End(BytesEnd::new("g")));
        }
        None => out.push(anim),
    }
}

fn write_events(events: Vec<Event<'static>>) -> Option<String> {
    let mut writer = Writer::new(std::io::Cursor::new(Vec::new()));
    for ev in events {
        writer.write_event(ev).ok()?;
    }
    String::from_utf8(writer.into_inner().into_inner()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = r#"<svg viewBox="0 0 24 24"><path d="M0 0h24v24H0z"/></svg>"#;

    #[test]
    fn spin_inserts_a_rotate_transform_about_the_center() {
        let out = animate_markup(SIMPLE, "spin:1s");
        assert!(out.contains("animateTransform"));
        assert!(out.contains(r#"type="rotate""#));
        assert!(out.contains(r#"from="0 12 12""#));
        assert!(out.contains(r#"to="360 12 12""#));
        assert!(out.contains(r#"dur="1s""#));
        assert!(out.contains(r#"calcMode="linear""#));
    }

    #[test]
    fn spin_without_duration_uses_the_preset_default() {
        let out = animate_markup(SIMPLE, "spin");
        assert!(out.contains(r#"dur="4s""#));
    }

    #[test]
    fn bare_primitives_are_wrapped_in_a_group() {
        let out = animate_markup(SIMPLE, "spin:1s");
        let g = out.find("<g>").unwrap();
        let path = out.find("<path").unwrap();
        let anim = out.find("<animateTransform").unwrap();
        let close = out.find("</g>").unwrap();
        assert!(g < path && path < anim && anim < close);
    }

    #[test]
    fn existing_group_hosts_the_animation() {
        let svg = r#"<svg viewBox="0 0 24 24"><g id="existing"><path d="M0 0h24v24H0z"/></g></svg>"#;
        let out = animate_markup(svg, "spin:1s");
        let g = out.find(r#"<g id="existing""#).unwrap();
        let anim = out.find("<animateTransform").unwrap();
        let close = out.find("</g>").unwrap();
        assert!(g < anim && anim < close);
    }

    #[test]
    fn defs_stay_outside_the_synthesized_group() {
        let svg = r#"<svg viewBox="0 0 24 24"><defs><linearGradient id="lg"/></defs><path d="M0 0h24v24H0z"/></svg>"#;
        let out = animate_markup(svg, "spin:1s");
        let defs = out.find("<defs>").unwrap();
        let g = out.find("<g>").unwrap();
        assert!(defs < g);
        // the path moved inside the group
        assert!(out.find("<path").unwrap() > g);
    }

    #[test]
    fn pulse_nests_an_animation_group_with_a_center_pivot() {
        let out = animate_markup(SIMPLE, "pulse:1s");
        assert!(out.contains(r#"transform-box="view-box""#));
        assert!(out.contains(r#"transform-origin="12px 12px""#));
        assert!(out.contains(r#"type="scale""#));
        assert!(out.contains(r#"values="1 1;0.1 0.1;1 1""#));
        assert!(out.contains(r#"keyTimes="0;0.5;1""#));
        assert!(out.contains(r#"calcMode="spline""#));
        assert!(out.contains(r#"keySplines="0.42 0 0.58 1;0.42 0 0.58 1""#));
    }

    #[test]
    fn flip_writes_the_seven_point_track_over_the_ten_x_cycle() {
        let out = animate_markup(SIMPLE, "flip-h:1s");
        assert!(out.contains(r#"values="1 1;1 1;-1 1;1 1;1 1;-1 1;1 1""#));
        assert!(out.contains(
            r#"keyTimes="0.000000;0.400000;0.450000;0.500000;0.900000;0.950000;1.000000""#
        ));
        assert!(out.contains(r#"dur="10.000s""#));
    }

    #[test]
    fn flip_vertical_inverts_the_y_axis() {
        let out = animate_markup(SIMPLE, "flip-v:1s");
        assert!(out.contains(r#"values="1 1;1 1;1 -1;1 1;1 1;1 -1;1 1""#));
    }

    #[test]
    fn missing_viewbox_derives_the_center_from_width_height() {
        let svg = r#"<svg width="48" height="48"><path d="M0 0h24v24H0z"/></svg>"#;
        let out = animate_markup(svg, "pulse:1s");
        assert!(out.contains(r#"transform-origin="24px 24px""#));
    }

    #[test]
    fn unparseable_dimensions_fall_back_to_the_origin() {
        let svg = r#"<svg width="wide" height="48"><path d="M0 0h24v24H0z"/></svg>"#;
        let out = animate_markup(svg, "spin:1s");
        assert!(out.contains(r#"from="0 0 0""#));
    }

    #[test]
    fn unknown_preset_passes_through_byte_identical() {
        assert_eq!(animate_markup(SIMPLE, "wobble:2s"), SIMPLE);
        assert_eq!(animate_markup(SIMPLE, ""), SIMPLE);
    }

    #[test]
    fn malformed_markup_passes_through_byte_identical() {
        let bad = "not valid xml <svg";
        assert_eq!(animate_markup(bad, "spin:1s"), bad);
        let unbalanced = "<svg><g></svg>";
        assert_eq!(animate_markup(unbalanced, "spin:1s"), unbalanced);
    }

    #[test]
    fn childless_markup_passes_through() {
        let empty = r#"<svg viewBox="0 0 24 24"/>"#;
        assert_eq!(animate_markup(empty, "spin:1s"), empty);
        let defs_only = r#"<svg viewBox="0 0 24 24"><defs/></svg>"#;
        assert_eq!(animate_markup(defs_only, "pulse"), defs_only);
    }

    #[test]
    fn embedded_output_stays_parseable() {
        for token in ["spin:2s", "pulse", "flip-h:250ms", "flip-v"] {
            let out = animate_markup(SIMPLE, token);
            assert!(collect_events(&out).is_some(), "{token} broke the markup");
        }
    }
}
