use std::fs;

use image::AnimationDecoder as _;
use image::codecs::gif::GifDecoder;

use vivicon::{
    AnimationRequest, IconRequest, OutputFormat, RenderOptions, ResvgRasterizer, generate_batch,
    generate_icon, read_batch_spec,
};

const SQUARE: &str = r#"<svg viewBox="0 0 24 24"><path d="M0 0h24v24H0z"/></svg>"#;

#[test]
fn animated_gif_renders_one_frame_per_sample() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("icon.gif");

    let mut request = IconRequest::new(SQUARE);
    request.size = 32;
    request.fps = 5;
    request.animation = Some(AnimationRequest::Shorthand("spin:1s".to_string()));
    request.background.color = Some("#204060".to_string());

    generate_icon(
        &request,
        OutputFormat::Gif,
        &path,
        &ResvgRasterizer,
        &RenderOptions::default(),
    )
    .unwrap();

    let bytes = fs::read(&path).unwrap();
    let decoder = GifDecoder::new(std::io::Cursor::new(bytes)).unwrap();
    let frames = decoder.into_frames().collect_frames().unwrap();
    assert_eq!(frames.len(), 5);
    for frame in &frames {
        let (numer, denom) = frame.delay().numer_denom_ms();
        assert_eq!(numer / denom, 200);
        assert_eq!(frame.buffer().width(), 32);
        assert_eq!(frame.buffer().height(), 32);
    }
}

#[test]
fn gif_without_animation_has_a_single_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("static.gif");

    let mut request = IconRequest::new(SQUARE);
    request.size = 24;
    generate_icon(
        &request,
        OutputFormat::Gif,
        &path,
        &ResvgRasterizer,
        &RenderOptions::default(),
    )
    .unwrap();

    let bytes = fs::read(&path).unwrap();
    let decoder = GifDecoder::new(std::io::Cursor::new(bytes)).unwrap();
    let frames = decoder.into_frames().collect_frames().unwrap();
    assert_eq!(frames.len(), 1);
}

#[test]
fn png_composites_the_icon_over_the_plate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("icon.png");

    let mut request = IconRequest::new(SQUARE);
    request.size = 64;
    request.background.color = Some("#ff0000".to_string());

    generate_icon(
        &request,
        OutputFormat::Png,
        &path,
        &ResvgRasterizer,
        &RenderOptions::default(),
    )
    .unwrap();

    let img = image::load_from_memory(&fs::read(&path).unwrap())
        .unwrap()
        .to_rgba8();
    assert_eq!(img.dimensions(), (64, 64));
    // The icon covers its whole view box, scaled to 70% of the canvas and
    // centered; the center is ink, the corner is plate.
    assert_eq!(img.get_pixel(32, 32).0, [0, 0, 0, 255]);
    assert_eq!(img.get_pixel(1, 1).0, [255, 0, 0, 255]);
}

#[test]
fn svg_file_sources_round_trip_with_recolor_and_animation() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("shape.svg");
    fs::write(&src, SQUARE).unwrap();
    let out = dir.path().join("shape-pulse.svg");

    let mut request = IconRequest::new(src.to_string_lossy().as_ref());
    request.size = 48;
    request.color = Some("(gold, purple)".to_string());
    request.animation = Some(AnimationRequest::Shorthand("pulse".to_string()));

    generate_icon(
        &request,
        OutputFormat::Svg,
        &out,
        &ResvgRasterizer,
        &RenderOptions::default(),
    )
    .unwrap();

    let markup = fs::read_to_string(&out).unwrap();
    assert!(markup.contains("iconGradient"));
    assert!(markup.contains("<animateTransform"));
    assert!(markup.contains(r#"dur="1.5s""#));
    assert!(markup.contains(r#"viewBox="0 0 48 48""#));
}

#[test]
fn batch_honors_per_entry_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("shape.svg");
    fs::write(&src, SQUARE).unwrap();
    let out_dir = dir.path().join("out");

    let batch_path = dir.path().join("batch.json");
    fs::write(
        &batch_path,
        format!(
            r#"{{
                "size": 40,
                "icons": [
                    {{"source": "{src}", "name": "big", "size": 64, "format": "png"}},
                    "{src}"
                ]
            }}"#,
            src = src.to_string_lossy()
        ),
    )
    .unwrap();
    let batch = read_batch_spec(&batch_path).unwrap();

    let report = generate_batch(
        &batch,
        &out_dir,
        &ResvgRasterizer,
        &RenderOptions::default(),
    )
    .unwrap();
    assert_eq!(report.written(), 2);
    assert_eq!(report.failed(), 0);

    let png = image::load_from_memory(&fs::read(out_dir.join("big.png")).unwrap()).unwrap();
    assert_eq!(png.width(), 64);
    assert!(out_dir.join("shape.svg").exists());
}
