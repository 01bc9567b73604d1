//! Blend semantics across formats: blit idempotence, alpha round trips,
//! table-exact blending, cache determinism.

use framemix::{
    BlendTables, ByteOrder, Component, FormatSpec, Fps, PixelFormat, VideoCaps, VideoMixer,
    VideoPacket, WordDepth,
};

fn packet(format: PixelFormat, w: u32, h: u32) -> VideoPacket {
    VideoPacket::new(VideoCaps::new(format, w, h, Fps::new(30, 1).unwrap())).unwrap()
}

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn sample_offset(c: &Component, x: usize) -> usize {
    c.offset + ((x >> c.width_div) * c.step)
}

fn read_word(spec: &FormatSpec, line: &[u8], off: usize) -> u64 {
    match (spec.word, spec.byte_order) {
        (WordDepth::Bits8, _) => u64::from(line[off]),
        (WordDepth::Bits16, ByteOrder::LittleEndian) => {
            u64::from(u16::from_le_bytes([line[off], line[off + 1]]))
        }
        (WordDepth::Bits16, ByteOrder::BigEndian) => {
            u64::from(u16::from_be_bytes([line[off], line[off + 1]]))
        }
        (WordDepth::Bits32, ByteOrder::LittleEndian) => u64::from(u32::from_le_bytes([
            line[off],
            line[off + 1],
            line[off + 2],
            line[off + 3],
        ])),
        (WordDepth::Bits32, ByteOrder::BigEndian) => u64::from(u32::from_be_bytes([
            line[off],
            line[off + 1],
            line[off + 2],
            line[off + 3],
        ])),
    }
}

fn write_word(spec: &FormatSpec, line: &mut [u8], off: usize, value: u64) {
    match (spec.word, spec.byte_order) {
        (WordDepth::Bits8, _) => line[off] = value as u8,
        (WordDepth::Bits16, ByteOrder::LittleEndian) => {
            line[off..off + 2].copy_from_slice(&(value as u16).to_le_bytes());
        }
        (WordDepth::Bits16, ByteOrder::BigEndian) => {
            line[off..off + 2].copy_from_slice(&(value as u16).to_be_bytes());
        }
        (WordDepth::Bits32, ByteOrder::LittleEndian) => {
            line[off..off + 4].copy_from_slice(&(value as u32).to_le_bytes());
        }
        (WordDepth::Bits32, ByteOrder::BigEndian) => {
            line[off..off + 4].copy_from_slice(&(value as u32).to_be_bytes());
        }
    }
}

fn read_sample(p: &VideoPacket, spec: &FormatSpec, c: &Component, x: usize, y: usize) -> u64 {
    let off = sample_offset(c, x);
    let w = read_word(spec, p.const_line(c.plane, y), off);
    (w >> c.shift) & c.max()
}

fn write_sample(
    p: &mut VideoPacket,
    spec: &FormatSpec,
    c: &Component,
    x: usize,
    y: usize,
    value: u64,
) {
    let off = sample_offset(c, x);
    let line = p.line_mut(c.plane, y);
    let old = read_word(spec, line, off);
    let merged = (old & c.write_mask()) | ((value & c.max()) << c.shift);
    write_word(spec, line, off, merged);
}

/// Fills every channel with a deterministic pattern, alpha forced to `alpha`.
fn fill_pattern(p: &mut VideoPacket, seed: u64, alpha: Option<u64>) {
    let spec = p.caps().format.spec();
    let (w, h) = (p.caps().width as usize, p.caps().height as usize);
    let colors = [spec.comp_x, spec.comp_y, spec.comp_z];

    for y in 0..h {
        for x in 0..w {
            for (ci, c) in colors.iter().flatten().enumerate() {
                let v = mix64(seed ^ ((y * w + x) as u64) ^ ((ci as u64) << 56)) & c.max();
                write_sample(p, &spec, c, x, y, v);
            }
            if let Some(a) = spec.comp_a {
                let v = match alpha {
                    Some(fixed) => fixed,
                    None => mix64(seed ^ 0xA1FA ^ ((y * w + x) as u64)) & a.max(),
                };
                write_sample(p, &spec, &a, x, y, v);
            }
        }
    }
}

fn snapshot(p: &VideoPacket) -> Vec<Vec<u8>> {
    (0..p.planes()).map(|i| p.plane_data(i).to_vec()).collect()
}

const ALPHA_FORMATS: &[PixelFormat] = &[
    PixelFormat::Argb8888,
    PixelFormat::Rgba8888,
    PixelFormat::Bgra8888,
    PixelFormat::Abgr8888,
    PixelFormat::Argb32Le,
    PixelFormat::Argb32Be,
    PixelFormat::GrayAlpha88,
    PixelFormat::Yuva420p,
    PixelFormat::Yuva444p,
    PixelFormat::Argb1555Le,
    PixelFormat::Rgba5551Le,
    PixelFormat::Argb4444Le,
    PixelFormat::Argb2101010Le,
    PixelFormat::Rgba64Le,
    PixelFormat::Rgba64Be,
    PixelFormat::Ayuv64Le,
];

#[test]
fn blit_is_idempotent_for_alpha_less_formats() {
    for &format in &[
        PixelFormat::Rgb888,
        PixelFormat::Gray8,
        PixelFormat::Yuv420p,
        PixelFormat::Nv12,
        PixelFormat::Yuyv422,
        PixelFormat::Rgb565Le,
    ] {
        let mut base = packet(format, 16, 8);
        let mut src = packet(format, 16, 8);
        fill_pattern(&mut src, 7, None);

        let mut mixer = VideoMixer::new();
        let mut session = mixer.begin(&mut base);
        assert!(session.draw_origin(&src), "{format:?}");
        session.end();

        assert_eq!(snapshot(&base), snapshot(&src), "{format:?}");
    }
}

#[test]
fn alpha_zero_source_leaves_destination_untouched() {
    for &format in ALPHA_FORMATS {
        let spec = format.spec();
        let a_max = spec.comp_a.unwrap().max();

        let mut base = packet(format, 12, 6);
        fill_pattern(&mut base, 21, Some(a_max));
        let before = snapshot(&base);

        let mut src = packet(format, 12, 6);
        fill_pattern(&mut src, 42, Some(0));

        let mut mixer = VideoMixer::new();
        let mut session = mixer.begin(&mut base);
        assert!(session.draw(0, 0, &src), "{format:?}");
        session.end();

        assert_eq!(snapshot(&base), before, "{format:?}");
    }
}

#[test]
fn alpha_max_source_replaces_destination_values() {
    for &format in ALPHA_FORMATS {
        let spec = format.spec();
        let a = spec.comp_a.unwrap();

        let mut base = packet(format, 12, 6);
        fill_pattern(&mut base, 33, None);

        let mut src = packet(format, 12, 6);
        fill_pattern(&mut src, 44, Some(a.max()));

        let mut mixer = VideoMixer::new();
        let mut session = mixer.begin(&mut base);
        assert!(session.draw(0, 0, &src), "{format:?}");
        session.end();

        for y in 0..6 {
            for x in 0..12 {
                for c in [spec.comp_x, spec.comp_y, spec.comp_z].iter().flatten() {
                    assert_eq!(
                        read_sample(&base, &spec, c, x, y),
                        read_sample(&src, &spec, c, x, y),
                        "{format:?} color at {x},{y}"
                    );
                }
                assert_eq!(read_sample(&base, &spec, &a, x, y), a.max(), "{format:?}");
            }
        }
    }
}

#[test]
fn blend_matches_the_weight_tables() {
    let tables = BlendTables::for_depth(8);
    let spec = PixelFormat::Argb8888.spec();
    let chans: Vec<Component> = [spec.comp_x, spec.comp_y, spec.comp_z]
        .iter()
        .flatten()
        .copied()
        .collect();
    let a = spec.comp_a.unwrap();

    let mut base = packet(PixelFormat::Argb8888, 8, 4);
    fill_pattern(&mut base, 5, None);
    let before = base.clone();

    let mut src = packet(PixelFormat::Argb8888, 8, 4);
    fill_pattern(&mut src, 6, None);

    let mut mixer = VideoMixer::new();
    let mut session = mixer.begin(&mut base);
    assert!(session.draw(0, 0, &src));
    session.end();

    for y in 0..4 {
        for x in 0..8 {
            let ai = read_sample(&src, &spec, &a, x, y);
            let ao = read_sample(&before, &spec, &a, x, y);
            let m = tables.index(ai, ao);
            for c in &chans {
                let vin = read_sample(&src, &spec, c, x, y) as i64;
                let vdst = read_sample(&before, &spec, c, x, y) as i64;
                let expected = (vin * tables.src_weight(m) + vdst * tables.dst_weight(m)) >> 8;
                assert_eq!(
                    read_sample(&base, &spec, c, x, y) as i64,
                    expected,
                    "color at {x},{y}"
                );
            }
            assert_eq!(
                read_sample(&base, &spec, &a, x, y) as i64,
                tables.out_alpha(m),
                "alpha at {x},{y}"
            );
        }
    }
}

#[test]
fn offset_blend_matches_the_weight_tables() {
    let tables = BlendTables::for_depth(8);
    let spec = PixelFormat::Argb8888.spec();
    let a = spec.comp_a.unwrap();
    let x_off = 3usize;
    let y_off = 2usize;

    let mut base = packet(PixelFormat::Argb8888, 16, 8);
    fill_pattern(&mut base, 11, None);
    let before = base.clone();

    let mut src = packet(PixelFormat::Argb8888, 4, 4);
    fill_pattern(&mut src, 12, None);

    let mut mixer = VideoMixer::new();
    let mut session = mixer.begin(&mut base);
    assert!(session.draw(x_off as i32, y_off as i32, &src));
    session.end();

    let cx = spec.comp_x.unwrap();
    for y in 0..8usize {
        for x in 0..16usize {
            let inside =
                (x_off..x_off + 4).contains(&x) && (y_off..y_off + 4).contains(&y);
            let actual = read_sample(&base, &spec, &cx, x, y);
            if inside {
                let (sx, sy) = (x - x_off, y - y_off);
                let ai = read_sample(&src, &spec, &a, sx, sy);
                let ao = read_sample(&before, &spec, &a, x, y);
                let m = tables.index(ai, ao);
                let vin = read_sample(&src, &spec, &cx, sx, sy) as i64;
                let vdst = read_sample(&before, &spec, &cx, x, y) as i64;
                let expected = (vin * tables.src_weight(m) + vdst * tables.dst_weight(m)) >> 8;
                assert_eq!(actual as i64, expected, "inside at {x},{y}");
            } else {
                assert_eq!(
                    actual,
                    read_sample(&before, &spec, &cx, x, y),
                    "outside at {x},{y}"
                );
            }
        }
    }
}

#[test]
fn out_of_bounds_draw_mutates_nothing() {
    let mut base = packet(PixelFormat::Argb8888, 16, 16);
    fill_pattern(&mut base, 9, None);
    let before = snapshot(&base);

    let mut src = packet(PixelFormat::Argb8888, 8, 8);
    fill_pattern(&mut src, 10, None);

    let mut mixer = VideoMixer::new();
    let mut session = mixer.begin(&mut base);
    assert!(!session.draw(17, 0, &src));
    assert!(!session.draw(0, -9, &src));
    session.end();

    assert_eq!(snapshot(&base), before);
}

#[test]
fn repeated_draws_are_byte_identical() {
    let mut src = packet(PixelFormat::Yuva420p, 10, 8);
    fill_pattern(&mut src, 77, None);

    let template = {
        let mut p = packet(PixelFormat::Yuva420p, 24, 16);
        fill_pattern(&mut p, 78, None);
        p
    };

    let mut mixer = VideoMixer::new();

    let mut first = template.clone();
    let mut session = mixer.begin(&mut first);
    assert!(session.draw(3, 3, &src));
    session.end();

    // Second bracket re-uses cache slot 0 for the same placement.
    let mut second = template.clone();
    let mut session = mixer.begin(&mut second);
    assert!(session.draw(3, 3, &src));
    session.end();

    assert_eq!(snapshot(&first), snapshot(&second));
}

#[test]
fn negative_offset_clips_and_draws_the_remainder() {
    let spec = PixelFormat::GrayAlpha88.spec();
    let cx = spec.comp_x.unwrap();
    let a = spec.comp_a.unwrap();

    let mut base = packet(PixelFormat::GrayAlpha88, 8, 8);
    let mut src = packet(PixelFormat::GrayAlpha88, 20, 20);
    for y in 0..20 {
        for x in 0..20 {
            write_sample(&mut src, &spec, &cx, x, y, (10 * x + y) as u64 & 0xff);
            write_sample(&mut src, &spec, &a, x, y, 255);
        }
    }

    let mut mixer = VideoMixer::new();
    let mut session = mixer.begin(&mut base);
    assert!(session.draw(-5, -5, &src));
    session.end();

    // Destination (0,0) sees source (5,5).
    for y in 0..8 {
        for x in 0..8 {
            assert_eq!(
                read_sample(&base, &spec, &cx, x, y),
                (10 * (x + 5) + (y + 5)) as u64 & 0xff,
                "at {x},{y}"
            );
        }
    }
}
