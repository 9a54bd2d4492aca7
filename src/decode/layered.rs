//! Minimal layered-document (PSD) reader used as the decode fallback.
//!
//! Covers the subset our source art uses: version 1, 8 bits per channel,
//! RGB colour mode, raw or PackBits-compressed channel data. Visible
//! layers are flattened bottom-to-top with source-over compositing;
//! layer groups form a {leaf, group} tree and a hidden group hides its
//! whole subtree. Documents saved without layer records fall back to the
//! merged image data section.

use image::{imageops, RgbaImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayeredError {
    #[error("not a layered document (bad signature)")]
    BadSignature,

    #[error("unsupported {what} ({value})")]
    Unsupported { what: &'static str, value: u32 },

    #[error("malformed {context}")]
    Malformed { context: &'static str },

    #[error("truncated document in {context}")]
    Truncated { context: &'static str },
}

/// Big-endian cursor over the raw document bytes.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize, context: &'static str) -> Result<&'a [u8], LayeredError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(LayeredError::Truncated { context })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, len: usize, context: &'static str) -> Result<(), LayeredError> {
        self.take(len, context).map(|_| ())
    }

    fn u8(&mut self, context: &'static str) -> Result<u8, LayeredError> {
        Ok(self.take(1, context)?[0])
    }

    fn u16(&mut self, context: &'static str) -> Result<u16, LayeredError> {
        let b = self.take(2, context)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn i16(&mut self, context: &'static str) -> Result<i16, LayeredError> {
        Ok(self.u16(context)? as i16)
    }

    fn u32(&mut self, context: &'static str) -> Result<u32, LayeredError> {
        let b = self.take(4, context)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i32(&mut self, context: &'static str) -> Result<i32, LayeredError> {
        Ok(self.u32(context)? as i32)
    }
}

/// Group section marker carried by a layer record, in bottom-to-top
/// file order: `Open` begins collecting a group's members and `Close`
/// ends the group, carrying its visibility and opacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Divider {
    None,
    Open,
    Close,
}

/// One parsed layer record with its assembled pixels.
struct ParsedLayer {
    left: i64,
    top: i64,
    visible: bool,
    opacity: u8,
    divider: Divider,
    pixels: Option<RgbaImage>,
}

/// Polymorphic layer-tree node.
enum Node {
    Leaf(ParsedLayer),
    Group {
        visible: bool,
        opacity: u8,
        children: Vec<Node>,
    },
}

/// Decode a layered document into a single flattened RGBA raster.
pub fn flatten(bytes: &[u8]) -> Result<RgbaImage, LayeredError> {
    let mut cur = Cursor::new(bytes);
    if cur.take(4, "signature")? != b"8BPS" {
        return Err(LayeredError::BadSignature);
    }
    let version = cur.u16("version")?;
    if version != 1 {
        return Err(LayeredError::Unsupported {
            what: "version",
            value: version.into(),
        });
    }
    cur.skip(6, "reserved bytes")?;
    let channels = cur.u16("channel count")?;
    let height = cur.u32("canvas height")?;
    let width = cur.u32("canvas width")?;
    let depth = cur.u16("bit depth")?;
    if depth != 8 {
        return Err(LayeredError::Unsupported {
            what: "bit depth",
            value: depth.into(),
        });
    }
    let mode = cur.u16("colour mode")?;
    if mode != 3 {
        return Err(LayeredError::Unsupported {
            what: "colour mode",
            value: mode.into(),
        });
    }
    // Document limit for version 1 files.
    if width == 0 || height == 0 || width > 30_000 || height > 30_000 {
        return Err(LayeredError::Unsupported {
            what: "canvas dimensions",
            value: width.max(height),
        });
    }

    let len = cur.u32("colour mode data length")?;
    cur.skip(len as usize, "colour mode data")?;
    let len = cur.u32("image resources length")?;
    cur.skip(len as usize, "image resources")?;

    let layer_section_len = cur.u32("layer info length")? as usize;
    let layer_section = cur.take(layer_section_len, "layer info")?;

    match parse_layer_tree(layer_section)? {
        Some(nodes) => {
            let mut canvas = RgbaImage::new(width, height);
            composite(&mut canvas, &nodes, 255);
            Ok(canvas)
        }
        None => merged_image(&mut cur, channels, width, height),
    }
}

/// Parse the layer section into a tree, or `None` when the document has
/// no layer records and the merged image data must be used instead.
fn parse_layer_tree(section: &[u8]) -> Result<Option<Vec<Node>>, LayeredError> {
    if section.is_empty() {
        return Ok(None);
    }
    let mut cur = Cursor::new(section);
    let info_len = cur.u32("layer records length")? as usize;
    if info_len == 0 {
        return Ok(None);
    }
    let info = cur.take(info_len, "layer records")?;
    let mut cur = Cursor::new(info);

    // A negative count flags merged-alpha handling; the magnitude is the
    // record count either way.
    let count = cur.i16("layer count")?.unsigned_abs() as usize;
    if count == 0 {
        return Ok(None);
    }

    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        records.push(parse_record(&mut cur)?);
    }

    // Channel data follows all records, in record order.
    let mut layers = Vec::with_capacity(count);
    for record in records {
        let width = (record.right - record.left).max(0) as u32;
        let height = (record.bottom - record.top).max(0) as u32;
        let mut planes = Vec::with_capacity(record.channels.len());
        for &(id, len) in &record.channels {
            let plane = read_channel(&mut cur, width, height, len)?;
            planes.push((id, plane));
        }
        layers.push(ParsedLayer {
            left: record.left.into(),
            top: record.top.into(),
            visible: record.visible,
            opacity: record.opacity,
            divider: record.divider,
            pixels: assemble_rgba(width, height, &planes),
        });
    }

    Ok(Some(build_tree(layers)))
}

struct RawRecord {
    top: i32,
    left: i32,
    bottom: i32,
    right: i32,
    channels: Vec<(i16, u32)>,
    opacity: u8,
    visible: bool,
    divider: Divider,
}

fn parse_record(cur: &mut Cursor) -> Result<RawRecord, LayeredError> {
    let top = cur.i32("layer rect")?;
    let left = cur.i32("layer rect")?;
    let bottom = cur.i32("layer rect")?;
    let right = cur.i32("layer rect")?;

    let channel_count = cur.u16("channel count")?;
    let mut channels = Vec::with_capacity(channel_count as usize);
    for _ in 0..channel_count {
        let id = cur.i16("channel id")?;
        let len = cur.u32("channel length")?;
        channels.push((id, len));
    }

    if cur.take(4, "blend signature")? != b"8BIM" {
        return Err(LayeredError::Malformed {
            context: "blend signature",
        });
    }
    cur.skip(4, "blend key")?;
    let opacity = cur.u8("opacity")?;
    cur.skip(1, "clipping")?;
    let flags = cur.u8("layer flags")?;
    cur.skip(1, "record filler")?;

    // Extra data: mask, blending ranges, name, then tagged info blocks.
    let extra_len = cur.u32("extra data length")? as usize;
    let extra = cur.take(extra_len, "extra data")?;
    let mut extra = Cursor::new(extra);
    let mask_len = extra.u32("mask length")?;
    extra.skip(mask_len as usize, "layer mask")?;
    let ranges_len = extra.u32("blending ranges length")?;
    extra.skip(ranges_len as usize, "blending ranges")?;
    let name_len = extra.u8("layer name")? as usize;
    let padded = (name_len + 1 + 3) & !3;
    extra.skip(padded - 1, "layer name")?;

    let mut divider = Divider::None;
    while extra.remaining() >= 12 {
        let signature = extra.take(4, "info block signature")?;
        if signature != b"8BIM" && signature != b"8B64" {
            break;
        }
        let key = extra.take(4, "info block key")?;
        let len = extra.u32("info block length")? as usize;
        let padded = len + (len & 1);
        if padded > extra.remaining() {
            break;
        }
        let data = extra.take(padded, "info block data")?;
        if key == b"lsct" && data.len() >= 4 {
            let kind = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
            divider = match kind {
                1 | 2 => Divider::Close,
                3 => Divider::Open,
                _ => Divider::None,
            };
        }
    }

    Ok(RawRecord {
        top,
        left,
        bottom,
        right,
        channels,
        opacity,
        visible: flags & 0x02 == 0,
        divider,
    })
}

/// Read one channel's data, consuming exactly `length` bytes.
fn read_channel(
    cur: &mut Cursor,
    width: u32,
    height: u32,
    length: u32,
) -> Result<Vec<u8>, LayeredError> {
    let blob = cur.take(length as usize, "channel data")?;
    let mut cur = Cursor::new(blob);
    let compression = cur.u16("channel compression")?;
    let expected = width as usize * height as usize;
    match compression {
        0 => Ok(cur.take(expected, "raw channel data")?.to_vec()),
        1 => {
            let mut counts = Vec::with_capacity(height as usize);
            for _ in 0..height {
                counts.push(cur.u16("row byte count")? as usize);
            }
            let mut plane = Vec::with_capacity(expected);
            for count in counts {
                let packed = cur.take(count, "packed row")?;
                unpack_bits(packed, width as usize, &mut plane);
            }
            Ok(plane)
        }
        other => Err(LayeredError::Unsupported {
            what: "channel compression",
            value: other.into(),
        }),
    }
}

/// PackBits decompression of one row, appending exactly `expected`
/// bytes to `out`. Short input pads with zero, overruns are clipped.
fn unpack_bits(packed: &[u8], expected: usize, out: &mut Vec<u8>) {
    let target = out.len() + expected;
    let mut i = 0;
    while i < packed.len() && out.len() < target {
        let n = packed[i] as i8;
        i += 1;
        if n == -128 {
            continue;
        }
        if n >= 0 {
            let count = n as usize + 1;
            let end = (i + count).min(packed.len());
            out.extend_from_slice(&packed[i..end]);
            i = end;
        } else if i < packed.len() {
            let count = 1 - n as isize;
            let value = packed[i];
            i += 1;
            out.extend(std::iter::repeat(value).take(count as usize));
        }
    }
    out.truncate(target);
    out.resize(target, 0);
}

/// Combine channel planes into an RGBA buffer. Channel ids 0/1/2 are
/// R/G/B and -1 is alpha; anything else (masks) is ignored. A missing
/// alpha plane means fully opaque.
fn assemble_rgba(width: u32, height: u32, planes: &[(i16, Vec<u8>)]) -> Option<RgbaImage> {
    if width == 0 || height == 0 {
        return None;
    }
    let len = width as usize * height as usize;
    let plane = |id: i16| planes.iter().find(|(pid, _)| *pid == id).map(|(_, p)| p);
    let red = plane(0);
    let green = plane(1);
    let blue = plane(2);
    let alpha = plane(-1);

    let sample = |plane: Option<&Vec<u8>>, i: usize, default: u8| {
        plane.and_then(|p| p.get(i).copied()).unwrap_or(default)
    };

    let mut buf = Vec::with_capacity(len * 4);
    for i in 0..len {
        buf.push(sample(red, i, 0));
        buf.push(sample(green, i, 0));
        buf.push(sample(blue, i, 0));
        buf.push(sample(alpha, i, 255));
    }
    RgbaImage::from_raw(width, height, buf)
}

/// Fold the flat record list (bottom-to-top) into a {leaf, group} tree.
/// Unbalanced markers never panic; stray levels collapse into the root.
fn build_tree(layers: Vec<ParsedLayer>) -> Vec<Node> {
    let mut stack: Vec<Vec<Node>> = vec![Vec::new()];
    for layer in layers {
        match layer.divider {
            Divider::Open => stack.push(Vec::new()),
            Divider::Close => {
                let children = if stack.len() > 1 {
                    stack.pop().unwrap_or_default()
                } else {
                    Vec::new()
                };
                let group = Node::Group {
                    visible: layer.visible,
                    opacity: layer.opacity,
                    children,
                };
                if let Some(top) = stack.last_mut() {
                    top.push(group);
                }
            }
            Divider::None => {
                if let Some(top) = stack.last_mut() {
                    top.push(Node::Leaf(layer));
                }
            }
        }
    }
    while stack.len() > 1 {
        if let Some(orphans) = stack.pop() {
            if let Some(top) = stack.last_mut() {
                top.extend(orphans);
            }
        }
    }
    stack.pop().unwrap_or_default()
}

/// Walk the tree bottom-to-top, compositing visible leaves onto the
/// canvas with the cumulative group opacity applied.
fn composite(canvas: &mut RgbaImage, nodes: &[Node], opacity: u32) {
    for node in nodes {
        match node {
            Node::Group {
                visible,
                opacity: own,
                children,
            } => {
                if !visible {
                    continue;
                }
                composite(canvas, children, opacity * u32::from(*own) / 255);
            }
            Node::Leaf(layer) => {
                if !layer.visible {
                    continue;
                }
                let Some(pixels) = &layer.pixels else {
                    continue;
                };
                let effective = opacity * u32::from(layer.opacity) / 255;
                if effective >= 255 {
                    imageops::overlay(canvas, pixels, layer.left, layer.top);
                } else {
                    let mut faded = pixels.clone();
                    for pixel in faded.pixels_mut() {
                        pixel.0[3] = (u32::from(pixel.0[3]) * effective / 255) as u8;
                    }
                    imageops::overlay(canvas, &faded, layer.left, layer.top);
                }
            }
        }
    }
}

/// Decode the merged image data section, used when the document was
/// saved without layer records.
fn merged_image(
    cur: &mut Cursor,
    channels: u16,
    width: u32,
    height: u32,
) -> Result<RgbaImage, LayeredError> {
    if channels < 3 {
        return Err(LayeredError::Unsupported {
            what: "merged channel count",
            value: channels.into(),
        });
    }
    let compression = cur.u16("image data compression")?;
    let plane_len = width as usize * height as usize;
    let channel_count = channels as usize;
    let rows = height as usize;

    let mut planes: Vec<Vec<u8>> = Vec::with_capacity(channel_count);
    match compression {
        0 => {
            for _ in 0..channel_count {
                planes.push(cur.take(plane_len, "merged image data")?.to_vec());
            }
        }
        1 => {
            // Row byte counts for every channel come first, then the
            // packed rows channel by channel.
            let mut counts = Vec::with_capacity(channel_count * rows);
            for _ in 0..channel_count * rows {
                counts.push(cur.u16("merged row byte count")? as usize);
            }
            for channel in 0..channel_count {
                let mut plane = Vec::with_capacity(plane_len);
                for row in 0..rows {
                    let packed = cur.take(counts[channel * rows + row], "merged packed row")?;
                    unpack_bits(packed, width as usize, &mut plane);
                }
                planes.push(plane);
            }
        }
        other => {
            return Err(LayeredError::Unsupported {
                what: "image data compression",
                value: other.into(),
            })
        }
    }

    let mut buf = Vec::with_capacity(plane_len * 4);
    for i in 0..plane_len {
        buf.push(planes[0][i]);
        buf.push(planes[1][i]);
        buf.push(planes[2][i]);
        buf.push(if channel_count >= 4 { planes[3][i] } else { 255 });
    }
    RgbaImage::from_raw(width, height, buf).ok_or(LayeredError::Malformed {
        context: "merged image size",
    })
}

#[cfg(test)]
pub(crate) mod testutil {
    //! In-memory builder for well-formed test documents.

    pub(crate) struct LayerSpec {
        pub left: i32,
        pub top: i32,
        pub width: u32,
        pub height: u32,
        pub fill: [u8; 4],
        pub opacity: u8,
        pub visible: bool,
        pub divider: Option<u32>,
    }

    pub(crate) fn leaf(left: i32, top: i32, width: u32, height: u32, fill: [u8; 4]) -> LayerSpec {
        LayerSpec {
            left,
            top,
            width,
            height,
            fill,
            opacity: 255,
            visible: true,
            divider: None,
        }
    }

    pub(crate) fn group_open() -> LayerSpec {
        LayerSpec {
            left: 0,
            top: 0,
            width: 0,
            height: 0,
            fill: [0; 4],
            opacity: 255,
            visible: true,
            divider: Some(3),
        }
    }

    pub(crate) fn group_close(visible: bool) -> LayerSpec {
        LayerSpec {
            left: 0,
            top: 0,
            width: 0,
            height: 0,
            fill: [0; 4],
            opacity: 255,
            visible,
            divider: Some(1),
        }
    }

    fn push_u16(out: &mut Vec<u8>, v: u16) {
        out.extend_from_slice(&v.to_be_bytes());
    }

    fn push_u32(out: &mut Vec<u8>, v: u32) {
        out.extend_from_slice(&v.to_be_bytes());
    }

    fn push_i16(out: &mut Vec<u8>, v: i16) {
        out.extend_from_slice(&v.to_be_bytes());
    }

    fn push_i32(out: &mut Vec<u8>, v: i32) {
        out.extend_from_slice(&v.to_be_bytes());
    }

    fn record(spec: &LayerSpec) -> (Vec<u8>, Vec<u8>) {
        let mut rec = Vec::new();
        push_i32(&mut rec, spec.top);
        push_i32(&mut rec, spec.left);
        push_i32(&mut rec, spec.top + spec.height as i32);
        push_i32(&mut rec, spec.left + spec.width as i32);

        let pixels = spec.width as usize * spec.height as usize;
        push_u16(&mut rec, 4);
        for id in [0i16, 1, 2, -1] {
            push_i16(&mut rec, id);
            push_u32(&mut rec, 2 + pixels as u32);
        }

        rec.extend_from_slice(b"8BIM");
        rec.extend_from_slice(b"norm");
        rec.push(spec.opacity);
        rec.push(0);
        rec.push(if spec.visible { 0 } else { 2 });
        rec.push(0);

        let mut extra = Vec::new();
        push_u32(&mut extra, 0);
        push_u32(&mut extra, 0);
        extra.extend_from_slice(&[3, b'l', b'a', b'y']);
        if let Some(kind) = spec.divider {
            extra.extend_from_slice(b"8BIM");
            extra.extend_from_slice(b"lsct");
            push_u32(&mut extra, 4);
            push_u32(&mut extra, kind);
        }
        push_u32(&mut rec, extra.len() as u32);
        rec.extend(extra);

        let mut channels = Vec::new();
        for channel in 0..4 {
            push_u16(&mut channels, 0);
            channels.extend(std::iter::repeat(spec.fill[channel]).take(pixels));
        }
        (rec, channels)
    }

    fn header(out: &mut Vec<u8>, width: u32, height: u32) {
        out.extend_from_slice(b"8BPS");
        push_u16(out, 1);
        out.extend_from_slice(&[0; 6]);
        push_u16(out, 4);
        push_u32(out, height);
        push_u32(out, width);
        push_u16(out, 8);
        push_u16(out, 3);
        push_u32(out, 0);
        push_u32(out, 0);
    }

    /// A layered document; layers are given bottom-to-top.
    pub(crate) fn document(width: u32, height: u32, layers: &[LayerSpec]) -> Vec<u8> {
        let mut out = Vec::new();
        header(&mut out, width, height);

        let mut records = Vec::new();
        let mut channel_data = Vec::new();
        for spec in layers {
            let (rec, channels) = record(spec);
            records.extend(rec);
            channel_data.extend(channels);
        }
        let mut info = Vec::new();
        push_u16(&mut info, layers.len() as u16);
        info.extend(records);
        info.extend(channel_data);
        if info.len() % 2 == 1 {
            info.push(0);
        }

        let mut section = Vec::new();
        push_u32(&mut section, info.len() as u32);
        section.extend(info);
        push_u32(&mut out, section.len() as u32);
        out.extend(section);

        // Merged image data, ignored when layer records exist.
        push_u16(&mut out, 0);
        out.extend(std::iter::repeat(0u8).take(width as usize * height as usize * 4));
        out
    }

    /// A document with no layer records, only merged image data.
    pub(crate) fn merged_document(width: u32, height: u32, fill: [u8; 4]) -> Vec<u8> {
        let mut out = Vec::new();
        header(&mut out, width, height);
        push_u32(&mut out, 4);
        push_u32(&mut out, 0);
        push_u16(&mut out, 0);
        for channel in 0..4 {
            out.extend(std::iter::repeat(fill[channel]).take(width as usize * height as usize));
        }
        out
    }
}
