//! Hand-rolled BMP decoder for the mask/texture formats the host
//! image loader doesn't handle natively (spec §4.2).
//!
//! Only uncompressed (`biCompression == 0`) 1/8/24/32-bit BMPs are
//! supported; anything else decodes to `None` and the caller treats the
//! texture slot as untextured (spec §7).

use crate::pixel_buffer::PixelBuffer;

const FILE_HEADER_LEN: usize = 14;
const INFO_HEADER_LEN: usize = 40;

struct Header {
    data_offset: u32,
    width: i32,
    height: i32,
    bit_count: u16,
    compression: u32,
}

fn parse_header(bytes: &[u8]) -> Option<Header> {
    if bytes.len() < FILE_HEADER_LEN + INFO_HEADER_LEN {
        return None;
    }
    if &bytes[0..2] != b"BM" {
        return None;
    }
    let data_offset = u32::from_le_bytes(bytes[10..14].try_into().ok()?);
    let width = i32::from_le_bytes(bytes[18..22].try_into().ok()?);
    let height = i32::from_le_bytes(bytes[22..26].try_into().ok()?);
    let bit_count = u16::from_le_bytes(bytes[28..30].try_into().ok()?);
    let compression = u32::from_le_bytes(bytes[30..34].try_into().ok()?);
    Some(Header {
        data_offset,
        width,
        height,
        bit_count,
        compression,
    })
}

fn row_stride(width: u32, bit_count: u16) -> usize {
    (((width as usize * bit_count as usize) + 31) / 32) * 4
}

/// Plain decode, top-down left-to-right RGBA8 regardless of the
/// source's row order (spec §4.2).
#[must_use]
pub fn decode_plain(bytes: &[u8]) -> Option<PixelBuffer> {
    let header = parse_header(bytes)?;
    if header.compression != 0 {
        return None;
    }
    let width = header.width.unsigned_abs();
    let height = header.height.unsigned_abs();
    if width == 0 || height == 0 {
        return None;
    }
    let bottom_up = header.height > 0;
    let stride = row_stride(width, header.bit_count);
    let pixel_data = bytes.get(header.data_offset as usize..)?;

    let mut rgba = vec![0u8; width as usize * height as usize * 4];
    for row in 0..height {
        let row_start = row as usize * stride;
        let row_bytes = pixel_data.get(row_start..row_start + stride)?;
        let dest_row = if bottom_up { height - 1 - row } else { row };
        let dest_start = dest_row as usize * width as usize * 4;
        decode_row(row_bytes, header.bit_count, width, &mut rgba[dest_start..dest_start + width as usize * 4])?;
    }

    Some(PixelBuffer::new(width, height, rgba))
}

fn decode_row(row: &[u8], bit_count: u16, width: u32, dest: &mut [u8]) -> Option<()> {
    match bit_count {
        1 => {
            for x in 0..width as usize {
                let byte = *row.get(x / 8)?;
                let bit = (byte >> (7 - (x % 8))) & 1;
                let v = if bit == 1 { 255 } else { 0 };
                dest[x * 4..x * 4 + 4].copy_from_slice(&[v, v, v, 255]);
            }
            Some(())
        }
        8 => {
            for x in 0..width as usize {
                let v = *row.get(x)?;
                dest[x * 4..x * 4 + 4].copy_from_slice(&[v, v, v, 255]);
            }
            Some(())
        }
        24 => {
            for x in 0..width as usize {
                let px = row.get(x * 3..x * 3 + 3)?;
                dest[x * 4..x * 4 + 4].copy_from_slice(&[px[2], px[1], px[0], 255]);
            }
            Some(())
        }
        32 => {
            for x in 0..width as usize {
                let px = row.get(x * 4..x * 4 + 4)?;
                dest[x * 4..x * 4 + 4].copy_from_slice(&[px[2], px[1], px[0], px[3]]);
            }
            Some(())
        }
        _ => None,
    }
}

/// Plain decode followed by a 90-degree clockwise rotation, compensating
/// for how the legacy authoring tool stored single-channel masks.
#[must_use]
pub fn decode_as_mask(bytes: &[u8]) -> Option<PixelBuffer> {
    Some(decode_plain(bytes)?.rotate90_cw())
}

/// Plain decode, 90-degree clockwise rotation, then a horizontal flip —
/// the double-sided-mask variant of [`decode_as_mask`].
#[must_use]
pub fn decode_as_double_sided_mask(bytes: &[u8]) -> Option<PixelBuffer> {
    Some(decode_plain(bytes)?.rotate90_cw().flip_horizontal())
}

/// Plain decode with an optional horizontal flip applied afterward.
#[must_use]
pub fn decode_with_optional_horizontal_flip(bytes: &[u8], flip: bool) -> Option<PixelBuffer> {
    let decoded = decode_plain(bytes)?;
    Some(if flip { decoded.flip_horizontal() } else { decoded })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a minimal uncompressed BMP: `bit_count` bits per pixel,
    /// `height` rows bottom-up when positive.
    fn build_bmp(width: i32, height: i32, bit_count: u16, row_data: &[u8]) -> Vec<u8> {
        let stride = row_stride(width.unsigned_abs(), bit_count);
        let rows = height.unsigned_abs() as usize;
        let pixel_bytes = stride * rows;
        let data_offset = (FILE_HEADER_LEN + INFO_HEADER_LEN) as u32;
        let file_size = data_offset + pixel_bytes as u32;

        let mut out = Vec::with_capacity(file_size as usize);
        out.extend_from_slice(b"BM");
        out.extend_from_slice(&file_size.to_le_bytes());
        out.extend_from_slice(&[0u8; 4]);
        out.extend_from_slice(&data_offset.to_le_bytes());

        out.extend_from_slice(&(INFO_HEADER_LEN as u32).to_le_bytes());
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&bit_count.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(pixel_bytes as u32).to_le_bytes());
        out.extend_from_slice(&[0u8; 16]);

        for row in 0..rows {
            let start = row * stride;
            let end = (start + stride).min(row_data.len());
            if start < row_data.len() {
                out.extend_from_slice(&row_data[start..end]);
                out.resize(out.len() + (stride - (end - start)), 0);
            } else {
                out.extend(std::iter::repeat(0u8).take(stride));
            }
        }
        out
    }

    #[test]
    fn rejects_non_bmp_signature() {
        assert!(decode_plain(b"not a bmp").is_none());
    }

    #[test]
    fn decodes_24_bit_bottom_up_into_top_down_output() {
        // Two 1x2 rows: bottom row (stored first) is blue, top row is red.
        let mut rows = Vec::new();
        rows.extend_from_slice(&[255, 0, 0]); // BGR blue, stride padded below
        rows.resize(4, 0);
        rows.extend_from_slice(&[0, 0, 255]); // BGR red
        rows.resize(8, 0);
        let bmp = build_bmp(1, 2, 24, &rows);
        let decoded = decode_plain(&bmp).expect("decodes");
        assert_eq!(decoded.width, 1);
        assert_eq!(decoded.height, 2);
        // Row 0 in output (top-down) is the BMP's last stored row: red.
        assert_eq!(decoded.pixel(0, 0), [0, 0, 255, 255]);
        assert_eq!(decoded.pixel(0, 1), [255, 0, 0, 255]);
    }

    #[test]
    fn decodes_1_bit_black_and_white() {
        let row = [0b1000_0000u8, 0, 0, 0];
        let bmp = build_bmp(8, 1, 1, &row);
        let decoded = decode_plain(&bmp).expect("decodes");
        assert_eq!(decoded.pixel(0, 0), [255, 255, 255, 255]);
        assert_eq!(decoded.pixel(1, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn rejects_compressed_payload() {
        let mut bmp = build_bmp(1, 1, 24, &[0, 0, 0, 0]);
        bmp[30] = 1; // biCompression = BI_RLE8
        assert!(decode_plain(&bmp).is_none());
    }
}
