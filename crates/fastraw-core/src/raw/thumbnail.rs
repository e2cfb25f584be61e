//! Embedded JPEG previews.
//!
//! Most RAW containers (TIFF-based or not) carry one or more baseline JPEG
//! renderings made by the camera. We find them by walking JPEG marker
//! segments from every Start-Of-Image and keep the largest complete one.
//! Lossless JPEG streams (SOF3, the sensor data in CR2 and many DNGs) are
//! skipped: they are not renderings and the image decoder rejects them.

/// JPEG Start Of Image followed by the first marker prefix.
const JPEG_SOI: [u8; 3] = [0xFF, 0xD8, 0xFF];
const MARKER_EOI: u8 = 0xD9;
const MARKER_SOS: u8 = 0xDA;
const MARKER_SOI: u8 = 0xD8;
const MARKER_TEM: u8 = 0x01;
const MARKER_DHT: u8 = 0xC4;
const MARKER_JPG: u8 = 0xC8;
const MARKER_DAC: u8 = 0xCC;

/// Baseline, extended sequential and progressive Huffman frames.
const DISPLAYABLE_SOF: [u8; 3] = [0xC0, 0xC1, 0xC2];

/// Return the largest well-formed, displayable JPEG stream embedded in `data`.
pub fn largest_embedded_jpeg(data: &[u8]) -> Option<&[u8]> {
    let mut best: Option<(usize, usize)> = None;
    let mut pos = 0;

    while pos + JPEG_SOI.len() <= data.len() {
        if data[pos..].starts_with(&JPEG_SOI) {
            if let Some(stream) = scan_jpeg(data, pos) {
                let end = stream.end;
                let displayable = stream.frame.is_some_and(|sof| DISPLAYABLE_SOF.contains(&sof));
                if displayable && best.map_or(true, |(s, e)| end - pos > e - s) {
                    best = Some((pos, end));
                }
                // Skip the whole stream so EXIF thumbnails nested in its
                // APP1 segment are not reported separately.
                pos = end;
                continue;
            }
        }
        pos += 1;
    }

    best.map(|(start, end)| &data[start..end])
}

/// Extent and frame type of one JPEG stream.
struct JpegStream {
    /// Offset one past the End-Of-Image marker.
    end: usize,
    /// First Start-Of-Frame marker seen, if any.
    frame: Option<u8>,
}

fn is_sof(marker: u8) -> bool {
    (0xC0..=0xCF).contains(&marker)
        && marker != MARKER_DHT
        && marker != MARKER_JPG
        && marker != MARKER_DAC
}

/// Walk the JPEG starting at `start`, or `None` if the stream is truncated
/// or malformed.
fn scan_jpeg(data: &[u8], start: usize) -> Option<JpegStream> {
    let mut pos = start + 2;
    let mut frame = None;
    loop {
        // Markers may be preceded by any number of 0xFF fill bytes.
        while *data.get(pos)? == 0xFF && *data.get(pos + 1)? == 0xFF {
            pos += 1;
        }
        if *data.get(pos)? != 0xFF {
            return None;
        }
        let marker = *data.get(pos + 1)?;
        pos += 2;

        match marker {
            MARKER_EOI => return Some(JpegStream { end: pos, frame }),
            MARKER_SOI => return None,
            0xD0..=0xD7 | MARKER_TEM => continue,
            _ => {
                let len = u16::from_be_bytes([*data.get(pos)?, *data.get(pos + 1)?]) as usize;
                if len < 2 {
                    return None;
                }
                if frame.is_none() && is_sof(marker) {
                    frame = Some(marker);
                }
                pos += len;
                if marker == MARKER_SOS {
                    pos = skip_entropy_coded(data, pos)?;
                }
            }
        }
    }
}

/// Advance over entropy-coded scan data to the next real marker.
fn skip_entropy_coded(data: &[u8], mut pos: usize) -> Option<usize> {
    loop {
        if *data.get(pos)? == 0xFF {
            match *data.get(pos + 1)? {
                // Stuffed zero byte or restart marker: still scan data.
                0x00 | 0xD0..=0xD7 => pos += 2,
                0xFF => pos += 1,
                _ => return Some(pos),
            }
        } else {
            pos += 1;
        }
    }
}
