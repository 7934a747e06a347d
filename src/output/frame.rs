use crate::error::{OutlineError, Result};
use crate::outline::ContourMask;
use image::{ImageFormat, RgbImage};
use std::io::{self, Cursor, Read};

/// One fully framed result, prefix included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    bytes: Vec<u8>,
    declared: u32,
}

impl EncodedFrame {
    /// Prefix plus payload, ready for a single write.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Value of the prefix: payload bytes (dense) or point count (sparse).
    pub fn declared(&self) -> u32 {
        self.declared
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// PNG-encodes `image` behind a big-endian length prefix.
pub fn encode_dense(image: &RgbImage) -> Result<EncodedFrame> {
    let _span = tracing::debug_span!("encode_dense").entered();

    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    let declared = u32::try_from(png.len()).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidData, "dense payload exceeds 4 GiB")
    })?;

    let mut bytes = Vec::with_capacity(4 + png.len());
    bytes.extend_from_slice(&declared.to_be_bytes());
    bytes.extend_from_slice(&png);
    Ok(EncodedFrame { bytes, declared })
}

/// Lists the lit pixels of `contour` behind a little-endian `u32` count, as
/// `u16` little-endian `(x, y)` pairs in row-major order.
pub fn encode_sparse(contour: &ContourMask) -> Result<EncodedFrame> {
    let _span = tracing::debug_span!("encode_sparse").entered();

    let count = contour.count();
    let declared = u32::try_from(count).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidData, "point count exceeds u32 range")
    })?;

    let mut bytes = Vec::with_capacity(4 + 4 * count);
    bytes.extend_from_slice(&declared.to_le_bytes());
    for (x, y) in contour.lit_pixels() {
        let (Ok(px), Ok(py)) = (u16::try_from(x), u16::try_from(y)) else {
            return Err(OutlineError::DimensionOverflow { x, y });
        };
        bytes.extend_from_slice(&px.to_le_bytes());
        bytes.extend_from_slice(&py.to_le_bytes());
    }
    Ok(EncodedFrame { bytes, declared })
}

/// Reads frames back from a byte stream, the way the rendering host does.
pub struct FrameReader<R> {
    inner: R,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Next dense payload, `None` at a clean end of stream.
    pub fn read_dense(&mut self) -> Result<Option<Vec<u8>>> {
        let Some(prefix) = self.read_prefix()? else {
            return Ok(None);
        };
        let payload = self.read_payload(u64::from(u32::from_be_bytes(prefix)))?;
        Ok(Some(payload))
    }

    /// Next sparse point list, `None` at a clean end of stream.
    pub fn read_sparse(&mut self) -> Result<Option<Vec<(u16, u16)>>> {
        let Some(prefix) = self.read_prefix()? else {
            return Ok(None);
        };
        let count = u64::from(u32::from_le_bytes(prefix));
        let raw = self.read_payload(4 * count)?;

        let points = raw
            .chunks_exact(4)
            .map(|c| (u16::from_le_bytes([c[0], c[1]]), u16::from_le_bytes([c[2], c[3]])))
            .collect();
        Ok(Some(points))
    }

    /// Exactly `len` bytes. The buffer grows with the bytes that arrive, not
    /// with the declared length.
    fn read_payload(&mut self, len: u64) -> Result<Vec<u8>> {
        let mut payload = Vec::new();
        (&mut self.inner).take(len).read_to_end(&mut payload)?;
        if (payload.len() as u64) < len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream ended inside a frame payload",
            )
            .into());
        }
        Ok(payload)
    }

    /// Four prefix bytes; EOF before the first byte is a clean end.
    fn read_prefix(&mut self) -> Result<Option<[u8; 4]>> {
        let mut prefix = [0u8; 4];
        let mut filled = 0;
        while filled < prefix.len() {
            match self.inner.read(&mut prefix[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "stream ended inside a frame prefix",
                    )
                    .into())
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(Some(prefix))
    }
}

/// Decodes a single sparse frame held in memory.
pub fn decode_sparse(bytes: &[u8]) -> Result<Vec<(u16, u16)>> {
    FrameReader::new(bytes).read_sparse()?.ok_or_else(|| {
        io::Error::new(io::ErrorKind::UnexpectedEof, "empty sparse frame").into()
    })
}

/// Decodes a dense payload (without its prefix) into an RGB image.
pub fn decode_dense(payload: &[u8]) -> Result<RgbImage> {
    Ok(image::load_from_memory_with_format(payload, ImageFormat::Png)?.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::collections::HashSet;

    #[test]
    fn sparse_round_trip_reconstructs_lit_set() {
        let contour = ContourMask::from_fn(37, 21, |x, y| (x * y) % 7 == 3);
        let frame = encode_sparse(&contour).unwrap();

        assert_eq!(frame.declared() as usize, contour.count());
        assert_eq!(frame.len(), 4 + 4 * contour.count());

        let points = decode_sparse(frame.as_bytes()).unwrap();
        let expected: Vec<_> = contour
            .lit_pixels()
            .map(|(x, y)| (x as u16, y as u16))
            .collect();
        assert_eq!(points, expected);
        let unique: HashSet<_> = points.iter().collect();
        assert_eq!(unique.len(), contour.count());
    }

    #[test]
    fn sparse_layout_is_little_endian() {
        let contour = ContourMask::from_fn(300, 2, |x, y| x == 258 && y == 1);
        let frame = encode_sparse(&contour).unwrap();

        assert_eq!(frame.as_bytes(), &[1, 0, 0, 0, 2, 1, 1, 0]);
    }

    #[test]
    fn sparse_coordinate_overflow_is_an_error() {
        let contour = ContourMask::from_fn(70_001, 6, |x, y| x == 70_000 && y == 5);
        let err = encode_sparse(&contour).unwrap_err();

        assert!(matches!(err, OutlineError::DimensionOverflow { x: 70_000, y: 5 }));
    }

    #[test]
    fn wide_mask_without_far_pixels_still_encodes() {
        let contour = ContourMask::from_fn(70_001, 1, |x, _| x == 65_535);
        let points = decode_sparse(encode_sparse(&contour).unwrap().as_bytes()).unwrap();
        assert_eq!(points, vec![(65_535, 0)]);
    }

    #[test]
    fn dense_frame_carries_big_endian_png_length() {
        let mut image = RgbImage::new(6, 4);
        image.put_pixel(2, 3, Rgb([255, 0, 0]));
        let frame = encode_dense(&image).unwrap();

        let bytes = frame.as_bytes();
        let declared = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(declared, frame.declared());
        assert_eq!(declared as usize, bytes.len() - 4);
        assert_eq!(&bytes[4..12], b"\x89PNG\r\n\x1a\n");

        let decoded = decode_dense(&bytes[4..]).unwrap();
        assert_eq!(decoded, image);
    }

    #[test]
    fn reader_walks_consecutive_frames_and_stops_cleanly() {
        let a = encode_dense(&RgbImage::new(3, 3)).unwrap();
        let b = encode_dense(&RgbImage::from_pixel(2, 2, Rgb([1, 2, 3]))).unwrap();
        let mut stream = a.as_bytes().to_vec();
        stream.extend_from_slice(b.as_bytes());

        let mut reader = FrameReader::new(stream.as_slice());
        assert_eq!(decode_dense(&reader.read_dense().unwrap().unwrap()).unwrap().dimensions(), (3, 3));
        assert_eq!(decode_dense(&reader.read_dense().unwrap().unwrap()).unwrap().dimensions(), (2, 2));
        assert!(reader.read_dense().unwrap().is_none());
    }

    #[test]
    fn truncated_frames_are_errors() {
        let frame = encode_sparse(&ContourMask::from_fn(4, 4, |x, _| x == 1)).unwrap();
        let bytes = frame.as_bytes();

        assert!(FrameReader::new(&bytes[..2]).read_sparse().is_err());
        assert!(FrameReader::new(&bytes[..bytes.len() - 1]).read_sparse().is_err());
    }

    #[test]
    fn oversized_prefix_fails_on_missing_payload() {
        let mut dense = u32::MAX.to_be_bytes().to_vec();
        dense.extend_from_slice(b"\x89PN");
        let err = FrameReader::new(dense.as_slice()).read_dense().unwrap_err();
        assert!(matches!(err, OutlineError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof));

        let mut sparse = u32::MAX.to_le_bytes().to_vec();
        sparse.extend_from_slice(&[1, 0, 2, 0]);
        let err = FrameReader::new(sparse.as_slice()).read_sparse().unwrap_err();
        assert!(matches!(err, OutlineError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }
}
