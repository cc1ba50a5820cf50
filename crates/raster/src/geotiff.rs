//! GeoTIFF reading and writing.
//!
//! Only the first image and first band are read. Georeferencing comes from
//! ModelPixelScale + ModelTiepoint, or ModelTransformation when present.
//! The spatial reference is resolved from the GeoKeys (see the `geokeys`
//! module).

use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, Write};
use std::path::Path;

use geo_common::GeoTransform;
use projection::SpatialRef;
use serde::{Deserialize, Serialize};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::colortype::{Gray32Float, Gray8};
use tiff::encoder::{DeflateLevel, TiffEncoder};
use tiff::tags::Tag;
use tracing::{debug, info, warn};

use crate::geokeys::{GeoKeys, GEO_ASCII_PARAMS, GEO_DOUBLE_PARAMS, GEO_KEY_DIRECTORY};
use crate::{Raster, RasterError, RasterResult};

// GeoTIFF tag IDs (not in the tiff crate)
const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GDAL_NODATA: u16 = 42113;

/// Compression applied to written image data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    None,
    #[default]
    Lzw,
    Deflate,
}

/// Sample type of the written band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleType {
    #[default]
    U8,
    F32,
}

impl Raster {
    /// Read the first band of a (Geo)TIFF file.
    pub fn open(path: impl AsRef<Path>) -> RasterResult<Self> {
        let path = path.as_ref();
        let file = BufReader::new(File::open(path)?);
        let mut decoder = Decoder::new(file)?.with_limits(Limits::unlimited());

        let (width, height) = decoder.dimensions()?;
        let (width, height) = (width as usize, height as usize);
        let samples_per_pixel = match decoder.find_tag(Tag::SamplesPerPixel)? {
            Some(v) => v.into_u16()? as usize,
            None => 1,
        };

        let geotransform = read_geotransform(&mut decoder)?;
        let srs = read_srs(&mut decoder)?;
        let nodata = read_nodata(&mut decoder)?;

        let samples = decode_samples(decoder.read_image()?)?;
        let data = first_band(samples, width * height, samples_per_pixel)?;

        info!(
            path = %path.display(),
            width,
            height,
            srs = srs.as_ref().map(|s| s.to_string()).unwrap_or_default(),
            nodata = ?nodata,
            "Opened raster"
        );

        Ok(Raster {
            data,
            width,
            height,
            geotransform,
            srs,
            nodata,
        })
    }
}

#[allow(unreachable_patterns)]
fn decode_samples(result: DecodingResult) -> RasterResult<Vec<f32>> {
    let samples = match result {
        DecodingResult::U8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
        _ => {
            return Err(RasterError::Unsupported(
                "sample format has no f32 conversion".to_string(),
            ))
        }
    };
    Ok(samples)
}

fn first_band(samples: Vec<f32>, pixels: usize, samples_per_pixel: usize) -> RasterResult<Vec<f32>> {
    if samples_per_pixel <= 1 {
        if samples.len() < pixels {
            return Err(RasterError::InvalidData(format!(
                "{} samples for {} pixels",
                samples.len(),
                pixels
            )));
        }
        let mut samples = samples;
        samples.truncate(pixels);
        return Ok(samples);
    }

    if samples.len() < pixels * samples_per_pixel {
        return Err(RasterError::InvalidData(format!(
            "{} samples for {} pixels of {} bands",
            samples.len(),
            pixels,
            samples_per_pixel
        )));
    }
    warn!(bands = samples_per_pixel, "Multi-band image, using band 1 only");
    Ok(samples.into_iter().step_by(samples_per_pixel).take(pixels).collect())
}

fn read_f64_tag<R: std::io::Read + Seek>(
    decoder: &mut Decoder<R>,
    tag: u16,
) -> RasterResult<Option<Vec<f64>>> {
    match decoder.find_tag(Tag::Unknown(tag))? {
        Some(value) => Ok(Some(value.into_f64_vec()?)),
        None => Ok(None),
    }
}

fn read_geotransform<R: std::io::Read + Seek>(decoder: &mut Decoder<R>) -> RasterResult<GeoTransform> {
    if let Some(m) = read_f64_tag(decoder, MODEL_TRANSFORMATION)? {
        if m.len() >= 8 {
            return Ok(GeoTransform::from_array([m[3], m[0], m[1], m[7], m[4], m[5]]));
        }
        warn!(len = m.len(), "Short ModelTransformation tag ignored");
    }

    let scale = read_f64_tag(decoder, MODEL_PIXEL_SCALE)?;
    let tiepoint = read_f64_tag(decoder, MODEL_TIEPOINT)?;
    match (scale, tiepoint) {
        (Some(s), Some(t)) if s.len() >= 2 && t.len() >= 6 => {
            let (sx, sy) = (s[0], s[1]);
            let (i, j, x, y) = (t[0], t[1], t[3], t[4]);
            Ok(GeoTransform::north_up(x - i * sx, y + j * sy, sx, -sy))
        }
        _ => {
            warn!("No georeferencing tags, using pixel coordinates");
            Ok(GeoTransform::north_up(0.0, 0.0, 1.0, 1.0))
        }
    }
}

fn read_srs<R: std::io::Read + Seek>(decoder: &mut Decoder<R>) -> RasterResult<Option<SpatialRef>> {
    let directory = match decoder.find_tag(Tag::Unknown(GEO_KEY_DIRECTORY))? {
        Some(v) => v.into_u16_vec()?,
        None => {
            debug!("No GeoKeyDirectory");
            return Ok(None);
        }
    };
    let doubles = read_f64_tag(decoder, GEO_DOUBLE_PARAMS)?.unwrap_or_default();
    let ascii = match decoder.find_tag(Tag::Unknown(GEO_ASCII_PARAMS))? {
        Some(v) => v.into_string()?,
        None => String::new(),
    };
    Ok(GeoKeys::parse(&directory, &doubles, &ascii).to_srs())
}

fn read_nodata<R: std::io::Read + Seek>(decoder: &mut Decoder<R>) -> RasterResult<Option<f64>> {
    let text = match decoder.find_tag(Tag::Unknown(GDAL_NODATA))? {
        Some(v) => v.into_string()?,
        None => return Ok(None),
    };
    let text = text.trim_matches(char::from(0)).trim();
    match text.parse::<f64>() {
        Ok(v) => Ok(Some(v)),
        Err(_) if text.eq_ignore_ascii_case("nan") => Ok(Some(f64::NAN)),
        Err(_) => {
            warn!(value = text, "Unparseable GDAL_NODATA tag ignored");
            Ok(None)
        }
    }
}

/// Builder for GeoTIFF output.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTiffWriter {
    compression: Compression,
    sample_type: SampleType,
}

impl GeoTiffWriter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    #[must_use]
    pub fn sample_type(mut self, sample_type: SampleType) -> Self {
        self.sample_type = sample_type;
        self
    }

    /// Write to a file path.
    pub fn write(&self, raster: &Raster, path: impl AsRef<Path>) -> RasterResult<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(File::create(path)?);
        self.write_to(raster, writer)?;
        info!(
            path = %path.display(),
            width = raster.width,
            height = raster.height,
            compression = ?self.compression,
            sample_type = ?self.sample_type,
            "Wrote GeoTIFF"
        );
        Ok(())
    }

    /// Write to any `Write + Seek` sink.
    pub fn write_to<W: Write + Seek>(&self, raster: &Raster, writer: W) -> RasterResult<()> {
        if raster.width == 0 || raster.height == 0 {
            return Err(RasterError::InvalidData(
                "raster has zero dimensions".to_string(),
            ));
        }
        if raster.data.len() != raster.width * raster.height {
            return Err(RasterError::InvalidData(format!(
                "{} samples for a {}x{} raster",
                raster.data.len(),
                raster.width,
                raster.height
            )));
        }

        let compression = match self.compression {
            Compression::None => tiff::encoder::Compression::Uncompressed,
            Compression::Lzw => tiff::encoder::Compression::Lzw,
            Compression::Deflate => tiff::encoder::Compression::Deflate(DeflateLevel::Balanced),
        };
        let mut encoder = TiffEncoder::new(writer)?.with_compression(compression);
        let (width, height) = (raster.width as u32, raster.height as u32);

        match self.sample_type {
            SampleType::U8 => {
                let fill = raster.nodata.map(to_u8).unwrap_or(0);
                let bytes: Vec<u8> = raster
                    .data
                    .iter()
                    .map(|&v| if v.is_nan() { fill } else { to_u8(v as f64) })
                    .collect();
                let mut image = encoder.new_image::<Gray8>(width, height)?;
                write_geotiff_tags(image.encoder(), raster)?;
                image.write_data(&bytes)?;
            }
            SampleType::F32 => {
                let mut image = encoder.new_image::<Gray32Float>(width, height)?;
                write_geotiff_tags(image.encoder(), raster)?;
                image.write_data(&raster.data)?;
            }
        }
        Ok(())
    }
}

fn to_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn write_geotiff_tags<W: Write + Seek, K: tiff::encoder::TiffKind>(
    dir: &mut tiff::encoder::DirectoryEncoder<W, K>,
    raster: &Raster,
) -> RasterResult<()> {
    let gt = &raster.geotransform;

    if gt.is_north_up() {
        let pixel_scale = [gt.pixel_width, -gt.pixel_height, 0.0];
        dir.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), pixel_scale.as_slice())?;
        let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
        dir.write_tag(Tag::Unknown(MODEL_TIEPOINT), tiepoint.as_slice())?;
    } else {
        let matrix = [
            gt.pixel_width, gt.row_rotation, 0.0, gt.origin_x,
            gt.col_rotation, gt.pixel_height, 0.0, gt.origin_y,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        dir.write_tag(Tag::Unknown(MODEL_TRANSFORMATION), matrix.as_slice())?;
    }

    if let Some(srs) = &raster.srs {
        let (directory, doubles, ascii) = GeoKeys::from_srs(srs).encode();
        dir.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), directory.as_slice())?;
        if !doubles.is_empty() {
            dir.write_tag(Tag::Unknown(GEO_DOUBLE_PARAMS), doubles.as_slice())?;
        }
        dir.write_tag(Tag::Unknown(GEO_ASCII_PARAMS), ascii.as_str())?;
    }

    if let Some(nodata) = raster.nodata {
        dir.write_tag(Tag::Unknown(GDAL_NODATA), format_nodata(nodata).as_str())?;
    }
    Ok(())
}

fn format_nodata(nodata: f64) -> String {
    if nodata.is_nan() {
        "nan".to_string()
    } else if nodata.fract() == 0.0 && nodata.abs() < 1e15 {
        format!("{}", nodata as i64)
    } else {
        format!("{}", nodata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_nodata() {
        assert_eq!(format_nodata(0.0), "0");
        assert_eq!(format_nodata(-9999.0), "-9999");
        assert_eq!(format_nodata(0.5), "0.5");
    }

    #[test]
    fn test_first_band_of_interleaved_samples() {
        let samples = vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0];
        assert_eq!(first_band(samples, 3, 2).unwrap(), vec![1.0, 2.0, 3.0]);
        assert!(first_band(vec![1.0], 3, 1).is_err());
    }
}
