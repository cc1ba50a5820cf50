//! Decimated overviews.
//!
//! An overview of factor `f` has `ceil(W/f)` x `ceil(H/f)` pixels. Each
//! output pixel covers `W/ow` by `H/oh` source pixels (exactly `f` except
//! at ragged edges), and the geotransform pixel size is scaled by those
//! ratios so the overview covers the same extent as the source.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Raster, RasterError, RasterResult};

/// Method used to compute an overview pixel from the source block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Resampling {
    /// Source pixel under the block centre. Preserves class values.
    #[default]
    Nearest,
    /// Mean of the valid source pixels in the block.
    Average,
}

/// Build an overview of `raster` reduced by `factor` in both directions.
pub fn build_overview(raster: &Raster, factor: usize, resampling: Resampling) -> RasterResult<Raster> {
    if factor == 0 {
        return Err(RasterError::InvalidFactor(factor));
    }
    if factor == 1 {
        return Ok(raster.clone());
    }

    let (w, h) = (raster.width, raster.height);
    let ow = w.div_ceil(factor);
    let oh = h.div_ceil(factor);
    let rx = w as f64 / ow as f64;
    let ry = h as f64 / oh as f64;

    let fill = raster.nodata.map(|v| v as f32).unwrap_or(f32::NAN);
    let mut data = Vec::with_capacity(ow * oh);

    for orow in 0..oh {
        for ocol in 0..ow {
            let value = match resampling {
                Resampling::Nearest => {
                    let col = (((ocol as f64 + 0.5) * rx) as usize).min(w - 1);
                    let row = (((orow as f64 + 0.5) * ry) as usize).min(h - 1);
                    raster.data[row * w + col]
                }
                Resampling::Average => {
                    let (c0, c1) = block(ocol, rx, w);
                    let (r0, r1) = block(orow, ry, h);
                    let mut sum = 0.0f64;
                    let mut count = 0usize;
                    for row in r0..r1 {
                        for &v in &raster.data[row * w + c0..row * w + c1] {
                            if !raster.is_nodata(v) {
                                sum += v as f64;
                                count += 1;
                            }
                        }
                    }
                    if count == 0 {
                        fill
                    } else {
                        (sum / count as f64) as f32
                    }
                }
            };
            data.push(value);
        }
    }

    debug!(
        factor,
        resampling = ?resampling,
        src_width = w,
        src_height = h,
        width = ow,
        height = oh,
        "Built overview"
    );

    Ok(Raster {
        data,
        width: ow,
        height: oh,
        geotransform: raster.geotransform.scaled(rx, ry),
        srs: raster.srs.clone(),
        nodata: raster.nodata,
    })
}

/// Source index range `[start, end)` covered by output index `i`.
fn block(i: usize, ratio: f64, len: usize) -> (usize, usize) {
    let start = ((i as f64 * ratio).floor() as usize).min(len - 1);
    let end = (((i + 1) as f64 * ratio).ceil() as usize).clamp(start + 1, len);
    (start, end)
}
