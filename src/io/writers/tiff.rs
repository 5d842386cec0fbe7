use gdal::DriverManager;
use gdal::cpl::CslStringList;
use gdal::raster::{Buffer, GdalType};
use gdal::spatial_ref::SpatialRef;
use std::path::Path;

use crate::core::raster::RasterDataset;
use crate::io::gdal::GdalError;
use crate::types::SampleType;

/// GTiff creation options for band extraction: tiled, LZW-compressed.
pub const COMPRESSED_TILED: &[(&str, &str)] = &[("TILED", "YES"), ("COMPRESS", "LZW")];

/// Write `raster` as a GeoTIFF at `output`, using its sample type.
pub fn write_geotiff(output: &Path, raster: &RasterDataset) -> Result<(), GdalError> {
    write_geotiff_with_options(output, raster, &[])
}

/// Like [`write_geotiff`], passing `options` as GTiff creation options.
pub fn write_geotiff_with_options(
    output: &Path,
    raster: &RasterDataset,
    options: &[(&str, &str)],
) -> Result<(), GdalError> {
    if raster.band_count() == 0 || raster.width() == 0 || raster.height() == 0 {
        return Err(GdalError::UnsupportedFormat(format!(
            "refusing to write empty raster ({} band(s), {}x{})",
            raster.band_count(),
            raster.width(),
            raster.height()
        )));
    }
    let mut creation = CslStringList::new();
    for (name, value) in options {
        creation.set_name_value(name, value)?;
    }
    match raster.sample_type {
        SampleType::Int16 => write_bands::<i16>(output, raster, &creation, |v| v.round() as i16),
        SampleType::Float32 => write_bands::<f32>(output, raster, &creation, |v| v as f32),
        SampleType::Float64 => write_bands::<f64>(output, raster, &creation, |v| v),
    }
}

fn write_bands<T: GdalType + Copy>(
    output: &Path,
    raster: &RasterDataset,
    options: &CslStringList,
    convert: fn(f64) -> T,
) -> Result<(), GdalError> {
    let (cols, rows) = (raster.width(), raster.height());
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut ds = driver.create_with_band_type_with_options::<T, _>(
        output,
        cols,
        rows,
        raster.band_count(),
        options,
    )?;
    ds.set_geo_transform(&raster.geotransform.0)?;
    if !raster.crs.is_empty() {
        let srs = SpatialRef::from_definition(&raster.crs)?;
        ds.set_spatial_ref(&srs)?;
    }

    for index in 0..raster.band_count() {
        let mut band = ds.rasterband(index + 1)?;
        if let Some(nodata) = raster.nodata {
            band.set_no_data_value(Some(nodata))?;
        }
        let data: Vec<T> = raster.band(index).iter().map(|v| convert(*v)).collect();
        let mut buf = Buffer::new((cols, rows), data);
        band.write((0, 0), (cols, rows), &mut buf)?;
    }
    ds.flush_cache()?;
    Ok(())
}
